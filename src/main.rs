use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zerocore::{
    api,
    auth::AuthService,
    backend::{Backend, HttpBackend},
    config::Settings,
    service::ServiceContext,
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zerocore=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting ZeroCore console on {}:{}", settings.server.host, settings.server.port);

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&settings.backend)?);
    match backend.health_check().await {
        Ok(()) => tracing::info!("Backend at {} is reachable", settings.backend.base_url),
        Err(e) => tracing::warn!("Backend at {} health check failed: {}", settings.backend.base_url, e),
    }

    let auth_service = Arc::new(AuthService::new(
        settings.auth.session_duration_minutes,
        settings.auth.secure_cookies,
    ));

    // Sweep sessions whose token has expired without a logout
    let sweeper = auth_service.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = sweeper.cleanup_expired_sessions().await;
            if removed > 0 {
                tracing::debug!("Removed {} expired sessions", removed);
            }
        }
    });

    let service_context = Arc::new(ServiceContext::new(backend, auth_service, &settings));
    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
