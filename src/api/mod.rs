pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
    web,
};
use state::AppState;

// Multipart framing on top of the largest accepted attachment.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings.clone());

    let app = Router::new()
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))

        // Session init / teardown
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .nest("/auth", session_routes(app_state.clone()))

        .nest("/api", api_routes(app_state.clone()))
        .with_state(app_state);

    let app = match settings.server.static_dir.as_deref() {
        Some(dir) => app.fallback_service(web::frontend_routes(dir)),
        None => app,
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(CompressionLayer::new()),
    )
}

fn session_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_session,
        ))
}

fn api_routes(state: AppState) -> Router<AppState> {
    let upload_limit = state.settings.attachments.max_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/departments", get(handlers::employees::departments))
        .nest("/announcements", announcement_routes(upload_limit))
        .nest("/employees", employee_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_session,
        ))
}

fn announcement_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::announcements::list)
                .post(handlers::announcements::create)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/:id/acknowledge", post(handlers::announcements::acknowledge))
        .route("/:id/archive", post(handlers::announcements::archive))
        .route("/:id/unarchive", post(handlers::announcements::unarchive))
        .route("/:id/toggle-archive", post(handlers::announcements::toggle_archive))
        .route("/:id/logs", get(handlers::announcements::logs))
}

fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::employees::list))
        .route(
            "/:username",
            get(handlers::employees::get).put(handlers::employees::update),
        )
        .route("/:username/editor", get(handlers::employees::editor))
}
