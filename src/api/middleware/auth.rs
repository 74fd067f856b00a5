use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::{Session, SESSION_COOKIE},
    error::AppError,
};

/// The validated session for this request.
#[derive(Clone)]
pub struct CurrentSession(pub Session);

/// Loads the session from the `zc_token` cookie or rejects with 401.
///
/// Also the single place where a backend 401 tears the session down: any
/// handler that surfaced `SessionExpired` produces a 401 response, and the
/// local session is dropped once however many requests saw it.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(AppError::SessionExpired)?;

    let auth_service = &state.service_context.auth_service;
    let session = auth_service.validate_session(&token).await?;

    request.extensions_mut().insert(CurrentSession(session));
    let response = next.run(request).await;

    if response.status() == StatusCode::UNAUTHORIZED
        && auth_service.invalidate_session(&token).await
    {
        tracing::info!("backend rejected the session token, redirecting to login");
    }

    Ok(response)
}
