use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    Extension, Form, Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentSession, state::AppState},
    auth::{AuthService, SESSION_COOKIE},
    domain::User,
    error::{AppError, Result},
    policy::Capabilities,
};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub capabilities: Capabilities,
}

impl SessionResponse {
    fn for_user(user: User) -> Self {
        let capabilities = Capabilities::for_user(&user);
        Self { user, capabilities }
    }
}

/// Accepts the login form either as JSON or url-encoded.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    let req: LoginRequest = if is_json {
        let Json(req) = Json::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        req
    } else {
        let Form(req) = Form::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        req
    };
    req.validate()?;

    let ctx = &state.service_context;
    let outcome = ctx.backend.login(req.username.trim(), &req.password).await?;
    let session = ctx.auth_service.establish(outcome.user, &outcome.token).await;

    let cookie = ctx
        .auth_service
        .create_session_cookie(&outcome.token, session.expires_at);

    Ok((jar.add(cookie), Json(SessionResponse::for_user(session.user))))
}

/// Always succeeds; the backend is told on a best-effort basis.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        let ctx = &state.service_context;
        if let Err(e) = ctx.backend.logout(&token).await {
            tracing::warn!("Backend logout failed: {}", e);
        }
        ctx.auth_service.invalidate_session(&token).await;
    }

    (jar.add(AuthService::create_logout_cookie()), StatusCode::NO_CONTENT)
}

pub async fn me(Extension(CurrentSession(session)): Extension<CurrentSession>) -> Json<SessionResponse> {
    Json(SessionResponse::for_user(session.user))
}
