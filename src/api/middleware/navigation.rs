use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{auth::SESSION_COOKIE, error::LOGIN_PATH};

/// Page-level gate in front of the static frontend.
///
/// Only looks at whether the session cookie is present; the API routes
/// do the real validation.
pub async fn gate_pages(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if is_ungated(path) {
        return next.run(request).await;
    }

    let has_cookie = jar
        .get(SESSION_COOKIE)
        .map(|c| !c.value().is_empty())
        .unwrap_or(false);

    match (path == LOGIN_PATH, has_cookie) {
        (false, false) => Redirect::to(LOGIN_PATH).into_response(),
        (true, true) => Redirect::to("/").into_response(),
        _ => next.run(request).await,
    }
}

fn is_ungated(path: &str) -> bool {
    path.starts_with("/api")
        || path.starts_with("/auth")
        || path.starts_with("/_next")
        || path.starts_with("/static")
        || path.starts_with("/assets")
        || path.starts_with("/favicon")
        || path == "/health"
}
