//! Static frontend bundle, served for every path the API does not claim.

pub mod uploads;

use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::api::middleware::navigation::gate_pages;

/// Serves `static_dir`, falling back to its `index.html` for client-side
/// routes. Page requests go through the navigation gate.
pub fn frontend_routes(static_dir: &str) -> Router {
    let index = Path::new(static_dir).join("index.html");

    Router::new()
        .fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
        .layer(axum::middleware::from_fn(gate_pages))
}
