//! Frontend asset serving
//!
//! This module serves the embedded single-page dashboard with proper MIME
//! types and base path injection, so the page works wherever the layer is
//! mounted.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use include_dir::{include_dir, Dir};
use std::sync::Arc;

// Embed the frontend dist directory at compile time
static FRONTEND_DISTRIBUTION: Dir = include_dir!("$CARGO_MANIFEST_DIR/frontend/dist");

/// State for frontend serving (stores base path for routing)
#[derive(Clone)]
pub struct FrontendState {
    pub base_path: Arc<String>,
}

impl FrontendState {
    /// Create a new frontend state with the given base path
    pub fn new(base_path: String) -> Self {
        Self {
            base_path: Arc::new(base_path),
        }
    }
}

/// Create a router for serving frontend assets
///
/// This returns a Router that serves:
/// - GET / -> index.html with injected <base href> tag
/// - GET /assets/* -> static assets
///
/// # Arguments
///
/// * `base_path` - The base URL path where the frontend is mounted (e.g., "/dashboard")
pub fn create_frontend_router(base_path: String) -> Router {
    let state = FrontendState::new(base_path);

    // Note: Axum 0.8 uses {*wildcard} syntax for wildcard captures
    Router::new()
        .route("/", get(serve_index_page))
        .route("/assets/{*path}", get(serve_static_asset))
        .with_state(state)
}

/// Insert `<base href="{base_path}/">` right after `<head>`
///
/// Relative API and asset URLs in the page resolve against it.
fn inject_base_tag(html: &str, base_path: &str) -> String {
    let mut contents = html.to_string();
    if let Some(head_position) = contents.find("<head>") {
        let insert_position = head_position + "<head>".len();
        let base_tag = format!("\n    <base href=\"{}/\">", base_path);
        contents.insert_str(insert_position, &base_tag);
    }
    contents
}

/// Serve the index.html file at the root path
///
/// Caching: no-cache, the page is tiny and must pick up the base path.
async fn serve_index_page(State(state): State<FrontendState>) -> Response {
    match FRONTEND_DISTRIBUTION.get_file("index.html") {
        Some(file) => {
            let contents = inject_base_tag(&String::from_utf8_lossy(file.contents()), &state.base_path);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                contents,
            )
                .into_response()
        }
        None => {
            tracing::error!("embedded frontend is missing index.html");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Dashboard page is missing from this build",
            )
                .into_response()
        }
    }
}

/// Serve static assets with proper MIME types
///
/// Caching: max-age=3600 (1 hour), asset names are not content-hashed.
async fn serve_static_asset(Path(path): Path<String>) -> Response {
    let asset_path = format!("assets/{}", path);

    match FRONTEND_DISTRIBUTION.get_file(&asset_path) {
        Some(file) => {
            let mime_type = mime_guess::from_path(&asset_path)
                .first_or_octet_stream()
                .to_string();

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime_type),
                    (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
                ],
                file.contents(),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Asset not found: {}", asset_path),
        )
            .into_response(),
    }
}
