//! HTTP front for `LocalHost`.
//!
//! Serves every registered static path, the `www` directory under `/local`
//! and the declared UI resources as JSON, so the card can be loaded from a
//! browser the way the real host would serve it.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use mbtalive_core::config::constants;
use mbtalive_core::{Host, UiResource};
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::local_host::LocalHost;

/// Frontend declarations exposed at `/api/resources`.
#[derive(Debug, Clone, Serialize)]
pub struct FrontendView {
    pub resources: Vec<UiResource>,
    pub extra_js_urls: Vec<String>,
}

/// Build the router for everything `host` currently publishes.
pub fn router(host: &LocalHost) -> Router {
    let view = Arc::new(FrontendView {
        resources: host.resources(),
        extra_js_urls: host.extra_js_urls(),
    });

    let mut router = Router::new()
        .route("/api/resources", get(list_resources))
        .with_state(view);

    for route in host.static_routes() {
        // Route syntax characters would turn the path into a pattern
        if route
            .url_path
            .contains(|c: char| matches!(c, ':' | '*' | '{' | '}'))
        {
            tracing::warn!("Not serving {}: unsupported characters in path", route.url_path);
            continue;
        }
        let file_path = route.file_path.clone();
        let cache_headers = route.cache_headers;
        router = router.route(
            &route.url_path,
            get(move || serve_file(file_path.clone(), cache_headers)),
        );
    }

    router.nest_service(
        constants::LOCAL_URL_PREFIX,
        ServeDir::new(host.config_dir().join(constants::SERVED_DIR)),
    )
}

async fn list_resources(State(view): State<Arc<FrontendView>>) -> Json<FrontendView> {
    Json(view.as_ref().clone())
}

/// Serve a single file, disabling client caching unless `cache_headers`.
pub async fn serve_file(path: PathBuf, cache_headers: bool) -> Response {
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            let cache_control = if cache_headers {
                "public, max-age=31536000"
            } else {
                "no-cache, no-store, must-revalidate"
            };

            (
                [
                    (header::CONTENT_TYPE, mime),
                    (header::CACHE_CONTROL, cache_control.to_string()),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", path.display(), e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
