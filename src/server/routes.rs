//! Router configuration for the tile API.
//!
//! # Route Structure
//!
//! ```text
//! /health                                             - Health check
//! /api/slides                                         - List slides
//! /api/slides/{slide_id}/info                         - Slide metadata
//! /api/slides/{slide_id}/tiles/{level}/{x}_{y}.{ext}  - Tile endpoint
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, slide_info_handler, slides_handler, tile_handler, AppState,
};
use crate::slide::SlideBackend;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin).
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing.
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set specific allowed CORS origins. Pass `None` (the default) to allow
    /// any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router over a prepared [`AppState`].
pub fn create_router<B: SlideBackend>(state: AppState<B>, config: &RouterConfig) -> Router {
    let api = Router::new()
        .route("/", get(slides_handler::<B>))
        .route("/{slide_id}/info", get(slide_info_handler::<B>))
        .route("/{slide_id}/tiles/{level}/{tile}", get(tile_handler::<B>))
        .with_state(state);

    let router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api/slides", api)
        .layer(build_cors_layer(config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// The API is read-only, so only safe methods are allowed.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) => {
            let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
