//! HTTP server layer.
//!
//! Thin Axum surface over the tile service: route definitions, request
//! validation, and the error-to-status mapping. Everything with real
//! engineering content lives below, in [`crate::slide`] and [`crate::tile`].

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, slide_info_handler, slides_handler, tile_handler, ApiError, AppState,
    ErrorResponse, HealthResponse, SlideListResponse, TilePathParams,
};
pub use routes::{create_router, RouterConfig};
