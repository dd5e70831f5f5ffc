//! HTTP request handlers for the slide tile API.
//!
//! # Endpoints
//!
//! - `GET /api/slides` - list slides in the configured directory
//! - `GET /api/slides/{slide_id}/info` - pyramid metadata
//! - `GET /api/slides/{slide_id}/tiles/{level}/{x}_{y}.{ext}` - one tile
//! - `GET /health` - health check
//!
//! Request validation (tile segment shape, extension, slide existence)
//! happens here, before the core pipeline is invoked; only level range and
//! decode failures surface from below.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{SlideError, TileError};
use crate::slide::{find_slide, list_slides, SlideBackend, SlideEntry, SlideInfo};
use crate::tile::{TileFormat, TileRequest, TileService};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to handlers via Axum's State extractor.
///
/// Constructed once in `main`; there is no lazily initialized global.
pub struct AppState<B: SlideBackend> {
    /// The tile service (pool + compositor + encoder).
    pub tile_service: Arc<TileService<B>>,

    /// Directory containing the slide files.
    pub slide_dir: PathBuf,

    /// `Cache-Control` max-age for tile responses, in seconds.
    pub cache_max_age: u32,
}

impl<B: SlideBackend> AppState<B> {
    pub fn new(tile_service: TileService<B>, slide_dir: PathBuf) -> Self {
        Self {
            tile_service: Arc::new(tile_service),
            slide_dir,
            cache_max_age: 3600,
        }
    }

    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }
}

impl<B: SlideBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            tile_service: Arc::clone(&self.tile_service),
            slide_dir: self.slide_dir.clone(),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Path parameters for tile requests.
///
/// Extracted from `/api/slides/{slide_id}/tiles/{level}/{tile}` where `tile`
/// is the `{x}_{y}.{ext}` segment, parsed by hand below.
#[derive(Debug, Deserialize)]
pub struct TilePathParams {
    pub slide_id: String,
    pub level: u32,
    pub tile: String,
}

/// Response from the slides list endpoint.
#[derive(Debug, Serialize)]
pub struct SlideListResponse {
    pub items: Vec<SlideEntry>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// JSON error body returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g. "not_found", "bad_tile_address").
    pub error: String,

    /// Human-readable error message.
    pub message: String,

    /// HTTP status code, included for convenience.
    pub status: u16,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// A handler failure carrying its HTTP mapping.
///
/// 5xx responses log at ERROR, 4xx at WARN, 404 at DEBUG (probing past the
/// edge of a slide set is routine for viewers).
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(slide_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: format!("Slide not found: {slide_id}"),
        }
    }

    pub fn internal(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind,
            message: message.into(),
        }
    }
}

impl From<TileError> for ApiError {
    fn from(err: TileError) -> Self {
        match err {
            TileError::Slide(SlideError::InvalidLevel { level, level_count }) => Self::bad_request(
                "invalid_level",
                format!("Invalid level: {level} (slide has {level_count} levels)"),
            ),
            TileError::Slide(slide_err) => {
                let kind = match &slide_err {
                    SlideError::OpenFailure { .. } => "open_failure",
                    SlideError::EmptyPyramid => "empty_pyramid",
                    SlideError::DecodeFailure(_) => "decode_failure",
                    SlideError::InvalidLevel { .. } => unreachable!("handled above"),
                };
                Self::internal(kind, slide_err.to_string())
            }
            TileError::Encode(message) => Self::internal("encode_error", message),
            TileError::Worker(message) => Self::internal("internal_error", message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                error_type = self.kind,
                status = self.status.as_u16(),
                "Server error: {}",
                self.message
            );
        } else if self.status == StatusCode::NOT_FOUND {
            debug!(
                error_type = self.kind,
                status = self.status.as_u16(),
                "Resource not found: {}",
                self.message
            );
        } else {
            warn!(
                error_type = self.kind,
                status = self.status.as_u16(),
                "Client error: {}",
                self.message
            );
        }

        let body = ErrorResponse {
            error: self.kind.to_string(),
            message: self.message,
            status: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /health`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/slides`
///
/// Lists slide files with a supported extension in the configured directory,
/// as `{"items": [{id, name}, ...]}` sorted by id.
pub async fn slides_handler<B: SlideBackend>(
    State(state): State<AppState<B>>,
) -> Result<Json<SlideListResponse>, ApiError> {
    let items = list_slides(&state.slide_dir).map_err(|e| {
        ApiError::internal(
            "catalog_error",
            format!(
                "failed to scan slide directory {}: {e}",
                state.slide_dir.display()
            ),
        )
    })?;
    Ok(Json(SlideListResponse { items }))
}

/// `GET /api/slides/{slide_id}/info`
///
/// Pyramid metadata for one slide: level-0 dimensions, level count, tile
/// size, per-level dimensions, and library-reported downsamples.
pub async fn slide_info_handler<B: SlideBackend>(
    State(state): State<AppState<B>>,
    Path(slide_id): Path<String>,
) -> Result<Json<SlideInfo>, ApiError> {
    let path = find_slide(&state.slide_dir, &slide_id)
        .ok_or_else(|| ApiError::not_found(&slide_id))?;
    let info = state.tile_service.slide_info(&path).await?;
    Ok(Json(info))
}

/// `GET /api/slides/{slide_id}/tiles/{level}/{x}_{y}.{ext}`
///
/// # Response
///
/// - `200 OK` with the encoded tile and matching `Content-Type`
/// - `400 Bad Request` for a malformed tile segment, unsupported extension,
///   or out-of-range level
/// - `404 Not Found` for an unknown slide id
/// - `500 Internal Server Error` for open/decode/encode failures
pub async fn tile_handler<B: SlideBackend>(
    State(state): State<AppState<B>>,
    Path(params): Path<TilePathParams>,
) -> Result<Response, ApiError> {
    let (tile_x, tile_y, format) = parse_tile_segment(&params.tile)?;
    let path = find_slide(&state.slide_dir, &params.slide_id)
        .ok_or_else(|| ApiError::not_found(&params.slide_id))?;

    let request = TileRequest {
        level: params.level,
        tile_x,
        tile_y,
        format,
    };
    let bytes = state.tile_service.render_tile(&path, request).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        )
        .body(axum::body::Body::from(bytes))
        .map_err(|e| ApiError::internal("internal_error", e.to_string()))
}

/// Parse the `{x}_{y}.{ext}` path segment.
///
/// The stem must be exactly two `_`-separated non-negative integers and the
/// extension one of `jpg`, `jpeg`, `png`; anything else is a 400.
fn parse_tile_segment(segment: &str) -> Result<(u32, u32, TileFormat), ApiError> {
    let (stem, ext) = segment
        .rsplit_once('.')
        .ok_or_else(|| ApiError::bad_request("bad_tile_address", "Tile must be x_y.ext"))?;

    let format = TileFormat::from_extension(ext).ok_or_else(|| {
        ApiError::bad_request("unsupported_extension", "Only jpg, jpeg or png allowed")
    })?;

    let parts: Vec<&str> = stem.split('_').collect();
    let [x_str, y_str] = parts.as_slice() else {
        return Err(ApiError::bad_request("bad_tile_address", "Tile must be x_y"));
    };
    let tile_x: u32 = x_str.parse().map_err(|_| {
        ApiError::bad_request("bad_tile_address", "Tile indices must be integers")
    })?;
    let tile_y: u32 = y_str.parse().map_err(|_| {
        ApiError::bad_request("bad_tile_address", "Tile indices must be integers")
    })?;

    Ok((tile_x, tile_y, format))
}

// =============================================================================
// Tests
// =============================================================================
