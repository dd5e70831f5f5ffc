//! Tile service: orchestrates pool checkout, compositing, and encoding.
//!
//! Decoder opens and region reads are blocking native-library calls, so each
//! request's checkout-compose-encode sequence runs on the tokio blocking
//! thread pool. The `ScopedHandle` guard travels into the blocking closure
//! and releases the handle on every exit path, success or error.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task;
use tracing::debug;

use crate::error::TileError;
use crate::slide::{HandlePool, SlideBackend, SlideInfo};

use super::compositor::compose_tile;
use super::encoder::{TileEncoder, TileFormat};

/// Parameters identifying one tile. Transient, never persisted.
#[derive(Debug, Clone, Copy)]
pub struct TileRequest {
    /// Pyramid level (0 = highest resolution).
    pub level: u32,

    /// Tile X index at that level, 0-indexed from the left.
    pub tile_x: u32,

    /// Tile Y index at that level, 0-indexed from the top.
    pub tile_y: u32,

    /// Encoding of the returned bytes.
    pub format: TileFormat,
}

/// Service producing encoded tiles and slide metadata.
///
/// Generic over the decoder backend; production uses the OpenSlide backend,
/// tests plug in in-memory fakes.
pub struct TileService<B: SlideBackend> {
    pool: Arc<HandlePool<B>>,
    encoder: TileEncoder,
}

impl<B: SlideBackend> TileService<B> {
    /// Create a service over a pool, with the default JPEG quality.
    pub fn new(pool: HandlePool<B>) -> Self {
        Self {
            pool: Arc::new(pool),
            encoder: TileEncoder::default(),
        }
    }

    /// Create a service with an explicit JPEG quality.
    pub fn with_jpeg_quality(pool: HandlePool<B>, jpeg_quality: u8) -> Self {
        Self {
            pool: Arc::new(pool),
            encoder: TileEncoder::new(jpeg_quality),
        }
    }

    /// The shared handle pool.
    pub fn pool(&self) -> &Arc<HandlePool<B>> {
        &self.pool
    }

    /// Render one tile of `path` to encoded bytes.
    ///
    /// Pixels are produced fresh per request and discarded after encoding;
    /// only the decoder handle is reused.
    pub async fn render_tile(&self, path: &Path, request: TileRequest) -> Result<Bytes, TileError> {
        let pool = Arc::clone(&self.pool);
        let path = path.to_path_buf();
        let encoder = self.encoder.clone();

        let task_path = path.clone();
        let bytes = task::spawn_blocking(move || -> Result<Bytes, TileError> {
            let handle = pool.checkout(&task_path)?;
            let tile = compose_tile(&*handle, request.level, request.tile_x, request.tile_y)?;
            encoder.encode(&tile, request.format)
            // Handle released (or closed, if ephemeral) here, also when
            // compose or encode failed.
        })
        .await
        .map_err(|e| TileError::Worker(e.to_string()))??;

        debug!(
            slide = %path.display(),
            level = request.level,
            x = request.tile_x,
            y = request.tile_y,
            bytes = bytes.len(),
            "rendered tile"
        );
        Ok(bytes)
    }

    /// Describe the pyramid of `path`.
    pub async fn slide_info(&self, path: &Path) -> Result<SlideInfo, TileError> {
        let pool = Arc::clone(&self.pool);
        let path = path.to_path_buf();

        let info = task::spawn_blocking(move || -> Result<SlideInfo, TileError> {
            let handle = pool.checkout(&path)?;
            Ok(SlideInfo::from_handle(&*handle)?)
        })
        .await
        .map_err(|e| TileError::Worker(e.to_string()))??;
        Ok(info)
    }
}

// =============================================================================
// Tests
// =============================================================================
