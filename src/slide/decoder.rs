//! Decoder boundary for Whole Slide Images.
//!
//! The WSI decoding library is treated as an opaque capability behind two
//! traits: [`SlideBackend`] opens a file into a handle, and [`DecoderHandle`]
//! exposes the pyramid metadata plus a region-read operation. The rest of the
//! crate (pool, compositor, HTTP layer) is generic over these traits, so the
//! same pipeline runs against the native OpenSlide backend in production and
//! against in-memory backends in tests.
//!
//! Construction of a handle is expensive (file parsing, pyramid header read);
//! region reads and opens are blocking calls and must run off the async
//! runtime, via `tokio::task::spawn_blocking`.

use std::path::Path;

use image::DynamicImage;
use serde::Serialize;

use crate::error::SlideError;
use crate::tile::TILE_SIZE;

/// An open, stateful decoder bound to one slide file.
///
/// Level 0 is the full-resolution image; each subsequent level is a coarser
/// downsample with independently rounded dimensions. `read_region` always
/// addresses its origin in level-0 pixel coordinates, regardless of the level
/// being read — this matches the underlying C library's contract and is the
/// reason the compositor performs a coordinate-space translation.
pub trait DecoderHandle: Send {
    /// Number of pyramid levels. A valid slide has at least one.
    fn level_count(&self) -> u32;

    /// `(width, height)` of a level in pixels, or `None` if out of range.
    fn level_dimensions(&self, level: u32) -> Option<(u32, u32)>;

    /// Downsample factor of a level as reported by the library (level 0 is
    /// 1.0), or `None` if out of range.
    fn level_downsample(&self, level: u32) -> Option<f64>;

    /// Decode the rectangular window `size` at `level`, with the window's
    /// top-left corner given in level-0 coordinates.
    ///
    /// The returned image carries an alpha channel when the source does
    /// (OpenSlide returns premultiplied-free RGBA with transparent pixels
    /// outside the scanned area).
    fn read_region(
        &self,
        level: u32,
        origin_level0: (u32, u32),
        size: (u32, u32),
    ) -> Result<DynamicImage, SlideError>;
}

/// Factory for decoder handles.
///
/// Handles for the same path are interchangeable; the pool relies on this to
/// hand out whichever idle handle it has.
pub trait SlideBackend: Send + Sync + 'static {
    type Handle: DecoderHandle + 'static;

    /// Open a slide file into a fresh handle. Blocking and expensive.
    fn open(&self, path: &Path) -> Result<Self::Handle, SlideError>;
}

/// Slide metadata returned by the info endpoint.
///
/// Serializes with camelCase keys for the viewer:
/// `{width, height, levelCount, tileSize, levelDimensions, levelDownsamples}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideInfo {
    /// Width of the full-resolution (level 0) image in pixels.
    pub width: u32,

    /// Height of the full-resolution (level 0) image in pixels.
    pub height: u32,

    /// Number of pyramid levels.
    pub level_count: u32,

    /// Tile edge length served by this server (fixed).
    pub tile_size: u32,

    /// `(width, height)` per level, indexed by level.
    pub level_dimensions: Vec<(u32, u32)>,

    /// Library-reported downsample factor per level. Not derived from the
    /// dimension ratio.
    pub level_downsamples: Vec<f64>,
}

impl SlideInfo {
    /// Describe a slide from an open handle.
    ///
    /// Fails with [`SlideError::EmptyPyramid`] when the handle reports no
    /// levels or a level's metadata is missing.
    pub fn from_handle<H: DecoderHandle + ?Sized>(handle: &H) -> Result<Self, SlideError> {
        let level_count = handle.level_count();
        if level_count < 1 {
            return Err(SlideError::EmptyPyramid);
        }

        let mut level_dimensions = Vec::with_capacity(level_count as usize);
        let mut level_downsamples = Vec::with_capacity(level_count as usize);
        for level in 0..level_count {
            let dims = handle
                .level_dimensions(level)
                .ok_or(SlideError::EmptyPyramid)?;
            let downsample = handle
                .level_downsample(level)
                .ok_or(SlideError::EmptyPyramid)?;
            level_dimensions.push(dims);
            level_downsamples.push(downsample);
        }

        let (width, height) = level_dimensions[0];
        Ok(Self {
            width,
            height,
            level_count,
            tile_size: TILE_SIZE,
            level_dimensions,
            level_downsamples,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
