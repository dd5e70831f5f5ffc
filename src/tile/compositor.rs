//! Tile compositing: coordinate translation, edge clipping, alpha
//! flattening, and padding to the fixed tile size.
//!
//! A deep-zoom viewer addresses tiles by `(level, tileX, tileY)` in the
//! coordinate space of the requested level, but the decoder's region read
//! addresses its origin in level-0 pixels. Pyramid levels have independently
//! rounded dimensions, so the translation scales by the level's downsample
//! factor; the library-reported factor is used when available, with the
//! `width0 / widthL` dimension ratio as fallback (the ratio can drift from
//! the true factor by sub-pixel amounts near level boundaries).
//!
//! Every produced tile is exactly [`TILE_SIZE`]×[`TILE_SIZE`] RGB. Tiles at
//! the slide's right/bottom edge carry real pixels only in their top-left
//! `read_width`×`read_height` corner, white elsewhere; tiles addressed fully
//! outside the slide are uniformly white rather than an error.

use image::{imageops, DynamicImage, Rgb, RgbImage, RgbaImage};

use crate::error::SlideError;
use crate::slide::DecoderHandle;

/// Fixed edge length of every served tile, in pixels.
pub const TILE_SIZE: u32 = 256;

/// The in-bounds portion of a tile read, in level and level-0 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlan {
    /// Top-left corner of the read window, in level-0 pixels.
    pub origin_level0: (u32, u32),

    /// Width of the window at the requested level, clipped to the slide.
    pub read_width: u32,

    /// Height of the window at the requested level, clipped to the slide.
    pub read_height: u32,
}

impl TilePlan {
    /// Whether the window covers a full tile (no edge padding needed).
    pub fn is_full(&self) -> bool {
        self.read_width == TILE_SIZE && self.read_height == TILE_SIZE
    }
}

/// Compute the read window for tile `(tile_x, tile_y)` at a level with
/// dimensions `dims_level`, translating the origin into level-0 space.
///
/// `downsample` is the library-reported factor for the level; pass `None` to
/// fall back to the per-axis dimension ratio. Returns `None` when the tile
/// origin lies entirely outside the slide (blank tile).
///
/// All pixel arithmetic is integer after the floor; truncation toward zero,
/// no rounding.
pub fn plan_tile(
    dims_level0: (u32, u32),
    dims_level: (u32, u32),
    downsample: Option<f64>,
    tile_x: u32,
    tile_y: u32,
) -> Option<TilePlan> {
    let (w0, h0) = dims_level0;
    let (wl, hl) = dims_level;
    if wl == 0 || hl == 0 {
        return None;
    }

    let px_l = tile_x.checked_mul(TILE_SIZE)?;
    let py_l = tile_y.checked_mul(TILE_SIZE)?;
    if px_l >= wl || py_l >= hl {
        return None;
    }

    let (scale_x, scale_y) = match downsample.filter(|d| d.is_finite() && *d >= 1.0) {
        Some(d) => (d, d),
        None => (w0 as f64 / wl as f64, h0 as f64 / hl as f64),
    };
    let origin_level0 = (
        (px_l as f64 * scale_x).floor() as u32,
        (py_l as f64 * scale_y).floor() as u32,
    );

    Some(TilePlan {
        origin_level0,
        read_width: TILE_SIZE.min(wl - px_l),
        read_height: TILE_SIZE.min(hl - py_l),
    })
}

/// Produce the fixed-size RGB tile `(level, tile_x, tile_y)` from an open
/// decoder handle.
///
/// Out-of-range levels are rejected with [`SlideError::InvalidLevel`] rather
/// than read out of bounds; a failed region read propagates as
/// [`SlideError::DecodeFailure`].
pub fn compose_tile<H: DecoderHandle + ?Sized>(
    handle: &H,
    level: u32,
    tile_x: u32,
    tile_y: u32,
) -> Result<RgbImage, SlideError> {
    let level_count = handle.level_count();
    if level_count < 1 {
        return Err(SlideError::EmptyPyramid);
    }
    if level >= level_count {
        return Err(SlideError::InvalidLevel { level, level_count });
    }

    let dims0 = handle.level_dimensions(0).ok_or(SlideError::EmptyPyramid)?;
    let dims_level = handle
        .level_dimensions(level)
        .ok_or(SlideError::InvalidLevel { level, level_count })?;

    let Some(plan) = plan_tile(
        dims0,
        dims_level,
        handle.level_downsample(level),
        tile_x,
        tile_y,
    ) else {
        // Tile origin entirely outside the slide: blank white tile, not an
        // error. Viewers probe past the pyramid edge.
        return Ok(blank_tile());
    };

    let region = handle.read_region(
        level,
        plan.origin_level0,
        (plan.read_width, plan.read_height),
    )?;
    let flattened = flatten_onto_white(region);

    if plan.is_full() {
        return Ok(flattened);
    }

    // Partial edge tile: anchor real content at the top-left of a full-size
    // white canvas.
    let mut canvas = blank_tile();
    imageops::replace(&mut canvas, &flattened, 0, 0);
    Ok(canvas)
}

/// A uniformly white tile.
pub fn blank_tile() -> RgbImage {
    RgbImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgb([255, 255, 255]))
}

/// Composite a region over an opaque white background of its own size.
///
/// Fully transparent pixels become white, fully opaque ones keep their color,
/// partial alpha interpolates linearly. Any alpha-bearing pixel layout is
/// composited (converting through 8-bit RGBA); sources without an alpha
/// channel are converted to RGB directly.
pub fn flatten_onto_white(region: DynamicImage) -> RgbImage {
    if region.color().has_alpha() {
        blend_over_white(&region.into_rgba8())
    } else {
        region.to_rgb8()
    }
}

fn blend_over_white(rgba: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let a = src.0[3] as u32;
        let inv = 255 - a;
        for c in 0..3 {
            // out = (src * a + 255 * (255 - a)) / 255, rounded.
            let v = (src.0[c] as u32 * a + 255 * inv + 127) / 255;
            dst.0[c] = v as u8;
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
