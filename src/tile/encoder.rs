//! Tile encoding to JPEG or PNG bytes.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::TileError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Output format for an encoded tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFormat {
    Jpeg,
    Png,
}

impl TileFormat {
    /// Map a URL file extension to a format. Case-insensitive; both `jpg`
    /// and `jpeg` select JPEG. Returns `None` for unsupported extensions.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// The HTTP `Content-Type` for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Encodes composited RGB tiles at a fixed JPEG quality.
#[derive(Debug, Clone)]
pub struct TileEncoder {
    jpeg_quality: u8,
}

impl Default for TileEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl TileEncoder {
    /// Create an encoder; quality is clamped to 1-100.
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Encode a tile to bytes in the requested format.
    pub fn encode(&self, tile: &RgbImage, format: TileFormat) -> Result<Bytes, TileError> {
        let mut buf = Vec::new();
        match format {
            TileFormat::Jpeg => {
                let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                encoder
                    .encode_image(tile)
                    .map_err(|e| TileError::Encode(e.to_string()))?;
            }
            TileFormat::Png => {
                tile.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                    .map_err(|e| TileError::Encode(e.to_string()))?;
            }
        }
        Ok(Bytes::from(buf))
    }
}

// =============================================================================
// Tests
// =============================================================================
