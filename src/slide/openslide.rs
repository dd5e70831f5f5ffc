//! OpenSlide-backed decoder implementation.
//!
//! Wraps the `openslide-rs` bindings behind the crate's decoder traits. The
//! native libopenslide must be installed; builds without the `openslide`
//! cargo feature carry only the traits and the server refuses to start.
//!
//! OpenSlide's `read_region` addresses its origin in level-0 coordinates and
//! returns RGBA with transparent pixels outside the scanned area, which is
//! exactly the contract [`DecoderHandle`] documents.

use std::path::Path;

use image::DynamicImage;
use openslide_rs::traits::Slide;
use openslide_rs::{Address, OpenSlide, Region, Size};

use crate::error::SlideError;

use super::decoder::{DecoderHandle, SlideBackend};

/// Backend opening slides through the native OpenSlide library.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSlideBackend;

impl OpenSlideBackend {
    pub fn new() -> Self {
        Self
    }
}

/// An open OpenSlide decoder bound to one file.
pub struct OpenSlideHandle {
    slide: OpenSlide,
}

impl SlideBackend for OpenSlideBackend {
    type Handle = OpenSlideHandle;

    fn open(&self, path: &Path) -> Result<Self::Handle, SlideError> {
        let slide = OpenSlide::new(path).map_err(|e| SlideError::OpenFailure {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(OpenSlideHandle { slide })
    }
}

impl DecoderHandle for OpenSlideHandle {
    fn level_count(&self) -> u32 {
        self.slide.get_level_count().unwrap_or(0)
    }

    fn level_dimensions(&self, level: u32) -> Option<(u32, u32)> {
        self.slide
            .get_level_dimensions(level)
            .ok()
            .map(|size| (size.w, size.h))
    }

    fn level_downsample(&self, level: u32) -> Option<f64> {
        self.slide.get_level_downsample(level).ok()
    }

    fn read_region(
        &self,
        level: u32,
        origin_level0: (u32, u32),
        size: (u32, u32),
    ) -> Result<DynamicImage, SlideError> {
        let region = Region {
            size: Size {
                w: size.0,
                h: size.1,
            },
            level,
            address: Address {
                x: origin_level0.0,
                y: origin_level0.1,
            },
        };
        let pixels = self
            .slide
            .read_image_rgba(&region)
            .map_err(|e| SlideError::DecodeFailure(e.to_string()))?;
        Ok(DynamicImage::ImageRgba8(pixels))
    }
}
