//! Slide access layer: decoder boundary, handle pool, and directory catalog.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              Tile Service               │
//! └────────────────────┬────────────────────┘
//!                      │ checkout / release
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              HandlePool                 │
//! │   (bounded per-slide handle reuse,      │
//! │    ephemeral fallback on saturation)    │
//! └────────────────────┬────────────────────┘
//!                      │ open
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     SlideBackend / DecoderHandle        │
//! │   (opaque WSI decoding capability)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The decoding library itself is out of scope; production builds wire the
//! OpenSlide-backed implementation in [`openslide`] behind the `openslide`
//! cargo feature.

mod catalog;
mod decoder;
#[cfg(feature = "openslide")]
mod openslide;
mod pool;

pub use catalog::{find_slide, list_slides, SlideEntry, SUPPORTED_EXTENSIONS};
pub use decoder::{DecoderHandle, SlideBackend, SlideInfo};
#[cfg(feature = "openslide")]
pub use openslide::{OpenSlideBackend, OpenSlideHandle};
pub use pool::{
    Acquired, HandlePool, ScopedHandle, DEFAULT_MAX_HANDLES_PER_SLIDE, DEFAULT_MAX_POOLED_SLIDES,
};

// =============================================================================
// Test support
// =============================================================================
