//! # slideserve
//!
//! A deep-zoom tile server for Whole Slide Images (WSI).
//!
//! A microscopy scan is far too large to load at once; it is read as
//! (resolution-level, region) windows on demand through an expensive-to-open
//! decoder handle. This crate serves fixed-size 256×256 tiles from such
//! pyramids to a web viewer, built around two pieces:
//!
//! - **Handle pool**: a bounded, per-slide pool of decoder handles with an
//!   ephemeral fallback when saturated, cross-slide LRU eviction, and a
//!   release-on-drop checkout guard.
//! - **Tile compositor**: level-0 coordinate translation, edge clipping,
//!   alpha flattening over white, and padding of partial edge tiles to the
//!   nominal tile size.
//!
//! ## Architecture
//!
//! - [`slide`] - decoder boundary, handle pool, and directory catalog
//! - [`tile`] - compositing, encoding, and the tile service
//! - [`server`] - Axum-based HTTP routes and handlers
//! - [`config`] - CLI and configuration types
//!
//! The WSI decoding library itself is out of scope: production builds enable
//! the `openslide` cargo feature, tests plug in-memory backends into the
//! [`slide::SlideBackend`] seam.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use slideserve::slide::HandlePool;
//! use slideserve::server::{create_router, AppState, RouterConfig};
//! use slideserve::tile::TileService;
//! # use slideserve::slide::{DecoderHandle, SlideBackend};
//! # use slideserve::error::SlideError;
//! # #[derive(Clone)] struct MyBackend;
//! # struct MyHandle;
//! # impl DecoderHandle for MyHandle {
//! #     fn level_count(&self) -> u32 { 0 }
//! #     fn level_dimensions(&self, _: u32) -> Option<(u32, u32)> { None }
//! #     fn level_downsample(&self, _: u32) -> Option<f64> { None }
//! #     fn read_region(&self, _: u32, _: (u32, u32), _: (u32, u32))
//! #         -> Result<image::DynamicImage, SlideError> { unimplemented!() }
//! # }
//! # impl SlideBackend for MyBackend {
//! #     type Handle = MyHandle;
//! #     fn open(&self, _: &std::path::Path) -> Result<MyHandle, SlideError> { unimplemented!() }
//! # }
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = MyBackend; // e.g. OpenSlideBackend with --features openslide
//!     let pool = HandlePool::new(backend);
//!     let service = TileService::new(pool);
//!     let state = AppState::new(service, PathBuf::from("/data/slides"));
//!     let router = create_router(state, &RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod slide;
pub mod tile;

// Re-export commonly used types
pub use config::Config;
pub use error::{SlideError, TileError};
pub use server::{create_router, ApiError, AppState, ErrorResponse, RouterConfig};
pub use slide::{
    find_slide, list_slides, Acquired, DecoderHandle, HandlePool, ScopedHandle, SlideBackend,
    SlideEntry, SlideInfo,
};
#[cfg(feature = "openslide")]
pub use slide::{OpenSlideBackend, OpenSlideHandle};
pub use tile::{
    compose_tile, plan_tile, TileEncoder, TileFormat, TilePlan, TileRequest, TileService,
    DEFAULT_JPEG_QUALITY, TILE_SIZE,
};
