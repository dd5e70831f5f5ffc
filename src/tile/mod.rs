//! Tile pipeline: compositing, encoding, and the request-facing service.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              TileService                │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  compositor  │  │   TileEncoder   │  │
//! │  │ (clip, pad,  │  │  (JPEG / PNG)   │  │
//! │  │  flatten)    │  │                 │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              HandlePool                 │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Tiles are rendered per request and never cached; the only reuse in the
//! system is of open decoder handles.

mod compositor;
mod encoder;
mod service;

pub use compositor::{blank_tile, compose_tile, flatten_onto_white, plan_tile, TilePlan, TILE_SIZE};
pub use encoder::{TileEncoder, TileFormat, DEFAULT_JPEG_QUALITY};
pub use service::{TileRequest, TileService};
