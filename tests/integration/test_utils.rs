//! Test utilities for integration tests.
//!
//! Provides an in-memory decoder backend with open/live counting and failure
//! injection, plus helpers for building a router over a scratch slide
//! directory.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;
use image::{DynamicImage, Rgba, RgbaImage};

use slideserve::error::SlideError;
use slideserve::server::{create_router, AppState, RouterConfig};
use slideserve::slide::{DecoderHandle, HandlePool, SlideBackend};
use slideserve::tile::TileService;

// =============================================================================
// Mock Decoder Backend
// =============================================================================

/// A decoder handle over a synthetic pyramid filled with a constant color.
pub struct MockHandle {
    levels: Vec<(u32, u32)>,
    fill: Rgba<u8>,
    fail_reads: Arc<AtomicBool>,
    live: Arc<AtomicUsize>,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DecoderHandle for MockHandle {
    fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    fn level_dimensions(&self, level: u32) -> Option<(u32, u32)> {
        self.levels.get(level as usize).copied()
    }

    fn level_downsample(&self, level: u32) -> Option<f64> {
        let (w0, _) = *self.levels.first()?;
        let (wl, _) = *self.levels.get(level as usize)?;
        Some(w0 as f64 / wl as f64)
    }

    fn read_region(
        &self,
        level: u32,
        _origin_level0: (u32, u32),
        size: (u32, u32),
    ) -> Result<DynamicImage, SlideError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SlideError::DecodeFailure("injected read failure".into()));
        }
        if level >= self.level_count() {
            return Err(SlideError::DecodeFailure(format!(
                "level {level} out of range"
            )));
        }
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            size.0, size.1, self.fill,
        )))
    }
}

/// Backend producing [`MockHandle`]s, with shared counters for assertions.
#[derive(Clone)]
pub struct MockBackend {
    levels: Vec<(u32, u32)>,
    fill: Rgba<u8>,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    fail_open: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    open_delay_ms: u64,
}

impl MockBackend {
    pub fn new(levels: Vec<(u32, u32)>) -> Self {
        Self {
            levels,
            fill: Rgba([180, 90, 45, 255]),
            opened: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            fail_open: Arc::new(AtomicBool::new(false)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            open_delay_ms: 0,
        }
    }

    /// A two-level pyramid matching the canonical edge-tile scenario.
    pub fn two_level() -> Self {
        Self::new(vec![(10000, 8000), (5000, 4000)])
    }

    pub fn with_fill(mut self, fill: Rgba<u8>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_open_delay_ms(mut self, millis: u64) -> Self {
        self.open_delay_ms = millis;
        self
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl SlideBackend for MockBackend {
    type Handle = MockHandle;

    fn open(&self, path: &Path) -> Result<Self::Handle, SlideError> {
        if self.open_delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(self.open_delay_ms));
        }
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(SlideError::OpenFailure {
                path: path.display().to_string(),
                message: "injected open failure".into(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(MockHandle {
            levels: self.levels.clone(),
            fill: self.fill,
            fail_reads: Arc::clone(&self.fail_reads),
            live: Arc::clone(&self.live),
        })
    }
}

// =============================================================================
// Scratch slide directory
// =============================================================================

static DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

/// A temporary slide directory, removed on drop.
pub struct ScratchDir {
    pub path: PathBuf,
}

impl ScratchDir {
    /// Create a scratch directory containing empty files with the given
    /// names. File contents are irrelevant to the mock backend.
    pub fn with_files(names: &[&str]) -> Self {
        let path = std::env::temp_dir().join(format!(
            "slideserve-it-{}-{}",
            std::process::id(),
            DIR_SEQ.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&path).unwrap();
        for name in names {
            std::fs::write(path.join(name), b"").unwrap();
        }
        Self { path }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// =============================================================================
// Router helper
// =============================================================================

/// Build a router over `backend` serving slides from `dir`, with tracing
/// disabled to keep test output quiet.
pub fn build_router(backend: MockBackend, dir: &Path) -> Router {
    let service = TileService::new(HandlePool::new(backend));
    let state = AppState::new(service, dir.to_path_buf());
    create_router(state, &RouterConfig::new().with_tracing(false))
}

/// Check JPEG SOI magic bytes.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

/// Check PNG signature bytes.
pub fn is_valid_png(data: &[u8]) -> bool {
    data.len() >= 8 && data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
}
