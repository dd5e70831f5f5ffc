//! Configuration for the tile server.
//!
//! Options come from command-line arguments via clap, with environment
//! variable fallbacks under the `WSI_` prefix:
//!
//! - `WSI_DIR` - directory containing slide files (required)
//! - `WSI_HOST` - server bind address (default: 0.0.0.0)
//! - `WSI_PORT` - server port (default: 8000)
//! - `WSI_MAX_HANDLES` - pooled decoder handles per slide (default: 4)
//! - `WSI_MAX_POOLED_SLIDES` - slides with pooled handles (default: 64)
//! - `WSI_JPEG_QUALITY` - JPEG quality for tiles (default: 85)
//! - `WSI_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `WSI_CORS_ORIGINS` - allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::Parser;

use crate::slide::{DEFAULT_MAX_HANDLES_PER_SLIDE, DEFAULT_MAX_POOLED_SLIDES};
use crate::tile::DEFAULT_JPEG_QUALITY;

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// slideserve - a deep-zoom tile server for Whole Slide Images.
///
/// Serves fixed-size tiles from pyramidal microscopy scans in a local
/// directory, reading only the requested region of each slide on demand.
#[derive(Parser, Debug, Clone)]
#[command(name = "slideserve")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory containing the slide files.
    #[arg(long, env = "WSI_DIR")]
    pub slide_dir: PathBuf,

    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "WSI_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "WSI_PORT")]
    pub port: u16,

    /// Maximum pooled decoder handles per slide.
    ///
    /// Additional concurrent requests for the same slide fall back to
    /// ephemeral handles opened and closed per request.
    #[arg(long, default_value_t = DEFAULT_MAX_HANDLES_PER_SLIDE, env = "WSI_MAX_HANDLES")]
    pub max_handles_per_slide: usize,

    /// Maximum number of slides that keep pooled handles.
    ///
    /// The least recently used slide's handles are closed when the bound is
    /// exceeded.
    #[arg(long, default_value_t = DEFAULT_MAX_POOLED_SLIDES, env = "WSI_MAX_POOLED_SLIDES")]
    pub max_pooled_slides: usize,

    /// JPEG quality for tile encoding (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "WSI_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// HTTP Cache-Control max-age in seconds for tile responses.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "WSI_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated). Allows any origin when unset.
    #[arg(long, env = "WSI_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.slide_dir.is_dir() {
            return Err(format!(
                "slide directory does not exist or is not a directory: {}",
                self.slide_dir.display()
            ));
        }
        if self.max_handles_per_slide == 0 {
            return Err("max_handles_per_slide must be greater than 0".to_string());
        }
        if self.max_pooled_slides == 0 {
            return Err("max_pooled_slides must be greater than 0".to_string());
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }
        Ok(())
    }

    /// The server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
