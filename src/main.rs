//! slideserve - a deep-zoom tile server for Whole Slide Images.
//!
//! Starts the HTTP server and wires the decoder backend, handle pool, tile
//! service, and router together. The pool is constructed here, once, and
//! handed into request handling through `AppState`; there is no lazily
//! initialized global.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slideserve::config::Config;
use slideserve::slide::list_slides;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  Slide directory: {}", config.slide_dir.display());
    info!(
        "  Pool: {} handles/slide, {} slides",
        config.max_handles_per_slide, config.max_pooled_slides
    );
    info!("  JPEG quality: {}", config.jpeg_quality);

    match list_slides(&config.slide_dir) {
        Ok(entries) => info!("  Found {} slide(s)", entries.len()),
        Err(e) => {
            error!(
                "Failed to scan slide directory {}: {}",
                config.slide_dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    serve(config).await
}

#[cfg(feature = "openslide")]
async fn serve(config: Config) -> ExitCode {
    use slideserve::server::{create_router, AppState, RouterConfig};
    use slideserve::slide::{HandlePool, OpenSlideBackend};
    use slideserve::tile::TileService;

    let pool = HandlePool::with_bounds(
        OpenSlideBackend::new(),
        config.max_handles_per_slide,
        config.max_pooled_slides,
    );
    let service = TileService::with_jpeg_quality(pool, config.jpeg_quality);
    let state = AppState::new(service, config.slide_dir.clone())
        .with_cache_max_age(config.cache_max_age);

    let mut router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    if let Some(origins) = config.cors_origins.clone() {
        router_config = router_config.with_cors_origins(origins);
    }
    let router = create_router(state, &router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!("  curl http://{}/api/slides", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Without a decoding backend the server cannot fulfil a single tile
/// request; fail at startup with a clear message, matching the behavior of
/// a missing native library.
#[cfg(not(feature = "openslide"))]
async fn serve(_config: Config) -> ExitCode {
    error!("This build has no slide decoding backend.");
    error!("Rebuild with: cargo build --features openslide (requires libopenslide)");
    ExitCode::FAILURE
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "slideserve=debug,tower_http=debug"
    } else {
        "slideserve=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
