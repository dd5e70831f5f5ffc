use thiserror::Error;

/// Errors raised by the decoder boundary and the handle pool.
///
/// These are the core failure modes of slide access: a handle that cannot be
/// constructed, a pyramid with no levels, a region read that fails against an
/// already-open handle, and a level index outside the pyramid.
#[derive(Debug, Clone, Error)]
pub enum SlideError {
    /// The decoding backend could not open or parse the file.
    ///
    /// Never retried. The pool rolls back its in-use counter before this
    /// propagates, so bookkeeping stays consistent.
    #[error("could not open slide {path}: {message}")]
    OpenFailure { path: String, message: String },

    /// The file opened but reports zero resolution levels.
    #[error("slide reports no pyramid levels")]
    EmptyPyramid,

    /// A region read against an open handle failed.
    ///
    /// The handle is still returned to the pool afterwards; a read error does
    /// not poison the handle.
    #[error("region read failed: {0}")]
    DecodeFailure(String),

    /// Requested level is outside `[0, level_count)`.
    #[error("invalid level {level}: slide has {level_count} levels")]
    InvalidLevel { level: u32, level_count: u32 },
}

/// Errors from the tile pipeline (compositing plus encoding).
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// Failure at the slide/pool boundary.
    #[error(transparent)]
    Slide(#[from] SlideError),

    /// The composited pixel buffer could not be encoded.
    #[error("failed to encode tile: {0}")]
    Encode(String),

    /// The blocking worker task running the decode/encode panicked or was
    /// cancelled.
    #[error("tile worker task failed: {0}")]
    Worker(String),
}
