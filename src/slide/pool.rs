//! Bounded pool of decoder handles, keyed by canonical slide path.
//!
//! Opening a WSI decoder handle is expensive (file parsing, pyramid header
//! read), so handles are kept and reused across requests. Per path the pool
//! holds at most `max_per_slide` live handles; when that bound is saturated a
//! request falls back to an ephemeral handle opened and closed outside the
//! pool's bookkeeping, so it never blocks waiting for a pooled handle.
//!
//! The single pool-wide mutex guards only the bookkeeping (map lookup,
//! counter mutation, idle-list push/pop). Opening a handle and reading
//! regions happen outside the lock, so a slow open on one slide cannot stall
//! acquisitions for other slides.
//!
//! Pool keys live in an LRU map bounded by `max_pooled_slides`. Evicting a
//! key drops (closes) its idle handles; a handle released after its key was
//! evicted is closed instead of re-pooled. This keeps the total number of
//! open handles bounded in a long-running process serving many slides.

use std::num::NonZeroUsize;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tracing::{debug, trace};

use crate::error::SlideError;

use super::decoder::SlideBackend;

/// Default maximum number of pooled handles per slide.
pub const DEFAULT_MAX_HANDLES_PER_SLIDE: usize = 4;

/// Default maximum number of slides with pooled handles.
pub const DEFAULT_MAX_POOLED_SLIDES: usize = 64;

// =============================================================================
// Pool
// =============================================================================

/// Per-slide bookkeeping.
///
/// Invariant: `idle.len() + in_use <= max_per_slide` at all times.
struct PoolEntry<H> {
    /// Handles available for reuse, most recently released last.
    idle: Vec<H>,
    /// Handles currently lent out. Not tracked individually.
    in_use: usize,
}

impl<H> Default for PoolEntry<H> {
    fn default() -> Self {
        Self {
            idle: Vec::new(),
            in_use: 0,
        }
    }
}

/// Outcome of [`HandlePool::acquire`].
pub enum Acquired<H> {
    /// A handle lent from the pool; must be given back via `release`.
    Pooled(H),
    /// The per-slide bound is saturated. The caller must open, use, and close
    /// a handle itself, outside the pool's bookkeeping.
    NeedsEphemeral,
}

/// Bounded, per-slide pool of decoder handles.
///
/// Constructed once at process start and shared behind an `Arc`; prefer
/// [`HandlePool::checkout`], which hides the pooled/ephemeral split behind a
/// release-on-drop guard. `acquire`/`release` remain public for callers that
/// need the raw protocol.
pub struct HandlePool<B: SlideBackend> {
    backend: B,
    max_per_slide: usize,
    entries: Mutex<LruCache<PathBuf, PoolEntry<B::Handle>>>,
}

impl<B: SlideBackend> HandlePool<B> {
    /// Create a pool with default bounds.
    pub fn new(backend: B) -> Self {
        Self::with_bounds(
            backend,
            DEFAULT_MAX_HANDLES_PER_SLIDE,
            DEFAULT_MAX_POOLED_SLIDES,
        )
    }

    /// Create a pool with explicit bounds.
    ///
    /// `max_per_slide` is the handle bound per slide path; `max_pooled_slides`
    /// bounds how many slide paths keep pooled handles at once. Zero values
    /// are clamped to one.
    pub fn with_bounds(backend: B, max_per_slide: usize, max_pooled_slides: usize) -> Self {
        let capacity = NonZeroUsize::new(max_pooled_slides.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            backend,
            max_per_slide: max_per_slide.max(1),
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The per-slide handle bound.
    pub fn max_per_slide(&self) -> usize {
        self.max_per_slide
    }

    /// The backend used to open handles.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Acquire a handle for `path`.
    ///
    /// Reuses an idle handle when one exists (no I/O), opens a new one when
    /// the per-slide bound allows it (outside the lock), and returns
    /// [`Acquired::NeedsEphemeral`] when the bound is saturated. An open
    /// failure rolls back the in-use counter before the error propagates.
    ///
    /// Blocking: may perform file I/O. Call from a blocking context.
    pub fn acquire(&self, path: &Path) -> Result<Acquired<B::Handle>, SlideError> {
        let key = canonical_key(path);
        self.acquire_keyed(&key)
    }

    fn acquire_keyed(&self, key: &Path) -> Result<Acquired<B::Handle>, SlideError> {
        // Idle handles from an entry evicted to make room; dropped (closed)
        // after the lock is released.
        let mut evicted_idle: Vec<B::Handle> = Vec::new();

        let decision = {
            let mut entries = self.lock_entries();
            if entries.peek(key).is_none() {
                if let Some((old_key, old_entry)) =
                    entries.push(key.to_path_buf(), PoolEntry::default())
                {
                    debug!(
                        slide = %old_key.display(),
                        idle = old_entry.idle.len(),
                        "evicting pooled handles for least recently used slide"
                    );
                    evicted_idle = old_entry.idle;
                }
            }
            match entries.get_mut(key) {
                Some(entry) => {
                    if let Some(handle) = entry.idle.pop() {
                        entry.in_use += 1;
                        Decision::Reuse(handle)
                    } else if entry.idle.len() + entry.in_use < self.max_per_slide {
                        entry.in_use += 1;
                        Decision::Open
                    } else {
                        Decision::Saturated
                    }
                }
                // The entry was inserted above; unreachable in practice, but
                // degrade to an ephemeral open rather than panic.
                None => Decision::Saturated,
            }
        };
        drop(evicted_idle);

        match decision {
            Decision::Reuse(handle) => {
                trace!(slide = %key.display(), "reusing pooled handle");
                Ok(Acquired::Pooled(handle))
            }
            Decision::Open => {
                // Construct outside the lock; other slides (and other waiters
                // on this slide's idle list) proceed while this opens.
                match self.backend.open(key) {
                    Ok(handle) => {
                        debug!(slide = %key.display(), "opened new pooled handle");
                        Ok(Acquired::Pooled(handle))
                    }
                    Err(err) => {
                        let mut entries = self.lock_entries();
                        if let Some(entry) = entries.peek_mut(key) {
                            entry.in_use = entry.in_use.saturating_sub(1);
                        }
                        Err(err)
                    }
                }
            }
            Decision::Saturated => {
                trace!(slide = %key.display(), "pool saturated, caller opens ephemeral handle");
                Ok(Acquired::NeedsEphemeral)
            }
        }
    }

    /// Return a handle previously lent out by `acquire` for `path`.
    ///
    /// Never fails. If the slide's entry was evicted while the handle was in
    /// flight, or re-pooling would exceed the per-slide bound, the handle is
    /// closed instead.
    pub fn release(&self, path: &Path, handle: B::Handle) {
        let key = canonical_key(path);
        self.release_keyed(&key, handle);
    }

    fn release_keyed(&self, key: &Path, handle: B::Handle) {
        let stray = {
            let mut entries = self.lock_entries();
            match entries.peek_mut(key) {
                Some(entry) => {
                    entry.in_use = entry.in_use.saturating_sub(1);
                    if entry.idle.len() + entry.in_use < self.max_per_slide {
                        entry.idle.push(handle);
                        None
                    } else {
                        Some(handle)
                    }
                }
                None => Some(handle),
            }
        };
        if stray.is_some() {
            debug!(slide = %key.display(), "closing handle released after eviction");
        }
        // Stray handle drops (closes) here, outside the lock.
    }

    /// Check out a handle behind a release-on-drop guard.
    ///
    /// Pooled and ephemeral checkouts behave identically at the use site: the
    /// guard dereferences to the handle and returns it to the pool (or closes
    /// it) when dropped, on every exit path.
    ///
    /// Blocking: may perform file I/O.
    pub fn checkout(self: &Arc<Self>, path: &Path) -> Result<ScopedHandle<B>, SlideError> {
        let key = canonical_key(path);
        match self.acquire_keyed(&key)? {
            Acquired::Pooled(handle) => Ok(ScopedHandle {
                handle: Some(handle),
                pool: Some(Arc::clone(self)),
                key,
            }),
            Acquired::NeedsEphemeral => {
                let handle = self.backend.open(&key)?;
                debug!(slide = %key.display(), "opened ephemeral handle");
                Ok(ScopedHandle {
                    handle: Some(handle),
                    pool: None,
                    key,
                })
            }
        }
    }

    /// Number of idle handles pooled for `path`. Test and diagnostics hook.
    pub fn idle_count(&self, path: &Path) -> usize {
        let key = canonical_key(path);
        let mut entries = self.lock_entries();
        entries.peek(&key).map(|e| e.idle.len()).unwrap_or(0)
    }

    fn lock_entries(&self) -> MutexGuard<'_, LruCache<PathBuf, PoolEntry<B::Handle>>> {
        // Bookkeeping mutation cannot leave the map inconsistent, so a
        // poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum Decision<H> {
    Reuse(H),
    Open,
    Saturated,
}

/// Pool keys are canonicalized so `./a.svs` and `a.svs` share an entry.
/// Falls back to the path as given when canonicalization fails (for instance
/// for synthetic paths in tests).
fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

// =============================================================================
// ScopedHandle
// =============================================================================

/// A checked-out decoder handle that releases itself on drop.
///
/// Whether the handle came from the pool or was opened ephemerally is
/// invisible to the holder; dropping the guard returns a pooled handle and
/// closes an ephemeral one.
pub struct ScopedHandle<B: SlideBackend> {
    handle: Option<B::Handle>,
    /// `Some` for pooled handles, `None` for ephemeral ones.
    pool: Option<Arc<HandlePool<B>>>,
    key: PathBuf,
}

impl<B: SlideBackend> ScopedHandle<B> {
    /// Whether this handle is pooled (as opposed to ephemeral).
    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }
}

impl<B: SlideBackend> Deref for ScopedHandle<B> {
    type Target = B::Handle;

    fn deref(&self) -> &Self::Target {
        // Only vacated in Drop.
        self.handle
            .as_ref()
            .unwrap_or_else(|| unreachable!("handle taken before drop"))
    }
}

impl<B: SlideBackend> Drop for ScopedHandle<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(pool) = &self.pool {
                pool.release_keyed(&self.key, handle);
            }
            // Ephemeral: handle drops here, closing the decoder.
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
