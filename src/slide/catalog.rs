//! Directory catalog: maps slide identifiers to files on disk.
//!
//! The server exposes one configured directory of slide files. A slide id is
//! the file stem (URL-safe, no extension); the catalog resolves ids back to
//! paths by probing the supported extensions. Identifiers containing path
//! separators or parent components never resolve, so a request cannot escape
//! the slide directory.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Extensions the decoding backend can read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "ndpi", "svs", "tif", "tiff", "vms", "vmu", "scn", "bif", "mrxs",
];

/// One slide visible in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideEntry {
    /// File stem, used as the URL identifier.
    pub id: String,

    /// Original file name including extension.
    pub name: String,
}

/// List slide files with a supported extension in `dir`, sorted by id.
///
/// When several files share a stem (e.g. `scan.svs` and `scan.tif`), the one
/// whose extension comes first in [`SUPPORTED_EXTENSIONS`] wins, so the
/// listed `name` is the file `find_slide` resolves the id to.
pub fn list_slides(dir: &Path) -> io::Result<Vec<SlideEntry>> {
    // stem -> (extension priority, file name)
    let mut best: std::collections::HashMap<String, (usize, String)> =
        std::collections::HashMap::new();

    for dir_entry in std::fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(rank) = extension_rank(&path) else {
            continue;
        };
        let (Some(stem), Some(name)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.file_name().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        match best.get(stem) {
            Some((kept, _)) if *kept <= rank => {}
            _ => {
                best.insert(stem.to_string(), (rank, name.to_string()));
            }
        }
    }

    let mut entries: Vec<SlideEntry> = best
        .into_iter()
        .map(|(id, (_, name))| SlideEntry { id, name })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(entries)
}

/// Resolve a slide id to a file path, probing supported extensions in order.
///
/// Returns `None` for unknown ids and for ids that are not plain file stems.
pub fn find_slide(dir: &Path, slide_id: &str) -> Option<PathBuf> {
    if !is_plain_stem(slide_id) {
        return None;
    }
    for ext in SUPPORTED_EXTENSIONS {
        let candidate = dir.join(format!("{slide_id}.{ext}"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Position of the file's extension in [`SUPPORTED_EXTENSIONS`], or `None`
/// for unsupported files. Doubles as the stem-collision tie-break so listing
/// and resolution agree.
fn extension_rank(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().position(|e| *e == ext)
}

/// An id must be a bare stem: no separators, no parent traversal, non-empty.
fn is_plain_stem(slide_id: &str) -> bool {
    !slide_id.is_empty()
        && !slide_id.contains('/')
        && !slide_id.contains('\\')
        && slide_id != "."
        && slide_id != ".."
}

// =============================================================================
// Tests
// =============================================================================
