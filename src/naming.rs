//! Output naming for scaled images.
//!
//! A scaled copy keeps the source's full file name, extension included, with
//! a prefix in front:
//!
//! ```text
//! /picked/IMG_0042.jpg  →  <output_dir>/scaled_IMG_0042.jpg
//! /picked/pngImage.png  →  <output_dir>/scaled_pngImage.png
//! ```
//!
//! The extension is deliberately left alone even when the encoder switches
//! format (an opaque PNG is written as JPEG). Callers that picked
//! `pngImage.png` get back a path they recognise; decoders sniff content.

use std::path::{Path, PathBuf};

/// Default prefix for scaled output files.
pub const DEFAULT_PREFIX: &str = "scaled_";

/// Build the scaled file name for `source`.
///
/// Returns `None` when the path has no final component (e.g. `/` or `..`).
pub fn scaled_file_name(source: &Path, prefix: &str) -> Option<String> {
    let name = source.file_name()?.to_string_lossy();
    Some(format!("{prefix}{name}"))
}

/// Build the full output path for `source` inside `output_dir`.
pub fn scaled_output_path(output_dir: &Path, source: &Path, prefix: &str) -> Option<PathBuf> {
    scaled_file_name(source, prefix).map(|name| output_dir.join(name))
}

/// Whether `prefix` is usable as a file name prefix.
///
/// It must be non-empty and must not smuggle in path separators, otherwise
/// outputs could land outside the output directory.
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && !prefix.contains(['/', '\\']) && prefix != "." && prefix != ".."
}
