//! Input expansion for batch commands.
//!
//! Explicit files are taken as given, whatever their extension; the backend
//! sniffs content and reports what it cannot read. Directories are walked
//! recursively for [supported](crate::imaging::supported_input_extensions)
//! images, sorted per directory argument.
//!
//! The output directory is skipped when it sits inside a walked directory,
//! so a second run never picks up its own `scaled_*` files.

use crate::imaging::is_supported_input;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Expand `paths` into the image files to process.
///
/// `exclude` is typically the output directory. It need not exist.
pub fn collect_sources(paths: &[PathBuf], exclude: Option<&Path>) -> Vec<PathBuf> {
    let exclude = exclude.and_then(|dir| dir.canonicalize().ok());
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            sources.extend(images_in(path, exclude.as_deref()));
        } else {
            sources.push(path.clone());
        }
    }
    sources
}

fn images_in(dir: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
    let is_excluded = |path: &Path| match exclude {
        Some(excluded) => path.canonicalize().is_ok_and(|p| p == excluded),
        None => false,
    };

    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && is_excluded(entry.path())))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_supported_input(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    found
}
