//! CLI output formatting.
//!
//! Every image gets a header line naming the source file, then indented
//! context lines describing what happened to it.
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! IMG_0042.jpg
//!     4000x3000 → 1000x750 (jpeg)
//!     Output: scaled/scaled_IMG_0042.jpg
//!     EXIF: 12 fields
//!     Cache: encoded
//! pngImage.png
//!     Unchanged: no resize hints given
//!
//! Resized 1 image, 1 unchanged
//! Cache: 1 encoded
//! ```
//!
//! ## Identify
//!
//! ```text
//! IMG_0042.jpg: 4000x3000
//! broken.jpg: unreadable (Failed to decode broken.jpg: ...)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::imaging::{BackendError, Dimensions};
use crate::resizer::{ResizeError, ResizeOutcome, UnchangedReason};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Display name for a source: its file name, or the whole path if it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn dims(d: Dimensions) -> String {
    format!("{}x{}", d.width, d.height)
}

fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

fn unchanged_reason(reason: UnchangedReason) -> &'static str {
    match reason {
        UnchangedReason::NotRequested => "no resize hints given",
        UnchangedReason::Unreadable => "image bounds unreadable",
        UnchangedReason::DecodeFailed => "image could not be decoded",
    }
}

// ============================================================================
// Resize
// ============================================================================

/// Format the result of resizing one source.
pub fn format_resize_result(
    source: &Path,
    result: &Result<ResizeOutcome, ResizeError>,
) -> Vec<String> {
    let ctx = indent(1);
    let mut lines = vec![display_name(source)];

    match result {
        Ok(ResizeOutcome::Unchanged { reason, .. }) => {
            lines.push(format!("{ctx}Unchanged: {}", unchanged_reason(*reason)));
        }
        Ok(ResizeOutcome::Scaled {
            path,
            original,
            scaled,
            format,
            cache,
            exif_fields,
        }) => {
            let size = match format {
                Some(format) => format!("{} → {} ({format})", dims(*original), dims(*scaled)),
                None => format!("{} → {}", dims(*original), dims(*scaled)),
            };
            lines.push(format!("{ctx}{size}"));
            lines.push(format!("{ctx}Output: {}", path.display()));
            if *exif_fields > 0 {
                lines.push(format!(
                    "{ctx}EXIF: {}",
                    pluralize(*exif_fields, "field", "fields")
                ));
            }
            lines.push(format!("{ctx}Cache: {cache}"));
        }
        Err(e) => {
            lines.push(format!("{ctx}Error: {e}"));
        }
    }

    lines
}

/// Tally of a batch run, for the summary line.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub resized: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub cache: CacheStats,
}

impl BatchSummary {
    pub fn record(&mut self, result: &Result<ResizeOutcome, ResizeError>) {
        match result {
            Ok(ResizeOutcome::Scaled { cache, .. }) => {
                self.resized += 1;
                self.cache.record(*cache);
            }
            Ok(ResizeOutcome::Unchanged { .. }) => self.unchanged += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Format the closing summary of a batch resize.
///
/// The cache line only appears when something was resized.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut parts = vec![format!(
        "Resized {}",
        pluralize(summary.resized, "image", "images")
    )];
    if summary.unchanged > 0 {
        parts.push(format!("{} unchanged", summary.unchanged));
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed));
    }

    let mut lines = vec![parts.join(", ")];
    if summary.cache.total() > 0 {
        lines.push(format!("Cache: {}", summary.cache));
    }
    lines
}

pub fn print_resize_result(source: &Path, result: &Result<ResizeOutcome, ResizeError>) {
    for line in format_resize_result(source, result) {
        println!("{}", line);
    }
}

pub fn print_batch_summary(summary: &BatchSummary) {
    println!();
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Identify
// ============================================================================

/// Format a bounds probe result on one line.
pub fn format_identify(source: &Path, result: &Result<Dimensions, BackendError>) -> String {
    match result {
        Ok(d) => format!("{}: {}", display_name(source), dims(*d)),
        Err(e) => format!("{}: unreadable ({e})", display_name(source)),
    }
}

pub fn print_identify(source: &Path, result: &Result<Dimensions, BackendError>) {
    println!("{}", format_identify(source, result));
}
