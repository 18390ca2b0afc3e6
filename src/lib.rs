//! # Picker Resize
//!
//! Resize-if-needed for freshly picked images. Hand it a path and up to
//! three hints (max width, max height, quality); it hands back a path to use.
//! That is either the original file untouched, or a scaled copy written to an
//! output directory as `scaled_<file name>`.
//!
//! ```text
//! /picked/IMG_0042.jpg  ──(max 1000x1000, q 80)──→  scaled/scaled_IMG_0042.jpg
//! /picked/IMG_0042.jpg  ──(no hints)─────────────→  /picked/IMG_0042.jpg
//! /picked/broken.jpg    ──(any hints)────────────→  /picked/broken.jpg
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resizer`] | The decision flow: probe, decide, scale, copy EXIF, fall back |
//! | [`imaging`] | Target size and sample size math, the backend trait, the `image`-crate backend |
//! | [`metadata`] | EXIF whitelist copy from source to scaled output |
//! | [`naming`] | `scaled_` output file naming |
//! | [`cache`] | Content-addressed manifest so unchanged sources are not re-encoded |
//! | [`config`] | `resize.toml` loading, merging over stock defaults, validation |
//! | [`sources`] | Expands file and directory arguments into images, skipping the output directory |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Upscale
//!
//! Hints are upper bounds. A 640x480 photo asked to fit 1000x1000 stays
//! 640x480; only the quality hint (if any) has an effect. Aspect ratio is
//! always preserved, with the tighter bound winning.
//!
//! ## Fall Back, Don't Fail
//!
//! A picker must always produce a usable path. An image whose bounds cannot
//! be read, or whose pixels fail to decode, is returned as-is and logged at
//! `warn`. EXIF copy failures are logged too, and leave the scaled image
//! without metadata. Only genuine write failures (the output directory cannot
//! be created, the encoder cannot write) surface as errors.
//!
//! ## Power-of-Two Subsampling
//!
//! Before the final filtered resize, large sources are first reduced by the
//! largest power of two that keeps both edges at or above the target. This
//! keeps huge camera images cheap to downscale and matches how mobile decoders
//! subsample, see [`imaging::calculate_sample_size`].
//!
//! ## Alpha Picks the Format
//!
//! Output with an alpha channel is written as PNG and the quality hint is
//! ignored; everything else is JPEG at the requested quality. The output name
//! keeps the source extension regardless, see [`naming`].

pub mod cache;
pub mod config;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod resizer;
pub mod sources;

pub use resizer::{ImageResizer, ResizeError, ResizeOutcome, ResizeRequest};

#[cfg(test)]
pub(crate) mod test_helpers;
