//! Resize-if-needed: the decision logic around the imaging backend.
//!
//! [`ImageResizer::resize_image_if_needed`] is the entry point. Given a
//! picked image and three optional hints (max width, max height, quality) it
//! either hands back the original path untouched or writes a scaled copy into
//! the output directory and returns that path instead.
//!
//! ## Flow
//!
//! ```text
//! identify (bounds only) ── unreadable ──────────────→ original path
//!        │
//!   any hint given? ── no ───────────────────────────→ original path
//!        │ yes
//!   target size + sample size
//!        │
//!   cache hit? ── yes ───────────────────────────────→ cached output
//!        │ no
//!   create output dir, scale ── decode failed ───────→ original path
//!        │
//!   copy EXIF (failures logged, never fatal)
//!        │
//!        └───────────────────────────────────────────→ <output_dir>/scaled_<name>
//! ```
//!
//! The bounds probe always runs, even without hints, so a file that cannot
//! be read is never reported as "resized". A scale only happens when at
//! least one hint is present; a quality hint alone re-encodes at full size.

use crate::cache::{self, CacheManifest, CacheStatus, ScaleKey};
use crate::config::ResizeConfig;
use crate::imaging::{
    BackendError, Dimensions, Filter, ImageBackend, OutputFormat, Quality, RustBackend,
    ScaleParams, calculate_sample_size, calculate_target_size,
};
use crate::metadata::{ExifCopier, ExifError};
use crate::naming;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Invalid {name} hint: {value} (must be a positive, finite number)")]
    InvalidDimension { name: &'static str, value: f64 },
    #[error("Source path has no file name: {0}")]
    InvalidSourcePath(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Invalid EXIF configuration: {0}")]
    Exif(#[from] ExifError),
    #[error("Output {0} is already written by an earlier source in this batch")]
    OutputConflict(PathBuf),
}

/// Caller-supplied resize hints.
///
/// Any `Some` field means a resize is wanted. Width and height cap their
/// edge; quality only affects lossy (JPEG) output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResizeRequest {
    max_width: Option<f64>,
    max_height: Option<f64>,
    quality: Option<Quality>,
}

impl ResizeRequest {
    /// Build a request, rejecting hints that are NaN, infinite, zero or negative.
    pub fn new(
        max_width: Option<f64>,
        max_height: Option<f64>,
        quality: Option<u32>,
    ) -> Result<Self, ResizeError> {
        check_dimension("max width", max_width)?;
        check_dimension("max height", max_height)?;
        Ok(Self {
            max_width,
            max_height,
            quality: quality.map(Quality::new),
        })
    }

    /// A request with no hints; never resizes.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn max_width(&self) -> Option<f64> {
        self.max_width
    }

    pub fn max_height(&self) -> Option<f64> {
        self.max_height
    }

    pub fn quality(&self) -> Option<Quality> {
        self.quality
    }

    /// Whether any hint is present.
    pub fn needs_resize(&self) -> bool {
        self.max_width.is_some() || self.max_height.is_some() || self.quality.is_some()
    }
}

fn check_dimension(name: &'static str, value: Option<f64>) -> Result<(), ResizeError> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(ResizeError::InvalidDimension { name, value: v }),
        _ => Ok(()),
    }
}

/// Why a resize left the original file in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnchangedReason {
    /// No hint was given.
    NotRequested,
    /// The bounds probe failed.
    Unreadable,
    /// Bounds were readable but the full decode failed.
    DecodeFailed,
}

/// Result of a single resize.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    Unchanged {
        path: PathBuf,
        reason: UnchangedReason,
    },
    Scaled {
        path: PathBuf,
        original: Dimensions,
        scaled: Dimensions,
        /// `None` when served from the cache without re-encoding.
        format: Option<OutputFormat>,
        cache: CacheStatus,
        /// EXIF fields written onto the output (0 on cache hits).
        exif_fields: usize,
    },
}

impl ResizeOutcome {
    /// The path callers should use from now on.
    pub fn path(&self) -> &Path {
        match self {
            ResizeOutcome::Unchanged { path, .. } | ResizeOutcome::Scaled { path, .. } => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            ResizeOutcome::Unchanged { path, .. } | ResizeOutcome::Scaled { path, .. } => path,
        }
    }
}

/// Encoding and naming options for an [`ImageResizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeOptions {
    pub prefix: String,
    /// Quality used when a size hint arrives without a quality hint.
    pub default_quality: Quality,
    pub filter: Filter,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            prefix: naming::DEFAULT_PREFIX.to_string(),
            default_quality: Quality::default(),
            filter: Filter::default(),
        }
    }
}

/// Writes scaled copies of images into an output directory.
pub struct ImageResizer<B: ImageBackend = RustBackend> {
    output_dir: PathBuf,
    backend: B,
    exif: Option<ExifCopier>,
    exif_tags: Vec<String>,
    options: ResizeOptions,
    cache: Option<Mutex<CacheManifest>>,
}

impl ImageResizer<RustBackend> {
    /// Build a resizer from loaded configuration.
    ///
    /// `output_dir` overrides `config.output_dir` when given.
    pub fn from_config(
        config: &ResizeConfig,
        output_dir: Option<&Path>,
    ) -> Result<Self, ResizeError> {
        let dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&config.output_dir));
        let exif = if config.exif.copy {
            Some(ExifCopier::from_tag_names(config.exif.tags.as_slice())?)
        } else {
            None
        };
        let resizer = ImageResizer::new(dir, RustBackend::new(), exif).with_options(ResizeOptions {
            prefix: config.prefix.clone(),
            default_quality: Quality::new(config.images.default_quality),
            filter: config.images.filter,
        });
        Ok(resizer.with_cache(config.cache.enabled))
    }
}

impl<B: ImageBackend> ImageResizer<B> {
    /// Create a resizer writing into `output_dir`, with caching off.
    ///
    /// `exif` is `None` to skip EXIF carry-over entirely.
    pub fn new(output_dir: impl Into<PathBuf>, backend: B, exif: Option<ExifCopier>) -> Self {
        let exif_tags = exif
            .as_ref()
            .map(|copier| copier.tag_names().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            output_dir: output_dir.into(),
            backend,
            exif,
            exif_tags,
            options: ResizeOptions::default(),
            cache: None,
        }
    }

    pub fn with_options(mut self, options: ResizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable the scaled-output cache.
    ///
    /// Enabling loads `.resize-cache.json` from the output directory if present.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(|| Mutex::new(CacheManifest::load(&self.output_dir)));
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resize `image_path` if any hint is given and return the path to use.
    ///
    /// Returns the original path when no hint is given, or when the image
    /// cannot be read or decoded. Returns `<output_dir>/<prefix><file name>`
    /// otherwise. The output directory is created if missing.
    pub fn resize_image_if_needed(
        &self,
        image_path: impl AsRef<Path>,
        max_width: Option<f64>,
        max_height: Option<f64>,
        quality: Option<u32>,
    ) -> Result<PathBuf, ResizeError> {
        let request = ResizeRequest::new(max_width, max_height, quality)?;
        self.resize(image_path.as_ref(), &request)
            .map(ResizeOutcome::into_path)
    }

    /// Resize with a prepared request, reporting what happened.
    pub fn resize(&self, source: &Path, request: &ResizeRequest) -> Result<ResizeOutcome, ResizeError> {
        let unchanged = |reason| ResizeOutcome::Unchanged {
            path: source.to_path_buf(),
            reason,
        };

        let original = match self.backend.identify(source) {
            Ok(dims) => dims,
            Err(e) => {
                tracing::warn!(source = %source.display(), error = %e, "cannot read image bounds; keeping original");
                return Ok(unchanged(UnchangedReason::Unreadable));
            }
        };

        if !request.needs_resize() {
            tracing::debug!(source = %source.display(), "no resize hints; keeping original");
            return Ok(unchanged(UnchangedReason::NotRequested));
        }

        let (width, height) =
            calculate_target_size(original.as_tuple(), request.max_width, request.max_height);
        let sample_size = calculate_sample_size(original.as_tuple(), (width, height));
        let quality = request.quality.unwrap_or(self.options.default_quality);

        let output = naming::scaled_output_path(&self.output_dir, source, &self.options.prefix)
            .ok_or_else(|| ResizeError::InvalidSourcePath(source.to_path_buf()))?;
        let scaled = Dimensions { width, height };

        let cache_keys = match &self.cache {
            Some(_) => Some(self.cache_keys(source, scaled, sample_size, quality)?),
            None => None,
        };

        if let Some((source_hash, params_hash)) = &cache_keys {
            if let Some(status) = self.try_cached(source_hash, params_hash, &output)? {
                tracing::debug!(output = %output.display(), %status, "serving scaled image from cache");
                return Ok(ResizeOutcome::Scaled {
                    path: output,
                    original,
                    scaled,
                    format: None,
                    cache: status,
                    exif_fields: 0,
                });
            }
        }

        std::fs::create_dir_all(&self.output_dir)?;

        let params = ScaleParams {
            source: source.to_path_buf(),
            output: output.clone(),
            width,
            height,
            sample_size,
            quality,
            filter: self.options.filter,
        };
        let format = match self.backend.scale(&params) {
            Ok(format) => format,
            Err(BackendError::Decode { path, reason }) => {
                tracing::warn!(source = %path, %reason, "cannot decode image; keeping original");
                return Ok(unchanged(UnchangedReason::DecodeFailed));
            }
            Err(e) => return Err(e.into()),
        };

        let exif_fields = self.copy_exif(source, &output);

        if let Some((source_hash, params_hash)) = cache_keys {
            self.remember(&output, source_hash, params_hash);
        }

        tracing::debug!(
            source = %source.display(),
            output = %output.display(),
            from = ?original.as_tuple(),
            to = ?scaled.as_tuple(),
            %format,
            "wrote scaled image"
        );

        Ok(ResizeOutcome::Scaled {
            path: output,
            original,
            scaled,
            format: Some(format),
            cache: CacheStatus::Encoded,
            exif_fields,
        })
    }

    /// Resize many images in parallel with the same hints.
    ///
    /// Results come back in input order. One failure does not stop the rest.
    /// Sources sharing a file name (e.g. `a/IMG.png` and `b/IMG.png`) would
    /// write the same output; only the first is resized, the others fail
    /// with [`ResizeError::OutputConflict`].
    pub fn resize_all(
        &self,
        sources: &[PathBuf],
        request: &ResizeRequest,
    ) -> Vec<(PathBuf, Result<ResizeOutcome, ResizeError>)> {
        let conflicts = self.output_conflicts(sources, request);
        sources
            .par_iter()
            .zip(conflicts)
            .map(|(source, conflict)| {
                let result = match conflict {
                    Some(output) => {
                        tracing::warn!(
                            source = %source.display(),
                            output = %output.display(),
                            "skipping source whose output name is already taken"
                        );
                        Err(ResizeError::OutputConflict(output))
                    }
                    None => self.resize(source, request),
                };
                (source.clone(), result)
            })
            .collect()
    }

    /// For each source, the output path it would share with an earlier source.
    fn output_conflicts(&self, sources: &[PathBuf], request: &ResizeRequest) -> Vec<Option<PathBuf>> {
        if !request.needs_resize() {
            return vec![None; sources.len()];
        }
        let mut claimed = HashSet::new();
        sources
            .iter()
            .map(|source| {
                let output =
                    naming::scaled_output_path(&self.output_dir, source, &self.options.prefix)?;
                if claimed.insert(output.clone()) {
                    None
                } else {
                    Some(output)
                }
            })
            .collect()
    }

    fn copy_exif(&self, source: &Path, output: &Path) -> usize {
        let Some(copier) = &self.exif else {
            return 0;
        };
        match copier.copy(source, output) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    source = %source.display(),
                    output = %output.display(),
                    error = %e,
                    "failed to copy EXIF metadata"
                );
                0
            }
        }
    }

    fn cache_keys(
        &self,
        source: &Path,
        scaled: Dimensions,
        sample_size: u32,
        quality: Quality,
    ) -> Result<(String, String), ResizeError> {
        let source_hash = cache::hash_file(source)?;
        let params_hash = cache::hash_scale_params(&ScaleKey {
            width: scaled.width,
            height: scaled.height,
            sample_size,
            quality,
            filter: self.options.filter,
            exif_tags: self.exif.as_ref().map(|_| self.exif_tags.as_slice()),
        });
        Ok((source_hash, params_hash))
    }

    /// Check the cache, copying a hit stored under another name into place.
    fn try_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        output: &Path,
    ) -> Result<Option<CacheStatus>, ResizeError> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let Some(file_name) = output.file_name().map(|n| n.to_string_lossy()) else {
            return Ok(None);
        };
        let stored = {
            let manifest = cache.lock().unwrap_or_else(|e| e.into_inner());
            manifest.find_cached(&file_name, source_hash, params_hash, &self.output_dir)
        };
        let Some(stored) = stored else {
            return Ok(None);
        };

        let stored_path = self.output_dir.join(&stored);
        if stored_path == output {
            return Ok(Some(CacheStatus::Cached));
        }
        std::fs::copy(&stored_path, output)?;
        self.remember(output, source_hash.to_string(), params_hash.to_string());
        Ok(Some(CacheStatus::Copied))
    }

    fn remember(&self, output: &Path, source_hash: String, params_hash: String) {
        let (Some(cache), Some(name)) = (&self.cache, output.file_name()) else {
            return;
        };
        let mut manifest = cache.lock().unwrap_or_else(|e| e.into_inner());
        manifest.insert(name.to_string_lossy().into_owned(), source_hash, params_hash);
        if let Err(e) = manifest.save(&self.output_dir) {
            tracing::warn!(error = %e, "failed to save resize cache");
        }
    }
}
