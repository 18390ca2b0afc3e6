//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Bounds probe | `ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate, format guessed from content |
//! | Subsample | `DynamicImage::resize_exact` with `Nearest` by the sample factor |
//! | Resize | `DynamicImage::resize_exact` with the configured filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (alpha sources only) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, Quality, ScaleParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [supported extensions](supported_input_extensions).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<File>>, BackendError> {
    // Picked files often carry the wrong extension, so sniff the content.
    ImageReader::open(path)?
        .with_guessed_format()
        .map_err(BackendError::Io)
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?
        .decode()
        .map_err(|e| decode_error(path, e))
}

/// Shrink by an integer factor the way a subsampled decode would.
fn subsample(img: DynamicImage, sample_size: u32) -> DynamicImage {
    if sample_size <= 1 {
        return img;
    }
    let width = (img.width() / sample_size).max(1);
    let height = (img.height() / sample_size).max(1);
    img.resize_exact(width, height, FilterType::Nearest)
}

/// Encode in memory, choosing PNG for alpha sources and JPEG otherwise.
fn encode_image(img: &DynamicImage, quality: Quality) -> Result<(Vec<u8>, OutputFormat), BackendError> {
    let mut bytes = Vec::new();

    if img.color().has_alpha() {
        tracing::debug!("quality is not applied to PNG output; writing lossless");
        let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
        img.write_with_encoder(encoder)
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
        return Ok((bytes, OutputFormat::Png));
    }

    // The JPEG encoder only takes 8-bit luma or RGB.
    let opaque = if img.color().has_color() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        DynamicImage::ImageLuma8(img.to_luma8())
    };
    let quality = u8::try_from(quality.value()).unwrap_or(100);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    opaque
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok((bytes, OutputFormat::Jpeg))
}

/// Encode, then write. The output file is only touched once encoding succeeded.
fn save_image(img: &DynamicImage, path: &Path, quality: Quality) -> Result<OutputFormat, BackendError> {
    let (bytes, format) = encode_image(img, quality)?;
    std::fs::write(path, bytes)?;
    Ok(format)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?
            .into_dimensions()
            .map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn scale(&self, params: &ScaleParams) -> Result<OutputFormat, BackendError> {
        let img = load_image(&params.source)?;
        let sampled = subsample(img, params.sample_size);
        let resized = sampled.resize_exact(params.width, params.height, params.filter.filter_type());
        tracing::debug!(
            source = %params.source.display(),
            width = params.width,
            height = params.height,
            sample_size = params.sample_size,
            filter = %params.filter,
            "scaled image"
        );
        save_image(&resized, &params.output, params.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Filter;
    use crate::test_helpers::{write_jpeg, write_png};
    use tempfile::TempDir;

    fn params(source: &Path, output: &Path, width: u32, height: u32) -> ScaleParams {
        ScaleParams {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            width,
            height,
            sample_size: 1,
            quality: Quality::default(),
            filter: Filter::Triangle,
        }
    }

    #[test]
    fn supported_extensions_cover_common_photo_formats() {
        let exts = supported_input_extensions();
        for ext in ["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(exts.contains(&ext), "missing {ext}");
        }
    }

    #[test]
    fn is_supported_input_ignores_case() {
        assert!(is_supported_input(Path::new("/a/IMG_0001.JPG")));
        assert!(is_supported_input(Path::new("shot.webp")));
        assert!(!is_supported_input(Path::new("notes.txt")));
        assert!(!is_supported_input(Path::new("no_extension")));
    }

    #[test]
    fn identify_reads_dimensions() {
        let tmp = TempDir::new().unwrap();
        let path = write_png(tmp.path(), "probe.png", 64, 32, false);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims.as_tuple(), (64, 32));
    }

    #[test]
    fn identify_sniffs_content_over_extension() {
        let tmp = TempDir::new().unwrap();
        let jpeg = write_jpeg(tmp.path(), "photo.jpg", 40, 20);
        let mislabeled = tmp.path().join("photo.png");
        std::fs::rename(&jpeg, &mislabeled).unwrap();

        let dims = RustBackend::new().identify(&mislabeled).unwrap();
        assert_eq!(dims.as_tuple(), (40, 20));
    }

    #[test]
    fn identify_garbage_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("garbage.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn identify_missing_file_is_io_error() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/missing.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn scale_opaque_source_writes_jpeg() {
        let tmp = TempDir::new().unwrap();
        let source = write_png(tmp.path(), "opaque.png", 100, 50, false);
        let output = tmp.path().join("scaled_opaque.png");

        let format = RustBackend::new()
            .scale(&params(&source, &output, 50, 25))
            .unwrap();
        assert_eq!(format, OutputFormat::Jpeg);

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            ImageFormat::Jpeg,
            "opaque output should be JPEG regardless of extension"
        );
        let dims = RustBackend::new().identify(&output).unwrap();
        assert_eq!(dims.as_tuple(), (50, 25));
    }

    #[test]
    fn scale_alpha_source_writes_png() {
        let tmp = TempDir::new().unwrap();
        let source = write_png(tmp.path(), "alpha.png", 80, 80, true);
        let output = tmp.path().join("scaled_alpha.png");

        let format = RustBackend::new()
            .scale(&params(&source, &output, 20, 20))
            .unwrap();
        assert_eq!(format, OutputFormat::Png);

        let img = image::open(&output).unwrap();
        assert_eq!((img.width(), img.height()), (20, 20));
        assert!(img.color().has_alpha());
    }

    #[test]
    fn scale_applies_sample_size_before_exact_resize() {
        let tmp = TempDir::new().unwrap();
        let source = write_jpeg(tmp.path(), "big.jpg", 400, 200);
        let output = tmp.path().join("scaled_big.jpg");

        let mut p = params(&source, &output, 90, 45);
        p.sample_size = 4;
        RustBackend::new().scale(&p).unwrap();

        let img = image::open(&output).unwrap();
        assert_eq!((img.width(), img.height()), (90, 45));
    }

    #[test]
    fn scale_undecodable_source_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("broken.jpg");
        std::fs::write(&source, [0xFF, 0xD8, 0xFF, 0x00, 0x01]).unwrap();
        let output = tmp.path().join("scaled_broken.jpg");

        let result = RustBackend::new().scale(&params(&source, &output, 10, 10));
        assert!(matches!(result, Err(BackendError::Decode { .. })));
    }

    #[test]
    fn encode_failure_leaves_no_output_file() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("scaled_wide.jpg");
        // JPEG caps each edge at 65535 pixels.
        let img = DynamicImage::new_rgb8(70_000, 1);

        let result = save_image(&img, &output, Quality::default());

        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
        assert!(!output.exists());
    }

    #[test]
    fn subsample_divides_edges() {
        let img = DynamicImage::new_rgb8(101, 51);
        let sampled = subsample(img, 2);
        assert_eq!((sampled.width(), sampled.height()), (50, 25));
    }

    #[test]
    fn subsample_one_is_identity() {
        let img = DynamicImage::new_rgb8(7, 3);
        let sampled = subsample(img, 1);
        assert_eq!((sampled.width(), sampled.height()), (7, 3));
    }
}
