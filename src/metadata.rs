//! Image metadata carry-over: EXIF from a source image onto its scaled copy.
//!
//! Decoding and re-encoding drops every metadata segment, so after a scale the
//! interesting fields are copied back explicitly. Only a whitelist of
//! primary-IFD fields travels: camera settings, capture time, GPS position and
//! orientation. Everything describing the *old* pixel buffer (dimensions,
//! strip offsets, embedded thumbnail) stays behind.
//!
//! | Step | Crate |
//! |---|---|
//! | Read source EXIF (JPEG, TIFF, PNG, WebP, HEIF) | `kamadak-exif` `Reader::read_from_container` |
//! | Serialize the kept fields as a TIFF blob | `kamadak-exif` `experimental::Writer` |
//! | Embed the blob into the output container | `img-parts` `ImageEXIF::set_exif` |
//!
//! Orientation is copied as-is: the backend does not rotate pixels, so the
//! scaled image still needs the original orientation hint.

use exif::{In, Tag};
use img_parts::{DynImage, ImageEXIF};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExifError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),
    #[error("Failed to parse {path}: {reason}")]
    Container { path: PathBuf, reason: String },
    #[error("Cannot embed EXIF into {0}: unsupported container")]
    UnsupportedContainer(PathBuf),
    #[error("Unknown EXIF tag: {0}")]
    UnknownTag(String),
}

/// Tags copied when no explicit list is configured.
pub const DEFAULT_TAGS: &[&str] = &[
    "FNumber",
    "ExposureTime",
    "ISOSpeedRatings",
    "GPSAltitude",
    "GPSAltitudeRef",
    "FocalLength",
    "GPSDateStamp",
    "WhiteBalance",
    "GPSProcessingMethod",
    "GPSTimeStamp",
    "DateTime",
    "Flash",
    "GPSLatitude",
    "GPSLatitudeRef",
    "GPSLongitude",
    "GPSLongitudeRef",
    "Make",
    "Model",
    "Orientation",
];

/// Every tag name the copier understands.
///
/// Names follow the ones mobile EXIF APIs expose, which differ from the EXIF
/// 2.3 names in a few places (`ISOSpeedRatings` is `PhotographicSensitivity`).
const KNOWN_TAGS: &[(&str, Tag)] = &[
    ("Artist", Tag::Artist),
    ("Copyright", Tag::Copyright),
    ("DateTime", Tag::DateTime),
    ("DateTimeDigitized", Tag::DateTimeDigitized),
    ("DateTimeOriginal", Tag::DateTimeOriginal),
    ("ExposureBiasValue", Tag::ExposureBiasValue),
    ("ExposureProgram", Tag::ExposureProgram),
    ("ExposureTime", Tag::ExposureTime),
    ("FNumber", Tag::FNumber),
    ("Flash", Tag::Flash),
    ("FocalLength", Tag::FocalLength),
    ("FocalLengthIn35mmFilm", Tag::FocalLengthIn35mmFilm),
    ("GPSAltitude", Tag::GPSAltitude),
    ("GPSAltitudeRef", Tag::GPSAltitudeRef),
    ("GPSDateStamp", Tag::GPSDateStamp),
    ("GPSLatitude", Tag::GPSLatitude),
    ("GPSLatitudeRef", Tag::GPSLatitudeRef),
    ("GPSLongitude", Tag::GPSLongitude),
    ("GPSLongitudeRef", Tag::GPSLongitudeRef),
    ("GPSProcessingMethod", Tag::GPSProcessingMethod),
    ("GPSTimeStamp", Tag::GPSTimeStamp),
    ("ISOSpeedRatings", Tag::PhotographicSensitivity),
    ("ImageDescription", Tag::ImageDescription),
    ("LensMake", Tag::LensMake),
    ("LensModel", Tag::LensModel),
    ("Make", Tag::Make),
    ("MeteringMode", Tag::MeteringMode),
    ("Model", Tag::Model),
    ("Orientation", Tag::Orientation),
    ("Software", Tag::Software),
    ("WhiteBalance", Tag::WhiteBalance),
];

/// Look up a copyable tag by name (case-sensitive).
pub fn tag_by_name(name: &str) -> Option<Tag> {
    KNOWN_TAGS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, tag)| *tag)
}

/// Copies a whitelist of EXIF fields between image files.
#[derive(Debug, Clone)]
pub struct ExifCopier {
    tags: Vec<(String, Tag)>,
}

impl Default for ExifCopier {
    fn default() -> Self {
        Self::from_tag_names(DEFAULT_TAGS).expect("default EXIF tags are all known")
    }
}

impl ExifCopier {
    /// Build a copier for the given tag names. Unknown names are rejected.
    pub fn from_tag_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ExifError> {
        let tags = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                tag_by_name(name)
                    .map(|tag| (name.to_string(), tag))
                    .ok_or_else(|| ExifError::UnknownTag(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tags })
    }

    /// Configured tag names, in configuration order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|(name, _)| name.as_str())
    }

    fn wants(&self, tag: Tag) -> bool {
        self.tags.iter().any(|(_, wanted)| *wanted == tag)
    }

    /// Copy whitelisted fields from `source` into `dest`, rewriting `dest` in place.
    ///
    /// Returns the number of fields written. A source without EXIF, or without
    /// any whitelisted field, leaves `dest` untouched and returns `Ok(0)`.
    pub fn copy(&self, source: &Path, dest: &Path) -> Result<usize, ExifError> {
        let mut reader = BufReader::new(File::open(source)?);
        let exif = match exif::Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let fields: Vec<&exif::Field> = exif
            .fields()
            .filter(|f| f.ifd_num == In::PRIMARY && self.wants(f.tag))
            .collect();
        if fields.is_empty() {
            return Ok(0);
        }

        let mut writer = exif::experimental::Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut blob = Cursor::new(Vec::new());
        writer.write(&mut blob, exif.little_endian())?;

        embed_exif(dest, blob.into_inner())?;
        Ok(fields.len())
    }
}

/// Replace the EXIF segment of the image at `path` with `blob` (raw TIFF bytes).
fn embed_exif(path: &Path, blob: Vec<u8>) -> Result<(), ExifError> {
    let data = std::fs::read(path)?;
    let mut image = DynImage::from_bytes(data.into())
        .map_err(|e| ExifError::Container {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .ok_or_else(|| ExifError::UnsupportedContainer(path.to_path_buf()))?;

    image.set_exif(Some(blob.into()));

    let mut output = Vec::new();
    image.encoder().write_to(&mut output)?;
    std::fs::write(path, output)?;
    Ok(())
}
