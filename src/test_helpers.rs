//! Shared test utilities for the picker-resize test suite.
//!
//! Fixture images are generated on the fly into a temp directory rather than
//! checked in, so every test controls exact dimensions, alpha and EXIF.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let source = write_jpeg_with_exif(tmp.path(), "photo.jpg", 64, 48, &[ascii(Tag::Make, "Google")]);
//! assert_eq!(read_exif_ascii(&source, Tag::Make).as_deref(), Some("Google"));
//! ```

use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageBuffer, Rgb, Rgba};
use img_parts::{DynImage, ImageEXIF};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// =========================================================================
// Fixture writers
// =========================================================================

/// Write a gradient PNG. With `alpha`, the image is RGBA with a transparent corner.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, alpha: bool) -> PathBuf {
    let path = dir.join(name);
    let img = if alpha {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            let a = if x == 0 && y == 0 { 0 } else { 255 };
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, a])
        }))
    } else {
        DynamicImage::ImageRgb8(gradient(width, height))
    };
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Write a gradient JPEG, regardless of the extension in `name`.
pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, jpeg_bytes(width, height)).unwrap();
    path
}

/// Write a gradient JPEG carrying the given primary-IFD EXIF fields.
pub fn write_jpeg_with_exif(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    fields: &[Field],
) -> PathBuf {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut blob = Cursor::new(Vec::new());
    writer.write(&mut blob, false).unwrap();

    let mut jpeg = DynImage::from_bytes(jpeg_bytes(width, height).into())
        .unwrap()
        .unwrap();
    jpeg.set_exif(Some(blob.into_inner().into()));
    let mut bytes = Vec::new();
    jpeg.encoder().write_to(&mut bytes).unwrap();

    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

// =========================================================================
// EXIF field builders (primary IFD; sub-IFD placement follows the tag)
// =========================================================================

pub fn ascii(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

pub fn short(tag: Tag, value: u16) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![value]),
    }
}

pub fn rational(tag: Tag, values: &[(u32, u32)]) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(
            values
                .iter()
                .map(|&(num, denom)| Rational { num, denom })
                .collect(),
        ),
    }
}

fn gradient(width: u32, height: u32) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

// =========================================================================
// EXIF readers: `None` when the file has no EXIF or lacks the tag
// =========================================================================

fn read_exif(path: &Path) -> Option<exif::Exif> {
    let bytes = std::fs::read(path).ok()?;
    exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
}

/// First string of an ASCII field in the primary IFD.
pub fn read_exif_ascii(path: &Path, tag: Tag) -> Option<String> {
    let exif = read_exif(path)?;
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).into_owned()),
        _ => None,
    }
}

/// First integer of a numeric field in the primary IFD.
pub fn read_exif_uint(path: &Path, tag: Tag) -> Option<u32> {
    read_exif(path)?
        .get_field(tag, In::PRIMARY)?
        .value
        .get_uint(0)
}

/// All `(num, denom)` pairs of a rational field in the primary IFD.
pub fn read_exif_rationals(path: &Path, tag: Tag) -> Option<Vec<(u32, u32)>> {
    match &read_exif(path)?.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => Some(values.iter().map(|r| (r.num, r.denom)).collect()),
        _ => None,
    }
}
