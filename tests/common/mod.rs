//! Fixture images for integration tests, generated on the fly.

#![allow(dead_code)]

use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use img_parts::{DynImage, ImageEXIF};
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn opaque(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    }))
}

/// RGBA PNG with a fully transparent top-left quadrant.
pub fn transparent_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
        let a = if x < width / 2 && y < height / 2 { 0 } else { 255 };
        Rgba([200, (x % 256) as u8, (y % 256) as u8, a])
    }));
    let path = dir.join(name);
    std::fs::write(&path, encode(img, ImageFormat::Png)).unwrap();
    path
}

/// RGB PNG with no alpha channel.
pub fn opaque_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, encode(opaque(width, height), ImageFormat::Png)).unwrap();
    path
}

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

/// JPEG carrying the given primary-IFD EXIF fields.
pub fn camera_jpeg(dir: &Path, name: &str, width: u32, height: u32, fields: &[Field]) -> PathBuf {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut blob = Cursor::new(Vec::new());
    writer.write(&mut blob, false).unwrap();

    let mut jpeg = DynImage::from_bytes(encode(opaque(width, height), ImageFormat::Jpeg).into())
        .unwrap()
        .unwrap();
    jpeg.set_exif(Some(blob.into_inner().into()));
    let mut bytes = Vec::new();
    jpeg.encoder().write_to(&mut bytes).unwrap();

    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Format sniffed from file content, ignoring the extension.
pub fn sniff_format(path: &Path) -> ImageFormat {
    image::ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .format()
        .unwrap()
}

pub fn dimensions(path: &Path) -> (u32, u32) {
    image::ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .into_dimensions()
        .unwrap()
}

pub fn exif_ascii(path: &Path, tag: Tag) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).into_owned()),
        _ => None,
    }
}

pub fn exif_uint(path: &Path, tag: Tag) -> Option<u32> {
    let bytes = std::fs::read(path).ok()?;
    exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?
        .get_field(tag, In::PRIMARY)?
        .value
        .get_uint(0)
}

pub fn exif_rationals(path: &Path, tag: Tag) -> Option<Vec<(u32, u32)>> {
    let bytes = std::fs::read(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => Some(values.iter().map(|r| (r.num, r.denom)).collect()),
        _ => None,
    }
}
