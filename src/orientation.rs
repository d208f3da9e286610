//! EXIF orientation handling
//!
//! Only the pure rotations are honored:
//! 3 = Rotated 180°
//! 6 = Rotated 90° CW
//! 8 = Rotated 270° CW
//!
//! Mirrored orientations (2, 4, 5, 7) and missing or unreadable EXIF data
//! leave the image as stored.

use image::imageops;
use image::RgbImage;
use std::io::Cursor;

/// Clockwise rotation needed to display an image upright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Map an EXIF Orientation tag value to a rotation
    pub fn from_exif(orientation: u32) -> Self {
        match orientation {
            3 => Rotation::Cw180,
            6 => Rotation::Cw90,
            8 => Rotation::Cw270,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }

    pub fn apply(self, img: RgbImage) -> RgbImage {
        match self {
            Rotation::None => img,
            Rotation::Cw90 => imageops::rotate90(&img),
            Rotation::Cw180 => imageops::rotate180(&img),
            Rotation::Cw270 => imageops::rotate270(&img),
        }
    }
}

/// Rotation to apply to the decoded pixels of `bytes`.
///
/// Missing or unreadable EXIF data means no rotation.
pub fn orientation_of(bytes: &[u8]) -> Rotation {
    let tag = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|data| {
            data.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        });

    match tag {
        Some(value) => {
            tracing::debug!("EXIF orientation {}", value);
            Rotation::from_exif(value)
        }
        None => Rotation::None,
    }
}

/// JPEG carrying an APP1 segment with a single Orientation entry
#[cfg(test)]
pub(crate) fn jpeg_with_orientation(img: &RgbImage, orientation: u16) -> Vec<u8> {
    let mut jpeg = Vec::new();
    image::DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .unwrap();

    // Little-endian TIFF: header, IFD0 with one SHORT entry, no next IFD
    let mut tiff = vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01, 0x00];
    tiff.extend_from_slice(&[0x12, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00]);
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff);
    let length = (app1.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}
