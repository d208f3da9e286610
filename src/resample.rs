//! Grid resampling
//!
//! - Area (box) averaging to shrink a photo onto the tile grid
//! - Nearest-neighbor scaling to blow the grid back up with hard edges

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Source samples contributing to one output sample: (index, weight)
type Taps = Vec<(usize, f32)>;

/// For each output position, the source positions it covers and how much
/// of each, normalized so the weights sum to one.
fn area_taps(src_len: u32, dst_len: u32) -> Vec<Taps> {
    let scale = src_len as f64 / dst_len as f64;

    (0..dst_len)
        .map(|out| {
            let start = out as f64 * scale;
            let end = (out + 1) as f64 * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src_len);

            let mut taps: Taps = (first..last)
                .map(|i| {
                    let overlap = end.min(i as f64 + 1.0) - start.max(i as f64);
                    (i as usize, overlap.max(0.0) as f32)
                })
                .filter(|&(_, w)| w > 0.0)
                .collect();

            let total: f32 = taps.iter().map(|&(_, w)| w).sum();
            if total > 0.0 {
                for tap in &mut taps {
                    tap.1 /= total;
                }
            } else {
                taps = vec![((first.min(src_len - 1)) as usize, 1.0)];
            }
            taps
        })
        .collect()
}

/// Resample by averaging the source area under each output pixel.
///
/// Works in both directions; enlarging degenerates to pixel replication
/// with blended seams.
pub fn area_downsample(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = img.dimensions();
    if (src_w, src_h) == (width, height) {
        return img.clone();
    }

    let x_taps = area_taps(src_w, width);
    let y_taps = area_taps(src_h, height);
    let src = img.as_raw();

    // Horizontal pass: src_h rows of `width` pixels
    let mut rows = vec![0.0f32; width as usize * src_h as usize * 3];
    for y in 0..src_h as usize {
        let src_row = y * src_w as usize * 3;
        let dst_row = y * width as usize * 3;
        for (x, taps) in x_taps.iter().enumerate() {
            let mut acc = [0.0f32; 3];
            for &(sx, w) in taps {
                let base = src_row + sx * 3;
                for ch in 0..3 {
                    acc[ch] += src[base + ch] as f32 * w;
                }
            }
            rows[dst_row + x * 3..dst_row + x * 3 + 3].copy_from_slice(&acc);
        }
    }

    // Vertical pass
    let mut output = RgbImage::new(width, height);
    for (y, taps) in y_taps.iter().enumerate() {
        for x in 0..width as usize {
            let mut acc = [0.0f32; 3];
            for &(sy, w) in taps {
                let base = (sy * width as usize + x) * 3;
                for ch in 0..3 {
                    acc[ch] += rows[base + ch] * w;
                }
            }
            output.put_pixel(
                x as u32,
                y as u32,
                image::Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8)),
            );
        }
    }

    output
}

/// Scale with nearest-neighbor sampling so tile edges stay sharp
pub fn nearest_upscale(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(img, width, height, FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    #[test]
    fn test_box_average() {
        // 4x2 -> 2x1: each output pixel averages a 2x2 block
        let img: RgbImage = ImageBuffer::from_fn(4, 2, |x, y| {
            let v = if x < 2 { (x + y) as u8 * 10 } else { 200 };
            image::Rgb([v, v, v])
        });
        let out = area_downsample(&img, 2, 1);
        assert_eq!(out.dimensions(), (2, 1));
        // (0 + 10 + 10 + 20) / 4 = 10
        assert_eq!(out.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(out.get_pixel(1, 0).0, [200, 200, 200]);
    }

    #[test]
    fn test_fractional_coverage() {
        // 3 -> 2: output 0 covers source [0, 1.5), output 1 covers [1.5, 3)
        let img: RgbImage = ImageBuffer::from_fn(3, 1, |x, _| {
            let v = [0u8, 90, 180][x as usize];
            image::Rgb([v, 0, 0])
        });
        let out = area_downsample(&img, 2, 1);
        // (0 * 1 + 90 * 0.5) / 1.5 = 30; (90 * 0.5 + 180 * 1) / 1.5 = 150
        assert_eq!(out.get_pixel(0, 0).0, [30, 0, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [150, 0, 0]);
    }

    #[test]
    fn test_solid_color_preserved() {
        let img = ImageBuffer::from_pixel(37, 23, image::Rgb([12, 34, 56]));
        for (w, h) in [(5, 5), (50, 50), (1, 1), (37, 23)] {
            let out = area_downsample(&img, w, h);
            assert_eq!(out.dimensions(), (w, h));
            assert!(out.pixels().all(|p| p.0 == [12, 34, 56]));
        }
    }

    #[test]
    fn test_enlarging_is_allowed() {
        let img: RgbImage = ImageBuffer::from_fn(2, 2, |x, _| image::Rgb([x as u8 * 255, 0, 0]));
        let out = area_downsample(&img, 4, 4);
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(3, 3).0, [255, 0, 0]);
    }

    #[test]
    fn test_nearest_keeps_hard_edges() {
        let img: RgbImage = ImageBuffer::from_fn(2, 1, |x, _| image::Rgb([x as u8 * 255, 0, 0]));
        let out = nearest_upscale(&img, 10, 3);
        assert_eq!(out.dimensions(), (10, 3));
        // Only the two source colors survive
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0] || p.0 == [255, 0, 0]));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(9, 2).0, [255, 0, 0]);
    }
}
