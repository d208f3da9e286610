//! K-means color quantization in RGB space
//!
//! Clustering runs through `kmeans_colors` on sRGB points with a fixed
//! seed, so the same image and `k` always yield the same labels and
//! centroids. Images with fewer distinct colors than `k` skip clustering:
//! their colors are already exact centroids, and the surplus clusters
//! repeat the last one.

use image::{ImageBuffer, RgbImage};
use kmeans_colors::get_kmeans;
use ::palette::Srgb;

use crate::error::TileError;
use crate::palette::Rgb;

/// Cluster indices are stored as `u8` by the k-means backend
pub const MAX_CLUSTERS: usize = 256;

/// Clustering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansConfig {
    /// Upper bound on iterations
    pub max_iterations: usize,
    /// Stop once the centroid shift (0..1 channel scale) drops below this
    pub converge: f32,
    /// RNG seed for k-means++ initialization
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            converge: 0.0025,
            seed: 42,
        }
    }
}

/// Output of [`quantize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantization {
    width: u32,
    height: u32,
    /// Cluster index per pixel, row-major
    labels: Vec<usize>,
    /// Representative color per cluster, truncated to integer channels
    palette: Vec<Rgb>,
}

impl Quantization {
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Discovered palette, indexed by cluster
    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    /// Image where every pixel is its cluster's color
    pub fn render(&self) -> RgbImage {
        let mut img: RgbImage = ImageBuffer::new(self.width, self.height);
        for (pixel, &label) in img.pixels_mut().zip(&self.labels) {
            *pixel = self.palette[label].into();
        }
        img
    }
}

/// Cluster the pixels of `img` into exactly `k` colors.
pub fn quantize(img: &RgbImage, k: usize, config: &KMeansConfig) -> Result<Quantization, TileError> {
    let pixel_count = img.width() as usize * img.height() as usize;

    if k == 0 {
        return Err(TileError::InvalidParameter(
            "cluster count must be at least 1".to_string(),
        ));
    }
    if k > pixel_count {
        return Err(TileError::InvalidParameter(format!(
            "cluster count {} exceeds pixel count {}",
            k, pixel_count
        )));
    }
    if k > MAX_CLUSTERS {
        return Err(TileError::InvalidParameter(format!(
            "cluster count {} exceeds the maximum of {}",
            k, MAX_CLUSTERS
        )));
    }

    let (labels, palette) = match distinct_colors(img, k) {
        Some(colors) => exact_clusters(img, colors, k),
        None => kmeans_clusters(img, k, config),
    };

    Ok(Quantization {
        width: img.width(),
        height: img.height(),
        labels,
        palette,
    })
}

/// The image's colors in first-seen order, or None once there are `k`
fn distinct_colors(img: &RgbImage, k: usize) -> Option<Vec<Rgb>> {
    let mut colors: Vec<Rgb> = Vec::with_capacity(k);
    for p in img.pixels() {
        let color = Rgb::from(p);
        if !colors.contains(&color) {
            if colors.len() + 1 == k {
                return None;
            }
            colors.push(color);
        }
    }
    Some(colors)
}

/// Fewer than `k` colors: each color is its own cluster, the surplus
/// clusters coincide with the last color.
fn exact_clusters(img: &RgbImage, colors: Vec<Rgb>, k: usize) -> (Vec<usize>, Vec<Rgb>) {
    tracing::debug!(
        "Only {} distinct colors for {} clusters, skipping k-means",
        colors.len(),
        k
    );

    let labels = img
        .pixels()
        .map(|p| {
            let color = Rgb::from(p);
            colors.iter().position(|c| *c == color).unwrap_or(0)
        })
        .collect();

    let mut palette = colors;
    let last = palette[palette.len() - 1];
    palette.resize(k, last);

    (labels, palette)
}

fn kmeans_clusters(img: &RgbImage, k: usize, config: &KMeansConfig) -> (Vec<usize>, Vec<Rgb>) {
    let points: Vec<Srgb> = img
        .pixels()
        .map(|p| Srgb::new(p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0))
        .collect();

    let result = get_kmeans(
        k,
        config.max_iterations,
        config.converge,
        false,
        &points,
        config.seed,
    );

    tracing::debug!("k-means finished (k={}, score={:.4})", k, result.score);

    let labels = result.indices.iter().map(|&i| i as usize).collect();
    let palette = result
        .centroids
        .iter()
        .map(|c| Rgb::new(truncate(c.red), truncate(c.green), truncate(c.blue)))
        .collect();

    (labels, palette)
}

/// Scale a 0..1 channel to 0..255 and drop the fraction. The small bias
/// absorbs f32 error so a cluster of identical integer colors keeps them.
#[inline]
fn truncate(channel: f32) -> u8 {
    (channel * 255.0 + 1e-3).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Left half one color, right half another
    fn two_tone(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            if x < width / 2 {
                image::Rgb(left)
            } else {
                image::Rgb(right)
            }
        })
    }

    fn noisy(width: u32, height: u32) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(7);
        ImageBuffer::from_fn(width, height, |_, _| image::Rgb(rng.gen::<[u8; 3]>()))
    }

    #[test]
    fn test_two_clusters_recovered() {
        let img = two_tone(10, 10, [250, 0, 0], [0, 0, 10]);
        let q = quantize(&img, 2, &KMeansConfig::default()).unwrap();

        let mut palette = q.palette().to_vec();
        palette.sort_by_key(|c| c.r);
        assert_eq!(palette, vec![Rgb::new(0, 0, 10), Rgb::new(250, 0, 0)]);

        // Every pixel of one half shares a label
        let labels = q.labels();
        assert_ne!(labels[0], labels[9]);
        assert!(labels.iter().enumerate().all(|(i, &l)| {
            let x = i % 10;
            l == if x < 5 { labels[0] } else { labels[9] }
        }));
    }

    #[test]
    fn test_deterministic() {
        let img = noisy(20, 20);
        let config = KMeansConfig::default();
        let a = quantize(&img, 5, &config).unwrap();
        let b = quantize(&img, 5, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exact_k_centroids() {
        let img = noisy(16, 16);
        for k in 1..=6 {
            let q = quantize(&img, k, &KMeansConfig::default()).unwrap();
            assert_eq!(q.palette().len(), k);
            assert!(q.labels().iter().all(|&l| l < k));
        }
    }

    #[test]
    fn test_fewer_colors_than_clusters() {
        let img = ImageBuffer::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        let q = quantize(&img, 4, &KMeansConfig::default()).unwrap();
        assert_eq!(q.palette(), &[Rgb::new(10, 20, 30); 4]);
        assert!(q.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn test_distinct_colors_kept_exactly() {
        let img = two_tone(6, 2, [1, 2, 3], [200, 100, 50]);
        let q = quantize(&img, 3, &KMeansConfig::default()).unwrap();
        assert_eq!(
            q.palette(),
            &[Rgb::new(1, 2, 3), Rgb::new(200, 100, 50), Rgb::new(200, 100, 50)]
        );
        assert_eq!(q.render(), img);
    }

    #[test]
    fn test_centroids_truncated() {
        // Mean of 0 and 255 is 127.5
        let img = two_tone(2, 1, [0, 0, 0], [255, 255, 255]);
        let q = quantize(&img, 1, &KMeansConfig::default()).unwrap();
        assert_eq!(q.palette(), &[Rgb::new(127, 127, 127)]);
    }

    #[test]
    fn test_render_uses_palette() {
        let img = noisy(12, 12);
        let q = quantize(&img, 3, &KMeansConfig::default()).unwrap();
        let rendered = q.render();
        assert_eq!(rendered.dimensions(), (12, 12));
        assert!(rendered.pixels().all(|p| q.palette().contains(&Rgb::from(p))));
    }

    #[test]
    fn test_invalid_k() {
        let img = noisy(2, 2);
        assert!(matches!(
            quantize(&img, 0, &KMeansConfig::default()),
            Err(TileError::InvalidParameter(_))
        ));
        assert!(matches!(
            quantize(&img, 5, &KMeansConfig::default()),
            Err(TileError::InvalidParameter(_))
        ));

        let big = noisy(20, 20);
        assert!(matches!(
            quantize(&big, MAX_CLUSTERS + 1, &KMeansConfig::default()),
            Err(TileError::InvalidParameter(_))
        ));
    }
}
