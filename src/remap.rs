//! Replace every pixel with its mapped target color

use image::RgbImage;

use crate::error::TileError;
use crate::palette::Rgb;

/// Discovered color -> target color pairs, in cluster order.
///
/// Produced by the palette matcher as a bijection. When two clusters share
/// a color, lookups resolve to the last pair, as a later insert would
/// overwrite an earlier one in a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorMapping {
    pairs: Vec<(Rgb, Rgb)>,
}

impl ColorMapping {
    pub fn get(&self, color: &Rgb) -> Option<Rgb> {
        self.pairs
            .iter()
            .rfind(|(from, _)| from == color)
            .map(|(_, to)| *to)
    }

    pub fn pairs(&self) -> &[(Rgb, Rgb)] {
        &self.pairs
    }

    /// Discovered colors, in cluster order
    pub fn sources(&self) -> Vec<Rgb> {
        self.pairs.iter().map(|(from, _)| *from).collect()
    }

    /// Target colors, in the order their sources appear
    pub fn targets(&self) -> Vec<Rgb> {
        self.pairs.iter().map(|(_, to)| *to).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(Rgb, Rgb)> for ColorMapping {
    fn from_iter<I: IntoIterator<Item = (Rgb, Rgb)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Produce a new image with every pixel replaced by `mapping[pixel]`.
///
/// Fails with [`TileError::UnmappedColor`] on the first pixel whose color
/// has no entry; pixels are never passed through unchanged.
pub fn remap(img: &RgbImage, mapping: &ColorMapping) -> Result<RgbImage, TileError> {
    let mut output = RgbImage::new(img.width(), img.height());

    // Quantized images carry only a handful of colors, so cache the last hit
    let mut last: Option<(Rgb, Rgb)> = None;

    for (src, dst) in img.pixels().zip(output.pixels_mut()) {
        let color = Rgb::from(src);
        let mapped = match last {
            Some((from, to)) if from == color => to,
            _ => {
                let to = mapping.get(&color).ok_or(TileError::UnmappedColor(color))?;
                last = Some((color, to));
                to
            }
        };
        *dst = mapped.into();
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    #[test]
    fn test_all_pixels_remapped() {
        let img = ImageBuffer::from_pixel(6, 4, image::Rgb([34, 177, 76]));
        let mapping: ColorMapping = [(Rgb::new(34, 177, 76), Rgb::new(0, 0, 0))].into_iter().collect();

        let out = remap(&img, &mapping).unwrap();
        assert_eq!(out.dimensions(), (6, 4));
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_many_to_black() {
        let colors: [[u8; 3]; 4] = [[34, 177, 76], [63, 72, 204], [237, 28, 36], [255, 255, 255]];
        let img = ImageBuffer::from_fn(8, 8, |x, y| image::Rgb(colors[((x + y) % 4) as usize]));
        let mapping: ColorMapping = colors
            .iter()
            .map(|&c| (Rgb::from(c), Rgb::new(0, 0, 0)))
            .collect();

        let out = remap(&img, &mapping).unwrap();
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_remap_twice_is_noop() {
        let red = Rgb::new(200, 10, 10);
        let blue = Rgb::new(10, 10, 200);
        let img: RgbImage = ImageBuffer::from_fn(4, 4, |x, _| if x < 2 { red.into() } else { blue.into() });

        let mapping: ColorMapping = [(red, Rgb::new(255, 0, 0)), (blue, Rgb::new(0, 0, 255))]
            .into_iter()
            .collect();
        let once = remap(&img, &mapping).unwrap();

        let identity: ColorMapping = mapping.targets().into_iter().map(|c| (c, c)).collect();
        let twice = remap(&once, &identity).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unmapped_color() {
        let mut img = ImageBuffer::from_pixel(3, 3, image::Rgb([1, 1, 1]));
        img.put_pixel(2, 2, image::Rgb([9, 9, 9]));
        let mapping: ColorMapping = [(Rgb::new(1, 1, 1), Rgb::new(0, 0, 0))].into_iter().collect();

        match remap(&img, &mapping) {
            Err(TileError::UnmappedColor(c)) => assert_eq!(c, Rgb::new(9, 9, 9)),
            other => panic!("expected UnmappedColor, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_sources_resolve_to_last() {
        let c = Rgb::new(5, 5, 5);
        let mapping: ColorMapping = [
            (c, Rgb::new(1, 0, 0)),
            (Rgb::new(9, 9, 9), Rgb::new(0, 0, 1)),
            (c, Rgb::new(0, 1, 0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(mapping.get(&c), Some(Rgb::new(0, 1, 0)));
        assert_eq!(mapping.len(), 3);

        let img = ImageBuffer::from_pixel(2, 2, image::Rgb([5, 5, 5]));
        let out = remap(&img, &mapping).unwrap();
        assert!(out.pixels().all(|p| p.0 == [0, 1, 0]));
    }
}
