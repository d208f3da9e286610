//! Tiling pipeline
//!
//! 1. Area-downsample to a square grid (grid_resolution x grid_resolution)
//! 2. Cluster the grid into k colors, k = target palette length
//! 3. Match discovered colors to target colors (minimal total distance)
//! 4. Remap the grid to target colors
//! 5. Nearest-neighbor upscale back to the source dimensions
//! 6. Rotate according to the source's EXIF orientation
//!
//! Every stage is a pure function of its inputs; a failure anywhere aborts
//! the run without producing an image.

use crate::assignment::{self, Strategy};
use crate::error::TileError;
use crate::orientation::{self, Rotation};
use crate::palette::{Palette, Rgb};
use crate::quantize::{self, KMeansConfig};
use crate::remap;
use crate::resample;
use image::{DynamicImage, RgbImage};
use png::{BitDepth, ColorType, Encoder};
use std::io::Cursor;

/// Default side length of the tile grid
pub const DEFAULT_GRID_RESOLUTION: u32 = 50;

/// Parameters for a single tiling run
#[derive(Debug, Clone, PartialEq)]
pub struct TileConfig {
    /// Side length of the square tile grid
    pub grid_resolution: u32,
    /// Output colors; its length sets the cluster count
    pub palette: Palette,
    /// Assignment solver for palette matching
    pub strategy: Strategy,
    pub kmeans: KMeansConfig,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            palette: Palette::default(),
            strategy: Strategy::default(),
            kmeans: KMeansConfig::default(),
        }
    }
}

impl TileConfig {
    pub fn new(palette: Palette, grid_resolution: u32) -> Self {
        Self {
            grid_resolution,
            palette,
            ..Self::default()
        }
    }
}

/// Tile an already decoded image.
///
/// Returns an image with the same dimensions as `img` before rotation.
pub fn tile_image(
    img: &DynamicImage,
    config: &TileConfig,
    rotation: Rotation,
) -> Result<RgbImage, TileError> {
    let grid = config.grid_resolution;
    if grid == 0 {
        return Err(TileError::InvalidParameter(
            "grid resolution must be a positive integer".to_string(),
        ));
    }

    let source = img.to_rgb8();
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(TileError::InvalidParameter(
            "source image has no pixels".to_string(),
        ));
    }

    let k = config.palette.len();
    tracing::debug!(
        "Tiling {}x{} image on a {}x{} grid with {} colors",
        width,
        height,
        grid,
        grid,
        k
    );

    let downsampled = resample::area_downsample(&source, grid, grid);

    let quantized = quantize::quantize(&downsampled, k, &config.kmeans)?;
    tracing::debug!("Discovered palette: {:?}", quantized.palette());

    let mapping =
        assignment::match_palettes(quantized.palette(), config.palette.colors(), config.strategy)?;

    let remapped = remap::remap(&quantized.render(), &mapping)?;

    let upscaled = resample::nearest_upscale(&remapped, width, height);

    Ok(rotation.apply(upscaled))
}

/// Decode, tile and re-encode an image as PNG.
pub fn tile_image_bytes(image_data: &[u8], config: &TileConfig) -> Result<Vec<u8>, TileError> {
    // Decode source image
    let img = image::load_from_memory(image_data)?;
    let rotation = orientation::orientation_of(image_data);

    tracing::debug!("Decoded {}x{} image, rotation {}°", img.width(), img.height(), rotation.degrees());

    let tiled = tile_image(&img, config, rotation)?;
    encode_png(&tiled, &config.palette)
}

/// Encode a tiled image as PNG.
///
/// Tiled output only ever contains palette colors, so it is written as an
/// indexed PNG with the target palette as PLTE. Palettes too large for
/// 8-bit indices fall back to truecolor.
pub fn encode_png(img: &RgbImage, palette: &Palette) -> Result<Vec<u8>, TileError> {
    let (width, height) = img.dimensions();

    if palette.len() > 256 {
        return write_png(width, height, ColorType::Rgb, None, img.as_raw());
    }

    let colors = palette.colors();
    let indexed = img
        .pixels()
        .map(|p| {
            let color = Rgb::from(p);
            colors
                .iter()
                .position(|c| *c == color)
                .map(|i| i as u8)
                .ok_or(TileError::UnmappedColor(color))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let plte: Vec<u8> = colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect();
    write_png(width, height, ColorType::Indexed, Some(plte), &indexed)
}

fn write_png(
    width: u32,
    height: u32,
    color: ColorType,
    palette: Option<Vec<u8>>,
    data: &[u8],
) -> Result<Vec<u8>, TileError> {
    let mut output = Vec::new();

    {
        let mut encoder = Encoder::new(Cursor::new(&mut output), width, height);
        encoder.set_color(color);
        encoder.set_depth(BitDepth::Eight);
        if let Some(plte) = palette {
            encoder.set_palette(plte);
        }

        let mut writer = encoder
            .write_header()
            .map_err(|e| TileError::Encode(format!("PNG header error: {}", e)))?;

        writer
            .write_image_data(data)
            .map_err(|e| TileError::Encode(format!("PNG write error: {}", e)))?;
    }

    Ok(output)
}
