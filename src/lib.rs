//! Photo tiling: reduce an image to a coarse grid of cells drawn from a
//! small caller-supplied palette.
//!
//! [`pipeline::tile_image`] is the library entry point; [`service`]
//! exposes the same pipeline as a single HTTP endpoint.

pub mod assignment;
pub mod config;
pub mod error;
pub mod orientation;
pub mod palette;
pub mod pipeline;
pub mod quantize;
pub mod remap;
pub mod resample;
pub mod service;

pub use error::{AppError, TileError};
pub use palette::{Palette, Rgb};
pub use pipeline::{tile_image, tile_image_bytes, TileConfig};
