//! Tile a single image file from the command line

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tile_pixelator::assignment::Strategy;
use tile_pixelator::palette::{Palette, Rgb};
use tile_pixelator::pipeline::{self, TileConfig, DEFAULT_GRID_RESOLUTION};

#[derive(Parser)]
#[command(name = "tile", about = "Reduce a photo to a grid of tiles in a fixed palette")]
struct Cli {
    /// Input image path
    input: PathBuf,

    /// Output PNG path (defaults to <input>_tiled.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Tile color as #RGB or #RRGGBB; repeat for each palette entry
    #[arg(short, long = "color", value_parser = parse_color)]
    colors: Vec<Rgb>,

    /// Side length of the square tile grid
    #[arg(short, long, default_value_t = DEFAULT_GRID_RESOLUTION)]
    grid: u32,

    /// Palette matching algorithm
    #[arg(long, value_enum, default_value_t = Solver::Auto)]
    solver: Solver,
}

#[derive(Clone, Copy, ValueEnum)]
enum Solver {
    Auto,
    Exhaustive,
    Hungarian,
}

impl From<Solver> for Strategy {
    fn from(s: Solver) -> Self {
        match s {
            Solver::Auto => Strategy::Auto,
            Solver::Exhaustive => Strategy::Exhaustive,
            Solver::Hungarian => Strategy::Hungarian,
        }
    }
}

fn parse_color(s: &str) -> Result<Rgb, String> {
    Rgb::from_hex(s).map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let palette = if cli.colors.is_empty() {
        Palette::default()
    } else {
        Palette::new(cli.colors.clone())?
    };

    let config = TileConfig {
        strategy: cli.solver.into(),
        ..TileConfig::new(palette, cli.grid)
    };

    let input = std::fs::read(&cli.input)?;
    let png_data = pipeline::tile_image_bytes(&input, &config)?;

    let output = cli.output.clone().unwrap_or_else(|| {
        let stem = cli
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        cli.input.with_file_name(format!("{}_tiled.png", stem))
    });

    std::fs::write(&output, &png_data)?;
    println!(
        "{} -> {} ({}x{} grid, palette {})",
        cli.input.display(),
        output.display(),
        cli.grid,
        cli.grid,
        config.palette
    );

    Ok(())
}
