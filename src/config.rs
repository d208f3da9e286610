//! Service configuration from environment variables

use std::str::FromStr;

use crate::assignment::EXHAUSTIVE_LIMIT;

/// Limits and listen address for the HTTP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// `PORT`
    pub port: u16,
    /// `MAX_PALETTE_SIZE`: palettes above this are rejected before matching
    pub max_palette_size: usize,
    /// `MAX_GRID_RESOLUTION`
    pub max_grid_resolution: u32,
    /// `MAX_UPLOAD_BYTES`: request body limit
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            max_palette_size: EXHAUSTIVE_LIMIT,
            max_grid_resolution: 1000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            max_palette_size: parse_or(&lookup, "MAX_PALETTE_SIZE", defaults.max_palette_size),
            max_grid_resolution: parse_or(
                &lookup,
                "MAX_GRID_RESOLUTION",
                defaults.max_grid_resolution,
            ),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
