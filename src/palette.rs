//! RGB colors and target palettes
//!
//! Target palettes come from callers either as RGB triples or as the
//! hex-string form accepted by the HTTP endpoint.

use std::fmt;

use crate::error::TileError;

/// Message returned for any malformed `tile_colors` field
pub const TILE_COLORS_FORMAT_ERROR: &str =
    "tile_colors must be a valid JSON list of hex color codes (e.g., ['#FF0000', '#00FF00'])";

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance in RGB space
    #[inline]
    pub fn distance(&self, other: &Rgb) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Parse `#RGB` or `#RRGGBB`, case-insensitive
    pub fn from_hex(s: &str) -> Result<Self, HexColorError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| HexColorError(s.to_string()))?;

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexColorError(s.to_string()));
        }

        // Validated as ASCII hex above, so byte slicing is safe
        let channel = |hex: &str| {
            u8::from_str_radix(hex, 16).map_err(|_| HexColorError(s.to_string()))
        };

        match digits.len() {
            3 => {
                let expand = |i: usize| channel(&digits[i..i + 1].repeat(2));
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(HexColorError(s.to_string())),
        }
    }

    /// Render as `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

impl From<&image::Rgb<u8>> for Rgb {
    fn from(p: &image::Rgb<u8>) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

/// A hex string that is not `#RGB` or `#RRGGBB`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid hex color format: {0:?}")]
pub struct HexColorError(pub String);

/// Default tile colors: red, black, gray, white
pub const DEFAULT_TILE_COLORS: [Rgb; 4] = [
    Rgb::new(255, 0, 0),     // Red
    Rgb::new(0, 0, 0),       // Black
    Rgb::new(128, 128, 128), // Gray
    Rgb::new(255, 255, 255), // White
];

/// Ordered, non-empty list of target colors.
///
/// Its length is the only source of truth for the number of clusters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self, TileError> {
        if colors.is_empty() {
            return Err(TileError::InvalidParameter(
                "palette must contain at least one color".to_string(),
            ));
        }
        Ok(Self { colors })
    }

    /// Decode a JSON array of hex strings, e.g. `["#FF0000", "#0f0"]`
    pub fn from_json_hex(json: &str) -> Result<Self, TileError> {
        let invalid = || TileError::InvalidParameter(TILE_COLORS_FORMAT_ERROR.to_string());

        let entries: Vec<String> = serde_json::from_str(json).map_err(|_| invalid())?;
        let colors = entries
            .iter()
            .map(|s| Rgb::from_hex(s))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        Self::new(colors)
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_TILE_COLORS.to_vec(),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.colors.iter().map(Rgb::to_hex).collect();
        write!(f, "[{}]", hex.join(", "))
    }
}
