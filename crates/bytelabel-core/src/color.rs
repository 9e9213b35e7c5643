//! Color utilities for byte highlighting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An RGBA color packed as `0xRRGGBBAA`.
///
/// Serialized as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba(pub u32);

impl Rgba {
    pub const WHITE: Rgba = Rgba(0xFFFFFFFF);
    pub const BLACK: Rgba = Rgba(0x000000FF);
    pub const TRANSPARENT: Rgba = Rgba(0x00000000);

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(u32::from_be_bytes([r, g, b, 0xFF]))
    }

    pub fn red(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn blue(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn alpha(self) -> u8 {
        self.0 as u8
    }

    /// Same color channels, ignoring alpha.
    pub fn same_rgb(self, other: Rgba) -> bool {
        self.0 >> 8 == other.0 >> 8
    }

    /// Scale the alpha channel by `factor` (clamped to `0.0..=1.0`).
    ///
    /// Used to fade a label color toward transparency for unselected regions.
    pub fn blend_toward_transparent(self, factor: f64) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let alpha = (self.alpha() as f64 * factor).round() as u32;
        Self((self.0 & 0xFFFFFF00) | alpha)
    }

    /// Convert to a CSS `rgba()` string.
    pub fn to_css(self) -> String {
        rgba_u32_to_css(self.0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    channels[i] = v << 4 | v;
                }
                Some(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => u32::from_str_radix(hex, 16).ok().map(|v| Self(v << 8 | 0xFF)),
            8 => u32::from_str_radix(hex, 16).ok().map(Self),
            _ => None,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha() == 0xFF {
            write!(f, "#{:06x}", self.0 >> 8)
        } else {
            write!(f, "#{:08x}", self.0)
        }
    }
}

impl FromStr for Rgba {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s).ok_or_else(|| format!("invalid color `{s}`"))
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

/// Convert RGBA u32 (packed as 0xRRGGBBAA) to CSS rgba() string.
pub fn rgba_u32_to_css(color: u32) -> String {
    let r = (color >> 24) & 0xFF;
    let g = (color >> 16) & 0xFF;
    let b = (color >> 8) & 0xFF;
    let a = (color & 0xFF) as f32 / 255.0;
    format!("rgba({}, {}, {}, {})", r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_css() {
        assert_eq!(rgba_u32_to_css(0xFF0000FF), "rgba(255, 0, 0, 1)");
        assert_eq!(rgba_u32_to_css(0x0000FF00), "rgba(0, 0, 255, 0)");
        assert_eq!(Rgba(0xFF000080).to_css(), "rgba(255, 0, 0, 0.5019608)");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::parse_hex("#ff0000"), Some(Rgba(0xFF0000FF)));
        assert_eq!(Rgba::parse_hex("#FF000080"), Some(Rgba(0xFF000080)));
        assert_eq!(Rgba::parse_hex("#fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::parse_hex("ff0000"), None);
        assert_eq!(Rgba::parse_hex("#ff00"), None);
        assert_eq!(Rgba::parse_hex("#gg0000"), None);
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(Rgba(0x12AB34FF).to_string(), "#12ab34");
        assert_eq!(Rgba(0x12AB3480).to_string(), "#12ab3480");
        assert_eq!("#12ab34".parse::<Rgba>(), Ok(Rgba(0x12AB34FF)));
    }

    #[test]
    fn test_blend_toward_transparent() {
        let red = Rgba(0xFF0000FF);
        assert_eq!(red.blend_toward_transparent(1.0), red);
        assert_eq!(red.blend_toward_transparent(0.0), Rgba(0xFF000000));
        assert_eq!(red.blend_toward_transparent(0.5).alpha(), 128);
        assert!(red.blend_toward_transparent(0.3).same_rgb(red));
    }
}
