use std::fmt;
use std::str::FromStr;

use palette::{IntoColor, Lab, LinSrgb, Srgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PaletteError, Result};

/// One opaque pixel taken from the source image.
pub type PixelSample = Srgb<u8>;

/// Format an RGB triple as `#rrggbb` (lowercase, zero padded).
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse `#rrggbb` or `rrggbb` (either case) into its channels.
pub fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let trimmed = s.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PaletteError::InvalidHex(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| PaletteError::InvalidHex(s.to_string()))
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Sample → Lab, through linear sRGB.
pub(crate) fn to_lab(color: PixelSample) -> Lab {
    let linear: LinSrgb<f32> = color.into_linear();
    linear.into_color()
}

/// Lab → nearest representable sample.
pub(crate) fn from_lab(lab: Lab) -> PixelSample {
    let rgb_f32: Srgb<f32> = Srgb::from_linear(lab.into_color());
    rgb_f32.into_format::<u8>()
}

/// A canonical `#rrggbb` color string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    pub fn from_rgb(color: PixelSample) -> Self {
        HexColor(rgb_to_hex(color.red, color.green, color.blue))
    }

    pub fn to_rgb(&self) -> PixelSample {
        // Constructors guarantee a valid string.
        let (r, g, b) = parse_hex(&self.0).unwrap_or((0, 0, 0));
        Srgb::new(r, g, b)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for HexColor {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        let (r, g, b) = parse_hex(s)?;
        Ok(HexColor(rgb_to_hex(r, g, b)))
    }
}

impl From<PixelSample> for HexColor {
    fn from(color: PixelSample) -> Self {
        HexColor::from_rgb(color)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_is_lowercase_and_zero_padded() {
        assert_eq!(rgb_to_hex(0, 10, 255), "#000aff");
        assert_eq!(rgb_to_hex(0xa1, 0xb2, 0xc3), "#a1b2c3");
    }

    #[test]
    fn parse_accepts_either_case_and_optional_hash() {
        assert_eq!(parse_hex("#A1b2C3").unwrap(), (0xa1, 0xb2, 0xc3));
        assert_eq!(parse_hex("112233").unwrap(), (0x11, 0x22, 0x33));
    }

    #[test]
    fn parse_rejects_bad_input() {
        for bad in ["", "#fff", "#1122334", "#gg0000", "#ééé", "##112233", "#+1+2+3", "+f+f+f"] {
            assert!(parse_hex(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn hex_color_normalizes_to_lowercase() {
        let color: HexColor = "#ABCDEF".parse().unwrap();
        assert_eq!(color.as_str(), "#abcdef");
        assert_eq!(color.as_str().len(), 7);
    }

    #[test]
    fn hex_color_serializes_as_plain_string() {
        let color: HexColor = "#112233".parse().unwrap();
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#112233\"");
        let back: HexColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
        assert!(serde_json::from_str::<HexColor>("\"nope\"").is_err());
        assert!(serde_json::from_str::<HexColor>("\"#+a+b+c\"").is_err());
    }

    #[test]
    fn lab_round_trip_is_close() {
        let teal = Srgb::new(0x11u8, 0x80, 0x80);
        let back = from_lab(to_lab(teal));
        assert!(back.red.abs_diff(teal.red) <= 1);
        assert!(back.green.abs_diff(teal.green) <= 1);
        assert!(back.blue.abs_diff(teal.blue) <= 1);
    }

    proptest! {
        #[test]
        fn rgb_to_hex_parses_back(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let hex = rgb_to_hex(r, g, b);
            prop_assert_eq!(hex.len(), 7);
            prop_assert_eq!(parse_hex(&hex).unwrap(), (r, g, b));
            let color = HexColor::from_rgb(Srgb::new(r, g, b));
            prop_assert_eq!(color.to_rgb(), Srgb::new(r, g, b));
        }
    }
}
