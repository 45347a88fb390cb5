//! Colour values as they are authored (sRGB hex) and as the GPU consumes them (linear).

use serde::Deserialize;

use crate::error::ViewerError;

/// A linear-space RGB colour.
///
/// Colours are written down as sRGB hex (`#d1d1eb`, `0xd1d1eb`) and converted
/// to linear on construction, so everything downstream of this type works in
/// linear space.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const fn linear(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from a packed `0xRRGGBB` sRGB value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
        }
    }

    /// Parse `#rrggbb` or `#rgb`.
    pub fn parse(text: &str) -> Result<Self, ViewerError> {
        let invalid = || ViewerError::InvalidColor(text.to_string());
        let digits = text.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let hex = match digits.len() {
            6 => u32::from_str_radix(digits, 16).map_err(|_| invalid())?,
            3 => {
                let short = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
                let (r, g, b) = ((short >> 8) & 0xf, (short >> 4) & 0xf, short & 0xf);
                (r * 0x11) << 16 | (g * 0x11) << 8 | (b * 0x11)
            }
            _ => return Err(invalid()),
        };
        Ok(Self::from_hex(hex))
    }

    /// Pack into 8-bit channels with full opacity.
    ///
    /// Channels are truncated (`floor(c * 255)`), not rounded.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let pack = |c: f32| (c.clamp(0.0, 1.0) * 255.0).floor() as u8;
        [pack(self.r), pack(self.g), pack(self.b), 255]
    }

    pub fn to_rgba(&self) -> [f32; 4] {
        [self.r, self.g, self.b, 1.0]
    }
}

impl TryFrom<String> for Color {
    type Error = ViewerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for cgmath::Vector3<f32> {
    fn from(color: Color) -> Self {
        cgmath::Vector3::new(color.r, color.g, color.b)
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Color::parse("#ffffff").unwrap(), Color::WHITE);
        assert_eq!(Color::parse("#000").unwrap(), Color::BLACK);
        assert_eq!(Color::parse("#a82e2e").unwrap(), Color::from_hex(0xa82e2e));
        assert_eq!(Color::parse("#fa0").unwrap(), Color::from_hex(0xffaa00));
    }

    #[test]
    fn rejects_malformed_hex() {
        for text in ["ffffff", "#ffff", "#gggggg", "#+12345", ""] {
            assert_eq!(
                Color::parse(text),
                Err(ViewerError::InvalidColor(text.to_string())),
                "{text} should not parse"
            );
        }
    }

    #[test]
    fn converts_srgb_to_linear_before_packing() {
        // mid grey is ~0.2159 in linear space
        assert_eq!(Color::from_hex(0x808080).to_rgba8(), [55, 55, 55, 255]);
        assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Color::BLACK.to_rgba8(), [0, 0, 0, 255]);
    }

    #[test]
    fn packing_truncates_fractional_channels() {
        // 0x3a is ~10.79 and 0x5a ~26.07 after linearisation
        assert_eq!(Color::from_hex(0x3a3a5a).to_rgba8(), [10, 10, 26, 255]);
    }

    #[test]
    fn deserializes_from_json_string() {
        let color: Color = serde_json::from_str("\"#9998c8\"").unwrap();
        assert_eq!(color, Color::from_hex(0x9998c8));
        assert!(serde_json::from_str::<Color>("\"blue\"").is_err());
    }
}
