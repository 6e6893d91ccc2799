use std::fmt;
use std::str::FromStr;

use csscolorparser::Color as CssColor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Straight (non-premultiplied) RGBA color.
///
/// Serialized as a CSS hex string (`#rrggbbaa`); parses any CSS color:
/// hex forms, named colors and `rgb()`/`rgba()`/`hsl()` notations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized color '{0}'")]
pub struct ParseColorError(pub String);

impl FromStr for Rgba {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed: CssColor = s
            .trim()
            .parse()
            .map_err(|_| ParseColorError(s.to_string()))?;
        let [r, g, b, a] = parsed.to_rgba8();
        Ok(Rgba::new(r, g, b, a))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl TryFrom<String> for Rgba {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_long_hex() {
        assert_eq!("#fff".parse::<Rgba>().unwrap(), Rgba::WHITE);
        assert_eq!("#ff000080".parse::<Rgba>().unwrap(), Rgba::new(255, 0, 0, 128));
        assert_eq!("#00ff00".parse::<Rgba>().unwrap(), Rgba::rgb(0, 255, 0));
        assert_eq!("transparent".parse::<Rgba>().unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_parse_named_and_functional_colors() {
        assert_eq!("red".parse::<Rgba>().unwrap(), Rgba::rgb(255, 0, 0));
        assert_eq!(" white ".parse::<Rgba>().unwrap(), Rgba::WHITE);
        assert_eq!("rgb(0, 128, 255)".parse::<Rgba>().unwrap(), Rgba::rgb(0, 128, 255));

        let half = "rgba(0,0,0,0.5)".parse::<Rgba>().unwrap();
        assert_eq!((half.r, half.g, half.b), (0, 0, 0));
        assert!((127..=128).contains(&half.a));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-color".parse::<Rgba>().is_err());
        assert!("#ggg".parse::<Rgba>().is_err());
        assert!("#12345".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgba::rgb(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203ff\"");
        let back: Rgba = serde_json::from_str("\"#fff\"").unwrap();
        assert_eq!(back, Rgba::WHITE);
    }
}
