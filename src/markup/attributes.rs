use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// 8-bit RGBA colour, serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub fn to_hex(self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| format!("Colour must start with '#': {value}"))?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(format!("Colour must be #rrggbb or #rrggbbaa: {value}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("Invalid colour {value}: {e}"))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 0xff };
        Ok(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a })
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontFamily {
    #[default]
    Body,
    Monospace,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Font {
    pub family: FontFamily,
    /// Point size.
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl Font {
    pub fn body(size: f32) -> Self {
        Self {
            family: FontFamily::Body,
            size,
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.style == FontStyle::Italic
    }
}

impl Hash for Font {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.size.to_bits().hash(state);
        self.weight.hash(state);
        self.style.hash(state);
    }
}

#[derive(Clone, Debug, PartialEq, Hash)]
pub struct TextAttributes {
    pub font: Font,
    pub color: Color,
    /// Target URL when the slice is part of a link.
    pub link: Option<String>,
}

impl TextAttributes {
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }
}

/// Base attributes a message body is rendered with.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub text_color: Color,
    pub link_color: Color,
    /// Deepest block/inline nesting accepted before falling back to plain text.
    pub max_nesting: usize,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 17.0,
            text_color: Color::rgb(0x1c, 0x1c, 0x1e),
            link_color: Color::rgb(0x0a, 0x84, 0xff),
            max_nesting: 32,
        }
    }
}

impl TextStyle {
    pub fn base_attributes(&self) -> TextAttributes {
        TextAttributes {
            font: Font::body(self.font_size),
            color: self.text_color,
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_hex_round_trips_through_serde() {
        let color: Color = serde_json::from_str("\"#0a84ff\"").unwrap();
        assert_eq!(color, Color::rgb(0x0a, 0x84, 0xff));
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#0a84ff\"");

        let translucent: Color = serde_json::from_str("\"#00000080\"").unwrap();
        assert_eq!(translucent.a, 0x80);
    }

    #[test]
    fn invalid_colours_are_rejected() {
        assert!(serde_json::from_str::<Color>("\"0a84ff\"").is_err());
        assert!(serde_json::from_str::<Color>("\"#0a84f\"").is_err());
        assert!(serde_json::from_str::<Color>("\"#zz84ff\"").is_err());
    }
}
