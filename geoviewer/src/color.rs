use serde::{Deserialize, Serialize};

/// RGBA color.
///
/// Serialized as a CSS color string. Parsing accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA`,
/// `rgb(r, g, b)` and `rgba(r, g, b, a)` with `a` in `0..=1`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// Transparent color: `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Red color: `#FF0000FF`
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    /// Blue color: `#0000FFFF`
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Converts the color into a CSS `rgba()` function, as used inside SVG documents.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({},{},{},{})",
            self.r,
            self.g,
            self.b,
            (self.a as f32 / 255.0 * 100.0).round() / 100.0
        )
    }

    /// Parses a CSS color string.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.starts_with('#') {
            return Self::try_from_hex(value);
        }

        let lower = value.to_ascii_lowercase();
        let (args, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest.strip_suffix(')')?, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest.strip_suffix(')')?, false)
        } else {
            return None;
        };

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != if has_alpha { 4 } else { 3 } {
            return None;
        }

        let r = parts[0].parse().ok()?;
        let g = parts[1].parse().ok()?;
        let b = parts[2].parse().ok()?;
        let a = if has_alpha {
            let alpha: f32 = parts[3].parse().ok()?;
            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }

    /// Parses a color from the hex string: `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        let digits = hex_string.strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            3 => {
                let short = |i: usize| {
                    u8::from_str_radix(digits.get(i..i + 1)?, 16)
                        .ok()
                        .map(|v| v * 17)
                };
                Some(Self::rgba(short(0)?, short(1)?, short(2)?, 255))
            }
            6 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::rgba(
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)?,
            )),
            _ => None,
        }
    }

    /// Returns a new color instance, copied from the base one but with the given alpha channel.
    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }

    /// Returns the color with alpha channel multiplied by `opacity` (`0.0..=1.0`).
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(a)
    }

    /// Opacity of the color in `0.0..=1.0` range.
    pub fn opacity(&self) -> f32 {
        self.a as f32 / 255.0
    }

    /// Red component of the color in RGBA space.
    pub fn r(&self) -> u8 {
        self.r
    }

    /// Green component of the color in RGBA space.
    pub fn g(&self) -> u8 {
        self.g
    }

    /// Blue component of the color in RGBA space.
    pub fn b(&self) -> u8 {
        self.b
    }

    /// Opacity component of the color.
    pub fn a(&self) -> u8 {
        self.a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_css_colors() {
        assert_eq!(Color::parse("#f00"), Some(Color::RED));
        assert_eq!(Color::parse("#FF0000"), Some(Color::RED));
        assert_eq!(
            Color::parse("#FF000080"),
            Some(Color::rgba(255, 0, 0, 128))
        );
        assert_eq!(
            Color::parse("rgba(0, 0, 255, 0.5)"),
            Some(Color::rgba(0, 0, 255, 128))
        );
        assert_eq!(Color::parse("rgb(255,255,255)"), Some(Color::WHITE));
        assert_eq!(Color::parse("red"), None);
        assert_eq!(Color::parse("#12345"), None);
    }

    #[test]
    fn opacity_multiplies_alpha() {
        assert_eq!(Color::RED.with_opacity(0.5).a(), 128);
        assert_eq!(Color::RED.with_alpha(100).with_opacity(0.0).a(), 0);
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&Color::BLUE).unwrap();
        assert_eq!(json, "\"#0000FFFF\"");
        let color: Color = serde_json::from_str("\"rgba(0,0,255,1)\"").unwrap();
        assert_eq!(color, Color::BLUE);
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }
}
