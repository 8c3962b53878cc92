//! RGB colors as they appear in configuration files

use serde::Deserialize;
use std::fmt;

/// Linear RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Accepted spellings of a color
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Text(String),
    Components([f64; 3]),
}

impl TryFrom<ColorRepr> for Color {
    type Error = String;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Text(text) => {
                Color::parse(&text).ok_or_else(|| format!("unknown color '{}'", text))
            }
            ColorRepr::Components(components) => Color::from_components(components)
                .ok_or_else(|| format!("color components out of range: {:?}", components)),
        }
    }
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("white", [255, 255, 255]),
    ("w", [255, 255, 255]),
    ("black", [0, 0, 0]),
    ("k", [0, 0, 0]),
    ("red", [255, 0, 0]),
    ("r", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("g", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("b", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("y", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("c", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("m", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("lightgray", [211, 211, 211]),
    ("lightgrey", [211, 211, 211]),
    ("darkgray", [169, 169, 169]),
    ("darkgrey", [169, 169, 169]),
    ("silver", [192, 192, 192]),
    ("orange", [255, 165, 0]),
    ("tan", [210, 180, 140]),
    ("navy", [0, 0, 128]),
    ("lightblue", [173, 216, 230]),
    ("steelblue", [70, 130, 180]),
    ("paraview", [82, 87, 110]),
];

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::new(
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        )
    }

    /// Parse `#rrggbb`, `#rgb` (the `#` is optional) or a known color name
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let lowered = text.to_ascii_lowercase();
        if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == lowered) {
            return Some(Self::from_rgb8(*rgb));
        }

        let hex = lowered.strip_prefix('#').unwrap_or(&lowered);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::from_rgb8([channel(0)?, channel(2)?, channel(4)?]))
            }
            3 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::from_rgb8([channel(0)?, channel(1)?, channel(2)?]))
            }
            _ => None,
        }
    }

    /// Components in `0..=1`, or in `0..=255` if any component exceeds 1
    pub fn from_components(components: [f64; 3]) -> Option<Self> {
        if components.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return None;
        }
        let scale = if components.iter().any(|c| *c > 1.0) { 255.0 } else { 1.0 };
        if components.iter().any(|c| *c > scale) {
            return None;
        }
        Some(Self::new(
            (components[0] / scale) as f32,
            (components[1] / scale) as f32,
            (components[2] / scale) as f32,
        ))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Linear interpolation towards `other`
    pub fn lerp(self, other: Color, t: f32) -> Color {
        Color::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_rgb8();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}
