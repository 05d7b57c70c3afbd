//! Theme palette derivation
//!
//! Maps a single seed color to an eight-level ramp plus the named slots the
//! style cascade consumes (`light`, `base`, `action`, `textColor`) and a pair
//! of pastel gradients picked by the seed's color family.
//!
//! Derivation never fails: a missing or malformed seed falls back to
//! [`DEFAULT_SEED`].

use serde::Serialize;
use tracing::warn;

/// Seed used when none (or an unparseable one) is supplied
pub const DEFAULT_SEED: &str = "#8E6FF7";

/// Lightening fractions for levels 0..=3 (lightest first)
const LIGHTEN_STEPS: [f64; 4] = [0.95, 0.85, 0.70, 0.40];
/// Darkening fractions for levels 5..=7
const DARKEN_STEPS: [f64; 3] = [0.20, 0.40, 0.60];

/// Luminance above which black text is more readable than white
const LUMINANCE_THRESHOLD: f64 = 0.58;

const BLACK_LEVELS: [&str; 8] = [
    "#F4F4F5", "#E4E4E7", "#D4D4D8", "#A1A1AA", "#000000", "#18181B", "#27272A", "#3F3F46",
];
const WHITE_LEVELS: [&str; 8] = [
    "#FFFFFF", "#FAFAFA", "#F4F4F5", "#E4E4E7", "#FFFFFF", "#D4D4D8", "#A1A1AA", "#71717A",
];

/// Coarse hue families used to pick gradients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFamily {
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Pink,
    Teal,
    Indigo,
    Purple,
    Gray,
}

impl ColorFamily {
    /// Curated (light, dark) gradient stops
    fn gradients(self) -> (Gradient, Gradient) {
        let (light, dark) = match self {
            ColorFamily::Red => (("#FEE2E2", "#FFE4E6"), ("#FCA5A5", "#FDA4AF")),
            ColorFamily::Green => (("#DCFCE7", "#D1FAE5"), ("#86EFAC", "#6EE7B7")),
            ColorFamily::Blue => (("#DBEAFE", "#E0F2FE"), ("#93C5FD", "#7DD3FC")),
            ColorFamily::Yellow => (("#FEF9C3", "#FEF3C7"), ("#FDE047", "#FCD34D")),
            ColorFamily::Orange => (("#FFEDD5", "#FEF3C7"), ("#FDBA74", "#FCD34D")),
            ColorFamily::Pink => (("#FCE7F3", "#FAE8FF"), ("#F9A8D4", "#F0ABFC")),
            ColorFamily::Teal => (("#CCFBF1", "#CFFAFE"), ("#5EEAD4", "#67E8F9")),
            ColorFamily::Indigo => (("#E0E7FF", "#EDE9FE"), ("#A5B4FC", "#C4B5FD")),
            ColorFamily::Purple => (("#F3E8FF", "#FCE7F3"), ("#D8B4FE", "#F9A8D4")),
            ColorFamily::Gray => (("#F4F4F5", "#E4E4E7"), ("#D4D4D8", "#A1A1AA")),
        };
        (Gradient::new(light.0, light.1), Gradient::new(dark.0, dark.1))
    }
}

/// Two-stop gradient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub start: String,
    pub end: String,
}

impl Gradient {
    fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Diagonal CSS gradient
    pub fn css(&self) -> String {
        format!("linear-gradient(135deg, {} 0%, {} 100%)", self.start, self.end)
    }
}

/// Palette derived from one seed color
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalette {
    pub seed: String,
    pub family: ColorFamily,
    pub light: String,
    pub base: String,
    pub action: String,
    pub text_color: String,
    pub gradient_light: Gradient,
    pub gradient_dark: Gradient,
    /// Lightest to darkest; index 4 is the seed
    pub levels: [String; 8],
}

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional)
    pub fn parse(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Perceived luminance in `0.0..=1.0`
    pub fn luminance(self) -> f64 {
        (0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b))
            / 255.0
    }

    /// Move each channel toward white by `t`
    pub fn lighten(self, t: f64) -> Self {
        let f = |c: u8| (f64::from(c) + (255.0 - f64::from(c)) * t).round() as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// Scale each channel toward black by `t`
    pub fn darken(self, t: f64) -> Self {
        let f = |c: u8| (f64::from(c) * (1.0 - t)).round() as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }
}

/// Readable text color on top of `color`
pub fn text_color_for(color: Rgb) -> &'static str {
    if color.luminance() > LUMINANCE_THRESHOLD {
        "#000000"
    } else {
        "#FFFFFF"
    }
}

/// Classify a color into a hue family
///
/// Ordered channel-dominance heuristics; the first rule that matches wins.
pub fn classify(color: Rgb) -> ColorFamily {
    // The product's default seed reads as blue under the dominance rules
    if color == Rgb::new(0x8E, 0x6F, 0xF7) {
        return ColorFamily::Purple;
    }

    let (r, g, b) = (f64::from(color.r), f64::from(color.g), f64::from(color.b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    if max - min < 30.0 {
        ColorFamily::Gray
    } else if r > 200.0 && g > 180.0 && b < 120.0 {
        ColorFamily::Yellow
    } else if r > 200.0 && (100.0..=180.0).contains(&g) && b < 100.0 {
        ColorFamily::Orange
    } else if r > 180.0 && b > 120.0 && g < b {
        ColorFamily::Pink
    } else if b > r.max(g) * 1.5 {
        ColorFamily::Blue
    } else if g > r.max(b) * 1.5 {
        ColorFamily::Green
    } else if r > g.max(b) * 1.5 {
        ColorFamily::Red
    } else if g > 120.0 && b > 120.0 && r < g.min(b) * 0.7 {
        ColorFamily::Teal
    } else if b > r && b > g && (r - g).abs() < 40.0 {
        ColorFamily::Indigo
    } else if r > g * 1.3 && b > g * 1.3 {
        ColorFamily::Purple
    } else if max == r {
        ColorFamily::Red
    } else if max == g {
        ColorFamily::Green
    } else {
        ColorFamily::Blue
    }
}

/// Derive the full palette for a seed color
pub fn derive_theme(seed: &str) -> ThemePalette {
    let color = match Rgb::parse(seed) {
        Some(color) => color,
        None => {
            warn!(seed, fallback = DEFAULT_SEED, "invalid theme seed");
            Rgb::parse(DEFAULT_SEED).unwrap_or(Rgb::new(0x8E, 0x6F, 0xF7))
        }
    };

    let levels: [String; 8] = match (color.r, color.g, color.b) {
        (0, 0, 0) => BLACK_LEVELS.map(String::from),
        (255, 255, 255) => WHITE_LEVELS.map(String::from),
        _ => [
            color.lighten(LIGHTEN_STEPS[0]).to_hex(),
            color.lighten(LIGHTEN_STEPS[1]).to_hex(),
            color.lighten(LIGHTEN_STEPS[2]).to_hex(),
            color.lighten(LIGHTEN_STEPS[3]).to_hex(),
            color.to_hex(),
            color.darken(DARKEN_STEPS[0]).to_hex(),
            color.darken(DARKEN_STEPS[1]).to_hex(),
            color.darken(DARKEN_STEPS[2]).to_hex(),
        ],
    };

    let family = classify(color);
    let (gradient_light, gradient_dark) = family.gradients();

    ThemePalette {
        seed: color.to_hex(),
        family,
        light: levels[1].clone(),
        base: levels[4].clone(),
        action: levels[5].clone(),
        text_color: text_color_for(color).to_string(),
        gradient_light,
        gradient_dark,
        levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Rgb::parse("#ff0000"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse("0f0"), Some(Rgb::new(0, 255, 0)));
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb::parse("#gggggg"), None);
    }

    #[test]
    fn test_lighten_and_darken() {
        let c = Rgb::new(100, 0, 200);
        assert_eq!(c.lighten(0.5), Rgb::new(178, 128, 228));
        assert_eq!(c.darken(0.5), Rgb::new(50, 0, 100));
    }

    #[test]
    fn test_black_and_white_use_grayscale() {
        let black = derive_theme("#000000");
        assert_eq!(black.levels, BLACK_LEVELS.map(String::from));
        assert_eq!(black.text_color, "#FFFFFF");
        assert_eq!(black.family, ColorFamily::Gray);

        let white = derive_theme("#FFFFFF");
        assert_eq!(white.levels, WHITE_LEVELS.map(String::from));
        assert_eq!(white.text_color, "#000000");
    }

    #[test]
    fn test_default_seed_is_purple() {
        assert_eq!(derive_theme("#8e6ff7").family, ColorFamily::Purple);
        assert_eq!(classify(Rgb::new(0x8E, 0x70, 0xF7)), ColorFamily::Blue);
    }

    #[test]
    fn test_general_levels() {
        let palette = derive_theme("#2563eb");
        assert_eq!(palette.levels[4], "#2563EB");
        assert_eq!(palette.base, "#2563EB");
        assert_eq!(palette.levels[7], Rgb::new(0x25, 0x63, 0xEB).darken(0.6).to_hex());
        assert_eq!(palette.family, ColorFamily::Blue);
        assert_eq!(palette.text_color, "#FFFFFF");
    }

    #[test]
    fn test_families() {
        assert_eq!(classify(Rgb::new(220, 38, 38)), ColorFamily::Red);
        assert_eq!(classify(Rgb::new(22, 163, 74)), ColorFamily::Green);
        assert_eq!(classify(Rgb::new(250, 204, 21)), ColorFamily::Yellow);
        assert_eq!(classify(Rgb::new(249, 115, 22)), ColorFamily::Orange);
        assert_eq!(classify(Rgb::new(236, 72, 153)), ColorFamily::Pink);
        assert_eq!(classify(Rgb::new(120, 120, 130)), ColorFamily::Gray);
    }

    #[test]
    fn test_invalid_seed_falls_back() {
        assert_eq!(derive_theme("not a color"), derive_theme(DEFAULT_SEED));
        assert_eq!(derive_theme(""), derive_theme(DEFAULT_SEED));
    }

    #[test]
    fn test_light_seed_gets_dark_text() {
        assert_eq!(derive_theme("#FDE68A").text_color, "#000000");
    }
}
