// SPDX-License-Identifier: PMPL-1.0-or-later
//! CSS color values and the WCAG luminance formula.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::OnceLock;

/// An opaque sRGB color. Alpha is tracked only to recognise `transparent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub transparent: bool,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, transparent: false }
    }

    /// Parse any supported CSS color: `#rgb`, `#rrggbb`, `rgb()`, `rgba()`,
    /// a basic named color or `transparent`.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim().trim_end_matches("!important").trim().to_lowercase();
        if trimmed.starts_with('#') {
            parse_hex(&trimmed)
        } else if trimmed.starts_with("rgb") {
            parse_rgb_function(&trimmed)
        } else if trimmed == "transparent" {
            Some(Self { r: 0, g: 0, b: 0, transparent: true })
        } else {
            parse_named(&trimmed)
        }
    }

    /// Relative luminance per WCAG 2.x
    /// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
    pub fn relative_luminance(&self) -> f64 {
        let channel = |c: u8| {
            let v = c as f64 / 255.0;
            if v <= 0.04045 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    /// Contrast ratio against another color, always >= 1.0
    pub fn contrast_with(&self, other: &Rgb) -> f64 {
        let l1 = self.relative_luminance();
        let l2 = other.relative_luminance();
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Canonical `#rrggbb` form
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.transparent {
            write!(f, "transparent")
        } else {
            write!(f, "{}", self.to_hex())
        }
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 | 4 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
            Some(Rgb::new(digit(0)?, digit(1)?, digit(2)?))
        }
        6 | 8 => {
            let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb::new(pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

fn parse_rgb_function(value: &str) -> Option<Rgb> {
    static RGB_RE: OnceLock<Regex> = OnceLock::new();
    let re = RGB_RE.get_or_init(|| {
        Regex::new(r"rgba?\(\s*(\d+)\s*[,\s]\s*(\d+)\s*[,\s]\s*(\d+)(?:\s*[,/]\s*([\d.]+%?))?")
            .expect("valid regex")
    });
    let caps = re.captures(value)?;
    let channel = |i: usize| caps[i].parse::<u16>().ok().map(|v| v.min(255) as u8);
    let mut color = Rgb::new(channel(1)?, channel(2)?, channel(3)?);
    if let Some(alpha) = caps.get(4) {
        let alpha = alpha.as_str();
        let zero = alpha.trim_end_matches('%').parse::<f64>().map(|a| a == 0.0).unwrap_or(false);
        color.transparent = zero;
    }
    Some(color)
}

fn parse_named(name: &str) -> Option<Rgb> {
    let (r, g, b) = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        _ => return None,
    };
    Some(Rgb::new(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::parse("#fff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::parse("#3B82F6"), Some(Rgb::new(0x3b, 0x82, 0xf6)));
        assert_eq!(Rgb::parse("#zzz"), None);
        assert_eq!(Rgb::parse("#12345"), None);
    }

    #[test]
    fn test_parse_rgb_functions() {
        assert_eq!(Rgb::parse("rgb(255, 0, 0)"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(Rgb::parse("rgba(0,0,0,0.5)"), Some(Rgb::BLACK));
        assert!(Rgb::parse("rgba(0, 0, 0, 0)").unwrap().transparent);
    }

    #[test]
    fn test_parse_named_and_transparent() {
        assert_eq!(Rgb::parse(" Navy "), Some(Rgb::new(0, 0, 128)));
        assert!(Rgb::parse("transparent").unwrap().transparent);
        assert_eq!(Rgb::parse("var(--color-primary)"), None);
    }

    #[test]
    fn test_contrast_extremes() {
        let ratio = Rgb::BLACK.contrast_with(&Rgb::WHITE);
        assert!((ratio - 21.0).abs() < 0.01);
        assert!((Rgb::WHITE.contrast_with(&Rgb::WHITE) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contrast_is_symmetric() {
        let a = Rgb::parse("#1E293B").unwrap();
        let b = Rgb::parse("#F8FAFC").unwrap();
        assert!((a.contrast_with(&b) - b.contrast_with(&a)).abs() < 1e-12);
        assert!(a.contrast_with(&b) > 4.5);
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(Rgb::parse("#ABC").unwrap().to_string(), "#aabbcc");
    }
}
