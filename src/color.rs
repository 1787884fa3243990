// src/color.rs

//! Defines the `Rgba` color type, hex parsing, and the visual themes that
//! select the orb's base stroke/fill color.

use serde::{Deserialize, Serialize};

/// Visual theme of the orb.
///
/// The theme only selects the base color used for square borders and the
/// center fill; everything else about the figure is theme-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Returns the base color for this theme: near-opaque white on dark,
    /// near-opaque black on light.
    pub fn base_color(&self) -> Rgba {
        match self {
            Theme::Dark => Rgba::new(255, 255, 255, 230),
            Theme::Light => Rgba::new(0, 0, 0, 230),
        }
    }
}

/// An RGBA color with 8 bits per channel, non-premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses a 6-digit hex color (`"#rrggbb"` or `"rrggbb"`, any case)
    /// into an opaque color. Returns `None` for anything else; callers that
    /// animate colors treat that as "skip this target" rather than an error.
    pub fn from_hex(input: &str) -> Option<Self> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgba::opaque(r, g, b))
    }

    /// True when the color contributes nothing when drawn.
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Per-channel linear interpolation from `self` toward `other`,
    /// rounding to the nearest channel value.
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let mix = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * t).round() as u8;
        Rgba::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Returns the color with its alpha scaled by `factor` (clamped to 0..=1).
    pub fn scale_alpha(self, factor: f64) -> Rgba {
        let a = (self.a as f64 * factor.clamp(0.0, 1.0)).round() as u8;
        Rgba::new(self.r, self.g, self.b, a)
    }
}
