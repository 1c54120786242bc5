//! Deterministic pid → color assignment for Gantt bars.
//!
//! Hue comes from a 32-bit wrapping string hash (`hash * 31 + unit` over
//! UTF-16 code units), so the same pid maps to the same color in every
//! session. Distinct pids may collide; that is tolerated.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;

/// Saturation shared by every generated color, in percent.
pub const SATURATION_PCT: u8 = 70;
/// Lightness shared by every generated color, in percent.
pub const LIGHTNESS_PCT: u8 = 60;

/// 32-bit signed wrapping string hash.
#[must_use]
pub fn hash_code(pid: &str) -> i32 {
    pid.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    })
}

/// Hue in `0..360` for a pid.
#[must_use]
pub fn hue_for(pid: &str) -> u16 {
    // unsigned_abs keeps i32::MIN well-defined.
    #[allow(clippy::cast_possible_truncation)]
    let hue = (hash_code(pid).unsigned_abs() % 360) as u16;
    hue
}

/// Color assigned to a pid.
#[must_use]
pub fn color_for(pid: &str) -> Hsl {
    Hsl {
        hue: hue_for(pid),
        saturation: SATURATION_PCT,
        lightness: LIGHTNESS_PCT,
    }
}

/// HSL color with integer components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Hsl {
    /// CSS functional notation, e.g. `hsl(9, 70%, 60%)`.
    #[must_use]
    pub fn to_css(self) -> String {
        self.to_string()
    }

    /// Convert to sRGB.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::many_single_char_names
    )]
    pub fn to_rgb(self) -> Rgb {
        let h = f64::from(self.hue % 360) / 60.0;
        let s = f64::from(self.saturation.min(100)) / 100.0;
        let l = f64::from(self.lightness.min(100)) / 100.0;

        let c = (1.0 - 2.0f64.mul_add(l, -1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match h {
            h if h < 1.0 => (c, x, 0.0),
            h if h < 2.0 => (x, c, 0.0),
            h if h < 3.0 => (0.0, c, x),
            h if h < 4.0 => (0.0, x, c),
            h if h < 5.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: to_byte(r),
            g: to_byte(g),
            b: to_byte(b),
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

impl Rgb {
    /// Hex notation, e.g. `#e0685c`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Per-render-pass memo of pid → color.
///
/// Build a fresh table for every draw so pids from an older run do not
/// linger.
#[derive(Debug, Default)]
pub struct ColorTable {
    colors: HashMap<String, Hsl>,
}

impl ColorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `pid`, hashing only on first sight.
    pub fn get(&mut self, pid: &str) -> Hsl {
        if let Some(color) = self.colors.get(pid) {
            return *color;
        }
        let color = color_for(pid);
        self.colors.insert(pid.to_string(), color);
        color
    }

    /// Number of distinct pids seen this pass.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
