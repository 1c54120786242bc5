//! Light/dark theme tokens for chart surfaces and terminal output.

#![allow(missing_docs)]

use std::env;

use crate::timeline::color::{Hsl, Rgb};

/// Theme profile selected by the `darkMode` preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    #[must_use]
    pub const fn from_dark_flag(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }

    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }
}

/// Color output mode for compatibility with `NO_COLOR` and terminal policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Enabled,
    Disabled,
}

impl ColorMode {
    #[must_use]
    pub fn from_environment() -> Self {
        if env::var_os("NO_COLOR").is_some() {
            Self::Disabled
        } else {
            Self::Enabled
        }
    }
}

/// A fill or stroke color accepted by drawing surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Hsl(Hsl),
    Rgb(Rgb),
}

impl Paint {
    #[must_use]
    pub fn to_css(self) -> String {
        match self {
            Self::Hsl(hsl) => hsl.to_css(),
            Self::Rgb(rgb) => rgb.to_hex(),
        }
    }

    #[must_use]
    pub fn to_rgb(self) -> Rgb {
        match self {
            Self::Hsl(hsl) => hsl.to_rgb(),
            Self::Rgb(rgb) => rgb,
        }
    }
}

impl From<Hsl> for Paint {
    fn from(value: Hsl) -> Self {
        Self::Hsl(value)
    }
}

impl From<Rgb> for Paint {
    fn from(value: Rgb) -> Self {
        Self::Rgb(value)
    }
}

/// Concrete colors used by the Gantt renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartPalette {
    pub mode: ThemeMode,
    /// Canvas background behind the bar band.
    pub background: Paint,
    /// Segment labels. Chosen against `background`, not against the bars.
    pub label: Paint,
}

impl ChartPalette {
    #[must_use]
    pub const fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            background: Paint::Rgb(Rgb {
                r: 0xff,
                g: 0xff,
                b: 0xff,
            }),
            label: Paint::Rgb(Rgb { r: 0, g: 0, b: 0 }),
        }
    }

    #[must_use]
    pub const fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            background: Paint::Rgb(Rgb {
                r: 0x1e,
                g: 0x1e,
                b: 0x24,
            }),
            label: Paint::Rgb(Rgb {
                r: 0xe8,
                g: 0xe8,
                b: 0xe8,
            }),
        }
    }

    #[must_use]
    pub const fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }
}

impl Default for ChartPalette {
    fn default() -> Self {
        Self::light()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_flag_maps_to_mode() {
        assert_eq!(ThemeMode::from_dark_flag(true), ThemeMode::Dark);
        assert_eq!(ThemeMode::from_dark_flag(false), ThemeMode::Light);
        assert!(ChartPalette::from_mode(ThemeMode::Dark).mode.is_dark());
    }

    #[test]
    fn labels_contrast_with_background() {
        for palette in [ChartPalette::light(), ChartPalette::dark()] {
            let bg = palette.background.to_rgb();
            let fg = palette.label.to_rgb();
            let luma = |c: Rgb| u32::from(c.r) + u32::from(c.g) + u32::from(c.b);
            assert!(luma(bg).abs_diff(luma(fg)) > 400, "{palette:?}");
        }
    }

    #[test]
    fn paint_css_forms() {
        assert_eq!(ChartPalette::light().label.to_css(), "#000000");
        let hsl = Hsl {
            hue: 9,
            saturation: 70,
            lightness: 60,
        };
        assert_eq!(Paint::from(hsl).to_css(), "hsl(9, 70%, 60%)");
    }
}
