//! Drawing surface abstraction and an in-memory recording surface.

#![allow(missing_docs)]

use super::theme::Paint;

/// Axis-aligned rectangle in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Text placement attributes. `y` passed to [`DrawSurface::fill_text`] is the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub paint: Paint,
    pub font_size: f64,
}

/// Primitive 2-D target the Gantt renderer draws onto.
///
/// The renderer owns sizing: it calls `set_size` before drawing a chart.
pub trait DrawSurface {
    fn set_size(&mut self, width: f64, height: f64);
    fn size(&self) -> (f64, f64);
    /// Erase everything; the surface is blank afterwards.
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, paint: Paint);
    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: TextStyle);
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    SetSize { width: f64, height: f64 },
    Clear,
    FillRect { rect: Rect, paint: Paint },
    FillText {
        text: String,
        x: f64,
        y: f64,
        style: TextStyle,
    },
}

/// Surface that records every call; used to inspect renderer output.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Operations issued since the most recent clear.
    #[must_use]
    pub fn visible_ops(&self) -> &[DrawOp] {
        let after_clear = self
            .ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::Clear))
            .map_or(0, |idx| idx + 1);
        &self.ops[after_clear..]
    }

    /// True when nothing has been painted since the last clear.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.visible_ops()
            .iter()
            .all(|op| matches!(op, DrawOp::SetSize { .. }))
    }

    /// Rectangles painted since the last clear.
    #[must_use]
    pub fn rects(&self) -> Vec<(Rect, Paint)> {
        self.visible_ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { rect, paint } => Some((*rect, *paint)),
                _ => None,
            })
            .collect()
    }

    /// Text labels painted since the last clear.
    #[must_use]
    pub fn texts(&self) -> Vec<(String, f64, f64)> {
        self.visible_ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, x, y, .. } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.ops.push(DrawOp::SetSize { width, height });
    }

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, paint: Paint) {
        self.ops.push(DrawOp::FillRect { rect, paint });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, style: TextStyle) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            style,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::color::Rgb;

    #[test]
    fn blank_after_clear() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Paint::Rgb(Rgb { r: 1, g: 2, b: 3 }));
        assert!(!surface.is_blank());
        surface.clear();
        assert!(surface.is_blank());
        assert_eq!(surface.ops().len(), 2);
    }

    #[test]
    fn fresh_surface_is_blank() {
        assert!(RecordingSurface::default().is_blank());
    }
}
