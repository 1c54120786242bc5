//! Gantt renderer: maps a [`Timeline`] onto a [`DrawSurface`].
//!
//! Geometry:
//!
//! ```text
//! width = max(min_width, span * pixels_per_unit)
//! x     = (start - global_start) / span * width
//! w     = (end - start) / span * width
//! ```
//!
//! Every bar sits in the same horizontal band; its label is drawn at the
//! bar's left edge plus a small inset, in the theme's label color.

#![allow(missing_docs)]

use crate::core::config::RenderConfig;
use crate::timeline::color::{ColorTable, Hsl};
use crate::timeline::model::Timeline;

use super::surface::{DrawSurface, Rect, TextStyle};
use super::theme::{ChartPalette, Paint};

/// Chart geometry knobs, in surface units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GanttLayout {
    pub min_width: f64,
    pub pixels_per_unit: f64,
    pub height: f64,
    pub bar_y: f64,
    pub bar_height: f64,
    pub label_inset: f64,
    pub label_baseline: f64,
    pub font_size: f64,
}

impl Default for GanttLayout {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for GanttLayout {
    fn from(cfg: &RenderConfig) -> Self {
        Self {
            min_width: cfg.min_width,
            pixels_per_unit: cfg.pixels_per_unit,
            height: cfg.height,
            bar_y: cfg.bar_y,
            bar_height: cfg.bar_height,
            label_inset: cfg.label_inset,
            label_baseline: cfg.label_baseline,
            font_size: cfg.font_size,
        }
    }
}

impl GanttLayout {
    /// Layout for a character grid `cols` wide: a three-row bar band with
    /// labels on its middle row.
    #[must_use]
    pub fn terminal(cols: u16) -> Self {
        Self {
            min_width: f64::from(cols.max(1)),
            pixels_per_unit: 1.0,
            height: 5.0,
            bar_y: 1.0,
            bar_height: 3.0,
            label_inset: 1.0,
            label_baseline: 2.0,
            font_size: 1.0,
        }
    }

    /// Scale horizontal resolution by `factor`. Non-positive or non-finite
    /// factors leave the layout unchanged.
    #[must_use]
    pub fn zoomed(mut self, factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            self.pixels_per_unit *= factor;
        }
        self
    }

    /// Canvas width for a timeline.
    #[must_use]
    pub fn canvas_width(&self, timeline: &Timeline) -> f64 {
        self.min_width.max(timeline.span() * self.pixels_per_unit)
    }
}

/// Computed placement of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGeometry {
    pub pid: String,
    pub rect: Rect,
    pub color: Hsl,
    pub label: String,
    pub label_x: f64,
    pub label_y: f64,
}

/// Draws Gantt charts; stateless apart from layout and palette.
#[derive(Debug, Clone, Default)]
pub struct GanttRenderer {
    layout: GanttLayout,
    palette: ChartPalette,
}

impl GanttRenderer {
    #[must_use]
    pub fn new(layout: GanttLayout, palette: ChartPalette) -> Self {
        Self { layout, palette }
    }

    #[must_use]
    pub fn layout(&self) -> &GanttLayout {
        &self.layout
    }

    #[must_use]
    pub fn palette(&self) -> &ChartPalette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: ChartPalette) {
        self.palette = palette;
    }

    /// Bar placement for every segment, in timeline order.
    ///
    /// Colors come from a fresh [`ColorTable`] per call.
    #[must_use]
    pub fn bars(&self, timeline: &Timeline) -> Vec<BarGeometry> {
        let width = self.layout.canvas_width(timeline);
        let span = timeline.span();
        let origin = timeline.global_start();
        let mut colors = ColorTable::new();

        timeline
            .iter()
            .map(|seg| {
                let x = (seg.start - origin) / span * width;
                let w = seg.duration() / span * width;
                BarGeometry {
                    pid: seg.pid.clone(),
                    rect: Rect::new(x, self.layout.bar_y, w, self.layout.bar_height),
                    color: colors.get(&seg.pid),
                    label: seg.label(),
                    label_x: x + self.layout.label_inset,
                    label_y: self.layout.label_baseline,
                }
            })
            .collect()
    }

    /// Draw the full chart. An absent or empty timeline clears the surface
    /// and draws nothing else. Returns the number of bars drawn.
    pub fn draw<S>(&self, timeline: Option<&Timeline>, surface: &mut S) -> usize
    where
        S: DrawSurface + ?Sized,
    {
        let Some(timeline) = timeline.filter(|t| !t.is_empty()) else {
            surface.clear();
            return 0;
        };

        let width = self.layout.canvas_width(timeline);
        surface.set_size(width, self.layout.height);
        surface.clear();
        surface.fill_rect(
            Rect::new(0.0, 0.0, width, self.layout.height),
            self.palette.background,
        );

        let label_style = TextStyle {
            paint: self.palette.label,
            font_size: self.layout.font_size,
        };
        let bars = self.bars(timeline);
        for bar in &bars {
            surface.fill_rect(bar.rect, Paint::Hsl(bar.color));
            surface.fill_text(&bar.label, bar.label_x, bar.label_y, label_style);
        }
        bars.len()
    }
}
