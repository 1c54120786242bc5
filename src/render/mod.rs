//! Gantt chart rendering onto pluggable drawing surfaces.
//!
//! The renderer is the only component that mutates a surface. Surfaces:
//! [`svg::SvgSurface`] for files, [`terminal::CellSurface`] for the live
//! player, and [`surface::RecordingSurface`] for inspection.

pub mod gantt;
pub mod surface;
pub mod svg;
pub mod terminal;
pub mod theme;

pub use gantt::{BarGeometry, GanttLayout, GanttRenderer};
pub use surface::{DrawSurface, RecordingSurface, Rect, TextStyle};
pub use theme::{ChartPalette, Paint, ThemeMode};
