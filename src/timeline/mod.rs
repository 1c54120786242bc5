//! Timeline model and pid color assignment.

pub mod color;
pub mod model;

pub use color::{ColorTable, Hsl, Rgb, color_for};
pub use model::{Segment, Timeline};
