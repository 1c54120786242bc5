#![forbid(unsafe_code)]

//! schedviz: CPU-scheduling Gantt viewer.
//!
//! Submits a process table to a scheduling simulation service, draws the
//! returned timeline as a Gantt chart, and plays it back segment by
//! segment while highlighting the running process.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use schedviz::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use schedviz::core::config::Config;
//! use schedviz::render::svg::SvgSurface;
//! ```

pub mod prelude;

pub mod backend;
#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod logger;
pub mod playback;
pub mod prefs;
pub mod render;
pub mod session;
pub mod table;
pub mod timeline;
