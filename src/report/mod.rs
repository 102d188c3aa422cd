//! Report rendering and output.
//!
//! The same analysis is rendered as an aligned text report, a
//! comma-delimited report and optionally JSON.

pub mod csv;
pub mod generator;
pub mod sink;
pub mod text;

pub use generator::{render_reports, save_reports};
