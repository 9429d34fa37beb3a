//! Report presenters.
//!
//! Markdown and JSON reports for the whole dashboard, plus an SVG
//! rendering of the radar chart.

pub mod generator;
pub mod radar;

pub use generator::{format_value, generate_json_report, generate_markdown_report};
pub use radar::render_radar_svg;
