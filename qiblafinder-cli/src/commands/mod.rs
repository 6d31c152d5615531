//! CLI command implementations.

pub mod align;
pub mod bearing;
pub mod config;
pub mod track;
