//! Wildfire detections vs. ground-level air quality.
//!
//! Loads MODIS/VIIRS fire detections and EPA daily pollutant series,
//! narrows them to a day, a window or a region, merges the pollutants and
//! summarises them. The egui viewer in `main.rs` only draws what this
//! library returns.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;

pub use analysis::{AnalysisParams, LoadedData, Section};
pub use config::AnalysisConfig;
pub use error::{ConfigError, DataError};
