//! meantemp: A Fast, Modular Plot Mean Temperature Extractor
//!
//! This library computes per-plot mean surface temperature from
//! georeferenced infrared orthoimages of agricultural fields. For every
//! image it reconciles each experimental plot boundary with the raster's
//! pixel grid, rasterizes the boundary into a pixel mask, converts raw
//! sensor values to temperature, and reduces the masked pixels to a mean,
//! emitting one tabular row per (image, plot) pair.
//!
//! A failure is always local to the smallest affected unit: an unreadable
//! image fails only its own plot pairs, a bad plot boundary fails only
//! that plot, and the batch always runs to completion.
//!
//! ```no_run
//! use chrono::Utc;
//! use meantemp::core::{GdalReprojector, MeanTempPipeline, TemperatureScale};
//! use meantemp::io::{read_plots_geojson, GdalRasterSource};
//!
//! # fn main() -> anyhow::Result<()> {
//! let plots = read_plots_geojson("plots.geojson")?;
//! let pipeline = MeanTempPipeline::new(
//!     GdalRasterSource,
//!     GdalReprojector,
//!     TemperatureScale::kelvin_to_celsius(),
//! );
//! let summary = pipeline.run(&["flir_scan.tif".into()], &plots, Utc::now());
//! println!("{} rows, {} failures", summary.rows.len(), summary.failures.len());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::core::{
    BatchSummary, GdalReprojector, MeanTempPipeline, NoopReprojector, PlotMask, Reprojector,
    TemperatureScale,
};
pub use io::{GdalRasterSource, RasterSource};
pub use types::{
    BoundingBox, Citation, Crs, FailureKind, GeoTransform, MeanTempError, MeanTempResult,
    PixelGrid, Plot, PlotOutcome, ProcessingFailure, Raster, RasterValue, ResultRow,
};
