//! Core raster-to-plot aggregation modules

pub mod aggregate;
pub mod geometry;
pub mod mask;
pub mod pipeline;
pub mod reproject;
pub mod temperature;

// Re-export main types
pub use aggregate::{aggregate_plot, PlotAggregate};
pub use geometry::{plot_bounds_in_raster_crs, plot_pixel_ring};
pub use mask::{build_plot_mask, PlotMask};
pub use pipeline::{BatchSummary, MeanTempPipeline};
pub use reproject::{GdalReprojector, NoopReprojector, Reprojector};
pub use temperature::TemperatureScale;
