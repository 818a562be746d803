//! I/O modules for reading rasters and plot boundaries and writing results

pub mod plots;
pub mod raster;
pub mod report;

pub use plots::read_plots_geojson;
pub use raster::{GdalRasterSource, RasterSource};
pub use report::{write_failures_csv, write_geostreams_csv, write_trait_csv};
