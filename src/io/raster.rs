//! Georeferenced raster loading

use gdal::Dataset;
use ndarray::Array2;
use std::path::Path;

use crate::types::{Crs, GeoTransform, MeanTempError, MeanTempResult, Raster};

/// Supplies rasters to the pipeline, one per image identifier.
///
/// A load failure covers the whole image: the orchestrator records one
/// failure per plot and moves on to the next image.
pub trait RasterSource: Sync {
    fn load(&self, image_id: &str) -> MeanTempResult<Raster>;
}

/// GDAL-backed raster source treating image identifiers as file paths
pub struct GdalRasterSource;

impl RasterSource for GdalRasterSource {
    fn load(&self, image_id: &str) -> MeanTempResult<Raster> {
        Self::read_geotiff(image_id)
    }
}

impl GdalRasterSource {
    /// Reads band 1 of a georeferenced image into memory together with
    /// its geotransform, reference system, and no-data value.
    pub fn read_geotiff<P: AsRef<Path>>(path: P) -> MeanTempResult<Raster> {
        let path = path.as_ref();
        log::info!("Reading raster: {}", path.display());

        let dataset = Dataset::open(path)?;
        let geo_transform = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        log::debug!("raster size: {}x{}", width, height);
        log::debug!("raster geotransform: {:?}", geo_transform);

        let rasterband = dataset.rasterband(1)?;
        let no_data = rasterband.no_data_value().map(|v| v as f32);
        let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let pixels = Array2::from_shape_vec((height, width), band_data.data).map_err(|e| {
            MeanTempError::InvalidFormat(format!(
                "raster {} band data does not match its declared shape: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Raster {
            id: path.display().to_string(),
            pixels,
            geo_transform: GeoTransform::from_gdal(&geo_transform),
            crs: dataset_crs(&dataset)?,
            no_data,
        })
    }
}

/// Prefer the compact EPSG code; fall back to the full WKT definition
/// for rasters georeferenced against a non-registered system.
fn dataset_crs(dataset: &Dataset) -> MeanTempResult<Crs> {
    let sref = dataset.spatial_ref()?;
    if let Ok(code) = sref.auth_code() {
        return Ok(Crs::Epsg(code as u32));
    }
    Ok(Crs::Wkt(sref.to_wkt()?))
}
