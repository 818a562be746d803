//! Polygon reprojection between coordinate reference systems

use gdal::spatial_ref::{CoordTransform, SpatialRef};
use geo_types::{LineString, Polygon};

use crate::types::{Crs, MeanTempError, MeanTempResult};

/// Reprojects plot geometry into a target reference system.
///
/// Implementations must fail with an unsupported-reference-system error
/// rather than silently passing coordinates through.
pub trait Reprojector: Sync {
    fn reproject(
        &self,
        polygon: &Polygon<f64>,
        source: &Crs,
        target: &Crs,
    ) -> MeanTempResult<Polygon<f64>>;
}

/// GDAL/PROJ-backed reprojection
pub struct GdalReprojector;

impl GdalReprojector {
    fn spatial_ref(crs: &Crs) -> MeanTempResult<SpatialRef> {
        let sref = match crs {
            Crs::Epsg(code) => SpatialRef::from_epsg(*code),
            Crs::Wkt(wkt) => SpatialRef::from_wkt(wkt),
        }
        .map_err(|e| MeanTempError::UnsupportedCrs(format!("{}: {}", crs, e)))?;
        // Keep x=easting/longitude, y=northing/latitude regardless of the
        // authority's declared axis order.
        sref.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
        Ok(sref)
    }
}

impl Reprojector for GdalReprojector {
    fn reproject(
        &self,
        polygon: &Polygon<f64>,
        source: &Crs,
        target: &Crs,
    ) -> MeanTempResult<Polygon<f64>> {
        if source == target {
            return Ok(polygon.clone());
        }
        log::debug!("Reprojecting plot boundary {} -> {}", source, target);

        let src_ref = Self::spatial_ref(source)?;
        let dst_ref = Self::spatial_ref(target)?;
        let transform = CoordTransform::new(&src_ref, &dst_ref)
            .map_err(|e| MeanTempError::UnsupportedCrs(format!("{} -> {}: {}", source, target, e)))?;

        let mut xs: Vec<f64> = polygon.exterior().coords().map(|c| c.x).collect();
        let mut ys: Vec<f64> = polygon.exterior().coords().map(|c| c.y).collect();
        let mut zs = vec![0.0; xs.len()];
        transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

        let ring: Vec<(f64, f64)> = xs.into_iter().zip(ys).collect();
        Ok(Polygon::new(LineString::from(ring), vec![]))
    }
}

/// Pass-through reprojector for single-CRS workflows.
///
/// Returns the polygon unchanged when source and target agree and fails
/// otherwise, so a misconfigured pipeline surfaces immediately instead of
/// aggregating pixels from the wrong part of the field.
pub struct NoopReprojector;

impl Reprojector for NoopReprojector {
    fn reproject(
        &self,
        polygon: &Polygon<f64>,
        source: &Crs,
        target: &Crs,
    ) -> MeanTempResult<Polygon<f64>> {
        if source == target {
            Ok(polygon.clone())
        } else {
            Err(MeanTempError::UnsupportedCrs(format!(
                "no reprojection available for {} -> {}",
                source, target
            )))
        }
    }
}
