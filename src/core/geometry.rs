//! Reconciliation of plot geometry with a raster's pixel grid

use geo_types::Polygon;

use crate::core::reproject::Reprojector;
use crate::types::{BoundingBox, MeanTempError, MeanTempResult, Plot, Raster};

/// Plot boundary vertices expressed as fractional (column, row) pixel
/// positions of one specific raster. The closing vertex of the ring is
/// dropped; the mask builder treats the sequence as cyclic.
pub fn plot_pixel_ring<R: Reprojector>(
    reprojector: &R,
    plot: &Plot,
    raster: &Raster,
) -> MeanTempResult<Vec<(f64, f64)>> {
    let boundary = reconciled_boundary(reprojector, plot, raster)?;
    let inverse = raster.geo_transform.invert()?;

    let mut ring: Vec<(f64, f64)> = boundary
        .exterior()
        .coords()
        .map(|c| inverse.world_to_pixel(c.x, c.y))
        .collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return Err(MeanTempError::Geometry(format!(
            "plot {} boundary has fewer than 3 distinct vertices",
            plot.id
        )));
    }
    Ok(ring)
}

/// The plot boundary expressed in the raster's reference system
fn reconciled_boundary<R: Reprojector>(
    reprojector: &R,
    plot: &Plot,
    raster: &Raster,
) -> MeanTempResult<Polygon<f64>> {
    if plot.crs == raster.crs {
        Ok(plot.boundary.clone())
    } else {
        reprojector.reproject(&plot.boundary, &plot.crs, &raster.crs)
    }
}

/// World-coordinate bounding box of a plot in the raster's reference
/// system, used to pre-filter plots before full reconciliation. Only the
/// corner ring of the plot's bounding box is reprojected, which is cheap
/// and accurate enough for an intersection test.
pub fn plot_bounds_in_raster_crs<R: Reprojector>(
    reprojector: &R,
    plot: &Plot,
    raster: &Raster,
) -> MeanTempResult<BoundingBox> {
    let native = BoundingBox::of_polygon(&plot.boundary).ok_or_else(|| {
        MeanTempError::Geometry(format!("plot {} has an empty boundary", plot.id))
    })?;
    if plot.crs == raster.crs {
        return Ok(native);
    }
    let corners = reprojector.reproject(&native.to_polygon(), &plot.crs, &raster.crs)?;
    BoundingBox::of_polygon(&corners).ok_or_else(|| {
        MeanTempError::Geometry(format!(
            "plot {} bounding box collapsed during reprojection",
            plot.id
        ))
    })
}
