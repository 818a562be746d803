//! Plot boundary loading

use geo_types::Polygon;
use geojson::{FeatureCollection, GeoJson};
use std::path::Path;

use crate::types::{Crs, MeanTempError, MeanTempResult, Plot};

/// Property keys accepted as the plot identifier, in priority order
const ID_KEYS: [&str; 3] = ["site", "name", "id"];

/// Reads plot boundaries from a GeoJSON feature collection.
///
/// Each feature must carry a polygon geometry and one of the `site`,
/// `name`, or `id` properties; a `treatment` property is kept as plot
/// metadata. Coordinates are taken as EPSG:4326 per the GeoJSON
/// specification; use [`Plot::new`] directly for boundaries in another
/// reference system.
pub fn read_plots_geojson<P: AsRef<Path>>(path: P) -> MeanTempResult<Vec<Plot>> {
    let path = path.as_ref();
    log::info!("Reading plot boundaries: {}", path.display());

    let text = std::fs::read_to_string(path)?;
    let collection: FeatureCollection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(MeanTempError::InvalidFormat(format!(
                "{}: expected a GeoJSON FeatureCollection",
                path.display()
            )))
        }
    };

    let mut plots = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let id = feature
            .properties
            .as_ref()
            .and_then(|props| {
                ID_KEYS
                    .iter()
                    .find_map(|key| props.get(*key))
                    .and_then(|v| v.as_str())
            })
            .map(String::from)
            .ok_or_else(|| {
                MeanTempError::InvalidFormat(format!(
                    "plot feature {} has no site/name/id property",
                    index
                ))
            })?;

        let geometry = feature.geometry.ok_or_else(|| {
            MeanTempError::InvalidFormat(format!("plot {} has no geometry", id))
        })?;
        let boundary: Polygon<f64> = geometry.value.try_into().map_err(|e| {
            MeanTempError::InvalidFormat(format!("plot {} boundary is not a polygon: {}", id, e))
        })?;

        let treatment = feature
            .properties
            .as_ref()
            .and_then(|props| props.get("treatment"))
            .and_then(|v| v.as_str())
            .map(String::from);

        plots.push(Plot {
            id,
            boundary,
            crs: Crs::Epsg(4326),
            treatment,
        });
    }

    log::debug!("loaded {} plot boundaries", plots.len());
    Ok(plots)
}
