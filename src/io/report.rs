//! Tabular result sinks
//!
//! Renders batch results as the two CSV tables the experiment-metadata
//! database ingests: a trait table keyed by site, and a geostreams table
//! carrying the plot centroid for map display. Rows whose mean is the
//! explicit no-data marker are counted by the batch summary but never
//! written; a blank measurement row is indistinguishable from a zero.

use chrono::Datelike;
use std::collections::HashMap;
use std::path::Path;

use crate::types::{Citation, MeanTempResult, Plot, ProcessingFailure, ResultRow};

/// Trait name under which measurements are published
const TRAIT_NAME: &str = "IR Surface Temperature";

/// Method string recorded with every trait row
const METHOD_NAME: &str = "Mean temperature from infrared images";

/// Access level recorded with every trait row
const ACCESS_LEVEL: &str = "2";

const TRAIT_FIELDS: [&str; 8] = [
    "local_datetime",
    "surface_temperature",
    "access_level",
    "site",
    "citation_author",
    "citation_year",
    "citation_title",
    "method",
];

const GEOSTREAMS_FIELDS: [&str; 8] = [
    "site", "trait", "lat", "lon", "dp_time", "source", "value", "timestamp",
];

/// Writes the trait table for the experiment-metadata database.
///
/// The citation year falls back to each row's capture year when the
/// citation leaves it unset.
pub fn write_trait_csv<P: AsRef<Path>>(
    path: P,
    rows: &[ResultRow],
    citation: &Citation,
) -> MeanTempResult<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(TRAIT_FIELDS)?;

    for row in rows {
        let mean = match row.mean_temperature {
            Some(mean) => mean,
            None => continue,
        };
        let year = citation
            .year
            .unwrap_or_else(|| row.timestamp.year())
            .to_string();
        writer.write_record([
            row.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            mean.to_string(),
            ACCESS_LEVEL.to_string(),
            row.plot_id.clone(),
            citation.author.clone(),
            year,
            citation.title.clone(),
            METHOD_NAME.to_string(),
        ])?;
    }
    writer.flush()?;
    log::debug!("trait table written: {}", path.as_ref().display());
    Ok(())
}

/// Writes the geostreams table, locating each measurement at the centroid
/// of its plot boundary in the plot's native reference system.
///
/// Rows for plots missing from `plots` are skipped with a warning rather
/// than failing the export.
pub fn write_geostreams_csv<P: AsRef<Path>>(
    path: P,
    rows: &[ResultRow],
    plots: &[Plot],
) -> MeanTempResult<()> {
    let by_id: HashMap<&str, &Plot> = plots.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(GEOSTREAMS_FIELDS)?;

    for row in rows {
        let mean = match row.mean_temperature {
            Some(mean) => mean,
            None => continue,
        };
        let plot = match by_id.get(row.plot_id.as_str()) {
            Some(plot) => plot,
            None => {
                log::warn!("no boundary for plot {}; row left out of geostreams", row.plot_id);
                continue;
            }
        };
        let (lon, lat) = plot_centroid(plot);
        writer.write_record([
            row.plot_id.clone(),
            TRAIT_NAME.to_string(),
            lat.to_string(),
            lon.to_string(),
            row.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            row.image_id.clone(),
            mean.to_string(),
            row.timestamp.format("%Y-%m-%d").to_string(),
        ])?;
    }
    writer.flush()?;
    log::debug!("geostreams table written: {}", path.as_ref().display());
    Ok(())
}

/// Writes one row per (image, plot) pair that could not be computed
pub fn write_failures_csv<P: AsRef<Path>>(
    path: P,
    failures: &[ProcessingFailure],
) -> MeanTempResult<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(["site", "source", "kind", "detail"])?;
    for failure in failures {
        writer.write_record([
            failure.plot_id.clone(),
            failure.image_id.clone(),
            failure.kind.to_string(),
            failure.detail.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Area-weighted centroid of the plot's exterior ring as (x, y); falls
/// back to the vertex mean for degenerate rings.
fn plot_centroid(plot: &Plot) -> (f64, f64) {
    let coords: Vec<(f64, f64)> = plot
        .boundary
        .exterior()
        .coords()
        .map(|c| (c.x, c.y))
        .collect();
    let ring = if coords.len() > 1 && coords.first() == coords.last() {
        &coords[..coords.len() - 1]
    } else {
        &coords[..]
    };
    if ring.is_empty() {
        return (0.0, 0.0);
    }

    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..ring.len() {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % ring.len()];
        let cross = x1 * y2 - x2 * y1;
        area2 += cross;
        cx += (x1 + x2) * cross;
        cy += (y1 + y2) * cross;
    }
    if area2.abs() < 1e-12 {
        let n = ring.len() as f64;
        let (sx, sy) = ring
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        return (sx / n, sy / n);
    }
    (cx / (3.0 * area2), cy / (3.0 * area2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Crs;
    use chrono::{TimeZone, Utc};
    use geo_types::{LineString, Polygon};

    fn sample_plot(id: &str) -> Plot {
        Plot::new(
            id,
            Polygon::new(
                LineString::from(vec![(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)]),
                vec![],
            ),
            Crs::Epsg(4326),
        )
    }

    fn sample_row(plot_id: &str, mean: Option<f64>) -> ResultRow {
        ResultRow {
            plot_id: plot_id.into(),
            image_id: "flir_2017-05-13.tif".into(),
            mean_temperature: mean,
            valid_pixels: if mean.is_some() { 9 } else { 0 },
            timestamp: Utc.with_ymd_and_hms(2017, 5, 13, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_centroid_of_square() {
        let (x, y) = plot_centroid(&sample_plot("p"));
        assert!((x - 4.0).abs() < 1e-12);
        assert!((y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_trait_csv_skips_no_data_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meantemp.csv");
        let rows = vec![
            sample_row("plot-a", Some(27.5)),
            sample_row("plot-b", None),
        ];
        let citation = Citation {
            author: "Schnaufer".into(),
            title: "Season 4".into(),
            year: None,
        };
        write_trait_csv(&path, &rows, &citation).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "header plus the single computed row");
        assert_eq!(lines[0], TRAIT_FIELDS.join(","));
        assert!(lines[1].contains("plot-a"));
        assert!(lines[1].contains("27.5"));
        // Citation year defaults to the capture year
        assert!(lines[1].contains("2017"));
        assert!(!text.contains("plot-b"));
    }

    #[test]
    fn test_geostreams_csv_carries_centroid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meantemp_geostreams.csv");
        let rows = vec![sample_row("plot-a", Some(27.5))];
        write_geostreams_csv(&path, &rows, &[sample_plot("plot-a")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], GEOSTREAMS_FIELDS.join(","));
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields[0], "plot-a");
        assert_eq!(fields[1], TRAIT_NAME);
        assert_eq!(fields[2], "4"); // lat = centroid y
        assert_eq!(fields[3], "4"); // lon = centroid x
        assert_eq!(fields[5], "flir_2017-05-13.tif");
    }

    #[test]
    fn test_failures_csv_round_trip() {
        use crate::types::{FailureKind, ProcessingFailure};
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.csv");
        let failures = vec![ProcessingFailure {
            plot_id: "plot-a".into(),
            image_id: "broken.tif".into(),
            kind: FailureKind::RasterLoad,
            detail: "unreadable header".into(),
        }];
        write_failures_csv(&path, &failures).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("raster-load"));
        assert!(text.contains("broken.tif"));
    }
}
