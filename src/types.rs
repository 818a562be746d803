use chrono::{DateTime, Utc};
use geo_types::Polygon;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Raw pixel value as stored in the raster band
pub type RasterValue = f32;

/// 2D pixel grid (row x column)
pub type PixelGrid = Array2<RasterValue>;

/// Coordinate reference system identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG-registered reference system
    Epsg(u32),
    /// Well-known-text definition for systems without an EPSG code
    Wkt(String),
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Wkt(wkt) => write!(f, "WKT:{}", wkt),
        }
    }
}

/// Axis-aligned bounding box in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Smallest box covering all points, or `None` for an empty sequence
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut bbox = BoundingBox {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in iter {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        Some(bbox)
    }

    /// Bounding box of a polygon's exterior ring
    pub fn of_polygon(polygon: &Polygon<f64>) -> Option<Self> {
        Self::from_points(polygon.exterior().coords().map(|c| (c.x, c.y)))
    }

    /// True when the two boxes share any area or edge
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// The box's corner ring as a closed polygon
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            geo_types::LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
            ]),
            vec![],
        )
    }
}

/// Affine geotransform mapping pixel indices to world coordinates
///
/// Follows the GDAL six-parameter convention: world_x = top_left_x +
/// col * pixel_width + row * rotation_x, and likewise for world_y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        GeoTransform {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    /// World coordinates of a (column, row) pixel position
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.top_left_x + col * self.pixel_width + row * self.rotation_x,
            self.top_left_y + col * self.rotation_y + row * self.pixel_height,
        )
    }

    /// Inverse transform, failing when the pixel grid is degenerate
    /// (zero pixel size or collinear axes).
    pub fn invert(&self) -> MeanTempResult<InverseGeoTransform> {
        let det = self.pixel_width * self.pixel_height - self.rotation_x * self.rotation_y;
        if det.abs() < 1e-12 {
            return Err(MeanTempError::Geometry(format!(
                "geotransform is not invertible (determinant {:e})",
                det
            )));
        }
        Ok(InverseGeoTransform {
            origin_x: self.top_left_x,
            origin_y: self.top_left_y,
            inv_a: self.pixel_height / det,
            inv_b: -self.rotation_x / det,
            inv_c: -self.rotation_y / det,
            inv_d: self.pixel_width / det,
        })
    }
}

/// Inverted affine geotransform mapping world coordinates to pixel indices
#[derive(Debug, Clone, Copy)]
pub struct InverseGeoTransform {
    origin_x: f64,
    origin_y: f64,
    inv_a: f64,
    inv_b: f64,
    inv_c: f64,
    inv_d: f64,
}

impl InverseGeoTransform {
    /// Fractional (column, row) pixel position of a world coordinate
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        (
            self.inv_a * dx + self.inv_b * dy,
            self.inv_c * dx + self.inv_d * dy,
        )
    }
}

/// Georeferenced raster held in memory while its plots are processed
#[derive(Debug, Clone)]
pub struct Raster {
    /// Source identifier (typically the image path)
    pub id: String,
    /// Pixel values, row-major (row x column)
    pub pixels: PixelGrid,
    pub geo_transform: GeoTransform,
    pub crs: Crs,
    /// Sentinel value marking pixels with no measurement
    pub no_data: Option<RasterValue>,
}

impl Raster {
    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    /// World-coordinate bounding box covered by the pixel grid
    pub fn world_bounds(&self) -> BoundingBox {
        let (w, h) = (self.width() as f64, self.height() as f64);
        let corners = [
            self.geo_transform.pixel_to_world(0.0, 0.0),
            self.geo_transform.pixel_to_world(w, 0.0),
            self.geo_transform.pixel_to_world(0.0, h),
            self.geo_transform.pixel_to_world(w, h),
        ];
        // A raster always has four corners
        BoundingBox::from_points(corners).unwrap()
    }
}

/// Experimental plot boundary supplied by the plot database
#[derive(Debug, Clone)]
pub struct Plot {
    pub id: String,
    pub boundary: Polygon<f64>,
    pub crs: Crs,
    pub treatment: Option<String>,
}

impl Plot {
    pub fn new(id: impl Into<String>, boundary: Polygon<f64>, crs: Crs) -> Self {
        Plot {
            id: id.into(),
            boundary,
            crs,
            treatment: None,
        }
    }
}

/// One computed measurement for an (image, plot) pair
#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    pub plot_id: String,
    pub image_id: String,
    /// Mean temperature in the converter's output unit; `None` when the
    /// plot footprint held no usable pixels
    pub mean_temperature: Option<f64>,
    pub valid_pixels: usize,
    pub timestamp: DateTime<Utc>,
}

impl ResultRow {
    pub fn is_no_data(&self) -> bool {
        self.mean_temperature.is_none()
    }
}

/// Why an (image, plot) pair could not be reduced to a result row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// The image could not be read; all of its plots fail with this kind
    RasterLoad,
    /// Reconciliation failed: bad reference system or degenerate transform
    Geometry,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::RasterLoad => write!(f, "raster-load"),
            FailureKind::Geometry => write!(f, "geometry"),
        }
    }
}

/// Failure record for an (image, plot) pair
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingFailure {
    pub plot_id: String,
    pub image_id: String,
    pub kind: FailureKind,
    pub detail: String,
}

/// Outcome of one (image, plot) pair
///
/// Exactly one variant is produced per pair: a computed row, an explicit
/// no-data row, a silent skip for non-overlapping geometry, or a failure.
#[derive(Debug, Clone)]
pub enum PlotOutcome {
    Computed(ResultRow),
    NoData(ResultRow),
    Skipped,
    Failed(ProcessingFailure),
}

/// Citation metadata attached to every published measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub author: String,
    pub title: String,
    /// Defaults to the capture year when absent
    pub year: Option<i32>,
}

/// Error types for plot temperature extraction
#[derive(Debug, thiserror::Error)]
pub enum MeanTempError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Unsupported reference system: {0}")]
    UnsupportedCrs(String),
}

/// Result type for plot temperature operations
pub type MeanTempResult<T> = Result<T, MeanTempError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_transform() -> GeoTransform {
        GeoTransform {
            top_left_x: 0.0,
            pixel_width: 1.0,
            rotation_x: 0.0,
            top_left_y: 0.0,
            rotation_y: 0.0,
            pixel_height: 1.0,
        }
    }

    #[test]
    fn test_geotransform_round_trip() {
        let gt = GeoTransform {
            top_left_x: 409000.0,
            pixel_width: 0.02,
            rotation_x: 0.0,
            top_left_y: 3660000.0,
            rotation_y: 0.0,
            pixel_height: -0.02,
        };
        let inv = gt.invert().unwrap();

        let (x, y) = gt.pixel_to_world(12.5, 80.25);
        let (col, row) = inv.world_to_pixel(x, y);
        assert!((col - 12.5).abs() < 1e-9);
        assert!((row - 80.25).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_geotransform_rejected() {
        let mut gt = unit_transform();
        gt.pixel_width = 0.0;
        gt.pixel_height = 0.0;
        assert!(matches!(gt.invert(), Err(MeanTempError::Geometry(_))));
    }

    #[test]
    fn test_bounding_box_intersection() {
        let a = BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        };
        let b = BoundingBox {
            min_x: 9.0,
            min_y: 9.0,
            max_x: 20.0,
            max_y: 20.0,
        };
        let c = BoundingBox {
            min_x: 11.0,
            min_y: 11.0,
            max_x: 20.0,
            max_y: 20.0,
        };
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_raster_world_bounds_north_up() {
        let raster = Raster {
            id: "test".into(),
            pixels: PixelGrid::zeros((10, 20)),
            geo_transform: GeoTransform {
                top_left_x: 100.0,
                pixel_width: 0.5,
                rotation_x: 0.0,
                top_left_y: 50.0,
                rotation_y: 0.0,
                pixel_height: -0.5,
            },
            crs: Crs::Epsg(32612),
            no_data: None,
        };
        let bounds = raster.world_bounds();
        assert_eq!(bounds.min_x, 100.0);
        assert_eq!(bounds.max_x, 110.0);
        assert_eq!(bounds.min_y, 45.0);
        assert_eq!(bounds.max_y, 50.0);
    }
}
