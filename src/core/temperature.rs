//! Conversion of raw sensor digital values to temperature

use serde::{Deserialize, Serialize};

use crate::types::RasterValue;

/// Offset between the Kelvin and Celsius scales
pub const KELVIN_OFFSET: f64 = 273.15;

/// Linear digital-value-to-temperature conversion for one sensor.
///
/// The scale and offset are sensor-specific and must be supplied by the
/// caller; there is no universal conversion formula. Raw values below
/// `sensor_floor` are treated as the sensor's no-data encoding and never
/// produce a numeric temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureScale {
    /// Temperature units per raw digital unit
    pub scale: f64,
    /// Additive offset applied after scaling
    pub offset: f64,
    /// Raw values strictly below this floor are no-data
    pub sensor_floor: f64,
}

impl TemperatureScale {
    pub fn new(scale: f64, offset: f64, sensor_floor: f64) -> Self {
        TemperatureScale {
            scale,
            offset,
            sensor_floor,
        }
    }

    /// Conversion for cameras that encode surface temperature directly as
    /// Kelvin, with negative raw values marking missing pixels. Output is
    /// degrees Celsius.
    pub fn kelvin_to_celsius() -> Self {
        TemperatureScale {
            scale: 1.0,
            offset: -KELVIN_OFFSET,
            sensor_floor: 0.0,
        }
    }

    /// Temperature for one raw value, or `None` for the sensor's no-data
    /// encoding (below the floor) and non-finite inputs.
    pub fn convert(&self, raw: RasterValue) -> Option<f64> {
        let raw = raw as f64;
        if !raw.is_finite() || raw < self.sensor_floor {
            return None;
        }
        Some(self.scale * raw + self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_conversion() {
        let scale = TemperatureScale::new(0.1, 0.0, 0.0);
        assert_relative_eq!(scale.convert(300.0).unwrap(), 30.0);
        assert_relative_eq!(scale.convert(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_kelvin_to_celsius() {
        let scale = TemperatureScale::kelvin_to_celsius();
        assert_relative_eq!(scale.convert(300.65).unwrap(), 27.5, epsilon = 1e-4);
        assert_relative_eq!(scale.convert(273.15).unwrap(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_below_floor_is_no_data() {
        let scale = TemperatureScale::kelvin_to_celsius();
        assert_eq!(scale.convert(-1.0), None);
        assert_eq!(scale.convert(-0.001), None);
        assert!(scale.convert(0.0).is_some());
    }

    #[test]
    fn test_non_finite_is_no_data() {
        let scale = TemperatureScale::new(1.0, 0.0, f64::NEG_INFINITY);
        assert_eq!(scale.convert(RasterValue::NAN), None);
        assert_eq!(scale.convert(RasterValue::INFINITY), None);
    }
}
