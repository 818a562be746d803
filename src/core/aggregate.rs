//! Reduction of a masked raster window to a plot-level statistic

use ndarray::ArrayView2;

use crate::core::mask::PlotMask;
use crate::core::temperature::TemperatureScale;
use crate::types::RasterValue;

/// Mean temperature over a plot's valid pixels.
///
/// `mean` is `None` when no usable pixel fell inside the plot; a mean is
/// never synthesized from an empty sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotAggregate {
    pub mean: Option<f64>,
    pub valid_pixels: usize,
}

/// Averages the converted values of all masked, valid pixels.
///
/// `window` must be the raster crop the mask was built for (same shape).
/// Pixels equal to the raster's no-data sentinel, non-finite pixels, and
/// raw values the converter maps to no-data are all excluded from the
/// sample.
pub fn aggregate_plot(
    window: ArrayView2<RasterValue>,
    mask: &PlotMask,
    no_data: Option<RasterValue>,
    scale: &TemperatureScale,
) -> PlotAggregate {
    debug_assert_eq!(window.dim(), mask.mask.dim());

    let mut sum = 0.0;
    let mut count = 0usize;
    for ((row, col), &covered) in mask.mask.indexed_iter() {
        if !covered {
            continue;
        }
        let raw = window[[row, col]];
        if !raw.is_finite() {
            continue;
        }
        if let Some(sentinel) = no_data {
            if raw == sentinel {
                continue;
            }
        }
        if let Some(temperature) = scale.convert(raw) {
            sum += temperature;
            count += 1;
        }
    }

    PlotAggregate {
        mean: (count > 0).then(|| sum / count as f64),
        valid_pixels: count,
    }
}
