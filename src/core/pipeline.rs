//! Batch orchestration across images and plots

use chrono::{DateTime, Utc};
use ndarray::s;
use rayon::prelude::*;

use crate::core::aggregate::aggregate_plot;
use crate::core::geometry::{plot_bounds_in_raster_crs, plot_pixel_ring};
use crate::core::mask::build_plot_mask;
use crate::core::reproject::Reprojector;
use crate::core::temperature::TemperatureScale;
use crate::io::raster::RasterSource;
use crate::types::{
    FailureKind, MeanTempResult, Plot, PlotOutcome, ProcessingFailure, Raster, ResultRow,
};

/// Everything produced by one batch run.
///
/// The batch always completes: every (image, plot) pair is accounted for
/// either in `rows`, in `failures`, or as a silent skip for plots with no
/// spatial overlap.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub rows: Vec<ResultRow>,
    pub failures: Vec<ProcessingFailure>,
    /// Images requested
    pub images_total: usize,
    /// Images whose raster loaded successfully
    pub images_processed: usize,
    /// (image, plot) pairs that produced a row or a failure
    pub plots_processed: usize,
    /// Pairs that produced an explicit no-data row
    pub empty_plots: usize,
    /// Pairs skipped for lack of spatial overlap
    pub plots_skipped: usize,
}

impl BatchSummary {
    fn absorb(&mut self, outcome: PlotOutcome) {
        match outcome {
            PlotOutcome::Computed(row) => {
                self.plots_processed += 1;
                self.rows.push(row);
            }
            PlotOutcome::NoData(row) => {
                self.plots_processed += 1;
                self.empty_plots += 1;
                self.rows.push(row);
            }
            PlotOutcome::Skipped => self.plots_skipped += 1,
            PlotOutcome::Failed(failure) => {
                self.plots_processed += 1;
                log::warn!(
                    "plot {} on image {} failed ({}): {}",
                    failure.plot_id,
                    failure.image_id,
                    failure.kind,
                    failure.detail
                );
                self.failures.push(failure);
            }
        }
    }
}

/// Per-plot mean temperature extraction over a batch of images.
///
/// The raster source and the reprojector are injected so the pipeline
/// itself performs no I/O beyond reading raster pixels through the source.
pub struct MeanTempPipeline<S, R> {
    source: S,
    reprojector: R,
    scale: TemperatureScale,
}

impl<S: RasterSource, R: Reprojector> MeanTempPipeline<S, R> {
    pub fn new(source: S, reprojector: R, scale: TemperatureScale) -> Self {
        MeanTempPipeline {
            source,
            reprojector,
            scale,
        }
    }

    /// Processes every image against every plot.
    ///
    /// Images are handled sequentially so only one raster is resident at a
    /// time; plots within an image are processed in parallel against the
    /// shared read-only raster. An image that fails to load produces one
    /// raster-load failure per plot and the batch continues.
    pub fn run(
        &self,
        image_ids: &[String],
        plots: &[Plot],
        timestamp: DateTime<Utc>,
    ) -> BatchSummary {
        log::info!(
            "Starting mean temperature batch: {} images x {} plots",
            image_ids.len(),
            plots.len()
        );

        let mut summary = BatchSummary {
            images_total: image_ids.len(),
            ..BatchSummary::default()
        };

        for image_id in image_ids {
            let raster = match self.source.load(image_id) {
                Ok(raster) => raster,
                Err(err) => {
                    log::warn!("failed to load raster {}: {}", image_id, err);
                    for plot in plots {
                        summary.absorb(PlotOutcome::Failed(ProcessingFailure {
                            plot_id: plot.id.clone(),
                            image_id: image_id.clone(),
                            kind: FailureKind::RasterLoad,
                            detail: err.to_string(),
                        }));
                    }
                    continue;
                }
            };
            summary.images_processed += 1;
            log::debug!(
                "raster {} loaded: {}x{} pixels, {}",
                raster.id,
                raster.width(),
                raster.height(),
                raster.crs
            );

            let outcomes: Vec<PlotOutcome> = plots
                .par_iter()
                .map(|plot| self.plot_outcome(&raster, plot, timestamp))
                .collect();
            for outcome in outcomes {
                summary.absorb(outcome);
            }
        }

        log::info!(
            "Batch complete: {} rows ({} no-data), {} failures, {} skipped",
            summary.rows.len(),
            summary.empty_plots,
            summary.failures.len(),
            summary.plots_skipped
        );
        summary
    }

    fn plot_outcome(&self, raster: &Raster, plot: &Plot, timestamp: DateTime<Utc>) -> PlotOutcome {
        match self.process_plot(raster, plot, timestamp) {
            Ok(outcome) => outcome,
            Err(err) => PlotOutcome::Failed(ProcessingFailure {
                plot_id: plot.id.clone(),
                image_id: raster.id.clone(),
                kind: FailureKind::Geometry,
                detail: err.to_string(),
            }),
        }
    }

    fn process_plot(
        &self,
        raster: &Raster,
        plot: &Plot,
        timestamp: DateTime<Utc>,
    ) -> MeanTempResult<PlotOutcome> {
        // Cheap bounding-box test before the full reconciliation
        let plot_bounds = plot_bounds_in_raster_crs(&self.reprojector, plot, raster)?;
        if !plot_bounds.intersects(&raster.world_bounds()) {
            log::debug!("plot {} does not intersect {}", plot.id, raster.id);
            return Ok(PlotOutcome::Skipped);
        }

        let ring = plot_pixel_ring(&self.reprojector, plot, raster)?;
        let mask = match build_plot_mask(&ring, raster.width(), raster.height()) {
            Some(mask) => mask,
            None => {
                // The bounding boxes touched but no pixel center is covered
                log::debug!("plot {} covers no pixels of {}", plot.id, raster.id);
                return Ok(PlotOutcome::Skipped);
            }
        };

        let window = raster.pixels.slice(s![
            mask.row_offset..mask.row_offset + mask.height(),
            mask.col_offset..mask.col_offset + mask.width()
        ]);
        let aggregate = aggregate_plot(window, &mask, raster.no_data, &self.scale);

        let row = ResultRow {
            plot_id: plot.id.clone(),
            image_id: raster.id.clone(),
            mean_temperature: aggregate.mean,
            valid_pixels: aggregate.valid_pixels,
            timestamp,
        };
        Ok(match aggregate.mean {
            Some(mean) => {
                log::debug!(
                    "plot {} on {}: mean {:.2} over {} pixels",
                    plot.id,
                    raster.id,
                    mean,
                    row.valid_pixels
                );
                PlotOutcome::Computed(row)
            }
            None => PlotOutcome::NoData(row),
        })
    }
}
