//! Pixel to millimeter calibration from a known anatomical span.

use crate::{
    config::ScaleConfig,
    filters::RollingMedian,
    geometry::distance_xy,
    landmarks::{LandmarkFrame, LandmarkId},
};
use log::{debug, warn};

/// Where this frame's reference span came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSource {
    /// Iris centers
    Iris,
    /// Outer eye corners with the empirical correction
    EyeCorners,
    /// No usable reference; the last (or default) scale was reused
    Fallback,
}

/// Scale calibrator
///
/// Keeps a rolling median of raw mm-per-pixel samples so a single detector
/// glitch cannot move the reported scale.
pub struct ScaleCalibrator {
    config: ScaleConfig,
    buffer: RollingMedian,
    last_source: ScaleSource,
    degenerate: bool,
}

impl ScaleCalibrator {
    /// Create a scale calibrator
    ///
    /// # Panics
    ///
    /// Panics if `config.window_size` is zero
    #[must_use]
    pub fn new(config: ScaleConfig) -> Self {
        let buffer = RollingMedian::new(config.window_size);
        Self {
            config,
            buffer,
            last_source: ScaleSource::Fallback,
            degenerate: false,
        }
    }

    /// Raw reference span in pixels for a pixel-space frame
    #[must_use]
    pub fn reference_pixels(&self, pixels: &LandmarkFrame) -> Option<(f64, ScaleSource)> {
        let iris = pixels
            .get(LandmarkId::LeftIris)
            .zip(pixels.get(LandmarkId::RightIris))
            .map(|(l, r)| (distance_xy(&l, &r), ScaleSource::Iris));

        iris.or_else(|| {
            pixels
                .get(LandmarkId::LeftEyeOuter)
                .zip(pixels.get(LandmarkId::RightEyeOuter))
                .map(|(l, r)| {
                    (
                        distance_xy(&l, &r) / self.config.eye_corner_ratio,
                        ScaleSource::EyeCorners,
                    )
                })
        })
    }

    /// Feed one pixel-space frame and return the median mm-per-pixel ratio
    pub fn update(&mut self, pixels: &LandmarkFrame) -> f64 {
        match self.reference_pixels(pixels) {
            Some((span, source)) if span.is_finite() && span >= self.config.min_reference_px => {
                if self.degenerate {
                    debug!("Scale reference recovered ({span:.1} px)");
                    self.degenerate = false;
                }
                self.buffer.push(self.config.reference_mm / span);
                self.last_source = source;
            }
            Some((span, _)) => {
                // Logged once per degenerate stretch
                if !self.degenerate {
                    warn!("Degenerate scale reference ({span:.3} px), keeping last scale");
                    self.degenerate = true;
                }
                self.last_source = ScaleSource::Fallback;
            }
            None => self.last_source = ScaleSource::Fallback,
        }

        self.mm_per_pixel()
    }

    /// Current median ratio, or the configured default before any sample
    #[must_use]
    pub fn mm_per_pixel(&self) -> f64 {
        self.buffer.median().unwrap_or(self.config.default_mm_per_pixel)
    }

    /// Source used by the most recent update
    #[must_use]
    pub fn last_source(&self) -> ScaleSource {
        self.last_source
    }

    /// True while the reference span is present but unusable
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Number of buffered samples
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.buffer.len()
    }

    /// Drop all history
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_source = ScaleSource::Fallback;
        self.degenerate = false;
    }
}

impl Default for ScaleCalibrator {
    fn default() -> Self {
        Self::new(ScaleConfig::default())
    }
}
