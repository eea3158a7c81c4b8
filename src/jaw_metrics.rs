//! Opening amplitude and lateral deviation.
//!
//! Works on a pose-corrected pixel frame, so the face vertical axis is the
//! image `+y` axis and both image axes have the same physical unit.

use crate::{
    calibration::TareOffset,
    config::MetricsConfig,
    geometry::{distance, normalize, Plane3D, Point3D, Vector3D},
    landmarks::LandmarkId,
    pose_normalization::NormalizedFrame,
    symmetry::SymmetryPlaneEstimator,
};
use serde::{Deserialize, Serialize};

/// How opening amplitude is measured between the inner lips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningMode {
    /// Separation along the face vertical axis only
    #[default]
    Axial,
    /// Full 3D distance, including lateral and depth components
    Euclidean,
}

/// Metrics of one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JawMetrics {
    /// Opening amplitude, never negative
    pub opening_mm: f64,
    /// Signed distance of the lower lip from the midline plane (positive
    /// towards image right); `None` when no plane was available
    pub deviation_mm: Option<f64>,
    /// Hysteresis-latched open state
    pub is_open: bool,
}

/// Image-space points for overlay drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPoints {
    /// Upper inner lip
    pub upper_lip: Point3D,
    /// Lower inner lip
    pub lower_lip: Point3D,
    /// Upper lip displaced along the face vertical axis by the opening
    pub axial_point: Point3D,
    /// Midline segment from the mid-eye point downwards
    pub plane_endpoints: Option<(Point3D, Point3D)>,
    /// Mandible contour from left jaw angle to right jaw angle
    pub mandible: [Option<Point3D>; 13],
}

/// Full output of the engine for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JawAnalysis {
    /// Tared opening/deviation before the deadband
    pub raw: JawMetrics,
    /// Tared and deadbanded metrics
    pub metrics: JawMetrics,
    /// Held peak of `metrics.opening_mm`
    pub peak_opening_mm: f64,
    /// Overlay points
    pub overlay: OverlayPoints,
}

/// Peak-hold display layer
#[derive(Debug, Clone)]
pub struct PeakHold {
    hold_secs: f64,
    decay: f64,
    peak: f64,
    peak_time: Option<f64>,
}

impl PeakHold {
    /// Create a peak hold
    ///
    /// # Panics
    ///
    /// Panics if `decay` is not in (0, 1] or `hold_secs` is negative
    #[must_use]
    pub fn new(hold_secs: f64, decay: f64) -> Self {
        assert!(decay > 0.0 && decay <= 1.0, "Decay must be in (0, 1]");
        assert!(hold_secs >= 0.0, "Hold window must be non-negative");
        Self {
            hold_secs,
            decay,
            peak: 0.0,
            peak_time: None,
        }
    }

    /// Feed a value and return the displayed peak
    pub fn update(&mut self, value: f64, timestamp: f64) -> f64 {
        match self.peak_time {
            Some(peak_time) if value < self.peak => {
                if timestamp - peak_time > self.hold_secs {
                    self.peak = (self.peak * self.decay).max(value);
                }
            }
            _ => {
                self.peak = value;
                self.peak_time = Some(timestamp);
            }
        }
        self.peak
    }

    /// Currently displayed peak
    #[must_use]
    pub fn value(&self) -> f64 {
        self.peak
    }

    /// Forget the held peak
    pub fn reset(&mut self) {
        self.peak = 0.0;
        self.peak_time = None;
    }
}

/// Jaw metrics engine
pub struct JawMetricsEngine {
    config: MetricsConfig,
    is_open: bool,
    peak: PeakHold,
}

impl JawMetricsEngine {
    /// Create an engine
    ///
    /// # Panics
    ///
    /// Panics if the peak-hold parameters are invalid
    #[must_use]
    pub fn new(config: MetricsConfig) -> Self {
        let peak = PeakHold::new(config.peak_hold_secs, config.peak_decay);
        Self {
            config,
            is_open: false,
            peak,
        }
    }

    /// Untared opening (mm) and deviation (mm) of a pose-corrected frame
    ///
    /// Returns `None` when either inner lip landmark is missing.
    #[must_use]
    pub fn measure(
        &self,
        normalized: &NormalizedFrame,
        plane: Option<&Plane3D>,
        mm_per_pixel: f64,
    ) -> Option<(f64, Option<f64>)> {
        let upper = normalized.frame.get(LandmarkId::UpperLipInner)?;
        let lower = normalized.frame.get(LandmarkId::LowerLipInner)?;

        let opening_px = match self.config.opening_mode {
            OpeningMode::Axial => lower.y - upper.y,
            OpeningMode::Euclidean => distance(&upper, &lower),
        };
        let opening = (opening_px * mm_per_pixel).max(0.0);
        let deviation = plane.map(|p| p.signed_distance(&lower) * mm_per_pixel);

        Some((opening, deviation))
    }

    /// Measure, tare, deadband, latch and peak-hold one frame
    pub fn process(
        &mut self,
        normalized: &NormalizedFrame,
        plane: Option<&Plane3D>,
        mm_per_pixel: f64,
        tare: &TareOffset,
        timestamp: f64,
    ) -> Option<JawAnalysis> {
        let (opening, deviation) = self.measure(normalized, plane, mm_per_pixel)?;
        let (opening, deviation) = tare.apply(opening, deviation);

        if !self.is_open && opening > self.config.is_open_threshold_mm {
            self.is_open = true;
        } else if self.is_open && opening < self.config.deadband_mm {
            self.is_open = false;
        }

        let raw = JawMetrics {
            opening_mm: opening,
            deviation_mm: deviation,
            is_open: self.is_open,
        };

        let metrics = if opening < self.config.deadband_mm {
            JawMetrics {
                opening_mm: 0.0,
                deviation_mm: deviation.map(|_| 0.0),
                is_open: self.is_open,
            }
        } else {
            raw
        };

        let peak_opening_mm = self.peak.update(metrics.opening_mm, timestamp);
        let overlay = Self::overlay(normalized, plane, opening / mm_per_pixel.max(f64::EPSILON))?;

        Some(JawAnalysis {
            raw,
            metrics,
            peak_opening_mm,
            overlay,
        })
    }

    fn overlay(normalized: &NormalizedFrame, plane: Option<&Plane3D>, opening_px: f64) -> Option<OverlayPoints> {
        let frame = &normalized.frame;
        let upper = frame.get(LandmarkId::UpperLipInner)?;
        let lower = frame.get(LandmarkId::LowerLipInner)?;
        let axial = upper + Vector3D::y() * opening_px;

        let plane_endpoints = plane.and_then(|plane| {
            let vertical = SymmetryPlaneEstimator::vertical_axis(frame)?;
            let direction = normalize(&vertical)?;
            let end = plane.point + direction * (2.0 * vertical.norm());
            Some((normalized.to_image(&plane.point), normalized.to_image(&end)))
        });

        let mandible = LandmarkId::MANDIBLE_PATH.map(|id| frame.get(id).map(|p| normalized.to_image(&p)));

        Some(OverlayPoints {
            upper_lip: normalized.to_image(&upper),
            lower_lip: normalized.to_image(&lower),
            axial_point: normalized.to_image(&axial),
            plane_endpoints,
            mandible,
        })
    }

    /// Current latched open state
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Currently held peak opening
    #[must_use]
    pub fn peak_opening(&self) -> f64 {
        self.peak.value()
    }

    /// Clear hysteresis and peak state
    pub fn reset(&mut self) {
        self.is_open = false;
        self.peak.reset();
    }
}

impl Default for JawMetricsEngine {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}
