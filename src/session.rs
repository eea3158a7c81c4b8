//! Session orchestration: one call per landmark frame.
//!
//! The session owns every stateful stage. Frames flow through stabilization,
//! posture checks, scale, roll removal, the midline plane and the metrics
//! engine, then into calibration or repetition counting depending on the phase.

use crate::{
    calibration::{CalibrationController, CalibrationEvent, TareOffset},
    config::Config,
    jaw_metrics::{JawMetrics, JawMetricsEngine, OverlayPoints},
    landmarks::Landmark,
    pose_normalization::{PoseNormalizer, PostureGuard, PostureReport},
    rep_counter::{RepCounter, RepEvent},
    scale::ScaleCalibrator,
    stabilizer::LandmarkStabilizer,
    symmetry::SymmetryPlaneEstimator,
    telemetry::{TelemetryRecord, TelemetrySummary},
    Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Measuring, nothing recorded
    #[default]
    Idle,
    /// Looking for a stable resting window
    Calibrating,
    /// Tared; counting repetitions and recording telemetry
    Exercise,
    /// Required repetitions reached or session finalized
    Complete,
}

/// Metrics snapshot for the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMetrics {
    /// Forehead-chin alignment, degrees
    pub vertical_alignment_deg: f64,
    /// Opening amplitude, mm
    pub opening_amplitude_mm: f64,
    /// Lateral deviation, mm
    pub lateral_deviation_mm: Option<f64>,
    /// Posture guard verdict
    pub is_centered: bool,
}

/// Everything produced for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    /// Frame timestamp, seconds
    pub timestamp: f64,
    /// Phase after this frame
    pub phase: SessionPhase,
    /// False when the frame contained no tracked landmark
    pub tracking: bool,
    /// Snapshot for display, `None` without lip landmarks
    pub diagnostics: Option<DiagnosticMetrics>,
    /// Tared, deadbanded metrics
    pub metrics: Option<JawMetrics>,
    /// Held peak opening, mm
    pub peak_opening_mm: f64,
    /// Overlay points in image pixels
    pub overlay: Option<OverlayPoints>,
    /// Posture check
    pub posture: Option<PostureReport>,
    /// Scale used this frame
    pub mm_per_pixel: f64,
    /// Repetitions so far
    pub rep_count: u32,
    /// Repetition transition, if any
    pub rep_event: RepEvent,
    /// Calibration progress while calibrating
    pub calibration: Option<CalibrationEvent>,
}

/// Measurement session
pub struct Session {
    config: Config,
    stabilizer: LandmarkStabilizer,
    normalizer: PoseNormalizer,
    posture_guard: PostureGuard,
    scale: ScaleCalibrator,
    symmetry: SymmetryPlaneEstimator,
    engine: JawMetricsEngine,
    calibration: CalibrationController,
    reps: RepCounter,
    phase: SessionPhase,
    tare: TareOffset,
    telemetry: Vec<TelemetryRecord>,
    current: Option<DiagnosticMetrics>,
    tracking: bool,
}

impl Session {
    /// Create a session from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        info!(
            "Session created for {}x{} input",
            config.viewport.width, config.viewport.height
        );
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        Self {
            stabilizer: LandmarkStabilizer::new(config.stabilizer.anchor, config.stabilizer.mobile),
            normalizer: PoseNormalizer::new(),
            posture_guard: PostureGuard::new(config.posture.clone()),
            scale: ScaleCalibrator::new(config.scale.clone()),
            symmetry: SymmetryPlaneEstimator::new(),
            engine: JawMetricsEngine::new(config.metrics.clone()),
            calibration: CalibrationController::new(config.calibration.clone()),
            reps: RepCounter::new(config.reps.clone()),
            phase: SessionPhase::Idle,
            tare: TareOffset::ZERO,
            telemetry: Vec::new(),
            current: None,
            tracking: false,
            config,
        }
    }

    /// Process one detector frame
    pub fn process_frame(&mut self, landmarks: &[Landmark], timestamp: f64) -> FrameOutput {
        let smoothed = self.stabilizer.process(landmarks, timestamp);

        if smoothed.is_empty() {
            return self.lose_tracking(timestamp);
        }
        if !self.tracking {
            debug!("Tracking acquired at {timestamp:.3}s");
            self.tracking = true;
        }

        let viewport = self.config.viewport;
        let pixels = viewport.frame_to_pixels(&smoothed);
        let posture = self.posture_guard.check(&pixels, viewport);
        let mm_per_pixel = self.scale.update(&pixels);

        let normalized = self.normalizer.normalize(&smoothed, viewport);
        let plane = self.symmetry.estimate(&normalized.frame);

        let tare = match self.phase {
            SessionPhase::Exercise | SessionPhase::Complete => self.tare,
            SessionPhase::Idle | SessionPhase::Calibrating => TareOffset::ZERO,
        };
        let analysis = self
            .engine
            .process(&normalized, plane.as_ref(), mm_per_pixel, &tare, timestamp);

        let mut calibration = None;
        let mut rep_event = RepEvent::None;

        match (self.phase, analysis.as_ref()) {
            (SessionPhase::Calibrating, Some(analysis)) => {
                let event = self.calibration.update(&analysis.raw, posture.is_centered());
                if let CalibrationEvent::Accepted(tare) = event {
                    self.tare = tare;
                    self.phase = SessionPhase::Exercise;
                    info!("Exercise started at {timestamp:.2}s");
                }
                calibration = Some(event);
            }
            (SessionPhase::Calibrating, None) => {
                calibration = Some(self.calibration.interrupt(posture.is_centered()));
            }
            (SessionPhase::Exercise, Some(analysis)) => {
                self.telemetry.push(TelemetryRecord {
                    timestamp,
                    metrics: analysis.metrics,
                    vertical_alignment_deg: posture.vertical_alignment_deg,
                });
                rep_event = self.reps.update(analysis.metrics.opening_mm, timestamp);
                if self.reps.is_complete() {
                    self.phase = SessionPhase::Complete;
                    info!("Exercise complete: {} repetitions", self.reps.rep_count());
                }
            }
            _ => {}
        }

        let diagnostics = analysis.as_ref().map(|a| DiagnosticMetrics {
            vertical_alignment_deg: posture.vertical_alignment_deg,
            opening_amplitude_mm: a.metrics.opening_mm,
            lateral_deviation_mm: a.metrics.deviation_mm,
            is_centered: posture.is_centered(),
        });
        self.current = diagnostics;

        FrameOutput {
            timestamp,
            phase: self.phase,
            tracking: true,
            diagnostics,
            metrics: analysis.as_ref().map(|a| a.metrics),
            peak_opening_mm: self.engine.peak_opening(),
            overlay: analysis.as_ref().map(|a| a.overlay),
            posture: Some(posture),
            mm_per_pixel,
            rep_count: self.reps.rep_count(),
            rep_event,
            calibration,
        }
    }

    fn lose_tracking(&mut self, timestamp: f64) -> FrameOutput {
        if self.tracking {
            warn!("Tracking lost at {timestamp:.3}s, filters reset");
            self.tracking = false;
        }
        self.stabilizer.reset();
        self.current = None;

        let calibration = (self.phase == SessionPhase::Calibrating)
            .then(|| self.calibration.interrupt(false));

        FrameOutput {
            timestamp,
            phase: self.phase,
            tracking: false,
            diagnostics: None,
            metrics: None,
            peak_opening_mm: self.engine.peak_opening(),
            overlay: None,
            posture: None,
            mm_per_pixel: self.scale.mm_per_pixel(),
            rep_count: self.reps.rep_count(),
            rep_event: RepEvent::None,
            calibration,
        }
    }

    /// Begin (or restart) calibration
    ///
    /// Clears the previous tare together with the repetition count, the open
    /// latch and the held peak. Telemetry already recorded is kept.
    pub fn start_calibration(&mut self) {
        self.calibration.reset();
        self.reps.reset();
        self.engine.reset();
        self.tare = TareOffset::ZERO;
        self.phase = SessionPhase::Calibrating;
        info!("Calibration started");
    }

    /// End calibration now and move to the exercise phase
    ///
    /// Returns the accepted offset, or the mean of whatever was buffered, or
    /// zero when nothing was collected.
    pub fn complete_calibration(&mut self) -> TareOffset {
        let tare = self
            .calibration
            .tare()
            .or_else(|| self.calibration.buffer_mean())
            .unwrap_or(TareOffset::ZERO);

        if !self.calibration.is_accepted() {
            info!(
                "Calibration completed manually: lateral {:.2} mm, opening {:.2} mm",
                tare.lateral, tare.opening
            );
        }

        self.tare = tare;
        if matches!(self.phase, SessionPhase::Idle | SessionPhase::Calibrating) {
            self.phase = SessionPhase::Exercise;
        }
        tare
    }

    /// Discard all state and start over with the same configuration
    pub fn reset_session(&mut self) {
        info!("Session reset");
        *self = Self::build(self.config.clone());
    }

    /// Repetitions counted so far
    #[must_use]
    pub fn rep_count(&self) -> u32 {
        self.reps.rep_count()
    }

    /// End the session and hand over the telemetry log
    pub fn finalize_session(&mut self) -> Vec<TelemetryRecord> {
        self.phase = SessionPhase::Complete;
        let records = std::mem::take(&mut self.telemetry);
        info!("Session finalized with {} telemetry records", records.len());
        records
    }

    /// Latest diagnostic snapshot
    #[must_use]
    pub fn current_metrics(&self) -> Option<DiagnosticMetrics> {
        self.current
    }

    /// Summary of the telemetry recorded so far
    #[must_use]
    pub fn summary(&self) -> Option<TelemetrySummary> {
        TelemetrySummary::from_records(&self.telemetry)
    }

    /// Telemetry recorded so far
    #[must_use]
    pub fn telemetry(&self) -> &[TelemetryRecord] {
        &self.telemetry
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Offset applied during the exercise
    #[must_use]
    pub fn tare(&self) -> TareOffset {
        self.tare
    }

    /// Configuration the session was built with
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}
