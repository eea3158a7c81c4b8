//! Auto-calibration ("tare") state machine.
//!
//! Collects centered resting samples until there are more than
//! `required_samples`, then accepts the window as the subject's zero if the
//! lateral deviation is stable enough. A rejected window keeps its most recent
//! half and keeps collecting; losing the centered signal drops everything.

use crate::{config::CalibrationConfig, jaw_metrics::JawMetrics, statistics::Statistics};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Resting bias subtracted from every later reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TareOffset {
    /// Resting lateral deviation, mm
    pub lateral: f64,
    /// Resting opening, mm
    pub opening: f64,
}

impl TareOffset {
    /// No offset
    pub const ZERO: Self = Self {
        lateral: 0.0,
        opening: 0.0,
    };

    /// Subtract the offset from an opening/deviation pair; opening stays >= 0
    #[must_use]
    pub fn apply(&self, opening_mm: f64, deviation_mm: Option<f64>) -> (f64, Option<f64>) {
        (
            (opening_mm - self.opening).max(0.0),
            deviation_mm.map(|d| d - self.lateral),
        )
    }
}

/// Outcome of feeding one frame to the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationEvent {
    /// Still gathering samples
    Collecting {
        /// Samples currently buffered
        samples: usize,
    },
    /// Window too unstable; the most recent half was kept
    Rejected {
        /// Lateral deviation spread of the rejected window, mm
        std_dev: f64,
        /// Samples carried into the next window
        retained: usize,
    },
    /// Window accepted
    Accepted(TareOffset),
    /// Subject left the centered pose; buffer cleared
    Reset,
}

/// Calibration controller
#[derive(Debug, Clone)]
pub struct CalibrationController {
    config: CalibrationConfig,
    buffer: VecDeque<JawMetrics>,
    tare: Option<TareOffset>,
    rejections: u32,
}

impl CalibrationController {
    /// Create a controller
    ///
    /// # Panics
    ///
    /// Panics if fewer than 2 samples are required
    #[must_use]
    pub fn new(config: CalibrationConfig) -> Self {
        assert!(config.required_samples >= 2, "Calibration needs at least 2 samples");
        Self {
            buffer: VecDeque::with_capacity(config.required_samples + 1),
            config,
            tare: None,
            rejections: 0,
        }
    }

    /// Feed one frame's untared metrics and the centered signal
    pub fn update(&mut self, metrics: &JawMetrics, centered: bool) -> CalibrationEvent {
        if let Some(tare) = self.tare {
            return CalibrationEvent::Accepted(tare);
        }

        if !centered {
            return self.interrupt(false);
        }

        // Frames without a midline plane cannot say anything about lateral bias
        if metrics.deviation_mm.is_none() {
            return CalibrationEvent::Collecting {
                samples: self.buffer.len(),
            };
        }

        self.buffer.push_back(*metrics);
        if self.buffer.len() <= self.config.required_samples {
            return CalibrationEvent::Collecting {
                samples: self.buffer.len(),
            };
        }

        let Some(lateral) = Statistics::from_values(self.deviations()) else {
            return CalibrationEvent::Collecting { samples: 0 };
        };

        if lateral.std_dev < self.config.max_std_dev_mm {
            let opening = self.buffer.iter().map(|m| m.opening_mm).sum::<f64>() / self.buffer.len() as f64;
            let tare = TareOffset {
                lateral: lateral.mean,
                opening,
            };
            info!(
                "Calibration accepted: lateral {:.2} mm, opening {:.2} mm (std dev {:.3} mm)",
                tare.lateral, tare.opening, lateral.std_dev
            );
            self.buffer.clear();
            self.tare = Some(tare);
            CalibrationEvent::Accepted(tare)
        } else {
            let retained = self.buffer.len() / 2;
            let dropped = self.buffer.len() - retained;
            self.buffer.drain(..dropped);
            self.rejections += 1;
            debug!(
                "Calibration rejected: std dev {:.3} mm, retrying with {} samples",
                lateral.std_dev, retained
            );
            CalibrationEvent::Rejected {
                std_dev: lateral.std_dev,
                retained,
            }
        }
    }

    /// Feed a frame that produced no metrics, only the centered signal
    ///
    /// Nothing is buffered; an off-center frame still clears the window.
    pub fn interrupt(&mut self, centered: bool) -> CalibrationEvent {
        if let Some(tare) = self.tare {
            return CalibrationEvent::Accepted(tare);
        }
        if centered || self.buffer.is_empty() {
            return CalibrationEvent::Collecting {
                samples: self.buffer.len(),
            };
        }

        debug!("Subject left center, discarding {} calibration samples", self.buffer.len());
        self.buffer.clear();
        CalibrationEvent::Reset
    }

    fn deviations(&self) -> impl Iterator<Item = f64> + Clone + '_ {
        self.buffer.iter().filter_map(|m| m.deviation_mm)
    }

    /// Mean of the buffered samples, if any
    #[must_use]
    pub fn buffer_mean(&self) -> Option<TareOffset> {
        let lateral = Statistics::from_values(self.deviations())?;
        let opening = Statistics::from_values(self.buffer.iter().map(|m| m.opening_mm))?;
        Some(TareOffset {
            lateral: lateral.mean,
            opening: opening.mean,
        })
    }

    /// Accepted offset, once calibration succeeded
    #[must_use]
    pub fn tare(&self) -> Option<TareOffset> {
        self.tare
    }

    /// True after a window was accepted
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.tare.is_some()
    }

    /// Samples currently buffered
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Windows rejected so far
    #[must_use]
    pub fn rejections(&self) -> u32 {
        self.rejections
    }

    /// Start over
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.tare = None;
        self.rejections = 0;
    }
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(deviation: f64, opening: f64) -> JawMetrics {
        JawMetrics {
            opening_mm: opening,
            deviation_mm: Some(deviation),
            is_open: false,
        }
    }

    #[test]
    fn test_tare_apply() {
        let tare = TareOffset {
            lateral: 1.5,
            opening: 2.0,
        };
        assert_eq!(tare.apply(10.0, Some(3.0)), (8.0, Some(1.5)));
        assert_eq!(tare.apply(1.0, None), (0.0, None));
    }

    #[test]
    fn test_accepts_stable_window() {
        let mut controller = CalibrationController::default();
        for _ in 0..30 {
            assert!(matches!(
                controller.update(&sample(1.2, 0.8), true),
                CalibrationEvent::Collecting { .. }
            ));
        }
        match controller.update(&sample(1.2, 0.8), true) {
            CalibrationEvent::Accepted(tare) => {
                assert!((tare.lateral - 1.2).abs() < 1e-9);
                assert!((tare.opening - 0.8).abs() < 1e-9);
            }
            other => panic!("Expected acceptance, got {other:?}"),
        }
        assert_eq!(controller.buffered(), 0);
        assert!(controller.is_accepted());
    }

    #[test]
    fn test_not_centered_clears() {
        let mut controller = CalibrationController::default();
        for _ in 0..20 {
            controller.update(&sample(0.0, 0.0), true);
        }
        assert_eq!(controller.update(&sample(0.0, 0.0), false), CalibrationEvent::Reset);
        assert_eq!(controller.buffered(), 0);
        assert_eq!(
            controller.update(&sample(0.0, 0.0), false),
            CalibrationEvent::Collecting { samples: 0 }
        );
    }

    #[test]
    fn test_interrupt_without_metrics() {
        let mut controller = CalibrationController::default();
        for _ in 0..10 {
            controller.update(&sample(0.0, 0.0), true);
        }
        assert_eq!(controller.interrupt(true), CalibrationEvent::Collecting { samples: 10 });
        assert_eq!(controller.buffered(), 10);

        assert_eq!(controller.interrupt(false), CalibrationEvent::Reset);
        assert_eq!(controller.buffered(), 0);
        assert_eq!(controller.interrupt(false), CalibrationEvent::Collecting { samples: 0 });
    }

    #[test]
    fn test_missing_deviation_is_skipped() {
        let mut controller = CalibrationController::default();
        let blind = JawMetrics {
            deviation_mm: None,
            ..JawMetrics::default()
        };
        controller.update(&blind, true);
        assert_eq!(controller.buffered(), 0);
        assert_eq!(controller.buffer_mean(), None);
    }

    #[test]
    #[should_panic(expected = "Calibration needs at least 2 samples")]
    fn test_rejects_tiny_window() {
        let _ = CalibrationController::new(CalibrationConfig {
            required_samples: 1,
            max_std_dev_mm: 0.5,
        });
    }
}
