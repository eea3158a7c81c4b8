//! Adaptive low-pass filter with a velocity-dependent cutoff.
//!
//! The value stage runs at `cutoff = min_cutoff + beta * |derivative|`, where the
//! derivative is itself low-passed at `derivative_cutoff`. Slow signals get heavy
//! smoothing, fast motion gets a high cutoff and little lag.

use super::{LowPassFilter, ScalarFilter};
use crate::constants::{
    ANCHOR_BETA, ANCHOR_MIN_CUTOFF, DEFAULT_DERIVATIVE_CUTOFF, DEFAULT_FPS, FILTER_GAP_RESET_SECS,
    MOBILE_BETA, MOBILE_MIN_CUTOFF,
};
use serde::{Deserialize, Serialize};

/// Tuning of one adaptive filter instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Nominal sample rate, used when timestamps are unusable
    pub sample_rate_hz: f64,
    /// Cutoff when the signal is static (Hz)
    pub min_cutoff: f64,
    /// Cutoff increase per unit of speed
    pub beta: f64,
    /// Cutoff of the derivative estimate (Hz)
    pub derivative_cutoff: f64,
    /// Timestamp gap after which the filter re-primes (seconds)
    pub max_gap_secs: f64,
}

impl FilterParams {
    /// Very smooth tuning for landmarks that should not move relative to the skull
    #[must_use]
    pub const fn anchor() -> Self {
        Self {
            sample_rate_hz: DEFAULT_FPS,
            min_cutoff: ANCHOR_MIN_CUTOFF,
            beta: ANCHOR_BETA,
            derivative_cutoff: DEFAULT_DERIVATIVE_CUTOFF,
            max_gap_secs: FILTER_GAP_RESET_SECS,
        }
    }

    /// Fast-tracking tuning for lips, chin and mandible contour
    #[must_use]
    pub const fn mobile() -> Self {
        Self {
            sample_rate_hz: DEFAULT_FPS,
            min_cutoff: MOBILE_MIN_CUTOFF,
            beta: MOBILE_BETA,
            derivative_cutoff: DEFAULT_DERIVATIVE_CUTOFF,
            max_gap_secs: FILTER_GAP_RESET_SECS,
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::anchor()
    }
}

/// One euro filter
pub struct OneEuroFilter {
    params: FilterParams,
    value: LowPassFilter,
    derivative: LowPassFilter,
    last_time: Option<f64>,
}

impl OneEuroFilter {
    /// Create a new adaptive filter
    ///
    /// # Panics
    ///
    /// Panics if the sample rate, a cutoff or the gap reset is not positive,
    /// or if beta is negative
    #[must_use]
    pub fn new(params: FilterParams) -> Self {
        assert!(params.sample_rate_hz > 0.0, "Sample rate must be positive");
        assert!(params.min_cutoff > 0.0, "Minimum cutoff must be positive");
        assert!(params.beta >= 0.0, "Beta must be non-negative");
        assert!(params.derivative_cutoff > 0.0, "Derivative cutoff must be positive");
        assert!(params.max_gap_secs > 0.0, "Gap reset must be positive");

        Self {
            params,
            value: LowPassFilter::new(1.0),
            derivative: LowPassFilter::new(1.0),
            last_time: None,
        }
    }

    /// Filter tuning
    #[must_use]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Current smoothed derivative estimate (units per second)
    #[must_use]
    pub fn derivative(&self) -> f64 {
        self.derivative.last_value().unwrap_or(0.0)
    }

    fn prime(&mut self, value: f64, timestamp: f64) -> f64 {
        self.value.reset();
        self.derivative.reset();
        self.derivative.filter_with_alpha(0.0, 1.0);
        self.last_time = timestamp.is_finite().then_some(timestamp);
        self.value.filter_with_alpha(value, 1.0)
    }
}

impl ScalarFilter for OneEuroFilter {
    fn apply(&mut self, value: f64, timestamp: f64) -> f64 {
        let (Some(last_time), Some(previous)) = (self.last_time, self.value.last_value()) else {
            return self.prime(value, timestamp);
        };

        let nominal = 1.0 / self.params.sample_rate_hz;
        let mut dt = timestamp - last_time;
        if !dt.is_finite() || dt <= 0.0 {
            dt = nominal;
        } else if dt > self.params.max_gap_secs {
            return self.prime(value, timestamp);
        }
        self.last_time = Some(last_time + dt);

        let raw_derivative = (value - previous) / dt;
        let derivative = self
            .derivative
            .filter_with_alpha(raw_derivative, LowPassFilter::alpha_for(self.params.derivative_cutoff, dt));

        let cutoff = self.params.beta.mul_add(derivative.abs(), self.params.min_cutoff);
        self.value.filter_with_alpha(value, LowPassFilter::alpha_for(cutoff, dt))
    }

    fn reset(&mut self) {
        self.value.reset();
        self.derivative.reset();
        self.last_time = None;
    }

    fn name(&self) -> &str {
        "OneEuroFilter"
    }
}
