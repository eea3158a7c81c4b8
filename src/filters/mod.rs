//! Signal filtering algorithms for smoothing landmark coordinates and scale.
//!
//! This module provides the adaptive filter applied per landmark axis, the
//! first-order low-pass stage it is built from, and the rolling median used
//! for outlier-resistant scale estimation.

/// First-order low-pass filter with adjustable smoothing factor
pub mod low_pass;

/// Adaptive ("one euro") low-pass filter with velocity-dependent cutoff
pub mod one_euro;

/// Rolling median over a bounded ring buffer
pub mod median;

pub use low_pass::LowPassFilter;
pub use median::RollingMedian;
pub use one_euro::{FilterParams, OneEuroFilter};

/// Trait for all scalar filters
pub trait ScalarFilter: Send + Sync {
    /// Feed a sample taken at `timestamp` (seconds) and return the filtered value
    fn apply(&mut self, value: f64, timestamp: f64) -> f64;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}
