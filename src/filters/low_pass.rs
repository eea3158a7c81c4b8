use super::ScalarFilter;

/// First-order low-pass filter
///
/// `y[n] = y[n-1] + alpha * (x[n] - y[n-1])`. The first sample passes through.
pub struct LowPassFilter {
    alpha: f64,
    last: Option<f64>,
}

impl LowPassFilter {
    /// Create a new first-order low-pass filter
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1]
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }

    /// Smoothing factor for a given cutoff frequency and sample period
    #[must_use]
    pub fn alpha_for(cutoff_hz: f64, period_secs: f64) -> f64 {
        let tau = 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz);
        1.0 / (1.0 + tau / period_secs)
    }

    /// Filter one sample with an explicit smoothing factor
    pub fn filter_with_alpha(&mut self, value: f64, alpha: f64) -> f64 {
        let filtered = match self.last {
            Some(last) => alpha.mul_add(value - last, last),
            None => value,
        };
        self.last = Some(filtered);
        filtered
    }

    /// Last filtered value
    #[must_use]
    pub fn last_value(&self) -> Option<f64> {
        self.last
    }
}

impl ScalarFilter for LowPassFilter {
    fn apply(&mut self, value: f64, _timestamp: f64) -> f64 {
        self.filter_with_alpha(value, self.alpha)
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "LowPassFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order_low_pass() {
        let mut filter = LowPassFilter::new(0.5);

        // First value passes through
        assert_eq!(filter.apply(10.0, 0.0), 10.0);

        // Second value is filtered
        assert_eq!(filter.apply(20.0, 0.0), 15.0); // 10 + 0.5 * (20 - 10)
        assert_eq!(filter.last_value(), Some(15.0));
    }

    #[test]
    fn test_alpha_for_cutoff() {
        // Higher cutoff means less smoothing
        let slow = LowPassFilter::alpha_for(1.0, 1.0 / 30.0);
        let fast = LowPassFilter::alpha_for(20.0, 1.0 / 30.0);
        assert!(slow > 0.0 && slow < fast && fast < 1.0);
        assert!((slow - 0.1731).abs() < 1e-3);
    }

    #[test]
    fn test_reset() {
        let mut filter = LowPassFilter::new(0.2);
        filter.apply(5.0, 0.0);
        filter.reset();
        assert_eq!(filter.apply(9.0, 0.0), 9.0);
    }
}
