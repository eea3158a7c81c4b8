use super::ScalarFilter;
use std::collections::VecDeque;

/// Rolling median over a fixed-capacity FIFO buffer
pub struct RollingMedian {
    window_size: usize,
    buffer: VecDeque<f64>,
}

impl RollingMedian {
    /// Create a new rolling median
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn push(&mut self, value: f64) {
        if self.buffer.len() >= self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    /// Median of the buffered samples
    #[must_use]
    pub fn median(&self) -> Option<f64> {
        median_of(self.buffer.iter().copied())
    }

    /// Number of buffered samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing has been buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Buffer capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.window_size
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Median of a sequence; the mean of the two middle values for even lengths
pub fn median_of<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().collect();
    sorted.sort_by(f64::total_cmp);

    let len = sorted.len();
    match len {
        0 => None,
        _ if len % 2 == 0 => Some((sorted[len / 2 - 1] + sorted[len / 2]) / 2.0),
        _ => Some(sorted[len / 2]),
    }
}

impl ScalarFilter for RollingMedian {
    fn apply(&mut self, value: f64, _timestamp: f64) -> f64 {
        self.push(value);
        self.median().unwrap_or(value)
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn name(&self) -> &str {
        "RollingMedian"
    }
}
