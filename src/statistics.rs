//! Window statistics shared by calibration and telemetry.

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Number of samples
    pub count: usize,
    /// Mean value of the data
    pub mean: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}

impl Statistics {
    /// Calculate statistics for a data window; `None` when empty
    #[must_use]
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
        I::IntoIter: Clone,
    {
        let data = values.into_iter();
        let count = data.clone().count();
        if count == 0 {
            return None;
        }

        let n = count as f64;
        let mean = data.clone().sum::<f64>() / n;

        let variance = data.clone().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let std_dev = variance.sqrt();

        let min = data.clone().fold(f64::INFINITY, f64::min);
        let max = data.fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        Some(Self {
            count,
            mean,
            std_dev,
            min,
            max,
            range,
        })
    }
}
