//! Configuration management for the jaw measurement pipeline

use crate::{
    constants::{
        DEFAULT_CALIBRATION_MAX_STD_DEV_MM, DEFAULT_CALIBRATION_SAMPLES, DEFAULT_DEADBAND_MM, DEFAULT_IMAGE_HEIGHT,
        DEFAULT_IMAGE_WIDTH, DEFAULT_IS_OPEN_THRESHOLD_MM, DEFAULT_MAX_FACE_COVERAGE, DEFAULT_MAX_TILT_DEG,
        DEFAULT_MAX_YAW_RATIO, DEFAULT_MIN_FACE_COVERAGE, DEFAULT_MM_PER_PIXEL, DEFAULT_PEAK_DECAY,
        DEFAULT_PEAK_HOLD_SECS, DEFAULT_REPS_REQUIRED, DEFAULT_REP_CLOSE_RATIO, DEFAULT_REP_MIN_DWELL_MS,
        DEFAULT_REP_OPEN_THRESHOLD_MM, DEFAULT_SCALE_WINDOW, EYE_CORNER_TO_IRIS_RATIO, MIN_REFERENCE_PIXELS,
        REFERENCE_IPD_MM,
    },
    filters::FilterParams,
    jaw_metrics::OpeningMode,
    pose_normalization::Viewport,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image size of the landmark source
    pub viewport: Viewport,

    /// Landmark smoothing
    pub stabilizer: StabilizerConfig,

    /// Pixel to millimeter calibration
    pub scale: ScaleConfig,

    /// Centered-subject checks
    pub posture: PostureConfig,

    /// Jaw metric thresholds
    pub metrics: MetricsConfig,

    /// Auto-calibration (tare)
    pub calibration: CalibrationConfig,

    /// Repetition counting
    pub reps: RepConfig,
}

/// Adaptive filter tuning per landmark class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Eyes, nose, forehead, cheeks
    pub anchor: FilterParams,

    /// Lips, chin and mandible contour
    pub mobile: FilterParams,
}

/// Scale calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Anatomical reference distance (inter-pupillary), millimeters
    pub reference_mm: f64,

    /// Outer eye-corner span divided by this approximates the iris span
    pub eye_corner_ratio: f64,

    /// Number of samples in the median window
    pub window_size: usize,

    /// Reference spans shorter than this many pixels are ignored
    pub min_reference_px: f64,

    /// Scale used until the first valid reference arrives
    pub default_mm_per_pixel: f64,
}

/// Posture guard thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Maximum head roll, degrees
    pub max_tilt_deg: f64,

    /// Maximum cheek-to-nose asymmetry ratio
    pub max_yaw_ratio: f64,

    /// Minimum face width as a fraction of image width
    pub min_face_coverage: f64,

    /// Maximum face width as a fraction of image width
    pub max_face_coverage: f64,
}

/// Jaw metric parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Openings below this are reported as zero (also the `is_open` close threshold)
    pub deadband_mm: f64,

    /// Raw opening above this sets `is_open`
    pub is_open_threshold_mm: f64,

    /// Opening formula
    pub opening_mode: OpeningMode,

    /// Peak-hold display window, seconds
    pub peak_hold_secs: f64,

    /// Per-frame decay of the held peak once the window expires
    pub peak_decay: f64,
}

/// Calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Samples required before a stability decision
    pub required_samples: usize,

    /// Maximum population standard deviation of lateral deviation, mm
    pub max_std_dev_mm: f64,
}

/// Repetition counter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepConfig {
    /// Tared opening above this opens a repetition, mm
    pub open_threshold_mm: f64,

    /// Close threshold as a fraction of the open threshold
    pub close_ratio: f64,

    /// Minimum time between counted repetitions, milliseconds
    pub min_dwell_ms: u64,

    /// Repetitions that complete the exercise
    pub reps_required: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_HEIGHT),
            stabilizer: StabilizerConfig::default(),
            scale: ScaleConfig::default(),
            posture: PostureConfig::default(),
            metrics: MetricsConfig::default(),
            calibration: CalibrationConfig::default(),
            reps: RepConfig::default(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_HEIGHT)
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            anchor: FilterParams::anchor(),
            mobile: FilterParams::mobile(),
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            reference_mm: REFERENCE_IPD_MM,
            eye_corner_ratio: EYE_CORNER_TO_IRIS_RATIO,
            window_size: DEFAULT_SCALE_WINDOW,
            min_reference_px: MIN_REFERENCE_PIXELS,
            default_mm_per_pixel: DEFAULT_MM_PER_PIXEL,
        }
    }
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            max_tilt_deg: DEFAULT_MAX_TILT_DEG,
            max_yaw_ratio: DEFAULT_MAX_YAW_RATIO,
            min_face_coverage: DEFAULT_MIN_FACE_COVERAGE,
            max_face_coverage: DEFAULT_MAX_FACE_COVERAGE,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            deadband_mm: DEFAULT_DEADBAND_MM,
            is_open_threshold_mm: DEFAULT_IS_OPEN_THRESHOLD_MM,
            opening_mode: OpeningMode::Axial,
            peak_hold_secs: DEFAULT_PEAK_HOLD_SECS,
            peak_decay: DEFAULT_PEAK_DECAY,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            required_samples: DEFAULT_CALIBRATION_SAMPLES,
            max_std_dev_mm: DEFAULT_CALIBRATION_MAX_STD_DEV_MM,
        }
    }
}

impl Default for RepConfig {
    fn default() -> Self {
        Self {
            open_threshold_mm: DEFAULT_REP_OPEN_THRESHOLD_MM,
            close_ratio: DEFAULT_REP_CLOSE_RATIO,
            min_dwell_ms: DEFAULT_REP_MIN_DWELL_MS,
            reps_required: DEFAULT_REPS_REQUIRED,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` naming the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(config_error("Viewport width and height must be greater than 0"));
        }

        validate_filter("anchor", &self.stabilizer.anchor)?;
        validate_filter("mobile", &self.stabilizer.mobile)?;

        let scale = &self.scale;
        if !positive(scale.reference_mm) || !positive(scale.eye_corner_ratio) {
            return Err(config_error("Scale reference and eye corner ratio must be positive"));
        }
        if scale.window_size == 0 {
            return Err(config_error("Scale window size must be greater than 0"));
        }
        if !positive(scale.min_reference_px) || !positive(scale.default_mm_per_pixel) {
            return Err(config_error("Minimum reference and default scale must be positive"));
        }

        let posture = &self.posture;
        if !(posture.max_tilt_deg > 0.0 && posture.max_tilt_deg <= 90.0) {
            return Err(config_error("Maximum tilt must be between 0 and 90 degrees"));
        }
        if !(posture.max_yaw_ratio > 0.0 && posture.max_yaw_ratio <= 1.0) {
            return Err(config_error("Maximum yaw ratio must be between 0.0 and 1.0"));
        }
        if !(0.0 <= posture.min_face_coverage
            && posture.min_face_coverage < posture.max_face_coverage
            && posture.max_face_coverage <= 1.0)
        {
            return Err(config_error("Face coverage bounds must satisfy 0 <= min < max <= 1"));
        }

        let metrics = &self.metrics;
        if !non_negative(metrics.deadband_mm) {
            return Err(config_error("Deadband must be non-negative"));
        }
        if !(metrics.is_open_threshold_mm.is_finite() && metrics.is_open_threshold_mm > metrics.deadband_mm) {
            return Err(config_error("Open threshold must be greater than the deadband"));
        }
        if !non_negative(metrics.peak_hold_secs) {
            return Err(config_error("Peak hold window must be non-negative"));
        }
        if !(metrics.peak_decay > 0.0 && metrics.peak_decay <= 1.0) {
            return Err(config_error("Peak decay must be in (0, 1]"));
        }

        if self.calibration.required_samples < 2 {
            return Err(config_error("Calibration needs at least 2 samples"));
        }
        if !positive(self.calibration.max_std_dev_mm) {
            return Err(config_error("Calibration standard deviation limit must be positive"));
        }

        let reps = &self.reps;
        if !positive(reps.open_threshold_mm) {
            return Err(config_error("Repetition open threshold must be positive"));
        }
        if !(reps.close_ratio > 0.0 && reps.close_ratio < 1.0) {
            return Err(config_error("Repetition close ratio must be between 0.0 and 1.0"));
        }
        if reps.reps_required == 0 {
            return Err(config_error("Required repetitions must be greater than 0"));
        }

        Ok(())
    }
}

// NaN fails both
fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn config_error(message: &str) -> Error {
    Error::ConfigError(message.to_string())
}

fn validate_filter(label: &str, params: &FilterParams) -> Result<()> {
    if !positive(params.sample_rate_hz) {
        return Err(Error::ConfigError(format!("{label} filter sample rate must be positive")));
    }
    if !positive(params.min_cutoff) || !positive(params.derivative_cutoff) {
        return Err(Error::ConfigError(format!("{label} filter cutoffs must be positive")));
    }
    if !non_negative(params.beta) {
        return Err(Error::ConfigError(format!("{label} filter beta must be non-negative")));
    }
    if !positive(params.max_gap_secs) {
        return Err(Error::ConfigError(format!("{label} filter gap reset must be positive")));
    }
    Ok(())
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Jaw Kinematics Configuration

# Image size of the landmark source
viewport:
  width: 640
  height: 480

# Adaptive landmark filters (beta is per normalized unit/s)
stabilizer:
  anchor:
    sample_rate_hz: 30.0
    min_cutoff: 0.5
    beta: 2.0
    derivative_cutoff: 1.0
    max_gap_secs: 1.0
  mobile:
    sample_rate_hz: 30.0
    min_cutoff: 1.0
    beta: 50.0
    derivative_cutoff: 1.0
    max_gap_secs: 1.0

# Pixel to millimeter calibration
scale:
  reference_mm: 64.0
  eye_corner_ratio: 1.45
  window_size: 30
  min_reference_px: 1.0
  default_mm_per_pixel: 0.5

# Centered-subject checks
posture:
  max_tilt_deg: 8.0
  max_yaw_ratio: 0.3
  min_face_coverage: 0.15
  max_face_coverage: 0.65

# Jaw metrics
metrics:
  deadband_mm: 4.0
  is_open_threshold_mm: 5.0
  opening_mode: axial
  peak_hold_secs: 2.0
  peak_decay: 0.9

# Auto-calibration
calibration:
  required_samples: 30
  max_std_dev_mm: 0.5

# Repetition counting
reps:
  open_threshold_mm: 18.0
  close_ratio: 0.6
  min_dwell_ms: 1000
  reps_required: 5
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed = Config::from_yaml("reps:\n  open_threshold_mm: 20.0\n").unwrap();
        assert_eq!(parsed.reps.open_threshold_mm, 20.0);
        assert_eq!(parsed.reps.reps_required, DEFAULT_REPS_REQUIRED);
        assert_eq!(parsed.scale, ScaleConfig::default());
    }

    #[test]
    fn test_validate_rejects_inverted_hysteresis() {
        let mut config = Config::default();
        config.metrics.is_open_threshold_mm = config.metrics.deadband_mm;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_filter() {
        let mut config = Config::default();
        config.stabilizer.mobile.min_cutoff = 0.0;
        match config.validate() {
            Err(Error::ConfigError(msg)) => assert!(msg.contains("mobile")),
            other => panic!("Expected ConfigError, got {other:?}"),
        }
    }
}
