//! Constants used throughout the pipeline

/// Nominal landmark detector frame rate
pub const DEFAULT_FPS: f64 = 30.0;

/// Default image size used when the caller does not supply one
pub const DEFAULT_IMAGE_WIDTH: u32 = 640;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 480;

/// Adaptive filter tuning for anchor landmarks (eyes, nose, forehead)
pub const ANCHOR_MIN_CUTOFF: f64 = 0.5;
pub const ANCHOR_BETA: f64 = 2.0;

/// Adaptive filter tuning for mobile landmarks (lips, chin, mandible).
/// Beta is expressed against velocities in normalized image units per second.
pub const MOBILE_MIN_CUTOFF: f64 = 1.0;
pub const MOBILE_BETA: f64 = 50.0;

/// Cutoff of the derivative low-pass stage
pub const DEFAULT_DERIVATIVE_CUTOFF: f64 = 1.0;

/// Timestamp gap after which a filter re-primes instead of differentiating
pub const FILTER_GAP_RESET_SECS: f64 = 1.0;

/// Average adult inter-pupillary distance
pub const REFERENCE_IPD_MM: f64 = 64.0;

/// Outer eye-corner span divided by this approximates the iris span
pub const EYE_CORNER_TO_IRIS_RATIO: f64 = 1.45;

/// Scale ring buffer length (1 s at 30 Hz)
pub const DEFAULT_SCALE_WINDOW: usize = 30;

/// Reference distances shorter than this are treated as degenerate
pub const MIN_REFERENCE_PIXELS: f64 = 1.0;

/// Scale used before any valid reference has been observed
pub const DEFAULT_MM_PER_PIXEL: f64 = 0.5;

/// Openings below this are forced to zero
pub const DEFAULT_DEADBAND_MM: f64 = 4.0;

/// Raw opening above this latches `is_open`
pub const DEFAULT_IS_OPEN_THRESHOLD_MM: f64 = 5.0;

/// Peak-hold display window and per-frame decay once it expires
pub const DEFAULT_PEAK_HOLD_SECS: f64 = 2.0;
pub const DEFAULT_PEAK_DECAY: f64 = 0.9;

/// Calibration window and stability limit
pub const DEFAULT_CALIBRATION_SAMPLES: usize = 30;
pub const DEFAULT_CALIBRATION_MAX_STD_DEV_MM: f64 = 0.5;

/// Repetition counter thresholds
pub const DEFAULT_REP_OPEN_THRESHOLD_MM: f64 = 18.0;
pub const DEFAULT_REP_CLOSE_RATIO: f64 = 0.6;
pub const DEFAULT_REP_MIN_DWELL_MS: u64 = 1000;
pub const DEFAULT_REPS_REQUIRED: u32 = 5;

/// Posture guard thresholds
pub const DEFAULT_MAX_TILT_DEG: f64 = 8.0;
pub const DEFAULT_MAX_YAW_RATIO: f64 = 0.30;
pub const DEFAULT_MIN_FACE_COVERAGE: f64 = 0.15;
pub const DEFAULT_MAX_FACE_COVERAGE: f64 = 0.65;

/// Jaw speed above which a movement is flagged as a click (mm/s)
pub const CLICK_VELOCITY_MM_PER_SEC: f64 = 500.0;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
