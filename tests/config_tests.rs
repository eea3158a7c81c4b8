//! Configuration file handling

use jaw_kinematics::{
    config::{Config, EXAMPLE_CONFIG},
    jaw_metrics::OpeningMode,
    session::Session,
    Error,
};
use tempfile::TempDir;

#[test]
fn test_example_config_matches_defaults() {
    let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
    assert_eq!(config, Config::default());
    assert!(config.validate().is_ok());
}

#[test]
fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("jaw.yaml");

    let mut config = Config::default();
    config.viewport.width = 1280;
    config.viewport.height = 720;
    config.metrics.opening_mode = OpeningMode::Euclidean;
    config.reps.reps_required = 8;
    config.stabilizer.mobile.beta = 35.0;

    config.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let config = Config::from_yaml("reps:\n  reps_required: 3\nmetrics:\n  opening_mode: euclidean\n").unwrap();
    assert_eq!(config.reps.reps_required, 3);
    assert_eq!(config.reps.open_threshold_mm, 18.0);
    assert_eq!(config.metrics.opening_mode, OpeningMode::Euclidean);
    assert_eq!(config.calibration, Config::default().calibration);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = Config::from_file(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(Error::IoError(_))));
}

#[test]
fn test_malformed_yaml() {
    let result = Config::from_yaml("metrics: [not, a, map");
    assert!(matches!(result, Err(Error::ConfigError(_))));

    let result = Config::from_yaml("metrics:\n  opening_mode: diagonal\n");
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_validation_failures() {
    let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
        ("viewport", Box::new(|c| c.viewport.width = 0)),
        ("anchor", Box::new(|c| c.stabilizer.anchor.min_cutoff = 0.0)),
        ("mobile", Box::new(|c| c.stabilizer.mobile.beta = -1.0)),
        ("scale", Box::new(|c| c.scale.window_size = 0)),
        ("tilt", Box::new(|c| c.posture.max_tilt_deg = 120.0)),
        ("coverage", Box::new(|c| c.posture.min_face_coverage = 0.9)),
        ("deadband", Box::new(|c| c.metrics.is_open_threshold_mm = 3.0)),
        ("decay", Box::new(|c| c.metrics.peak_decay = 1.5)),
        ("calibration", Box::new(|c| c.calibration.required_samples = 1)),
        ("close ratio", Box::new(|c| c.reps.close_ratio = 1.0)),
        ("reps", Box::new(|c| c.reps.reps_required = 0)),
    ];

    for (label, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        match config.validate() {
            Err(Error::ConfigError(message)) => assert!(!message.is_empty(), "{label}"),
            other => panic!("{label}: expected a configuration error, got {other:?}"),
        }
    }
}

#[test]
fn test_filter_errors_name_the_landmark_class() {
    let mut config = Config::default();
    config.stabilizer.mobile.sample_rate_hz = 0.0;
    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("mobile"), "{message}");
}

#[test]
fn test_non_finite_values_are_config_errors() {
    let fields = [
        "reps:\n  open_threshold_mm: {}\n",
        "scale:\n  reference_mm: {}\n",
        "scale:\n  default_mm_per_pixel: {}\n",
        "metrics:\n  deadband_mm: {}\n",
        "metrics:\n  is_open_threshold_mm: {}\n",
        "metrics:\n  peak_hold_secs: {}\n",
        "calibration:\n  max_std_dev_mm: {}\n",
        "posture:\n  max_tilt_deg: {}\n",
        "stabilizer:\n  mobile: {sample_rate_hz: 30.0, min_cutoff: 1.0, beta: {}, derivative_cutoff: 1.0, max_gap_secs: 1.0}\n",
        "stabilizer:\n  anchor: {sample_rate_hz: 30.0, min_cutoff: 0.5, beta: 2.0, derivative_cutoff: 1.0, max_gap_secs: {}}\n",
    ];

    for field in fields {
        for value in [".nan", ".inf", "-.inf"] {
            let yaml = field.replace("{}", value);
            let config = Config::from_yaml(&yaml).unwrap();
            assert!(
                matches!(config.validate(), Err(Error::ConfigError(_))),
                "{yaml} should not validate"
            );
            assert!(matches!(Session::new(config), Err(Error::ConfigError(_))), "{yaml}");
        }
    }
}
