//! Replay application tests over recordings and the demo protocol

use jaw_kinematics::{
    app::{FrameSource, InputSource, JsonLinesSource, RecordedFrame, ReplayApp, SyntheticSource},
    config::Config,
    session::SessionPhase,
    synthetic::{FacePose, RepProtocol, SyntheticFace},
    telemetry::{ReportGenerator, TelemetryRecord},
    Error, Result,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_recording(face: &SyntheticFace) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# synthetic recording").unwrap();

    let mut source = SyntheticSource::new(face.clone(), RepProtocol::default());
    while let Some(frame) = source.next_frame().unwrap() {
        writeln!(file, "{}", serde_json::to_string(&frame).unwrap()).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_replay_recording() {
    let face = SyntheticFace::default();
    let recording = write_recording(&face);

    let mut app = ReplayApp::new(Config::default(), &InputSource::Recording(recording.path().to_path_buf())).unwrap();
    let outcome = app.run().unwrap();

    assert_eq!(outcome.rep_count, 5);
    assert_eq!(outcome.phase, SessionPhase::Complete);
    assert_eq!(outcome.lost_frames, 0);
    assert!(outcome.frames < SyntheticSource::new(face, RepProtocol::default()).len());

    let summary = outcome.summary.unwrap();
    assert!((summary.max_opening_mm - 40.0).abs() <= 2.0);

    let report = outcome.report.unwrap();
    assert!(report.contains("# Jaw Kinematics Report"));
    assert!(report.contains("Joint range"));
}

#[test]
fn test_replay_demo_with_jitter() {
    let mut app = ReplayApp::new(
        Config::default(),
        &InputSource::Demo {
            jitter_px: 0.5,
            seed: 11,
        },
    )
    .unwrap();
    let outcome = app.run().unwrap();

    assert_eq!(outcome.rep_count, 5);
    assert!(outcome.tare.lateral.abs() < 0.5);
    assert!((outcome.summary.unwrap().max_opening_mm - 40.0).abs() <= 2.0);
}

#[test]
fn test_recording_that_never_calibrates() {
    let face = SyntheticFace::default();
    let frames: Vec<RecordedFrame> = (0..10)
        .map(|i| RecordedFrame {
            timestamp: f64::from(i) / 30.0,
            landmarks: face.landmarks(&FacePose::default()),
        })
        .collect();

    let mut file = NamedTempFile::new().unwrap();
    for frame in &frames {
        writeln!(file, "{}", serde_json::to_string(frame).unwrap()).unwrap();
    }
    writeln!(file, "{}", serde_json::to_string(&RecordedFrame { timestamp: 0.4, landmarks: Vec::new() }).unwrap())
        .unwrap();
    file.flush().unwrap();

    let mut app = ReplayApp::new(Config::default(), &InputSource::Recording(file.path().to_path_buf())).unwrap();
    let outcome = app.run().unwrap();

    assert_eq!(outcome.frames, 11);
    assert_eq!(outcome.lost_frames, 1);
    assert_eq!(outcome.rep_count, 0);
    assert!(outcome.records.is_empty());
    assert!(outcome.report.is_none());
}

#[test]
fn test_corrupt_recording_reports_line() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{\"timestamp\": 0.0, \"landmarks\": []}}").unwrap();
    writeln!(file, "{{\"timestamp\": oops}}").unwrap();
    file.flush().unwrap();

    let mut source = JsonLinesSource::open(file.path()).unwrap();
    assert!(source.next_frame().unwrap().is_some());
    assert!(matches!(source.next_frame(), Err(Error::Parse { line: 2, .. })));

    let mut app = ReplayApp::new(Config::default(), &InputSource::Recording(file.path().to_path_buf())).unwrap();
    assert!(app.run().is_err());
}

#[test]
fn test_missing_recording() {
    let result = ReplayApp::new(Config::default(), &InputSource::Recording("/nonexistent/frames.jsonl".into()));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_demo_rejects_non_finite_jitter() {
    let input = InputSource::Demo {
        jitter_px: f64::NAN,
        seed: 1,
    };
    assert!(matches!(ReplayApp::new(Config::default(), &input), Err(Error::InvalidInput(_))));
}

struct CountingReport;

impl ReportGenerator for CountingReport {
    fn generate(&self, records: &[TelemetryRecord]) -> Result<String> {
        Ok(format!("{} records", records.len()))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[test]
fn test_custom_report_generator() {
    let source = SyntheticSource::new(SyntheticFace::default(), RepProtocol::default());
    let mut app = ReplayApp::with_source(Config::default(), Box::new(source))
        .unwrap()
        .with_reporter(Box::new(CountingReport));
    let outcome = app.run().unwrap();

    assert_eq!(outcome.report.unwrap(), format!("{} records", outcome.records.len()));
}
