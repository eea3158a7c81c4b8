//! Calibration and repetition state machine behavior


use jaw_kinematics::{
    calibration::{CalibrationController, CalibrationEvent, TareOffset},
    config::{Config, RepConfig},
    jaw_metrics::JawMetrics,
    landmarks::{Landmark, LandmarkId},
    rep_counter::{RepCounter, RepEvent, RepState},
    session::{Session, SessionPhase},
    synthetic::{FacePose, SyntheticFace},
};
use test_helpers::{assert_close, calibrated_session, hold_pose, DT};

fn sample(opening_mm: f64, deviation_mm: f64) -> JawMetrics {
    JawMetrics {
        opening_mm,
        deviation_mm: Some(deviation_mm),
        is_open: false,
    }
}

#[test]
fn test_rep_counter_ignores_hover_between_thresholds() {
    let mut counter = RepCounter::default();
    let close = counter.close_threshold();
    assert!((close - 10.8).abs() < 1e-12);

    assert_eq!(counter.update(20.0, 0.0), RepEvent::Opened);
    for (i, mm) in [17.0, 12.0, 15.0, 11.0, 17.9].iter().enumerate() {
        assert_eq!(counter.update(*mm, 0.1 + i as f64 * 0.1), RepEvent::None);
        assert_eq!(counter.state(), RepState::Open);
    }

    assert_eq!(counter.update(10.0, 1.5), RepEvent::Counted(1));
    for (i, mm) in [12.0, 17.0, 11.5, 18.0].iter().enumerate() {
        assert_eq!(counter.update(*mm, 1.6 + i as f64 * 0.1), RepEvent::None);
        assert_eq!(counter.state(), RepState::Closed);
    }
    assert_eq!(counter.rep_count(), 1);
}

#[test]
fn test_rep_counter_debounce_counts_once() {
    let mut counter = RepCounter::default();

    counter.update(25.0, 0.0);
    assert_eq!(counter.update(5.0, 0.5), RepEvent::Counted(1));

    // Second full cycle inside the dwell window
    assert_eq!(counter.update(25.0, 0.7), RepEvent::Opened);
    assert_eq!(counter.update(5.0, 0.9), RepEvent::Debounced);
    assert_eq!(counter.rep_count(), 1);
    assert_eq!(counter.last_transition_time(), Some(0.5));

    // Outside the window it counts again
    counter.update(25.0, 1.4);
    assert_eq!(counter.update(5.0, 1.6), RepEvent::Counted(2));
}

#[test]
fn test_rep_counter_first_close_is_not_debounced() {
    let mut counter = RepCounter::default();
    counter.update(30.0, 0.01);
    assert_eq!(counter.update(0.0, 0.02), RepEvent::Counted(1));
}

#[test]
fn test_rep_counter_completion() {
    let mut counter = RepCounter::new(RepConfig {
        reps_required: 2,
        ..RepConfig::default()
    });
    let mut t = 0.0;
    for _ in 0..2 {
        assert!(!counter.is_complete());
        counter.update(30.0, t);
        counter.update(0.0, t + 0.5);
        t += 2.0;
    }
    assert!(counter.is_complete());

    counter.reset();
    assert_eq!(counter.rep_count(), 0);
    assert_eq!(counter.last_transition_time(), None);
}

#[test]
fn test_calibration_accepts_stable_window() {
    let mut controller = CalibrationController::default();

    let mut last = CalibrationEvent::Reset;
    for i in 0..31 {
        let deviation = if i % 2 == 0 { 0.9 } else { 1.1 };
        last = controller.update(&sample(0.4, deviation), true);
        if i < 30 {
            assert_eq!(last, CalibrationEvent::Collecting { samples: i + 1 });
        }
    }

    let CalibrationEvent::Accepted(tare) = last else {
        panic!("Expected acceptance, got {last:?}");
    };
    assert!((tare.lateral - 1.0).abs() < 0.01);
    assert!((tare.opening - 0.4).abs() < 1e-9);
    assert!(controller.is_accepted());

    // Accepted is sticky until reset
    assert_eq!(controller.update(&sample(9.0, 9.0), false), CalibrationEvent::Accepted(tare));
}

#[test]
fn test_calibration_rejection_keeps_recent_half() {
    let mut controller = CalibrationController::default();

    let mut last = CalibrationEvent::Reset;
    for i in 0..31 {
        let deviation = if i % 2 == 0 { 2.0 } else { -2.0 };
        last = controller.update(&sample(0.0, deviation), true);
    }

    match last {
        CalibrationEvent::Rejected { std_dev, retained } => {
            assert!((std_dev - 2.0).abs() < 0.01);
            assert_eq!(retained, 15);
        }
        other => panic!("Expected rejection, got {other:?}"),
    }
    assert_eq!(controller.buffered(), 15);
    assert_eq!(controller.rejections(), 1);
    assert!(!controller.is_accepted());

    // The next decision comes after the buffer refills, not after a full window
    let mut decided_after = None;
    for i in 0..31 {
        let event = controller.update(&sample(0.0, 0.0), true);
        if !matches!(event, CalibrationEvent::Collecting { .. }) {
            decided_after = Some(i + 1);
            break;
        }
    }
    assert_eq!(decided_after, Some(16));
}

#[test]
fn test_calibration_reset_when_off_center() {
    let mut controller = CalibrationController::default();
    for _ in 0..20 {
        controller.update(&sample(0.0, 0.3), true);
    }
    assert_eq!(controller.buffered(), 20);

    assert_eq!(controller.update(&sample(0.0, 0.3), false), CalibrationEvent::Reset);
    assert_eq!(controller.buffered(), 0);
    assert_eq!(
        controller.update(&sample(0.0, 0.3), false),
        CalibrationEvent::Collecting { samples: 0 }
    );
}

#[test]
fn test_calibration_skips_frames_without_plane() {
    let mut controller = CalibrationController::default();
    controller.update(&sample(0.0, 0.1), true);

    let no_plane = JawMetrics {
        opening_mm: 0.0,
        deviation_mm: None,
        is_open: false,
    };
    assert_eq!(controller.update(&no_plane, true), CalibrationEvent::Collecting { samples: 1 });
    assert_eq!(controller.buffered(), 1);
}

#[test]
fn test_off_center_without_lips_clears_calibration() {
    let face = SyntheticFace::default();
    let mut session = Session::new(Config::default()).unwrap();
    session.start_calibration();

    let out = hold_pose(&mut session, &face, &FacePose::default(), 0.0, 20);
    assert_eq!(out.calibration, Some(CalibrationEvent::Collecting { samples: 20 }));

    let tilted_without_lip: Vec<Landmark> = face
        .landmarks(&FacePose {
            roll_deg: 25.0,
            ..FacePose::default()
        })
        .into_iter()
        .filter(|l| l.id != LandmarkId::UpperLipInner.mesh_index())
        .collect();

    let mut t = 20.0 * DT;
    let mut events = Vec::new();
    for _ in 0..30 {
        let out = session.process_frame(&tilted_without_lip, t);
        assert!(out.metrics.is_none());
        events.extend(out.calibration);
        t += DT;
    }
    assert!(events.contains(&CalibrationEvent::Reset), "{events:?}");
    assert_eq!(events.last(), Some(&CalibrationEvent::Collecting { samples: 0 }));

    // The pre-tilt samples are gone: acceptance needs a full fresh window
    let rest = face.landmarks(&FacePose::default());
    let mut since_reset = 0;
    for _ in 0..200 {
        let out = session.process_frame(&rest, t);
        t += DT;
        since_reset += 1;
        if out.calibration == Some(CalibrationEvent::Reset) {
            since_reset = 0;
        }
        if out.phase == SessionPhase::Exercise {
            break;
        }
    }
    assert_eq!(session.phase(), SessionPhase::Exercise);
    assert!(since_reset > 30, "accepted after {since_reset} frames");
}

#[test]
fn test_recalibration_replaces_tare_and_clears_reps() {
    let face = SyntheticFace::default();
    let (mut session, start) = calibrated_session(Config::default(), &face).unwrap();
    let first = session.tare();
    assert_close(first.lateral, 0.0, 0.1);

    hold_pose(&mut session, &face, &FacePose::opening(30.0), start, 15);
    let out = hold_pose(&mut session, &face, &FacePose::default(), start + 15.0 * DT, 15);
    assert_eq!(out.rep_count, 1);
    assert!(out.peak_opening_mm > 20.0);

    session.start_calibration();
    assert_eq!(session.phase(), SessionPhase::Calibrating);
    assert_eq!(session.tare(), TareOffset::ZERO);
    assert_eq!(session.rep_count(), 0);

    let shifted = FacePose {
        deviation_mm: 2.0,
        ..FacePose::default()
    };
    let mut t = start + 30.0 * DT;
    for _ in 0..200 {
        let out = session.process_frame(&face.landmarks(&shifted), t);
        t += DT;
        if out.phase == SessionPhase::Exercise {
            break;
        }
    }

    assert_eq!(session.phase(), SessionPhase::Exercise);
    let second = session.tare();
    assert_close(second.lateral, 2.0, 0.3);
    assert_close(second.opening, 0.0, 0.1);
    assert_eq!(session.rep_count(), 0);
}
