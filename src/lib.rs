//! Jaw kinematics library for measuring temporomandibular movement from
//! facial landmarks.
//!
//! The pipeline turns noisy per-frame detector points into stable clinical
//! measurements:
//! 1. Per-landmark adaptive smoothing ([`stabilizer`])
//! 2. Posture checks and head roll removal in pixel space ([`pose_normalization`])
//! 3. Rolling-median pixel to millimeter scale ([`scale`])
//! 4. Mid-sagittal reference plane ([`symmetry`])
//! 5. Opening amplitude and lateral deviation with deadband, hysteresis and
//!    peak-hold ([`jaw_metrics`])
//! 6. Auto-calibration and repetition counting ([`calibration`], [`rep_counter`])
//!
//! [`session::Session`] owns every stage and is driven with one call per frame.
//!
//! # Examples
//!
//! ```
//! use jaw_kinematics::{
//!     config::Config,
//!     session::{Session, SessionPhase},
//!     synthetic::{FacePose, SyntheticFace},
//! };
//!
//! # fn main() -> jaw_kinematics::Result<()> {
//! let mut session = Session::new(Config::default())?;
//! let face = SyntheticFace::default();
//!
//! session.start_calibration();
//! for i in 0..40 {
//!     session.process_frame(&face.landmarks(&FacePose::default()), f64::from(i) / 30.0);
//! }
//! assert_eq!(session.phase(), SessionPhase::Exercise);
//!
//! let output = session.process_frame(&face.landmarks(&FacePose::opening(30.0)), 40.0 / 30.0);
//! if let Some(metrics) = output.metrics {
//!     println!("Opening: {:.1} mm", metrics.opening_mm);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Filters
//!
//! ```
//! use jaw_kinematics::filters::{FilterParams, OneEuroFilter, ScalarFilter};
//!
//! let mut filter = OneEuroFilter::new(FilterParams::mobile());
//! let first = filter.apply(0.50, 0.0);
//! let next = filter.apply(0.52, 1.0 / 30.0);
//! assert_eq!(first, 0.50);
//! assert!(next > 0.50 && next <= 0.52);
//! ```

/// 3D point and vector primitives
pub mod geometry;

/// Tracked landmark identities and landmark tables
pub mod landmarks;

/// Signal filtering algorithms for smoothing landmarks and scale
pub mod filters;

/// Per-landmark temporal smoothing
pub mod stabilizer;

/// Head roll removal and posture checks
pub mod pose_normalization;

/// Pixel to millimeter calibration
pub mod scale;

/// Mid-sagittal plane estimation
pub mod symmetry;

/// Opening and deviation metrics
pub mod jaw_metrics;

/// Window statistics
pub mod statistics;

/// Auto-calibration state machine
pub mod calibration;

/// Repetition counter
pub mod rep_counter;

/// Motion analysis and joint score
pub mod biomechanics;

/// Exercise telemetry and reports
pub mod telemetry;

/// Session orchestration
pub mod session;

/// Synthetic landmark generation
pub mod synthetic;

/// Replay application
pub mod app;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
