//! Replay application: drives a session from a landmark source.

use crate::{
    calibration::TareOffset,
    config::Config,
    error::{Error, Result},
    landmarks::Landmark,
    rep_counter::RepEvent,
    session::{Session, SessionPhase},
    synthetic::{FacePose, RepProtocol, SyntheticFace},
    telemetry::{ReportGenerator, TelemetryRecord, TelemetrySummary, TemplateReport},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

/// Resting time the demo gives the calibration controller, seconds
const DEMO_CALIBRATION_SECS: f64 = 2.0;

/// One frame of a landmark recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Seconds since the start of the recording
    pub timestamp: f64,
    /// Detector points present in this frame
    pub landmarks: Vec<Landmark>,
}

/// Source of landmark frames
pub trait FrameSource {
    /// Next frame, or `None` at the end of the stream
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream cannot be read or decoded
    fn next_frame(&mut self) -> Result<Option<RecordedFrame>>;

    /// Source description for logging
    fn name(&self) -> &str;
}

/// JSON-Lines recording, one [`RecordedFrame`] per line
///
/// Blank lines and lines starting with `#` are skipped.
pub struct JsonLinesSource<R: BufRead> {
    lines: Lines<R>,
    line: usize,
    name: String,
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a recording file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!("Opened landmark recording {}", path.display());
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Wrap a reader
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            name: name.into(),
        }
    }
}

impl<R: BufRead> FrameSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<RecordedFrame>> {
        for line in self.lines.by_ref() {
            self.line += 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let frame = serde_json::from_str(trimmed).map_err(|e| Error::Parse {
                line: self.line,
                message: e.to_string(),
            })?;
            return Ok(Some(frame));
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Built-in scripted exercise: a resting window, then the repetition protocol
pub struct SyntheticSource {
    face: SyntheticFace,
    schedule: Vec<(f64, f64)>,
    next: usize,
}

impl SyntheticSource {
    /// Create a scripted source
    #[must_use]
    pub fn new(face: SyntheticFace, protocol: RepProtocol) -> Self {
        let rest_frames = (DEMO_CALIBRATION_SECS * protocol.fps).round() as usize;
        let mut schedule: Vec<(f64, f64)> = (0..rest_frames).map(|i| (i as f64 / protocol.fps, 0.0)).collect();
        schedule.extend(protocol.schedule(rest_frames as f64 / protocol.fps));

        Self {
            face,
            schedule,
            next: 0,
        }
    }

    /// Total frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    /// True when the schedule is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<RecordedFrame>> {
        let Some(&(timestamp, opening_mm)) = self.schedule.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        Ok(Some(RecordedFrame {
            timestamp,
            landmarks: self.face.noisy_landmarks(&FacePose::opening(opening_mm)),
        }))
    }

    fn name(&self) -> &str {
        "synthetic protocol"
    }
}

/// Where the replay reads frames from
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// JSON-Lines recording
    Recording(PathBuf),
    /// Built-in synthetic protocol
    Demo {
        /// Per-coordinate jitter, pixels
        jitter_px: f64,
        /// Random seed for the jitter
        seed: u64,
    },
}

/// Result of a replay run
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Frames consumed
    pub frames: usize,
    /// Frames without any tracked landmark
    pub lost_frames: usize,
    /// Repetitions counted
    pub rep_count: u32,
    /// Offset used during the exercise
    pub tare: TareOffset,
    /// Final phase
    pub phase: SessionPhase,
    /// Exercise telemetry
    pub records: Vec<TelemetryRecord>,
    /// Summary of the telemetry, if any was recorded
    pub summary: Option<TelemetrySummary>,
    /// Generated report, if any telemetry was recorded
    pub report: Option<String>,
}

/// Replay application
pub struct ReplayApp {
    session: Session,
    source: Box<dyn FrameSource>,
    reporter: Box<dyn ReportGenerator>,
}

impl ReplayApp {
    /// Create an application for `input`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the recording
    /// cannot be opened or the demo jitter is not finite
    pub fn new(config: Config, input: &InputSource) -> Result<Self> {
        let source: Box<dyn FrameSource> = match input {
            InputSource::Recording(path) => Box::new(JsonLinesSource::open(path)?),
            InputSource::Demo { jitter_px, seed } => {
                if !jitter_px.is_finite() {
                    return Err(Error::InvalidInput(format!("Jitter must be finite, got {jitter_px}")));
                }
                let face = SyntheticFace::new(config.viewport).with_jitter(*jitter_px, *seed);
                let protocol = RepProtocol {
                    reps: config.reps.reps_required,
                    fps: config.stabilizer.mobile.sample_rate_hz,
                    ..RepProtocol::default()
                };
                Box::new(SyntheticSource::new(face, protocol))
            }
        };

        Self::with_source(config, source)
    }

    /// Create an application around an existing source
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn with_source(config: Config, source: Box<dyn FrameSource>) -> Result<Self> {
        Ok(Self {
            session: Session::new(config)?,
            source,
            reporter: Box::new(TemplateReport),
        })
    }

    /// Replace the report generator
    #[must_use]
    pub fn with_reporter(mut self, reporter: Box<dyn ReportGenerator>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replay every frame, then finalize the session and build the report
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails to decode a frame
    pub fn run(&mut self) -> Result<ReplayOutcome> {
        info!("Replaying frames from {}", self.source.name());
        self.session.start_calibration();

        let mut frames = 0;
        let mut lost_frames = 0;
        while let Some(frame) = self.source.next_frame()? {
            let output = self.session.process_frame(&frame.landmarks, frame.timestamp);
            frames += 1;
            if !output.tracking {
                lost_frames += 1;
            }

            if let RepEvent::Debounced = output.rep_event {
                debug!("Fast re-close at {:.2}s not counted", frame.timestamp);
            }
            if output.phase == SessionPhase::Complete {
                info!("Required repetitions reached after {} frames", frames);
                break;
            }
        }

        if self.session.phase() == SessionPhase::Calibrating {
            warn!("Recording ended before calibration was accepted");
        }

        let phase = self.session.phase();
        let rep_count = self.session.rep_count();
        let tare = self.session.tare();
        let records = self.session.finalize_session();
        let summary = TelemetrySummary::from_records(&records);

        let report = if records.is_empty() {
            warn!("No exercise telemetry recorded, skipping report");
            None
        } else {
            info!("Generating report with {}", self.reporter.name());
            Some(self.reporter.generate(&records)?)
        };

        Ok(ReplayOutcome {
            frames,
            lost_frames,
            rep_count,
            tare,
            phase,
            records,
            summary,
            report,
        })
    }

    /// Underlying session
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}
