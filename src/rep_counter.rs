//! Repetition counting on the tared opening signal.

use crate::config::RepConfig;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Mouth state as seen by the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepState {
    /// Below the close threshold, or never opened
    #[default]
    Closed,
    /// Above the open threshold
    Open,
}

/// Transition produced by one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepEvent {
    /// No state change
    None,
    /// Closed to open
    Opened,
    /// Open to closed, counted; carries the new total
    Counted(u32),
    /// Open to closed within the dwell time; not counted
    Debounced,
}

/// Repetition counter
#[derive(Debug, Clone)]
pub struct RepCounter {
    config: RepConfig,
    state: RepState,
    last_transition_time: Option<f64>,
    rep_count: u32,
}

impl RepCounter {
    /// Create a counter
    ///
    /// # Panics
    ///
    /// Panics if the open threshold is not positive or the close ratio is not in (0, 1)
    #[must_use]
    pub fn new(config: RepConfig) -> Self {
        assert!(config.open_threshold_mm > 0.0, "Open threshold must be positive");
        assert!(
            config.close_ratio > 0.0 && config.close_ratio < 1.0,
            "Close ratio must be between 0.0 and 1.0"
        );
        Self {
            config,
            state: RepState::Closed,
            last_transition_time: None,
            rep_count: 0,
        }
    }

    /// Threshold below which an open mouth closes, mm
    #[must_use]
    pub fn close_threshold(&self) -> f64 {
        self.config.open_threshold_mm * self.config.close_ratio
    }

    /// Feed the tared opening at `timestamp` (seconds)
    pub fn update(&mut self, opening_mm: f64, timestamp: f64) -> RepEvent {
        match self.state {
            RepState::Closed if opening_mm > self.config.open_threshold_mm => {
                self.state = RepState::Open;
                RepEvent::Opened
            }
            RepState::Open if opening_mm < self.close_threshold() => {
                self.state = RepState::Closed;

                let dwell_secs = self.config.min_dwell_ms as f64 / 1000.0;
                let elapsed_ok = self
                    .last_transition_time
                    .map_or(true, |last| timestamp - last > dwell_secs);

                if elapsed_ok {
                    self.rep_count += 1;
                    self.last_transition_time = Some(timestamp);
                    info!("Repetition {} counted at {:.2}s", self.rep_count, timestamp);
                    RepEvent::Counted(self.rep_count)
                } else {
                    debug!("Repetition close at {:.2}s ignored by debounce", timestamp);
                    RepEvent::Debounced
                }
            }
            _ => RepEvent::None,
        }
    }

    /// Repetitions counted so far
    #[must_use]
    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RepState {
        self.state
    }

    /// True when `reps_required` repetitions have been counted
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rep_count >= self.config.reps_required
    }

    /// Time of the last counted transition
    #[must_use]
    pub fn last_transition_time(&self) -> Option<f64> {
        self.last_transition_time
    }

    /// Start a new session
    pub fn reset(&mut self) {
        self.state = RepState::Closed;
        self.last_transition_time = None;
        self.rep_count = 0;
    }
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new(RepConfig::default())
    }
}
