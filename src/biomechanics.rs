//! Jaw trajectory speed, click detection and the composite joint score.

use crate::{constants::CLICK_VELOCITY_MM_PER_SEC, jaw_metrics::JawMetrics};
use serde::{Deserialize, Serialize};

const RANGE_WEIGHT: f64 = 0.4;
const SYMMETRY_WEIGHT: f64 = 0.3;
const SMOOTHNESS_WEIGHT: f64 = 0.2;
const POSTURE_WEIGHT: f64 = 0.1;

/// Lower bound of the normal opening range, mm
pub const NORMAL_RANGE_MIN_MM: f64 = 40.0;
/// Upper bound of the normal opening range, mm
pub const NORMAL_RANGE_MAX_MM: f64 = 55.0;
/// Lateral deviation that still counts as symmetric, mm
pub const SYMMETRIC_DEVIATION_MM: f64 = 2.0;

/// Speed of the jaw between two readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// Speed in the opening/deviation plane, mm/s
    pub velocity_mm_per_sec: f64,
    /// Speed above the click threshold
    pub is_click: bool,
}

/// Speed between two readings `dt_secs` apart; zero for a non-positive interval
#[must_use]
pub fn analyze_motion(current: &JawMetrics, previous: &JawMetrics, dt_secs: f64) -> MotionSample {
    if dt_secs <= 0.0 || !dt_secs.is_finite() {
        return MotionSample {
            velocity_mm_per_sec: 0.0,
            is_click: false,
        };
    }

    let d_open = current.opening_mm - previous.opening_mm;
    let d_lateral = current.deviation_mm.unwrap_or(0.0) - previous.deviation_mm.unwrap_or(0.0);
    let velocity_mm_per_sec = d_open.hypot(d_lateral) / dt_secs;

    MotionSample {
        velocity_mm_per_sec,
        is_click: velocity_mm_per_sec > CLICK_VELOCITY_MM_PER_SEC,
    }
}

/// Clinical class of the maximum opening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeClass {
    /// Below 40 mm
    Limited,
    /// 40 to 55 mm
    Normal,
    /// Above 55 mm
    Hypermobile,
}

impl RangeClass {
    /// Classify a maximum opening
    #[must_use]
    pub fn from_opening(max_opening_mm: f64) -> Self {
        if max_opening_mm < NORMAL_RANGE_MIN_MM {
            Self::Limited
        } else if max_opening_mm <= NORMAL_RANGE_MAX_MM {
            Self::Normal
        } else {
            Self::Hypermobile
        }
    }
}

impl std::fmt::Display for RangeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Limited => "limited",
            Self::Normal => "normal",
            Self::Hypermobile => "hypermobile",
        })
    }
}

/// Weighted 0-100 joint score from range, symmetry, smoothness and posture
#[must_use]
pub fn atm_score(max_opening_mm: f64, mean_abs_deviation_mm: f64, vertical_alignment_deg: f64) -> u8 {
    let range = match RangeClass::from_opening(max_opening_mm) {
        RangeClass::Normal => 100.0,
        RangeClass::Limited => (max_opening_mm.max(0.0) / NORMAL_RANGE_MIN_MM) * 80.0,
        RangeClass::Hypermobile => 100.0 - (max_opening_mm - NORMAL_RANGE_MAX_MM) * 2.0,
    };

    let deviation = mean_abs_deviation_mm.abs();
    let symmetry = if deviation <= SYMMETRIC_DEVIATION_MM {
        100.0
    } else {
        (100.0 - deviation * 10.0).max(0.0)
    };

    // No jerk measurement yet; a fixed "mostly smooth" rating
    let smoothness = 85.0;

    let posture = (100.0 - vertical_alignment_deg.abs() * 5.0).max(0.0);

    let total = range.max(0.0) * RANGE_WEIGHT
        + symmetry * SYMMETRY_WEIGHT
        + smoothness * SMOOTHNESS_WEIGHT
        + posture * POSTURE_WEIGHT;

    total.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(opening: f64, deviation: f64) -> JawMetrics {
        JawMetrics {
            opening_mm: opening,
            deviation_mm: Some(deviation),
            is_open: opening > 0.0,
        }
    }

    #[test]
    fn test_click_threshold() {
        let slow = analyze_motion(&reading(13.0, 0.0), &reading(10.0, 0.0), 1.0 / 30.0);
        assert!((slow.velocity_mm_per_sec - 90.0).abs() < 1e-9);
        assert!(!slow.is_click);

        let pop = analyze_motion(&reading(30.0, 0.0), &reading(10.0, 0.0), 1.0 / 30.0);
        assert!(pop.is_click);

        let zero = analyze_motion(&reading(30.0, 0.0), &reading(10.0, 0.0), 0.0);
        assert_eq!(zero.velocity_mm_per_sec, 0.0);
    }

    #[test]
    fn test_range_class() {
        assert_eq!(RangeClass::from_opening(35.0), RangeClass::Limited);
        assert_eq!(RangeClass::from_opening(40.0), RangeClass::Normal);
        assert_eq!(RangeClass::from_opening(55.0), RangeClass::Normal);
        assert_eq!(RangeClass::from_opening(58.0), RangeClass::Hypermobile);
    }

    #[test]
    fn test_atm_score() {
        // 40 + 30 + 17 + 10
        assert_eq!(atm_score(45.0, 1.0, 0.0), 97);
        // Limited range 20 mm -> 40 points * 0.4 = 16, deviation 5 mm -> 50 * 0.3 = 15
        assert_eq!(atm_score(20.0, 5.0, 0.0), 58);
        assert_eq!(atm_score(0.0, 50.0, 50.0), 17);
    }
}
