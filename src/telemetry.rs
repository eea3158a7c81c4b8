//! Exercise telemetry, session summary and report generation.

use crate::{
    biomechanics::{analyze_motion, atm_score, RangeClass},
    jaw_metrics::JawMetrics,
    statistics::Statistics,
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Deviation above which the report flags asymmetric movement, mm
const DEVIATION_ALERT_MM: f64 = 3.0;

/// One exercise-phase frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Frame timestamp, seconds
    pub timestamp: f64,
    /// Tared metrics
    pub metrics: JawMetrics,
    /// Forehead-chin alignment, degrees
    pub vertical_alignment_deg: f64,
}

/// Aggregate view of a telemetry log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    /// Records in the log
    pub sample_count: usize,
    /// Time from first to last record, seconds
    pub duration_secs: f64,
    /// Largest opening, mm
    pub max_opening_mm: f64,
    /// Mean absolute lateral deviation, mm
    pub mean_abs_deviation_mm: f64,
    /// Largest absolute lateral deviation, mm
    pub max_abs_deviation_mm: f64,
    /// 100 minus twice the mean absolute deviation, floored at 0
    pub stability_index: f64,
    /// Mean vertical alignment, degrees
    pub mean_vertical_alignment_deg: f64,
    /// Open-mouth frame pairs faster than the click threshold
    pub click_count: usize,
    /// Largest frame-to-frame speed, mm/s
    pub peak_velocity_mm_per_sec: f64,
    /// Composite joint score, 0-100
    pub atm_score: u8,
    /// Class of the maximum opening
    pub range: RangeClass,
}

impl TelemetrySummary {
    /// Summarize a log; `None` when it is empty
    #[must_use]
    pub fn from_records(records: &[TelemetryRecord]) -> Option<Self> {
        let (first, last) = (records.first()?, records.last()?);

        let openings = Statistics::from_values(records.iter().map(|r| r.metrics.opening_mm))?;
        let deviations = Statistics::from_values(
            records
                .iter()
                .filter_map(|r| r.metrics.deviation_mm)
                .map(f64::abs),
        );
        let alignment = Statistics::from_values(records.iter().map(|r| r.vertical_alignment_deg))?;

        let (mean_abs_deviation_mm, max_abs_deviation_mm) = deviations.map_or((0.0, 0.0), |s| (s.mean, s.max));

        let mut click_count = 0;
        let mut peak_velocity_mm_per_sec: f64 = 0.0;
        for pair in records.windows(2) {
            let motion = analyze_motion(&pair[1].metrics, &pair[0].metrics, pair[1].timestamp - pair[0].timestamp);
            peak_velocity_mm_per_sec = peak_velocity_mm_per_sec.max(motion.velocity_mm_per_sec);
            if motion.is_click && pair[0].metrics.is_open && pair[1].metrics.is_open {
                click_count += 1;
            }
        }

        Some(Self {
            sample_count: records.len(),
            duration_secs: last.timestamp - first.timestamp,
            max_opening_mm: openings.max,
            mean_abs_deviation_mm,
            max_abs_deviation_mm,
            stability_index: (100.0 - mean_abs_deviation_mm * 2.0).max(0.0),
            mean_vertical_alignment_deg: alignment.mean,
            click_count,
            peak_velocity_mm_per_sec,
            atm_score: atm_score(openings.max, mean_abs_deviation_mm, alignment.mean),
            range: RangeClass::from_opening(openings.max),
        })
    }
}

/// Turns a finished telemetry log into narrative text
pub trait ReportGenerator {
    /// Produce the report
    ///
    /// # Errors
    ///
    /// Returns `Error::ReportError` if no report can be produced
    fn generate(&self, records: &[TelemetryRecord]) -> Result<String>;

    /// Generator name
    fn name(&self) -> &str;
}

/// Deterministic plain-text report built from the summary
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateReport;

impl TemplateReport {
    fn range_text(summary: &TelemetrySummary) -> &'static str {
        match summary.range {
            RangeClass::Limited => "Maximum opening is below 40 mm, which suggests a functional limitation.",
            RangeClass::Normal => "Maximum opening is within the 40-55 mm reference range.",
            RangeClass::Hypermobile => "Maximum opening exceeds 55 mm, which suggests hypermobility.",
        }
    }

    fn dynamics_text(summary: &TelemetrySummary) -> &'static str {
        if summary.max_abs_deviation_mm > DEVIATION_ALERT_MM {
            "Lateral deviation above 3 mm was observed; the jaw does not track the midline."
        } else {
            "The jaw tracked the midline within 3 mm throughout the exercise."
        }
    }
}

impl ReportGenerator for TemplateReport {
    fn generate(&self, records: &[TelemetryRecord]) -> Result<String> {
        let summary = TelemetrySummary::from_records(records)
            .ok_or_else(|| Error::ReportError("No telemetry recorded".to_string()))?;

        let mut out = String::from("# Jaw Kinematics Report\n\n");
        out.push_str(&format!(
            "Samples: {} over {:.1} s\nATM score: {}/100\n\n",
            summary.sample_count, summary.duration_secs, summary.atm_score
        ));

        out.push_str("## 1. Joint range\n");
        out.push_str(&format!(
            "Maximum opening: {:.2} mm ({})\n{}\n\n",
            summary.max_opening_mm,
            summary.range,
            Self::range_text(&summary)
        ));

        out.push_str("## 2. Movement dynamics\n");
        out.push_str(&format!(
            "Mean lateral deviation: {:.2} mm\nMaximum lateral deviation: {:.2} mm\n",
            summary.mean_abs_deviation_mm, summary.max_abs_deviation_mm
        ));
        out.push_str(&format!(
            "Stability index: {:.1}%\nClicks detected: {}\n{}\n\n",
            summary.stability_index,
            summary.click_count,
            Self::dynamics_text(&summary)
        ));

        out.push_str("## 3. Posture\n");
        out.push_str(&format!(
            "Mean vertical alignment: {:.1} degrees\n",
            summary.mean_vertical_alignment_deg
        ));

        Ok(out)
    }

    fn name(&self) -> &str {
        "TemplateReport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(t: f64, opening: f64, deviation: f64) -> TelemetryRecord {
        TelemetryRecord {
            timestamp: t,
            metrics: JawMetrics {
                opening_mm: opening,
                deviation_mm: Some(deviation),
                is_open: opening > 5.0,
            },
            vertical_alignment_deg: 1.0,
        }
    }

    #[test]
    fn test_summary() {
        let records = [
            record(0.0, 0.0, 0.0),
            record(0.1, 20.0, 1.0),
            record(0.2, 42.0, -3.0),
            record(0.3, 20.0, 2.0),
        ];
        let summary = TelemetrySummary::from_records(&records).unwrap();
        assert_eq!(summary.sample_count, 4);
        assert!((summary.duration_secs - 0.3).abs() < 1e-12);
        assert_eq!(summary.max_opening_mm, 42.0);
        assert!((summary.mean_abs_deviation_mm - 1.5).abs() < 1e-12);
        assert_eq!(summary.max_abs_deviation_mm, 3.0);
        assert!((summary.stability_index - 97.0).abs() < 1e-12);
        assert_eq!(summary.range, RangeClass::Normal);
        // 220 mm/s steps stay under the click threshold
        assert_eq!(summary.click_count, 0);
    }

    #[test]
    fn test_clicks_only_counted_while_open() {
        let records = [
            record(0.0, 10.0, 0.0),
            record(1.0 / 30.0, 40.0, 0.0),
            record(2.0 / 30.0, 0.0, 0.0),
        ];
        let summary = TelemetrySummary::from_records(&records).unwrap();
        assert_eq!(summary.click_count, 1);
        assert!(summary.peak_velocity_mm_per_sec > 1000.0);
    }

    #[test]
    fn test_template_report() {
        let records = [record(0.0, 0.0, 0.0), record(0.5, 30.0, 4.0)];
        let report = TemplateReport.generate(&records).unwrap();
        assert!(report.contains("# Jaw Kinematics Report"));
        assert!(report.contains("functional limitation"));
        assert!(report.contains("does not track the midline"));
    }

    #[test]
    fn test_empty_log_is_an_error() {
        assert!(matches!(TemplateReport.generate(&[]), Err(Error::ReportError(_))));
    }
}
