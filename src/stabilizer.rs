//! Per-landmark temporal smoothing.
//!
//! Every tracked landmark gets its own (x, y, z) triple of adaptive filters,
//! created the first time the landmark is seen. Anchor landmarks and mobile
//! landmarks use different tunings.

use crate::{
    filters::{FilterParams, OneEuroFilter, ScalarFilter},
    geometry::Point3D,
    landmarks::{Landmark, LandmarkFrame, LandmarkId},
};
use log::debug;

/// Filter state of a single landmark
struct AxisFilters {
    x: OneEuroFilter,
    y: OneEuroFilter,
    z: OneEuroFilter,
}

impl AxisFilters {
    fn new(params: FilterParams) -> Self {
        Self {
            x: OneEuroFilter::new(params),
            y: OneEuroFilter::new(params),
            z: OneEuroFilter::new(params),
        }
    }

    /// Filter each axis; a non-finite output resets that axis and drops the point
    fn apply(&mut self, id: LandmarkId, raw: &Landmark, timestamp: f64) -> Option<Point3D> {
        let x = Self::checked(&mut self.x, raw.x, timestamp);
        let y = Self::checked(&mut self.y, raw.y, timestamp);
        let z = Self::checked(&mut self.z, raw.z, timestamp);

        match (x, y, z) {
            (Some(x), Some(y), Some(z)) => Some(Point3D::new(x, y, z)),
            _ => {
                debug!("Non-finite coordinate for {:?}, axis filter reset", id);
                None
            }
        }
    }

    fn checked(filter: &mut OneEuroFilter, value: f64, timestamp: f64) -> Option<f64> {
        let out = filter.apply(value, timestamp);
        if out.is_finite() {
            Some(out)
        } else {
            filter.reset();
            None
        }
    }
}

/// Landmark stabilizer
pub struct LandmarkStabilizer {
    anchor: FilterParams,
    mobile: FilterParams,
    filters: [Option<AxisFilters>; LandmarkId::COUNT],
}

impl LandmarkStabilizer {
    /// Create a stabilizer with separate anchor and mobile tunings
    ///
    /// # Panics
    ///
    /// Panics on the first frame if either tuning is rejected by
    /// [`OneEuroFilter::new`]; [`crate::config::Config::validate`] rules this out
    #[must_use]
    pub fn new(anchor: FilterParams, mobile: FilterParams) -> Self {
        Self {
            anchor,
            mobile,
            filters: std::array::from_fn(|_| None),
        }
    }

    /// Smooth one raw frame
    ///
    /// Only tracked landmark IDs present in `raw` appear in the output. Unknown
    /// IDs are skipped.
    pub fn process(&mut self, raw: &[Landmark], timestamp: f64) -> LandmarkFrame {
        let mut frame = LandmarkFrame::new();

        for landmark in raw {
            let Some(id) = LandmarkId::from_mesh_index(landmark.id) else {
                continue;
            };

            let params = if id.is_mobile() { self.mobile } else { self.anchor };
            let filters = self.filters[id.slot()].get_or_insert_with(|| AxisFilters::new(params));

            if let Some(point) = filters.apply(id, landmark, timestamp) {
                frame.set(id, point);
            }
        }

        frame
    }

    /// Discard all filter state
    pub fn reset(&mut self) {
        for slot in &mut self.filters {
            *slot = None;
        }
    }

    /// Number of landmarks with live filter state
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.filters.iter().filter(|f| f.is_some()).count()
    }
}

impl Default for LandmarkStabilizer {
    fn default() -> Self {
        Self::new(FilterParams::anchor(), FilterParams::mobile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_tracked_ids_are_emitted() {
        let mut stabilizer = LandmarkStabilizer::default();
        let raw = [
            Landmark::new(1, 0.5, 0.5, 0.0),
            Landmark::new(77, 0.1, 0.2, 0.0),
            Landmark::new(14, 0.5, 0.7, 0.0),
        ];

        let frame = stabilizer.process(&raw, 0.0);
        assert_eq!(frame.len(), 2);
        assert!(frame.get(LandmarkId::NoseTip).is_some());
        assert!(frame.get(LandmarkId::LowerLipInner).is_some());
        assert_eq!(stabilizer.tracked_count(), 2);
    }

    #[test]
    fn test_lazy_creation_and_reset() {
        let mut stabilizer = LandmarkStabilizer::default();
        stabilizer.process(&[Landmark::new(10, 0.5, 0.2, 0.0)], 0.0);
        assert_eq!(stabilizer.tracked_count(), 1);
        stabilizer.process(&[Landmark::new(0, 0.5, 0.6, 0.0)], 1.0 / 30.0);
        assert_eq!(stabilizer.tracked_count(), 2);

        stabilizer.reset();
        assert_eq!(stabilizer.tracked_count(), 0);

        // Primes from scratch after reset
        let frame = stabilizer.process(&[Landmark::new(10, 0.9, 0.9, 0.0)], 2.0 / 30.0);
        assert_eq!(frame.get(LandmarkId::Glabella), Some(Point3D::new(0.9, 0.9, 0.0)));
    }

    #[test]
    fn test_nan_is_dropped_and_filter_recovers() {
        let mut stabilizer = LandmarkStabilizer::default();
        let dt = 1.0 / 30.0;
        stabilizer.process(&[Landmark::new(13, 0.5, 0.6, 0.0)], 0.0);

        let frame = stabilizer.process(&[Landmark::new(13, f64::NAN, 0.6, 0.0)], dt);
        assert!(frame.get(LandmarkId::UpperLipInner).is_none());

        let frame = stabilizer.process(&[Landmark::new(13, 0.5, 0.6, 0.0)], 2.0 * dt);
        let p = frame.get(LandmarkId::UpperLipInner).unwrap();
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!((p.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mobile_landmarks_respond_faster() {
        let mut stabilizer = LandmarkStabilizer::default();
        let dt = 1.0 / 30.0;
        let frame_at = |y: f64| [Landmark::new(14, 0.5, y, 0.0), Landmark::new(168, 0.5, y, 0.0)];

        stabilizer.process(&frame_at(0.5), 0.0);
        let mut frame = LandmarkFrame::new();
        for i in 1..=4 {
            frame = stabilizer.process(&frame_at(0.6), f64::from(i) * dt);
        }

        let lip = frame.get(LandmarkId::LowerLipInner).unwrap().y;
        let bridge = frame.get(LandmarkId::NoseBridge).unwrap().y;
        assert!(lip > bridge);
    }
}
