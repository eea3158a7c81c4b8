//! Mid-sagittal reference plane.
//!
//! The plane runs through the forehead, nose bridge and philtrum, all of which
//! stay put while the jaw moves. Its normal points from the subject's right eye
//! corner (33) towards the left one (263), so a positive signed distance means
//! the jaw moved towards image right.

use crate::{
    geometry::{cross, midpoint, normalize, vector_from, Plane3D, Point3D, Vector3D},
    landmarks::{LandmarkFrame, LandmarkId},
};

/// Symmetry plane estimator
#[derive(Debug, Default, Clone, Copy)]
pub struct SymmetryPlaneEstimator;

impl SymmetryPlaneEstimator {
    /// Create an estimator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Mid-eye point: the nose bridge if present, else the eye-corner midpoint
    #[must_use]
    pub fn mid_eye(frame: &LandmarkFrame) -> Option<Point3D> {
        frame.get(LandmarkId::NoseBridge).or_else(|| {
            Some(midpoint(
                &frame.get(LandmarkId::LeftEyeOuter)?,
                &frame.get(LandmarkId::RightEyeOuter)?,
            ))
        })
    }

    /// Face vertical axis (glabella to philtrum), unnormalized
    #[must_use]
    pub fn vertical_axis(frame: &LandmarkFrame) -> Option<Vector3D> {
        Some(vector_from(
            &frame.get(LandmarkId::Glabella)?,
            &frame.get(LandmarkId::Philtrum)?,
        ))
    }

    /// Estimate the plane from a pose-corrected frame
    ///
    /// Returns `None` when an anchor is missing or the anchors are collinear.
    #[must_use]
    pub fn estimate(&self, frame: &LandmarkFrame) -> Option<Plane3D> {
        let point = Self::mid_eye(frame)?;
        let vertical = Self::vertical_axis(frame)?;
        let eye = vector_from(
            &frame.get(LandmarkId::LeftEyeOuter)?,
            &frame.get(LandmarkId::RightEyeOuter)?,
        );

        let forward = cross(&eye, &vertical);
        let normal = normalize(&cross(&vertical, &forward))?;

        Some(Plane3D { point, normal })
    }
}
