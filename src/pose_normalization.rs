//! Head roll neutralization and posture checks.
//!
//! All geometry here runs in pixel space: normalized coordinates are stretched
//! by the image aspect ratio, so a roll angle measured in 0..1 space would be
//! wrong on any non-square image.

use crate::{
    config::PostureConfig,
    geometry::{distance_xy, line_angle, midpoint, rotate_about, Point3D},
    landmarks::{LandmarkFrame, LandmarkId},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image size used to move between normalized and pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl Viewport {
    /// Create a viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Normalized point to pixels. Depth follows the detector convention of
    /// being scaled by image width.
    #[must_use]
    pub fn to_pixels(&self, p: &Point3D) -> Point3D {
        let w = f64::from(self.width);
        Point3D::new(p.x * w, p.y * f64::from(self.height), p.z * w)
    }

    /// Pixel point back to normalized coordinates
    #[must_use]
    pub fn to_normalized(&self, p: &Point3D) -> Point3D {
        let w = f64::from(self.width);
        Point3D::new(p.x / w, p.y / f64::from(self.height), p.z / w)
    }

    /// Convert a whole frame to pixel space
    #[must_use]
    pub fn frame_to_pixels(&self, frame: &LandmarkFrame) -> LandmarkFrame {
        frame.map_points(|p| self.to_pixels(p))
    }
}

/// A pixel-space frame rotated so the face vertical axis is the image vertical
#[derive(Debug, Clone, Copy)]
pub struct NormalizedFrame {
    /// Pose-corrected landmarks in pixels
    pub frame: LandmarkFrame,
    /// Head roll that was removed, radians (0 when eyes were missing)
    pub roll: f64,
    /// Rotation pivot in pixels
    pub pivot: Point3D,
    /// Image size the frame was converted with
    pub viewport: Viewport,
}

impl NormalizedFrame {
    /// Map a pose-corrected pixel point back onto the original image
    #[must_use]
    pub fn to_image(&self, p: &Point3D) -> Point3D {
        rotate_about(p, self.roll, &self.pivot)
    }
}

/// Pose normalizer
#[derive(Debug, Default, Clone, Copy)]
pub struct PoseNormalizer;

impl PoseNormalizer {
    /// Create a pose normalizer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Head roll from the outer eye corners, radians relative to horizontal
    #[must_use]
    pub fn roll_angle(frame: &LandmarkFrame) -> Option<f64> {
        let left = frame.get(LandmarkId::LeftEyeOuter)?;
        let right = frame.get(LandmarkId::RightEyeOuter)?;
        Some(line_angle(&left, &right))
    }

    /// Rotate every landmark by `angle` about `pivot`
    #[must_use]
    pub fn rotate_frame(frame: &LandmarkFrame, angle: f64, pivot: &Point3D) -> LandmarkFrame {
        frame.map_points(|p| rotate_about(p, angle, pivot))
    }

    /// Convert a smoothed frame to pixels and remove head roll about the nose
    #[must_use]
    pub fn normalize(&self, smoothed: &LandmarkFrame, viewport: Viewport) -> NormalizedFrame {
        let pixels = viewport.frame_to_pixels(smoothed);
        let roll = Self::roll_angle(&pixels).unwrap_or(0.0);
        let pivot = pixels
            .get(LandmarkId::NoseTip)
            .or_else(|| Self::mid_eye(&pixels))
            .unwrap_or_else(Point3D::origin);

        NormalizedFrame {
            frame: Self::rotate_frame(&pixels, -roll, &pivot),
            roll,
            pivot,
            viewport,
        }
    }

    fn mid_eye(frame: &LandmarkFrame) -> Option<Point3D> {
        Some(midpoint(
            &frame.get(LandmarkId::LeftEyeOuter)?,
            &frame.get(LandmarkId::RightEyeOuter)?,
        ))
    }
}

/// Posture problems, in reporting priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureWarning {
    /// Eye corners or nose not visible
    MissingLandmarks,
    /// Head tilted sideways
    Tilted,
    /// Head turned away from the camera
    Rotated,
    /// Face too small in frame
    TooFar,
    /// Face too large in frame
    TooClose,
}

impl fmt::Display for PostureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::MissingLandmarks => "face not fully visible",
            Self::Tilted => "head tilted, straighten up",
            Self::Rotated => "look straight at the camera",
            Self::TooFar => "move closer",
            Self::TooClose => "move back",
        };
        f.write_str(message)
    }
}

/// Result of a posture check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureReport {
    /// Highest-priority problem, if any
    pub warning: Option<PostureWarning>,
    /// Head roll in degrees
    pub roll_deg: f64,
    /// Cheek-to-nose asymmetry, 0 = facing the camera
    pub yaw_ratio: f64,
    /// Face width as a fraction of image width
    pub coverage: f64,
    /// Deviation of the forehead-chin line from the face vertical, degrees
    pub vertical_alignment_deg: f64,
}

impl PostureReport {
    /// The subject is centered when no warning fires
    #[must_use]
    pub fn is_centered(&self) -> bool {
        self.warning.is_none()
    }
}

/// Posture guard deriving the centered signal
#[derive(Debug, Clone)]
pub struct PostureGuard {
    config: PostureConfig,
}

impl PostureGuard {
    /// Create a posture guard
    #[must_use]
    pub fn new(config: PostureConfig) -> Self {
        Self { config }
    }

    /// Check tilt, rotation and distance on an un-rotated pixel frame
    #[must_use]
    pub fn check(&self, pixels: &LandmarkFrame, viewport: Viewport) -> PostureReport {
        let roll = PoseNormalizer::roll_angle(pixels);
        let roll_deg = roll.unwrap_or(0.0).to_degrees();

        let nose = pixels.get(LandmarkId::NoseTip);
        let cheeks = pixels
            .get(LandmarkId::LeftCheek)
            .zip(pixels.get(LandmarkId::RightCheek));

        let yaw_ratio = match (nose, cheeks) {
            (Some(nose), Some((left, right))) => {
                let d_left = distance_xy(&nose, &left);
                let d_right = distance_xy(&nose, &right);
                let widest = d_left.max(d_right);
                if widest > 0.0 {
                    (d_left - d_right).abs() / widest
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let coverage = cheeks.map_or(0.0, |(left, right)| {
            distance_xy(&left, &right) / f64::from(viewport.width.max(1))
        });

        let vertical_alignment_deg = match (
            roll,
            pixels.get(LandmarkId::Glabella),
            pixels.get(LandmarkId::Chin),
        ) {
            (Some(roll), Some(forehead), Some(chin)) => {
                ((line_angle(&forehead, &chin) - roll).to_degrees() - 90.0).abs()
            }
            _ => 0.0,
        };

        let warning = if roll.is_none() || nose.is_none() {
            Some(PostureWarning::MissingLandmarks)
        } else if roll_deg.abs() > self.config.max_tilt_deg {
            Some(PostureWarning::Tilted)
        } else if yaw_ratio > self.config.max_yaw_ratio {
            Some(PostureWarning::Rotated)
        } else if cheeks.is_some() && coverage < self.config.min_face_coverage {
            Some(PostureWarning::TooFar)
        } else if cheeks.is_some() && coverage > self.config.max_face_coverage {
            Some(PostureWarning::TooClose)
        } else {
            None
        };

        PostureReport {
            warning,
            roll_deg,
            yaw_ratio,
            coverage,
            vertical_alignment_deg,
        }
    }
}

impl Default for PostureGuard {
    fn default() -> Self {
        Self::new(PostureConfig::default())
    }
}
