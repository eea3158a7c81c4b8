//! Synthetic landmark frames for demos, tests and benchmarks.
//!
//! Faces are laid out in pixel space around the nose tip and converted to the
//! detector's normalized coordinates on output. At `scale == 1.0` the iris
//! centers are 128 px apart, i.e. 0.5 mm per pixel for a 64 mm reference.

use crate::{
    constants::{DEFAULT_FPS, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH, REFERENCE_IPD_MM},
    geometry::{rotate_about, Point3D},
    landmarks::{Landmark, LandmarkId},
    pose_normalization::Viewport,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Iris span of the template face, pixels
const TEMPLATE_IRIS_SPAN_PX: f64 = 128.0;

/// Pose and jaw state of one synthetic frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePose {
    /// True inter-lip opening, mm
    pub opening_mm: f64,
    /// True lateral jaw shift, mm (positive towards image right)
    pub deviation_mm: f64,
    /// Head roll, degrees
    pub roll_deg: f64,
    /// Face size multiplier (camera distance)
    pub scale: f64,
}

impl Default for FacePose {
    fn default() -> Self {
        Self {
            opening_mm: 0.0,
            deviation_mm: 0.0,
            roll_deg: 0.0,
            scale: 1.0,
        }
    }
}

impl FacePose {
    /// Resting pose with the given opening
    #[must_use]
    pub fn opening(opening_mm: f64) -> Self {
        Self {
            opening_mm,
            ..Self::default()
        }
    }
}

/// Template offsets from the nose tip at scale 1: (x, y, z, moves with jaw)
const TEMPLATE: [(LandmarkId, f64, f64, f64, bool); LandmarkId::COUNT] = [
    (LandmarkId::LeftEyeOuter, -93.0, -50.0, 10.0, false),
    (LandmarkId::RightEyeOuter, 93.0, -50.0, 10.0, false),
    (LandmarkId::LeftIris, -64.0, -50.0, 5.0, false),
    (LandmarkId::RightIris, 64.0, -50.0, 5.0, false),
    (LandmarkId::NoseTip, 0.0, 0.0, -20.0, false),
    (LandmarkId::NoseBridge, 0.0, -50.0, -10.0, false),
    (LandmarkId::Glabella, 0.0, -90.0, -5.0, false),
    (LandmarkId::Philtrum, 0.0, 28.0, -8.0, false),
    (LandmarkId::UpperLipInner, 0.0, 40.0, -6.0, false),
    (LandmarkId::LowerLipInner, 0.0, 40.0, -6.0, true),
    (LandmarkId::LowerLipOuter, 0.0, 52.0, -7.0, true),
    (LandmarkId::Chin, 0.0, 90.0, -4.0, true),
    (LandmarkId::LeftCheek, -120.0, 10.0, 30.0, false),
    (LandmarkId::RightCheek, 120.0, 10.0, 30.0, false),
    (LandmarkId::Mandible172, -110.0, 20.0, 40.0, true),
    (LandmarkId::Mandible136, -100.0, 45.0, 35.0, true),
    (LandmarkId::Mandible150, -85.0, 65.0, 28.0, true),
    (LandmarkId::Mandible149, -65.0, 78.0, 20.0, true),
    (LandmarkId::Mandible176, -45.0, 86.0, 12.0, true),
    (LandmarkId::Mandible148, -22.0, 90.0, 6.0, true),
    (LandmarkId::Mandible377, 22.0, 90.0, 6.0, true),
    (LandmarkId::Mandible400, 45.0, 86.0, 12.0, true),
    (LandmarkId::Mandible378, 65.0, 78.0, 20.0, true),
    (LandmarkId::Mandible379, 85.0, 65.0, 28.0, true),
    (LandmarkId::Mandible365, 100.0, 45.0, 35.0, true),
    (LandmarkId::Mandible397, 110.0, 20.0, 40.0, true),
];

/// Synthetic face generator
#[derive(Debug, Clone)]
pub struct SyntheticFace {
    viewport: Viewport,
    nose: Point3D,
    jitter_px: f64,
    rng: StdRng,
}

impl SyntheticFace {
    /// Face centered in `viewport`, no jitter
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            nose: Point3D::new(
                f64::from(viewport.width) / 2.0,
                f64::from(viewport.height) * 250.0 / 480.0,
                0.0,
            ),
            jitter_px: 0.0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Add uniform per-coordinate jitter of up to `jitter_px`, seeded
    #[must_use]
    pub fn with_jitter(mut self, jitter_px: f64, seed: u64) -> Self {
        self.jitter_px = jitter_px.abs();
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Image size of the generated frames
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Millimeters per pixel of a face at `scale`
    #[must_use]
    pub fn mm_per_pixel(scale: f64) -> f64 {
        REFERENCE_IPD_MM / (TEMPLATE_IRIS_SPAN_PX * scale)
    }

    /// Exact pixel positions for `pose`
    #[must_use]
    pub fn pixel_points(&self, pose: &FacePose) -> Vec<(LandmarkId, Point3D)> {
        let px_per_mm = 1.0 / Self::mm_per_pixel(pose.scale);
        let open_px = pose.opening_mm * px_per_mm;
        let shift_px = pose.deviation_mm * px_per_mm;
        let roll = pose.roll_deg.to_radians();

        TEMPLATE
            .iter()
            .map(|&(id, dx, dy, dz, jaw)| {
                let mut p = Point3D::new(
                    self.nose.x + dx * pose.scale,
                    self.nose.y + dy * pose.scale,
                    self.nose.z + dz * pose.scale,
                );
                if jaw {
                    p.x += shift_px;
                    p.y += open_px;
                }
                (id, rotate_about(&p, roll, &self.nose))
            })
            .collect()
    }

    /// Detector-style landmarks for `pose`, without jitter
    #[must_use]
    pub fn landmarks(&self, pose: &FacePose) -> Vec<Landmark> {
        self.pixel_points(pose)
            .into_iter()
            .map(|(id, p)| self.to_landmark(id, &p))
            .collect()
    }

    /// Detector-style landmarks for `pose` with the configured jitter
    pub fn noisy_landmarks(&mut self, pose: &FacePose) -> Vec<Landmark> {
        let jitter = self.jitter_px;
        let points = self.pixel_points(pose);
        points
            .into_iter()
            .map(|(id, p)| {
                let noisy = if jitter > 0.0 {
                    Point3D::new(
                        p.x + self.rng.gen_range(-jitter..=jitter),
                        p.y + self.rng.gen_range(-jitter..=jitter),
                        p.z,
                    )
                } else {
                    p
                };
                self.to_landmark(id, &noisy)
            })
            .collect()
    }

    fn to_landmark(&self, id: LandmarkId, p: &Point3D) -> Landmark {
        let n = self.viewport.to_normalized(p);
        Landmark::new(id.mesh_index(), n.x, n.y, n.z)
    }
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self::new(Viewport::new(DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_HEIGHT))
    }
}

/// Scripted open/close exercise: rest, linear open to the peak, linear close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepProtocol {
    /// Number of repetitions
    pub reps: u32,
    /// Closed time before each repetition, seconds
    pub rest_secs: f64,
    /// Opening ramp duration, seconds
    pub open_secs: f64,
    /// Closing ramp duration, seconds
    pub close_secs: f64,
    /// Peak opening, mm
    pub peak_mm: f64,
    /// Frame rate
    pub fps: f64,
}

impl Default for RepProtocol {
    fn default() -> Self {
        Self {
            reps: 5,
            rest_secs: 1.0,
            open_secs: 0.3,
            close_secs: 0.3,
            peak_mm: 40.0,
            fps: DEFAULT_FPS,
        }
    }
}

impl RepProtocol {
    fn frames_for(&self, secs: f64) -> usize {
        (secs * self.fps).round().max(1.0) as usize
    }

    /// Frames in one repetition cycle
    #[must_use]
    pub fn cycle_frames(&self) -> usize {
        self.frames_for(self.rest_secs) + self.frames_for(self.open_secs) + self.frames_for(self.close_secs)
    }

    /// Opening at frame `index` within a cycle
    #[must_use]
    pub fn opening_at(&self, index: usize) -> f64 {
        let rest = self.frames_for(self.rest_secs);
        let open = self.frames_for(self.open_secs);
        let close = self.frames_for(self.close_secs);

        let i = index % self.cycle_frames();
        if i < rest {
            0.0
        } else if i < rest + open {
            self.peak_mm * (i - rest) as f64 / open as f64
        } else {
            self.peak_mm * (1.0 - (i - rest - open) as f64 / close as f64)
        }
    }

    /// `(timestamp, opening_mm)` for every frame, starting at `start` seconds,
    /// followed by one closed rest period
    #[must_use]
    pub fn schedule(&self, start: f64) -> Vec<(f64, f64)> {
        let total = self.cycle_frames() * self.reps as usize + self.frames_for(self.rest_secs);
        let cycles = self.cycle_frames() * self.reps as usize;
        (0..total)
            .map(|i| {
                let opening = if i < cycles { self.opening_at(i) } else { 0.0 };
                (start + i as f64 / self.fps, opening)
            })
            .collect()
    }
}
