//! Landmark identities and per-frame landmark tables.
//!
//! The detector addresses points by numeric face-mesh index. Only the closed set
//! in [`LandmarkId`] takes part in measurement; everything else is ignored at the
//! stabilizer boundary.

use crate::geometry::Point3D;
use serde::{Deserialize, Serialize};

/// One raw detector point. `x`/`y` are fractional image coordinates, `z` is
/// relative depth in the same normalized units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Face-mesh index, stable across frames
    pub id: u32,
    /// Horizontal position in [0, 1]
    pub x: f64,
    /// Vertical position in [0, 1]
    pub y: f64,
    /// Relative depth
    pub z: f64,
}

impl Landmark {
    /// Create a new landmark
    #[must_use]
    pub const fn new(id: u32, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }
}

macro_rules! landmark_ids {
    ($($variant:ident = $mesh:literal, $mobile:literal;)+) => {
        /// Anatomical landmarks tracked by the pipeline
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum LandmarkId {
            $(
                #[allow(missing_docs)]
                $variant,
            )+
        }

        impl LandmarkId {
            /// Every tracked landmark, in table order
            pub const ALL: [Self; Self::COUNT] = [$(Self::$variant),+];

            /// Number of tracked landmarks
            pub const COUNT: usize = [$(Self::$variant),+].len();

            /// Face-mesh index of this landmark
            #[must_use]
            pub const fn mesh_index(self) -> u32 {
                match self {
                    $(Self::$variant => $mesh,)+
                }
            }

            /// Look up a tracked landmark by face-mesh index
            #[must_use]
            pub const fn from_mesh_index(index: u32) -> Option<Self> {
                match index {
                    $($mesh => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Lips, chin and mandible contour move with the jaw and get a
            /// faster filter
            #[must_use]
            pub const fn is_mobile(self) -> bool {
                match self {
                    $(Self::$variant => $mobile,)+
                }
            }
        }
    };
}

landmark_ids! {
    LeftEyeOuter = 33, false;
    RightEyeOuter = 263, false;
    LeftIris = 468, false;
    RightIris = 473, false;
    NoseTip = 1, false;
    NoseBridge = 168, false;
    Glabella = 10, false;
    Philtrum = 0, false;
    UpperLipInner = 13, true;
    LowerLipInner = 14, true;
    LowerLipOuter = 17, true;
    Chin = 152, true;
    LeftCheek = 234, false;
    RightCheek = 454, false;
    Mandible172 = 172, true;
    Mandible136 = 136, true;
    Mandible150 = 150, true;
    Mandible149 = 149, true;
    Mandible176 = 176, true;
    Mandible148 = 148, true;
    Mandible377 = 377, true;
    Mandible400 = 400, true;
    Mandible378 = 378, true;
    Mandible379 = 379, true;
    Mandible365 = 365, true;
    Mandible397 = 397, true;
}

impl LandmarkId {
    /// Position of this landmark in a [`LandmarkFrame`]
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Mandible contour from left jaw angle to right jaw angle, through the chin
    pub const MANDIBLE_PATH: [Self; 13] = [
        Self::Mandible172,
        Self::Mandible136,
        Self::Mandible150,
        Self::Mandible149,
        Self::Mandible176,
        Self::Mandible148,
        Self::Chin,
        Self::Mandible377,
        Self::Mandible400,
        Self::Mandible378,
        Self::Mandible379,
        Self::Mandible365,
        Self::Mandible397,
    ];
}

/// Fixed-size table of landmark positions keyed by [`LandmarkId`]
///
/// A slot is `None` when the landmark was not observed this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkFrame {
    points: [Option<Point3D>; LandmarkId::COUNT],
}

impl LandmarkFrame {
    /// Empty frame
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from raw detector points, keeping only tracked IDs
    #[must_use]
    pub fn from_landmarks(landmarks: &[Landmark]) -> Self {
        let mut frame = Self::new();
        for landmark in landmarks {
            if let Some(id) = LandmarkId::from_mesh_index(landmark.id) {
                frame.set(id, Point3D::new(landmark.x, landmark.y, landmark.z));
            }
        }
        frame
    }

    /// Position of `id`, if observed
    #[must_use]
    pub fn get(&self, id: LandmarkId) -> Option<Point3D> {
        self.points[id.slot()]
    }

    /// Store a position for `id`
    pub fn set(&mut self, id: LandmarkId, point: Point3D) {
        self.points[id.slot()] = Some(point);
    }

    /// Clear the slot for `id`
    pub fn remove(&mut self, id: LandmarkId) {
        self.points[id.slot()] = None;
    }

    /// Observed landmarks in table order
    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, Point3D)> + '_ {
        LandmarkId::ALL
            .iter()
            .filter_map(|&id| self.get(id).map(|p| (id, p)))
    }

    /// Number of observed landmarks
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// True when no tracked landmark was observed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    /// Apply `f` to every observed point
    #[must_use]
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&Point3D) -> Point3D,
    {
        let mut out = *self;
        for point in out.points.iter_mut().flatten() {
            *point = f(point);
        }
        out
    }
}
