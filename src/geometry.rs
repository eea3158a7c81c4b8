//! 3D point and vector primitives used by every pipeline stage.
//!
//! Points and vectors are `nalgebra` types. Rotations here are always in the
//! image (XY) plane; depth passes through unchanged.

use crate::constants::EPSILON;
use nalgebra::{Point3, Vector3};

/// Point in 3D space (normalized image units or pixels, depending on stage)
pub type Point3D = Point3<f64>;

/// Direction or displacement in 3D space
pub type Vector3D = Vector3<f64>;

/// Plane given by a point on it and a unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3D {
    /// Point on the plane
    pub point: Point3D,
    /// Unit normal
    pub normal: Vector3D,
}

impl Plane3D {
    /// Signed distance from `point` to the plane, positive on the normal side
    #[must_use]
    pub fn signed_distance(&self, point: &Point3D) -> f64 {
        dot(&vector_from(&self.point, point), &self.normal)
    }
}

/// Euclidean distance between two points
#[must_use]
pub fn distance(a: &Point3D, b: &Point3D) -> f64 {
    nalgebra::distance(a, b)
}

/// Distance between two points ignoring depth
#[must_use]
pub fn distance_xy(a: &Point3D, b: &Point3D) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Dot product
#[must_use]
pub fn dot(a: &Vector3D, b: &Vector3D) -> f64 {
    a.dot(b)
}

/// Cross product
#[must_use]
pub fn cross(a: &Vector3D, b: &Vector3D) -> Vector3D {
    a.cross(b)
}

/// Unit vector in the direction of `v`, or `None` when `v` is too short to
/// carry a direction
#[must_use]
pub fn normalize(v: &Vector3D) -> Option<Vector3D> {
    v.try_normalize(EPSILON)
}

/// Vector pointing from `tail` to `head`
#[must_use]
pub fn vector_from(tail: &Point3D, head: &Point3D) -> Vector3D {
    head - tail
}

/// Midpoint of two points
#[must_use]
pub fn midpoint(a: &Point3D, b: &Point3D) -> Point3D {
    nalgebra::center(a, b)
}

/// Rotate `point` by `angle` radians about `pivot` in the XY plane
#[must_use]
pub fn rotate_about(point: &Point3D, angle: f64, pivot: &Point3D) -> Point3D {
    let (sin, cos) = angle.sin_cos();
    let dx = point.x - pivot.x;
    let dy = point.y - pivot.y;

    Point3D::new(
        pivot.x + dx.mul_add(cos, -(dy * sin)),
        pivot.y + dx.mul_add(sin, dy * cos),
        point.z,
    )
}

/// Scalar projection of `point - origin` onto the XY axis at `angle` radians
#[must_use]
pub fn project_scalar(origin: &Point3D, point: &Point3D, angle: f64) -> f64 {
    let (sin, cos) = angle.sin_cos();
    (point.x - origin.x).mul_add(cos, (point.y - origin.y) * sin)
}

/// Angle of the line from `a` to `b` relative to the image horizontal
#[must_use]
pub fn line_angle(a: &Point3D, b: &Point3D) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}
