//! Small geometry helpers shared by the mesh store and the editing
//! operations.

use cgmath::{prelude::*, Point3, Vector2, Vector3};
use num_traits::Float;


/// Tolerance used when comparing face normals to decide whether two faces
/// belong to the same flat side.
pub(crate) const NORMAL_TOLERANCE: f32 = 0.99;

/// Tolerance used when testing whether an adjacent polygon is orthogonal to
/// the polygon being appended.
pub(crate) const ADJACENT_POLYGON_NORMAL_TOLERANCE: f32 = 0.0001;

/// Tolerance for the degenerate-triangle test in the render data builder.
pub(crate) const DEGENERATE_TOLERANCE: f32 = 1.0e-4;


/// Returns whether `a` and `b` are within `tolerance` of each other.
#[inline]
pub fn is_close<F: Float>(a: F, b: F, tolerance: F) -> bool {
    (a - b).abs() <= tolerance
}

/// Returns whether `v` has (squared) length close to zero.
#[inline]
pub fn is_close_zero<F: Float>(v: F, tolerance: F) -> bool {
    v.abs() <= tolerance
}

/// Normalizes `v`, returning the zero vector when `v` has no usable length.
pub fn normalize_safe(v: Vector3<f32>) -> Vector3<f32> {
    let len2 = v.magnitude2();
    if len2 > 0.0 {
        v / len2.sqrt()
    } else {
        Vector3::zero()
    }
}

/// Builds two unit axes orthogonal to `normal` (and to each other).
///
/// `normal` must be normalized; the choice of axes is arbitrary but
/// deterministic.
pub fn orthonormal_basis(normal: Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let reference = if normal.x.abs() > 0.9 {
        Vector3::unit_y()
    } else {
        Vector3::unit_x()
    };

    let axis1 = normalize_safe(normal.cross(reference));
    let axis2 = normal.cross(axis1);

    (axis1, axis2)
}


/// A right-handed orthonormal frame anchored at a pivot point.
///
/// Used as the local space of a polygon (axes in the polygon plane, third
/// axis along the normal) or of an edge (third axis along the edge).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Space {
    pub origin: Point3<f32>,
    pub axis1: Vector3<f32>,
    pub axis2: Vector3<f32>,
    pub axis3: Vector3<f32>,
}

impl Space {
    /// Builds a frame from a (normalized) third axis and a pivot.
    pub fn from_axis(axis3: Vector3<f32>, origin: Point3<f32>) -> Self {
        let (axis1, axis2) = orthonormal_basis(axis3);
        Space { origin, axis1, axis2, axis3 }
    }

    pub fn to_local(&self, position: Point3<f32>) -> Vector3<f32> {
        let rel = position - self.origin;
        Vector3::new(rel.dot(self.axis1), rel.dot(self.axis2), rel.dot(self.axis3))
    }

    pub fn from_local(&self, local: Vector3<f32>) -> Point3<f32> {
        self.origin + self.axis1 * local.x + self.axis2 * local.y + self.axis3 * local.z
    }

    /// Returns whether the three axes form an orthonormal set.
    pub fn is_orthogonal(&self) -> bool {
        const TOL: f32 = 1.0e-5;
        is_close(self.axis1.magnitude2(), 1.0, TOL)
            && is_close(self.axis2.magnitude2(), 1.0, TOL)
            && is_close(self.axis3.magnitude2(), 1.0, TOL)
            && is_close_zero(self.axis1.dot(self.axis2), TOL)
            && is_close_zero(self.axis1.dot(self.axis3), TOL)
            && is_close_zero(self.axis2.dot(self.axis3), TOL)
    }
}

/// Scales `position` about the origin of `space`, uniformly in all three
/// local axes.
pub fn scale_position(scale: f32, position: Point3<f32>, space: &Space) -> Point3<f32> {
    space.from_local(space.to_local(position) * scale)
}

/// Projects `position` onto the plane most aligned with `normal`, producing
/// a planar UV coordinate. The projection only depends on the dominant axis
/// of the normal, so coplanar faces tile continuously.
pub fn planar_uv(normal: Vector3<f32>, position: Point3<f32>) -> Vector2<f32> {
    let ax = normal.x.abs();
    let ay = normal.y.abs();
    let az = normal.z.abs();

    if ax >= ay && ax >= az {
        Vector2::new(position.y * normal.x.signum(), position.z)
    } else if ay >= az {
        Vector2::new(-position.x * normal.y.signum(), position.z)
    } else {
        Vector2::new(position.x, position.y * normal.z.signum())
    }
}
