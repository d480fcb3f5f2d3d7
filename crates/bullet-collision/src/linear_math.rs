//! Linear math used by the collision shapes
//!
//! Vectors and matrices are glam's single precision types. A [`Transform`]
//! is a rotation basis plus an origin.

pub use glam::{Mat3, Vec3};

/// Rigid transform: `x -> basis * x + origin`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Rotation basis
    pub basis: Mat3,
    /// Translation
    pub origin: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Transform = Transform {
        basis: Mat3::IDENTITY,
        origin: Vec3::ZERO,
    };

    /// Create a transform from a basis and an origin
    pub fn new(basis: Mat3, origin: Vec3) -> Self {
        Self { basis, origin }
    }

    /// Pure translation
    pub fn from_translation(origin: Vec3) -> Self {
        Self {
            basis: Mat3::IDENTITY,
            origin,
        }
    }

    /// Apply to a point
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.basis * point + self.origin
    }

    /// Express a world direction in local coordinates (`dir * basis`)
    pub fn to_local_direction(&self, dir: Vec3) -> Vec3 {
        self.basis.transpose() * dir
    }

    /// Inverse transform
    pub fn inverse(&self) -> Self {
        let basis = self.basis.transpose();
        Self {
            basis,
            origin: basis * -self.origin,
        }
    }

    /// Composition `self * other`
    pub fn mul_transform(&self, other: &Transform) -> Self {
        Self {
            basis: self.basis * other.basis,
            origin: self.apply(other.origin),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// World-space AABB of a local box `[min, max]` grown by `margin`
pub fn transform_aabb(local_min: Vec3, local_max: Vec3, margin: f32, trans: &Transform) -> (Vec3, Vec3) {
    let half_extents = (local_max - local_min) * 0.5 + Vec3::splat(margin);
    let center = (local_max + local_min) * 0.5;
    transform_half_extents(half_extents, center, trans)
}

/// World-space AABB of a centered box with `half_extents` grown by `margin`
pub fn transform_centered_aabb(half_extents: Vec3, margin: f32, trans: &Transform) -> (Vec3, Vec3) {
    transform_half_extents(half_extents + Vec3::splat(margin), Vec3::ZERO, trans)
}

fn transform_half_extents(half_extents: Vec3, center: Vec3, trans: &Transform) -> (Vec3, Vec3) {
    let world_center = trans.apply(center);
    let b = trans.basis;
    let abs_basis = Mat3::from_cols(b.x_axis.abs(), b.y_axis.abs(), b.z_axis.abs());
    let extent = abs_basis * half_extents;
    (world_center - extent, world_center + extent)
}

/// Normalized `v`, or the normalized `(-1, -1, -1)` fallback for a
/// near-zero vector
pub fn normalized_or_fallback(v: Vec3) -> Vec3 {
    if v.length_squared() < f32::EPSILON * f32::EPSILON {
        Vec3::NEG_ONE.normalize()
    } else {
        v.normalize()
    }
}
