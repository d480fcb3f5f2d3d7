//! Collision shapes
//!
//! The shape hierarchy is a chain of traits:
//!
//! ```text
//! CollisionShape
//!   └─ ConvexShape
//!        └─ (ConvexInternalData)      scaling, implicit dimensions, margin
//!             └─ PolyhedralConvexShape
//!                  ├─ AabbCachingShape  ── ConvexHullShape
//!                  └─ Box2dShape
//! ```
//!
//! Every concrete shape is held as `Box<dyn CollisionShape>` and exposes the
//! intermediate levels through the `as_*` accessors.

mod box2d;
mod convex_hull;
mod polyhedral;

pub use box2d::Box2dShape;
pub use convex_hull::ConvexHullShape;
pub use polyhedral::{AabbCachingShape, LocalAabbCache, PolyhedralConvexShape};

use std::any::Any;
use std::fmt;

use crate::error::{NativeError, NativeResult};
use crate::linear_math::{normalized_or_fallback, Transform, Vec3};

/// Default collision margin of convex shapes
pub const CONVEX_DISTANCE_MARGIN: f32 = 0.04;

/// Broadphase proxy type numbers
pub mod proxy_type {
    /// Box
    pub const BOX: i32 = 0;
    /// Convex hull
    pub const CONVEX_HULL: i32 = 4;
    /// First implicit (non-polyhedral) convex type
    pub const IMPLICIT_CONVEX_SHAPES_START_HERE: i32 = 7;
    /// Sphere
    pub const SPHERE: i32 = 8;
    /// Flat box
    pub const BOX_2D: i32 = 17;
    /// Flat convex
    pub const CONVEX_2D: i32 = 18;
    /// First concave type
    pub const CONCAVE_SHAPES_START_HERE: i32 = 20;
    /// GImpact mesh
    pub const GIMPACT: i32 = 25;
    /// Static plane
    pub const STATIC_PLANE: i32 = 28;
    /// Last concave type
    pub const CONCAVE_SHAPES_END_HERE: i32 = 30;
    /// Compound
    pub const COMPOUND: i32 = 31;
    /// Soft body
    pub const SOFTBODY: i32 = 32;
}

/// Base of every collision shape
pub trait CollisionShape: Any + Send + Sync + fmt::Debug {
    /// Broadphase proxy type
    fn shape_type(&self) -> i32;

    /// Short shape name
    fn name(&self) -> &'static str;

    /// World-space bounding box under `trans`
    fn aabb(&self, trans: &Transform) -> (Vec3, Vec3);

    /// Collision margin
    fn margin(&self) -> f32;

    /// Set the collision margin
    fn set_margin(&mut self, margin: f32);

    /// Per-axis local scaling
    fn local_scaling(&self) -> &Vec3;

    /// Set the per-axis local scaling
    fn set_local_scaling(&mut self, scaling: Vec3);

    /// Diagonal inertia tensor for `mass`
    fn calculate_local_inertia(&self, mass: f32) -> Vec3;

    /// Upcast for downcasting to the concrete shape
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete shape
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convex view
    fn as_convex(&self) -> Option<&dyn ConvexShape> {
        None
    }

    /// Shared convex state
    fn as_convex_internal(&self) -> Option<&ConvexInternalData> {
        None
    }

    /// Shared convex state, mutable
    fn as_convex_internal_mut(&mut self) -> Option<&mut ConvexInternalData> {
        None
    }

    /// Polyhedral view
    fn as_polyhedral(&self) -> Option<&dyn PolyhedralConvexShape> {
        None
    }

    /// Cached-AABB view
    fn as_aabb_caching(&self) -> Option<&dyn AabbCachingShape> {
        None
    }

    /// Cached-AABB view, mutable
    fn as_aabb_caching_mut(&mut self) -> Option<&mut dyn AabbCachingShape> {
        None
    }

    /// Check if the shape is a polyhedron
    fn is_polyhedral(&self) -> bool {
        self.shape_type() < proxy_type::IMPLICIT_CONVEX_SHAPES_START_HERE
    }

    /// Check if the shape is flat convex
    fn is_convex_2d(&self) -> bool {
        matches!(self.shape_type(), proxy_type::BOX_2D | proxy_type::CONVEX_2D)
    }

    /// Check if the shape is convex
    fn is_convex(&self) -> bool {
        self.shape_type() < proxy_type::CONCAVE_SHAPES_START_HERE
    }

    /// Check if the shape is concave
    fn is_concave(&self) -> bool {
        let t = self.shape_type();
        t > proxy_type::CONCAVE_SHAPES_START_HERE && t < proxy_type::CONCAVE_SHAPES_END_HERE
    }

    /// Check if the shape may only be static
    fn is_non_moving(&self) -> bool {
        self.is_concave() && self.shape_type() != proxy_type::GIMPACT
    }

    /// Check if the shape is a compound
    fn is_compound(&self) -> bool {
        self.shape_type() == proxy_type::COMPOUND
    }

    /// Check if the shape is a soft body
    fn is_soft_body(&self) -> bool {
        self.shape_type() == proxy_type::SOFTBODY
    }

    /// Check if the shape is unbounded
    fn is_infinite(&self) -> bool {
        self.shape_type() == proxy_type::STATIC_PLANE
    }

    /// Center and radius of a sphere enclosing the local AABB
    fn bounding_sphere(&self) -> (Vec3, f32) {
        let (min, max) = self.aabb(&Transform::IDENTITY);
        ((min + max) * 0.5, (max - min).length() * 0.5)
    }

    /// Upper bound of the distance any point travels per radian
    fn angular_motion_disc(&self) -> f32 {
        let (center, radius) = self.bounding_sphere();
        radius + center.length()
    }

    /// Contact breaking threshold scaled from the angular motion disc
    fn contact_breaking_threshold(&self, default_factor: f32) -> f32 {
        self.angular_motion_disc() * default_factor
    }

    /// AABB swept over `time_step` of linear and angular motion
    fn temporal_aabb(
        &self,
        trans: &Transform,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
        time_step: f32,
    ) -> (Vec3, Vec3) {
        let (mut min, mut max) = self.aabb(trans);
        let linear = linear_velocity * time_step;
        let grow = linear.max(Vec3::ZERO);
        let shrink = linear.min(Vec3::ZERO);
        max += grow;
        min += shrink;
        let angular = angular_velocity.length() * self.angular_motion_disc() * time_step;
        (min - Vec3::splat(angular), max + Vec3::splat(angular))
    }

    /// Rolling friction direction scaling
    fn anisotropic_rolling_friction_direction(&self) -> Vec3 {
        Vec3::ONE
    }
}

/// Result of projecting a convex shape onto an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisProjection {
    /// Smallest projection
    pub min: f32,
    /// Largest projection
    pub max: f32,
    /// Point attaining `min`
    pub witness_min: Vec3,
    /// Point attaining `max`
    pub witness_max: Vec3,
}

/// Convex shapes, queried through supporting vertices
pub trait ConvexShape: CollisionShape {
    /// Farthest point along `dir`, ignoring the margin
    fn local_supporting_vertex_without_margin(&self, dir: Vec3) -> Vec3;

    /// Farthest point along `dir`, including the margin
    fn local_supporting_vertex(&self, dir: Vec3) -> Vec3 {
        let mut vertex = self.local_supporting_vertex_without_margin(dir);
        let margin = self.margin();
        if margin != 0.0 {
            vertex += normalized_or_fallback(dir) * margin;
        }
        vertex
    }

    /// Supporting vertices for a batch of unit directions
    fn batched_supporting_vertices_without_margin(&self, dirs: &[Vec3]) -> Vec<Vec3> {
        dirs.iter()
            .map(|dir| self.local_supporting_vertex_without_margin(*dir))
            .collect()
    }

    /// Number of preferred penetration directions
    fn num_preferred_penetration_directions(&self) -> usize {
        0
    }

    /// Preferred penetration direction `index`
    fn preferred_penetration_direction(&self, index: usize) -> NativeResult<Vec3> {
        Err(NativeError::IndexOutOfRange {
            index,
            len: self.num_preferred_penetration_directions(),
        })
    }

    /// Project onto world axis `dir` under `trans`
    fn project(&self, trans: &Transform, dir: Vec3) -> AxisProjection {
        let local_axis = trans.to_local_direction(dir);
        let far = trans.apply(self.local_supporting_vertex(local_axis));
        let near = trans.apply(self.local_supporting_vertex(-local_axis));
        let (mut min, mut max) = (near.dot(dir), far.dot(dir));
        let (mut witness_min, mut witness_max) = (near, far);
        if min > max {
            std::mem::swap(&mut min, &mut max);
            std::mem::swap(&mut witness_min, &mut witness_max);
        }
        AxisProjection {
            min,
            max,
            witness_min,
            witness_max,
        }
    }

    /// AABB from six supporting vertex queries
    fn aabb_slow(&self, trans: &Transform) -> (Vec3, Vec3) {
        let margin = self.margin();
        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;
        for axis in 0..3 {
            let mut unit = Vec3::ZERO;
            unit[axis] = 1.0;
            let far = trans.apply(self.local_supporting_vertex(trans.to_local_direction(unit)));
            max[axis] = far[axis] + margin;
            let near = trans.apply(self.local_supporting_vertex(trans.to_local_direction(-unit)));
            min[axis] = near[axis] - margin;
        }
        (min, max)
    }
}

/// State shared by every convex shape with scaling and a margin
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexInternalData {
    /// Per-axis scaling, always non-negative
    pub local_scaling: Vec3,
    /// Shape dimensions without the margin
    pub implicit_shape_dimensions: Vec3,
    /// Collision margin
    pub collision_margin: f32,
}

impl Default for ConvexInternalData {
    fn default() -> Self {
        Self {
            local_scaling: Vec3::ONE,
            implicit_shape_dimensions: Vec3::ZERO,
            collision_margin: CONVEX_DISTANCE_MARGIN,
        }
    }
}

impl ConvexInternalData {
    /// Store `scaling` with negative components flipped
    pub fn set_local_scaling(&mut self, scaling: Vec3) {
        self.local_scaling = scaling.abs();
    }

    /// Shrink the margin to `multiplier * min_dimension` when smaller
    pub fn set_safe_margin(&mut self, min_dimension: f32, multiplier: f32) {
        let safe = multiplier * min_dimension;
        if safe < self.collision_margin {
            self.collision_margin = safe;
        }
    }

    /// [`set_safe_margin`](Self::set_safe_margin) from the smallest half extent
    pub fn set_safe_margin_from_extents(&mut self, half_extents: Vec3, multiplier: f32) {
        self.set_safe_margin(half_extents.min_element(), multiplier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> ConvexHullShape {
        ConvexHullShape::from_points(&[
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
        ])
    }

    #[test]
    fn test_classification() {
        let hull = cube();
        assert!(hull.is_polyhedral());
        assert!(hull.is_convex());
        assert!(!hull.is_convex_2d());
        assert!(!hull.is_concave());
        assert!(!hull.is_non_moving());
        assert!(!hull.is_compound());
        assert!(!hull.is_infinite());

        let flat = Box2dShape::new(Vec3::new(1.0, 1.0, 0.5));
        assert!(flat.is_convex_2d());
        assert!(!flat.is_polyhedral());
        assert!(flat.is_convex());
    }

    #[test]
    fn test_bounding_sphere_and_motion_disc() {
        let hull = cube();
        let (center, radius) = hull.bounding_sphere();
        assert!(center.abs_diff_eq(Vec3::ZERO, 1e-6));
        let expected = Vec3::splat(1.08).length();
        assert!((radius - expected).abs() < 1e-5);
        assert!((hull.angular_motion_disc() - expected).abs() < 1e-5);
        assert!((hull.contact_breaking_threshold(0.5) - expected * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_temporal_aabb_grows_along_motion() {
        let hull = cube();
        let (min, max) = hull.temporal_aabb(&Transform::IDENTITY, Vec3::new(2.0, -1.0, 0.0), Vec3::ZERO, 0.5);
        assert!(max.abs_diff_eq(Vec3::new(2.08, 1.08, 1.08), 1e-5));
        assert!(min.abs_diff_eq(Vec3::new(-1.08, -1.58, -1.08), 1e-5));
    }

    #[test]
    fn test_project_and_slow_aabb() {
        let hull = cube();
        let projection = hull.project(&Transform::IDENTITY, Vec3::X);
        assert!((projection.max - 1.04).abs() < 1e-5);
        assert!((projection.min + 1.04).abs() < 1e-5);
        assert!(projection.witness_max.x > projection.witness_min.x);

        let (min, max) = hull.aabb_slow(&Transform::IDENTITY);
        assert!(min.abs_diff_eq(Vec3::splat(-1.08), 1e-5));
        assert!(max.abs_diff_eq(Vec3::splat(1.08), 1e-5));
    }

    #[test]
    fn test_safe_margin_only_shrinks() {
        let mut data = ConvexInternalData::default();
        data.set_safe_margin(1.0, 0.1);
        assert_eq!(data.collision_margin, CONVEX_DISTANCE_MARGIN);
        data.set_safe_margin_from_extents(Vec3::new(1.0, 0.2, 1.0), 0.1);
        assert!((data.collision_margin - 0.02).abs() < 1e-7);
    }

    #[test]
    fn test_no_preferred_directions_by_default() {
        let hull = cube();
        assert_eq!(hull.num_preferred_penetration_directions(), 0);
        assert!(matches!(
            hull.preferred_penetration_direction(0),
            Err(NativeError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }
}
