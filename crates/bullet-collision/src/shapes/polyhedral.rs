//! Polyhedral convex shapes and the cached local AABB

use crate::error::NativeResult;
use crate::linear_math::{transform_aabb, Transform, Vec3};

use super::ConvexShape;

/// Convex shapes with explicit vertices, edges and planes
pub trait PolyhedralConvexShape: ConvexShape {
    /// Number of vertices
    fn num_vertices(&self) -> usize;

    /// Number of edges
    fn num_edges(&self) -> usize;

    /// End points of edge `index`
    fn edge(&self, index: usize) -> NativeResult<(Vec3, Vec3)>;

    /// Vertex `index`
    fn vertex(&self, index: usize) -> NativeResult<Vec3>;

    /// Number of planes
    fn num_planes(&self) -> usize;

    /// Normal and support point of plane `index`
    fn plane(&self, index: usize) -> NativeResult<(Vec3, Vec3)>;

    /// Check if `point` lies inside the shape within `tolerance`
    fn is_inside(&self, point: Vec3, tolerance: f32) -> bool;
}

/// Inertia of a solid box spanning the shape's AABB
pub(crate) fn box_inertia(half_extents: Vec3, mass: f32) -> Vec3 {
    let l = half_extents * 2.0;
    let sq = l * l;
    Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 12.0)
}

/// Polyhedral shapes that cache their local AABB
pub trait AabbCachingShape: PolyhedralConvexShape {
    /// The cached local bounds
    fn cache(&self) -> &LocalAabbCache;

    /// Recompute the cached local bounds from supporting vertices
    fn recalc_local_aabb(&mut self);

    /// World AABB from the cached bounds grown by `margin`
    fn nonvirtual_aabb(&self, trans: &Transform, margin: f32) -> (Vec3, Vec3) {
        self.cache().world_aabb(trans, margin)
    }
}

const AXES: [Vec3; 6] = [
    Vec3::X,
    Vec3::Y,
    Vec3::Z,
    Vec3::NEG_X,
    Vec3::NEG_Y,
    Vec3::NEG_Z,
];

/// Local AABB computed from the shape's supporting vertices
#[derive(Debug, Clone, PartialEq)]
pub struct LocalAabbCache {
    min: Vec3,
    max: Vec3,
    valid: bool,
}

impl Default for LocalAabbCache {
    fn default() -> Self {
        Self {
            min: Vec3::ONE,
            max: Vec3::NEG_ONE,
            valid: false,
        }
    }
}

impl LocalAabbCache {
    /// Rebuild from `shape`'s margin-less supporting vertices plus `margin`
    pub fn recalc(&mut self, shape: &dyn ConvexShape, margin: f32) {
        let supporting = shape.batched_supporting_vertices_without_margin(&AXES);
        for axis in 0..3 {
            self.max[axis] = supporting[axis][axis] + margin;
            self.min[axis] = supporting[axis + 3][axis] - margin;
        }
        self.valid = true;
    }

    /// Cached minimum corner
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Cached maximum corner
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Check if the cache has been computed
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// World AABB of the cached bounds
    pub fn world_aabb(&self, trans: &Transform, margin: f32) -> (Vec3, Vec3) {
        transform_aabb(self.min, self.max, margin, trans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_inertia() {
        let inertia = box_inertia(Vec3::new(1.0, 2.0, 3.0), 12.0);
        assert!(inertia.abs_diff_eq(Vec3::new(16.0 + 36.0, 4.0 + 36.0, 4.0 + 16.0), 1e-4));
    }

    #[test]
    fn test_default_cache_is_invalid() {
        let cache = LocalAabbCache::default();
        assert!(!cache.is_valid());
        assert!(cache.min().x > cache.max().x);
    }
}
