//! Convex hull of a point cloud

use std::any::Any;

use crate::error::{NativeError, NativeResult};
use crate::linear_math::{Transform, Vec3};

use super::polyhedral::box_inertia;
use super::{
    proxy_type, AabbCachingShape, CollisionShape, ConvexInternalData, ConvexShape, LocalAabbCache,
    PolyhedralConvexShape,
};

/// Implicit convex hull over a set of points
#[derive(Debug, Clone, Default)]
pub struct ConvexHullShape {
    internal: ConvexInternalData,
    cache: LocalAabbCache,
    unscaled_points: Vec<Vec3>,
}

impl ConvexHullShape {
    /// Empty hull
    pub fn new() -> Self {
        let mut hull = Self::default();
        hull.recalc_local_aabb();
        hull
    }

    /// Hull over `points`
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut hull = Self {
            unscaled_points: points.to_vec(),
            ..Self::default()
        };
        hull.recalc_local_aabb();
        hull
    }

    /// Append a point, optionally refreshing the cached AABB
    pub fn add_point(&mut self, point: Vec3, recalc_local_aabb: bool) {
        self.unscaled_points.push(point);
        if recalc_local_aabb {
            self.recalc_local_aabb();
        }
    }

    /// Points as given, before scaling
    pub fn unscaled_points(&self) -> &Vec<Vec3> {
        &self.unscaled_points
    }

    /// Points as given, before scaling, mutable.
    ///
    /// The cached AABB is not refreshed until the next
    /// [`recalc_local_aabb`](AabbCachingShape::recalc_local_aabb).
    pub fn unscaled_points_mut(&mut self) -> &mut Vec<Vec3> {
        &mut self.unscaled_points
    }

    /// Point `index` with the local scaling applied
    pub fn scaled_point(&self, index: usize) -> NativeResult<Vec3> {
        NativeError::check_index(index, self.unscaled_points.len())?;
        Ok(self.unscaled_points[index] * self.internal.local_scaling)
    }

    /// Number of points
    pub fn num_points(&self) -> usize {
        self.unscaled_points.len()
    }

    fn scaled_points(&self) -> impl Iterator<Item = Vec3> + '_ {
        let scaling = self.internal.local_scaling;
        self.unscaled_points.iter().map(move |p| *p * scaling)
    }
}

impl CollisionShape for ConvexHullShape {
    fn shape_type(&self) -> i32 {
        proxy_type::CONVEX_HULL
    }

    fn name(&self) -> &'static str {
        "Convex"
    }

    fn aabb(&self, trans: &Transform) -> (Vec3, Vec3) {
        self.nonvirtual_aabb(trans, self.margin())
    }

    fn margin(&self) -> f32 {
        self.internal.collision_margin
    }

    fn set_margin(&mut self, margin: f32) {
        self.internal.collision_margin = margin;
    }

    fn local_scaling(&self) -> &Vec3 {
        &self.internal.local_scaling
    }

    fn set_local_scaling(&mut self, scaling: Vec3) {
        self.internal.set_local_scaling(scaling);
        self.recalc_local_aabb();
    }

    fn calculate_local_inertia(&self, mass: f32) -> Vec3 {
        let margin = self.margin();
        let (min, max) = self.aabb(&Transform::IDENTITY);
        box_inertia((max - min) * 0.5 + Vec3::splat(margin), mass)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_convex(&self) -> Option<&dyn ConvexShape> {
        Some(self)
    }

    fn as_convex_internal(&self) -> Option<&ConvexInternalData> {
        Some(&self.internal)
    }

    fn as_convex_internal_mut(&mut self) -> Option<&mut ConvexInternalData> {
        Some(&mut self.internal)
    }

    fn as_polyhedral(&self) -> Option<&dyn PolyhedralConvexShape> {
        Some(self)
    }

    fn as_aabb_caching(&self) -> Option<&dyn AabbCachingShape> {
        Some(self)
    }

    fn as_aabb_caching_mut(&mut self) -> Option<&mut dyn AabbCachingShape> {
        Some(self)
    }
}

impl ConvexShape for ConvexHullShape {
    fn local_supporting_vertex_without_margin(&self, dir: Vec3) -> Vec3 {
        let mut best = Vec3::ZERO;
        let mut best_dot = f32::MIN;
        for point in self.scaled_points() {
            let dot = dir.dot(point);
            if dot > best_dot {
                best_dot = dot;
                best = point;
            }
        }
        best
    }
}

impl PolyhedralConvexShape for ConvexHullShape {
    fn num_vertices(&self) -> usize {
        self.unscaled_points.len()
    }

    fn num_edges(&self) -> usize {
        self.unscaled_points.len()
    }

    fn edge(&self, index: usize) -> NativeResult<(Vec3, Vec3)> {
        let len = self.unscaled_points.len();
        NativeError::check_index(index, len)?;
        Ok((self.scaled_point(index)?, self.scaled_point((index + 1) % len)?))
    }

    fn vertex(&self, index: usize) -> NativeResult<Vec3> {
        self.scaled_point(index)
    }

    fn num_planes(&self) -> usize {
        0
    }

    fn plane(&self, index: usize) -> NativeResult<(Vec3, Vec3)> {
        Err(NativeError::IndexOutOfRange { index, len: 0 })
    }

    fn is_inside(&self, _point: Vec3, _tolerance: f32) -> bool {
        false
    }
}

impl AabbCachingShape for ConvexHullShape {
    fn cache(&self) -> &LocalAabbCache {
        &self.cache
    }

    fn recalc_local_aabb(&mut self) {
        let margin = self.margin();
        let mut cache = std::mem::take(&mut self.cache);
        cache.recalc(&*self, margin);
        self.cache = cache;
    }
}
