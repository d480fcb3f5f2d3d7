//! Flat box in the XY plane

use std::any::Any;

use crate::error::{NativeError, NativeResult};
use crate::linear_math::{transform_centered_aabb, Transform, Vec3};

use super::polyhedral::box_inertia;
use super::{proxy_type, CollisionShape, ConvexInternalData, ConvexShape, PolyhedralConvexShape};

const PENETRATION_DIRECTIONS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Box whose vertices lie in the XY plane
#[derive(Debug, Clone)]
pub struct Box2dShape {
    internal: ConvexInternalData,
    centroid: Vec3,
    vertices: [Vec3; 4],
    normals: [Vec3; 4],
}

impl Box2dShape {
    /// Box with the given half extents (margin included)
    pub fn new(half_extents: Vec3) -> Self {
        let (x, y) = (half_extents.x, half_extents.y);
        let mut internal = ConvexInternalData::default();
        internal.implicit_shape_dimensions =
            half_extents * internal.local_scaling - Vec3::splat(internal.collision_margin);
        internal.set_safe_margin_from_extents(half_extents, 0.1);
        Self {
            internal,
            centroid: Vec3::ZERO,
            vertices: [
                Vec3::new(-x, -y, 0.0),
                Vec3::new(x, -y, 0.0),
                Vec3::new(x, y, 0.0),
                Vec3::new(-x, y, 0.0),
            ],
            normals: [Vec3::NEG_Y, Vec3::X, Vec3::Y, Vec3::NEG_X],
        }
    }

    /// Half extents without the margin
    pub fn half_extents_without_margin(&self) -> &Vec3 {
        &self.internal.implicit_shape_dimensions
    }

    /// Half extents with the margin added
    pub fn half_extents_with_margin(&self) -> Vec3 {
        self.internal.implicit_shape_dimensions + Vec3::splat(self.margin())
    }

    /// Shape center
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Outward normals of the four edges
    pub fn normals(&self) -> &[Vec3; 4] {
        &self.normals
    }

    fn select(half_extents: Vec3, dir: Vec3) -> Vec3 {
        Vec3::new(
            if dir.x >= 0.0 { half_extents.x } else { -half_extents.x },
            if dir.y >= 0.0 { half_extents.y } else { -half_extents.y },
            if dir.z >= 0.0 { half_extents.z } else { -half_extents.z },
        )
    }

    fn plane_equation(&self, index: usize) -> NativeResult<(Vec3, f32)> {
        let he = self.half_extents_with_margin();
        let plane = match index {
            0 => (Vec3::X, -he.x),
            1 => (Vec3::NEG_X, -he.x),
            2 => (Vec3::Y, -he.y),
            3 => (Vec3::NEG_Y, -he.y),
            4 => (Vec3::Z, -he.z),
            5 => (Vec3::NEG_Z, -he.z),
            _ => return Err(NativeError::IndexOutOfRange { index, len: 6 }),
        };
        Ok(plane)
    }
}

impl CollisionShape for Box2dShape {
    fn shape_type(&self) -> i32 {
        proxy_type::BOX_2D
    }

    fn name(&self) -> &'static str {
        "Box2d"
    }

    fn aabb(&self, trans: &Transform) -> (Vec3, Vec3) {
        transform_centered_aabb(*self.half_extents_without_margin(), self.margin(), trans)
    }

    fn margin(&self) -> f32 {
        self.internal.collision_margin
    }

    fn set_margin(&mut self, margin: f32) {
        let with_margin = self.half_extents_with_margin();
        self.internal.collision_margin = margin;
        self.internal.implicit_shape_dimensions = with_margin - Vec3::splat(margin);
    }

    fn local_scaling(&self) -> &Vec3 {
        &self.internal.local_scaling
    }

    fn set_local_scaling(&mut self, scaling: Vec3) {
        let margin = Vec3::splat(self.margin());
        let unscaled = (self.internal.implicit_shape_dimensions + margin) / self.internal.local_scaling;
        self.internal.set_local_scaling(scaling);
        self.internal.implicit_shape_dimensions = unscaled * self.internal.local_scaling - margin;
    }

    fn calculate_local_inertia(&self, mass: f32) -> Vec3 {
        box_inertia(self.half_extents_with_margin(), mass)
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
}

impl ConvexShape for Box2dShape {
    fn local_supporting_vertex_without_margin(&self, dir: Vec3) -> Vec3 {
        Self::select(*self.half_extents_without_margin(), dir)
    }

    fn local_supporting_vertex(&self, dir: Vec3) -> Vec3 {
        Self::select(self.half_extents_with_margin(), dir)
    }

    fn num_preferred_penetration_directions(&self) -> usize {
        PENETRATION_DIRECTIONS.len()
    }

    fn preferred_penetration_direction(&self, index: usize) -> NativeResult<Vec3> {
        NativeError::check_index(index, PENETRATION_DIRECTIONS.len())?;
        Ok(PENETRATION_DIRECTIONS[index])
    }
}

impl PolyhedralConvexShape for Box2dShape {
    fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn num_edges(&self) -> usize {
        self.vertices.len()
    }

    fn edge(&self, index: usize) -> NativeResult<(Vec3, Vec3)> {
        let len = self.vertices.len();
        NativeError::check_index(index, len)?;
        Ok((self.vertices[index], self.vertices[(index + 1) % len]))
    }

    fn vertex(&self, index: usize) -> NativeResult<Vec3> {
        NativeError::check_index(index, self.vertices.len())?;
        Ok(self.vertices[index])
    }

    fn num_planes(&self) -> usize {
        6
    }

    fn plane(&self, index: usize) -> NativeResult<(Vec3, Vec3)> {
        let (normal, _) = self.plane_equation(index)?;
        Ok((normal, self.local_supporting_vertex(-normal)))
    }

    fn is_inside(&self, point: Vec3, tolerance: f32) -> bool {
        let he = *self.half_extents_without_margin() + Vec3::splat(tolerance);
        point.abs().cmple(he).all()
    }
}
