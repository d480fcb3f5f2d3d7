//! Exporter for the collision shape hierarchy
//!
//! Every shape class stores a `Box<dyn CollisionShape>`; the abstract
//! classes bind the members of the native interface they stand for and
//! reach it through the shape's capability casts. The class chain is:
//!
//! ```text
//! btCollisionShape
//! └── btConvexShape
//!     └── btConvexInternalShape
//!         └── btPolyhedralConvexShape
//!             ├── btPolyhedralConvexAabbCachingShape
//!             │   └── btConvexHullShape
//!             └── btBox2dShape
//! ```
//!
//! AABB queries follow the native signatures and write their results into
//! `btVector3` out-parameters; single results are returned.

use std::any::Any;

use bullet_collision::{
    AabbCachingShape, Box2dShape, CollisionShape, ConvexHullShape, ConvexInternalData, ConvexShape,
    PolyhedralConvexShape, Vec3,
};
use bullet_sdk::{
    arg, arg_or, expect_args, BindError, BindResult, ClassBinding, ClassSpec, FactorySpec,
    ForeignValue, FromForeign, IntoForeign, Lens, MemberSpec, ModuleBuilder, NativeBox, ObjectRef, ParamSpec,
    ReturnPolicy, Returned, TypeRegistry,
};

use crate::marshal::{self, native_error, owned, store_vector, VECTOR3, VECTOR3_ARRAY};

/// Storage of every shape class
pub type ShapeBox = Box<dyn CollisionShape>;

const COLLISION_SHAPE: &str = "btCollisionShape";
const CONVEX_SHAPE: &str = "btConvexShape";
const CONVEX_INTERNAL_SHAPE: &str = "btConvexInternalShape";
const POLYHEDRAL_SHAPE: &str = "btPolyhedralConvexShape";
const AABB_CACHING_SHAPE: &str = "btPolyhedralConvexAabbCachingShape";
const CONVEX_HULL_SHAPE: &str = "btConvexHullShape";
const BOX_2D_SHAPE: &str = "btBox2dShape";

fn unsupported(obj: &ObjectRef, expected: &str) -> BindError {
    BindError::mismatch(expected, obj.class().name())
}

fn shape<R>(obj: &ObjectRef, f: impl FnOnce(&dyn CollisionShape) -> R) -> BindResult<R> {
    obj.with(|s: &ShapeBox| f(&**s))
}

fn shape_mut<R>(obj: &ObjectRef, f: impl FnOnce(&mut dyn CollisionShape) -> R) -> BindResult<R> {
    obj.with_mut(|s: &mut ShapeBox| f(&mut **s))
}

fn convex<R>(obj: &ObjectRef, f: impl FnOnce(&dyn ConvexShape) -> R) -> BindResult<R> {
    obj.with(|s: &ShapeBox| s.as_convex().map(f))?
        .ok_or_else(|| unsupported(obj, CONVEX_SHAPE))
}

fn internal<R>(obj: &ObjectRef, f: impl FnOnce(&ConvexInternalData) -> R) -> BindResult<R> {
    obj.with(|s: &ShapeBox| s.as_convex_internal().map(f))?
        .ok_or_else(|| unsupported(obj, CONVEX_INTERNAL_SHAPE))
}

fn internal_mut<R>(obj: &ObjectRef, f: impl FnOnce(&mut ConvexInternalData) -> R) -> BindResult<R> {
    obj.with_mut(|s: &mut ShapeBox| s.as_convex_internal_mut().map(f))?
        .ok_or_else(|| unsupported(obj, CONVEX_INTERNAL_SHAPE))
}

fn polyhedral<R>(obj: &ObjectRef, f: impl FnOnce(&dyn PolyhedralConvexShape) -> R) -> BindResult<R> {
    obj.with(|s: &ShapeBox| s.as_polyhedral().map(f))?
        .ok_or_else(|| unsupported(obj, POLYHEDRAL_SHAPE))
}

fn aabb_caching<R>(obj: &ObjectRef, f: impl FnOnce(&dyn AabbCachingShape) -> R) -> BindResult<R> {
    obj.with(|s: &ShapeBox| s.as_aabb_caching().map(f))?
        .ok_or_else(|| unsupported(obj, AABB_CACHING_SHAPE))
}

fn aabb_caching_mut<R>(obj: &ObjectRef, f: impl FnOnce(&mut dyn AabbCachingShape) -> R) -> BindResult<R> {
    obj.with_mut(|s: &mut ShapeBox| s.as_aabb_caching_mut().map(f))?
        .ok_or_else(|| unsupported(obj, AABB_CACHING_SHAPE))
}

fn concrete<T: Any, R>(obj: &ObjectRef, expected: &str, f: impl FnOnce(&T) -> R) -> BindResult<R> {
    obj.with(|s: &ShapeBox| s.as_any().downcast_ref::<T>().map(f))?
        .ok_or_else(|| unsupported(obj, expected))
}

fn concrete_mut<T: Any, R>(obj: &ObjectRef, expected: &str, f: impl FnOnce(&mut T) -> R) -> BindResult<R> {
    obj.with_mut(|s: &mut ShapeBox| s.as_any_mut().downcast_mut::<T>().map(f))?
        .ok_or_else(|| unsupported(obj, expected))
}

fn shape_box(shape: impl CollisionShape) -> NativeBox {
    let shape: ShapeBox = Box::new(shape);
    Box::new(shape)
}

fn nothing() -> BindResult<Returned> {
    Ok(Returned::value(ForeignValue::Null))
}

/// Write an AABB into the two out-parameters at `args[at]` and `args[at + 1]`
fn store_aabb(args: &[ForeignValue], at: usize, (min, max): (Vec3, Vec3)) -> BindResult<()> {
    store_vector(&args[at], min)?;
    store_vector(&args[at + 1], max)
}

/// Register the shape hierarchy; the linear math classes must exist
pub fn export(builder: &mut ModuleBuilder) -> BindResult<()> {
    let vector = builder.class(VECTOR3)?;
    let array = builder.class(VECTOR3_ARRAY)?;
    let registry = builder.registry_mut();

    let base = register(registry, COLLISION_SHAPE, None, false)?;
    bind_collision_shape(registry, &base, &vector)?;

    let convex = register(registry, CONVEX_SHAPE, Some(&base), false)?;
    bind_convex_shape(registry, &convex, &vector, &array)?;

    let internal = register(registry, CONVEX_INTERNAL_SHAPE, Some(&convex), false)?;
    bind_convex_internal_shape(registry, &internal, &vector)?;

    let polyhedral = register(registry, POLYHEDRAL_SHAPE, Some(&internal), false)?;
    bind_polyhedral_shape(registry, &polyhedral, &vector)?;

    let caching = register(registry, AABB_CACHING_SHAPE, Some(&polyhedral), false)?;
    bind_aabb_caching_shape(registry, &caching)?;

    let hull = register(registry, CONVEX_HULL_SHAPE, Some(&caching), true)?;
    bind_convex_hull_shape(registry, &hull, &vector, &array)?;

    let box2d = register(registry, BOX_2D_SHAPE, Some(&polyhedral), true)?;
    bind_box_2d_shape(registry, &box2d, &vector)?;

    Ok(())
}

fn register(
    registry: &mut TypeRegistry,
    name: &'static str,
    base: Option<&ClassBinding>,
    instantiable: bool,
) -> BindResult<ClassBinding> {
    let mut spec = ClassSpec::<ShapeBox>::new(name).native_identity(name);
    if let Some(base) = base {
        spec = spec.base(base);
    }
    if instantiable {
        spec = spec.instantiable();
    }
    registry.register_class(spec)
}

// ============================================================================
// btCollisionShape
// ============================================================================

fn bind_collision_shape(
    registry: &mut TypeRegistry,
    class: &ClassBinding,
    vector: &ClassBinding,
) -> BindResult<()> {
    let classification: [(&str, fn(&dyn CollisionShape) -> bool); 8] = [
        ("polyhedral", |s| s.is_polyhedral()),
        ("convex2d", |s| s.is_convex_2d()),
        ("convex", |s| s.is_convex()),
        ("non_moving", |s| s.is_non_moving()),
        ("concave", |s| s.is_concave()),
        ("compound", |s| s.is_compound()),
        ("soft_body", |s| s.is_soft_body()),
        ("infinite", |s| s.is_infinite()),
    ];
    for (name, query) in classification {
        registry.bind_member(
            class,
            MemberSpec::property(name, move |obj| Ok(Returned::value(shape(obj, query)?.into_foreign()))),
        )?;
    }

    registry.bind_member(
        class,
        MemberSpec::property("shape_type", |obj| {
            Ok(Returned::value(shape(obj, |s| s.shape_type())?.into_foreign()))
        }),
    )?;
    registry.bind_member(
        class,
        MemberSpec::property("name", |obj| Ok(Returned::value(shape(obj, |s| s.name())?.into_foreign()))),
    )?;
    registry.bind_member(
        class,
        MemberSpec::property("angular_motion_disc", |obj| {
            Ok(Returned::value(shape(obj, |s| s.angular_motion_disc())?.into_foreign()))
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::property("margin", |obj| Ok(Returned::value(shape(obj, |s| s.margin())?.into_foreign())))
            .setter(|obj, value| {
                let margin = f32::from_foreign(&value)?;
                shape_mut(obj, |s| s.set_margin(margin))
            }),
    )?;

    let scaling_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::property("local_scaling", move |_| {
            Ok(Returned::reference(
                &scaling_class,
                Lens::new(
                    |any| any.downcast_ref::<ShapeBox>().map(|s| s.local_scaling() as &dyn Any),
                    |_| None,
                ),
            ))
        })
        .setter(|obj, value| {
            let scaling = marshal::vector(&value)?;
            shape_mut(obj, |s| s.set_local_scaling(scaling))
        })
        .returns(vector)
        .policy(ReturnPolicy::ConstRefCopy),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("set_local_scaling", |obj, args| {
            expect_args(args, 1)?;
            let scaling = marshal::vector(&args[0])?;
            shape_mut(obj, |s| s.set_local_scaling(scaling))?;
            nothing()
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("get_aabb", |obj, args| {
            expect_args(args, 3)?;
            let trans = marshal::transform(&args[0])?;
            let aabb = shape(obj, |s| s.aabb(&trans))?;
            store_aabb(args, 1, aabb)?;
            nothing()
        }),
    )?;

    let sphere_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("get_bounding_sphere", move |obj, args| {
            expect_args(args, 0)?;
            let (center, radius) = shape(obj, |s| s.bounding_sphere())?;
            Ok(Returned::value(ForeignValue::List(vec![
                owned(&sphere_class, center)?,
                radius.into_foreign(),
            ])))
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("get_contact_breaking_threshold", |obj, args| {
            expect_args(args, 1)?;
            let factor: f32 = arg(args, 0)?;
            Ok(Returned::value(
                shape(obj, |s| s.contact_breaking_threshold(factor))?.into_foreign(),
            ))
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("calculate_temporal_aabb", |obj, args| {
            expect_args(args, 6)?;
            let trans = marshal::transform(&args[0])?;
            let linear = marshal::vector(&args[1])?;
            let angular = marshal::vector(&args[2])?;
            let time_step: f32 = arg(args, 3)?;
            let aabb = shape(obj, |s| s.temporal_aabb(&trans, linear, angular, time_step))?;
            store_aabb(args, 4, aabb)?;
            nothing()
        }),
    )?;

    let inertia_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("calculate_local_inertia", move |obj, args| {
            expect_args(args, 1)?;
            let mass: f32 = arg(args, 0)?;
            let inertia = shape(obj, |s| s.calculate_local_inertia(mass))?;
            Ok(Returned::value(owned(&inertia_class, inertia)?))
        }),
    )?;

    let friction_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("anisotropic_rolling_friction_direction", move |obj, args| {
            expect_args(args, 0)?;
            let direction = shape(obj, |s| s.anisotropic_rolling_friction_direction())?;
            Ok(Returned::value(owned(&friction_class, direction)?))
        }),
    )?;

    Ok(())
}

// ============================================================================
// btConvexShape
// ============================================================================

fn supporting_vertex(
    vector: &ClassBinding,
    name: &str,
    support: fn(&dyn ConvexShape, Vec3) -> Vec3,
) -> MemberSpec {
    let class = vector.clone();
    MemberSpec::method(name, move |obj, args| {
        expect_args(args, 1)?;
        let dir = marshal::vector(&args[0])?;
        let vertex = convex(obj, |s| support(s, dir))?;
        Ok(Returned::value(owned(&class, vertex)?))
    })
}

fn bind_convex_shape(
    registry: &mut TypeRegistry,
    class: &ClassBinding,
    vector: &ClassBinding,
    array: &ClassBinding,
) -> BindResult<()> {
    registry.bind_member(
        class,
        supporting_vertex(vector, "local_get_supporting_vertex", |s, dir| {
            s.local_supporting_vertex_without_margin(dir)
        }),
    )?;
    registry.bind_member(
        class,
        supporting_vertex(vector, "local_get_supporting_vertex_without_margin_non_virtual", |s, dir| {
            s.local_supporting_vertex_without_margin(dir)
        }),
    )?;
    registry.bind_member(
        class,
        supporting_vertex(vector, "local_get_support_vertex_non_virtual", |s, dir| {
            s.local_supporting_vertex(dir)
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("get_margin_non_virtual", |obj, args| {
            expect_args(args, 0)?;
            Ok(Returned::value(convex(obj, |s| s.margin())?.into_foreign()))
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("get_aabb_non_virtual", |obj, args| {
            expect_args(args, 3)?;
            let trans = marshal::transform(&args[0])?;
            let aabb = convex(obj, |s| s.aabb(&trans))?;
            store_aabb(args, 1, aabb)?;
            nothing()
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("get_aabb_slow", |obj, args| {
            expect_args(args, 3)?;
            let trans = marshal::transform(&args[0])?;
            let aabb = convex(obj, |s| s.aabb_slow(&trans))?;
            store_aabb(args, 1, aabb)?;
            nothing()
        }),
    )?;

    let project_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("project", move |obj, args| {
            expect_args(args, 2)?;
            let trans = marshal::transform(&args[0])?;
            let dir = marshal::vector(&args[1])?;
            let projection = convex(obj, |s| s.project(&trans, dir))?;
            Ok(Returned::value(ForeignValue::List(vec![
                projection.min.into_foreign(),
                projection.max.into_foreign(),
                owned(&project_class, projection.witness_min)?,
                owned(&project_class, projection.witness_max)?,
            ])))
        }),
    )?;

    let batch_class = array.clone();
    registry.bind_member(
        class,
        MemberSpec::method(
            "batched_unit_vector_get_supporting_vertex_without_margin",
            move |obj, args| {
                expect_args(args, 1)?;
                let dirs = marshal::vectors(&args[0])?;
                let vertices = convex(obj, |s| s.batched_supporting_vertices_without_margin(&dirs))?;
                Ok(Returned::value(owned(&batch_class, vertices)?))
            },
        ),
    )?;

    Ok(())
}

// ============================================================================
// btConvexInternalShape
// ============================================================================

fn bind_convex_internal_shape(
    registry: &mut TypeRegistry,
    class: &ClassBinding,
    vector: &ClassBinding,
) -> BindResult<()> {
    let dimensions_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::property("implicit_shape_dimensions", move |_| {
            Ok(Returned::reference(
                &dimensions_class,
                Lens::new(
                    |any| {
                        any.downcast_ref::<ShapeBox>()
                            .and_then(|s| s.as_convex_internal())
                            .map(|i| &i.implicit_shape_dimensions as &dyn Any)
                    },
                    |any| {
                        any.downcast_mut::<ShapeBox>()
                            .and_then(|s| s.as_convex_internal_mut())
                            .map(|i| &mut i.implicit_shape_dimensions as &mut dyn Any)
                    },
                ),
            ))
        })
        .setter(|obj, value| {
            let dimensions = marshal::vector(&value)?;
            internal_mut(obj, |i| i.implicit_shape_dimensions = dimensions)
        })
        .returns(vector)
        .policy(ReturnPolicy::ConstRefCopy),
    )?;

    let scaling_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::property("local_scaling_non_virtual", move |_| {
            Ok(Returned::reference(
                &scaling_class,
                Lens::new(
                    |any| {
                        any.downcast_ref::<ShapeBox>()
                            .and_then(|s| s.as_convex_internal())
                            .map(|i| &i.local_scaling as &dyn Any)
                    },
                    |_| None,
                ),
            ))
        })
        .returns(vector)
        .policy(ReturnPolicy::ConstRefCopy),
    )?;

    registry.bind_member(
        class,
        MemberSpec::property("margin_non_virtual", |obj| {
            Ok(Returned::value(internal(obj, |i| i.collision_margin)?.into_foreign()))
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::property("num_preferred_penetration_directions", |obj| {
            let count = convex(obj, |s| s.num_preferred_penetration_directions())?;
            Ok(Returned::value(ForeignValue::try_from(count)?))
        }),
    )?;

    let direction_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("get_preferred_penetration_direction", move |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            let direction = convex(obj, |s| s.preferred_penetration_direction(index))?
                .map_err(native_error)?;
            Ok(Returned::value(owned(&direction_class, direction)?))
        }),
    )?;

    Ok(())
}

// ============================================================================
// btPolyhedralConvexShape / btPolyhedralConvexAabbCachingShape
// ============================================================================

fn bind_polyhedral_shape(
    registry: &mut TypeRegistry,
    class: &ClassBinding,
    vector: &ClassBinding,
) -> BindResult<()> {
    let counts: [(&str, fn(&dyn PolyhedralConvexShape) -> usize); 3] = [
        ("num_vertices", |s| s.num_vertices()),
        ("num_edges", |s| s.num_edges()),
        ("num_planes", |s| s.num_planes()),
    ];
    for (name, count) in counts {
        registry.bind_member(
            class,
            MemberSpec::property(name, move |obj| {
                Ok(Returned::value(ForeignValue::try_from(polyhedral(obj, count)?)?))
            }),
        )?;
    }

    let edge_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("get_edge", move |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            let (a, b) = polyhedral(obj, |s| s.edge(index))?.map_err(native_error)?;
            Ok(Returned::value(ForeignValue::List(vec![
                owned(&edge_class, a)?,
                owned(&edge_class, b)?,
            ])))
        }),
    )?;

    let vertex_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("get_vertex", move |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            let vertex = polyhedral(obj, |s| s.vertex(index))?.map_err(native_error)?;
            Ok(Returned::value(owned(&vertex_class, vertex)?))
        }),
    )?;

    let plane_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("get_plane", move |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            let (normal, support) = polyhedral(obj, |s| s.plane(index))?.map_err(native_error)?;
            Ok(Returned::value(ForeignValue::List(vec![
                owned(&plane_class, normal)?,
                owned(&plane_class, support)?,
            ])))
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("is_inside", |obj, args| {
            expect_args(args, 2)?;
            let point = marshal::vector(&args[0])?;
            let tolerance: f32 = arg(args, 1)?;
            Ok(Returned::value(polyhedral(obj, |s| s.is_inside(point, tolerance))?.into_foreign()))
        }),
    )?;

    Ok(())
}

fn bind_aabb_caching_shape(registry: &mut TypeRegistry, class: &ClassBinding) -> BindResult<()> {
    registry.bind_member(
        class,
        MemberSpec::method("get_nonvirtual_aabb", |obj, args| {
            expect_args(args, 4)?;
            let trans = marshal::transform(&args[0])?;
            let margin: f32 = arg(args, 3)?;
            let aabb = aabb_caching(obj, |s| s.nonvirtual_aabb(&trans, margin))?;
            store_aabb(args, 1, aabb)?;
            nothing()
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("recalc_local_aabb", |obj, args| {
            expect_args(args, 0)?;
            aabb_caching_mut(obj, |s| s.recalc_local_aabb())?;
            nothing()
        }),
    )?;

    Ok(())
}

// ============================================================================
// Concrete shapes
// ============================================================================

fn bind_convex_hull_shape(
    registry: &mut TypeRegistry,
    class: &ClassBinding,
    vector: &ClassBinding,
    array: &ClassBinding,
) -> BindResult<()> {
    registry.bind_factory(class, FactorySpec::new(|_| Ok(shape_box(ConvexHullShape::new()))))?;
    registry.bind_factory(
        class,
        FactorySpec::new(|args| {
            let points = marshal::vectors(&args[0])?;
            Ok(shape_box(ConvexHullShape::from_points(&points)))
        })
        .param(ParamSpec::value("points")),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("add_point", |obj, args| {
            if args.is_empty() || args.len() > 2 {
                return Err(BindError::ArgumentError(format!(
                    "add_point takes 1 or 2 arguments, got {}",
                    args.len()
                )));
            }
            let point = marshal::vector(&args[0])?;
            let recalc = arg_or(args, 1, true)?;
            concrete_mut(obj, CONVEX_HULL_SHAPE, |hull: &mut ConvexHullShape| {
                hull.add_point(point, recalc)
            })?;
            nothing()
        }),
    )?;

    let points_class = array.clone();
    registry.bind_member(
        class,
        MemberSpec::method("get_unscaled_points", move |_, args| {
            expect_args(args, 0)?;
            Ok(Returned::reference(
                &points_class,
                Lens::new(
                    |any| {
                        any.downcast_ref::<ShapeBox>()
                            .and_then(|s| s.as_any().downcast_ref::<ConvexHullShape>())
                            .map(|hull| hull.unscaled_points() as &dyn Any)
                    },
                    |any| {
                        any.downcast_mut::<ShapeBox>()
                            .and_then(|s| s.as_any_mut().downcast_mut::<ConvexHullShape>())
                            .map(|hull| hull.unscaled_points_mut() as &mut dyn Any)
                    },
                ),
            ))
        })
        .returns(array)
        .policy(ReturnPolicy::InternalRef),
    )?;

    let point_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::method("get_scaled_point", move |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            let point = concrete(obj, CONVEX_HULL_SHAPE, |hull: &ConvexHullShape| hull.scaled_point(index))?
                .map_err(native_error)?;
            Ok(Returned::value(owned(&point_class, point)?))
        }),
    )?;

    registry.bind_member(
        class,
        MemberSpec::method("get_num_points", |obj, args| {
            expect_args(args, 0)?;
            let count = concrete(obj, CONVEX_HULL_SHAPE, |hull: &ConvexHullShape| hull.num_points())?;
            Ok(Returned::value(ForeignValue::try_from(count)?))
        }),
    )?;
    registry.bind_member(
        class,
        MemberSpec::property("num_points", |obj| {
            let count = concrete(obj, CONVEX_HULL_SHAPE, |hull: &ConvexHullShape| hull.num_points())?;
            Ok(Returned::value(ForeignValue::try_from(count)?))
        }),
    )?;

    Ok(())
}

fn bind_box_2d_shape(
    registry: &mut TypeRegistry,
    class: &ClassBinding,
    vector: &ClassBinding,
) -> BindResult<()> {
    registry.bind_factory(
        class,
        FactorySpec::new(|args| {
            let half_extents = marshal::vector(&args[0])?;
            Ok(shape_box(Box2dShape::new(half_extents)))
        })
        .param(ParamSpec::reference("half_extents", vector)),
    )?;

    let with_margin_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::property("half_extents_with_margin", move |obj| {
            let extents = concrete(obj, BOX_2D_SHAPE, |b: &Box2dShape| b.half_extents_with_margin())?;
            Ok(Returned::value(owned(&with_margin_class, extents)?))
        }),
    )?;

    let without_margin_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::property("half_extents_without_margin", move |_| {
            Ok(Returned::reference(
                &without_margin_class,
                Lens::new(
                    |any| {
                        any.downcast_ref::<ShapeBox>()
                            .and_then(|s| s.as_any().downcast_ref::<Box2dShape>())
                            .map(|b| b.half_extents_without_margin() as &dyn Any)
                    },
                    |any| {
                        any.downcast_mut::<ShapeBox>()
                            .filter(|s| s.as_any().is::<Box2dShape>())
                            .and_then(|s| s.as_convex_internal_mut())
                            .map(|i| &mut i.implicit_shape_dimensions as &mut dyn Any)
                    },
                ),
            ))
        })
        .returns(vector)
        .policy(ReturnPolicy::InternalRef),
    )?;

    let centroid_class = vector.clone();
    registry.bind_member(
        class,
        MemberSpec::property("centroid", move |obj| {
            let centroid = concrete(obj, BOX_2D_SHAPE, |b: &Box2dShape| b.centroid())?;
            Ok(Returned::value(owned(&centroid_class, centroid)?))
        }),
    )?;

    Ok(())
}
