//! Exporter for the linear math value classes
//!
//! `btVector3`, `btTransform` and `btVector3Array` are copyable and compare
//! by content. They are the values every shape and dispatcher member reads
//! and returns.

use bullet_collision::linear_math::normalized_or_fallback;
use bullet_collision::{NativeError, Transform, Vec3};
use bullet_sdk::{
    arg, expect_args, BindResult, ClassBinding, ClassSpec, FactorySpec, ForeignValue, FromForeign,
    IntoForeign, Lens, MemberSpec, ModuleBuilder, NativeBox, ParamSpec, ReturnPolicy, Returned,
};

use crate::marshal::{self, native_error, owned, TRANSFORM, VECTOR3, VECTOR3_ARRAY};

/// Register the linear math classes
pub fn export(builder: &mut ModuleBuilder) -> BindResult<()> {
    let vector = export_vector(builder)?;
    export_transform(builder, &vector)?;
    export_vector_array(builder, &vector)?;
    Ok(())
}

fn export_vector(builder: &mut ModuleBuilder) -> BindResult<ClassBinding> {
    let registry = builder.registry_mut();
    let vector = registry.register_class(
        ClassSpec::<Vec3>::new(VECTOR3)
            .native_identity("btVector3")
            .instantiable()
            .copyable()
            .comparable(),
    )?;

    registry.bind_factory(&vector, FactorySpec::new(|_| Ok(Box::new(Vec3::ZERO) as NativeBox)))?;
    registry.bind_factory(
        &vector,
        FactorySpec::new(|args| {
            let x: f32 = arg(args, 0)?;
            let y: f32 = arg(args, 1)?;
            let z: f32 = arg(args, 2)?;
            Ok(Box::new(Vec3::new(x, y, z)) as NativeBox)
        })
        .param(ParamSpec::value("x"))
        .param(ParamSpec::value("y"))
        .param(ParamSpec::value("z")),
    )?;

    for (name, axis) in [("x", 0usize), ("y", 1), ("z", 2)] {
        registry.bind_member(
            &vector,
            MemberSpec::property(name, move |obj| {
                let component = obj.with(|v: &Vec3| v[axis])?;
                Ok(Returned::value(component.into_foreign()))
            })
            .setter(move |obj, value| {
                let component = f32::from_foreign(&value)?;
                obj.with_mut(|v: &mut Vec3| v[axis] = component)
            }),
        )?;
    }

    registry.bind_member(&vector, binary_op(&vector, "add", |a, b| a + b))?;
    registry.bind_member(&vector, binary_op(&vector, "sub", |a, b| a - b))?;
    registry.bind_member(&vector, binary_op(&vector, "cross", Vec3::cross))?;

    let class = vector.clone();
    registry.bind_member(
        &vector,
        MemberSpec::method("mul", move |obj, args| {
            expect_args(args, 1)?;
            let factor = match args[0].as_float() {
                Some(scalar) => Vec3::splat(scalar as f32),
                None => marshal::vector(&args[0])?,
            };
            let product = obj.with(|v: &Vec3| *v * factor)?;
            Ok(Returned::value(owned(&class, product)?))
        }),
    )?;

    registry.bind_member(
        &vector,
        MemberSpec::method("dot", |obj, args| {
            expect_args(args, 1)?;
            let other = marshal::vector(&args[0])?;
            let dot = obj.with(|v: &Vec3| v.dot(other))?;
            Ok(Returned::value(dot.into_foreign()))
        }),
    )?;
    registry.bind_member(
        &vector,
        MemberSpec::method("length", |obj, args| {
            expect_args(args, 0)?;
            Ok(Returned::value(obj.with(|v: &Vec3| v.length())?.into_foreign()))
        }),
    )?;

    let class = vector.clone();
    registry.bind_member(
        &vector,
        MemberSpec::method("normalized", move |obj, args| {
            expect_args(args, 0)?;
            let unit = obj.with(|v: &Vec3| normalized_or_fallback(*v))?;
            Ok(Returned::value(owned(&class, unit)?))
        }),
    )?;

    Ok(vector)
}

fn binary_op(class: &ClassBinding, name: &str, op: fn(Vec3, Vec3) -> Vec3) -> MemberSpec {
    let class = class.clone();
    MemberSpec::method(name, move |obj, args| {
        expect_args(args, 1)?;
        let rhs = marshal::vector(&args[0])?;
        let result = obj.with(|lhs: &Vec3| op(*lhs, rhs))?;
        Ok(Returned::value(owned(&class, result)?))
    })
}

fn export_transform(builder: &mut ModuleBuilder, vector: &ClassBinding) -> BindResult<()> {
    let registry = builder.registry_mut();
    let transform = registry.register_class(
        ClassSpec::<Transform>::new(TRANSFORM)
            .native_identity("btTransform")
            .instantiable()
            .copyable()
            .comparable(),
    )?;

    registry.bind_factory(
        &transform,
        FactorySpec::new(|_| Ok(Box::new(Transform::IDENTITY) as NativeBox)),
    )?;
    registry.bind_factory(
        &transform,
        FactorySpec::new(|args| {
            let origin = marshal::vector(&args[0])?;
            Ok(Box::new(Transform::from_translation(origin)) as NativeBox)
        })
        .param(ParamSpec::reference("origin", vector)),
    )?;

    let class = vector.clone();
    registry.bind_member(
        &transform,
        MemberSpec::property("origin", move |_| {
            Ok(Returned::reference(
                &class,
                Lens::field::<Transform, Vec3>(|t| &t.origin, |t| &mut t.origin),
            ))
        })
        .setter(|obj, value| {
            let origin = marshal::vector(&value)?;
            obj.with_mut(|t: &mut Transform| t.origin = origin)
        })
        .returns(vector)
        .policy(ReturnPolicy::ConstRefCopy),
    )?;

    registry.bind_member(
        &transform,
        MemberSpec::method("set_identity", |obj, args| {
            expect_args(args, 0)?;
            obj.with_mut(|t: &mut Transform| *t = Transform::IDENTITY)?;
            Ok(Returned::value(().into_foreign()))
        }),
    )?;

    let class = transform.clone();
    registry.bind_member(
        &transform,
        MemberSpec::method("inverse", move |obj, args| {
            expect_args(args, 0)?;
            let inverse = obj.with(|t: &Transform| t.inverse())?;
            Ok(Returned::value(owned(&class, inverse)?))
        }),
    )?;

    let class = transform.clone();
    registry.bind_member(
        &transform,
        MemberSpec::method("mul", move |obj, args| {
            expect_args(args, 1)?;
            let other = marshal::transform(&args[0])?;
            let product = obj.with(|t: &Transform| t.mul_transform(&other))?;
            Ok(Returned::value(owned(&class, product)?))
        }),
    )?;

    let class = vector.clone();
    registry.bind_member(
        &transform,
        MemberSpec::method("apply", move |obj, args| {
            expect_args(args, 1)?;
            let point = marshal::vector(&args[0])?;
            let moved = obj.with(|t: &Transform| t.apply(point))?;
            Ok(Returned::value(owned(&class, moved)?))
        }),
    )?;

    // A fresh instance per call; a shared constant would carry writes
    builder.function("identity", move |args| {
        expect_args(args, 0)?;
        owned(&transform, Transform::IDENTITY)
    })
}

fn export_vector_array(builder: &mut ModuleBuilder, vector: &ClassBinding) -> BindResult<()> {
    let registry = builder.registry_mut();
    let array = registry.register_class(
        ClassSpec::<Vec<Vec3>>::new(VECTOR3_ARRAY)
            .native_identity("btAlignedObjectArray<btVector3>")
            .instantiable()
            .copyable()
            .comparable(),
    )?;

    registry.bind_factory(&array, FactorySpec::new(|_| Ok(Box::new(Vec::<Vec3>::new()) as NativeBox)))?;
    registry.bind_factory(
        &array,
        FactorySpec::new(|args| Ok(Box::new(marshal::vectors(&args[0])?) as NativeBox))
            .param(ParamSpec::value("points")),
    )?;

    registry.bind_member(
        &array,
        MemberSpec::method("append", |obj, args| {
            expect_args(args, 1)?;
            let point = marshal::vector(&args[0])?;
            obj.with_mut(|points: &mut Vec<Vec3>| points.push(point))?;
            Ok(Returned::value(().into_foreign()))
        }),
    )?;
    registry.bind_member(
        &array,
        MemberSpec::method("len", |obj, args| {
            expect_args(args, 0)?;
            let len = obj.with(|points: &Vec<Vec3>| points.len())?;
            Ok(Returned::value(ForeignValue::try_from(len)?))
        }),
    )?;
    registry.bind_member(
        &array,
        MemberSpec::method("clear", |obj, args| {
            expect_args(args, 0)?;
            obj.with_mut(|points: &mut Vec<Vec3>| points.clear())?;
            Ok(Returned::value(().into_foreign()))
        }),
    )?;

    let class = vector.clone();
    registry.bind_member(
        &array,
        MemberSpec::method("get", move |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            let len = obj.with(|points: &Vec<Vec3>| points.len())?;
            NativeError::check_index(index, len).map_err(native_error)?;
            Ok(Returned::reference(&class, Lens::element::<Vec3>(index)))
        })
        .returns(vector)
        .policy(ReturnPolicy::InternalRef),
    )?;

    registry.bind_member(
        &array,
        MemberSpec::method("set", |obj, args| {
            expect_args(args, 2)?;
            let index: usize = arg(args, 0)?;
            let point = marshal::vector(&args[1])?;
            obj.with_mut(|points: &mut Vec<Vec3>| match points.get_mut(index) {
                Some(slot) => {
                    *slot = point;
                    Ok(())
                }
                None => Err(NativeError::IndexOutOfRange {
                    index,
                    len: points.len(),
                }),
            })?
            .map_err(native_error)?;
            Ok(Returned::value(().into_foreign()))
        }),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bullet_sdk::{BindError, ForeignModule, ForeignValue, ObjectRef};

    fn module() -> ForeignModule {
        let mut builder = ModuleBuilder::new("linear_math", "0.1.0");
        export(&mut builder).unwrap();
        builder.build().unwrap()
    }

    fn vec3(module: &ForeignModule, x: f64, y: f64, z: f64) -> ObjectRef {
        module
            .construct(
                VECTOR3,
                &[ForeignValue::Float(x), ForeignValue::Float(y), ForeignValue::Float(z)],
            )
            .unwrap()
    }

    #[test]
    fn test_vector_components() {
        let module = module();
        let v = vec3(&module, 1.0, 2.0, 3.0);
        assert_eq!(v.get("y").unwrap(), ForeignValue::Float(2.0));
        v.set("z", ForeignValue::Int(9)).unwrap();
        assert_eq!(v.with(|v: &Vec3| *v).unwrap(), Vec3::new(1.0, 2.0, 9.0));

        let zero = module.construct(VECTOR3, &[]).unwrap();
        assert_eq!(zero.with(|v: &Vec3| *v).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_vector_arithmetic() {
        let module = module();
        let a = vec3(&module, 1.0, 1.0, 1.0);
        let b = vec3(&module, 0.04, 0.04, 0.04);

        let diff = a.call("sub", &[b.clone().into()]).unwrap();
        assert!(marshal::vector(&diff).unwrap().abs_diff_eq(Vec3::splat(0.96), 1e-6));
        let doubled = b.call("mul", &[ForeignValue::Int(2)]).unwrap();
        assert!(marshal::vector(&doubled).unwrap().abs_diff_eq(Vec3::splat(0.08), 1e-6));
        let scaled = a.call("mul", &[vec3(&module, 2.0, 3.0, 4.0).into()]).unwrap();
        assert_eq!(marshal::vector(&scaled).unwrap(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(a.call("dot", &[a.clone().into()]).unwrap(), ForeignValue::Float(3.0));
        assert!(matches!(
            a.call("add", &[ForeignValue::Int(1)]),
            Err(BindError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_vectors_compare_by_content() {
        let module = module();
        let a = ForeignValue::Object(vec3(&module, 1.0, -1.0, 0.5));
        let b = ForeignValue::Object(vec3(&module, 1.0, -1.0, 0.5));
        let c = ForeignValue::Object(vec3(&module, 1.0, -1.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_transform_origin_is_copied_out() {
        let module = module();
        let t = module
            .construct(TRANSFORM, &[vec3(&module, 1.0, 2.0, 3.0).into()])
            .unwrap();
        let origin = t.get("origin").unwrap();
        t.set("origin", vec3(&module, 0.0, 0.0, 0.0).into()).unwrap();

        assert_eq!(marshal::vector(&origin).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        let moved = t.call("apply", &[vec3(&module, 1.0, 0.0, 0.0).into()]).unwrap();
        assert_eq!(marshal::vector(&moved).unwrap(), Vec3::X);
    }

    #[test]
    fn test_transform_inverse_and_identity() {
        let module = module();
        let t = module
            .construct(TRANSFORM, &[vec3(&module, 1.0, 2.0, 3.0).into()])
            .unwrap();
        let inverse = t.call("inverse", &[]).unwrap();
        let product = t.call("mul", &[inverse]).unwrap();
        assert_eq!(marshal::transform(&product).unwrap(), Transform::IDENTITY);

        t.call("set_identity", &[]).unwrap();
        let identity = module.construct(TRANSFORM, &[]).unwrap();
        assert!(t.equals(&identity).unwrap());
    }

    #[test]
    fn test_identity_function_returns_fresh_transforms() {
        let module = module();
        let first = module.call("identity", &[]).unwrap();
        assert_eq!(marshal::transform(&first).unwrap(), Transform::IDENTITY);

        let first = first.as_object().unwrap().clone();
        first
            .set("origin", vec3(&module, 4.0, 5.0, 6.0).into())
            .unwrap();
        let second = module.call("identity", &[]).unwrap();
        assert_eq!(marshal::transform(&second).unwrap(), Transform::IDENTITY);
        assert!(matches!(
            module.call("identity", &[ForeignValue::Int(1)]),
            Err(BindError::ArgumentError(_))
        ));
    }

    #[test]
    fn test_array_elements_alias_the_array() {
        let module = module();
        let array = module.construct(VECTOR3_ARRAY, &[]).unwrap();
        array.call("append", &[vec3(&module, 1.0, 0.0, 0.0).into()]).unwrap();
        array.call("append", &[vec3(&module, 0.0, 1.0, 0.0).into()]).unwrap();
        assert_eq!(array.call("len", &[]).unwrap(), ForeignValue::Int(2));

        let second = array.call("get", &[ForeignValue::Int(1)]).unwrap();
        let second = second.as_object().unwrap();
        assert!(second.is_borrowed());
        second.set("z", ForeignValue::Float(5.0)).unwrap();
        assert_eq!(
            array.with(|points: &Vec<Vec3>| points[1]).unwrap(),
            Vec3::new(0.0, 1.0, 5.0)
        );

        assert!(matches!(
            array.call("get", &[ForeignValue::Int(2)]),
            Err(BindError::ArgumentError(_))
        ));
        array.call("clear", &[]).unwrap();
        assert!(matches!(second.get("x"), Err(BindError::StaleReference { .. })));
    }

    #[test]
    fn test_array_from_list_and_set() {
        let module = module();
        let list = ForeignValue::List(vec![vec3(&module, 1.0, 1.0, 1.0).into()]);
        let array = module.construct(VECTOR3_ARRAY, &[list]).unwrap();
        array
            .call("set", &[ForeignValue::Int(0), vec3(&module, 2.0, 2.0, 2.0).into()])
            .unwrap();
        assert_eq!(array.with(|p: &Vec<Vec3>| p.clone()).unwrap(), vec![Vec3::splat(2.0)]);
        assert!(array
            .call("set", &[ForeignValue::Int(4), vec3(&module, 0.0, 0.0, 0.0).into()])
            .is_err());
    }
}
