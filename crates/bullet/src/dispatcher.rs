//! Exporter for collision configuration and dispatch
//!
//! Configurations and dispatchers are held behind their native trait
//! objects, so the abstract bases (`btCollisionConfiguration`,
//! `btDispatcher`) share storage with their concrete classes and bind the
//! members every implementation has.

use bullet_collision::{
    CollisionConfiguration, CollisionDispatcher, DefaultCollisionConfiguration,
    DefaultCollisionConstructionInfo, Dispatcher, DispatcherFlags,
};
use bullet_sdk::{
    arg, expect_args, BindError, BindResult, ClassSpec, EnumBinding, EnumSpec, FactorySpec, ForeignValue,
    IntoForeign, MemberSpec, ModuleBuilder, NativeBox, ObjectRef, ParamSpec, Returned,
};

use crate::config::CollisionOptions;
use crate::marshal::native_error;

/// Storage of every configuration class
pub type ConfigurationBox = Box<dyn CollisionConfiguration>;
/// Storage of every dispatcher class
pub type DispatcherBox = Box<dyn Dispatcher>;

/// Foreign name of the dispatcher flag enum
pub const DISPATCHER_FLAGS: &str = "DispatcherFlags";

/// Register the flag enum, configurations and dispatchers
pub fn export(builder: &mut ModuleBuilder, options: &CollisionOptions) -> BindResult<()> {
    let flags = builder.registry_mut().export_enum(
        EnumSpec::new(DISPATCHER_FLAGS)
            .value(
                "CD_STATIC_STATIC_REPORTED",
                DispatcherFlags::STATIC_STATIC_REPORTED.bits() as i64,
            )
            .value(
                "CD_USE_RELATIVE_CONTACT_BREAKING_THRESHOLD",
                DispatcherFlags::USE_RELATIVE_CONTACT_BREAKING_THRESHOLD.bits() as i64,
            )
            .value(
                "CD_DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION",
                DispatcherFlags::DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION.bits() as i64,
            )
            .bitflag()
            .export_values(),
    )?;

    export_configurations(builder, options.construction_info())?;
    export_dispatchers(builder, flags)
}

fn export_configurations(
    builder: &mut ModuleBuilder,
    defaults: DefaultCollisionConstructionInfo,
) -> BindResult<()> {
    let registry = builder.registry_mut();
    let base = registry.register_class(
        ClassSpec::<ConfigurationBox>::new("btCollisionConfiguration")
            .native_identity("btCollisionConfiguration"),
    )?;
    let default = registry.register_class(
        ClassSpec::<ConfigurationBox>::new("btDefaultCollisionConfiguration")
            .native_identity("btDefaultCollisionConfiguration")
            .base(&base)
            .instantiable(),
    )?;

    registry.bind_factory(
        &default,
        FactorySpec::new(move |_| {
            let config: ConfigurationBox = Box::new(DefaultCollisionConfiguration::new(defaults.clone()));
            Ok(Box::new(config) as NativeBox)
        }),
    )?;
    registry.bind_factory(
        &default,
        FactorySpec::new(|args| {
            let info = DefaultCollisionConstructionInfo {
                default_max_persistent_manifold_pool_size: arg(args, 0)?,
                default_max_collision_algorithm_pool_size: arg(args, 1)?,
                ..Default::default()
            };
            let config: ConfigurationBox = Box::new(DefaultCollisionConfiguration::new(info));
            Ok(Box::new(config) as NativeBox)
        })
        .param(ParamSpec::value("manifold_pool_size"))
        .param(ParamSpec::value("algorithm_pool_size")),
    )?;

    registry.bind_member(
        &base,
        MemberSpec::property("persistent_manifold_pool_size", |obj| {
            let size = obj.with(|c: &ConfigurationBox| c.persistent_manifold_pool_size())?;
            Ok(Returned::value(ForeignValue::try_from(size)?))
        }),
    )?;
    registry.bind_member(
        &base,
        MemberSpec::property("collision_algorithm_pool_size", |obj| {
            let size = obj.with(|c: &ConfigurationBox| c.collision_algorithm_pool_size())?;
            Ok(Returned::value(ForeignValue::try_from(size)?))
        }),
    )?;
    registry.bind_member(
        &default,
        MemberSpec::property("use_epa_penetration_algorithm", |obj| {
            let epa = obj
                .with(|c: &ConfigurationBox| {
                    c.as_any()
                        .downcast_ref::<DefaultCollisionConfiguration>()
                        .map(|d| d.info().use_epa_penetration_algorithm)
                })?
                .ok_or_else(|| BindError::mismatch("btDefaultCollisionConfiguration", obj.class().name()))?;
            Ok(Returned::value(epa.into_foreign()))
        }),
    )?;

    Ok(())
}

fn with_dispatcher<R>(obj: &ObjectRef, f: impl FnOnce(&CollisionDispatcher) -> R) -> BindResult<R> {
    obj.with(|d: &DispatcherBox| d.as_any().downcast_ref::<CollisionDispatcher>().map(f))?
        .ok_or_else(|| BindError::mismatch("btCollisionDispatcher", obj.class().name()))
}

fn with_dispatcher_mut<R>(
    obj: &ObjectRef,
    f: impl FnOnce(&mut CollisionDispatcher) -> R,
) -> BindResult<R> {
    obj.with_mut(|d: &mut DispatcherBox| d.as_any_mut().downcast_mut::<CollisionDispatcher>().map(f))?
        .ok_or_else(|| BindError::mismatch("btCollisionDispatcher", obj.class().name()))
}

/// Accept a `DispatcherFlags` value or a plain integer; unknown bits are rejected
fn dispatcher_flags(flags: &EnumBinding, value: &ForeignValue) -> BindResult<DispatcherFlags> {
    let bits = match value {
        ForeignValue::Enum(e) if e.binding().same_as(flags) => e.bits(),
        ForeignValue::Int(bits) => *bits,
        other => return Err(BindError::mismatch(flags.name(), other.type_name())),
    };
    i32::try_from(bits)
        .ok()
        .and_then(DispatcherFlags::from_bits)
        .ok_or_else(|| BindError::ArgumentError(format!("{:#x} is not a valid {}", bits, flags.name())))
}

fn export_dispatchers(builder: &mut ModuleBuilder, flags: EnumBinding) -> BindResult<()> {
    let configuration = builder.class("btCollisionConfiguration")?;
    let registry = builder.registry_mut();
    let base = registry.register_class(
        ClassSpec::<DispatcherBox>::new("btDispatcher").native_identity("btDispatcher"),
    )?;
    let dispatcher = registry.register_class(
        ClassSpec::<DispatcherBox>::new("btCollisionDispatcher")
            .native_identity("btCollisionDispatcher")
            .base(&base)
            .instantiable(),
    )?;

    registry.bind_factory(
        &dispatcher,
        FactorySpec::new(|args| {
            let config: ObjectRef = arg(args, 0)?;
            let native = config
                .with(|c: &ConfigurationBox| CollisionDispatcher::new(&**c))?
                .map_err(native_error)?;
            let native: DispatcherBox = Box::new(native);
            Ok(Box::new(native) as NativeBox)
        })
        .param(ParamSpec::reference("configuration", &configuration)),
    )?;

    registry.bind_member(
        &base,
        MemberSpec::property("num_manifolds", |obj| {
            let count = obj.with(|d: &DispatcherBox| d.num_manifolds())?;
            Ok(Returned::value(ForeignValue::try_from(count)?))
        }),
    )?;

    registry.bind_member(
        &base,
        MemberSpec::method("get_manifold", |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            let manifold = obj
                .with(|d: &DispatcherBox| d.manifold(index).cloned())?
                .map_err(native_error)?;
            Ok(Returned::value(ForeignValue::List(vec![
                ForeignValue::try_from(manifold.body0)?,
                ForeignValue::try_from(manifold.body1)?,
                manifold.contact_breaking_threshold.into_foreign(),
            ])))
        }),
    )?;

    registry.bind_member(
        &dispatcher,
        MemberSpec::method("get_new_manifold", |obj, args| {
            expect_args(args, 3)?;
            let body0: usize = arg(args, 0)?;
            let body1: usize = arg(args, 1)?;
            let threshold: f32 = arg(args, 2)?;
            let index = with_dispatcher_mut(obj, |d| d.new_manifold(body0, body1, threshold))?
                .map_err(native_error)?;
            Ok(Returned::value(ForeignValue::try_from(index)?))
        }),
    )?;
    registry.bind_member(
        &dispatcher,
        MemberSpec::method("release_manifold", |obj, args| {
            expect_args(args, 1)?;
            let index: usize = arg(args, 0)?;
            with_dispatcher_mut(obj, |d| d.release_manifold(index))?.map_err(native_error)?;
            Ok(Returned::value(ForeignValue::Null))
        }),
    )?;

    let read_flags = flags.clone();
    registry.bind_member(
        &dispatcher,
        MemberSpec::property("flags", move |obj| {
            let bits = with_dispatcher(obj, |d| d.flags().bits())?;
            Ok(Returned::value(read_flags.from_bits(bits as i64)))
        })
        .setter(move |obj, value| {
            let native = dispatcher_flags(&flags, &value)?;
            with_dispatcher_mut(obj, |d| d.set_flags(native))
        }),
    )?;
    registry.bind_member(
        &dispatcher,
        MemberSpec::property("pool_capacity", |obj| {
            let capacity = with_dispatcher(obj, |d| d.pool_capacity())?;
            Ok(Returned::value(ForeignValue::try_from(capacity)?))
        }),
    )?;

    Ok(())
}
