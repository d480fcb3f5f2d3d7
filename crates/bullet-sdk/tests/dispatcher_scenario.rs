//! Dispatcher binding scenario built against the SDK alone
//!
//! Registers a flag enum, an abstract dispatcher base, a concrete
//! dispatcher with a configuration-taking factory and a read-write flag
//! property, then drives it the way a script would.

use bullet_sdk::{
    arg, BindError, ClassBinding, EnumValue, FactorySpec, ForeignModule, ForeignValue,
    MemberSpec, ModuleBuilder, NativeBox, ObjectRef, ParamSpec, Returned,
};

struct Configuration {
    pool_size: usize,
}

struct Dispatcher {
    flags: i64,
    pool: Vec<u64>,
}

fn build() -> ForeignModule {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut builder = ModuleBuilder::new("scenario", "0.1.0");
    let registry = builder.registry_mut();

    let flags = registry
        .export_enum(
            bullet_sdk::EnumSpec::new("DispatcherFlags")
                .value("STATIC_STATIC_REPORTED", 1)
                .value("RELATIVE_CONTACT_BREAKING", 2)
                .value("DISABLE_CONTACTPOOL_ALLOC", 4)
                .bitflag()
                .export_values(),
        )
        .unwrap();

    let configuration = registry
        .register_class(bullet_sdk::ClassSpec::<Configuration>::new("CollisionConfiguration").instantiable())
        .unwrap();
    registry
        .bind_factory(
            &configuration,
            FactorySpec::new(|_| Ok(Box::new(Configuration { pool_size: 16 }) as NativeBox)),
        )
        .unwrap();

    let base = registry
        .register_class(bullet_sdk::ClassSpec::<Dispatcher>::new("Dispatcher"))
        .unwrap();
    let dispatcher = registry
        .register_class(
            bullet_sdk::ClassSpec::<Dispatcher>::new("CollisionDispatcher")
                .base(&base)
                .instantiable(),
        )
        .unwrap();

    registry
        .bind_factory(
            &dispatcher,
            FactorySpec::new(|args| {
                let config: ObjectRef = arg(args, 0)?;
                let pool_size = config.with(|c: &Configuration| c.pool_size)?;
                let mut pool = Vec::new();
                pool.try_reserve(pool_size).map_err(bullet_sdk::allocation_failure)?;
                Ok(Box::new(Dispatcher { flags: 2, pool }) as NativeBox)
            })
            .param(ParamSpec::reference("configuration", &configuration)),
        )
        .unwrap();

    let read_flags = flags.clone();
    registry
        .bind_member(
            &dispatcher,
            MemberSpec::property("flags", move |obj| {
                let bits = obj.with(|d: &Dispatcher| d.flags)?;
                Ok(Returned::value(read_flags.from_bits(bits)))
            })
            .setter(|obj, value| {
                let flags: EnumValue = bullet_sdk::FromForeign::from_foreign(&value)?;
                obj.with_mut(|d: &mut Dispatcher| d.flags = flags.bits())
            }),
        )
        .unwrap();
    registry
        .bind_member(
            &base,
            MemberSpec::property("pool_capacity", |obj| {
                let capacity = obj.with(|d: &Dispatcher| d.pool.capacity())?;
                Ok(Returned::value(ForeignValue::Int(capacity as i64)))
            }),
        )
        .unwrap();

    builder.build().unwrap()
}

fn class<'a>(module: &'a ForeignModule, name: &str) -> &'a ClassBinding {
    module.class(name).unwrap()
}

fn constant(module: &ForeignModule, name: &str) -> EnumValue {
    module.constant(name).unwrap().as_enum().unwrap().clone()
}

#[test]
fn test_flags_round_trip_bit_for_bit() {
    let module = build();
    let config = module.construct("CollisionConfiguration", &[]).unwrap();
    let dispatcher = module
        .construct("CollisionDispatcher", &[config.into()])
        .unwrap();

    let written = constant(&module, "STATIC_STATIC_REPORTED")
        .combine(&constant(&module, "DISABLE_CONTACTPOOL_ALLOC"))
        .unwrap();
    dispatcher.set("flags", written.clone().into()).unwrap();

    let read = dispatcher.get("flags").unwrap();
    let read = read.as_enum().unwrap();
    assert_eq!(read.bits(), 5);
    assert_eq!(*read, written);
    assert_eq!(
        read.flags(),
        vec![
            constant(&module, "STATIC_STATIC_REPORTED"),
            constant(&module, "DISABLE_CONTACTPOOL_ALLOC")
        ]
    );
    assert!(!read.contains(&constant(&module, "RELATIVE_CONTACT_BREAKING")));
}

#[test]
fn test_dispatcher_is_a_base() {
    let module = build();
    let config = module.construct("CollisionConfiguration", &[]).unwrap();
    let dispatcher = module.construct("CollisionDispatcher", &[config.into()]).unwrap();

    assert!(dispatcher.is_instance(class(&module, "Dispatcher")));
    assert!(dispatcher.is_instance(class(&module, "CollisionDispatcher")));
    assert!(!dispatcher.is_instance(class(&module, "CollisionConfiguration")));
    assert!(dispatcher.get("pool_capacity").unwrap().as_int().unwrap() >= 16);
}

#[test]
fn test_abstract_base_cannot_be_constructed() {
    let module = build();
    assert_eq!(
        module.construct("Dispatcher", &[]).unwrap_err(),
        BindError::AbstractInstantiation {
            class: "Dispatcher".to_string()
        }
    );
}

#[test]
fn test_non_configuration_argument_rejected() {
    let module = build();
    let config = module.construct("CollisionConfiguration", &[]).unwrap();
    let dispatcher = module.construct("CollisionDispatcher", &[config.into()]).unwrap();

    let err = module
        .construct("CollisionDispatcher", &[dispatcher.into()])
        .unwrap_err();
    assert_eq!(err, BindError::mismatch("CollisionConfiguration", "CollisionDispatcher"));

    let err = module
        .construct("CollisionDispatcher", &[ForeignValue::Int(1)])
        .unwrap_err();
    assert!(matches!(err, BindError::TypeMismatch { .. }));
}

#[test]
fn test_configuration_not_taken_over() {
    let module = build();
    let config = module.construct("CollisionConfiguration", &[]).unwrap();
    let watcher = config.downgrade();
    let dispatcher = module
        .construct("CollisionDispatcher", &[config.clone().into()])
        .unwrap();

    assert_eq!(class(&module, "CollisionConfiguration").live_instances(), 1);
    drop(config);
    assert!(!watcher.is_alive());
    assert_eq!(class(&module, "CollisionConfiguration").live_instances(), 0);
    assert_eq!(class(&module, "CollisionDispatcher").live_instances(), 1);
    drop(dispatcher);
    assert_eq!(class(&module, "CollisionDispatcher").live_instances(), 0);
}

#[test]
fn test_flag_constants_exported_at_module_scope() {
    let module = build();
    let names: Vec<&str> = module.constant_names().collect();
    assert_eq!(
        names,
        vec![
            "STATIC_STATIC_REPORTED",
            "RELATIVE_CONTACT_BREAKING",
            "DISABLE_CONTACTPOOL_ALLOC"
        ]
    );
}
