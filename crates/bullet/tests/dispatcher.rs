//! Dispatcher construction and flag scenarios

use bullet::{assemble, ModuleOptions};
use bullet_sdk::{BindError, ForeignModule, ForeignValue};

fn module() -> ForeignModule {
    let _ = env_logger::builder().is_test(true).try_init();
    assemble(&ModuleOptions::default()).unwrap()
}

fn flag(module: &ForeignModule, name: &str) -> bullet_sdk::EnumValue {
    module.constant(name).unwrap().as_enum().unwrap().clone()
}

#[test]
fn test_dispatcher_from_live_configuration() {
    let module = module();
    let config = module.construct("btDefaultCollisionConfiguration", &[]).unwrap();
    let dispatcher = module
        .construct("btCollisionDispatcher", &[config.clone().into()])
        .unwrap();

    assert!(dispatcher.is_instance(module.class("btDispatcher").unwrap()));
    assert!(config.is_instance(module.class("btCollisionConfiguration").unwrap()));
    assert_eq!(dispatcher.get("num_manifolds").unwrap(), ForeignValue::Int(0));
    assert_eq!(dispatcher.get("pool_capacity").unwrap(), ForeignValue::Int(4096));
}

#[test]
fn test_dispatcher_rejects_wrong_configuration_type() {
    let module = module();
    let vector = module.construct("btVector3", &[]).unwrap();
    assert!(matches!(
        module.construct("btCollisionDispatcher", &[vector.into()]),
        Err(BindError::TypeMismatch { .. })
    ));
    assert!(matches!(
        module.construct("btCollisionDispatcher", &[]),
        Err(BindError::ArgumentError(_))
    ));
}

#[test]
fn test_oversized_pool_is_allocation_failure() {
    let module = module();
    let config = module
        .construct(
            "btDefaultCollisionConfiguration",
            &[ForeignValue::Int(i64::MAX), ForeignValue::Int(1)],
        )
        .unwrap();
    assert!(matches!(
        module.construct("btCollisionDispatcher", &[config.into()]),
        Err(BindError::AllocationFailure(_))
    ));
}

#[test]
fn test_pool_size_from_options() {
    let mut options = ModuleOptions::default();
    options.collision.manifold_pool_size = 32;
    let module = assemble(&options).unwrap();
    let config = module.construct("btDefaultCollisionConfiguration", &[]).unwrap();
    let dispatcher = module.construct("btCollisionDispatcher", &[config.into()]).unwrap();
    assert_eq!(dispatcher.get("pool_capacity").unwrap(), ForeignValue::Int(32));
}

#[test]
fn test_flags_round_trip_through_constants() {
    let module = module();
    let config = module.construct("btDefaultCollisionConfiguration", &[]).unwrap();
    let dispatcher = module.construct("btCollisionDispatcher", &[config.into()]).unwrap();

    let reported = flag(&module, "CD_STATIC_STATIC_REPORTED");
    let no_growth = flag(&module, "CD_DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION");
    let combined = reported.combine(&no_growth).unwrap();
    assert_eq!(combined.bits(), 5);
    assert_eq!(combined.label(), None);

    dispatcher.set("flags", combined.clone().into()).unwrap();
    let flags = dispatcher.get("flags").unwrap();
    let flags = flags.as_enum().unwrap();
    assert_eq!(flags, &combined);
    assert!(flags.contains(&reported));
    assert!(!flags.contains(&flag(&module, "CD_USE_RELATIVE_CONTACT_BREAKING_THRESHOLD")));
    assert_eq!(flags.flags().len(), 2);
}

#[test]
fn test_flags_reject_foreign_enum() {
    let mut builder = bullet_sdk::ModuleBuilder::new("other", "1.0.0");
    let other = builder
        .registry_mut()
        .export_enum(bullet_sdk::EnumSpec::new("Other").value("ONE", 1).bitflag())
        .unwrap();

    let module = module();
    let config = module.construct("btDefaultCollisionConfiguration", &[]).unwrap();
    let dispatcher = module.construct("btCollisionDispatcher", &[config.into()]).unwrap();
    assert!(matches!(
        dispatcher.set("flags", other.from_bits(1).into()),
        Err(BindError::TypeMismatch { .. })
    ));
}

#[test]
fn test_flag_constants_in_declaration_order() {
    let module = module();
    let names: Vec<&str> = module.constant_names().collect();
    assert_eq!(
        names,
        vec![
            "CD_STATIC_STATIC_REPORTED",
            "CD_USE_RELATIVE_CONTACT_BREAKING_THRESHOLD",
            "CD_DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION",
        ]
    );
    let binding = module.enumeration("DispatcherFlags").unwrap();
    assert!(binding.is_bitflag());
    assert_eq!(
        module.constant("CD_USE_RELATIVE_CONTACT_BREAKING_THRESHOLD"),
        Some(&ForeignValue::from(binding.from_bits(2)))
    );
}
