//! Bullet - the `bullet` module for an embedding runtime
//!
//! Assembles the collision classes of `bullet-collision` into a foreign
//! module using the `bullet-sdk` binding layer:
//! - **Linear math**: `btVector3`, `btTransform`, `btVector3Array`
//! - **Shapes**: the convex shape hierarchy down to `btConvexHullShape` and
//!   `btBox2dShape`
//! - **Dispatch**: `DispatcherFlags`, collision configurations and
//!   `btCollisionDispatcher`
//!
//! The process-wide module is populated once by [`initialize`]; a second
//! call fails and leaves the first module in place. [`assemble`] builds an
//! independent module for embedders that need more than one.
//!
//! # Example
//!
//! ```ignore
//! let module = bullet::initialize()?;
//! let config = module.construct("btDefaultCollisionConfiguration", &[])?;
//! let dispatcher = module.construct("btCollisionDispatcher", &[config.into()])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use std::sync::OnceLock;

use bullet_sdk::{BindError, BindResult, ForeignModule, ForeignValue, ModuleBuilder};

/// Module options (bullet.toml)
pub mod config;

/// Configuration and dispatcher exporter
pub mod dispatcher;

/// Linear math exporter
pub mod linear_math;

/// Argument and result marshalling
pub mod marshal;

/// Shape hierarchy exporter
pub mod shapes;

pub use config::{CollisionOptions, ModuleInfo, ModuleOptions, OptionsError};

static MODULE: OnceLock<ForeignModule> = OnceLock::new();

/// Build a module from `options`, independent of the process-wide one
pub fn assemble(options: &ModuleOptions) -> BindResult<ForeignModule> {
    options
        .validate()
        .map_err(|e| BindError::ArgumentError(e.to_string()))?;

    let mut builder = ModuleBuilder::new(options.module.name.as_str(), options.module.version.as_str())
        .export_enum_values(options.module.export_values);

    builder.function("hello_world", |args| {
        bullet_sdk::expect_args(args, 0)?;
        Ok(ForeignValue::Str("Hello world".to_string()))
    })?;

    linear_math::export(&mut builder)?;
    dispatcher::export(&mut builder, &options.collision)?;
    shapes::export(&mut builder)?;

    builder.build()
}

/// Populate the process-wide module with default options
pub fn initialize() -> BindResult<&'static ForeignModule> {
    initialize_with(&ModuleOptions::default())
}

/// Populate the process-wide module.
///
/// Fails with `DuplicateRegistration` if the module was already
/// initialized; the existing module is left untouched.
pub fn initialize_with(options: &ModuleOptions) -> BindResult<&'static ForeignModule> {
    let rejected = || {
        log::warn!("module '{}' is already initialized", options.module.name);
        BindError::DuplicateRegistration {
            name: options.module.name.clone(),
        }
    };

    if MODULE.get().is_some() {
        return Err(rejected());
    }
    let module = assemble(options)?;
    MODULE.set(module).map_err(|_| rejected())?;
    let module = MODULE.get().ok_or_else(rejected)?;
    log::debug!("initialized module {} {}", module.name(), module.version());
    Ok(module)
}

/// The process-wide module, once [`initialize`] has run
pub fn module() -> Option<&'static ForeignModule> {
    MODULE.get()
}
