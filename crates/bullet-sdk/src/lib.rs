//! Bullet SDK - binding layer for projecting native classes into a runtime
//!
//! This crate provides the pieces a module needs to expose a native class
//! hierarchy to an embedding scripting runtime:
//! - **Registry**: foreign names, single-base `is-a` chains, instantiability
//!   and copyability (`registry`, `class` modules)
//! - **Members**: properties and methods with a per-member return policy
//!   (`member` module)
//! - **Factories**: constructors taking live references to other objects
//!   (`factory` module)
//! - **Enums**: named values and bit-flag sets (`enums` module)
//! - **Modules**: the assembled, sealed module object (`module` module)
//!
//! # Example
//!
//! ```ignore
//! use bullet_sdk::{ClassSpec, FactorySpec, ModuleBuilder, NativeBox};
//!
//! let mut builder = ModuleBuilder::new("demo", "0.1.0");
//! let counter = builder
//!     .registry_mut()
//!     .register_class(ClassSpec::<u32>::new("Counter").instantiable().copyable())?;
//! builder
//!     .registry_mut()
//!     .bind_factory(&counter, FactorySpec::new(|_| Ok(Box::new(0u32) as NativeBox)))?;
//! let module = builder.build()?;
//! let instance = module.construct("Counter", &[])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Class bindings and their declarations
pub mod class;

/// Rust <-> foreign value conversions
pub mod convert;

/// Enum exporter
pub mod enums;

/// Binding error taxonomy
pub mod error;

/// Constructor adapter
pub mod factory;

/// Member binder and return policies
pub mod member;

/// Module builder and the assembled module
pub mod module;

/// Object handles and internal-reference projections
pub mod object;

/// Type projection registry
pub mod registry;

/// Dynamic values crossing the boundary
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use class::{ClassBinding, ClassSpec, NativeBox};
pub use convert::{arg, arg_or, expect_args, FromForeign, IntoForeign};
pub use enums::{EnumBinding, EnumSpec, EnumValue};
pub use error::{BindError, BindResult};
pub use factory::{allocation_failure, FactoryBinding, FactorySpec, ParamSpec};
pub use member::{MemberBinding, MemberSpec, ReturnPolicy, Returned};
pub use module::{ForeignModule, FunctionTable, ModuleAttr, ModuleBuilder};
pub use object::{Lens, ObjectRef, Projection, WeakObjectRef};
pub use registry::{TypeEntry, TypeRegistry};
pub use value::ForeignValue;
