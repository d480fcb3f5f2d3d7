//! Pair dispatch and its configuration

mod configuration;
mod dispatcher;

pub use configuration::{
    CollisionConfiguration, DefaultCollisionConfiguration, DefaultCollisionConstructionInfo,
    DEFAULT_POOL_SIZE,
};
pub use dispatcher::{CollisionDispatcher, Dispatcher, DispatcherFlags, PersistentManifold};
