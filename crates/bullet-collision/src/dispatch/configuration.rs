//! Collision configuration: pool sizing for dispatchers

use std::any::Any;
use std::fmt;

/// Default size of the persistent manifold and algorithm pools
pub const DEFAULT_POOL_SIZE: usize = 4096;

/// Memory and algorithm setup shared by dispatchers
pub trait CollisionConfiguration: Any + Send + Sync + fmt::Debug {
    /// Number of manifolds preallocated by a dispatcher
    fn persistent_manifold_pool_size(&self) -> usize;

    /// Number of collision algorithms preallocated by a dispatcher
    fn collision_algorithm_pool_size(&self) -> usize;

    /// Upcast for downcasting to the concrete configuration
    fn as_any(&self) -> &dyn Any;
}

/// Construction parameters of [`DefaultCollisionConfiguration`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCollisionConstructionInfo {
    /// Persistent manifold pool size
    pub default_max_persistent_manifold_pool_size: usize,
    /// Collision algorithm pool size
    pub default_max_collision_algorithm_pool_size: usize,
    /// Extra room per algorithm slot for custom algorithms
    pub custom_collision_algorithm_max_element_size: usize,
    /// Use EPA instead of the default penetration solver
    pub use_epa_penetration_algorithm: bool,
}

impl Default for DefaultCollisionConstructionInfo {
    fn default() -> Self {
        Self {
            default_max_persistent_manifold_pool_size: DEFAULT_POOL_SIZE,
            default_max_collision_algorithm_pool_size: DEFAULT_POOL_SIZE,
            custom_collision_algorithm_max_element_size: 0,
            use_epa_penetration_algorithm: true,
        }
    }
}

/// Configuration with fixed-size pools
#[derive(Debug, Clone, Default)]
pub struct DefaultCollisionConfiguration {
    info: DefaultCollisionConstructionInfo,
}

impl DefaultCollisionConfiguration {
    /// Configuration built from `info`
    pub fn new(info: DefaultCollisionConstructionInfo) -> Self {
        log::trace!(
            "collision configuration: {} manifolds, {} algorithms",
            info.default_max_persistent_manifold_pool_size,
            info.default_max_collision_algorithm_pool_size
        );
        Self { info }
    }

    /// Construction parameters
    pub fn info(&self) -> &DefaultCollisionConstructionInfo {
        &self.info
    }
}

impl CollisionConfiguration for DefaultCollisionConfiguration {
    fn persistent_manifold_pool_size(&self) -> usize {
        self.info.default_max_persistent_manifold_pool_size
    }

    fn collision_algorithm_pool_size(&self) -> usize {
        self.info.default_max_collision_algorithm_pool_size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_sizes() {
        let config = DefaultCollisionConfiguration::default();
        assert_eq!(config.persistent_manifold_pool_size(), 4096);
        assert_eq!(config.collision_algorithm_pool_size(), 4096);
        assert!(config.info().use_epa_penetration_algorithm);
    }

    #[test]
    fn test_custom_pool_sizes() {
        let config = DefaultCollisionConfiguration::new(DefaultCollisionConstructionInfo {
            default_max_persistent_manifold_pool_size: 8,
            ..Default::default()
        });
        assert_eq!(config.persistent_manifold_pool_size(), 8);
        assert_eq!(config.collision_algorithm_pool_size(), DEFAULT_POOL_SIZE);
    }
}
