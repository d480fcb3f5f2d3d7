//! Collision dispatcher and its contact manifold pool

use std::any::Any;
use std::fmt;

use bitflags::bitflags;

use crate::error::{NativeError, NativeResult};

use super::configuration::CollisionConfiguration;

bitflags! {
    /// Dispatcher behavior switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DispatcherFlags: i32 {
        /// Report static-static pairs
        const STATIC_STATIC_REPORTED = 1;
        /// Scale the contact breaking threshold per shape
        const USE_RELATIVE_CONTACT_BREAKING_THRESHOLD = 2;
        /// Fail instead of growing past the manifold pool
        const DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION = 4;
    }
}

/// Contact cache between two bodies
#[derive(Debug, Clone, PartialEq)]
pub struct PersistentManifold {
    /// First body
    pub body0: usize,
    /// Second body
    pub body1: usize,
    /// Distance at which contacts are dropped
    pub contact_breaking_threshold: f32,
}

/// Pair dispatch interface
pub trait Dispatcher: Any + Send + Sync + fmt::Debug {
    /// Number of live manifolds
    fn num_manifolds(&self) -> usize;

    /// Manifold `index`
    fn manifold(&self, index: usize) -> NativeResult<&PersistentManifold>;

    /// Upcast for downcasting to the concrete dispatcher
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete dispatcher
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dispatcher backed by a preallocated manifold pool
#[derive(Debug)]
pub struct CollisionDispatcher {
    flags: DispatcherFlags,
    pool_capacity: usize,
    manifolds: Vec<PersistentManifold>,
}

impl CollisionDispatcher {
    /// Dispatcher sized by `config`.
    ///
    /// Fails with [`NativeError::Allocation`] when the manifold pool cannot
    /// be reserved.
    pub fn new(config: &dyn CollisionConfiguration) -> NativeResult<Self> {
        let pool_capacity = config.persistent_manifold_pool_size();
        let mut manifolds = Vec::new();
        manifolds.try_reserve_exact(pool_capacity)?;
        log::debug!("collision dispatcher with {} manifold slots", pool_capacity);
        Ok(Self {
            flags: DispatcherFlags::USE_RELATIVE_CONTACT_BREAKING_THRESHOLD,
            pool_capacity,
            manifolds,
        })
    }

    /// Current flags
    pub fn flags(&self) -> DispatcherFlags {
        self.flags
    }

    /// Replace the flags
    pub fn set_flags(&mut self, flags: DispatcherFlags) {
        self.flags = flags;
    }

    /// Size of the preallocated pool
    pub fn pool_capacity(&self) -> usize {
        self.pool_capacity
    }

    /// Open a manifold between two bodies and return its index.
    ///
    /// With [`DispatcherFlags::DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION`] set,
    /// a full pool is an error instead of growing.
    pub fn new_manifold(&mut self, body0: usize, body1: usize, threshold: f32) -> NativeResult<usize> {
        if self.manifolds.len() >= self.pool_capacity {
            if self
                .flags
                .contains(DispatcherFlags::DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION)
            {
                return Err(NativeError::PoolExhausted {
                    capacity: self.pool_capacity,
                });
            }
            self.manifolds.try_reserve(1)?;
        }
        self.manifolds.push(PersistentManifold {
            body0,
            body1,
            contact_breaking_threshold: threshold,
        });
        Ok(self.manifolds.len() - 1)
    }

    /// Remove manifold `index`; the last manifold takes its place
    pub fn release_manifold(&mut self, index: usize) -> NativeResult<PersistentManifold> {
        NativeError::check_index(index, self.manifolds.len())?;
        Ok(self.manifolds.swap_remove(index))
    }
}

impl Dispatcher for CollisionDispatcher {
    fn num_manifolds(&self) -> usize {
        self.manifolds.len()
    }

    fn manifold(&self, index: usize) -> NativeResult<&PersistentManifold> {
        self.manifolds.get(index).ok_or(NativeError::IndexOutOfRange {
            index,
            len: self.manifolds.len(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DefaultCollisionConfiguration, DefaultCollisionConstructionInfo};

    fn small_config(pool: usize) -> DefaultCollisionConfiguration {
        DefaultCollisionConfiguration::new(DefaultCollisionConstructionInfo {
            default_max_persistent_manifold_pool_size: pool,
            ..Default::default()
        })
    }

    #[test]
    fn test_new_dispatcher_defaults() {
        let dispatcher = CollisionDispatcher::new(&DefaultCollisionConfiguration::default()).unwrap();
        assert_eq!(dispatcher.num_manifolds(), 0);
        assert_eq!(dispatcher.pool_capacity(), 4096);
        assert_eq!(
            dispatcher.flags(),
            DispatcherFlags::USE_RELATIVE_CONTACT_BREAKING_THRESHOLD
        );
    }

    #[test]
    fn test_oversized_pool_fails() {
        let err = CollisionDispatcher::new(&small_config(usize::MAX)).unwrap_err();
        assert!(matches!(err, NativeError::Allocation(_)));
    }

    #[test]
    fn test_pool_grows_unless_disabled() {
        let mut dispatcher = CollisionDispatcher::new(&small_config(1)).unwrap();
        assert_eq!(dispatcher.new_manifold(0, 1, 0.02).unwrap(), 0);
        assert_eq!(dispatcher.new_manifold(1, 2, 0.02).unwrap(), 1);

        dispatcher.set_flags(DispatcherFlags::DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION);
        assert!(matches!(
            dispatcher.new_manifold(2, 3, 0.02),
            Err(NativeError::PoolExhausted { capacity: 1 })
        ));
        assert_eq!(dispatcher.num_manifolds(), 2);
    }

    #[test]
    fn test_release_manifold() {
        let mut dispatcher = CollisionDispatcher::new(&small_config(4)).unwrap();
        dispatcher.new_manifold(0, 1, 0.1).unwrap();
        dispatcher.new_manifold(2, 3, 0.1).unwrap();
        let released = dispatcher.release_manifold(0).unwrap();
        assert_eq!((released.body0, released.body1), (0, 1));
        assert_eq!(dispatcher.manifold(0).unwrap().body0, 2);
        assert!(dispatcher.manifold(1).is_err());
        assert!(dispatcher.release_manifold(5).is_err());
    }

    #[test]
    fn test_flag_bits() {
        let flags = DispatcherFlags::STATIC_STATIC_REPORTED
            | DispatcherFlags::DISABLE_CONTACTPOOL_DYNAMIC_ALLOCATION;
        assert_eq!(flags.bits(), 5);
        assert_eq!(DispatcherFlags::from_bits(5), Some(flags));
        assert!(DispatcherFlags::from_bits(8).is_none());
    }
}
