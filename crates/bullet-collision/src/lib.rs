//! Bullet Collision - native collision objects behind the bullet bindings
//!
//! This crate provides the native side the binding layer projects:
//! - **Linear math**: glam vectors and a rigid [`Transform`](linear_math::Transform)
//! - **Shapes**: the convex shape hierarchy (`shapes` module)
//! - **Dispatch**: collision configuration and dispatcher (`dispatch` module)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Pair dispatch and collision configuration
pub mod dispatch;

/// Native error type
pub mod error;

/// Vectors, matrices and transforms
pub mod linear_math;

/// Collision shapes
pub mod shapes;

pub use dispatch::{
    CollisionConfiguration, CollisionDispatcher, DefaultCollisionConfiguration,
    DefaultCollisionConstructionInfo, Dispatcher, DispatcherFlags,
};
pub use error::{NativeError, NativeResult};
pub use linear_math::{Mat3, Transform, Vec3};
pub use shapes::{
    AabbCachingShape, Box2dShape, CollisionShape, ConvexHullShape, ConvexInternalData, ConvexShape,
    PolyhedralConvexShape,
};
