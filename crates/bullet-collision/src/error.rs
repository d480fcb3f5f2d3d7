//! Errors raised by native collision objects

use std::collections::TryReserveError;

/// Result type for native operations
pub type NativeResult<T> = Result<T, NativeError>;

/// Native collision error types
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    /// A pool or buffer could not be allocated
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// Index past the end of an indexed query
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of valid indices
        len: usize,
    },

    /// A fixed-size pool has no free slot and may not grow
    #[error("Pool exhausted: all {capacity} slots in use")]
    PoolExhausted {
        /// Pool capacity
        capacity: usize,
    },
}

impl NativeError {
    /// Check an index against a length
    pub fn check_index(index: usize, len: usize) -> NativeResult<()> {
        if index < len {
            Ok(())
        } else {
            Err(NativeError::IndexOutOfRange { index, len })
        }
    }
}
