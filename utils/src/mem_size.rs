//! Defines a [`MemSizeEstimator`] trait which is used to estimate sizes of run-time objects in
//! memory including deep heap allocations.

use std::{mem::size_of, sync::Arc};

/// The contract for estimating deep memory size owned by this object. Implementors are expected
/// to support only a single function - bytes or units. Objects with a static size, or containers
/// of such, implement the `_units` estimation. Objects with varying runtime sizes implement the
/// `_bytes` estimation.
///
/// By panicking on the remaining unimplemented function we ensure that tests will catch any
/// inconsistency over the units used by the object and by the code tracking its size
pub trait MemSizeEstimator {
    /// Estimates the (deep) size of this object in bytes (including heap owned inner data)
    fn estimate_mem_bytes(&self) -> usize {
        unimplemented!()
    }

    /// Estimates the number of units this object holds in memory
    fn estimate_mem_units(&self) -> usize {
        unimplemented!()
    }
}

impl MemSizeEstimator for u64 {
    fn estimate_mem_units(&self) -> usize {
        1
    }
}

impl<T> MemSizeEstimator for Vec<T> {
    fn estimate_mem_units(&self) -> usize {
        self.len()
    }
}

impl<T: MemSizeEstimator> MemSizeEstimator for Arc<T> {
    fn estimate_mem_bytes(&self) -> usize {
        self.as_ref().estimate_mem_bytes() + size_of::<Self>()
    }

    fn estimate_mem_units(&self) -> usize {
        self.as_ref().estimate_mem_units()
    }
}
