use std::collections::BTreeSet;
use crate::error::{Error, Result};

/// Allocates and recycles unique `u32` slot indices inside a fixed capacity.
///
/// The pool owns the free/used partition of `[0, capacity)`; payload lives
/// in the owner's parallel storage (a GPU region, a `Vec`, ...). When the
/// free set runs dry, `allocate` grows the index space by `growth_chunk`
/// and the owner migrates its payload to match `capacity()`.
///
/// Freed indices are recycled lowest-first, so allocation order is
/// deterministic.
///
/// # Example
///
/// ```ignore
/// let mut pool = SlotPool::new(2, 2);
/// let a = pool.allocate()?;  // 0
/// let b = pool.allocate()?;  // 1
/// let c = pool.allocate()?;  // 2 (pool grew to 4)
/// pool.release(a)?;          // 0 is free again
/// assert_eq!(pool.allocate()?, 0);
/// ```
#[derive(Debug, Clone)]
pub struct SlotPool {
    free: BTreeSet<u32>,
    capacity: u32,
    growth_chunk: u32,
    max_capacity: Option<u32>,
}

impl SlotPool {
    /// Create a pool with `capacity` free slots, growing by `growth_chunk`
    pub fn new(capacity: u32, growth_chunk: u32) -> Self {
        Self {
            free: (0..capacity).collect(),
            capacity,
            growth_chunk: growth_chunk.max(1),
            max_capacity: None,
        }
    }

    /// Cap the pool: growth past `max` fails with `OutOfCapacity`
    pub fn with_max_capacity(mut self, max: u32) -> Self {
        self.max_capacity = Some(max);
        self
    }

    /// Allocate the lowest free slot index, growing the pool if it is full
    pub fn allocate(&mut self) -> Result<u32> {
        if self.free.is_empty() {
            self.grow(self.growth_chunk)?;
        }
        match self.free.pop_first() {
            Some(index) => Ok(index),
            None => Err(Error::OutOfCapacity(self.capacity)),
        }
    }

    /// Return a slot index to the pool for reuse
    pub fn release(&mut self, index: u32) -> Result<()> {
        if index >= self.capacity {
            crate::engine_fail!(
                "galaxy3d::SlotPool",
                Error::SlotOutOfRange { index, capacity: self.capacity }
            );
        }
        if !self.free.insert(index) {
            crate::engine_fail!("galaxy3d::SlotPool", Error::DoubleRelease(index));
        }
        Ok(())
    }

    /// Claim a specific slot index
    ///
    /// Returns `Ok(false)` when the index was already allocated (the caller
    /// overwrites its own slot), `Ok(true)` when it was taken from the free set.
    pub fn reserve(&mut self, index: u32) -> Result<bool> {
        if index >= self.capacity {
            return Err(Error::SlotOutOfRange { index, capacity: self.capacity });
        }
        Ok(self.free.remove(&index))
    }

    /// Append `by` free indices at the top of the index space
    ///
    /// A capped pool grows up to its ceiling; a pool already at the ceiling
    /// fails with `OutOfCapacity`.
    pub fn grow(&mut self, by: u32) -> Result<()> {
        let mut new_capacity = self.capacity.saturating_add(by);
        if let Some(max) = self.max_capacity {
            if self.capacity >= max {
                crate::engine_fail!("galaxy3d::SlotPool", Error::OutOfCapacity(max));
            }
            new_capacity = new_capacity.min(max);
        }

        self.free.extend(self.capacity..new_capacity);
        crate::engine_debug!(
            "galaxy3d::SlotPool",
            "Pool grown from {} to {} slots",
            self.capacity,
            new_capacity
        );
        self.capacity = new_capacity;
        Ok(())
    }

    /// Total number of indices (free + allocated)
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.capacity - self.free.len() as u32
    }

    /// Whether no slots are currently allocated
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of free slots before the next growth
    pub fn free_count(&self) -> u32 {
        self.free.len() as u32
    }

    pub fn growth_chunk(&self) -> u32 {
        self.growth_chunk
    }

    pub fn max_capacity(&self) -> Option<u32> {
        self.max_capacity
    }

    /// Whether `index` is currently allocated
    pub fn is_allocated(&self, index: u32) -> bool {
        index < self.capacity && !self.free.contains(&index)
    }

    /// Iterate allocated indices in ascending order
    pub fn allocated(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.capacity).filter(move |i| !self.free.contains(i))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_pool_tests.rs"]
mod tests;
