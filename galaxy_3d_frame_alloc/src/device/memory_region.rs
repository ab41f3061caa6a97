/// Bounds-checked view over one device memory allocation.
///
/// Every access validates `offset + size <= len()` before touching the
/// mapped bytes; out-of-bounds accesses fail with `InvalidResource` instead
/// of writing past the allocation.

use std::fmt;
use bytemuck::Pod;
use crate::error::{Error, Result};
use super::DeviceMemory;

pub struct MemoryRegion {
    memory: Box<dyn DeviceMemory>,
}

impl MemoryRegion {
    pub fn new(memory: Box<dyn DeviceMemory>) -> Self {
        Self { memory }
    }

    // ===== ACCESSORS =====

    /// Size in bytes
    pub fn len(&self) -> u64 {
        self.memory.size()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.size() == 0
    }

    /// Device address of the first byte
    pub fn base_address(&self) -> u64 {
        self.memory.base_address()
    }

    pub fn label(&self) -> &str {
        self.memory.label()
    }

    /// Whole mapped content
    pub fn as_bytes(&self) -> &[u8] {
        self.memory.mapped()
    }

    // ===== CHECKED ACCESS =====

    fn check_range(&self, offset: u64, size: u64) -> Result<std::ops::Range<usize>> {
        let end = offset.checked_add(size);
        match end {
            Some(end) if end <= self.len() => Ok(offset as usize..end as usize),
            _ => crate::engine_fail!(
                "galaxy3d::MemoryRegion",
                Error::InvalidResource(format!(
                    "Region '{}': range [{}, {}) exceeds size {}",
                    self.label(),
                    offset,
                    offset.saturating_add(size),
                    self.len()
                ))
            ),
        }
    }

    /// Write `data` at `offset`
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let range = self.check_range(offset, data.len() as u64)?;
        self.memory.mapped_mut()[range].copy_from_slice(data);
        Ok(())
    }

    /// Read `size` bytes at `offset`
    pub fn read(&self, offset: u64, size: u64) -> Result<&[u8]> {
        let range = self.check_range(offset, size)?;
        Ok(&self.memory.mapped()[range])
    }

    /// Set `size` bytes at `offset` to `value`
    pub fn fill(&mut self, offset: u64, size: u64, value: u8) -> Result<()> {
        let range = self.check_range(offset, size)?;
        self.memory.mapped_mut()[range].fill(value);
        Ok(())
    }

    /// Write one plain-old-data value at `offset`
    pub fn write_pod<T: Pod>(&mut self, offset: u64, value: &T) -> Result<()> {
        self.write(offset, bytemuck::bytes_of(value))
    }

    /// Read one plain-old-data value at `offset` (no alignment requirement)
    pub fn read_pod<T: Pod>(&self, offset: u64) -> Result<T> {
        let bytes = self.read(offset, std::mem::size_of::<T>() as u64)?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Copy `min(self.len(), source.len())` bytes from the start of `source`
    ///
    /// Returns the number of bytes copied. Bytes past the copied range keep
    /// their current content.
    pub fn copy_from(&mut self, source: &MemoryRegion) -> u64 {
        let count = self.len().min(source.len()) as usize;
        self.memory.mapped_mut()[..count].copy_from_slice(&source.as_bytes()[..count]);
        count as u64
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("label", &self.label())
            .field("base_address", &format_args!("{:#x}", self.base_address()))
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "memory_region_tests.rs"]
mod tests;
