/// Fixed-stride resource-binding records in one device memory region.
///
/// A slab is built for one binding-layout shape. The device reports the
/// record stride and the byte size of each binding; record `i` lives at
/// `[i * stride, (i + 1) * stride)` and its fields are packed back to back
/// from the start of the record.
///
/// Layout of one record (3 fields, stride rounded to alignment):
///
/// ```text
/// | field 0 | field 1 | field 2 | padding |
/// ^ i * stride                             ^ (i + 1) * stride
/// ```
///
/// Slot indices come from a `SlotPool`. Auto-indexed writes grow the slab
/// when it is full; the displaced region is kept until `take_retired()`
/// so the owner can defer its release past the frames still reading it.

use std::sync::Arc;
use crate::device::{
    BindingLayout, DescriptorKind, DeviceCapabilities, LayoutInfo, MemoryProvider, MemoryRegion,
};
use crate::error::{Error, Result};
use crate::utils::SlotPool;
use crate::{engine_info, engine_warn};

// ===== SLAB DESCRIPTOR =====

/// Parameters for creating a slab
#[derive(Debug, Clone)]
pub struct SlabDesc {
    /// Debug name (also used as the region label)
    pub name: String,
    /// Binding-layout shape of every record
    pub layout: BindingLayout,
    /// Initial number of records
    pub capacity: u32,
    /// Records added when an auto-indexed write finds the slab full
    pub growth_chunk: u32,
    /// Optional ceiling on the record count
    pub max_capacity: Option<u32>,
}

// ===== SLAB FIELD =====

/// One field of a record write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlabField {
    /// Raw descriptor bytes, exactly the device-reported size for `kind`
    Record { kind: DescriptorKind, bytes: Vec<u8> },
    /// Leave the binding empty; its bytes are skipped, not written
    Padding(DescriptorKind),
}

impl SlabField {
    pub fn record(kind: DescriptorKind, bytes: impl Into<Vec<u8>>) -> Self {
        SlabField::Record { kind, bytes: bytes.into() }
    }

    pub fn kind(&self) -> DescriptorKind {
        match self {
            SlabField::Record { kind, .. } => *kind,
            SlabField::Padding(kind) => *kind,
        }
    }
}

// ===== DESCRIPTOR SLAB =====

pub struct DescriptorSlab {
    name: String,
    layout: BindingLayout,
    info: LayoutInfo,
    pool: SlotPool,
    region: MemoryRegion,
    provider: Arc<dyn MemoryProvider>,
    retired: Vec<MemoryRegion>,
}

impl DescriptorSlab {
    /// Create a slab of `desc.capacity` records
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if the layout is empty
    /// - `UnsupportedRecordType` if the device has no size for one of the bindings
    /// - Any error from the memory provider
    pub fn create(
        desc: SlabDesc,
        capabilities: &dyn DeviceCapabilities,
        provider: Arc<dyn MemoryProvider>,
    ) -> Result<Self> {
        if desc.layout.is_empty() {
            crate::engine_fail!(
                "galaxy3d::DescriptorSlab",
                Error::InvalidResource(format!("Slab '{}' has an empty binding layout", desc.name))
            );
        }

        let info = capabilities.query_layout(&desc.layout)?;
        let region = provider.allocate(info.record_stride * desc.capacity as u64, &desc.name)?;

        let mut pool = SlotPool::new(desc.capacity, desc.growth_chunk);
        if let Some(max) = desc.max_capacity {
            pool = pool.with_max_capacity(max);
        }

        engine_info!(
            "galaxy3d::DescriptorSlab",
            "Slab '{}' created: {} bindings, stride {} bytes, {} records",
            desc.name,
            desc.layout.len(),
            info.record_stride,
            desc.capacity
        );

        Ok(Self {
            name: desc.name,
            layout: desc.layout,
            info,
            pool,
            region,
            provider,
            retired: Vec::new(),
        })
    }

    // ===== WRITE / RELEASE =====

    /// Write one record and return its slot index
    ///
    /// With `index = None` a free slot is allocated, growing the slab by its
    /// growth chunk if it is full. With `index = Some(i)` the record is
    /// written at `i`, claiming it if it was free.
    ///
    /// # Errors
    ///
    /// - `InvalidResource` if `fields` does not match the layout (checked
    ///   before any slot is claimed)
    /// - `SlotOutOfRange` if `i >= capacity()`; nothing is written
    /// - `OutOfCapacity` if the slab is full and capped
    pub fn write(&mut self, fields: &[SlabField], index: Option<u32>) -> Result<u32> {
        self.validate_fields(fields)?;

        let index = match index {
            None => {
                if self.pool.free_count() == 0 {
                    self.grow(self.pool.growth_chunk())?;
                }
                self.pool.allocate()?
            }
            Some(index) => {
                if index >= self.pool.capacity() {
                    let error = Error::SlotOutOfRange { index, capacity: self.pool.capacity() };
                    engine_warn!(
                        "galaxy3d::DescriptorSlab",
                        "Slab '{}': {}, write skipped",
                        self.name,
                        error
                    );
                    return Err(error);
                }
                self.pool.reserve(index)?;
                index
            }
        };

        let mut offset = self.record_offset(index);
        for (field, size) in fields.iter().zip(&self.info.field_sizes) {
            if let SlabField::Record { bytes, .. } = field {
                self.region.write(offset, bytes)?;
            }
            offset += size;
        }

        crate::engine_trace!("galaxy3d::DescriptorSlab", "Slab '{}': wrote record {}", self.name, index);
        Ok(index)
    }

    /// Return `index` to the pool
    ///
    /// The record bytes are left as they are; a slot is never read without
    /// a prior write.
    pub fn release(&mut self, index: u32) -> Result<()> {
        self.pool.release(index)
    }

    /// Add `by` records, moving existing records to a new region
    ///
    /// The old region is kept in the retired list.
    pub fn grow(&mut self, by: u32) -> Result<()> {
        let capacity = self.pool.capacity();
        let mut target = capacity.saturating_add(by);
        if let Some(max) = self.pool.max_capacity() {
            target = target.min(max);
        }
        if target == capacity {
            crate::engine_fail!("galaxy3d::DescriptorSlab", Error::OutOfCapacity(capacity));
        }

        let region = self
            .provider
            .reallocate(&self.region, target as u64 * self.info.record_stride)?;
        self.pool.grow(target - capacity)?;
        let old = std::mem::replace(&mut self.region, region);

        crate::engine_debug!(
            "galaxy3d::DescriptorSlab",
            "Slab '{}' grown from {} to {} records ({:#x} -> {:#x})",
            self.name,
            capacity,
            target,
            old.base_address(),
            self.region.base_address()
        );
        self.retired.push(old);
        Ok(())
    }

    fn validate_fields(&self, fields: &[SlabField]) -> Result<()> {
        if fields.len() != self.layout.len() {
            crate::engine_fail!(
                "galaxy3d::DescriptorSlab",
                Error::InvalidResource(format!(
                    "Slab '{}': {} fields given, layout has {}",
                    self.name,
                    fields.len(),
                    self.layout.len()
                ))
            );
        }

        for (binding, (field, expected_kind)) in fields.iter().zip(&self.layout.entries).enumerate() {
            if field.kind() != *expected_kind {
                crate::engine_fail!(
                    "galaxy3d::DescriptorSlab",
                    Error::InvalidResource(format!(
                        "Slab '{}': binding {} is {:?}, got {:?}",
                        self.name,
                        binding,
                        expected_kind,
                        field.kind()
                    ))
                );
            }
            if let SlabField::Record { bytes, .. } = field {
                let expected_size = self.info.field_sizes[binding];
                if bytes.len() as u64 != expected_size {
                    crate::engine_fail!(
                        "galaxy3d::DescriptorSlab",
                        Error::InvalidResource(format!(
                            "Slab '{}': binding {} record is {} bytes, device size is {}",
                            self.name,
                            binding,
                            bytes.len(),
                            expected_size
                        ))
                    );
                }
            }
        }
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &BindingLayout {
        &self.layout
    }

    pub fn layout_info(&self) -> &LayoutInfo {
        &self.info
    }

    /// Record stride in bytes
    pub fn stride(&self) -> u64 {
        self.info.record_stride
    }

    /// Number of records the current region holds
    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    /// Size of the current region in bytes
    pub fn capacity_bytes(&self) -> u64 {
        self.region.len()
    }

    /// Device address of the current region (for binding)
    pub fn base_address(&self) -> u64 {
        self.region.base_address()
    }

    /// Byte offset of record `index` inside the region
    pub fn record_offset(&self, index: u32) -> u64 {
        index as u64 * self.info.record_stride
    }

    /// Device address of record `index`
    pub fn record_address(&self, index: u32) -> u64 {
        self.base_address() + self.record_offset(index)
    }

    /// Byte offset of binding `field` inside a record
    pub fn field_offset(&self, field: usize) -> Option<u64> {
        self.info.field_offset(field)
    }

    /// Number of allocated records
    pub fn live_count(&self) -> u32 {
        self.pool.len()
    }

    pub fn is_allocated(&self, index: u32) -> bool {
        self.pool.is_allocated(index)
    }

    /// Raw bytes of record `index`
    pub fn record_bytes(&self, index: u32) -> Result<&[u8]> {
        self.region.read(self.record_offset(index), self.info.record_stride)
    }

    pub fn region(&self) -> &MemoryRegion {
        &self.region
    }

    /// Take the regions displaced by growth since the last call
    pub fn take_retired(&mut self) -> Vec<MemoryRegion> {
        std::mem::take(&mut self.retired)
    }

    /// Give up the current region (slab destruction)
    pub fn into_regions(mut self) -> Vec<MemoryRegion> {
        let mut regions = std::mem::take(&mut self.retired);
        regions.push(self.region);
        regions
    }
}

#[cfg(test)]
#[path = "descriptor_slab_tests.rs"]
mod tests;
