/// Host-memory implementation of the device collaborators.
///
/// `HostDevice` answers capability queries from a configurable descriptor
/// size table and backs every region with a `Vec<u8>`. Base addresses are
/// synthetic but unique and monotonically increasing, so code that records
/// addresses behaves as it would on a real device.
///
/// Used for headless tooling and for testing the allocator without a GPU.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use super::{
    align_up, BindingLayout, DescriptorKind, DeviceCapabilities, DeviceMemory,
    MemoryProvider, MemoryRegion,
};

const BASE_ADDRESS: u64 = 0x1000_0000;
const ADDRESS_GRANULARITY: u64 = 0x100;

/// Live allocation counters shared between a device and its regions
#[derive(Default)]
struct HostStats {
    live_regions: AtomicUsize,
    live_bytes: AtomicU64,
}

pub struct HostDevice {
    descriptor_sizes: FxHashMap<DescriptorKind, u64>,
    alignment: u64,
    next_address: AtomicU64,
    memory_budget: Option<u64>,
    stats: Arc<HostStats>,
}

impl HostDevice {
    /// Create a host device with a typical descriptor size table
    ///
    /// | kind | bytes |
    /// |---|---|
    /// | UniformBuffer, StorageBuffer | 16 |
    /// | SampledImage, StorageImage | 32 |
    /// | Sampler | 16 |
    /// | CombinedImageSampler | 48 |
    /// | AccelerationStructure | 8 |
    ///
    /// Record alignment is 64 bytes.
    pub fn new() -> Self {
        let mut descriptor_sizes = FxHashMap::default();
        descriptor_sizes.insert(DescriptorKind::UniformBuffer, 16);
        descriptor_sizes.insert(DescriptorKind::StorageBuffer, 16);
        descriptor_sizes.insert(DescriptorKind::SampledImage, 32);
        descriptor_sizes.insert(DescriptorKind::StorageImage, 32);
        descriptor_sizes.insert(DescriptorKind::Sampler, 16);
        descriptor_sizes.insert(DescriptorKind::CombinedImageSampler, 48);
        descriptor_sizes.insert(DescriptorKind::AccelerationStructure, 8);

        Self {
            descriptor_sizes,
            alignment: 64,
            next_address: AtomicU64::new(BASE_ADDRESS),
            memory_budget: None,
            stats: Arc::new(HostStats::default()),
        }
    }

    /// Override the byte size reported for `kind`
    pub fn with_descriptor_size(mut self, kind: DescriptorKind, size: u64) -> Self {
        self.descriptor_sizes.insert(kind, size);
        self
    }

    /// Report `kind` as unsupported
    pub fn without_descriptor(mut self, kind: DescriptorKind) -> Self {
        self.descriptor_sizes.remove(&kind);
        self
    }

    /// Override the record alignment
    pub fn with_alignment(mut self, alignment: u64) -> Self {
        self.alignment = alignment.max(1);
        self
    }

    /// Fail allocations with `OutOfMemory` once live bytes would exceed `bytes`
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Number of regions allocated and not yet dropped
    pub fn live_regions(&self) -> usize {
        self.stats.live_regions.load(Ordering::Relaxed)
    }

    /// Bytes held by regions allocated and not yet dropped
    pub fn live_bytes(&self) -> u64 {
        self.stats.live_bytes.load(Ordering::Relaxed)
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCapabilities for HostDevice {
    fn descriptor_size(&self, kind: DescriptorKind) -> Option<u64> {
        self.descriptor_sizes.get(&kind).copied()
    }

    fn descriptor_alignment(&self) -> u64 {
        self.alignment
    }

    fn layout_size(&self, layout: &BindingLayout) -> Result<u64> {
        let mut size = 0;
        for &kind in &layout.entries {
            size += self
                .descriptor_size(kind)
                .ok_or(Error::UnsupportedRecordType(kind))?;
        }
        Ok(size)
    }
}

impl MemoryProvider for HostDevice {
    fn allocate(&self, size: u64, label: &str) -> Result<MemoryRegion> {
        if let Some(budget) = self.memory_budget {
            if self.live_bytes() + size > budget {
                crate::engine_fail!("galaxy3d::HostDevice", Error::OutOfMemory);
            }
        }

        let span = align_up(size.max(1), ADDRESS_GRANULARITY);
        let address = self.next_address.fetch_add(span, Ordering::Relaxed);

        self.stats.live_regions.fetch_add(1, Ordering::Relaxed);
        self.stats.live_bytes.fetch_add(size, Ordering::Relaxed);

        crate::engine_trace!(
            "galaxy3d::HostDevice",
            "Allocated '{}' ({} bytes) at {:#x}",
            label,
            size,
            address
        );

        Ok(MemoryRegion::new(Box::new(HostMemory {
            bytes: vec![0u8; size as usize],
            address,
            label: label.to_string(),
            stats: Arc::clone(&self.stats),
        })))
    }
}

// ===== HOST MEMORY =====

struct HostMemory {
    bytes: Vec<u8>,
    address: u64,
    label: String,
    stats: Arc<HostStats>,
}

impl DeviceMemory for HostMemory {
    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn base_address(&self) -> u64 {
        self.address
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn mapped(&self) -> &[u8] {
        &self.bytes
    }

    fn mapped_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Drop for HostMemory {
    fn drop(&mut self) {
        self.stats.live_regions.fetch_sub(1, Ordering::Relaxed);
        self.stats.live_bytes.fetch_sub(self.bytes.len() as u64, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "host_device_tests.rs"]
mod tests;
