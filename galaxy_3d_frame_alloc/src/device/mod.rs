/// Device collaborators consumed by the allocator
///
/// The allocator never talks to a graphics API directly. It consumes two
/// collaborators, both constructed once at startup and passed explicitly:
///
/// - `DeviceCapabilities`: record sizes and alignment for binding layouts
/// - `MemoryProvider`: host-writable, device-readable memory regions
///
/// Backends (e.g. the Vulkan crate) implement both traits on their device
/// type. `HostDevice` implements them on plain host memory.

pub mod memory_region;
pub mod host_device;

pub use memory_region::MemoryRegion;
pub use host_device::HostDevice;

use crate::error::{Error, Result};

// ===== DESCRIPTOR KIND =====

/// Kind of one binding inside a resource-binding record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DescriptorKind {
    UniformBuffer,
    StorageBuffer,
    SampledImage,
    StorageImage,
    Sampler,
    CombinedImageSampler,
    AccelerationStructure,
}

impl DescriptorKind {
    /// All kinds, in declaration order
    pub const ALL: [DescriptorKind; 7] = [
        DescriptorKind::UniformBuffer,
        DescriptorKind::StorageBuffer,
        DescriptorKind::SampledImage,
        DescriptorKind::StorageImage,
        DescriptorKind::Sampler,
        DescriptorKind::CombinedImageSampler,
        DescriptorKind::AccelerationStructure,
    ];
}

// ===== BINDING LAYOUT =====

/// Shape of one resource-binding record (binding number = position)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingLayout {
    pub entries: Vec<DescriptorKind>,
}

impl BindingLayout {
    pub fn new(entries: Vec<DescriptorKind>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved byte layout of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    /// Size of one record, rounded up to `alignment`
    pub record_stride: u64,
    /// Device-reported alignment for record offsets
    pub alignment: u64,
    /// Byte size of each binding, in layout order
    pub field_sizes: Vec<u64>,
}

impl LayoutInfo {
    /// Byte offset of `field` inside a record
    ///
    /// Fields are packed back to back: each offset is the running sum of
    /// the sizes before it.
    pub fn field_offset(&self, field: usize) -> Option<u64> {
        if field >= self.field_sizes.len() {
            return None;
        }
        Some(self.field_sizes[..field].iter().sum())
    }

    /// Sum of all field sizes (record size before alignment padding)
    pub fn packed_size(&self) -> u64 {
        self.field_sizes.iter().sum()
    }
}

/// Round `value` up to the next multiple of `alignment` (power of two or not)
pub fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

// ===== DEVICE CAPABILITIES =====

/// Device-capability query
///
/// Answers must be stable for the lifetime of the process.
pub trait DeviceCapabilities: Send + Sync {
    /// Byte size of one descriptor of `kind`, or `None` if unsupported
    fn descriptor_size(&self, kind: DescriptorKind) -> Option<u64>;

    /// Alignment required for record offsets inside a region
    fn descriptor_alignment(&self) -> u64;

    /// Raw record size of `layout` as reported by the device
    fn layout_size(&self, layout: &BindingLayout) -> Result<u64>;

    /// Resolve stride and per-field sizes for `layout`
    ///
    /// The stride is the larger of the device-reported size and the packed
    /// field sizes, rounded up to `descriptor_alignment()`.
    fn query_layout(&self, layout: &BindingLayout) -> Result<LayoutInfo> {
        let mut field_sizes = Vec::with_capacity(layout.len());
        for &kind in &layout.entries {
            match self.descriptor_size(kind) {
                Some(size) => field_sizes.push(size),
                None => crate::engine_fail!(
                    "galaxy3d::DeviceCapabilities",
                    Error::UnsupportedRecordType(kind)
                ),
            }
        }

        let alignment = self.descriptor_alignment().max(1);
        let packed: u64 = field_sizes.iter().sum();
        let size = self.layout_size(layout)?.max(packed);

        Ok(LayoutInfo {
            record_stride: align_up(size, alignment),
            alignment,
            field_sizes,
        })
    }
}

// ===== DEVICE MEMORY =====

/// One host-mapped, device-readable allocation
///
/// Implemented by backends; wrapped by `MemoryRegion`, which performs all
/// bounds checking. The allocation is released when dropped.
pub trait DeviceMemory: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Address the device uses to read this allocation
    fn base_address(&self) -> u64;

    /// Debug label given at allocation
    fn label(&self) -> &str;

    /// Host view of the mapped bytes (`size()` long)
    fn mapped(&self) -> &[u8];

    /// Mutable host view of the mapped bytes (`size()` long)
    fn mapped_mut(&mut self) -> &mut [u8];
}

// ===== MEMORY PROVIDER =====

/// Raw memory region provider
///
/// Regions are freed by dropping them; owners that may still be read by the
/// device hand them to a `DeferredReclaimQueue` instead.
pub trait MemoryProvider: Send + Sync {
    /// Allocate a zero-initialized region of `size` bytes
    fn allocate(&self, size: u64, label: &str) -> Result<MemoryRegion>;

    /// Allocate a new region of `new_size` bytes and copy `min(old, new)` bytes from `old`
    ///
    /// `old` is left untouched; the caller decides when it is released.
    fn reallocate(&self, old: &MemoryRegion, new_size: u64) -> Result<MemoryRegion> {
        let mut region = self.allocate(new_size, old.label())?;
        region.copy_from(old);
        Ok(region)
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
