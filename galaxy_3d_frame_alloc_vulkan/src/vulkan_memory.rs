/// VulkanMemory - Vulkan implementation of DeviceMemory
///
/// A persistently mapped `CpuToGpu` buffer usable as a descriptor buffer,
/// a storage buffer, and through its device address.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use galaxy_3d_frame_alloc::galaxy3d::{Error, Result};
use galaxy_3d_frame_alloc::galaxy3d::device::DeviceMemory;
use galaxy_3d_frame_alloc::{engine_err, engine_error, engine_trace};
use std::sync::Arc;

use crate::vulkan_context::VulkanContext;

pub(crate) const REGION_USAGE: vk::BufferUsageFlags = vk::BufferUsageFlags::from_raw(
    vk::BufferUsageFlags::RESOURCE_DESCRIPTOR_BUFFER_EXT.as_raw()
        | vk::BufferUsageFlags::SAMPLER_DESCRIPTOR_BUFFER_EXT.as_raw()
        | vk::BufferUsageFlags::STORAGE_BUFFER.as_raw()
        | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS.as_raw(),
);

pub struct VulkanMemory {
    /// Shared Vulkan context (device, allocator)
    ctx: Arc<VulkanContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
    address: u64,
    label: String,
}

impl VulkanMemory {
    /// Create a zeroed region of `size` bytes
    pub(crate) fn new(ctx: Arc<VulkanContext>, size: u64, label: &str) -> Result<Self> {
        unsafe {
            // Vulkan forbids zero-sized buffers
            let buffer_size = size.max(1);
            let buffer_info = vk::BufferCreateInfo::default()
                .size(buffer_size)
                .usage(REGION_USAGE)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&buffer_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create region buffer '{}': {:?}", label, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = match ctx.allocator.lock() {
                Ok(mut allocator) => allocator.allocate(&AllocationCreateDesc {
                    name: label,
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                }),
                Err(_) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(engine_err!("galaxy3d::vulkan", "GPU allocator lock poisoned"));
                }
            };
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("galaxy3d::vulkan", "Out of GPU memory for region '{}' ({:.2} MB)", label, size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            // From here on Drop releases the buffer and the allocation
            let mut memory = Self {
                ctx,
                buffer,
                allocation: Some(allocation),
                size,
                address: 0,
                label: label.to_string(),
            };

            if let Some(allocation) = memory.allocation.as_mut() {
                memory.ctx.device
                    .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                    .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to bind region memory '{}': {:?}", label, e))?;

                match allocation.mapped_slice_mut() {
                    Some(bytes) => bytes.fill(0),
                    None => {
                        return Err(engine_err!("galaxy3d::vulkan", "Region '{}' is not host-mapped", label));
                    }
                }
            }

            let address_info = vk::BufferDeviceAddressInfo::default().buffer(buffer);
            memory.address = memory.ctx.device.get_buffer_device_address(&address_info);

            engine_trace!(
                "galaxy3d::vulkan",
                "Region '{}' allocated: {} bytes at {:#x}",
                memory.label,
                size,
                memory.address
            );
            Ok(memory)
        }
    }
}

impl DeviceMemory for VulkanMemory {
    fn size(&self) -> u64 {
        self.size
    }

    fn base_address(&self) -> u64 {
        self.address
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn mapped(&self) -> &[u8] {
        let size = self.size as usize;
        match self.allocation.as_ref().and_then(|a| a.mapped_slice()) {
            Some(bytes) => &bytes[..size],
            None => &[],
        }
    }

    fn mapped_mut(&mut self) -> &mut [u8] {
        let size = self.size as usize;
        match self.allocation.as_mut().and_then(|a| a.mapped_slice_mut()) {
            Some(bytes) => &mut bytes[..size],
            None => &mut [],
        }
    }
}

impl Drop for VulkanMemory {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            // Destroy buffer
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
