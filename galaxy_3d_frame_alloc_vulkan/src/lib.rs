/*!
# Galaxy 3D Frame Allocator - Vulkan Backend

Vulkan implementation of the galaxy_3d_frame_alloc device collaborators.

`VulkanDevice` implements `DeviceCapabilities` (descriptor sizes from
VK_EXT_descriptor_buffer) and `MemoryProvider` (persistently mapped
buffers allocated with gpu-allocator and addressed by buffer device
address), so a `FrameAllocator` can run directly on a GPU.

## Example

```no_run
use std::sync::Arc;
use galaxy_3d_frame_alloc::galaxy3d::{Config, FrameAllocator};
use galaxy_3d_frame_alloc_vulkan::galaxy3d::{VulkanConfig, VulkanDevice};

let device = Arc::new(VulkanDevice::new(VulkanConfig::default())?);
let mut allocator = FrameAllocator::new(Config::default(), device.clone(), device)?;
allocator.begin_frame()?;
# Ok::<(), galaxy_3d_frame_alloc::galaxy3d::Error>(())
```
*/

// Vulkan implementation modules
mod vulkan_context;
mod vulkan_descriptor;
mod vulkan_device;
mod vulkan_memory;
#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_context::VulkanContext;
pub use vulkan_descriptor::DescriptorBufferLimits;
pub use vulkan_device::{VulkanConfig, VulkanDevice};
pub use vulkan_memory::VulkanMemory;

// Re-export debug utilities
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};

// Main galaxy3d namespace module
pub mod galaxy3d {
    pub use crate::vulkan_device::{VulkanConfig, VulkanDevice};
    pub use crate::vulkan_descriptor::DescriptorBufferLimits;
}
