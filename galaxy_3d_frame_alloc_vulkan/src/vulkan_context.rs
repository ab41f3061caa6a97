/// VulkanContext - Shared Vulkan objects for the device and its regions
///
/// Every `VulkanMemory` keeps an `Arc<VulkanContext>`, so the allocator,
/// device and instance outlive the last region. Destruction order:
/// allocator, debug messenger, device, instance.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

pub struct VulkanContext {
    /// Vulkan entry (keeps the loader alive)
    _entry: ash::Entry,

    pub instance: ash::Instance,

    pub physical_device: vk::PhysicalDevice,

    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop to ensure it's dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// VK_EXT_descriptor_buffer device functions
    pub descriptor_buffer: ash::ext::descriptor_buffer::Device,

    /// Debug utils loader (for validation layers)
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl VulkanContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        descriptor_buffer: ash::ext::descriptor_buffer::Device,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            descriptor_buffer,
            debug_utils_loader,
            debug_messenger,
        }
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            // 1. Wait for GPU to finish
            self.device.device_wait_idle().ok();

            // 2. Free VkDeviceMemory pages BEFORE destroying device
            ManuallyDrop::drop(&mut self.allocator);

            // 3. Destroy debug messenger BEFORE device and instance
            #[cfg(feature = "vulkan-validation")]
            crate::debug::cleanup_debug_config();
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, &self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }

            // 4. Destroy device and instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
