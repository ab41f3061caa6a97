/// VulkanDevice - Vulkan implementation of DeviceCapabilities and MemoryProvider
///
/// Headless: no surface or swapchain. The physical device must support
/// VK_EXT_descriptor_buffer and bufferDeviceAddress; records written into
/// descriptor slabs are then bound by device address.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use galaxy_3d_frame_alloc::galaxy3d::{Error, Result};
use galaxy_3d_frame_alloc::galaxy3d::device::{
    BindingLayout, DescriptorKind, DeviceCapabilities, MemoryProvider, MemoryRegion,
};
use galaxy_3d_frame_alloc::{engine_debug, engine_err, engine_error, engine_fail, engine_info};
use rustc_hash::FxHashMap;
use std::ffi::CString;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_descriptor::{descriptor_type_to_vk, layout_bindings, DescriptorBufferLimits};
use crate::vulkan_memory::VulkanMemory;

// ===== CONFIG =====

/// Vulkan backend configuration
#[derive(Debug, Clone)]
pub struct VulkanConfig {
    /// Enable VK_LAYER_KHRONOS_validation (needs the `vulkan-validation` feature)
    pub enable_validation: bool,
    /// Application name reported to the driver
    pub app_name: String,
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Galaxy3D Application".to_string(),
        }
    }
}

// ===== DEVICE =====

pub struct VulkanDevice {
    /// Shared Vulkan context (kept alive by every region)
    ctx: Arc<VulkanContext>,
    limits: DescriptorBufferLimits,
    queue_family: u32,
    device_name: String,
    /// Descriptor-buffer set layouts, one per binding-layout shape
    layouts: Mutex<FxHashMap<BindingLayout, vk::DescriptorSetLayout>>,
}

impl VulkanDevice {
    /// Create a headless Vulkan device
    ///
    /// # Errors
    ///
    /// `InitializationFailed` if the Vulkan library cannot be loaded or no
    /// physical device supports descriptor buffers and buffer device addresses.
    pub fn new(config: VulkanConfig) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.clone())
                .unwrap_or_else(|_| CString::from(c"Galaxy3D Application"));
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Galaxy3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let enable_validation = Self::validation_requested(&config);

            let mut extension_names = Vec::new();
            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) = if enable_validation {
                match Self::create_debug_messenger(&entry, &instance) {
                    Ok(pair) => pair,
                    Err(error) => {
                        instance.destroy_instance(None);
                        return Err(error);
                    }
                }
            } else {
                (None, None)
            };

            let selected = Self::pick_physical_device(&instance);
            let (physical_device, queue_family) = match selected {
                Ok(selected) => selected,
                Err(error) => {
                    if let (Some(debug_utils), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                        debug_utils.destroy_debug_utils_messenger(messenger, None);
                    }
                    instance.destroy_instance(None);
                    return Err(error);
                }
            };

            // Device properties and descriptor buffer limits
            let mut descriptor_buffer_props = vk::PhysicalDeviceDescriptorBufferPropertiesEXT::default();
            let device_name = {
                let mut props2 = vk::PhysicalDeviceProperties2::default()
                    .push_next(&mut descriptor_buffer_props);
                instance.get_physical_device_properties2(physical_device, &mut props2);
                props2
                    .properties
                    .device_name_as_c_str()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| "Unknown device".to_string())
            };
            let limits = DescriptorBufferLimits::from_properties(&descriptor_buffer_props);

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];

            let device_extension_names = [ash::ext::descriptor_buffer::NAME.as_ptr()];

            let mut descriptor_buffer_features = vk::PhysicalDeviceDescriptorBufferFeaturesEXT::default()
                .descriptor_buffer(true);
            let mut vulkan12_features = vk::PhysicalDeviceVulkan12Features::default()
                .buffer_device_address(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .push_next(&mut descriptor_buffer_features)
                .push_next(&mut vulkan12_features);

            let device = match instance.create_device(physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    engine_error!("galaxy3d::vulkan", "Failed to create logical device: {:?}", e);
                    if let (Some(debug_utils), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                        debug_utils.destroy_debug_utils_messenger(messenger, None);
                    }
                    instance.destroy_instance(None);
                    return Err(Error::InitializationFailed(format!("Failed to create device: {:?}", e)));
                }
            };

            // Create GPU allocator
            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: true,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    engine_error!("galaxy3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                    device.destroy_device(None);
                    if let (Some(debug_utils), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                        debug_utils.destroy_debug_utils_messenger(messenger, None);
                    }
                    instance.destroy_instance(None);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            let descriptor_buffer = ash::ext::descriptor_buffer::Device::new(&instance, &device);

            // From here on VulkanContext::drop tears everything down
            let ctx = Arc::new(VulkanContext::new(
                entry,
                instance,
                physical_device,
                device,
                allocator,
                descriptor_buffer,
                debug_utils_loader,
                debug_messenger,
            ));

            engine_info!(
                "galaxy3d::vulkan",
                "Vulkan device '{}' ready (queue family {}, record alignment {})",
                device_name,
                queue_family,
                limits.offset_alignment
            );

            Ok(Self {
                ctx,
                limits,
                queue_family,
                device_name,
                layouts: Mutex::new(FxHashMap::default()),
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    fn validation_requested(config: &VulkanConfig) -> bool {
        config.enable_validation
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn validation_requested(config: &VulkanConfig) -> bool {
        if config.enable_validation {
            galaxy_3d_frame_alloc::engine_warn!(
                "galaxy3d::vulkan",
                "Validation requested but the 'vulkan-validation' feature is disabled"
            );
        }
        false
    }

    #[cfg(feature = "vulkan-validation")]
    unsafe fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
        crate::debug::init_debug_config();

        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        let messenger = debug_utils
            .create_debug_utils_messenger(&debug_info, None)
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create debug messenger: {:?}", e);
                Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
            })?;

        Ok((Some(debug_utils), Some(messenger)))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    unsafe fn create_debug_messenger(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        Ok((None, None))
    }

    /// First physical device with descriptor buffers, buffer device
    /// addresses and a graphics or compute queue
    unsafe fn pick_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        for physical_device in physical_devices {
            let extensions = instance
                .enumerate_device_extension_properties(physical_device)
                .unwrap_or_default();
            let has_descriptor_buffer = extensions.iter().any(|ext| {
                ext.extension_name_as_c_str()
                    .map(|name| name == ash::ext::descriptor_buffer::NAME)
                    .unwrap_or(false)
            });
            if !has_descriptor_buffer {
                continue;
            }

            let mut descriptor_buffer_features = vk::PhysicalDeviceDescriptorBufferFeaturesEXT::default();
            let mut vulkan12_features = vk::PhysicalDeviceVulkan12Features::default();
            let mut features2 = vk::PhysicalDeviceFeatures2::default()
                .push_next(&mut descriptor_buffer_features)
                .push_next(&mut vulkan12_features);
            instance.get_physical_device_features2(physical_device, &mut features2);
            if descriptor_buffer_features.descriptor_buffer == vk::FALSE
                || vulkan12_features.buffer_device_address == vk::FALSE
            {
                continue;
            }

            let queue_family = instance
                .get_physical_device_queue_family_properties(physical_device)
                .iter()
                .position(|qf| {
                    qf.queue_flags.intersects(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
                });
            if let Some(queue_family) = queue_family {
                return Ok((physical_device, queue_family as u32));
            }
        }

        engine_error!("galaxy3d::vulkan", "No GPU with VK_EXT_descriptor_buffer and bufferDeviceAddress found");
        Err(Error::InitializationFailed(
            "No GPU with VK_EXT_descriptor_buffer and bufferDeviceAddress found".to_string(),
        ))
    }

    // ===== ACCESSORS =====

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    pub fn limits(&self) -> &DescriptorBufferLimits {
        &self.limits
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        &self.ctx
    }

    /// Wait until the device has finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device.device_wait_idle()
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to wait for device idle: {:?}", e))
        }
    }

    // ===== DESCRIPTORS =====

    /// Encode a buffer descriptor for `SlabField::Record`
    ///
    /// `address` is a buffer device address (e.g. a region's
    /// `base_address()` plus an offset) and `range` the bound byte count.
    /// Only `UniformBuffer` and `StorageBuffer` are buffer descriptors.
    pub fn buffer_descriptor(&self, kind: DescriptorKind, address: u64, range: u64) -> Result<Vec<u8>> {
        let size = match (kind, self.limits.size_of(kind)) {
            (DescriptorKind::UniformBuffer | DescriptorKind::StorageBuffer, Some(size)) => size,
            _ => engine_fail!("galaxy3d::vulkan", Error::UnsupportedRecordType(kind)),
        };

        let address_info = vk::DescriptorAddressInfoEXT::default()
            .address(address)
            .range(range)
            .format(vk::Format::UNDEFINED);

        let data = if kind == DescriptorKind::UniformBuffer {
            vk::DescriptorDataEXT { p_uniform_buffer: &address_info }
        } else {
            vk::DescriptorDataEXT { p_storage_buffer: &address_info }
        };

        let get_info = vk::DescriptorGetInfoEXT::default()
            .ty(descriptor_type_to_vk(kind))
            .data(data);

        let mut bytes = vec![0u8; size as usize];
        unsafe {
            self.ctx.descriptor_buffer.get_descriptor(&get_info, &mut bytes);
        }
        Ok(bytes)
    }

    fn set_layout(&self, layout: &BindingLayout) -> Result<vk::DescriptorSetLayout> {
        let mut layouts = self.layouts
            .lock()
            .map_err(|_| engine_err!("galaxy3d::vulkan", "Descriptor set layout cache lock poisoned"))?;

        if let Some(&set_layout) = layouts.get(layout) {
            return Ok(set_layout);
        }

        let bindings = layout_bindings(&layout.entries);
        let create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(vk::DescriptorSetLayoutCreateFlags::DESCRIPTOR_BUFFER_EXT)
            .bindings(&bindings);

        let set_layout = unsafe {
            self.ctx.device.create_descriptor_set_layout(&create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create descriptor set layout: {:?}", e))?
        };

        engine_debug!(
            "galaxy3d::vulkan",
            "Descriptor set layout created for {:?}",
            layout.entries
        );
        layouts.insert(layout.clone(), set_layout);
        Ok(set_layout)
    }
}

impl DeviceCapabilities for VulkanDevice {
    fn descriptor_size(&self, kind: DescriptorKind) -> Option<u64> {
        self.limits.size_of(kind)
    }

    fn descriptor_alignment(&self) -> u64 {
        self.limits.offset_alignment
    }

    fn layout_size(&self, layout: &BindingLayout) -> Result<u64> {
        for &kind in &layout.entries {
            if self.limits.size_of(kind).is_none() {
                engine_fail!("galaxy3d::vulkan", Error::UnsupportedRecordType(kind));
            }
        }
        let set_layout = self.set_layout(layout)?;
        unsafe {
            Ok(self.ctx.descriptor_buffer.get_descriptor_set_layout_size(set_layout))
        }
    }
}

impl MemoryProvider for VulkanDevice {
    fn allocate(&self, size: u64, label: &str) -> Result<MemoryRegion> {
        let memory = VulkanMemory::new(Arc::clone(&self.ctx), size, label)?;
        Ok(MemoryRegion::new(Box::new(memory)))
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            if let Ok(mut layouts) = self.layouts.lock() {
                for (_, set_layout) in layouts.drain() {
                    self.ctx.device.destroy_descriptor_set_layout(set_layout, None);
                }
            }
        }
    }
}
