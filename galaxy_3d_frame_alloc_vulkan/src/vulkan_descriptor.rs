/// Descriptor kind mapping for VK_EXT_descriptor_buffer

use ash::vk;
use galaxy_3d_frame_alloc::galaxy3d::device::DescriptorKind;

/// Descriptor sizes and alignment reported by the physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBufferLimits {
    pub uniform_buffer: u64,
    pub storage_buffer: u64,
    pub sampled_image: u64,
    pub storage_image: u64,
    pub sampler: u64,
    pub combined_image_sampler: u64,
    /// 0 when acceleration structures are not enabled on the device
    pub acceleration_structure: u64,
    pub offset_alignment: u64,
}

impl DescriptorBufferLimits {
    pub fn from_properties(props: &vk::PhysicalDeviceDescriptorBufferPropertiesEXT<'_>) -> Self {
        Self {
            uniform_buffer: props.uniform_buffer_descriptor_size as u64,
            storage_buffer: props.storage_buffer_descriptor_size as u64,
            sampled_image: props.sampled_image_descriptor_size as u64,
            storage_image: props.storage_image_descriptor_size as u64,
            sampler: props.sampler_descriptor_size as u64,
            combined_image_sampler: props.combined_image_sampler_descriptor_size as u64,
            acceleration_structure: 0,
            offset_alignment: props.descriptor_buffer_offset_alignment.max(1),
        }
    }

    /// Byte size of one `kind` descriptor, `None` if the device has none
    pub fn size_of(&self, kind: DescriptorKind) -> Option<u64> {
        let size = match kind {
            DescriptorKind::UniformBuffer => self.uniform_buffer,
            DescriptorKind::StorageBuffer => self.storage_buffer,
            DescriptorKind::SampledImage => self.sampled_image,
            DescriptorKind::StorageImage => self.storage_image,
            DescriptorKind::Sampler => self.sampler,
            DescriptorKind::CombinedImageSampler => self.combined_image_sampler,
            DescriptorKind::AccelerationStructure => self.acceleration_structure,
        };
        (size > 0).then_some(size)
    }
}

pub(crate) fn descriptor_type_to_vk(kind: DescriptorKind) -> vk::DescriptorType {
    match kind {
        DescriptorKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        DescriptorKind::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        DescriptorKind::Sampler => vk::DescriptorType::SAMPLER,
        DescriptorKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        DescriptorKind::AccelerationStructure => vk::DescriptorType::ACCELERATION_STRUCTURE_KHR,
    }
}

/// One binding per layout entry, visible to every stage
pub(crate) fn layout_bindings(entries: &[DescriptorKind]) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
    entries
        .iter()
        .enumerate()
        .map(|(binding, &kind)| {
            vk::DescriptorSetLayoutBinding::default()
                .binding(binding as u32)
                .descriptor_type(descriptor_type_to_vk(kind))
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::ALL)
        })
        .collect()
}

#[cfg(test)]
#[path = "vulkan_descriptor_tests.rs"]
mod tests;
