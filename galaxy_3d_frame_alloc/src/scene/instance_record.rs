/// GPU-visible per-instance and per-draw records.
///
/// All types here are `#[repr(C)]` and `bytemuck::Pod` so they can be
/// written into device memory byte for byte.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

// ===== INSTANCE FLAGS =====

bitflags! {
    /// Per-instance visibility flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InstanceFlags: u32 {
        const VISIBLE        = 1 << 0;
        const CAST_SHADOW    = 1 << 1;
        const RECEIVE_SHADOW = 1 << 2;
    }
}

// ===== INSTANCE RECORD =====

/// Transform history of one instance in one generation (144 bytes)
///
/// `previous_transform` is last frame's `current_transform`; shaders use
/// the pair to compute motion vectors.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceRecord {
    pub previous_transform: Mat4,
    pub current_transform: Mat4,
    pub flags: u32,
    pub _pad: [u32; 3],
}

impl InstanceRecord {
    /// Size of one record in bytes
    pub const SIZE: u64 = std::mem::size_of::<InstanceRecord>() as u64;

    /// Record of a freshly acquired instance: identity transforms, no flags
    pub fn identity() -> Self {
        Self {
            previous_transform: Mat4::IDENTITY,
            current_transform: Mat4::IDENTITY,
            flags: 0,
            _pad: [0; 3],
        }
    }

    /// Record of a released instance: all bytes zero
    pub fn zeroed() -> Self {
        <Self as Zeroable>::zeroed()
    }

    pub fn flags(&self) -> InstanceFlags {
        InstanceFlags::from_bits_truncate(self.flags)
    }
}

// ===== PRIMITIVE META =====

/// Draw parameters of one primitive (a sub-range of a mesh's index buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimitiveMeta {
    pub index_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub material_id: u32,
}

// ===== INDIRECT DRAW COMMAND =====

/// One indexed indirect draw (matches `VkDrawIndexedIndirectCommand`)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct IndirectDrawCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    /// Instance slot; shaders index the instance records with it
    pub first_instance: u32,
}

impl IndirectDrawCommand {
    pub fn new(meta: &PrimitiveMeta, instance: u32) -> Self {
        Self {
            index_count: meta.index_count,
            instance_count: 1,
            first_index: meta.first_index,
            vertex_offset: meta.vertex_offset,
            first_instance: instance,
        }
    }
}

#[cfg(test)]
#[path = "instance_record_tests.rs"]
mod tests;
