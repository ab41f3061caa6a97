/// Frame allocator - entry point tying the components to the frame clock.
///
/// Owns one `InstanceRegistry` (which owns the frame ring), every
/// descriptor slab, and one `DeferredReclaimQueue`. Regions displaced by
/// growth or destruction are moved into the reclaim queue under the current
/// generation and dropped once that generation comes due again.
///
/// Per-frame protocol:
///
/// ```ignore
/// // after waiting on the fence of the generation about to be reused
/// allocator.begin_frame()?;
/// for (instance, transform) in moved {
///     allocator.tick(instance, transform)?;
/// }
/// let draws = allocator.emit_indirect_commands();
/// // record and submit
/// ```

use std::sync::Arc;
use glam::Mat4;
use slotmap::{new_key_type, SlotMap};
use crate::config::Config;
use crate::device::{DeviceCapabilities, MemoryProvider, MemoryRegion};
use crate::error::{Error, Result};
use crate::frame::DeferredReclaimQueue;
use crate::scene::{IndirectDrawCommand, InstanceFlags, InstanceRecord, InstanceRegistry, PrimitiveMeta};
use crate::slab::{DescriptorSlab, SlabDesc, SlabField};
use crate::{engine_debug, engine_info};

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a DescriptorSlab within a FrameAllocator.
    ///
    /// Keys remain valid until their own slab is destroyed.
    pub struct SlabKey;
}

// ===== FRAME ALLOCATOR =====

pub struct FrameAllocator {
    config: Config,
    capabilities: Arc<dyn DeviceCapabilities>,
    memory: Arc<dyn MemoryProvider>,
    registry: InstanceRegistry,
    slabs: SlotMap<SlabKey, DescriptorSlab>,
    reclaim: DeferredReclaimQueue,
}

impl FrameAllocator {
    /// Create an allocator over a device's capability and memory collaborators
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use galaxy_3d_frame_alloc::galaxy3d::{Config, FrameAllocator, device::HostDevice};
    ///
    /// let device = Arc::new(HostDevice::new());
    /// let mut allocator = FrameAllocator::new(Config::default(), device.clone(), device)?;
    /// let instance = allocator.acquire_instance()?;
    /// # Ok::<(), galaxy_3d_frame_alloc::galaxy3d::Error>(())
    /// ```
    pub fn new(
        config: Config,
        capabilities: Arc<dyn DeviceCapabilities>,
        memory: Arc<dyn MemoryProvider>,
    ) -> Result<Self> {
        if let Err(error) = config.validate() {
            crate::engine_fail!("galaxy3d::FrameAllocator", error);
        }

        let registry = InstanceRegistry::new(&config, Arc::clone(&memory))?;
        let reclaim = DeferredReclaimQueue::new(config.frames_in_flight);

        engine_info!(
            "galaxy3d::FrameAllocator",
            "Frame allocator created ({} frames in flight)",
            config.frames_in_flight
        );

        Ok(Self {
            config,
            capabilities,
            memory,
            registry,
            slabs: SlotMap::with_key(),
            reclaim,
        })
    }

    // ===== FRAME =====

    /// Start the next frame
    ///
    /// Advances the frame ring, then runs the reclaim actions of the
    /// generation that just became current. Call once per frame, after the
    /// device has finished the work that last read this generation.
    /// Returns the number of reclaimed resources.
    pub fn begin_frame(&mut self) -> Result<usize> {
        self.registry.advance()?;
        let current = self.registry.current();
        let reclaimed = self.reclaim.flush(current);
        engine_debug!(
            "galaxy3d::FrameAllocator",
            "Frame {} (generation {}): {} reclaimed, {} pending",
            self.registry.frame(),
            current,
            reclaimed,
            self.reclaim.total_pending()
        );
        Ok(reclaimed)
    }

    pub fn current(&self) -> u32 {
        self.registry.current()
    }

    pub fn previous(&self) -> u32 {
        self.registry.previous()
    }

    pub fn frame(&self) -> u64 {
        self.registry.frame()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> &Arc<dyn DeviceCapabilities> {
        &self.capabilities
    }

    // ===== DEFERRED RECLAIM =====

    /// Queue `action` to run once the current generation comes due again
    pub fn defer(&mut self, action: impl FnOnce() + Send + 'static) {
        self.reclaim.push(self.registry.current(), action);
    }

    fn retire(&mut self, regions: Vec<MemoryRegion>) {
        if regions.is_empty() {
            return;
        }
        let current = self.registry.current();
        for region in regions {
            crate::engine_trace!(
                "galaxy3d::FrameAllocator",
                "Retiring region '{}' at {:#x} under generation {}",
                region.label(),
                region.base_address(),
                current
            );
            self.reclaim.push(current, move || drop(region));
        }
    }

    /// Number of reclaim actions not yet executed
    pub fn pending_reclaims(&self) -> usize {
        self.reclaim.total_pending()
    }

    /// Run every pending reclaim action
    ///
    /// The caller must have waited for the device to go idle.
    pub fn wait_idle_and_reclaim(&mut self) -> usize {
        self.reclaim.flush_all()
    }

    // ===== INSTANCES =====

    pub fn acquire_instance(&mut self) -> Result<u32> {
        let result = self.registry.acquire_instance();
        let retired = self.registry.take_retired();
        self.retire(retired);
        result
    }

    pub fn release_instance(&mut self, instance: u32) -> Result<()> {
        self.registry.release_instance(instance)
    }

    pub fn acquire_primitive(&mut self, instance: u32, meta: PrimitiveMeta) -> Result<u32> {
        self.registry.acquire_primitive(instance, meta)
    }

    pub fn release_primitive(&mut self, primitive: u32) -> Result<()> {
        self.registry.release_primitive(primitive)
    }

    pub fn tick(&mut self, instance: u32, transform: Mat4) -> Result<()> {
        self.registry.tick(instance, transform)
    }

    pub fn set_flags(&mut self, instance: u32, flags: InstanceFlags) -> Result<()> {
        self.registry.set_flags(instance, flags)
    }

    pub fn instance_record(&self, generation: u32, instance: u32) -> Result<InstanceRecord> {
        self.registry.record(generation, instance)
    }

    pub fn emit_indirect_commands(&self) -> Vec<IndirectDrawCommand> {
        self.registry.emit_indirect_commands()
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    // ===== DESCRIPTOR SLABS =====

    /// Create a descriptor slab
    ///
    /// A `growth_chunk` of 0 in `desc` is replaced by the configured
    /// `descriptor_growth_chunk`; a missing ceiling by `max_slots`.
    pub fn create_slab(&mut self, mut desc: SlabDesc) -> Result<SlabKey> {
        if desc.growth_chunk == 0 {
            desc.growth_chunk = self.config.descriptor_growth_chunk;
        }
        if desc.max_capacity.is_none() {
            desc.max_capacity = self.config.max_slots;
        }
        let slab = DescriptorSlab::create(desc, self.capabilities.as_ref(), Arc::clone(&self.memory))?;
        Ok(self.slabs.insert(slab))
    }

    /// Destroy a slab; its regions are released once the device is done with them
    pub fn destroy_slab(&mut self, key: SlabKey) -> Result<()> {
        let Some(slab) = self.slabs.remove(key) else {
            crate::engine_fail!(
                "galaxy3d::FrameAllocator",
                Error::InvalidResource(format!("Unknown slab key {:?}", key))
            );
        };
        engine_debug!("galaxy3d::FrameAllocator", "Destroying slab '{}'", slab.name());
        let regions = slab.into_regions();
        self.retire(regions);
        Ok(())
    }

    pub fn slab(&self, key: SlabKey) -> Option<&DescriptorSlab> {
        self.slabs.get(key)
    }

    fn slab_mut(&mut self, key: SlabKey) -> Result<&mut DescriptorSlab> {
        match self.slabs.get_mut(key) {
            Some(slab) => Ok(slab),
            None => crate::engine_fail!(
                "galaxy3d::FrameAllocator",
                Error::InvalidResource(format!("Unknown slab key {:?}", key))
            ),
        }
    }

    /// Write one record into a slab (see `DescriptorSlab::write`)
    pub fn write_descriptors(
        &mut self,
        key: SlabKey,
        fields: &[SlabField],
        index: Option<u32>,
    ) -> Result<u32> {
        let slab = self.slab_mut(key)?;
        let result = slab.write(fields, index);
        let retired = slab.take_retired();
        self.retire(retired);
        result
    }

    pub fn release_descriptors(&mut self, key: SlabKey, index: u32) -> Result<()> {
        self.slab_mut(key)?.release(index)
    }

    pub fn grow_slab(&mut self, key: SlabKey, by: u32) -> Result<()> {
        let slab = self.slab_mut(key)?;
        let result = slab.grow(by);
        let retired = slab.take_retired();
        self.retire(retired);
        result
    }

    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }
}

impl Drop for FrameAllocator {
    fn drop(&mut self) {
        let pending = self.reclaim.total_pending();
        if pending > 0 {
            engine_debug!(
                "galaxy3d::FrameAllocator",
                "Dropping with {} pending reclaim(s)",
                pending
            );
        }
    }
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod tests;
