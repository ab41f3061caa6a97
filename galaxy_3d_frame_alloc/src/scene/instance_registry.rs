/// Instance and primitive tables for GPU-driven indirect drawing.
///
/// The registry composes:
/// - an instance `SlotPool`, whose slots index `InstanceRecord`s
/// - a primitive `SlotPool`, whose slots index draw parameters
/// - a `FrameRing` of instance-record regions, one per frame in flight
///
/// Only the current generation is ever written directly. Writes meant for
/// other generations (identity on acquire, zero on release) are queued per
/// generation and applied on that generation's next visit, so the device
/// never sees a generation change while it may still be reading it.
///
/// ```text
/// frame f   : acquire i -> gen(f)   = identity, pending[others] += identity
///             tick i T  -> gen(f)   = { prev: gen(f-1)[i].current, current: T }
/// frame f+1 : advance   -> pending[f+1] applied
///             tick i T' -> gen(f+1) = { prev: T, current: T' }
/// ```

use std::sync::Arc;
use glam::Mat4;
use rustc_hash::FxHashMap;
use crate::config::Config;
use crate::device::{MemoryProvider, MemoryRegion};
use crate::error::{Error, Result};
use crate::frame::FrameRing;
use crate::utils::SlotPool;
use super::instance_record::{
    IndirectDrawCommand, InstanceFlags, InstanceRecord, PrimitiveMeta,
};

// ===== PRIMITIVES =====

#[derive(Debug, Clone, Copy)]
struct PrimitiveEntry {
    instance: u32,
    meta: PrimitiveMeta,
    /// Position in `draw_list`
    draw_slot: usize,
}

/// One live primitive, as seen by indirect-command emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivePrimitive {
    pub primitive: u32,
    pub instance: u32,
    pub meta: PrimitiveMeta,
}

// ===== INSTANCE REGISTRY =====

pub struct InstanceRegistry {
    instances: SlotPool,
    primitives: SlotPool,
    records: FrameRing<MemoryRegion>,
    /// Writes queued per generation, applied on its next visit
    pending: Vec<FxHashMap<u32, InstanceRecord>>,
    /// Records written to the current generation this frame
    frame_writes: FxHashMap<u32, InstanceRecord>,
    flags: Vec<InstanceFlags>,
    instance_primitives: Vec<Vec<u32>>,
    primitive_entries: Vec<Option<PrimitiveEntry>>,
    /// Live primitive indices, unordered after any release
    draw_list: Vec<u32>,
    provider: Arc<dyn MemoryProvider>,
    retired: Vec<MemoryRegion>,
}

impl InstanceRegistry {
    /// Create a registry sized from `config`
    pub fn new(config: &Config, provider: Arc<dyn MemoryProvider>) -> Result<Self> {
        config.validate()?;

        let mut instances = SlotPool::new(config.initial_instance_capacity, config.instance_growth_chunk);
        let mut primitives = SlotPool::new(config.initial_primitive_capacity, config.primitive_growth_chunk);
        if let Some(max) = config.max_slots {
            instances = instances.with_max_capacity(max);
            primitives = primitives.with_max_capacity(max);
        }

        let region_size = instances.capacity() as u64 * InstanceRecord::SIZE;
        let regions = (0..config.frames_in_flight)
            .map(|generation| {
                provider.allocate(region_size, &format!("instance_records[{}]", generation))
            })
            .collect::<Result<Vec<_>>>()?;
        let records = FrameRing::from_generations(regions).ok_or_else(|| {
            Error::InitializationFailed("Instance registry needs at least one generation".to_string())
        })?;

        crate::engine_debug!(
            "galaxy3d::InstanceRegistry",
            "Created with {} generations, {} instances, {} primitives",
            config.frames_in_flight,
            instances.capacity(),
            primitives.capacity()
        );

        Ok(Self {
            pending: (0..config.frames_in_flight).map(|_| FxHashMap::default()).collect(),
            frame_writes: FxHashMap::default(),
            flags: vec![InstanceFlags::empty(); instances.capacity() as usize],
            instance_primitives: vec![Vec::new(); instances.capacity() as usize],
            primitive_entries: vec![None; primitives.capacity() as usize],
            draw_list: Vec::new(),
            instances,
            primitives,
            records,
            provider,
            retired: Vec::new(),
        })
    }

    // ===== FRAME =====

    /// Start the next frame and apply the writes queued for the new current generation
    pub fn advance(&mut self) -> Result<()> {
        self.records.advance();
        self.frame_writes.clear();
        self.apply_pending(self.records.current())
    }

    pub fn current(&self) -> u32 {
        self.records.current()
    }

    pub fn previous(&self) -> u32 {
        self.records.previous()
    }

    pub fn frame(&self) -> u64 {
        self.records.frame()
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.records.frames_in_flight()
    }

    // ===== INSTANCES =====

    /// Allocate an instance slot with an identity record in every generation
    ///
    /// Grows the instance table (and every generation's region) when full.
    pub fn acquire_instance(&mut self) -> Result<u32> {
        let index = self.instances.allocate()?;

        if let Err(error) = self.ensure_instance_storage() {
            self.instances.release(index)?;
            return Err(error);
        }

        let current = self.records.current();
        for generation in 0..self.records.frames_in_flight() {
            if generation != current {
                self.pending[generation as usize].insert(index, InstanceRecord::identity());
            }
        }
        self.write_current(index, InstanceRecord::identity())?;
        self.flags[index as usize] = InstanceFlags::empty();

        crate::engine_trace!("galaxy3d::InstanceRegistry", "Acquired instance {}", index);
        Ok(index)
    }

    /// Release an instance and every primitive attached to it
    ///
    /// Draw entries are removed immediately. The instance record is zeroed
    /// in each generation on that generation's next visit.
    pub fn release_instance(&mut self, index: u32) -> Result<()> {
        if index >= self.instances.capacity() {
            crate::engine_fail!("galaxy3d::InstanceRegistry", Error::InvalidInstance(index));
        }
        self.instances.release(index)?;

        for primitive in std::mem::take(&mut self.instance_primitives[index as usize]) {
            self.remove_primitive(primitive)?;
        }

        self.frame_writes.remove(&index);
        for pending in &mut self.pending {
            pending.insert(index, InstanceRecord::zeroed());
        }
        self.flags[index as usize] = InstanceFlags::empty();

        crate::engine_trace!("galaxy3d::InstanceRegistry", "Released instance {}", index);
        Ok(())
    }

    /// Write this frame's transform of `index` into the current generation
    ///
    /// The record's previous transform is the current transform stored in
    /// the previous generation.
    pub fn tick(&mut self, index: u32, transform: Mat4) -> Result<()> {
        self.check_live(index)?;
        self.apply_pending(self.records.current())?;

        let previous = self.record(self.records.previous(), index)?;
        let record = InstanceRecord {
            previous_transform: previous.current_transform,
            current_transform: transform,
            flags: self.flags[index as usize].bits(),
            _pad: [0; 3],
        };
        self.write_current(index, record)
    }

    /// Set the flags written by the next `tick` of `index`
    pub fn set_flags(&mut self, index: u32, flags: InstanceFlags) -> Result<()> {
        self.check_live(index)?;
        self.flags[index as usize] = flags;
        Ok(())
    }

    pub fn flags(&self, index: u32) -> Option<InstanceFlags> {
        if self.instances.is_allocated(index) {
            Some(self.flags[index as usize])
        } else {
            None
        }
    }

    /// Record of `index` in `generation`, including writes not yet applied
    pub fn record(&self, generation: u32, index: u32) -> Result<InstanceRecord> {
        if index >= self.instances.capacity() {
            return Err(Error::InvalidInstance(index));
        }
        let region = self.records.get(generation).ok_or_else(|| {
            Error::InvalidResource(format!("Generation {} out of range", generation))
        })?;
        if let Some(record) = self.pending[generation as usize].get(&index) {
            return Ok(*record);
        }
        region.read_pod(index as u64 * InstanceRecord::SIZE)
    }

    pub fn is_live(&self, index: u32) -> bool {
        self.instances.is_allocated(index)
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len()
    }

    pub fn instance_capacity(&self) -> u32 {
        self.instances.capacity()
    }

    /// Instance-record region of `generation` (for binding)
    pub fn region(&self, generation: u32) -> Option<&MemoryRegion> {
        self.records.get(generation)
    }

    // ===== PRIMITIVES =====

    /// Attach a primitive to a live instance
    pub fn acquire_primitive(&mut self, instance: u32, meta: PrimitiveMeta) -> Result<u32> {
        self.check_live(instance)?;

        let primitive = self.primitives.allocate()?;
        let capacity = self.primitives.capacity() as usize;
        if self.primitive_entries.len() < capacity {
            self.primitive_entries.resize(capacity, None);
        }

        self.primitive_entries[primitive as usize] = Some(PrimitiveEntry {
            instance,
            meta,
            draw_slot: self.draw_list.len(),
        });
        self.draw_list.push(primitive);
        self.instance_primitives[instance as usize].push(primitive);
        Ok(primitive)
    }

    /// Detach and release one primitive
    pub fn release_primitive(&mut self, primitive: u32) -> Result<()> {
        let instance = match self.primitive_entries.get(primitive as usize).copied().flatten() {
            Some(entry) => entry.instance,
            None => return self.primitives.release(primitive),
        };
        self.instance_primitives[instance as usize].retain(|&p| p != primitive);
        self.remove_primitive(primitive)
    }

    fn remove_primitive(&mut self, primitive: u32) -> Result<()> {
        if let Some(entry) = self.primitive_entries[primitive as usize].take() {
            self.draw_list.swap_remove(entry.draw_slot);
            if let Some(&moved) = self.draw_list.get(entry.draw_slot) {
                if let Some(moved_entry) = self.primitive_entries[moved as usize].as_mut() {
                    moved_entry.draw_slot = entry.draw_slot;
                }
            }
        }
        self.primitives.release(primitive)
    }

    /// Primitives attached to `instance`
    pub fn primitives_of(&self, instance: u32) -> &[u32] {
        if self.instances.is_allocated(instance) {
            &self.instance_primitives[instance as usize]
        } else {
            &[]
        }
    }

    /// Iterate live primitives (order changes after any release)
    pub fn live_primitives(&self) -> impl Iterator<Item = LivePrimitive> + '_ {
        self.draw_list.iter().filter_map(move |&primitive| {
            self.primitive_entries[primitive as usize].map(|entry| LivePrimitive {
                primitive,
                instance: entry.instance,
                meta: entry.meta,
            })
        })
    }

    /// One indexed indirect draw per live primitive
    pub fn emit_indirect_commands(&self) -> Vec<IndirectDrawCommand> {
        self.live_primitives()
            .map(|live| IndirectDrawCommand::new(&live.meta, live.instance))
            .collect()
    }

    /// Indirect draws of primitives whose instance is flagged `VISIBLE`
    pub fn emit_visible_commands(&self) -> Vec<IndirectDrawCommand> {
        self.live_primitives()
            .filter(|live| self.flags[live.instance as usize].contains(InstanceFlags::VISIBLE))
            .map(|live| IndirectDrawCommand::new(&live.meta, live.instance))
            .collect()
    }

    pub fn primitive_count(&self) -> u32 {
        self.primitives.len()
    }

    pub fn primitive_capacity(&self) -> u32 {
        self.primitives.capacity()
    }

    /// Take the regions displaced by growth since the last call
    pub fn take_retired(&mut self) -> Vec<MemoryRegion> {
        std::mem::take(&mut self.retired)
    }

    /// Give up every region (registry destruction)
    pub fn into_regions(self) -> Vec<MemoryRegion> {
        let mut regions = self.retired;
        regions.extend(self.records.into_generations());
        regions
    }

    // ===== INTERNALS =====

    fn check_live(&self, index: u32) -> Result<()> {
        if !self.instances.is_allocated(index) {
            crate::engine_fail!("galaxy3d::InstanceRegistry", Error::InvalidInstance(index));
        }
        Ok(())
    }

    fn write_current(&mut self, index: u32, record: InstanceRecord) -> Result<()> {
        let current = self.records.current();
        self.pending[current as usize].remove(&index);
        self.records
            .current_value_mut()
            .write_pod(index as u64 * InstanceRecord::SIZE, &record)?;
        self.frame_writes.insert(index, record);
        Ok(())
    }

    fn apply_pending(&mut self, generation: u32) -> Result<()> {
        let pending = std::mem::take(&mut self.pending[generation as usize]);
        if pending.is_empty() {
            return Ok(());
        }
        let region = self.records.get_mut(generation).ok_or_else(|| {
            Error::InvalidResource(format!("Generation {} out of range", generation))
        })?;
        for (index, record) in &pending {
            region.write_pod(*index as u64 * InstanceRecord::SIZE, record)?;
        }
        crate::engine_trace!(
            "galaxy3d::InstanceRegistry",
            "Generation {}: applied {} pending record(s)",
            generation,
            pending.len()
        );
        Ok(())
    }

    /// Resize every generation to the instance pool's capacity
    ///
    /// The new current region is seeded from the previous generation, then
    /// receives the previous generation's unapplied writes and this frame's
    /// writes so nothing written before the growth is lost.
    fn ensure_instance_storage(&mut self) -> Result<()> {
        let capacity = self.instances.capacity();
        let required = capacity as u64 * InstanceRecord::SIZE;
        if self.records.current_value().len() == required {
            return Ok(());
        }

        let current = self.records.current();
        let previous = self.records.previous();
        let displaced = self.records.resize(capacity, InstanceRecord::SIZE, self.provider.as_ref())?;

        let region = self.records.current_value_mut();
        if previous != current {
            for (index, record) in &self.pending[previous as usize] {
                region.write_pod(*index as u64 * InstanceRecord::SIZE, record)?;
            }
        }
        for (index, record) in &self.frame_writes {
            region.write_pod(*index as u64 * InstanceRecord::SIZE, record)?;
        }

        self.flags.resize(capacity as usize, InstanceFlags::empty());
        self.instance_primitives.resize(capacity as usize, Vec::new());

        crate::engine_debug!(
            "galaxy3d::InstanceRegistry",
            "Instance storage grown to {} records, {} region(s) retired",
            capacity,
            displaced.len()
        );
        self.retired.extend(displaced);
        Ok(())
    }
}

#[cfg(test)]
#[path = "instance_registry_tests.rs"]
mod tests;
