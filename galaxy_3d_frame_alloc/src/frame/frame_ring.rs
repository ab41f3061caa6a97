/// N-way buffering of a resource across frames in flight.
///
/// A `FrameRing` owns the frame counter and one value per generation.
/// `current` is the generation being written this frame, `previous` the one
/// written last frame. Every other component receives generation indices
/// from here instead of recomputing `frame % N` locally.
///
/// Caller contract: by the time generation `g` becomes current again, the
/// device has finished every read of `g` from the previous rotation.

use crate::device::{MemoryProvider, MemoryRegion};
use crate::error::Result;

#[derive(Debug)]
pub struct FrameRing<T> {
    generations: Vec<T>,
    frame: u64,
}

impl<T> FrameRing<T> {
    /// Create a ring of `frames_in_flight` generations (at least 1)
    ///
    /// `init` is called once per generation with its index.
    pub fn new(frames_in_flight: u32, mut init: impl FnMut(u32) -> T) -> Self {
        let count = frames_in_flight.max(1);
        Self {
            generations: (0..count).map(&mut init).collect(),
            frame: 0,
        }
    }

    /// Build a ring from already-constructed generations
    pub fn from_generations(generations: Vec<T>) -> Option<Self> {
        if generations.is_empty() {
            return None;
        }
        Some(Self { generations, frame: 0 })
    }

    /// Start the next frame
    pub fn advance(&mut self) {
        self.frame += 1;
    }

    /// Number of frames started since creation
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// N
    pub fn frames_in_flight(&self) -> u32 {
        self.generations.len() as u32
    }

    /// Generation written this frame (`frame mod N`)
    pub fn current(&self) -> u32 {
        (self.frame % self.generations.len() as u64) as u32
    }

    /// Generation written last frame (`(frame - 1 + N) mod N`)
    pub fn previous(&self) -> u32 {
        let n = self.frames_in_flight();
        (self.current() + n - 1) % n
    }

    pub fn get(&self, generation: u32) -> Option<&T> {
        self.generations.get(generation as usize)
    }

    pub fn get_mut(&mut self, generation: u32) -> Option<&mut T> {
        self.generations.get_mut(generation as usize)
    }

    pub fn current_value(&self) -> &T {
        &self.generations[self.current() as usize]
    }

    pub fn current_value_mut(&mut self) -> &mut T {
        let current = self.current() as usize;
        &mut self.generations[current]
    }

    pub fn previous_value(&self) -> &T {
        &self.generations[self.previous() as usize]
    }

    /// Iterate generations in index order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.generations.iter()
    }

    pub fn into_generations(self) -> Vec<T> {
        self.generations
    }
}

impl FrameRing<MemoryRegion> {
    /// Resize every generation to hold `slot_count` records of `record_size` bytes
    ///
    /// Generations are visited in ring order starting at `current`. A
    /// generation whose byte length no longer matches is replaced by a new
    /// region whose content is copied from the generation before it in ring
    /// order (for `current`, that is `previous`: the last fully written
    /// copy). Copies are `min(old, new)` bytes; the rest stays zeroed.
    ///
    /// Returns the displaced regions. The device may still be reading them,
    /// so the caller must defer their release.
    pub fn resize(
        &mut self,
        slot_count: u32,
        record_size: u64,
        provider: &dyn MemoryProvider,
    ) -> Result<Vec<MemoryRegion>> {
        let new_size = slot_count as u64 * record_size;
        let n = self.frames_in_flight();
        let current = self.current();
        let mut displaced = Vec::new();

        for step in 0..n {
            let generation = ((current + step) % n) as usize;
            if self.generations[generation].len() == new_size {
                continue;
            }

            let source = ((generation as u32 + n - 1) % n) as usize;
            let mut region = provider.allocate(new_size, self.generations[generation].label())?;
            let copied = region.copy_from(&self.generations[source]);

            crate::engine_debug!(
                "galaxy3d::FrameRing",
                "Generation {} of '{}' resized {} -> {} bytes ({} copied from generation {})",
                generation,
                region.label(),
                self.generations[generation].len(),
                new_size,
                copied,
                source
            );

            displaced.push(std::mem::replace(&mut self.generations[generation], region));
        }

        Ok(displaced)
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
