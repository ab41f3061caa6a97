/// Deferred destruction of resources the device may still be reading.
///
/// One pending list per generation. An action pushed while generation `g`
/// is current runs when `g` comes due again after a full ring rotation,
/// never during the flush of the rotation it was queued in.
///
/// Each slot counts its visits (`flush` calls). An action stores the visit
/// count at push time and runs at the first later visit, so a push that
/// happens after `flush(g)` in the same frame still waits a full rotation.

use std::collections::VecDeque;

/// Opaque release action
pub type ReclaimAction = Box<dyn FnOnce() + Send>;

struct PendingAction {
    epoch: u64,
    action: ReclaimAction,
}

#[derive(Default)]
struct ReclaimSlot {
    visits: u64,
    pending: VecDeque<PendingAction>,
}

pub struct DeferredReclaimQueue {
    slots: Vec<ReclaimSlot>,
}

impl DeferredReclaimQueue {
    /// Create a queue with one slot per frame in flight (at least 1)
    pub fn new(frames_in_flight: u32) -> Self {
        Self {
            slots: (0..frames_in_flight.max(1)).map(|_| ReclaimSlot::default()).collect(),
        }
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.slots.len() as u32
    }

    fn slot_mut(&mut self, generation: u32) -> &mut ReclaimSlot {
        let n = self.slots.len();
        &mut self.slots[generation as usize % n]
    }

    /// Queue `action` under generation `generation`
    pub fn push(&mut self, generation: u32, action: impl FnOnce() + Send + 'static) {
        let slot = self.slot_mut(generation);
        slot.pending.push_back(PendingAction {
            epoch: slot.visits,
            action: Box::new(action),
        });
    }

    /// Visit `generation`: run every action queued under it in a prior rotation
    ///
    /// Must be called once per frame for the generation that just became
    /// current. Returns the number of actions executed.
    pub fn flush(&mut self, generation: u32) -> usize {
        let slot = self.slot_mut(generation);
        slot.visits += 1;
        let visits = slot.visits;

        let mut executed = 0;
        while slot.pending.front().is_some_and(|entry| entry.epoch < visits) {
            if let Some(entry) = slot.pending.pop_front() {
                (entry.action)();
                executed += 1;
            }
        }

        if executed > 0 {
            crate::engine_trace!(
                "galaxy3d::DeferredReclaimQueue",
                "Generation {}: reclaimed {} resource(s), {} still pending",
                generation,
                executed,
                slot.pending.len()
            );
        }
        executed
    }

    /// Run every pending action regardless of generation
    ///
    /// Only valid once the device is idle (shutdown, device wait-idle).
    pub fn flush_all(&mut self) -> usize {
        let mut executed = 0;
        for slot in &mut self.slots {
            for entry in slot.pending.drain(..) {
                (entry.action)();
                executed += 1;
            }
        }
        if executed > 0 {
            crate::engine_debug!(
                "galaxy3d::DeferredReclaimQueue",
                "Flushed {} pending resource(s)",
                executed
            );
        }
        executed
    }

    /// Number of actions waiting under `generation`
    pub fn pending(&self, generation: u32) -> usize {
        self.slots
            .get(generation as usize % self.slots.len())
            .map_or(0, |slot| slot.pending.len())
    }

    pub fn total_pending(&self) -> usize {
        self.slots.iter().map(|slot| slot.pending.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_pending() == 0
    }
}

impl Drop for DeferredReclaimQueue {
    fn drop(&mut self) {
        let pending = self.total_pending();
        if pending > 0 {
            crate::engine_warn!(
                "galaxy3d::DeferredReclaimQueue",
                "Dropped with {} pending resource(s); releasing without waiting for the device",
                pending
            );
            self.flush_all();
        }
    }
}

#[cfg(test)]
#[path = "deferred_reclaim_tests.rs"]
mod tests;
