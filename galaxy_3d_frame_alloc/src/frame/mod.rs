/// Frame pipelining: generation ring and deferred reclamation

pub mod frame_ring;
pub mod deferred_reclaim;

pub use frame_ring::FrameRing;
pub use deferred_reclaim::{DeferredReclaimQueue, ReclaimAction};
