/// Instance tables for GPU-driven indirect drawing

pub mod instance_record;
pub mod instance_registry;

pub use instance_record::{IndirectDrawCommand, InstanceFlags, InstanceRecord, PrimitiveMeta};
pub use instance_registry::{InstanceRegistry, LivePrimitive};
