pub mod descriptor_slab;

pub use descriptor_slab::{DescriptorSlab, SlabDesc, SlabField};
