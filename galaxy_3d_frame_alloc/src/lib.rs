/*!
# Galaxy 3D Frame Allocator

Frame-pipelined GPU resource allocation for the Galaxy 3D engine.

The CPU prepares frame `f + 1` while the device still reads frame `f`.
Every resource the CPU writes per frame is therefore kept in N copies
(one per frame in flight), and every resource the device may still read is
released only once the device is known to be done with it.

## Architecture

- **SlotPool**: free-list of slot indices with chunked growth
- **FrameRing**: N-way buffered resource and the frame counter
- **DeferredReclaimQueue**: release actions delayed by a full ring rotation
- **DescriptorSlab**: fixed-stride resource-binding records in one region
- **InstanceRegistry**: per-frame instance records and indirect draw commands
- **FrameAllocator**: ties the above to the frame clock

Device access goes through the `DeviceCapabilities` and `MemoryProvider`
traits. `HostDevice` implements both in host memory; backend crates
(Vulkan) provide the real ones.
*/

// Internal modules
mod error;
mod engine;
mod config;
mod allocator;
pub mod log;
pub mod device;
pub mod utils;
pub mod frame;
pub mod slab;
pub mod scene;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::Config;

    // Allocator entry point
    pub use crate::allocator::{FrameAllocator, SlabKey};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, MemoryLogger};
    }

    // Device collaborators
    pub mod device {
        pub use crate::device::*;
    }

    // Slot index pools
    pub mod utils {
        pub use crate::utils::*;
    }

    // Frame ring and deferred reclaim
    pub mod frame {
        pub use crate::frame::*;
    }

    // Descriptor slabs
    pub mod slab {
        pub use crate::slab::*;
    }

    // Instance tables
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
