//! Allocator configuration
//!
//! Growth chunks are tuning parameters, not correctness requirements: any
//! value `>= 1` yields a valid allocator.

use crate::error::{Error, Result};

/// Frame allocator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of generations per frame ring and reclaim queue (N)
    pub frames_in_flight: u32,
    /// Instance pool size at creation
    pub initial_instance_capacity: u32,
    /// Instance pool growth step
    pub instance_growth_chunk: u32,
    /// Primitive pool size at creation
    pub initial_primitive_capacity: u32,
    /// Primitive pool growth step
    pub primitive_growth_chunk: u32,
    /// Default growth step for descriptor slabs
    pub descriptor_growth_chunk: u32,
    /// Optional ceiling on every pool; growth past it fails with `OutOfCapacity`
    pub max_slots: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            initial_instance_capacity: 10,
            instance_growth_chunk: 10,
            initial_primitive_capacity: 50,
            primitive_growth_chunk: 50,
            descriptor_growth_chunk: 16,
            max_slots: None,
        }
    }
}

impl Config {
    /// Check the configuration for values no allocator can work with
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(invalid("frames_in_flight must be at least 1"));
        }

        let sizes = [
            ("initial_instance_capacity", self.initial_instance_capacity),
            ("instance_growth_chunk", self.instance_growth_chunk),
            ("initial_primitive_capacity", self.initial_primitive_capacity),
            ("primitive_growth_chunk", self.primitive_growth_chunk),
            ("descriptor_growth_chunk", self.descriptor_growth_chunk),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(invalid(&format!("{} must be at least 1", name)));
            }
        }

        if let Some(max) = self.max_slots {
            let initial = self.initial_instance_capacity.max(self.initial_primitive_capacity);
            if initial > max {
                return Err(invalid(&format!(
                    "initial capacity {} exceeds max_slots {}",
                    initial, max
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> Error {
    Error::InitializationFailed(format!("Invalid config: {}", message))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
