//! Integration tests for allocator diagnostics
//!
//! Verifies that misuse and recoverable conditions reach the engine logger
//! at the right severity. No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use std::sync::Arc;
use galaxy_3d_frame_alloc::galaxy3d::{Config, Engine, Error, FrameAllocator};
use galaxy_3d_frame_alloc::galaxy3d::device::{BindingLayout, DescriptorKind, HostDevice};
use galaxy_3d_frame_alloc::galaxy3d::frame::DeferredReclaimQueue;
use galaxy_3d_frame_alloc::galaxy3d::log::{LogSeverity, MemoryLogger};
use galaxy_3d_frame_alloc::galaxy3d::slab::{SlabDesc, SlabField};
use serial_test::serial;

// ============================================================================
// HELPERS
// ============================================================================

fn capture() -> MemoryLogger {
    let logger = MemoryLogger::new();
    Engine::set_logger(logger.clone());
    logger
}

fn host_allocator() -> FrameAllocator {
    let device = Arc::new(HostDevice::new());
    FrameAllocator::new(Config::default(), device.clone(), device).unwrap()
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

#[test]
#[serial]
fn test_integration_out_of_range_write_warns() {
    let logger = capture();
    let mut allocator = host_allocator();
    let key = allocator
        .create_slab(SlabDesc {
            name: "materials".to_string(),
            layout: BindingLayout::new(vec![DescriptorKind::UniformBuffer]),
            capacity: 4,
            growth_chunk: 4,
            max_capacity: None,
        })
        .unwrap();

    let result = allocator.write_descriptors(
        key,
        &[SlabField::record(DescriptorKind::UniformBuffer, vec![1; 16])],
        Some(10),
    );
    assert!(matches!(result, Err(Error::SlotOutOfRange { index: 10, capacity: 4 })));
    assert!(logger.contains(LogSeverity::Warn, "galaxy3d::DescriptorSlab", "write skipped"));
    assert_eq!(logger.count(LogSeverity::Error), 0);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_double_release_logs_error() {
    let logger = capture();
    let mut allocator = host_allocator();
    let instance = allocator.acquire_instance().unwrap();
    allocator.release_instance(instance).unwrap();
    assert_eq!(logger.count(LogSeverity::Error), 0);

    assert_eq!(allocator.release_instance(instance), Err(Error::DoubleRelease(instance)));
    assert!(logger.contains(LogSeverity::Error, "galaxy3d::SlotPool", "Double release"));

    let entry = logger
        .entries()
        .into_iter()
        .find(|e| e.severity == LogSeverity::Error)
        .unwrap();
    assert!(entry.file.is_some());
    assert!(entry.line.is_some());

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_tick_on_dead_instance_logs_error() {
    let logger = capture();
    let mut allocator = host_allocator();

    let result = allocator.tick(3, galaxy_3d_frame_alloc::glam::Mat4::IDENTITY);
    assert_eq!(result, Err(Error::InvalidInstance(3)));
    assert!(logger.contains(LogSeverity::Error, "galaxy3d::InstanceRegistry", "Invalid instance index 3"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_dropped_queue_warns() {
    let logger = capture();
    {
        let mut queue = DeferredReclaimQueue::new(2);
        queue.push(0, || {});
        queue.push(1, || {});
    }
    assert!(logger.contains(LogSeverity::Warn, "galaxy3d::DeferredReclaimQueue", "2 pending"));

    logger.clear();
    {
        let mut queue = DeferredReclaimQueue::new(2);
        queue.push(0, || {});
        queue.flush_all();
    }
    assert_eq!(logger.count(LogSeverity::Warn), 0);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_min_severity_filters_allocator_logs() {
    let logger = capture();
    Engine::set_min_severity(LogSeverity::Warn);

    let mut allocator = host_allocator();
    for _ in 0..11 {
        allocator.acquire_instance().unwrap();
    }
    allocator.begin_frame().unwrap();
    assert!(logger
        .entries()
        .iter()
        .all(|e| e.severity == LogSeverity::Warn || e.severity == LogSeverity::Error));

    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Debug);
}
