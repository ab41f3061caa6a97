//! Unit tests for log.rs
//!
//! Tests LogSeverity, LogEntry formatting, DefaultLogger and MemoryLogger.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, MemoryLogger};
use std::time::SystemTime;

fn entry(severity: LogSeverity, source: &str, message: &str) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message: message.to_string(),
        file: None,
        line: None,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_labels_are_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Warn.label(), "WARN ");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_format_plain_without_location() {
    let e = entry(LogSeverity::Info, "galaxy3d::SlotPool", "Pool grown to 20 slots");
    let line = e.format_plain();
    assert!(line.contains("[INFO ]"));
    assert!(line.contains("[galaxy3d::SlotPool]"));
    assert!(line.ends_with("Pool grown to 20 slots"));
}

#[test]
fn test_format_plain_with_location() {
    let mut e = entry(LogSeverity::Error, "galaxy3d::vulkan", "Allocation failed");
    e.file = Some("vulkan_memory.rs");
    e.line = Some(42);
    let line = e.format_plain();
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("Allocation failed (vulkan_memory.rs:42)"));
}

#[test]
fn test_log_entry_clone() {
    let e1 = entry(LogSeverity::Warn, "test", "warning");
    let e2 = e1.clone();
    assert_eq!(e1.severity, e2.severity);
    assert_eq!(e1.source, e2.source);
    assert_eq!(e1.message, e2.message);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        let mut e = entry(severity, "test", &format!("{:?} message", severity));
        logger.log(&e);
        e.file = Some("test.rs");
        e.line = Some(7);
        logger.log(&e);
    }
}

#[test]
fn test_logger_types_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
    assert_send_sync::<MemoryLogger>();
}

// ============================================================================
// MEMORY LOGGER TESTS
// ============================================================================

#[test]
fn test_memory_logger_captures_entries() {
    let logger = MemoryLogger::new();
    logger.log(&entry(LogSeverity::Warn, "galaxy3d::DescriptorSlab", "Slot 20 out of range"));
    logger.log(&entry(LogSeverity::Debug, "galaxy3d::FrameRing", "Advanced to frame 1"));

    assert_eq!(logger.entries().len(), 2);
    assert_eq!(logger.count(LogSeverity::Warn), 1);
    assert!(logger.contains(LogSeverity::Warn, "galaxy3d::DescriptorSlab", "out of range"));
    assert!(!logger.contains(LogSeverity::Warn, "galaxy3d::FrameRing", "out of range"));
}

#[test]
fn test_memory_logger_clones_share_storage() {
    let logger = MemoryLogger::new();
    let clone = logger.clone();
    clone.log(&entry(LogSeverity::Info, "test", "shared"));
    assert_eq!(logger.entries().len(), 1);

    logger.clear();
    assert!(clone.entries().is_empty());
}
