//! Unit tests for error.rs
//!
//! Tests all Error variants, their Display output, and the error macros.

use crate::error::{Error, Result};
use crate::device::DescriptorKind;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkAllocateMemory failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkAllocateMemory failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("Field count mismatch".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("Field count mismatch"));
}

#[test]
fn test_out_of_capacity_display() {
    let display = format!("{}", Error::OutOfCapacity(64));
    assert!(display.contains("Out of capacity"));
    assert!(display.contains("64"));
}

#[test]
fn test_double_release_display() {
    assert_eq!(format!("{}", Error::DoubleRelease(7)), "Double release of slot 7");
}

#[test]
fn test_invalid_instance_display() {
    assert_eq!(format!("{}", Error::InvalidInstance(3)), "Invalid instance index 3");
}

#[test]
fn test_unsupported_record_type_display() {
    let display = format!("{}", Error::UnsupportedRecordType(DescriptorKind::AccelerationStructure));
    assert!(display.contains("Unsupported record type"));
    assert!(display.contains("AccelerationStructure"));
}

#[test]
fn test_slot_out_of_range_display() {
    let display = format!("{}", Error::SlotOutOfRange { index: 20, capacity: 16 });
    assert_eq!(display, "Slot index 20 out of range (capacity: 16)");
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::SlotOutOfRange { index: 5, capacity: 4 };
    assert_eq!(err.clone(), err);
    assert_ne!(Error::DoubleRelease(1), Error::DoubleRelease(2));
}

#[test]
fn test_is_misuse() {
    assert!(Error::DoubleRelease(0).is_misuse());
    assert!(Error::InvalidInstance(0).is_misuse());
    assert!(Error::UnsupportedRecordType(DescriptorKind::Sampler).is_misuse());

    assert!(!Error::OutOfMemory.is_misuse());
    assert!(!Error::OutOfCapacity(8).is_misuse());
    assert!(!Error::SlotOutOfRange { index: 1, capacity: 0 }.is_misuse());
}

// ============================================================================
// MACRO TESTS
// ============================================================================

fn bail_helper(fail: bool) -> Result<u32> {
    if fail {
        crate::engine_bail!("galaxy3d::ErrorTest", "Failed with code {}", 42);
    }
    Ok(1)
}

fn bail_warn_helper() -> Result<()> {
    crate::engine_bail_warn!("galaxy3d::ErrorTest", "Soft failure");
}

fn fail_helper(index: u32) -> Result<()> {
    crate::engine_fail!("galaxy3d::ErrorTest", Error::DoubleRelease(index));
}

#[test]
fn test_engine_err_builds_backend_error() {
    let err = crate::engine_err!("galaxy3d::ErrorTest", "Region {} missing", 3);
    assert_eq!(err, Error::BackendError("Region 3 missing".to_string()));
}

#[test]
fn test_engine_warn_err_builds_backend_error() {
    let err = crate::engine_warn_err!("galaxy3d::ErrorTest", "Degraded");
    assert_eq!(err, Error::BackendError("Degraded".to_string()));
}

#[test]
fn test_engine_bail_returns_early() {
    assert_eq!(bail_helper(false).unwrap(), 1);
    assert_eq!(
        bail_helper(true).unwrap_err(),
        Error::BackendError("Failed with code 42".to_string())
    );
}

#[test]
fn test_engine_bail_warn_returns_early() {
    assert_eq!(bail_warn_helper().unwrap_err(), Error::BackendError("Soft failure".to_string()));
}

#[test]
fn test_engine_fail_returns_typed_error() {
    assert_eq!(fail_helper(9).unwrap_err(), Error::DoubleRelease(9));
}
