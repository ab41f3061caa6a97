//! Error types for the Galaxy3D frame allocator
//!
//! This module defines the error type shared by every component of the
//! allocator (slot pools, frame rings, descriptor slabs, instance registry)
//! and by device backends.
//!
//! Errors fall into three families:
//! - **Exhaustion**: `OutOfCapacity`, `OutOfMemory`
//! - **Misuse**: `DoubleRelease`, `InvalidInstance`, `UnsupportedRecordType`
//! - **Degraded write**: `SlotOutOfRange` (reported, write skipped)

use std::fmt;
use crate::device::DescriptorKind;

/// Result type for Galaxy3D allocator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D allocator errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan, host memory, etc.)
    BackendError(String),

    /// Out of device memory
    OutOfMemory,

    /// Invalid resource (layout mismatch, bad record size, etc.)
    InvalidResource(String),

    /// Initialization failed (configuration, device, subsystems)
    InitializationFailed(String),

    /// A capped slot pool cannot grow past its ceiling
    OutOfCapacity(u32),

    /// A slot index was released while already free
    DoubleRelease(u32),

    /// An instance index is out of range or not currently allocated
    InvalidInstance(u32),

    /// The device reports no record size for this descriptor kind
    UnsupportedRecordType(DescriptorKind),

    /// A direct-indexed access addressed a slot past the current capacity
    SlotOutOfRange {
        index: u32,
        capacity: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::OutOfCapacity(max) => write!(f, "Out of capacity: pool is capped at {} slots", max),
            Error::DoubleRelease(index) => write!(f, "Double release of slot {}", index),
            Error::InvalidInstance(index) => write!(f, "Invalid instance index {}", index),
            Error::UnsupportedRecordType(kind) => write!(f, "Unsupported record type: {:?}", kind),
            Error::SlotOutOfRange { index, capacity } => {
                write!(f, "Slot index {} out of range (capacity: {})", index, capacity)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether this error reports a caller contract violation
    ///
    /// Misuse errors indicate corrupted index bookkeeping; they are never
    /// retried and should be treated as fatal by the caller.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::DoubleRelease(_) | Error::InvalidInstance(_) | Error::UnsupportedRecordType(_)
        )
    }
}

// ===== ERROR MACROS =====

/// Log an ERROR message and produce an `Error::BackendError` with the same text
///
/// # Example
///
/// ```ignore
/// let region = slab.region().ok_or_else(|| engine_err!("galaxy3d::Slab", "No region"))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a WARN message and produce an `Error::BackendError` with the same text
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log a WARN message and return `Err(Error::BackendError)` from the enclosing function
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

/// Log a typed error at ERROR level and return it from the enclosing function
///
/// # Example
///
/// ```ignore
/// engine_fail!("galaxy3d::SlotPool", Error::DoubleRelease(index));
/// ```
#[macro_export]
macro_rules! engine_fail {
    ($source:expr, $error:expr) => {{
        let error = $error;
        $crate::engine_error!($source, "{}", error);
        return Err(error);
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
