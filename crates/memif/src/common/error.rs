//! Error types for window, layout and access operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for memory interface operations.
pub type Result<T> = std::result::Result<T, MemifError>;

/// Errors raised while opening the window or serving an access.
#[derive(Debug, Error)]
pub enum MemifError {
    /// The UIO device could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    DeviceOpen {
        /// Device that was opened
        path: PathBuf,
        /// Underlying OS error
        source: io::Error,
    },

    /// The device opened but `mmap` failed. The handle is already closed.
    #[error("cannot map {size:#x} bytes of {}: {source}", path.display())]
    Mapping {
        /// Device that was mapped
        path: PathBuf,
        /// Requested window size
        size: usize,
        /// Underlying OS error
        source: io::Error,
    },

    /// The access falls outside the window or its region.
    #[error("access at {addr:#x} (len {len:#x}) is out of bounds")]
    OutOfBounds {
        /// Target address of the access
        addr: u64,
        /// Access length in bytes
        len: usize,
    },

    /// The window was used after `close`.
    #[error("UIO window is not mapped")]
    NotMapped,

    /// The region table is inconsistent.
    #[error("invalid address layout: {reason}")]
    Layout {
        /// What is wrong with the table
        reason: String,
    },

    /// No device path was configured.
    #[error("must specify +uio=/dev/uioX")]
    MissingDevice,

    /// A size or address argument is not a number.
    #[error("invalid number: {value:?}")]
    InvalidNumber {
        /// Offending text
        value: String,
    },

    /// JSON configuration could not be parsed.
    #[error("invalid configuration: {source}")]
    Config {
        /// Deserializer error
        #[from]
        source: serde_json::Error,
    },
}

impl MemifError {
    /// Creates a layout error.
    pub fn layout(reason: impl Into<String>) -> Self {
        Self::Layout {
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors raised by a rejected access.
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}
