//! Common types shared by the window, layout and engine modules.
//!
//! This module provides:
//! 1. **Offsets:** A strong type for byte offsets inside the mapped window.
//! 2. **Constants:** The fixed UIO/Rocket layout and the chunking policy.
//! 3. **Errors:** `MemifError` and the crate-wide `Result` alias.

/// Window offset type.
pub mod addr;

/// Fixed layout and transfer constants.
pub mod constants;

/// Error type and result alias.
pub mod error;

pub use addr::WindowOffset;
pub use error::{MemifError, Result};
