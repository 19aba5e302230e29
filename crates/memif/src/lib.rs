//! Host-side memory interface for a Rocket core on an FPGA.
//!
//! The core's address space is split into disjoint regions (DRAM, boot ROM, CLINT)
//! that the FPGA exposes through one flat UIO window. This crate provides:
//! 1. **Window:** Ownership of the `mmap`ed UIO device and its file handle.
//! 2. **Layout:** The fixed region table, address translation and bounds validation.
//! 3. **Engine:** Bounds-checked read/write/clear with a full fence after every store.
//! 4. **Memif:** The `TargetMemory` trait consumed by the host-target protocol driver.
//! 5. **Configuration:** Window/DRAM sizes and the device path, from plusargs or JSON.

/// Common types, layout constants and the error type.
pub mod common;
/// Startup configuration (device path, window size, DRAM size).
pub mod config;
/// Bounds-checked access engine over a mapped window.
pub mod engine;
/// Target address space layout: regions, translation and validation.
pub mod layout;
/// Chunked memory interface consumed by the protocol driver.
pub mod memif;
/// Memory-mapped UIO window.
pub mod window;

/// Crate error and result types.
pub use crate::common::{MemifError, Result, WindowOffset};
/// Resolved startup configuration.
pub use crate::config::UioConfig;
/// Access engine; construct with `MemoryAccessEngine::from_config`.
pub use crate::engine::MemoryAccessEngine;
/// Region table types.
pub use crate::layout::{AddressRegion, AddressSpaceMap, RegionKind};
/// Capability trait implemented by the engine.
pub use crate::memif::TargetMemory;
/// Owned device mapping.
pub use crate::window::MappedWindow;
