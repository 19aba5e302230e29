//! Bounds-checked access to target memory through the UIO window.
//!
//! Every operation validates the whole access against the layout before touching
//! the window, so a rejected request never copies a partial chunk. Stores (`write`,
//! `clear`) end with a sequentially-consistent fence: the FPGA core observes the
//! same physical memory, and data must be visible before the core is released.

use crate::common::constants::{CLINT_MSIP_OFFSET, MSIP_START, ROCKET_CLINT_BASE};
use crate::common::{MemifError, Result};
use crate::config::UioConfig;
use crate::layout::AddressSpaceMap;
use crate::memif::TargetMemory;
use crate::window::MappedWindow;
use std::ops::Range;
use std::sync::atomic::{Ordering, fence};

/// Serves read/write/clear requests for one mapped window.
#[derive(Debug)]
pub struct MemoryAccessEngine {
    map: AddressSpaceMap,
    window: MappedWindow,
}

impl MemoryAccessEngine {
    /// Combines a layout with the window it describes.
    ///
    /// # Errors
    ///
    /// [`MemifError::NotMapped`] if the window is closed, [`MemifError::Layout`] if it
    /// is smaller than the layout's window size.
    pub fn new(map: AddressSpaceMap, window: MappedWindow) -> Result<Self> {
        if !window.is_mapped() {
            return Err(MemifError::NotMapped);
        }
        if window.len() < map.window_size() {
            return Err(MemifError::layout(format!(
                "mapped window of {:#x} bytes is smaller than the {:#x}-byte layout",
                window.len(),
                map.window_size()
            )));
        }
        Ok(Self { map, window })
    }

    /// Resolves sizes, builds the Rocket layout, maps the device and logs the memory map.
    ///
    /// # Errors
    ///
    /// [`MemifError::MissingDevice`], any layout error, or the window's open/map errors.
    pub fn from_config(config: &UioConfig) -> Result<Self> {
        let device = config.device_path()?;
        let window_size = config.window_size()?;
        let map = AddressSpaceMap::rocket(window_size, config.dram_size)?;
        let window = MappedWindow::open(device, window_size)?;

        tracing::info!("UIO Memory Map:");
        for region in map.regions() {
            tracing::info!(
                "  {:<17} UIO offset {:#010x} - {:#010x} -> Rocket {:#010x}",
                region.kind.name(),
                region.window_offset,
                region.window_offset as u64 + region.target_len,
                region.target_base
            );
        }

        Self::new(map, window)
    }

    /// The layout requests are validated against.
    pub const fn map(&self) -> &AddressSpaceMap {
        &self.map
    }

    /// The underlying window.
    pub const fn window(&self) -> &MappedWindow {
        &self.window
    }

    /// Copies `dst.len()` bytes at `addr` into `dst`.
    ///
    /// # Arguments
    ///
    /// * `addr` - Rocket address of the first byte.
    /// * `dst` - Destination buffer; its length is the access length.
    ///
    /// # Errors
    ///
    /// [`MemifError::OutOfBounds`] if the access is invalid; `dst` is untouched.
    pub fn read(&self, addr: u64, dst: &mut [u8]) -> Result<()> {
        let range = self.checked_range("read", addr, dst.len())?;
        let src = self
            .window
            .as_slice()?
            .get(range)
            .ok_or(MemifError::OutOfBounds { addr, len: dst.len() })?;
        dst.copy_from_slice(src);
        tracing::trace!("read {:#x} bytes at {addr:#x}", dst.len());
        Ok(())
    }

    /// Copies `src` to `addr`, then fences.
    ///
    /// # Arguments
    ///
    /// * `addr` - Rocket address of the first byte.
    /// * `src` - Bytes to store; visible to the target once this returns.
    ///
    /// # Errors
    ///
    /// [`MemifError::OutOfBounds`] if the access is invalid; memory is untouched.
    pub fn write(&mut self, addr: u64, src: &[u8]) -> Result<()> {
        let range = self.checked_range("write", addr, src.len())?;
        let dst = self
            .window
            .as_mut_slice()?
            .get_mut(range)
            .ok_or(MemifError::OutOfBounds { addr, len: src.len() })?;
        dst.copy_from_slice(src);
        fence(Ordering::SeqCst);
        tracing::trace!("wrote {:#x} bytes at {addr:#x}", src.len());
        Ok(())
    }

    /// Zero-fills `len` bytes at `addr`, then fences.
    ///
    /// # Arguments
    ///
    /// * `addr` - Rocket address of the first byte.
    /// * `len` - Number of bytes to zero.
    ///
    /// # Errors
    ///
    /// [`MemifError::OutOfBounds`] if the access is invalid; memory is untouched.
    pub fn clear(&mut self, addr: u64, len: usize) -> Result<()> {
        let range = self.checked_range("clear", addr, len)?;
        self.window
            .as_mut_slice()?
            .get_mut(range)
            .ok_or(MemifError::OutOfBounds { addr, len })?
            .fill(0);
        fence(Ordering::SeqCst);
        tracing::trace!("cleared {len:#x} bytes at {addr:#x}");
        Ok(())
    }

    /// Writes `1` to hart 0's MSIP register to start execution.
    ///
    /// # Errors
    ///
    /// [`MemifError::OutOfBounds`] if the layout has no reachable CLINT.
    pub fn trigger_start(&mut self) -> Result<()> {
        let msip = ROCKET_CLINT_BASE + CLINT_MSIP_OFFSET;
        if let Some(offset) = self.map.translate(msip) {
            tracing::info!(
                "Triggering MSIP at Rocket addr {msip:#x} (UIO offset {offset}) to start execution"
            );
        }
        self.write(msip, &MSIP_START.to_le_bytes())
    }

    fn checked_range(&self, op: &str, addr: u64, len: usize) -> Result<Range<usize>> {
        match self.map.resolve(addr, len) {
            Ok(offset) => Ok(offset.val()..offset.val() + len),
            Err(e) => {
                tracing::error!("{op} address {addr:#x} len {len:#x} out of bounds");
                Err(e)
            }
        }
    }
}

impl TargetMemory for MemoryAccessEngine {
    fn read_chunk(&mut self, addr: u64, dst: &mut [u8]) -> Result<()> {
        self.read(addr, dst)
    }

    fn write_chunk(&mut self, addr: u64, src: &[u8]) -> Result<()> {
        self.write(addr, src)
    }

    fn clear_chunk(&mut self, addr: u64, len: usize) -> Result<()> {
        self.clear(addr, len)
    }

    fn reset(&mut self) -> Result<()> {
        self.trigger_start()
    }
}
