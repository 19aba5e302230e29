//! Target address space layout.
//!
//! This module maps Rocket addresses onto offsets in the UIO window. It provides:
//! 1. **Regions:** An immutable table of named spans, checked for overlap once at construction.
//! 2. **Translation:** Half-open membership lookup from target address to window offset.
//! 3. **Validation:** An access is valid only if it stays inside both the window and its region.

use crate::common::constants::{
    BOOTROM_SIZE, CLINT_SIZE, ROCKET_BOOTROM_BASE, ROCKET_CLINT_BASE, ROCKET_DRAM_BASE,
    UIO_BOOTROM_OFFSET, UIO_CLINT_OFFSET, UIO_DRAM_OFFSET,
};
use crate::common::{MemifError, Result, WindowOffset};
use std::fmt;

/// The regions of the Rocket address space reachable through the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Main memory.
    Dram,
    /// Boot ROM.
    BootRom,
    /// Core-local interruptor.
    Clint,
}

impl RegionKind {
    /// Logical identifier used in logs and diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dram => "memory",
            Self::BootRom => "boot-rom",
            Self::Clint => "interrupt-control",
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A span of the target address space and where it starts in the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressRegion {
    /// Which region this is.
    pub kind: RegionKind,
    /// First target address of the region.
    pub target_base: u64,
    /// Length of the region in bytes.
    pub target_len: u64,
    /// Window offset corresponding to `target_base`.
    pub window_offset: usize,
}

impl AddressRegion {
    /// Creates a region descriptor.
    pub const fn new(
        kind: RegionKind,
        target_base: u64,
        target_len: u64,
        window_offset: usize,
    ) -> Self {
        Self {
            kind,
            target_base,
            target_len,
            window_offset,
        }
    }

    /// One past the last target address of the region.
    pub const fn target_end(&self) -> u64 {
        self.target_base.saturating_add(self.target_len)
    }

    /// Returns whether `addr` lies in `[target_base, target_end)`.
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.target_base && addr - self.target_base < self.target_len
    }

    /// Window offset of `addr`; `addr` must be contained in the region.
    const fn offset_of(&self, addr: u64) -> WindowOffset {
        WindowOffset::new(self.window_offset + (addr - self.target_base) as usize)
    }

    /// Window span `[start, end)` clipped to `window_size`.
    fn window_span(&self, window_size: usize) -> (usize, usize) {
        let end = self
            .window_offset
            .saturating_add(self.target_len as usize)
            .min(window_size);
        (self.window_offset, end)
    }
}

/// The region table for one window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressSpaceMap {
    regions: Vec<AddressRegion>,
    window_size: usize,
}

impl AddressSpaceMap {
    /// Builds the fixed Rocket layout: DRAM, boot ROM and CLINT.
    ///
    /// # Errors
    ///
    /// [`MemifError::Layout`] if `dram_size` makes DRAM overlap the boot ROM, or the
    /// window is too small to reach the fixed regions.
    pub fn rocket(window_size: usize, dram_size: u64) -> Result<Self> {
        Self::from_regions(
            window_size,
            vec![
                AddressRegion::new(RegionKind::Dram, ROCKET_DRAM_BASE, dram_size, UIO_DRAM_OFFSET),
                AddressRegion::new(
                    RegionKind::BootRom,
                    ROCKET_BOOTROM_BASE,
                    BOOTROM_SIZE,
                    UIO_BOOTROM_OFFSET,
                ),
                AddressRegion::new(
                    RegionKind::Clint,
                    ROCKET_CLINT_BASE,
                    CLINT_SIZE,
                    UIO_CLINT_OFFSET,
                ),
            ],
        )
    }

    /// Builds a map from an arbitrary region table.
    ///
    /// Every region must be non-empty, start inside the window, and overlap no other
    /// region in either target space or window space. A region may extend past the
    /// end of the window; accesses to that tail are rejected by `validate`.
    ///
    /// # Errors
    ///
    /// [`MemifError::Layout`] describing the first violation found.
    pub fn from_regions(window_size: usize, regions: Vec<AddressRegion>) -> Result<Self> {
        for region in &regions {
            if region.target_len == 0 {
                return Err(MemifError::layout(format!("{} region is empty", region.kind)));
            }
            if region.target_base.checked_add(region.target_len).is_none() {
                return Err(MemifError::layout(format!(
                    "{} region at {:#x} wraps the address space",
                    region.kind, region.target_base
                )));
            }
            if region
                .window_offset
                .checked_add(region.target_len as usize)
                .is_none()
            {
                return Err(MemifError::layout(format!(
                    "{} region overflows the window offset range",
                    region.kind
                )));
            }
            if region.window_offset >= window_size {
                return Err(MemifError::layout(format!(
                    "{} region starts at window offset {:#x}, beyond the {window_size:#x}-byte window",
                    region.kind, region.window_offset
                )));
            }
        }

        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                if a.kind == b.kind {
                    return Err(MemifError::layout(format!("duplicate {} region", a.kind)));
                }
                if a.target_base < b.target_end() && b.target_base < a.target_end() {
                    return Err(MemifError::layout(format!(
                        "{} and {} regions overlap in target space",
                        a.kind, b.kind
                    )));
                }
                let (a_start, a_end) = a.window_span(window_size);
                let (b_start, b_end) = b.window_span(window_size);
                if a_start < b_end && b_start < a_end {
                    return Err(MemifError::layout(format!(
                        "{} and {} regions overlap in the window",
                        a.kind, b.kind
                    )));
                }
            }
        }

        Ok(Self {
            regions,
            window_size,
        })
    }

    /// Total window size this map was built for.
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// All regions in declaration order.
    pub fn regions(&self) -> &[AddressRegion] {
        &self.regions
    }

    /// The region of the given kind, if present.
    pub fn region(&self, kind: RegionKind) -> Option<&AddressRegion> {
        self.regions.iter().find(|r| r.kind == kind)
    }

    /// The region containing `addr`, without logging.
    pub fn region_of(&self, addr: u64) -> Option<&AddressRegion> {
        self.regions.iter().find(|r| r.contains(addr))
    }

    /// Translates a target address to its window offset.
    ///
    /// Region membership is half-open: `target_base <= addr < target_base + target_len`.
    ///
    /// # Arguments
    ///
    /// * `addr` - Rocket address to translate.
    ///
    /// # Returns
    ///
    /// The window offset of `addr`, or `None` (after logging a warning) if no
    /// region contains it.
    pub fn translate(&self, addr: u64) -> Option<WindowOffset> {
        self.locate(addr).map(|region| region.offset_of(addr))
    }

    /// Returns whether `len` bytes at `addr` can be accessed.
    ///
    /// The access must translate, end within the window, and end within the
    /// region it starts in. Arithmetic overflow makes the access invalid.
    ///
    /// # Arguments
    ///
    /// * `addr` - Rocket address of the first byte.
    /// * `len` - Access length in bytes; `0` checks only that `addr` translates.
    ///
    /// # Returns
    ///
    /// `true` if every byte of the access is reachable in the start region.
    pub fn validate(&self, addr: u64, len: usize) -> bool {
        self.check(addr, len).is_some()
    }

    /// Validates and translates in one step.
    ///
    /// # Arguments
    ///
    /// * `addr` - Rocket address of the first byte.
    /// * `len` - Access length in bytes.
    ///
    /// # Returns
    ///
    /// The window offset of `addr`; `offset..offset + len` lies inside the window.
    ///
    /// # Errors
    ///
    /// [`MemifError::OutOfBounds`] when `validate(addr, len)` is false.
    pub fn resolve(&self, addr: u64, len: usize) -> Result<WindowOffset> {
        self.check(addr, len).ok_or(MemifError::OutOfBounds { addr, len })
    }

    fn locate(&self, addr: u64) -> Option<&AddressRegion> {
        let region = self.region_of(addr);
        if region.is_none() {
            tracing::warn!("Unmapped Rocket address {addr:#x}");
        }
        region
    }

    fn check(&self, addr: u64, len: usize) -> Option<WindowOffset> {
        let region = self.locate(addr)?;
        let offset = region.offset_of(addr);

        let window_end = offset.val().checked_add(len)?;
        if window_end > self.window_size {
            return None;
        }

        let target_end = addr.checked_add(len as u64)?;
        if target_end > region.target_end() {
            return None;
        }

        Some(offset)
    }
}
