//! Fixed layout constants.
//!
//! The FPGA design places the three Rocket regions at fixed offsets inside the UIO
//! window. These values are part of the hardware contract and must not change:
//!
//! | Region   | UIO offset    | Rocket base   | Size    |
//! |----------|---------------|---------------|---------|
//! | DRAM     | `0x0000_0000` | `0x8000_0000` | config  |
//! | Boot ROM | `0x3fff_c000` | `0x0000_1000` | 8 KiB   |
//! | CLINT    | `0x3fff_e000` | `0x0200_0000` | 64 KiB  |

/// Window offset of the DRAM region.
pub const UIO_DRAM_OFFSET: usize = 0x0000_0000;

/// Window offset of the boot ROM region.
pub const UIO_BOOTROM_OFFSET: usize = 0x3fff_c000;

/// Window offset of the CLINT region.
pub const UIO_CLINT_OFFSET: usize = 0x3fff_e000;

/// Rocket address of the boot ROM.
pub const ROCKET_BOOTROM_BASE: u64 = 0x0000_1000;

/// Rocket address of the CLINT.
pub const ROCKET_CLINT_BASE: u64 = 0x0200_0000;

/// Rocket address of DRAM.
pub const ROCKET_DRAM_BASE: u64 = 0x8000_0000;

/// Boot ROM size (8 KiB).
pub const BOOTROM_SIZE: u64 = 0x2000;

/// CLINT size (64 KiB).
pub const CLINT_SIZE: u64 = 0x1_0000;

/// Offset of hart 0's MSIP register inside the CLINT.
pub const CLINT_MSIP_OFFSET: u64 = 0;

/// Value written to MSIP to release hart 0.
pub const MSIP_START: u32 = 1;

/// Alignment the protocol driver uses for every chunk.
pub const CHUNK_ALIGN: usize = 8;

/// Largest single transfer the protocol driver issues (1 MiB).
pub const CHUNK_MAX_SIZE: usize = 1024 * 1024;
