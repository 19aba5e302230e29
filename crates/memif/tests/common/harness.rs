use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use uio_memif::common::constants::{ROCKET_BOOTROM_BASE, ROCKET_CLINT_BASE, ROCKET_DRAM_BASE};
use uio_memif::{AddressRegion, AddressSpaceMap, MappedWindow, MemoryAccessEngine, RegionKind};

/// Default window size of the FPGA design (1 GiB).
pub const WINDOW_SIZE: usize = 0x4000_0000;

/// Default DRAM size (everything below the boot ROM).
pub const DEFAULT_DRAM_SIZE: u64 = 0x3fff_c000;

/// Window size of the compact test layout.
pub const SMALL_WINDOW: usize = 0x4000;

/// An engine over a temporary file; the file lives as long as the engine.
pub struct TestContext {
    pub file: NamedTempFile,
    pub engine: MemoryAccessEngine,
}

impl TestContext {
    /// Full-size Rocket layout over a sparse 1 GiB file.
    pub fn rocket() -> Self {
        Self::rocket_with_dram(DEFAULT_DRAM_SIZE)
    }

    /// Full-size Rocket layout with a custom DRAM size.
    pub fn rocket_with_dram(dram_size: u64) -> Self {
        let map = AddressSpaceMap::rocket(WINDOW_SIZE, dram_size).unwrap();
        Self::with_map(map)
    }

    /// The compact layout from [`small_map`] over a 16 KiB file.
    pub fn small() -> Self {
        Self::with_map(small_map())
    }

    /// Any layout over a file of exactly `map.window_size()` bytes.
    pub fn with_map(map: AddressSpaceMap) -> Self {
        init_tracing();
        let file = backing_file(map.window_size());
        let window = MappedWindow::open(file.path(), map.window_size()).unwrap();
        let engine = MemoryAccessEngine::new(map, window).unwrap();
        Self { file, engine }
    }
}

/// A sparse temporary file standing in for the UIO device.
pub fn backing_file(size: usize) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    file.as_file().set_len(size as u64).unwrap();
    file
}

/// Same region identities as the Rocket layout, packed into 16 KiB:
///
/// | Region | Target base   | Length | Window offset |
/// |--------|---------------|--------|---------------|
/// | DRAM   | `0x8000_0000` | 8 KiB  | `0x0000`      |
/// | ROM    | `0x0000_1000` | 4 KiB  | `0x2000`      |
/// | CLINT  | `0x0200_0000` | 64 KiB | `0x3000`      |
///
/// The CLINT extends past the window, like the real layout does.
pub fn small_map() -> AddressSpaceMap {
    AddressSpaceMap::from_regions(
        SMALL_WINDOW,
        vec![
            AddressRegion::new(RegionKind::Dram, ROCKET_DRAM_BASE, 0x2000, 0x0000),
            AddressRegion::new(RegionKind::BootRom, ROCKET_BOOTROM_BASE, 0x1000, 0x2000),
            AddressRegion::new(RegionKind::Clint, ROCKET_CLINT_BASE, 0x1_0000, 0x3000),
        ],
    )
    .unwrap()
}

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("uio_memif=debug")
        .try_init();
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a subscriber that records every event; returns `f`'s result and the log text.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    (out, text)
}
