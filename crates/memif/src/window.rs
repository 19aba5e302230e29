//! Memory-mapped UIO window.
//!
//! This module owns the OS side of the device: the `O_SYNC` file handle and the
//! `MAP_SHARED` mapping of the whole window. It exposes the mapping only as a
//! bounds-known byte slice and knows nothing about Rocket addresses.
//!
//! The handle and mapping are released by `close`, which is idempotent and also
//! runs on drop. A failed `map` never leaves an open handle behind.

use crate::common::{MemifError, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use std::slice;

#[derive(Debug)]
struct Mapping {
    ptr: NonNull<u8>,
    len: usize,
}

/// An `mmap`ed UIO device.
///
/// `MappedWindow::default()` is an unmapped instance; `open` or `map` establishes
/// the mapping. Every byte access goes through `as_slice`/`as_mut_slice`, which fail
/// with [`MemifError::NotMapped`] once the window is closed.
#[derive(Debug, Default)]
pub struct MappedWindow {
    mapping: Option<Mapping>,
    file: Option<File>,
    device: Option<PathBuf>,
}

// SAFETY: the mapping is owned exclusively by this value and is only reachable
// through borrows of it, so moving it to another thread cannot alias the pointer.
// Not `Sync`: the FPGA writes the same memory and shared readers gain nothing.
unsafe impl Send for MappedWindow {}

impl MappedWindow {
    /// Creates an unmapped window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `device` and maps `size` bytes of it.
    ///
    /// # Arguments
    ///
    /// * `device` - UIO device node, e.g. `/dev/uio0`.
    /// * `size` - Number of bytes to map from offset 0.
    ///
    /// # Returns
    ///
    /// A mapped window that unmaps and closes the device when dropped.
    ///
    /// # Errors
    ///
    /// [`MemifError::DeviceOpen`] if the device cannot be opened read/write,
    /// [`MemifError::Mapping`] if the mapping fails (the handle is closed first).
    pub fn open(device: impl AsRef<Path>, size: usize) -> Result<Self> {
        let mut window = Self::new();
        window.map(device, size)?;
        Ok(window)
    }

    /// Maps `size` bytes of `device` into this instance, replacing any previous mapping.
    ///
    /// # Arguments
    ///
    /// * `device` - UIO device node, opened read/write with `O_SYNC`.
    /// * `size` - Number of bytes to map shared from offset 0.
    ///
    /// # Errors
    ///
    /// See [`MappedWindow::open`]. On error the instance is left unmapped.
    pub fn map(&mut self, device: impl AsRef<Path>, size: usize) -> Result<()> {
        let device = device.as_ref();
        self.close();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(device)
            .map_err(|source| {
                tracing::error!("Error opening {}: {source}", device.display());
                MemifError::DeviceOpen {
                    path: device.to_path_buf(),
                    source,
                }
            })?;

        let mapping = map_shared(&file, size).map_err(|source| {
            tracing::error!("Error mapping {}: {source}", device.display());
            MemifError::Mapping {
                path: device.to_path_buf(),
                size,
                source,
            }
        });
        let mapping = match mapping {
            Ok(mapping) => mapping,
            Err(e) => {
                drop(file);
                return Err(e);
            }
        };

        tracing::info!(
            "Mapped UIO device {}: {:p}, size {size:#x}",
            device.display(),
            mapping.ptr
        );

        self.mapping = Some(mapping);
        self.file = Some(file);
        self.device = Some(device.to_path_buf());
        Ok(())
    }

    /// Unmaps the window and closes the device handle.
    ///
    /// Safe to call any number of times, including on a window that never mapped.
    pub fn close(&mut self) {
        if let Some(mapping) = self.mapping.take() {
            // SAFETY: `ptr`/`len` are exactly what `mmap` returned in `map_shared`,
            // and taking the mapping out of `self` guarantees it is unmapped once.
            // No slice borrowed from it can outlive this `&mut self` call.
            let rc = unsafe { libc::munmap(mapping.ptr.as_ptr().cast(), mapping.len) };
            if rc != 0 {
                tracing::error!("munmap failed: {}", io::Error::last_os_error());
            }
        }
        if let Some(file) = self.file.take() {
            drop(file);
            if let Some(device) = &self.device {
                tracing::debug!("Closed UIO device {}", device.display());
            }
        }
    }

    /// Returns `true` while the window is mapped.
    pub const fn is_mapped(&self) -> bool {
        self.mapping.is_some()
    }

    /// Mapped length in bytes (`0` when unmapped).
    pub fn len(&self) -> usize {
        self.mapping.as_ref().map_or(0, |m| m.len)
    }

    /// Returns `true` when nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the most recently mapped device.
    pub fn device(&self) -> Option<&Path> {
        self.device.as_deref()
    }

    /// The whole window as a byte slice.
    ///
    /// # Errors
    ///
    /// [`MemifError::NotMapped`] after `close`.
    pub fn as_slice(&self) -> Result<&[u8]> {
        let mapping = self.mapping.as_ref().ok_or(MemifError::NotMapped)?;
        // SAFETY: the mapping is live for `len` bytes while `self` holds it, and the
        // returned borrow of `self` prevents `close` from running underneath it.
        Ok(unsafe { slice::from_raw_parts(mapping.ptr.as_ptr(), mapping.len) })
    }

    /// The whole window as a mutable byte slice.
    ///
    /// # Errors
    ///
    /// [`MemifError::NotMapped`] after `close`.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        let mapping = self.mapping.as_ref().ok_or(MemifError::NotMapped)?;
        // SAFETY: as in `as_slice`; the exclusive borrow of `self` makes this the
        // only slice over the mapping in this process.
        Ok(unsafe { slice::from_raw_parts_mut(mapping.ptr.as_ptr(), mapping.len) })
    }
}

impl Drop for MappedWindow {
    fn drop(&mut self) {
        self.close();
    }
}

fn map_shared(file: &File, size: usize) -> io::Result<Mapping> {
    if size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "window size must be non-zero",
        ));
    }

    // SAFETY: a null hint lets the kernel choose the address; the descriptor is valid
    // for the duration of the call because `file` is borrowed. The result is checked
    // against MAP_FAILED before use.
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            size,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            file.as_raw_fd(),
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }

    match NonNull::new(addr.cast::<u8>()) {
        Some(ptr) => Ok(Mapping { ptr, len: size }),
        None => {
            // SAFETY: `addr` is a successful mapping of `size` bytes.
            let _ = unsafe { libc::munmap(addr, size) };
            Err(io::Error::other("mmap returned a null mapping"))
        }
    }
}
