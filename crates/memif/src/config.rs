//! Startup configuration for the UIO memory interface.
//!
//! This module resolves the three sizing parameters the window and layout need:
//! 1. **Device:** Path of the UIO device; mandatory, there is no default.
//! 2. **Window size:** Total length mapped from the device (default 1 GiB).
//! 3. **DRAM size:** Length of the DRAM region (default: up to the boot ROM offset).
//!
//! Configuration comes from host-tool plusargs (`+uio=/dev/uio0 +uio_size=0x40000000`)
//! or JSON. A size of zero means "not specified" and is replaced by its default.

use crate::common::constants::UIO_BOOTROM_OFFSET;
use crate::common::{MemifError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default sizing constants.
mod defaults {
    use super::UIO_BOOTROM_OFFSET;

    /// Window size mapped from the UIO device (1 GiB).
    pub const UIO_SIZE: u64 = 0x4000_0000;

    /// DRAM size: everything below the boot ROM in the window.
    pub const DRAM_SIZE: u64 = UIO_BOOTROM_OFFSET as u64;
}

/// Resolved UIO configuration.
///
/// # Examples
///
/// ```
/// use uio_memif::config::UioConfig;
///
/// let args = ["prog", "+uio=/dev/uio0", "+dram_size=0x1000000"];
/// let config = UioConfig::from_plusargs(args).unwrap();
/// assert_eq!(config.uio_size, 0x4000_0000);
/// assert_eq!(config.dram_size, 0x100_0000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UioConfig {
    /// UIO device to map (e.g. `/dev/uio0`).
    #[serde(default)]
    pub device: Option<PathBuf>,

    /// Total window size in bytes.
    #[serde(default = "UioConfig::default_uio_size")]
    pub uio_size: u64,

    /// DRAM region size in bytes.
    #[serde(default = "UioConfig::default_dram_size")]
    pub dram_size: u64,
}

impl UioConfig {
    /// An empty configuration: no device, both sizes unspecified.
    pub const fn unset() -> Self {
        Self {
            device: None,
            uio_size: 0,
            dram_size: 0,
        }
    }

    /// Parses plusargs, ignoring anything that is not a recognized `+key=value`.
    ///
    /// # Errors
    ///
    /// [`MemifError::InvalidNumber`] if a size is not a number.
    pub fn from_plusargs<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::unset().apply_plusargs(args)?.resolved())
    }

    /// Parses a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`MemifError::Config`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.resolved())
    }

    /// Overrides fields from plusargs (`+uio=`, `+uio_size=`, `+dram_size=`).
    ///
    /// # Errors
    ///
    /// [`MemifError::InvalidNumber`] if a size is not a number.
    pub fn apply_plusargs<I, S>(mut self, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if let Some(path) = arg.strip_prefix("+uio=") {
                self.device = Some(PathBuf::from(path));
            } else if let Some(value) = arg.strip_prefix("+uio_size=") {
                self.uio_size = parse_size(value)?;
            } else if let Some(value) = arg.strip_prefix("+dram_size=") {
                self.dram_size = parse_size(value)?;
            }
        }
        Ok(self)
    }

    /// Replaces unspecified (zero) sizes with their defaults.
    #[must_use]
    pub fn resolved(mut self) -> Self {
        if self.uio_size == 0 {
            self.uio_size = defaults::UIO_SIZE;
            tracing::info!("Using default UIO size: {:#x} (1GB)", self.uio_size);
        }
        if self.dram_size == 0 {
            self.dram_size = defaults::DRAM_SIZE;
            tracing::info!("Using default DRAM size: {:#x}", self.dram_size);
        }
        self
    }

    /// The configured device.
    ///
    /// # Errors
    ///
    /// [`MemifError::MissingDevice`] if no (or an empty) path was given.
    pub fn device_path(&self) -> Result<&Path> {
        match &self.device {
            Some(path) if !path.as_os_str().is_empty() => Ok(path),
            _ => Err(MemifError::MissingDevice),
        }
    }

    /// Window size as a host length.
    ///
    /// # Errors
    ///
    /// [`MemifError::Layout`] if the size does not fit the host address space.
    pub fn window_size(&self) -> Result<usize> {
        usize::try_from(self.uio_size).map_err(|_| {
            MemifError::layout(format!(
                "window size {:#x} exceeds host address space",
                self.uio_size
            ))
        })
    }

    const fn default_uio_size() -> u64 {
        defaults::UIO_SIZE
    }

    const fn default_dram_size() -> u64 {
        defaults::DRAM_SIZE
    }
}

impl Default for UioConfig {
    /// No device; default window and DRAM sizes.
    fn default() -> Self {
        Self {
            device: None,
            uio_size: defaults::UIO_SIZE,
            dram_size: defaults::DRAM_SIZE,
        }
    }
}

/// Parses a number the way `strtoull(s, 0, 0)` does: `0x` hex, leading-`0` octal,
/// otherwise decimal.
///
/// # Errors
///
/// [`MemifError::InvalidNumber`] if the text is empty or has trailing garbage.
pub fn parse_size(value: &str) -> Result<u64> {
    let text = value.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(octal) = text.strip_prefix('0').filter(|rest| !rest.is_empty()) {
        u64::from_str_radix(octal, 8)
    } else {
        text.parse::<u64>()
    };
    parsed.map_err(|_| MemifError::InvalidNumber {
        value: value.to_owned(),
    })
}
