//! Memory interface consumed by the host-target protocol driver.
//!
//! The driver (program loader, syscall proxy, tohost/fromhost polling) only sees
//! this trait. Implementors provide the four chunk primitives; the driver consults
//! `chunk_align` and `chunk_max_size` before issuing a request, and the provided
//! helpers split larger transfers into chunks of at most `chunk_max_size` bytes.

use crate::common::constants::{CHUNK_ALIGN, CHUNK_MAX_SIZE};
use crate::common::{MemifError, Result};

/// Chunked access to target memory.
pub trait TargetMemory {
    /// Reads `dst.len()` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the engine returns [`MemifError::OutOfBounds`].
    fn read_chunk(&mut self, addr: u64, dst: &mut [u8]) -> Result<()>;

    /// Writes `src` at `addr`; the data must be visible to the target on return.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the engine returns [`MemifError::OutOfBounds`].
    fn write_chunk(&mut self, addr: u64, src: &[u8]) -> Result<()>;

    /// Zero-fills `len` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the engine returns [`MemifError::OutOfBounds`].
    fn clear_chunk(&mut self, addr: u64, len: usize) -> Result<()>;

    /// Starts (or restarts) execution on the target.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn reset(&mut self) -> Result<()>;

    /// Alignment of every chunk the driver issues.
    fn chunk_align(&self) -> usize {
        CHUNK_ALIGN
    }

    /// Largest chunk the driver issues.
    fn chunk_max_size(&self) -> usize {
        CHUNK_MAX_SIZE
    }

    /// Reads an arbitrary-length buffer as a sequence of chunks.
    ///
    /// # Errors
    ///
    /// The first failing chunk's error; earlier chunks have already been read.
    fn read_bytes(&mut self, addr: u64, dst: &mut [u8]) -> Result<()> {
        let step = self.chunk_max_size().max(1);
        let len = dst.len();
        for (i, chunk) in dst.chunks_mut(step).enumerate() {
            let at = chunk_addr(addr, i, step, len)?;
            self.read_chunk(at, chunk)?;
        }
        Ok(())
    }

    /// Writes an arbitrary-length buffer as a sequence of chunks.
    ///
    /// # Errors
    ///
    /// The first failing chunk's error; earlier chunks have already been written.
    fn write_bytes(&mut self, addr: u64, src: &[u8]) -> Result<()> {
        let step = self.chunk_max_size().max(1);
        for (i, chunk) in src.chunks(step).enumerate() {
            let at = chunk_addr(addr, i, step, src.len())?;
            self.write_chunk(at, chunk)?;
        }
        Ok(())
    }

    /// Zero-fills an arbitrary-length range as a sequence of chunks.
    ///
    /// # Errors
    ///
    /// The first failing chunk's error; earlier chunks have already been cleared.
    fn clear_bytes(&mut self, addr: u64, len: usize) -> Result<()> {
        let step = self.chunk_max_size().max(1);
        let mut done = 0;
        while done < len {
            let n = step.min(len - done);
            let at = chunk_addr(addr, done / step, step, len)?;
            self.clear_chunk(at, n)?;
            done += n;
        }
        Ok(())
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// See [`TargetMemory::read_chunk`].
    fn read_u32(&mut self, addr: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_chunk(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Writes a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// See [`TargetMemory::write_chunk`].
    fn write_u32(&mut self, addr: u64, val: u32) -> Result<()> {
        self.write_chunk(addr, &val.to_le_bytes())
    }

    /// Reads a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// See [`TargetMemory::read_chunk`].
    fn read_u64(&mut self, addr: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_chunk(addr, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Writes a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// See [`TargetMemory::write_chunk`].
    fn write_u64(&mut self, addr: u64, val: u64) -> Result<()> {
        self.write_chunk(addr, &val.to_le_bytes())
    }
}

fn chunk_addr(addr: u64, index: usize, step: usize, len: usize) -> Result<u64> {
    index
        .checked_mul(step)
        .and_then(|delta| addr.checked_add(delta as u64))
        .ok_or(MemifError::OutOfBounds { addr, len })
}
