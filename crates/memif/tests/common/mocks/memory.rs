use uio_memif::{MemifError, Result, TargetMemory};

/// One primitive call seen by [`RecordingMemory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Read { addr: u64, len: usize },
    Write { addr: u64, len: usize },
    Clear { addr: u64, len: usize },
    Reset,
}

/// Flat memory at `base` that records every chunk primitive it serves.
pub struct RecordingMemory {
    data: Vec<u8>,
    base: u64,
    max_chunk: usize,
    pub calls: Vec<Call>,
}

impl RecordingMemory {
    pub fn new(size: usize, base: u64, max_chunk: usize) -> Self {
        Self {
            data: vec![0; size],
            base,
            max_chunk,
            calls: Vec::new(),
        }
    }

    fn range(&self, addr: u64, len: usize) -> Result<std::ops::Range<usize>> {
        let start = addr
            .checked_sub(self.base)
            .ok_or(MemifError::OutOfBounds { addr, len })? as usize;
        let end = start + len;
        if end > self.data.len() || len > self.max_chunk {
            return Err(MemifError::OutOfBounds { addr, len });
        }
        Ok(start..end)
    }
}

impl TargetMemory for RecordingMemory {
    fn read_chunk(&mut self, addr: u64, dst: &mut [u8]) -> Result<()> {
        self.calls.push(Call::Read {
            addr,
            len: dst.len(),
        });
        let range = self.range(addr, dst.len())?;
        dst.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_chunk(&mut self, addr: u64, src: &[u8]) -> Result<()> {
        self.calls.push(Call::Write {
            addr,
            len: src.len(),
        });
        let range = self.range(addr, src.len())?;
        self.data[range].copy_from_slice(src);
        Ok(())
    }

    fn clear_chunk(&mut self, addr: u64, len: usize) -> Result<()> {
        self.calls.push(Call::Clear { addr, len });
        let range = self.range(addr, len)?;
        self.data[range].fill(0);
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.calls.push(Call::Reset);
        Ok(())
    }

    fn chunk_max_size(&self) -> usize {
        self.max_chunk
    }
}
