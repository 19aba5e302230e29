//! Window offset type.
//!
//! Target addresses are plain `u64` values in the Rocket address space. Offsets into
//! the mapped window get their own type so a translated offset is never confused
//! with the address it came from.

use std::fmt;

/// A byte offset inside the mapped UIO window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowOffset(pub usize);

impl WindowOffset {
    /// Creates a window offset from a raw byte count.
    #[inline(always)]
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// Returns the raw byte offset.
    #[inline(always)]
    pub const fn val(self) -> usize {
        self.0
    }
}

impl fmt::Display for WindowOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
