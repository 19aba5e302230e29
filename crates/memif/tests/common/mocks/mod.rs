/// Recording `TargetMemory` backed by a `Vec<u8>`.
pub mod memory;
