/// Fixtures that build windows and engines over temporary files.
pub mod harness;

/// Mock implementations of the memory interface.
pub mod mocks;
