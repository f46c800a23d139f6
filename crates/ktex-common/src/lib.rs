//! Common utilities for KTEX tooling.
//!
//! This crate provides the small foundation shared by the other KTEX crates:
//!
//! - [`ReadExt`] - Stream reading of fixed-size structures and chunked payloads
//! - [`ScratchBuffer`] - The reusable transfer/staging buffer of one conversion run

mod error;
mod reader;
mod scratch;

pub use error::{Error, Result};
pub use reader::ReadExt;
pub use scratch::{ScratchBuffer, DEFAULT_SCRATCH_SIZE};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
