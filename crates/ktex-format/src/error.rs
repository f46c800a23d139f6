//! Error types for KTEX handling.

use thiserror::Error;

use crate::mip::ShortRead;
use crate::transcode::TranscodeError;

/// Errors that can occur when reading or writing KTEX files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with `KTEX`.
    #[error("invalid KTEX magic: expected 'KTEX', got {0:?}")]
    BadMagic([u8; 4]),

    /// The header names a pixel format that cannot be transcoded.
    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(u32),

    /// The mip level table ended early.
    #[error("mip level table truncated at level {level}: {source}")]
    TruncatedStream {
        level: usize,
        #[source]
        source: ktex_common::Error,
    },

    /// A mip payload is larger than can be allocated.
    #[error("mip level {level} payload of {size} bytes cannot be allocated")]
    PayloadTooLarge { level: usize, size: u32 },

    /// A mip payload ended early (only raised when short reads are not tolerated).
    #[error("{0}")]
    ShortRead(ShortRead),

    /// The transcoder failed on a mip level.
    #[error("transcode failed on mip level {level}: {source}")]
    Transcode {
        level: usize,
        #[source]
        source: TranscodeError,
    },
}

/// Result type for KTEX operations.
pub type Result<T> = std::result::Result<T, Error>;
