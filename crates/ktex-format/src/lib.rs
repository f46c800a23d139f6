//! KTEX texture container codec.
//!
//! A KTEX file is laid out as:
//!
//! ```text
//! offset 0               "KTEX"
//! offset 4               u32 header word (see [`KtexHeader`])
//! offset 8               num_mips x 10-byte level records (see [`MipRecord`])
//! offset 8 + 10*num_mips level payloads, back to back
//! ```
//!
//! All integers are little-endian. This crate handles the header and mip
//! chain framing; pixel data is converted by a [`PixelTranscoder`].
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{BufReader, Read};
//!
//! use ktex_common::ScratchBuffer;
//! use ktex_format::{mip, KtexHeader, KTEX_MAGIC};
//!
//! let mut reader = BufReader::new(File::open("texture.tex")?);
//! let mut magic = [0u8; 4];
//! reader.read_exact(&mut magic)?;
//! assert_eq!(&magic, KTEX_MAGIC);
//!
//! let header = KtexHeader::read_from(&mut reader)?;
//! let mut levels = mip::decode_levels(&mut reader, header.num_mips as usize)?;
//! let mut scratch = ScratchBuffer::new(1 << 20);
//! mip::decode_payloads(&mut reader, &mut levels, &mut scratch)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
pub mod mip;
mod pixel;
mod transcode;

pub use error::{Error, Result};
pub use header::{layout, BitField, KtexHeader, LEGACY_SENTINEL, REMAINDER_FILL};
pub use mip::{MipLevel, MipRecord, ShortRead};
pub use pixel::{resolve_pixel_format, PixelFormat, Platform, TextureType};
pub use transcode::{PixelTranscoder, Surface, TranscodeError};

/// KTEX file magic bytes.
pub const KTEX_MAGIC: &[u8; 4] = b"KTEX";
