//! KTEX - game texture conversion library.
//!
//! This crate ties the KTEX crates together into the operations a converter
//! tool needs: loading and converting single files, rewriting the textures
//! inside zip archives, and mirroring whole directory trees.
//!
//! # Crates
//!
//! - [`ktex_common`] - Stream helpers and the run scratch buffer
//! - [`ktex_format`] - Header and mip chain codec
//! - [`ktex_transcode`] - DXT / ETC2 / ARGB / RGB pixel transcoding
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use ktex::prelude::*;
//!
//! let transcoder = BlockTranscoder::new();
//! let config = BatchConfig::new(PixelFormat::Dxt5);
//! let mut converter = BatchConverter::new(config, &transcoder);
//!
//! let report = converter.run(Path::new("data/images"), Path::new("out/images"))?;
//! println!("converted {} textures", report.converted);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod batch;
mod config;
mod error;
mod texfile;

pub use ktex_common as common;
pub use ktex_format as format;
pub use ktex_transcode as transcode;

pub use batch::{BatchConverter, BatchReport, Outcome};
pub use config::BatchConfig;
pub use error::{Error, Result};
pub use texfile::TexFile;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ktex_common::ScratchBuffer;
    pub use ktex_format::{KtexHeader, MipLevel, PixelFormat, PixelTranscoder};
    pub use ktex_transcode::BlockTranscoder;

    pub use crate::{BatchConfig, BatchConverter, BatchReport, Outcome, TexFile};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
