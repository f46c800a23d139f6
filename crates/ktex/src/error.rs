//! Error types for the conversion library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while converting files, archives or trees.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// KTEX codec error.
    #[error("{0}")]
    Format(#[from] ktex_format::Error),

    /// The archive could not be opened, enumerated or written.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// PNG export failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The batch source does not exist.
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
