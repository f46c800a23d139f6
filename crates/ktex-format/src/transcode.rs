//! Pixel transcoder interface.
//!
//! The codec never looks inside pixel payloads itself. Converting a mip level
//! from one [`PixelFormat`] to another is delegated to a [`PixelTranscoder`].

use thiserror::Error;

use crate::PixelFormat;

/// A borrowed mip surface handed to a transcoder.
#[derive(Debug, Clone, Copy)]
pub struct Surface<'a> {
    pub data: &'a [u8],
    pub format: PixelFormat,
    pub width: u16,
    pub height: u16,
    /// Row pitch as stored in the file. Zero when unspecified.
    pub pitch: u16,
}

/// Errors reported by a transcoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The transcoder cannot read this source format.
    #[error("unsupported source format: {0}")]
    UnsupportedSource(PixelFormat),

    /// The transcoder cannot produce this target format.
    #[error("unsupported target format: {0}")]
    UnsupportedTarget(PixelFormat),

    /// The source payload is smaller than its dimensions require.
    #[error("input too small: expected {expected} bytes, got {actual}")]
    InputTooSmall { expected: usize, actual: usize },

    /// The transcoder produced a buffer of the wrong size.
    #[error("output size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Decoding the source failed.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The surface does not fit the 32-bit size field of a level record.
    #[error("{width}x{height} {format} surface exceeds 4 GiB")]
    SurfaceTooLarge {
        format: PixelFormat,
        width: u16,
        height: u16,
    },
}

/// Converts pixel buffers between formats.
pub trait PixelTranscoder {
    /// Convert `src` into `target`, writing the result into `out`.
    ///
    /// `out` arrives empty. On success it must hold exactly
    /// [`compute_size`](Self::compute_size)`(target, width, height)` bytes.
    fn transcode(
        &self,
        src: &Surface<'_>,
        target: PixelFormat,
        out: &mut Vec<u8>,
    ) -> Result<(), TranscodeError>;

    /// Size in bytes of a `width` x `height` surface in `format`.
    fn compute_size(&self, format: PixelFormat, width: u16, height: u16) -> Result<u32, TranscodeError> {
        let size = format.surface_size(width.into(), height.into());
        u32::try_from(size).map_err(|_| TranscodeError::SurfaceTooLarge {
            format,
            width,
            height,
        })
    }
}

impl<T: PixelTranscoder + ?Sized> PixelTranscoder for &T {
    fn transcode(
        &self,
        src: &Surface<'_>,
        target: PixelFormat,
        out: &mut Vec<u8>,
    ) -> Result<(), TranscodeError> {
        (**self).transcode(src, target, out)
    }

    fn compute_size(&self, format: PixelFormat, width: u16, height: u16) -> Result<u32, TranscodeError> {
        (**self).compute_size(format, width, height)
    }
}
