//! Pixel format transcoding for KTEX textures.
//!
//! [`BlockTranscoder`] implements [`PixelTranscoder`] for every format a KTEX
//! header can name. Conversions go through tightly packed RGBA8:
//!
//! | format   | decode            | encode       |
//! |----------|-------------------|--------------|
//! | DXT1/3/5 | squish            | squish       |
//! | ETC2_EAC | texture2ddecoder  | unsupported  |
//! | ARGB/RGB | byte repacking    | byte repacking |
//!
//! Converting a surface to its own format copies it through untouched.

mod block;
mod linear;

use ktex_format::{PixelFormat, PixelTranscoder, Surface, TranscodeError};
use tracing::trace;

use squish::Params;

/// The bundled transcoder.
#[derive(Clone, Copy)]
pub struct BlockTranscoder {
    params: Params,
}

impl BlockTranscoder {
    /// Create a transcoder with squish's default compression parameters.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Decode any supported surface into tightly packed RGBA8.
    pub fn decode_rgba(&self, src: &Surface<'_>, rgba: &mut Vec<u8>) -> Result<(), TranscodeError> {
        if src.format.is_block_compressed() {
            block::decode(src, rgba)
        } else {
            linear::decode(src, rgba)
        }
    }

    /// Encode tightly packed RGBA8 into `target`.
    pub fn encode_rgba(
        &self,
        rgba: &[u8],
        width: u16,
        height: u16,
        target: PixelFormat,
        out: &mut Vec<u8>,
    ) -> Result<(), TranscodeError> {
        if target.is_block_compressed() {
            block::encode(rgba, width.into(), height.into(), target, self.params, out)
        } else {
            linear::encode(rgba, target, out)
        }
    }

    /// Whether `src` can be copied verbatim into `target`.
    fn is_passthrough(src: &Surface<'_>, target: PixelFormat) -> bool {
        src.format == target && (target.is_block_compressed() || linear::is_tight(src))
    }
}

impl Default for BlockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockTranscoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockTranscoder").finish_non_exhaustive()
    }
}

impl PixelTranscoder for BlockTranscoder {
    fn transcode(
        &self,
        src: &Surface<'_>,
        target: PixelFormat,
        out: &mut Vec<u8>,
    ) -> Result<(), TranscodeError> {
        let expected = self.compute_size(target, src.width, src.height)? as usize;

        if src.width == 0 || src.height == 0 {
            out.resize(expected, 0);
            return Ok(());
        }

        if Self::is_passthrough(src, target) {
            if src.data.len() < expected {
                return Err(TranscodeError::InputTooSmall {
                    expected,
                    actual: src.data.len(),
                });
            }
            out.extend_from_slice(&src.data[..expected]);
            return Ok(());
        }

        trace!(
            from = %src.format,
            to = %target,
            width = src.width,
            height = src.height,
            "transcoding surface"
        );

        let mut rgba = Vec::new();
        self.decode_rgba(src, &mut rgba)?;
        self.encode_rgba(&rgba, src.width, src.height, target, out)
    }
}
