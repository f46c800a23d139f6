//! Block-compressed surfaces: DXT1/3/5 through squish, ETC2 through texture2ddecoder.

use ktex_format::{PixelFormat, Surface, TranscodeError};
use squish::{Format as SquishFormat, Params};

fn squish_format(format: PixelFormat) -> Option<SquishFormat> {
    match format {
        PixelFormat::Dxt1 => Some(SquishFormat::Bc1),
        PixelFormat::Dxt3 => Some(SquishFormat::Bc2),
        PixelFormat::Dxt5 => Some(SquishFormat::Bc3),
        _ => None,
    }
}

/// Decompress a block surface into tightly packed RGBA8.
pub(crate) fn decode(src: &Surface<'_>, rgba: &mut Vec<u8>) -> Result<(), TranscodeError> {
    let width = usize::from(src.width);
    let height = usize::from(src.height);

    let expected = src.format.surface_size(width as u32, height as u32);
    if src.data.len() < expected {
        return Err(TranscodeError::InputTooSmall {
            expected,
            actual: src.data.len(),
        });
    }
    let data = &src.data[..expected];

    if let Some(format) = squish_format(src.format) {
        rgba.resize(width * height * 4, 0);
        format.decompress(data, width, height, rgba);
        return Ok(());
    }

    match src.format {
        PixelFormat::Etc2Eac => {
            let mut pixels = vec![0u32; width * height];
            texture2ddecoder::decode_etc2_rgba8(data, width, height, &mut pixels)
                .map_err(|e| TranscodeError::Decode(e.to_string()))?;

            // texture2ddecoder packs BGRA into each u32
            rgba.reserve(pixels.len() * 4);
            for pixel in pixels {
                let [b, g, r, a] = pixel.to_le_bytes();
                rgba.extend_from_slice(&[r, g, b, a]);
            }
            Ok(())
        }
        other => Err(TranscodeError::UnsupportedSource(other)),
    }
}

/// Compress tightly packed RGBA8 into a block `target`.
pub(crate) fn encode(
    rgba: &[u8],
    width: usize,
    height: usize,
    target: PixelFormat,
    params: Params,
    out: &mut Vec<u8>,
) -> Result<(), TranscodeError> {
    let format = squish_format(target).ok_or(TranscodeError::UnsupportedTarget(target))?;

    let start = out.len();
    out.resize(start + format.compressed_size(width, height), 0);
    format.compress(rgba, width, height, params, &mut out[start..]);
    Ok(())
}
