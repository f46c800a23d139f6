//! Uncompressed ARGB / RGB surfaces.

use ktex_format::{PixelFormat, Surface, TranscodeError};

/// Distance in bytes between two rows of `src`.
///
/// The stored pitch is honoured only when it is wider than a tight row and the
/// payload actually holds every padded row. Otherwise rows are tightly packed;
/// a level converted from a block format keeps its block pitch in the record.
pub(crate) fn row_stride(src: &Surface<'_>) -> usize {
    let tight = usize::from(src.width) * src.format.unit_size();
    let pitch = usize::from(src.pitch);
    let rows = usize::from(src.height).saturating_sub(1);

    if rows > 0 && pitch > tight && pitch * rows + tight <= src.data.len() {
        pitch
    } else {
        tight
    }
}

/// Whether `src` is stored without row padding.
pub(crate) fn is_tight(src: &Surface<'_>) -> bool {
    row_stride(src) == usize::from(src.width) * src.format.unit_size()
}

/// Unpack a linear surface into tightly packed RGBA8.
pub(crate) fn decode(src: &Surface<'_>, rgba: &mut Vec<u8>) -> Result<(), TranscodeError> {
    let width = usize::from(src.width);
    let height = usize::from(src.height);
    let bpp = src.format.unit_size();
    let stride = row_stride(src);

    let expected = stride * height.saturating_sub(1) + width * bpp;
    if src.data.len() < expected {
        return Err(TranscodeError::InputTooSmall {
            expected,
            actual: src.data.len(),
        });
    }

    rgba.reserve(width * height * 4);
    for row in src.data.chunks(stride).take(height) {
        let row = &row[..width * bpp];
        match src.format {
            PixelFormat::Argb => rgba.extend_from_slice(row),
            PixelFormat::Rgb => {
                for px in row.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 0xFF]);
                }
            }
            other => return Err(TranscodeError::UnsupportedSource(other)),
        }
    }
    Ok(())
}

/// Pack tightly packed RGBA8 into a linear `target`.
pub(crate) fn encode(rgba: &[u8], target: PixelFormat, out: &mut Vec<u8>) -> Result<(), TranscodeError> {
    match target {
        PixelFormat::Argb => out.extend_from_slice(rgba),
        PixelFormat::Rgb => {
            out.reserve(rgba.len() / 4 * 3);
            for px in rgba.chunks_exact(4) {
                out.extend_from_slice(&px[..3]);
            }
        }
        other => return Err(TranscodeError::UnsupportedTarget(other)),
    }
    Ok(())
}
