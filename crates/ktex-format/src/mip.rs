//! Mip chain framing.
//!
//! After the header word a KTEX file holds `num_mips` fixed 10-byte level
//! records followed by the level payloads back to back, in the same order.

use std::fmt;
use std::io::{self, Read, Write};

use ktex_common::{ReadExt, ScratchBuffer};
use tracing::{debug, warn};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::transcode::{PixelTranscoder, Surface, TranscodeError};
use crate::{Error, PixelFormat, Result};

/// On-disk mip level record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct MipRecord {
    pub width: U16,
    pub height: U16,
    pub pitch: U16,
    /// Payload size in bytes.
    pub size: U32,
}

impl MipRecord {
    /// Encoded size of a record.
    pub const SIZE: usize = 10;
}

/// One level of a mip chain with its payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MipLevel {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Row pitch as recorded; carried through a conversion unchanged.
    pub pitch: u16,
    /// Declared payload size in bytes.
    pub size: u32,
    /// Payload, exactly `size` bytes once loaded.
    pub data: Vec<u8>,
}

impl MipLevel {
    fn from_record(record: &MipRecord) -> Self {
        Self {
            width: record.width.get(),
            height: record.height.get(),
            pitch: record.pitch.get(),
            size: record.size.get(),
            data: Vec::new(),
        }
    }

    fn record(&self, size: u32) -> MipRecord {
        MipRecord {
            width: U16::new(self.width),
            height: U16::new(self.height),
            pitch: U16::new(self.pitch),
            size: U32::new(size),
        }
    }

    /// Borrow this level as a transcoder surface in `format`.
    pub fn surface(&self, format: PixelFormat) -> Surface<'_> {
        Surface {
            data: &self.data,
            format,
            width: self.width,
            height: self.height,
            pitch: self.pitch,
        }
    }
}

/// A mip payload that ended before its declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortRead {
    pub level: usize,
    pub expected: u32,
    pub actual: usize,
}

impl fmt::Display for ShortRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mip level {} payload short: read {} of {} bytes",
            self.level, self.actual, self.expected
        )
    }
}

/// Read `count` level records.
pub fn decode_levels<R: Read + ?Sized>(reader: &mut R, count: usize) -> Result<Vec<MipLevel>> {
    let mut levels = Vec::with_capacity(count);
    for level in 0..count {
        let record: MipRecord = reader
            .read_struct()
            .map_err(|source| Error::TruncatedStream { level, source })?;

        let mip = MipLevel::from_record(&record);
        debug!(
            index = level,
            width = mip.width,
            height = mip.height,
            pitch = mip.pitch,
            size = mip.size,
            "mip level"
        );
        levels.push(mip);
    }
    Ok(levels)
}

/// Read the payload of every level, in order.
///
/// Each level ends up with a buffer of exactly `size` bytes, filled through
/// the scratch transfer chunk. Buffers grow with the bytes actually read, so a
/// corrupt `size` only costs memory once the stream runs dry and the tail is
/// zero padded. A stream that ends early is not an error: the affected levels
/// keep their zero tail and are returned as [`ShortRead`]s, one per level.
pub fn decode_payloads<R: Read + ?Sized>(
    reader: &mut R,
    levels: &mut [MipLevel],
    scratch: &mut ScratchBuffer,
) -> Result<Vec<ShortRead>> {
    let mut short_reads = Vec::new();

    for (level, mip) in levels.iter_mut().enumerate() {
        let declared = mip.size;
        let size = declared as usize;
        let too_large = || Error::PayloadTooLarge { level, size: declared };

        let mut data = Vec::new();
        let actual = match reader.read_chunked(&mut data, size, scratch.chunk()) {
            Ok(actual) => actual,
            Err(e) if e.kind() == io::ErrorKind::OutOfMemory => return Err(too_large()),
            Err(e) => return Err(e.into()),
        };
        if actual < size {
            data.try_reserve_exact(size - actual).map_err(|_| too_large())?;
            data.resize(size, 0);
        }
        mip.data = data;

        if actual != size {
            let short = ShortRead {
                level,
                expected: mip.size,
                actual,
            };
            warn!("{short}");
            short_reads.push(short);
        }
    }

    Ok(short_reads)
}

/// Write one record per level, sized for `target`.
pub fn encode_level_headers<W, T>(
    writer: &mut W,
    levels: &[MipLevel],
    target: PixelFormat,
    transcoder: &T,
) -> Result<()>
where
    W: Write + ?Sized,
    T: PixelTranscoder + ?Sized,
{
    for (level, mip) in levels.iter().enumerate() {
        let size = transcoder
            .compute_size(target, mip.width, mip.height)
            .map_err(|source| Error::Transcode { level, source })?;
        writer.write_all(mip.record(size).as_bytes())?;
    }
    Ok(())
}

/// Transcode every level from `source` to `target` and write the results.
///
/// The first failing level aborts the whole chain.
pub fn encode_payloads<W, T>(
    writer: &mut W,
    levels: &[MipLevel],
    source: PixelFormat,
    target: PixelFormat,
    transcoder: &T,
    scratch: &mut ScratchBuffer,
) -> Result<()>
where
    W: Write + ?Sized,
    T: PixelTranscoder + ?Sized,
{
    for (level, mip) in levels.iter().enumerate() {
        let expected = transcoder
            .compute_size(target, mip.width, mip.height)
            .map_err(|source| Error::Transcode { level, source })? as usize;

        let out = scratch.staging();
        transcoder
            .transcode(&mip.surface(source), target, out)
            .map_err(|source| Error::Transcode { level, source })?;

        if out.len() != expected {
            return Err(Error::Transcode {
                level,
                source: TranscodeError::SizeMismatch {
                    expected,
                    actual: out.len(),
                },
            });
        }

        writer.write_all(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Copies the source through unchanged.
    struct Identity;

    impl PixelTranscoder for Identity {
        fn transcode(
            &self,
            src: &Surface<'_>,
            _target: PixelFormat,
            out: &mut Vec<u8>,
        ) -> std::result::Result<(), TranscodeError> {
            out.extend_from_slice(src.data);
            Ok(())
        }
    }

    /// Fails on every surface whose first byte is 0xEE.
    struct FailOnMarker;

    impl PixelTranscoder for FailOnMarker {
        fn transcode(
            &self,
            src: &Surface<'_>,
            target: PixelFormat,
            out: &mut Vec<u8>,
        ) -> std::result::Result<(), TranscodeError> {
            if src.data.first() == Some(&0xEE) {
                return Err(TranscodeError::UnsupportedTarget(target));
            }
            out.extend_from_slice(src.data);
            Ok(())
        }
    }

    fn record_bytes(width: u16, height: u16, pitch: u16, size: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.extend_from_slice(&pitch.to_le_bytes());
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes
    }

    fn level(width: u16, height: u16, fill: u8) -> MipLevel {
        let size = u32::from(width) * u32::from(height) * 4;
        MipLevel {
            width,
            height,
            pitch: width * 4,
            size,
            data: vec![fill; size as usize],
        }
    }

    #[test]
    fn test_record_size() {
        assert_eq!(std::mem::size_of::<MipRecord>(), MipRecord::SIZE);
    }

    #[test]
    fn test_decode_levels() {
        let mut bytes = record_bytes(4, 4, 16, 64);
        bytes.extend(record_bytes(2, 2, 8, 16));
        let levels = decode_levels(&mut Cursor::new(bytes), 2).unwrap();

        assert_eq!(levels.len(), 2);
        assert_eq!((levels[0].width, levels[0].height, levels[0].pitch, levels[0].size), (4, 4, 16, 64));
        assert_eq!((levels[1].width, levels[1].height, levels[1].pitch, levels[1].size), (2, 2, 8, 16));
    }

    #[test]
    fn test_decode_levels_truncated() {
        let mut bytes = record_bytes(4, 4, 16, 64);
        bytes.extend(&record_bytes(2, 2, 8, 16)[..6]);
        let err = decode_levels(&mut Cursor::new(bytes), 2).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { level: 1, .. }));
    }

    #[test]
    fn test_decode_payloads_exact() {
        let mut levels = vec![
            MipLevel { size: 5, ..Default::default() },
            MipLevel { size: 3, ..Default::default() },
        ];
        let mut scratch = ScratchBuffer::new(2);
        let mut stream = Cursor::new(vec![1u8, 2, 3, 4, 5, 6, 7, 8]);

        let short = decode_payloads(&mut stream, &mut levels, &mut scratch).unwrap();
        assert!(short.is_empty());
        assert_eq!(levels[0].data, [1, 2, 3, 4, 5]);
        assert_eq!(levels[1].data, [6, 7, 8]);
    }

    #[test]
    fn test_decode_payloads_short_stream() {
        let mut levels = vec![
            MipLevel { size: 4, ..Default::default() },
            MipLevel { size: 4, ..Default::default() },
            MipLevel { size: 4, ..Default::default() },
        ];
        let mut scratch = ScratchBuffer::new(3);
        let mut stream = Cursor::new(vec![9u8; 6]);

        let short = decode_payloads(&mut stream, &mut levels, &mut scratch).unwrap();

        assert_eq!(
            short,
            [
                ShortRead { level: 1, expected: 4, actual: 2 },
                ShortRead { level: 2, expected: 4, actual: 0 },
            ]
        );
        for mip in &levels {
            assert_eq!(mip.data.len(), mip.size as usize);
        }
        assert_eq!(levels[0].data, [9, 9, 9, 9]);
        assert_eq!(levels[1].data, [9, 9, 0, 0]);
        assert_eq!(levels[2].data, [0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_payloads_grows_with_stream() {
        let mut levels = vec![MipLevel { size: 1 << 30, ..Default::default() }];
        let mut scratch = ScratchBuffer::new(4);
        let mut data = Vec::new();

        let actual = Cursor::new(vec![5u8; 6])
            .read_chunked(&mut data, levels[0].size as usize, scratch.chunk())
            .unwrap();
        assert_eq!(actual, 6);
        assert!(data.capacity() < 1 << 20);

        levels[0].size = 10;
        let short = decode_payloads(&mut Cursor::new(vec![5u8; 6]), &mut levels, &mut scratch).unwrap();
        assert_eq!(short, [ShortRead { level: 0, expected: 10, actual: 6 }]);
        assert_eq!(levels[0].data, [5, 5, 5, 5, 5, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_level_headers_recomputes_size() {
        let levels = vec![level(8, 8, 0), level(4, 4, 0)];
        let mut out = Vec::new();
        encode_level_headers(&mut out, &levels, PixelFormat::Dxt1, &Identity).unwrap();

        let mut expected = record_bytes(8, 8, 32, 32);
        expected.extend(record_bytes(4, 4, 16, 8));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_encode_level_headers_rejects_oversized_surface() {
        let levels = vec![MipLevel {
            width: u16::MAX,
            height: u16::MAX,
            ..Default::default()
        }];
        let err = encode_level_headers(&mut Vec::new(), &levels, PixelFormat::Argb, &Identity).unwrap_err();
        assert!(matches!(
            err,
            Error::Transcode {
                level: 0,
                source: TranscodeError::SurfaceTooLarge { .. }
            }
        ));

        // the same surface block compressed still fits
        let mut out = Vec::new();
        encode_level_headers(&mut out, &levels, PixelFormat::Dxt1, &Identity).unwrap();
        assert_eq!(out.len(), MipRecord::SIZE);
    }

    #[test]
    fn test_encode_payloads() {
        let levels = vec![level(2, 2, 1), level(1, 1, 2)];
        let mut scratch = ScratchBuffer::new(16);
        let mut out = Vec::new();
        encode_payloads(&mut out, &levels, PixelFormat::Argb, PixelFormat::Argb, &Identity, &mut scratch)
            .unwrap();

        let mut expected = vec![1u8; 16];
        expected.extend([2u8; 4]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_encode_payloads_aborts_on_failure() {
        let levels = vec![level(2, 2, 1), level(2, 2, 0xEE), level(1, 1, 3)];
        let mut scratch = ScratchBuffer::new(16);
        let mut out = Vec::new();
        let err = encode_payloads(
            &mut out,
            &levels,
            PixelFormat::Argb,
            PixelFormat::Argb,
            &FailOnMarker,
            &mut scratch,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Transcode { level: 1, .. }));
        assert_eq!(out.len(), 16);
    }

    #[test]
    fn test_encode_payloads_size_mismatch() {
        let levels = vec![level(2, 2, 1)];
        let mut scratch = ScratchBuffer::new(16);
        let err = encode_payloads(
            &mut Vec::new(),
            &levels,
            PixelFormat::Argb,
            PixelFormat::Rgb,
            &Identity,
            &mut scratch,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            Error::Transcode {
                level: 0,
                source: TranscodeError::SizeMismatch { expected: 12, actual: 16 }
            }
        ));
    }
}
