//! A single KTEX file held in memory.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{Rgba, RgbaImage};
use ktex_common::{ReadExt, ScratchBuffer};
use ktex_format::mip::{self, MipLevel, ShortRead};
use ktex_format::{
    resolve_pixel_format, KtexHeader, PixelFormat, PixelTranscoder, TranscodeError, KTEX_MAGIC,
};
use tracing::{debug, info, warn};

use crate::Result;

/// A loaded KTEX texture: header, mip chain and where it came from.
///
/// Values only exist after a successful load, so conversion never runs on a
/// half-read file.
#[derive(Debug, Clone)]
pub struct TexFile {
    path: PathBuf,
    header: KtexHeader,
    source_format: PixelFormat,
    levels: Vec<MipLevel>,
    short_reads: Vec<ShortRead>,
}

impl TexFile {
    /// Load a KTEX file from disk.
    pub fn load<P: AsRef<Path>>(path: P, scratch: &mut ScratchBuffer) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::load_from(BufReader::new(file), path, scratch)
    }

    /// Load a KTEX file from any reader. `path` is kept for naming and logging.
    pub fn load_from<R: Read>(
        mut reader: R,
        path: impl Into<PathBuf>,
        scratch: &mut ScratchBuffer,
    ) -> Result<Self> {
        let path = path.into();

        let mut magic = [0u8; 4];
        let read = reader.read_up_to(&mut magic)?;
        if read != magic.len() || &magic != KTEX_MAGIC {
            return Err(ktex_format::Error::BadMagic(magic).into());
        }

        let header = KtexHeader::read_from(&mut reader)?;
        debug!("{}: {header}", path.display());
        if header.is_legacy() {
            debug!("{}: pre-update header layout", path.display());
        }

        let source_format = resolve_pixel_format(header.pixel_format)?;
        let mut levels = mip::decode_levels(&mut reader, header.num_mips as usize)?;
        let short_reads = mip::decode_payloads(&mut reader, &mut levels, scratch)?;

        Ok(Self {
            path,
            header,
            source_format,
            levels,
            short_reads,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &KtexHeader {
        &self.header
    }

    /// The pixel format the payloads are stored in.
    pub fn source_format(&self) -> PixelFormat {
        self.source_format
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    /// Payloads that ended early while loading.
    pub fn short_reads(&self) -> &[ShortRead] {
        &self.short_reads
    }

    /// Whether the header uses the pre-update layout.
    pub fn is_legacy(&self) -> bool {
        self.header.is_legacy()
    }

    /// Write this texture to `dst` in `target` format.
    ///
    /// If transcoding fails midway the partially written file is left behind.
    pub fn convert<P, T>(
        &self,
        dst: P,
        target: PixelFormat,
        transcoder: &T,
        scratch: &mut ScratchBuffer,
    ) -> Result<()>
    where
        P: AsRef<Path>,
        T: PixelTranscoder + ?Sized,
    {
        let mut writer = BufWriter::new(File::create(dst)?);
        self.write_to(&mut writer, target, transcoder, scratch)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode this texture in `target` format into `writer`.
    pub fn write_to<W, T>(
        &self,
        writer: &mut W,
        target: PixelFormat,
        transcoder: &T,
        scratch: &mut ScratchBuffer,
    ) -> Result<()>
    where
        W: Write + ?Sized,
        T: PixelTranscoder + ?Sized,
    {
        writer.write_all(KTEX_MAGIC)?;
        self.header.write_to(writer, target)?;
        mip::encode_level_headers(writer, &self.levels, target, transcoder)?;
        mip::encode_payloads(writer, &self.levels, self.source_format, target, transcoder, scratch)?;
        Ok(())
    }

    /// Export every mip level as `<stem>-<width>x<height>.png` into `dir`.
    ///
    /// Failures are logged, not returned. Returns the number of images written.
    pub fn export_preview<T>(&self, dir: &Path, transcoder: &T, scratch: &mut ScratchBuffer) -> usize
    where
        T: PixelTranscoder + ?Sized,
    {
        if self.levels.is_empty() {
            info!("{}: mip chain is empty", self.path.display());
            return 0;
        }

        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut written = 0;
        for (level, mip) in self.levels.iter().enumerate() {
            let png_path = dir.join(format!("{}-{}x{}.png", stem, mip.width, mip.height));
            match self.save_level_png(&png_path, level, mip, transcoder, scratch) {
                Ok(()) => {
                    debug!("wrote {}", png_path.display());
                    written += 1;
                }
                Err(e) => warn!("preview {} failed: {}", png_path.display(), e),
            }
        }
        written
    }

    fn save_level_png<T>(
        &self,
        png_path: &Path,
        level: usize,
        mip: &MipLevel,
        transcoder: &T,
        scratch: &mut ScratchBuffer,
    ) -> Result<()>
    where
        T: PixelTranscoder + ?Sized,
    {
        let argb = scratch.staging();
        transcoder
            .transcode(&mip.surface(self.source_format), PixelFormat::Argb, argb)
            .map_err(|source| ktex_format::Error::Transcode { level, source })?;

        let width = u32::from(mip.width);
        let height = u32::from(mip.height);
        let expected = PixelFormat::Argb.surface_size(width, height);
        if argb.len() < expected {
            return Err(ktex_format::Error::Transcode {
                level,
                source: TranscodeError::SizeMismatch {
                    expected,
                    actual: argb.len(),
                },
            }
            .into());
        }

        let image = preview_image(argb, width, height);
        let writer = BufWriter::new(File::create(png_path)?);
        let encoder = PngEncoder::new_with_quality(writer, CompressionType::Fast, FilterType::NoFilter);
        image.write_with_encoder(encoder)?;
        Ok(())
    }
}

/// Lay out transcoded ARGB bytes as an RGBA image.
///
/// Each 4-byte group feeds blue from byte 2, green from byte 1, red from
/// byte 0 and alpha from byte 3.
fn preview_image(argb: &[u8], width: u32, height: u32) -> RgbaImage {
    let row = width as usize;
    RgbaImage::from_fn(width, height, |x, y| {
        let i = (y as usize * row + x as usize) * 4;
        let (blue, green, red, alpha) = (argb[i + 2], argb[i + 1], argb[i], argb[i + 3]);
        Rgba([red, green, blue, alpha])
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ktex_format::{Surface, REMAINDER_FILL};

    use super::*;
    use crate::Error;

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

    fn argb_texture(remainder: u32, levels: &[(u16, u16)]) -> Vec<u8> {
        let word = 12 | 4 << 4 | 2 << 9 | (levels.len() as u32) << 13 | remainder << 20;
        let mut bytes = b"KTEX".to_vec();
        bytes.extend(word.to_le_bytes());
        for &(w, h) in levels {
            bytes.extend(w.to_le_bytes());
            bytes.extend(h.to_le_bytes());
            bytes.extend((w * 4).to_le_bytes());
            bytes.extend((u32::from(w) * u32::from(h) * 4).to_le_bytes());
        }
        for (i, &(w, h)) in levels.iter().enumerate() {
            let size = usize::from(w) * usize::from(h) * 4;
            bytes.extend((0..size).map(|b| (b + i * 7) as u8));
        }
        bytes
    }

    fn load(bytes: Vec<u8>) -> Result<TexFile> {
        TexFile::load_from(Cursor::new(bytes), "test.tex", &mut ScratchBuffer::new(8))
    }

    #[test]
    fn test_load() {
        let tex = load(argb_texture(0x123, &[(4, 4), (2, 2)])).unwrap();
        assert_eq!(tex.source_format(), PixelFormat::Argb);
        assert_eq!(tex.levels().len(), 2);
        assert_eq!(tex.levels()[0].data.len(), 64);
        assert_eq!(tex.levels()[1].data[0], 7);
        assert!(tex.short_reads().is_empty());
        assert!(!tex.is_legacy());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = argb_texture(0, &[(1, 1)]);
        bytes[..4].copy_from_slice(b"ktex");
        let err = load(bytes).unwrap_err();
        assert!(matches!(err, Error::Format(ktex_format::Error::BadMagic(m)) if &m == b"ktex"));

        let err = load(b"KT".to_vec()).unwrap_err();
        assert!(matches!(err, Error::Format(ktex_format::Error::BadMagic(_))));
    }

    #[test]
    fn test_unsupported_pixel_format() {
        let mut bytes = argb_texture(0, &[(1, 1)]);
        let word = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let word = (word & !(0x1F << 4)) | (7 << 4);
        bytes[4..8].copy_from_slice(&word.to_le_bytes());

        let err = load(bytes).unwrap_err();
        assert!(matches!(err, Error::Format(ktex_format::Error::UnsupportedPixelFormat(7))));
    }

    #[test]
    fn test_truncated_level_table() {
        let mut bytes = argb_texture(0, &[(4, 4), (2, 2)]);
        bytes.truncate(8 + 15);
        let err = load(bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Format(ktex_format::Error::TruncatedStream { level: 1, .. })
        ));
    }

    #[test]
    fn test_short_payload_still_loads() {
        let mut bytes = argb_texture(0, &[(2, 2)]);
        bytes.truncate(bytes.len() - 3);
        let tex = load(bytes).unwrap();

        assert_eq!(tex.short_reads().len(), 1);
        assert_eq!(tex.short_reads()[0].actual, 13);
        assert_eq!(tex.levels()[0].data.len(), 16);
        assert_eq!(&tex.levels()[0].data[13..], &[0, 0, 0]);
    }

    #[test]
    fn test_convert_identity_only_changes_remainder() {
        let input = argb_texture(0x5A5, &[(4, 2), (2, 1)]);
        let tex = load(input.clone()).unwrap();

        let mut output = Vec::new();
        tex.write_to(&mut output, PixelFormat::Argb, &Identity, &mut ScratchBuffer::new(8))
            .unwrap();

        assert_eq!(output.len(), input.len());
        let in_word = u32::from_le_bytes(input[4..8].try_into().unwrap());
        let out_word = u32::from_le_bytes(output[4..8].try_into().unwrap());
        assert_eq!(out_word, (in_word & 0x000F_FFFF) | REMAINDER_FILL << 20);
        assert_eq!(output[..4], input[..4]);
        assert_eq!(output[8..], input[8..]);
    }

    #[test]
    fn test_convert_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.tex");
        let tex = load(argb_texture(0xFFF, &[(2, 2)])).unwrap();

        tex.convert(&dst, PixelFormat::Argb, &Identity, &mut ScratchBuffer::new(8))
            .unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), argb_texture(0xFFF, &[(2, 2)]));
    }

    #[test]
    fn test_convert_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("missing").join("out.tex");
        let tex = load(argb_texture(0, &[(1, 1)])).unwrap();

        let err = tex
            .convert(&dst, PixelFormat::Argb, &Identity, &mut ScratchBuffer::new(8))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_export_preview() {
        let dir = tempfile::tempdir().unwrap();
        let tex = TexFile::load_from(
            Cursor::new(argb_texture(0, &[(2, 1), (1, 1)])),
            "tree.tex",
            &mut ScratchBuffer::new(8),
        )
        .unwrap();

        let written = tex.export_preview(dir.path(), &Identity, &mut ScratchBuffer::new(8));
        assert_eq!(written, 2);

        let image = image::open(dir.path().join("tree-2x1.png")).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(1, 0).0, [4, 5, 6, 7]);
        assert!(dir.path().join("tree-1x1.png").exists());
    }

    #[test]
    fn test_preview_channel_order() {
        let image = preview_image(&[1, 2, 3, 4], 1, 1);
        let Rgba([red, green, blue, alpha]) = *image.get_pixel(0, 0);
        assert_eq!((blue, green, red, alpha), (3, 2, 1, 4));
    }
}
