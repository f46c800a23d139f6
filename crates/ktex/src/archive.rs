//! Texture conversion inside zip archives.
//!
//! The destination archive starts as a plain copy of the source. Texture
//! entries are then pulled out into a scratch directory, converted there and
//! written back under their original names; every other entry is carried over
//! byte for byte without recompression.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::Result;

/// Whether an archive entry holds a texture.
///
/// Only the literal last three bytes of the name are checked, so `a.tex`
/// matches while `b.TEX` and `note.text` do not.
pub fn is_tex_entry(name: &str) -> bool {
    name.as_bytes().ends_with(b"tex")
}

/// Outcome of one texture entry.
#[derive(Debug)]
pub struct EntryResult {
    pub name: String,
    pub outcome: Result<()>,
}

/// What happened to an archive.
#[derive(Debug, Default)]
pub struct ArchiveReport {
    /// One result per texture entry attempted, in archive order.
    pub entries: Vec<EntryResult>,
    /// Entries copied over unchanged.
    pub passthrough: usize,
}

impl ArchiveReport {
    /// Number of texture entries converted.
    pub fn converted(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_ok()).count()
    }

    /// The entry that stopped conversion, if any.
    pub fn failure(&self) -> Option<&EntryResult> {
        self.entries.iter().find(|e| e.outcome.is_err())
    }
}

/// Convert the texture entries of `src` into a new archive at `dst`.
///
/// `convert` is called with the path of each extracted texture and must
/// rewrite that file in place. The first entry that fails stops conversion;
/// it and all following entries are copied unchanged. An `Err` means the
/// archive itself could not be handled, in which case `dst` is left as a
/// plain copy of `src` (if the copy succeeded).
pub fn convert_archive<F>(src: &Path, dst: &Path, mut convert: F) -> Result<ArchiveReport>
where
    F: FnMut(&Path) -> Result<()>,
{
    fs::copy(src, dst)?;

    let mut source = ZipArchive::new(BufReader::new(File::open(src)?))?;
    let scratch = scratch_dir(dst)?;
    let rebuilt_path = scratch.path().join("rebuilt.zip");
    let mut writer = ZipWriter::new(BufWriter::new(File::create(&rebuilt_path)?));

    let mut report = ArchiveReport::default();
    let mut stopped = false;

    for index in 0..source.len() {
        let (name, method) = {
            let entry = source.by_index_raw(index)?;
            (entry.name().to_owned(), entry.compression())
        };

        if !stopped && is_tex_entry(&name) {
            match extract_and_convert(&mut source, index, &name, scratch.path(), &mut convert) {
                Ok(bytes) => {
                    let options = SimpleFileOptions::default().compression_method(method);
                    writer.start_file(name.as_str(), options)?;
                    writer.write_all(&bytes)?;
                    debug!("{}: converted {}", src.display(), name);
                    report.entries.push(EntryResult { name, outcome: Ok(()) });
                    continue;
                }
                Err(e) => {
                    warn!("{}: convert {} failed: {}", src.display(), name, e);
                    report.entries.push(EntryResult { name, outcome: Err(e) });
                    stopped = true;
                }
            }
        }

        writer.raw_copy_file(source.by_index_raw(index)?)?;
        report.passthrough += 1;
    }

    writer.finish()?.flush()?;
    fs::rename(&rebuilt_path, dst)?;

    Ok(report)
}

/// Scratch directory beside `dst`, removed when dropped.
fn scratch_dir(dst: &Path) -> io::Result<TempDir> {
    let parent = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tempfile::Builder::new().prefix(".ktex-").tempdir_in(parent)
}

fn extract_and_convert<R, F>(
    source: &mut ZipArchive<R>,
    index: usize,
    name: &str,
    scratch: &Path,
    convert: &mut F,
) -> Result<Vec<u8>>
where
    R: Read + Seek,
    F: FnMut(&Path) -> Result<()>,
{
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let path = scratch.join(format!("{index}-{file_name}"));

    {
        let mut entry = source.by_index(index)?;
        let mut out = BufWriter::new(File::create(&path)?);
        io::copy(&mut entry, &mut out)?;
        out.flush()?;
    }

    convert(&path)?;
    Ok(fs::read(&path)?)
}

#[cfg(test)]
mod tests {
    use zip::CompressionMethod;

    use super::*;
    use crate::Error;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (entry.name().to_owned(), data)
            })
            .collect()
    }

    fn leftover_scratch(dir: &Path) -> Vec<std::ffi::OsString> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().starts_with(".ktex-"))
            .collect()
    }

    #[test]
    fn test_entry_filter() {
        let names = ["a.tex", "b.TEX", "readme.tex", "note.text", "x"];
        let selected: Vec<_> = names.into_iter().filter(|n| is_tex_entry(n)).collect();
        assert_eq!(selected, ["a.tex", "readme.tex"]);
        assert!(is_tex_entry("tex"));
        assert!(is_tex_entry("dir/latex"));
    }

    #[test]
    fn test_entries_rewritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.zip");
        let dst = dir.path().join("out.zip");
        write_zip(&src, &[("a.tex", b"one"), ("docs/readme.md", b"hello"), ("sub/b.tex", b"two")]);

        let report = convert_archive(&src, &dst, |path| {
            let mut data = fs::read(path)?;
            data.make_ascii_uppercase();
            fs::write(path, data)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(report.converted(), 2);
        assert_eq!(report.passthrough, 1);
        assert_eq!(
            read_zip(&dst),
            [
                ("a.tex".to_owned(), b"ONE".to_vec()),
                ("docs/readme.md".to_owned(), b"hello".to_vec()),
                ("sub/b.tex".to_owned(), b"TWO".to_vec()),
            ]
        );
    }

    #[test]
    fn test_first_failure_stops_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.zip");
        let dst = dir.path().join("out.zip");
        write_zip(&src, &[("a.tex", b"one"), ("b.tex", b"bad"), ("c.tex", b"three")]);

        let report = convert_archive(&src, &dst, |path| {
            if fs::read(path)? == b"bad" {
                return Err(Error::Io(io::Error::new(io::ErrorKind::Other, "boom")));
            }
            fs::write(path, b"done")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.failure().map(|e| e.name.as_str()), Some("b.tex"));
        assert_eq!(
            read_zip(&dst),
            [
                ("a.tex".to_owned(), b"done".to_vec()),
                ("b.tex".to_owned(), b"bad".to_vec()),
                ("c.tex".to_owned(), b"three".to_vec()),
            ]
        );
        assert!(leftover_scratch(dir.path()).is_empty());
    }

    #[test]
    fn test_unreadable_archive_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.zip");
        let dst = dir.path().join("out.zip");
        fs::write(&src, b"not a zip").unwrap();

        let err = convert_archive(&src, &dst, |_| Ok(())).unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
        assert_eq!(fs::read(&dst).unwrap(), b"not a zip");
    }

    #[test]
    fn test_scratch_dir_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.zip");
        let dst = dir.path().join("out.zip");
        write_zip(&src, &[("a.tex", b"one")]);

        convert_archive(&src, &dst, |_| Ok(())).unwrap();
        assert!(leftover_scratch(dir.path()).is_empty());
    }
}
