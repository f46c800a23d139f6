//! Batch conversion of directory trees.

use std::fs;
use std::path::{Path, PathBuf};

use ktex_common::ScratchBuffer;
use ktex_format::PixelTranscoder;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::archive::{self, ArchiveReport};
use crate::{BatchConfig, Error, Result, TexFile};

/// How an entry of the source tree is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Texture,
    Archive,
    Other,
}

impl EntryKind {
    /// Classify a non-directory path by its extension (case-sensitive).
    pub fn of_file(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tex") => Self::Texture,
            Some("zip") => Self::Archive,
            _ => Self::Other,
        }
    }
}

/// Result of handling one entry of the source tree.
#[derive(Debug)]
pub enum Outcome {
    Directory,
    Converted,
    Copied,
    Archive(ArchiveReport),
    Failed(Error),
}

/// A file, or a file inside an archive, that could not be converted.
#[derive(Debug, Clone)]
pub struct Failure {
    pub path: PathBuf,
    pub entry: Option<String>,
    pub message: String,
}

/// Totals for a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub directories: usize,
    /// Textures converted, including those inside archives.
    pub converted: usize,
    pub copied: usize,
    pub archives: usize,
    pub failures: Vec<Failure>,
}

impl BatchReport {
    fn record(&mut self, path: &Path, outcome: &Outcome) {
        match outcome {
            Outcome::Directory => self.directories += 1,
            Outcome::Converted => self.converted += 1,
            Outcome::Copied => self.copied += 1,
            Outcome::Archive(report) => {
                self.archives += 1;
                self.converted += report.converted();
                if let Some(failed) = report.failure() {
                    if let Err(e) = &failed.outcome {
                        self.failures.push(Failure {
                            path: path.to_path_buf(),
                            entry: Some(failed.name.clone()),
                            message: e.to_string(),
                        });
                    }
                }
            }
            Outcome::Failed(e) => self.failures.push(Failure {
                path: path.to_path_buf(),
                entry: None,
                message: e.to_string(),
            }),
        }
    }

    /// Whether every entry was handled without failure.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

type Observer<'a> = Box<dyn FnMut(&Path, &Outcome) + 'a>;

/// Converts every texture of a source tree into a mirrored destination tree.
///
/// Owns the scratch buffer for the whole run. Per-file failures are logged
/// and recorded; they never stop the run.
pub struct BatchConverter<'a, T: PixelTranscoder + ?Sized> {
    config: BatchConfig,
    transcoder: &'a T,
    scratch: ScratchBuffer,
    observer: Option<Observer<'a>>,
}

impl<'a, T: PixelTranscoder + ?Sized> BatchConverter<'a, T> {
    pub fn new(config: BatchConfig, transcoder: &'a T) -> Self {
        let scratch = ScratchBuffer::new(config.scratch_size);
        Self {
            config,
            transcoder,
            scratch,
            observer: None,
        }
    }

    /// Call `f` after every entry of the source tree has been handled.
    pub fn on_entry<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Path, &Outcome) + 'a,
    {
        self.observer = Some(Box::new(f));
        self
    }

    /// Mirror `src` into `dst`, converting textures on the way.
    ///
    /// Only fails when `src` does not exist or `dst` cannot be created.
    pub fn run(&mut self, src: &Path, dst: &Path) -> Result<BatchReport> {
        if !src.exists() {
            return Err(Error::SourceNotFound(src.to_path_buf()));
        }
        fs::create_dir_all(dst)?;

        let mut report = BatchReport::default();

        for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(src).to_path_buf();
                    warn!("failed {}: {}", path.display(), e);
                    report.record(&path, &Outcome::Failed(e.into()));
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(src) else {
                continue;
            };
            let target = dst.join(relative);

            let outcome = if entry.file_type().is_dir() {
                self.mirror_directory(&target)
            } else {
                self.process_file(entry.path(), &target, relative)
            };

            report.record(entry.path(), &outcome);
            if let Some(observer) = self.observer.as_mut() {
                observer(entry.path(), &outcome);
            }
        }

        info!(
            "batch done: {} converted, {} copied, {} archives, {} failed",
            report.converted,
            report.copied,
            report.archives,
            report.failures.len()
        );
        Ok(report)
    }

    /// Convert a single texture file, exporting previews into the configured
    /// preview directory first.
    pub fn convert_file(&mut self, src: &Path, dst: &Path) -> Result<TexFile> {
        let preview_dir = self.config.preview_dir.clone();
        self.convert_texture(src, dst, preview_dir.as_deref())
    }

    fn mirror_directory(&mut self, target: &Path) -> Outcome {
        match fs::create_dir_all(target) {
            Ok(()) => Outcome::Directory,
            Err(e) => {
                warn!("failed {}: {}", target.display(), e);
                Outcome::Failed(e.into())
            }
        }
    }

    fn process_file(&mut self, src: &Path, dst: &Path, relative: &Path) -> Outcome {
        match EntryKind::of_file(src) {
            EntryKind::Texture => {
                let preview_dir = self
                    .config
                    .preview_dir
                    .as_ref()
                    .map(|dir| dir.join(relative.parent().unwrap_or(Path::new(""))));

                match self.convert_texture(src, dst, preview_dir.as_deref()) {
                    Ok(_) => {
                        info!("converted {}", src.display());
                        Outcome::Converted
                    }
                    Err(e) => {
                        warn!("failed {}: {}", src.display(), e);
                        Outcome::Failed(e)
                    }
                }
            }
            EntryKind::Archive => {
                let result = archive::convert_archive(src, dst, |path| {
                    self.convert_texture(path, path, None).map(|_| ())
                });
                match result {
                    Ok(report) => {
                        info!(
                            "archive {}: {} converted, {} copied",
                            src.display(),
                            report.converted(),
                            report.passthrough
                        );
                        Outcome::Archive(report)
                    }
                    Err(e) => {
                        error!("archive {} failed: {}", src.display(), e);
                        Outcome::Failed(e)
                    }
                }
            }
            EntryKind::Other => match fs::copy(src, dst) {
                Ok(_) => {
                    debug!("copied {}", src.display());
                    Outcome::Copied
                }
                Err(e) => {
                    warn!("failed {}: {}", src.display(), e);
                    Outcome::Failed(e.into())
                }
            },
        }
    }

    fn convert_texture(&mut self, src: &Path, dst: &Path, preview_dir: Option<&Path>) -> Result<TexFile> {
        let tex = TexFile::load(src, &mut self.scratch)?;

        if self.config.strict_payloads {
            if let Some(short) = tex.short_reads().first() {
                return Err(ktex_format::Error::ShortRead(*short).into());
            }
        }

        if let Some(dir) = preview_dir {
            fs::create_dir_all(dir)?;
            tex.export_preview(dir, self.transcoder, &mut self.scratch);
        }

        tex.convert(dst, self.config.target, self.transcoder, &mut self.scratch)?;
        Ok(tex)
    }
}
