//! Run configuration.

use std::path::PathBuf;

use ktex_common::DEFAULT_SCRATCH_SIZE;
use ktex_format::PixelFormat;

/// Settings for one conversion run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Pixel format every converted texture is written in.
    pub target: PixelFormat,
    /// Size of the scratch transfer chunk in bytes.
    pub scratch_size: usize,
    /// Treat a short mip payload as a failure instead of a warning.
    pub strict_payloads: bool,
    /// Export PNG previews of every converted top-level texture into this tree.
    pub preview_dir: Option<PathBuf>,
}

impl BatchConfig {
    pub fn new(target: PixelFormat) -> Self {
        Self {
            target,
            scratch_size: DEFAULT_SCRATCH_SIZE,
            strict_payloads: false,
            preview_dir: None,
        }
    }

    pub fn with_scratch_size(mut self, size: usize) -> Self {
        self.scratch_size = size;
        self
    }

    pub fn with_strict_payloads(mut self, strict: bool) -> Self {
        self.strict_payloads = strict;
        self
    }

    pub fn with_preview_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preview_dir = Some(dir.into());
        self
    }
}
