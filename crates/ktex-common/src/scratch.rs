//! Reusable scratch memory for a conversion run.

/// Default size of the transfer chunk (100 MiB).
pub const DEFAULT_SCRATCH_SIZE: usize = 100 * 1024 * 1024;

/// Scratch memory shared by every file processed in one run.
///
/// Holds a fixed-size transfer chunk used when pulling payloads off a stream,
/// and a growable staging vector that transcoders write their output into.
/// Neither keeps meaningful contents between operations; callers lend the
/// buffer out with `&mut` so only one step uses it at a time. Concurrent
/// workers each need their own instance.
#[derive(Debug)]
pub struct ScratchBuffer {
    chunk: Box<[u8]>,
    staging: Vec<u8>,
}

impl ScratchBuffer {
    /// Allocate a scratch buffer with a transfer chunk of `size` bytes.
    ///
    /// A size of zero is bumped to one byte.
    pub fn new(size: usize) -> Self {
        Self {
            chunk: vec![0u8; size.max(1)].into_boxed_slice(),
            staging: Vec::new(),
        }
    }

    /// Size of the transfer chunk in bytes.
    #[inline]
    pub fn chunk_len(&self) -> usize {
        self.chunk.len()
    }

    /// The transfer chunk.
    #[inline]
    pub fn chunk(&mut self) -> &mut [u8] {
        &mut self.chunk
    }

    /// The staging vector, cleared and ready to be written into.
    #[inline]
    pub fn staging(&mut self) -> &mut Vec<u8> {
        self.staging.clear();
        &mut self.staging
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SCRATCH_SIZE)
    }
}
