//! Stream reading helpers.
//!
//! KTEX files are consumed straight from a [`Read`] stream: fixed-size records
//! are decoded with zerocopy, and payloads are pulled through a caller-owned
//! chunk so that a stream ending early still yields everything it had.

use std::io::{self, Read};

use zerocopy::FromBytes;

use crate::{Error, Result};

/// Extension trait for reading binary data from streams.
pub trait ReadExt: Read {
    /// Read as many bytes as the stream can deliver into `buf`.
    ///
    /// Unlike [`Read::read_exact`], hitting the end of the stream is not an
    /// error; the number of bytes actually read is returned.
    fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Read a structure from the stream.
    fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let mut bytes = vec![0u8; size];
        let read = self.read_up_to(&mut bytes)?;
        if read != size {
            return Err(Error::UnexpectedEof {
                needed: size,
                available: read,
            });
        }
        T::read_from_bytes(&bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: read,
        })
    }

    /// Read an array of structures from the stream.
    fn read_array<T: FromBytes>(&mut self, count: usize) -> Result<Vec<T>> {
        let mut result = Vec::with_capacity(count);
        for _ in 0..count {
            result.push(self.read_struct()?);
        }
        Ok(result)
    }

    /// Append up to `len` bytes to `dest` by repeatedly reading at most
    /// `chunk.len()` bytes into `chunk` and copying them over.
    ///
    /// Stops once `len` bytes were appended or the stream is exhausted and
    /// returns the number of bytes appended. `dest` only grows by what was
    /// read; a failed allocation is reported as [`io::ErrorKind::OutOfMemory`].
    fn read_chunked(&mut self, dest: &mut Vec<u8>, len: usize, chunk: &mut [u8]) -> io::Result<usize> {
        if chunk.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "transfer chunk must not be empty",
            ));
        }

        let mut filled = 0;
        while filled < len {
            let want = (len - filled).min(chunk.len());
            let read = self.read_up_to(&mut chunk[..want])?;
            if read == 0 {
                break;
            }
            dest.try_reserve(read)
                .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
            dest.extend_from_slice(&chunk[..read]);
            filled += read;
        }
        Ok(filled)
    }
}

impl<R: Read + ?Sized> ReadExt for R {}
