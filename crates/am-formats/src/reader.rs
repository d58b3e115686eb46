//! Big-endian primitive reads over any seekable stream.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use binrw::BinReaderExt;

use crate::FormatError;

/// Reads the fixed big-endian integers used by Amiga module headers.
///
/// Values come back in host order whatever the host's endianness.
pub trait ReadBigEndian: Read + Seek + Sized {
    fn read_i32_be(&mut self) -> Result<i32, FormatError> {
        Ok(self.read_be::<i32>()?)
    }

    fn read_i16_be(&mut self) -> Result<i16, FormatError> {
        Ok(self.read_be::<i16>()?)
    }

    fn read_u16_be(&mut self) -> Result<u16, FormatError> {
        Ok(self.read_be::<u16>()?)
    }

    /// Read a four-byte tag. `None` if the stream ends first.
    fn read_tag(&mut self) -> Result<Option<[u8; 4]>, FormatError> {
        let mut tag = [0u8; 4];
        match self.read_exact(&mut tag) {
            Ok(()) => Ok(Some(tag)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Scan forward for `pattern`.
    ///
    /// On a match, returns the position where the pattern starts and leaves
    /// the stream just past it. Reaching the end of the stream is reported as
    /// `None` with the stream at its end.
    fn scan_for(&mut self, pattern: &[u8]) -> Result<Option<u64>, FormatError> {
        let start = self.stream_position()?;
        if pattern.is_empty() {
            return Ok(Some(start));
        }
        let mut rest = Vec::new();
        self.read_to_end(&mut rest)?;
        match rest.windows(pattern.len()).position(|w| w == pattern) {
            Some(offset) => {
                let found = start + offset as u64;
                self.seek(SeekFrom::Start(found + pattern.len() as u64))?;
                Ok(Some(found))
            }
            None => Ok(None),
        }
    }
}

impl<R: Read + Seek> ReadBigEndian for R {}
