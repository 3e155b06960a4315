//! The reader that hides IDAT chunk boundaries from the inflate driver,
//! presenting the concatenation of every IDAT payload as one seamless byte
//! stream.

use crate::byte_source::ByteSource;
use crate::chunk::{ChunkHeader, ChunkType, Crc32};
use crate::{PngError, PngResult};

/// Bridges consecutive `IDAT` chunks into a single logical stream for the
/// inflate driver to read from.
///
/// Constructed once the first `IDAT` chunk header has been read; `read`
/// transparently crosses into the next `IDAT` chunk (verifying the CRC of
/// the one just finished) until a non-`IDAT` chunk is probed, at which point
/// the source is rewound past that chunk's header so the main reader loop
/// can dispatch it.
pub struct IdatStream<'src, S> {
  src: &'src mut S,
  remaining: u32,
  crc: Crc32,
  finished: bool,
}
impl<'src, S: ByteSource> IdatStream<'src, S> {
  /// `first_length` is the length of the `IDAT` chunk header the caller has
  /// already read (but not yet consumed the payload of).
  pub fn new(src: &'src mut S, first_length: u32) -> Self {
    let mut crc = Crc32::new();
    crc.update(&ChunkType::IDAT.0);
    Self { src, remaining: first_length, crc, finished: false }
  }

  /// Reads up to `dst.len()` bytes of concatenated `IDAT` payload. Returns
  /// `0` only once every `IDAT` chunk has been consumed; never silently
  /// swallows a genuine end-of-stream from the underlying source.
  pub fn read(&mut self, dst: &mut [u8]) -> PngResult<usize> {
    let mut written = 0;
    while written < dst.len() {
      if self.finished {
        break;
      }
      if self.remaining == 0 {
        self.advance_to_next_idat()?;
        if self.finished {
          break;
        }
      }
      let want = (dst.len() - written).min(self.remaining as usize);
      let got = self.src.read(&mut dst[written..written + want])?;
      if got == 0 {
        return Err(PngError::EndOfStream);
      }
      self.crc.update(&dst[written..written + got]);
      self.remaining -= got as u32;
      written += got;
    }
    Ok(written)
  }

  fn advance_to_next_idat(&mut self) -> PngResult<()> {
    let declared_crc = self.src.read_u32_be()?;
    if declared_crc != self.crc.finish() {
      return Err(PngError::ChunkCrcMismatch);
    }
    let header = ChunkHeader::read(self.src)?;
    if header.chunk_type == ChunkType::IDAT {
      self.remaining = header.length;
      self.crc = Crc32::new();
      self.crc.update(&ChunkType::IDAT.0);
    } else {
      self.src.seek_by(-ChunkHeader::SIZE)?;
      self.finished = true;
    }
    Ok(())
  }
}
