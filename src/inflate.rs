//! The inflate driver: the thin streaming adapter between the [`IdatStream`]
//! and `miniz_oxide`'s Deflate implementation.
//!
//! The actual Huffman/LZ77 decompression algorithm is out of scope for this
//! crate; `miniz_oxide` is taken as a hard dependency for exactly this
//! purpose, since defiltering always needs decompressed bytes.

use alloc::boxed::Box;
use miniz_oxide::inflate::stream::{inflate, InflateState};
use miniz_oxide::{DataFormat, MZError, MZFlush, MZStatus};

use crate::byte_source::ByteSource;
use crate::idat_stream::IdatStream;
use crate::scratch::ScratchArena;
use crate::{PngError, PngResult};

/// Size of the compressed-input staging buffer the inflate driver draws from
/// scratch. Small and fixed: `miniz_oxide` is fed incrementally regardless.
pub const INFLATE_INPUT_STAGING_BYTES: usize = 4096;

/// Wraps an [`IdatStream`] and exposes it as a stream of *decompressed*
/// bytes via repeated [`Inflate::read`] calls.
pub struct Inflate<'src, 'scratch, S> {
  idat: IdatStream<'src, S>,
  state: Box<InflateState>,
  in_buf: &'scratch mut [u8],
  in_pos: usize,
  in_len: usize,
  source_exhausted: bool,
  stream_done: bool,
}
impl<'src, 'scratch, S: ByteSource> Inflate<'src, 'scratch, S> {
  pub fn new(idat: IdatStream<'src, S>, scratch: &mut ScratchArena<'scratch>) -> PngResult<Self> {
    let in_buf = scratch.take(INFLATE_INPUT_STAGING_BYTES)?;
    Ok(Self {
      idat,
      state: InflateState::new_boxed(DataFormat::Zlib),
      in_buf,
      in_pos: 0,
      in_len: 0,
      source_exhausted: false,
      stream_done: false,
    })
  }

  fn refill(&mut self) -> PngResult<()> {
    if self.in_pos < self.in_len || self.source_exhausted {
      return Ok(());
    }
    let n = self.idat.read(self.in_buf)?;
    self.in_pos = 0;
    self.in_len = n;
    if n == 0 {
      self.source_exhausted = true;
    }
    crate::trace!("refilled {} bytes from IDAT stream", n);
    Ok(())
  }

  /// Reads up to `dst.len()` decompressed bytes. Returns `0` only at the
  /// logical end of the zlib stream.
  pub fn read(&mut self, dst: &mut [u8]) -> PngResult<usize> {
    if self.stream_done || dst.is_empty() {
      return Ok(0);
    }
    let mut written = 0;
    while written < dst.len() {
      self.refill()?;
      let flush = if self.source_exhausted { MZFlush::Finish } else { MZFlush::None };
      let result = inflate(
        &mut self.state,
        &self.in_buf[self.in_pos..self.in_len],
        &mut dst[written..],
        flush,
      );
      self.in_pos += result.bytes_consumed;
      written += result.bytes_written;
      match result.status {
        Ok(MZStatus::Ok) => {
          if result.bytes_consumed == 0 && result.bytes_written == 0 {
            if self.source_exhausted {
              return Err(PngError::CompressionError);
            }
            break;
          }
        }
        Ok(MZStatus::StreamEnd) => {
          self.stream_done = true;
          break;
        }
        Ok(MZStatus::NeedDict) => return Err(PngError::CompressionError),
        Err(MZError::Param) | Err(_) => return Err(PngError::CompressionError),
      }
    }
    Ok(written)
  }
}
