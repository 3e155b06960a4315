//! The byte-source abstraction the reader is built on: either a file handle
//! with an internal refill buffer, or a zero-copy view over an in-memory
//! slice.

use crate::{PngError, PngResult};

/// Minimal reading surface the PNG state machine needs from its input.
///
/// Every method advances the source's logical position by the number of
/// bytes it consumes; there is no separate "peek" operation.
pub trait ByteSource {
  /// Borrows the next `n` bytes without necessarily copying them, and
  /// advances the source past them.
  fn borrow(&mut self, n: usize) -> PngResult<&[u8]>;

  /// Reads into `dst`, returning how many bytes were copied. Only returns
  /// fewer than `dst.len()` bytes at genuine end of stream.
  fn read(&mut self, dst: &mut [u8]) -> PngResult<usize>;

  /// Moves the logical read position by `delta` bytes (negative rewinds).
  fn seek_by(&mut self, delta: i64) -> PngResult<()>;

  /// Reads a big-endian `u32`.
  #[inline]
  fn read_u32_be(&mut self) -> PngResult<u32> {
    let bytes = self.borrow(4)?;
    Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
  }

  /// Reads a big-endian `u16`.
  #[inline]
  fn read_u16_be(&mut self) -> PngResult<u16> {
    let bytes = self.borrow(2)?;
    Ok(u16::from_be_bytes(bytes.try_into().unwrap()))
  }

  /// Reads a fixed-layout record of `N` bytes, with no assumption about the
  /// alignment of the underlying buffer.
  #[inline]
  fn read_record<const N: usize>(&mut self) -> PngResult<[u8; N]> {
    let bytes = self.borrow(N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
  }
}

/// Smallest legal refill buffer: `2^8` bytes.
pub const MIN_FILE_BUFFER_CAPACITY: usize = 1 << 8;
/// Largest sane refill buffer: `2^18` bytes.
pub const MAX_FILE_BUFFER_CAPACITY: usize = 1 << 18;
/// The refill buffer size [`FileByteSource::new`] uses.
pub const DEFAULT_FILE_BUFFER_CAPACITY: usize = 1 << 14;

/// A [`ByteSource`] backed by a file handle, with an internal ring-style
/// refill buffer.
///
/// Invariants: `pos <= end <= buf.len()`. `borrow(n)` fails outright if
/// `n > buf.len()` — no single borrow can ever exceed the refill capacity.
/// Seeking outside the currently buffered window always performs a native
/// seek and drops the window.
#[cfg(feature = "std")]
pub struct FileByteSource {
  file: std::fs::File,
  buf: alloc::boxed::Box<[u8]>,
  /// index of the next unread byte in `buf`
  pos: usize,
  /// index one past the last valid byte in `buf`
  end: usize,
  /// absolute file offset corresponding to `buf[0]`
  window_start: u64,
  /// absolute file offset of the next byte the source will yield
  stream_pos: u64,
}

#[cfg(feature = "std")]
impl FileByteSource {
  /// Builds a source with [`DEFAULT_FILE_BUFFER_CAPACITY`].
  pub fn new(file: std::fs::File) -> Self {
    Self::with_capacity(file, DEFAULT_FILE_BUFFER_CAPACITY)
  }

  /// Builds a source with a chosen refill capacity, clamped to
  /// `[MIN_FILE_BUFFER_CAPACITY, MAX_FILE_BUFFER_CAPACITY]` and rounded up to
  /// the next power of two.
  pub fn with_capacity(file: std::fs::File, capacity: usize) -> Self {
    let capacity = capacity
      .clamp(MIN_FILE_BUFFER_CAPACITY, MAX_FILE_BUFFER_CAPACITY)
      .next_power_of_two();
    Self {
      file,
      buf: alloc::vec![0u8; capacity].into_boxed_slice(),
      pos: 0,
      end: 0,
      window_start: 0,
      stream_pos: 0,
    }
  }

  fn refill_for(&mut self, n: usize) -> PngResult<()> {
    use std::io::Read;
    if self.end - self.pos < n {
      self.buf.copy_within(self.pos..self.end, 0);
      self.end -= self.pos;
      self.window_start += self.pos as u64;
      self.pos = 0;
      while self.end - self.pos < n {
        let read = self.file.read(&mut self.buf[self.end..]).map_err(|_| PngError::Io)?;
        if read == 0 {
          return Err(PngError::EndOfStream);
        }
        self.end += read;
      }
    }
    Ok(())
  }
}

#[cfg(feature = "std")]
impl ByteSource for FileByteSource {
  fn borrow(&mut self, n: usize) -> PngResult<&[u8]> {
    if n > self.buf.len() {
      return Err(PngError::EndOfStream);
    }
    self.refill_for(n)?;
    let out_start = self.pos;
    self.pos += n;
    self.stream_pos += n as u64;
    Ok(&self.buf[out_start..out_start + n])
  }

  fn read(&mut self, dst: &mut [u8]) -> PngResult<usize> {
    use std::io::Read;
    let avail = self.end - self.pos;
    let from_buf = avail.min(dst.len());
    dst[..from_buf].copy_from_slice(&self.buf[self.pos..self.pos + from_buf]);
    self.pos += from_buf;
    self.stream_pos += from_buf as u64;
    let mut written = from_buf;
    if written < dst.len() {
      self.pos = 0;
      self.end = 0;
      self.window_start = self.stream_pos;
      let n = self.file.read(&mut dst[written..]).map_err(|_| PngError::Io)?;
      self.stream_pos += n as u64;
      self.window_start = self.stream_pos;
      written += n;
    }
    Ok(written)
  }

  fn seek_by(&mut self, delta: i64) -> PngResult<()> {
    use std::io::{Seek, SeekFrom};
    let target = if delta >= 0 {
      self.stream_pos.checked_add(delta as u64)
    } else {
      self.stream_pos.checked_sub((-delta) as u64)
    }
    .ok_or(PngError::EndOfStream)?;
    if target >= self.window_start && target <= self.window_start + self.end as u64 {
      self.pos = (target - self.window_start) as usize;
    } else {
      self.file.seek(SeekFrom::Start(target)).map_err(|_| PngError::Io)?;
      self.window_start = target;
      self.pos = 0;
      self.end = 0;
    }
    self.stream_pos = target;
    Ok(())
  }
}

/// A [`ByteSource`] backed by an in-memory, borrowed byte slice.
///
/// Never allocates; `borrow` is always a zero-copy view of the caller's
/// slice.
pub struct MemoryByteSource<'b> {
  bytes: &'b [u8],
  pos: usize,
}
impl<'b> MemoryByteSource<'b> {
  /// Wraps `bytes` for reading from the start.
  #[inline]
  pub fn new(bytes: &'b [u8]) -> Self {
    Self { bytes, pos: 0 }
  }
}
impl<'b> ByteSource for MemoryByteSource<'b> {
  fn borrow(&mut self, n: usize) -> PngResult<&[u8]> {
    if self.pos + n > self.bytes.len() {
      return Err(PngError::EndOfStream);
    }
    let out = &self.bytes[self.pos..self.pos + n];
    self.pos += n;
    Ok(out)
  }

  fn read(&mut self, dst: &mut [u8]) -> PngResult<usize> {
    let n = dst.len().min(self.bytes.len() - self.pos);
    dst[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
    self.pos += n;
    Ok(n)
  }

  fn seek_by(&mut self, delta: i64) -> PngResult<()> {
    let target = if delta >= 0 {
      self.pos.checked_add(delta as usize)
    } else {
      self.pos.checked_sub((-delta) as usize)
    }
    .ok_or(PngError::EndOfStream)?;
    if target > self.bytes.len() {
      return Err(PngError::EndOfStream);
    }
    self.pos = target;
    Ok(())
  }
}
