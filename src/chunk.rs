//! Chunk header layout, the four-letter chunk type tag, and CRC-32.

use crate::byte_source::ByteSource;
use crate::{PngError, PngResult};

/// The 8-byte literal every PNG bytestream must start with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// A chunk's 4-byte ASCII type tag, e.g. `IHDR`, `IDAT`, `tRNS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);
#[allow(dead_code)]
impl ChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");
  pub const TRNS: Self = Self(*b"tRNS");

  /// Critical chunks (first letter uppercase) must be understood by every
  /// reader; ancillary chunks may be skipped.
  #[inline]
  pub const fn is_critical(self) -> bool {
    self.0[0].is_ascii_uppercase()
  }
}
impl core::fmt::Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let [a, b, c, d] = self.0;
    write!(f, "{}{}{}{}", a as char, b as char, c as char, d as char)
  }
}

/// A chunk header: the length and type tag that precede every chunk's
/// payload. The trailing CRC is read and checked separately, once the
/// payload itself has been consumed (it covers type tag + payload).
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
  pub length: u32,
  pub chunk_type: ChunkType,
}
impl ChunkHeader {
  /// Size in bytes of a chunk header (length + type tag).
  pub const SIZE: i64 = 8;

  pub fn read(src: &mut impl ByteSource) -> PngResult<Self> {
    let length = src.read_u32_be()?;
    let chunk_type = ChunkType(src.borrow(4)?.try_into().unwrap());
    Ok(Self { length, chunk_type })
  }
}

const fn make_crc_table() -> [u32; 256] {
  let mut table = [0u32; 256];
  let mut n = 0usize;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if c & 1 != 0 { 0xedb8_8320 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    table[n] = c;
    n += 1;
  }
  table
}
const CRC_TABLE: [u32; 256] = make_crc_table();

/// An incremental CRC-32 accumulator, matching the zlib/PNG CRC-32
/// definition (initialized with all-ones, complemented on read).
#[derive(Clone, Copy)]
pub struct Crc32 {
  state: u32,
}
impl Crc32 {
  #[inline]
  pub const fn new() -> Self {
    Self { state: u32::MAX }
  }

  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    let mut crc = self.state;
    for &b in bytes {
      crc = CRC_TABLE[((crc ^ b as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    self.state = crc;
  }

  #[inline]
  pub const fn finish(self) -> u32 {
    self.state ^ u32::MAX
  }
}
impl Default for Crc32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

/// Computes the CRC-32 of a chunk type tag followed by its payload, in one
/// call — used for chunks whose whole payload is already in memory (IHDR,
/// PLTE, ancillary chunks).
pub fn chunk_crc32(chunk_type: ChunkType, payload: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(&chunk_type.0);
  crc.update(payload);
  crc.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn crc_matches_known_png_chunk() {
    // IHDR payload for a 255x117, 8-bit RGBA, Adam7-interlaced image.
    let payload: [u8; 13] = [
      0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x75, 0x08, 0x06, 0x00, 0x00, 0x01,
    ];
    let crc = chunk_crc32(ChunkType::IHDR, &payload);
    assert_eq!(crc.to_be_bytes(), [0xD7, 0xC0, 0x29, 0x6F]);
  }

  #[test]
  fn is_critical_by_case_of_first_letter() {
    assert!(ChunkType::IHDR.is_critical());
    assert!(ChunkType::IDAT.is_critical());
    assert!(!ChunkType::TRNS.is_critical());
  }
}
