//! The processor extension protocol: hooks a [`crate::reader::PngReader`]
//! calls as it walks pre-IDAT chunks, finalizes the palette, and decodes
//! rows, plus the two built-in processors (`tRNS`, `PLTE`) every decode runs
//! by default.
//!
//! A processor may only ever ask for a *wider* destination pixel format than
//! the one already committed to — [`crate::reader::PngReader`] enforces this
//! monotonic invariant across every processor's response, since once a row
//! has started decoding into a given stride there is no way back.

use alloc::vec::Vec;

use crate::chunk::ChunkType;
use crate::ihdr::{ColorType, Ihdr};
use crate::pixel_format::{PixelFormatTag, Rgba32};
use crate::pixel_storage::PixelStorage;
use crate::{PngError, PngResult};

/// An optional extension point a decode can be configured with.
///
/// Every method has a no-op default; implement only the hooks a given
/// processor actually needs.
pub trait Processor {
  /// Called once for every chunk seen before the first `IDAT`, including
  /// `PLTE` and `tRNS` themselves. Returning `Some(tag)` requests widening
  /// the destination pixel format to `tag` before storage is allocated.
  fn process_chunk(
    &mut self, chunk_type: ChunkType, payload: &[u8], ihdr: &Ihdr,
  ) -> PngResult<Option<PixelFormatTag>> {
    let _ = (chunk_type, payload, ihdr);
    Ok(None)
  }

  /// Called once, after the destination format and storage are finalized
  /// but before any row has been decoded.
  fn process_palette(&mut self, ihdr: &Ihdr, storage: &mut PixelStorage) -> PngResult<()> {
    let _ = (ihdr, storage);
    Ok(())
  }

  /// Called once per decoded row, with `row` already spread to the final
  /// pixel stride (`pixel_stride` bytes per pixel).
  fn process_row(
    &mut self, row_index: u32, ihdr: &Ihdr, pixel_stride: usize, row: &mut [u8],
  ) -> PngResult<()> {
    let _ = (row_index, ihdr, pixel_stride, row);
    Ok(())
  }
}

#[inline]
fn grayscale_alpha_tag(bit_depth: u8) -> PixelFormatTag {
  if bit_depth == 16 {
    PixelFormatTag::Grayscale16Alpha
  } else {
    PixelFormatTag::Grayscale8Alpha
  }
}

#[inline]
fn rgba_tag(bit_depth: u8) -> PixelFormatTag {
  if bit_depth == 16 {
    PixelFormatTag::Rgba64
  } else {
    PixelFormatTag::Rgba32
  }
}

/// The built-in `tRNS` handler.
///
/// For `Grayscale`/`Rgb` source images it widens the destination to carry an
/// alpha channel and keys exact-match pixels transparent while decoding; for
/// `Indexed` images it just writes the stored per-entry alphas into the
/// palette once, during [`Processor::process_palette`].
#[derive(Debug, Default)]
pub struct TrnsProcessor {
  raw: Option<Vec<u8>>,
}
impl TrnsProcessor {
  pub fn new() -> Self {
    Self::default()
  }
}
impl Processor for TrnsProcessor {
  fn process_chunk(
    &mut self, chunk_type: ChunkType, payload: &[u8], ihdr: &Ihdr,
  ) -> PngResult<Option<PixelFormatTag>> {
    if chunk_type != ChunkType::TRNS {
      return Ok(None);
    }
    match ihdr.color_type {
      ColorType::Grayscale => {
        if payload.len() != 2 {
          return Err(PngError::TrnsLengthMismatch);
        }
        self.raw = Some(payload.to_vec());
        Ok(Some(grayscale_alpha_tag(ihdr.bit_depth)))
      }
      ColorType::Rgb => {
        if payload.len() != 6 {
          return Err(PngError::TrnsLengthMismatch);
        }
        self.raw = Some(payload.to_vec());
        Ok(Some(rgba_tag(ihdr.bit_depth)))
      }
      ColorType::Indexed => {
        self.raw = Some(payload.to_vec());
        Ok(None)
      }
      // tRNS carries no meaning for a color type that already has its own
      // alpha channel; ancillary chunks with a content mismatch are skipped,
      // not fatal.
      ColorType::GrayscaleAlpha | ColorType::Rgba => Ok(None),
    }
  }

  fn process_palette(&mut self, ihdr: &Ihdr, storage: &mut PixelStorage) -> PngResult<()> {
    if ihdr.color_type != ColorType::Indexed {
      return Ok(());
    }
    let Some(raw) = &self.raw else { return Ok(()) };
    if let Some(palette) = storage.palette() {
      for (entry, &alpha) in palette.iter_mut().zip(raw.iter()) {
        entry.a = alpha;
      }
    }
    Ok(())
  }

  fn process_row(
    &mut self, _row_index: u32, ihdr: &Ihdr, pixel_stride: usize, row: &mut [u8],
  ) -> PngResult<()> {
    let Some(raw) = &self.raw else { return Ok(()) };
    match ihdr.color_type {
      ColorType::Grayscale => {
        let key = u16::from_be_bytes([raw[0], raw[1]]);
        for px in row.chunks_exact_mut(pixel_stride) {
          if ihdr.bit_depth == 16 {
            let y = u16::from_ne_bytes([px[0], px[1]]);
            let alpha: u16 = if y == key { 0 } else { 0xFFFF };
            px[2..4].copy_from_slice(&alpha.to_ne_bytes());
          } else {
            let y = px[0] as u16;
            px[1] = if y == key { 0 } else { 0xFF };
          }
        }
      }
      ColorType::Rgb => {
        let key = (
          u16::from_be_bytes([raw[0], raw[1]]),
          u16::from_be_bytes([raw[2], raw[3]]),
          u16::from_be_bytes([raw[4], raw[5]]),
        );
        for px in row.chunks_exact_mut(pixel_stride) {
          if ihdr.bit_depth == 16 {
            let r = u16::from_ne_bytes([px[0], px[1]]);
            let g = u16::from_ne_bytes([px[2], px[3]]);
            let b = u16::from_ne_bytes([px[4], px[5]]);
            let alpha: u16 = if (r, g, b) == key { 0 } else { 0xFFFF };
            px[6..8].copy_from_slice(&alpha.to_ne_bytes());
          } else {
            let rgb = (px[0] as u16, px[1] as u16, px[2] as u16);
            px[3] = if rgb == key { 0 } else { 0xFF };
          }
        }
      }
      ColorType::Indexed | ColorType::GrayscaleAlpha | ColorType::Rgba => {}
    }
    Ok(())
  }
}

/// The built-in `PLTE` handler: widens `Indexed` destinations to RGBA-32 and
/// expands each decoded index byte into its palette color as rows come in.
///
/// Structural validation of the `PLTE` payload itself (length divisible by
/// 3, compatible color type, entry count within `2^bit_depth`) is the main
/// orchestrator's job ([`crate::reader::PngReader`]), run whether or not
/// this processor is registered — by the time this processor sees a `PLTE`
/// chunk its payload is already known-valid.
#[derive(Debug, Default)]
pub struct PlteProcessor {
  raw: Option<Vec<u8>>,
  resolved: Vec<Rgba32>,
}
impl PlteProcessor {
  pub fn new() -> Self {
    Self::default()
  }
}
impl Processor for PlteProcessor {
  fn process_chunk(
    &mut self, chunk_type: ChunkType, payload: &[u8], ihdr: &Ihdr,
  ) -> PngResult<Option<PixelFormatTag>> {
    if chunk_type != ChunkType::PLTE {
      return Ok(None);
    }
    self.raw = Some(payload.to_vec());
    Ok(if ihdr.color_type == ColorType::Indexed { Some(PixelFormatTag::Rgba32) } else { None })
  }

  fn process_palette(&mut self, ihdr: &Ihdr, storage: &mut PixelStorage) -> PngResult<()> {
    let _ = storage;
    if ihdr.color_type != ColorType::Indexed {
      return Ok(());
    }
    let Some(raw) = &self.raw else { return Ok(()) };
    self.resolved = raw.chunks_exact(3).map(|c| Rgba32 { r: c[0], g: c[1], b: c[2], a: 0xFF }).collect();
    Ok(())
  }

  fn process_row(
    &mut self, _row_index: u32, ihdr: &Ihdr, pixel_stride: usize, row: &mut [u8],
  ) -> PngResult<()> {
    if ihdr.color_type != ColorType::Indexed || self.resolved.is_empty() {
      return Ok(());
    }
    for px in row.chunks_exact_mut(pixel_stride) {
      let color = self.resolved.get(px[0] as usize).copied().unwrap_or_default();
      px[0] = color.r;
      px[1] = color.g;
      px[2] = color.b;
      px[3] = color.a;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ihdr::InterlaceMethod;

  fn gray8_ihdr() -> Ihdr {
    Ihdr { width: 2, height: 1, bit_depth: 8, color_type: ColorType::Grayscale, interlace_method: InterlaceMethod::None }
  }

  #[test]
  fn trns_keys_matching_gray8_sample_transparent() {
    let ihdr = gray8_ihdr();
    let mut proc = TrnsProcessor::new();
    let widen = proc.process_chunk(ChunkType::TRNS, &[0x00, 0x2A], &ihdr).unwrap();
    assert_eq!(widen, Some(PixelFormatTag::Grayscale8Alpha));
    let mut row = [0x2Au8, 0, 0x10, 0];
    proc.process_row(0, &ihdr, 2, &mut row).unwrap();
    assert_eq!(row, [0x2A, 0, 0x10, 0xFF]);
  }

  #[test]
  fn trns_is_skipped_not_fatal_for_color_types_with_their_own_alpha() {
    let ihdr = Ihdr { color_type: ColorType::Rgba, ..gray8_ihdr() };
    let mut proc = TrnsProcessor::new();
    assert_eq!(proc.process_chunk(ChunkType::TRNS, &[0, 0, 0, 0, 0, 0], &ihdr), Ok(None));
  }

  #[test]
  fn plte_requests_rgba32_widen_for_indexed_color_type() {
    let ihdr = Ihdr { color_type: ColorType::Indexed, bit_depth: 8, ..gray8_ihdr() };
    let mut proc = PlteProcessor::new();
    let widen = proc.process_chunk(ChunkType::PLTE, &[10, 20, 30], &ihdr).unwrap();
    assert_eq!(widen, Some(PixelFormatTag::Rgba32));
  }

  #[test]
  fn plte_does_not_widen_non_indexed_color_types() {
    let ihdr = Ihdr { color_type: ColorType::Rgb, bit_depth: 8, ..gray8_ihdr() };
    let mut proc = PlteProcessor::new();
    let widen = proc.process_chunk(ChunkType::PLTE, &[10, 20, 30], &ihdr).unwrap();
    assert_eq!(widen, None);
  }

  #[test]
  fn plte_row_hook_expands_index_byte_into_palette_rgba() {
    let ihdr = Ihdr { color_type: ColorType::Indexed, bit_depth: 8, ..gray8_ihdr() };
    let mut proc = PlteProcessor::new();
    proc.process_chunk(ChunkType::PLTE, &[10, 20, 30, 40, 50, 60], &ihdr).unwrap();
    let mut storage = PixelStorage::init(PixelFormatTag::Rgba32, 2);
    proc.process_palette(&ihdr, &mut storage).unwrap();
    let mut row = [0u8, 0, 0, 0, 1, 0, 0, 0];
    proc.process_row(0, &ihdr, 4, &mut row).unwrap();
    assert_eq!(&row[0..4], &[10, 20, 30, 0xFF]);
    assert_eq!(&row[4..8], &[40, 50, 60, 0xFF]);
  }

  #[test]
  fn indexed_trns_writes_stored_alpha_without_widening() {
    let ihdr = Ihdr { color_type: ColorType::Indexed, bit_depth: 8, ..gray8_ihdr() };
    let mut proc = TrnsProcessor::new();
    let widen = proc.process_chunk(ChunkType::TRNS, &[0x11, 0x22], &ihdr).unwrap();
    assert_eq!(widen, None);
    let mut storage = PixelStorage::init(PixelFormatTag::Index8, 1);
    proc.process_palette(&ihdr, &mut storage).unwrap();
    assert_eq!(storage.palette().unwrap()[0].a, 0x11);
    assert_eq!(storage.palette().unwrap()[1].a, 0x22);
  }
}
