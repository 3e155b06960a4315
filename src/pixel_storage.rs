//! The tagged-union pixel container: one variant per [`PixelFormatTag`], with
//! indexed variants additionally owning a palette.

use crate::pixel_format::*;
use alloc::vec;
use alloc::vec::Vec;
use bytemuck::cast_slice_mut;

/// Index array backing an indexed [`PixelStorage`] variant.
///
/// `index{1,2,4,8}` all decode into one byte per sample (the bit-packing
/// exists only in the filtered row); `index16` is the one tag in this closed
/// set with no legal IHDR that produces it (PNG indexed color caps at
/// 8 bits), kept here only so the tag set is total.
#[derive(Debug, Clone)]
pub enum IndexBuffer {
  U8(Vec<u8>),
  U16(Vec<u16>),
}
impl IndexBuffer {
  #[inline]
  pub fn as_bytes_mut(&mut self) -> &mut [u8] {
    match self {
      Self::U8(v) => v.as_mut_slice(),
      Self::U16(v) => cast_slice_mut(v.as_mut_slice()),
    }
  }
}

/// The tagged-union container produced by a successful decode.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum PixelStorage {
  Indexed { tag: PixelFormatTag, palette: Vec<Rgba32>, indices: IndexBuffer },
  Gray8 { tag: PixelFormatTag, pixels: Vec<Gray8> },
  Gray16(Vec<Gray16>),
  GrayAlpha8(Vec<GrayAlpha8>),
  GrayAlpha16(Vec<GrayAlpha16>),
  Rgb24(Vec<Rgb24>),
  Rgba32(Vec<Rgba32Pixel>),
  Rgb48(Vec<Rgb48>),
  Rgba64(Vec<Rgba64>),
  Bgr24(Vec<Bgr24>),
  Bgra32(Vec<Bgra32>),
  Rgb565(Vec<Rgb565>),
  Rgb555(Vec<Rgb555>),
  Float32(Vec<Float32Rgba>),
}
impl PixelStorage {
  /// Allocates storage for `pixel_count` pixels of `format`, zeroed. Indexed
  /// formats additionally allocate their palette (`2^bit_depth` entries,
  /// also zeroed).
  pub fn init(format: PixelFormatTag, pixel_count: usize) -> Self {
    use PixelFormatTag::*;
    match format {
      Index1 | Index2 | Index4 | Index8 => {
        let bit_depth = match format {
          Index1 => 1,
          Index2 => 2,
          Index4 => 4,
          Index8 => 8,
          _ => unreachable!(),
        };
        PixelStorage::Indexed {
          tag: format,
          palette: vec![Rgba32::default(); 1usize << bit_depth],
          indices: IndexBuffer::U8(vec![0u8; pixel_count]),
        }
      }
      Index16 => PixelStorage::Indexed {
        tag: format,
        palette: vec![Rgba32::default(); 1usize << 16],
        indices: IndexBuffer::U16(vec![0u16; pixel_count]),
      },
      Grayscale1 | Grayscale2 | Grayscale4 | Grayscale8 => {
        PixelStorage::Gray8 { tag: format, pixels: vec![Gray8::default(); pixel_count] }
      }
      Grayscale16 => PixelStorage::Gray16(vec![Gray16::default(); pixel_count]),
      Grayscale8Alpha => PixelStorage::GrayAlpha8(vec![GrayAlpha8::default(); pixel_count]),
      Grayscale16Alpha => PixelStorage::GrayAlpha16(vec![GrayAlpha16::default(); pixel_count]),
      Rgb24 => PixelStorage::Rgb24(vec![Rgb24::default(); pixel_count]),
      Rgba32 => PixelStorage::Rgba32(vec![Rgba32Pixel::default(); pixel_count]),
      Rgb48 => PixelStorage::Rgb48(vec![Rgb48::default(); pixel_count]),
      Rgba64 => PixelStorage::Rgba64(vec![Rgba64::default(); pixel_count]),
      Bgr24 => PixelStorage::Bgr24(vec![Bgr24::default(); pixel_count]),
      Bgra32 => PixelStorage::Bgra32(vec![Bgra32::default(); pixel_count]),
      Rgb565 => PixelStorage::Rgb565(vec![Rgb565::default(); pixel_count]),
      Rgb555 => PixelStorage::Rgb555(vec![Rgb555::default(); pixel_count]),
      Float32 => PixelStorage::Float32(vec![Float32Rgba::default(); pixel_count]),
    }
  }

  /// The tag this storage currently holds pixels as.
  pub fn tag(&self) -> PixelFormatTag {
    match self {
      Self::Indexed { tag, .. } => *tag,
      Self::Gray8 { tag, .. } => *tag,
      Self::Gray16(_) => PixelFormatTag::Grayscale16,
      Self::GrayAlpha8(_) => PixelFormatTag::Grayscale8Alpha,
      Self::GrayAlpha16(_) => PixelFormatTag::Grayscale16Alpha,
      Self::Rgb24(_) => PixelFormatTag::Rgb24,
      Self::Rgba32(_) => PixelFormatTag::Rgba32,
      Self::Rgb48(_) => PixelFormatTag::Rgb48,
      Self::Rgba64(_) => PixelFormatTag::Rgba64,
      Self::Bgr24(_) => PixelFormatTag::Bgr24,
      Self::Bgra32(_) => PixelFormatTag::Bgra32,
      Self::Rgb565(_) => PixelFormatTag::Rgb565,
      Self::Rgb555(_) => PixelFormatTag::Rgb555,
      Self::Float32(_) => PixelFormatTag::Float32,
    }
  }

  /// The number of pixels (not bytes) this storage holds.
  pub fn len(&self) -> usize {
    match self {
      Self::Indexed { indices, .. } => match indices {
        IndexBuffer::U8(v) => v.len(),
        IndexBuffer::U16(v) => v.len(),
      },
      Self::Gray8 { pixels, .. } => pixels.len(),
      Self::Gray16(v) => v.len(),
      Self::GrayAlpha8(v) => v.len(),
      Self::GrayAlpha16(v) => v.len(),
      Self::Rgb24(v) => v.len(),
      Self::Rgba32(v) => v.len(),
      Self::Rgb48(v) => v.len(),
      Self::Rgba64(v) => v.len(),
      Self::Bgr24(v) => v.len(),
      Self::Bgra32(v) => v.len(),
      Self::Rgb565(v) => v.len(),
      Self::Rgb555(v) => v.len(),
      Self::Float32(v) => v.len(),
    }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Reinterprets the pixel array (not the palette) as raw bytes at this
  /// format's pixel stride, valid because every backing element type is
  /// `#[repr(C)]`/`Pod`.
  pub fn pixels_as_bytes(&mut self) -> &mut [u8] {
    match self {
      Self::Indexed { indices, .. } => indices.as_bytes_mut(),
      Self::Gray8 { pixels, .. } => cast_slice_mut(pixels.as_mut_slice()),
      Self::Gray16(v) => cast_slice_mut(v.as_mut_slice()),
      Self::GrayAlpha8(v) => cast_slice_mut(v.as_mut_slice()),
      Self::GrayAlpha16(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Rgb24(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Rgba32(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Rgb48(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Rgba64(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Bgr24(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Bgra32(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Rgb565(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Rgb555(v) => cast_slice_mut(v.as_mut_slice()),
      Self::Float32(v) => cast_slice_mut(v.as_mut_slice()),
    }
  }

  /// The palette, for indexed variants only.
  pub fn palette(&mut self) -> Option<&mut [Rgba32]> {
    match self {
      Self::Indexed { palette, .. } => Some(palette.as_mut_slice()),
      _ => None,
    }
  }

  /// Widens this storage in place to `new_tag`, re-allocating the pixel
  /// array (the old contents are not preserved — callers widen before any
  /// row has been written, per the monotonic-stride rule in [`crate::processor`]).
  pub fn widen_to(&mut self, new_tag: PixelFormatTag) {
    debug_assert!(new_tag.pixel_stride() >= self.tag().pixel_stride());
    let pixel_count = self.len();
    let old_palette = if let Self::Indexed { palette, .. } = self {
      Some(core::mem::take(palette))
    } else {
      None
    };
    *self = Self::init(new_tag, pixel_count);
    if let (Some(old_palette), Self::Indexed { palette, .. }) = (old_palette, self) {
      *palette = old_palette;
    }
  }
}
