//! The closed set of pixel layouts this crate can materialize into, and the
//! `#[repr(C)]` POD structs backing the non-indexed ones.
//!
//! Small, `bytemuck`-derived structs with no behavior beyond holding bytes
//! in the right shape, rather than reaching for an external pixel-format
//! crate whose tag set doesn't cover the indexed/float/bgr variants needed
//! here.

use bytemuck::{Pod, Zeroable};

/// Every pixel layout [`crate::PixelStorage`] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum PixelFormatTag {
  Index1,
  Index2,
  Index4,
  Index8,
  Index16,
  Grayscale1,
  Grayscale2,
  Grayscale4,
  Grayscale8,
  Grayscale16,
  Grayscale8Alpha,
  Grayscale16Alpha,
  Rgb24,
  Rgba32,
  Rgb48,
  Rgba64,
  Bgr24,
  Bgra32,
  Rgb565,
  Rgb555,
  Float32,
}
impl PixelFormatTag {
  /// Bytes per pixel in materialized storage. Sub-byte indexed/grayscale
  /// formats report `1`: the bit-packing only ever exists in the filtered
  /// row, never in the destination array.
  #[inline]
  pub const fn pixel_stride(self) -> usize {
    use PixelFormatTag::*;
    match self {
      Index1 | Index2 | Index4 | Index8 => 1,
      Index16 => 2,
      Grayscale1 | Grayscale2 | Grayscale4 | Grayscale8 => 1,
      Grayscale16 => 2,
      Grayscale8Alpha => 2,
      Grayscale16Alpha => 4,
      Rgb24 | Bgr24 => 3,
      Rgba32 | Bgra32 => 4,
      Rgb565 | Rgb555 => 2,
      Rgb48 => 6,
      Rgba64 => 8,
      Float32 => 16,
    }
  }

  /// Whether this tag names one of the `index*` variants.
  #[inline]
  pub const fn is_indexed(self) -> bool {
    matches!(self, Self::Index1 | Self::Index2 | Self::Index4 | Self::Index8 | Self::Index16)
  }

  /// The natural destination tag for a freshly-validated `(color_type,
  /// bit_depth)` IHDR pair, before any processor widens it.
  pub(crate) fn for_ihdr(color_type: crate::ihdr::ColorType, bit_depth: u8) -> Option<Self> {
    use crate::ihdr::ColorType as CT;
    use PixelFormatTag::*;
    Some(match (color_type, bit_depth) {
      (CT::Indexed, 1) => Index1,
      (CT::Indexed, 2) => Index2,
      (CT::Indexed, 4) => Index4,
      (CT::Indexed, 8) => Index8,
      (CT::Grayscale, 1) => Grayscale1,
      (CT::Grayscale, 2) => Grayscale2,
      (CT::Grayscale, 4) => Grayscale4,
      (CT::Grayscale, 8) => Grayscale8,
      (CT::Grayscale, 16) => Grayscale16,
      (CT::GrayscaleAlpha, 8) => Grayscale8Alpha,
      (CT::GrayscaleAlpha, 16) => Grayscale16Alpha,
      (CT::Rgb, 8) => Rgb24,
      (CT::Rgb, 16) => Rgb48,
      (CT::Rgba, 8) => Rgba32,
      (CT::Rgba, 16) => Rgba64,
      _ => return None,
    })
  }
}

/// One palette entry: 8-bit RGBA, always stored this wide regardless of the
/// source PLTE/tRNS bit depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Rgba32 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

/// Grayscale, 8-bit-per-sample destination (also used to back the `1`/`2`/`4`
/// bit sub-byte grayscale and index tags, one expanded sample per byte).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Gray8 {
  pub y: u8,
}

/// Grayscale, 16-bit-per-sample, native-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Gray16 {
  pub y: u16,
}

/// Grayscale + alpha, 8-bit-per-sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct GrayAlpha8 {
  pub y: u8,
  pub a: u8,
}

/// Grayscale + alpha, 16-bit-per-sample, native-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct GrayAlpha16 {
  pub y: u16,
  pub a: u16,
}

/// RGB, 8-bit-per-channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Rgb24 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// RGBA, 8-bit-per-channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Rgba32Pixel {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

/// RGB, 16-bit-per-channel, native-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Rgb48 {
  pub r: u16,
  pub g: u16,
  pub b: u16,
}

/// RGBA, 16-bit-per-channel, native-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Rgba64 {
  pub r: u16,
  pub g: u16,
  pub b: u16,
  pub a: u16,
}

/// BGR, 8-bit-per-channel (channel-order-swapped RGB24).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Bgr24 {
  pub b: u8,
  pub g: u8,
  pub r: u8,
}

/// BGRA, 8-bit-per-channel (channel-order-swapped RGBA32).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Bgra32 {
  pub b: u8,
  pub g: u8,
  pub r: u8,
  pub a: u8,
}

/// RGB, 5-6-5 packed into one native-endian `u16`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(transparent)]
pub struct Rgb565(pub u16);

/// RGB, 5-5-5 packed into one native-endian `u16` (top bit unused).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(transparent)]
pub struct Rgb555(pub u16);

/// RGBA as four `f32` channels, linear range `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Zeroable, Pod)]
#[repr(C)]
pub struct Float32Rgba {
  pub r: f32,
  pub g: f32,
  pub b: f32,
  pub a: f32,
}
