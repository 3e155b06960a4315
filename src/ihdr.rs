//! The image header chunk: color type, bit depth, interlace method, and the
//! legality table that ties them together.

use crate::{PngError, PngResult};

/// The five PNG color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorType {
  Grayscale = 0,
  Rgb = 2,
  Indexed = 3,
  GrayscaleAlpha = 4,
  Rgba = 6,
}
impl ColorType {
  #[inline]
  pub const fn channel_count(self) -> usize {
    match self {
      Self::Grayscale => 1,
      Self::Rgb => 3,
      Self::Indexed => 1,
      Self::GrayscaleAlpha => 2,
      Self::Rgba => 4,
    }
  }

  #[inline]
  pub const fn allowed_bit_depths(self) -> &'static [u8] {
    match self {
      Self::Grayscale => &[1, 2, 4, 8, 16],
      Self::Rgb => &[8, 16],
      Self::Indexed => &[1, 2, 4, 8],
      Self::GrayscaleAlpha => &[8, 16],
      Self::Rgba => &[8, 16],
    }
  }
}
impl TryFrom<u8> for ColorType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> PngResult<Self> {
    Ok(match value {
      0 => Self::Grayscale,
      2 => Self::Rgb,
      3 => Self::Indexed,
      4 => Self::GrayscaleAlpha,
      6 => Self::Rgba,
      _ => return Err(PngError::IllegalColorTypeBitDepthCombination),
    })
  }
}

/// `IHDR`'s interlace method byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InterlaceMethod {
  None = 0,
  Adam7 = 1,
}
impl TryFrom<u8> for InterlaceMethod {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> PngResult<Self> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Adam7,
      _ => return Err(PngError::IllegalInterlaceMethod),
    })
  }
}

/// The parsed, validated `IHDR` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
  pub width: u32,
  pub height: u32,
  pub bit_depth: u8,
  pub color_type: ColorType,
  pub interlace_method: InterlaceMethod,
}
impl Ihdr {
  /// Byte length of the fixed `IHDR` payload.
  pub const PAYLOAD_LEN: u32 = 13;

  /// Parses and validates a raw 13-byte `IHDR` payload.
  ///
  /// Validity requires `1 <= width,height <= 2^31-1`, compression method and
  /// filter method both `0`, and `(color_type, bit_depth)` to be one of the
  /// five legal combinations the PNG format allows.
  pub fn parse(payload: &[u8; 13]) -> PngResult<Self> {
    let width = u32::from_be_bytes(payload[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(payload[4..8].try_into().unwrap());
    let bit_depth = payload[8];
    let color_type = ColorType::try_from(payload[9])?;
    let compression_method = payload[10];
    let filter_method = payload[11];
    let interlace_method = InterlaceMethod::try_from(payload[12])?;

    if width == 0 || height == 0 || width > 0x7FFF_FFFF || height > 0x7FFF_FFFF {
      return Err(PngError::IllegalWidthOrHeight);
    }
    if compression_method != 0 {
      return Err(PngError::IllegalCompressionMethod);
    }
    if filter_method != 0 {
      return Err(PngError::IllegalFilterMethod);
    }
    if !color_type.allowed_bit_depths().contains(&bit_depth) {
      return Err(PngError::IllegalColorTypeBitDepthCombination);
    }

    Ok(Self { width, height, bit_depth, color_type, interlace_method })
  }

  /// `filter_stride = ceil(bit_depth/8) * channel_count`, clamped to a
  /// minimum of 1 — the byte offset between same-channel samples of
  /// adjacent pixels in a filtered row.
  #[inline]
  pub const fn filter_stride(&self) -> usize {
    let bytes_per_sample = (self.bit_depth as usize + 7) / 8;
    let stride = bytes_per_sample * self.color_type.channel_count();
    if stride == 0 {
      1
    } else {
      stride
    }
  }

  /// `line_bytes = ceil(width * bit_depth * channel_count / 8)`: sample
  /// bytes in a filtered row of the given pixel width, excluding the filter
  /// selector byte.
  #[inline]
  pub const fn line_bytes_for_width(&self, width: u32) -> usize {
    let bits = width as usize * self.bit_depth as usize * self.color_type.channel_count();
    (bits + 7) / 8
  }

  /// `line_bytes` for the image's own (non-reduced) width.
  #[inline]
  pub const fn line_bytes(&self) -> usize {
    self.line_bytes_for_width(self.width)
  }

  #[inline]
  pub const fn is_interlaced(&self) -> bool {
    matches!(self.interlace_method, InterlaceMethod::Adam7)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_rgba_adam7_header() {
    let payload: [u8; 13] = [
      0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x75, 0x08, 0x06, 0x00, 0x00, 0x01,
    ];
    let ihdr = Ihdr::parse(&payload).unwrap();
    assert_eq!(ihdr.width, 255);
    assert_eq!(ihdr.height, 117);
    assert_eq!(ihdr.bit_depth, 8);
    assert_eq!(ihdr.color_type, ColorType::Rgba);
    assert_eq!(ihdr.interlace_method, InterlaceMethod::Adam7);
  }

  #[test]
  fn rejects_illegal_bit_depth_for_color_type() {
    // RGB (2) at bit depth 1 is not legal.
    let payload: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 1, 1, 2, 0, 0, 0];
    assert_eq!(Ihdr::parse(&payload), Err(PngError::IllegalColorTypeBitDepthCombination));
  }

  #[test]
  fn rejects_zero_dimensions() {
    let payload: [u8; 13] = [0, 0, 0, 0, 0, 0, 0, 1, 8, 2, 0, 0, 0];
    assert_eq!(Ihdr::parse(&payload), Err(PngError::IllegalWidthOrHeight));
  }

  #[test]
  fn filter_stride_matches_glossary_formula() {
    let rgba8 = Ihdr {
      width: 1,
      height: 1,
      bit_depth: 8,
      color_type: ColorType::Rgba,
      interlace_method: InterlaceMethod::None,
    };
    assert_eq!(rgba8.filter_stride(), 4);
    let gray1 = Ihdr {
      width: 1,
      height: 1,
      bit_depth: 1,
      color_type: ColorType::Grayscale,
      interlace_method: InterlaceMethod::None,
    };
    assert_eq!(gray1.filter_stride(), 1);
  }
}
