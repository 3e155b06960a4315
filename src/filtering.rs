//! Per-row defiltering: the five PNG predictors, reversed in place.
//!
//! From the PNG spec: filters are applied to **bytes**, not pixels,
//! regardless of bit depth or color type.

use crate::{PngError, PngResult};

/// Filter type byte values, as they appear at the start of every filtered
/// scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl TryFrom<u8> for FilterType {
  type Error = PngError;
  #[inline]
  fn try_from(value: u8) -> PngResult<Self> {
    Ok(match value {
      0 => Self::None,
      1 => Self::Sub,
      2 => Self::Up,
      3 => Self::Average,
      4 => Self::Paeth,
      _ => return Err(PngError::IllegalFilterType),
    })
  }
}

/// The Paeth predictor: picks whichever of `a` (left), `b` (above), `c`
/// (above-left) is closest to `a + b - c`, with ties broken in favor of `a`
/// then `b`. The PNG spec is explicit that the three comparisons must be
/// evaluated in exactly this order.
#[inline]
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Reverses a filtered scanline in place.
///
/// `row` holds exactly `filter_stride + line_bytes` bytes: the filter type
/// selector at index `filter_stride - 1` (cleared to `0` by this call so two
/// alternating row buffers can keep serving as each other's zero-padded
/// "previous row"), and the filtered samples from `filter_stride` onward.
/// `prev` must hold the already-reconstructed previous row in the same
/// layout (or be the all-zero row, for a scanline's first row of an image
/// or Adam7 pass).
pub fn defilter_row(row: &mut [u8], prev: &[u8], filter_stride: usize) -> PngResult<()> {
  debug_assert_eq!(row.len(), prev.len());
  let selector_ix = filter_stride - 1;
  let filter = FilterType::try_from(row[selector_ix])?;
  row[selector_ix] = 0;

  match filter {
    FilterType::None => {}
    FilterType::Sub => {
      for x in filter_stride..row.len() {
        row[x] = row[x].wrapping_add(row[x - filter_stride]);
      }
    }
    FilterType::Up => {
      for x in filter_stride..row.len() {
        row[x] = row[x].wrapping_add(prev[x]);
      }
    }
    FilterType::Average => {
      for x in filter_stride..row.len() {
        let a = row[x - filter_stride] as u16;
        let b = prev[x] as u16;
        let avg = ((a + b) / 2) as u8;
        row[x] = row[x].wrapping_add(avg);
      }
    }
    FilterType::Paeth => {
      for x in filter_stride..row.len() {
        let a = row[x - filter_stride];
        let b = prev[x];
        let c = prev[x - filter_stride];
        row[x] = row[x].wrapping_add(paeth_predictor(a, b, c));
      }
    }
  }
  Ok(())
}
