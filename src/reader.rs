//! The main orchestrator: walks the chunk stream, applies registered
//! [`Processor`]s, and drives defiltering/row-spreading/deinterlacing into a
//! finished [`PixelStorage`].
//!
//! There is no explicit state-machine enum; the reader's public methods
//! (`new` → `load_header` → `load_with_header`) are only meaningful called in
//! that order, and each one leaves the underlying [`ByteSource`] positioned
//! exactly where the next one expects it. Misuse surfaces as an ordinary
//! chunk-order error from the byte stream itself rather than a separate
//! "wrong state" error.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use crate::adam7::{scatter_pass_row, ADAM7_PASSES};
#[cfg(feature = "std")]
use crate::byte_source::FileByteSource;
use crate::byte_source::{ByteSource, MemoryByteSource};
use crate::chunk::{chunk_crc32, ChunkHeader, ChunkType, PNG_SIGNATURE};
use crate::filtering::defilter_row;
use crate::idat_stream::IdatStream;
use crate::ihdr::{ColorType, Ihdr};
use crate::inflate::Inflate;
use crate::pixel_format::PixelFormatTag;
use crate::pixel_storage::PixelStorage;
use crate::processor::{PlteProcessor, Processor, TrnsProcessor};
use crate::row_spread::spread_row;
use crate::scratch::{FixedScratch, ScratchArena};
use crate::{PngError, PngResult};

/// Everything a decode needs beyond the byte source itself: scratch space
/// and the ordered list of processors to run.
pub struct DecodeOptions<'a> {
  scratch: ScratchArena<'a>,
  processors: Vec<Box<dyn Processor + 'a>>,
}
impl<'a> DecodeOptions<'a> {
  /// Starts from an empty processor list.
  pub fn new(scratch: ScratchArena<'a>) -> Self {
    Self { scratch, processors: Vec::new() }
  }

  /// Appends a processor to the end of the run order.
  pub fn with_processor(mut self, processor: impl Processor + 'a) -> Self {
    self.processors.push(Box::new(processor));
    self
  }

  /// A [`FixedScratch`]-backed arena plus the built-in `tRNS` and `PLTE`
  /// processors, in that order.
  pub fn with_defaults<const N: usize>(scratch: &'a mut FixedScratch<N>) -> Self {
    Self::new(scratch.arena()).with_processor(TrnsProcessor::new()).with_processor(PlteProcessor::new())
  }
}

/// Reads a PNG bytestream from a [`ByteSource`] into a [`PixelStorage`].
pub struct PngReader<S> {
  src: S,
}
impl<S: ByteSource> PngReader<S> {
  /// Verifies the 8-byte PNG signature and wraps `src`.
  pub fn new(mut src: S) -> PngResult<Self> {
    if src.borrow(8)? != PNG_SIGNATURE {
      return Err(PngError::BadSignature);
    }
    Ok(Self { src })
  }

  /// Reads and validates the `IHDR` chunk. Must be the first chunk.
  pub fn load_header(&mut self) -> PngResult<Ihdr> {
    let header = ChunkHeader::read(&mut self.src)?;
    if header.chunk_type != ChunkType::IHDR {
      return Err(PngError::MissingIhdr);
    }
    if header.length != Ihdr::PAYLOAD_LEN {
      return Err(PngError::NotAnIhdrChunk);
    }
    let payload: [u8; 13] = self.src.read_record()?;
    let declared_crc = self.src.read_u32_be()?;
    if declared_crc != chunk_crc32(ChunkType::IHDR, &payload) {
      return Err(PngError::ChunkCrcMismatch);
    }
    Ihdr::parse(&payload)
  }

  /// Reads the header, then decodes the whole image.
  pub fn load(&mut self, options: &mut DecodeOptions) -> PngResult<PixelStorage> {
    let ihdr = self.load_header()?;
    self.load_with_header(ihdr, options)
  }

  /// Decodes the whole image, given an already-parsed `ihdr` (e.g. obtained
  /// from a prior [`PngReader::load_header`] call on the same reader).
  pub fn load_with_header(&mut self, ihdr: Ihdr, options: &mut DecodeOptions) -> PngResult<PixelStorage> {
    let (mut storage, first_idat_length) = self.run_pre_idat(&ihdr, options)?;
    self.run_streaming(&ihdr, first_idat_length, &mut storage, options)?;
    self.run_post_idat()?;
    Ok(storage)
  }

  fn read_chunk_payload(&mut self, header: &ChunkHeader) -> PngResult<Vec<u8>> {
    let mut buf = vec![0u8; header.length as usize];
    let n = self.src.read(&mut buf)?;
    if n != buf.len() {
      return Err(PngError::EndOfStream);
    }
    let declared_crc = self.src.read_u32_be()?;
    if declared_crc != chunk_crc32(header.chunk_type, &buf) {
      return Err(PngError::ChunkCrcMismatch);
    }
    Ok(buf)
  }

  /// Walks every chunk up to and including the first `IDAT`'s header,
  /// running every processor's `process_chunk` on each one, then allocates
  /// and palette-initializes storage at the final (possibly widened) pixel
  /// format. Returns the storage and the first `IDAT` chunk's declared
  /// length (its payload is not yet consumed).
  fn run_pre_idat(&mut self, ihdr: &Ihdr, options: &mut DecodeOptions) -> PngResult<(PixelStorage, u32)> {
    let mut final_tag = PixelFormatTag::for_ihdr(ihdr.color_type, ihdr.bit_depth)
      .ok_or(PngError::IllegalColorTypeBitDepthCombination)?;
    let mut seen_plte = false;
    let mut seen_trns = false;
    loop {
      let header = ChunkHeader::read(&mut self.src)?;
      crate::trace!("pre-IDAT chunk: {:?} ({} bytes)", header.chunk_type, header.length);
      if header.chunk_type == ChunkType::IHDR {
        return Err(PngError::DuplicateIhdr);
      } else if header.chunk_type == ChunkType::IEND {
        return Err(PngError::UnexpectedIend);
      } else if header.chunk_type == ChunkType::IDAT {
        if ihdr.color_type == ColorType::Indexed && !seen_plte {
          return Err(PngError::WrongChunkOrder);
        }
        let pixel_count =
          (ihdr.width as usize).checked_mul(ihdr.height as usize).ok_or(PngError::IllegalWidthOrHeight)?;
        let mut storage = PixelStorage::init(final_tag, pixel_count);
        for p in options.processors.iter_mut() {
          p.process_palette(ihdr, &mut storage)?;
        }
        return Ok((storage, header.length));
      }

      if header.chunk_type == ChunkType::PLTE {
        if seen_plte {
          return Err(PngError::DuplicatePlte);
        }
        seen_plte = true;
      } else if header.chunk_type == ChunkType::TRNS {
        if seen_trns {
          return Err(PngError::WrongChunkOrder);
        }
        if ihdr.color_type == ColorType::Indexed && !seen_plte {
          return Err(PngError::WrongChunkOrder);
        }
        seen_trns = true;
      } else if header.chunk_type.is_critical() {
        return Err(PngError::WrongChunkOrder);
      }

      let payload = self.read_chunk_payload(&header)?;

      // PLTE structural validity is the orchestrator's responsibility
      // regardless of whether a PlteProcessor is registered to act on it.
      if header.chunk_type == ChunkType::PLTE {
        if payload.len() % 3 != 0 {
          return Err(PngError::PaletteLengthNotMultipleOfThree);
        }
        match ihdr.color_type {
          ColorType::Indexed => {
            if payload.len() / 3 > (1usize << ihdr.bit_depth) {
              return Err(PngError::PaletteTooLarge);
            }
          }
          ColorType::Rgb | ColorType::Rgba => {}
          ColorType::Grayscale | ColorType::GrayscaleAlpha => {
            return Err(PngError::PaletteForbiddenForColorType);
          }
        }
      }

      for p in options.processors.iter_mut() {
        if let Some(tag) = p.process_chunk(header.chunk_type, &payload, ihdr)? {
          if tag.pixel_stride() < final_tag.pixel_stride() {
            return Err(PngError::ProcessorWidenedToSmallerFormat);
          }
          final_tag = tag;
        }
      }
    }
  }

  /// Inflates the concatenated `IDAT` payload, defiltering and spreading one
  /// row (or, for Adam7 images, one reduced-image row per pass) at a time.
  fn run_streaming(
    &mut self, ihdr: &Ihdr, first_idat_length: u32, storage: &mut PixelStorage, options: &mut DecodeOptions,
  ) -> PngResult<()> {
    let pixel_stride = storage.tag().pixel_stride();
    let idat = IdatStream::new(&mut self.src, first_idat_length);
    let mut inflate = Inflate::new(idat, &mut options.scratch)?;
    let filter_stride = ihdr.filter_stride();
    crate::trace!("streaming {}x{} at pixel_stride {}, interlaced: {}", ihdr.width, ihdr.height, pixel_stride, ihdr.is_interlaced());

    if ihdr.is_interlaced() {
      let row_byte_len = ihdr.width as usize * pixel_stride;
      let max_row_len = filter_stride + ihdr.line_bytes();
      let mut buf_a = options.scratch.take(max_row_len)?;
      let mut buf_b = options.scratch.take(max_row_len)?;
      let mut pass_row = options.scratch.take(row_byte_len)?;
      let bytes = storage.pixels_as_bytes();
      for pass in ADAM7_PASSES.iter() {
        let (pass_w, pass_h) = pass.pass_dimensions(ihdr.width, ihdr.height);
        if pass_w == 0 || pass_h == 0 {
          crate::trace!("skipping empty Adam7 pass");
          continue;
        }
        crate::trace!("Adam7 pass: {}x{} reduced image", pass_w, pass_h);
        let row_len = filter_stride + ihdr.line_bytes_for_width(pass_w);
        buf_a[..row_len].fill(0);
        buf_b[..row_len].fill(0);
        let pass_row_len = pass_w as usize * pixel_stride;
        for row_index in 0..pass_h {
          read_exact(&mut inflate, &mut buf_a[..row_len])?;
          defilter_row(&mut buf_a[..row_len], &buf_b[..row_len], filter_stride)?;
          spread_row(
            &buf_a[filter_stride..row_len],
            &mut pass_row[..pass_row_len],
            ihdr.bit_depth,
            ihdr.color_type.channel_count(),
            pixel_stride,
            pass_w as usize,
            ihdr.bit_depth == 16,
          );
          for p in options.processors.iter_mut() {
            p.process_row(row_index, ihdr, pixel_stride, &mut pass_row[..pass_row_len])?;
          }
          scatter_pass_row(&pass_row[..pass_row_len], bytes, pass, row_index, pixel_stride, row_byte_len);
          core::mem::swap(&mut buf_a, &mut buf_b);
        }
      }
    } else {
      let row_len = filter_stride + ihdr.line_bytes();
      let mut buf_a = options.scratch.take(row_len)?;
      let mut buf_b = options.scratch.take(row_len)?;
      let row_byte_len = ihdr.width as usize * pixel_stride;
      let bytes = storage.pixels_as_bytes();
      for row_index in 0..ihdr.height {
        read_exact(&mut inflate, &mut buf_a)?;
        defilter_row(&mut buf_a, &buf_b, filter_stride)?;
        let row_start = row_index as usize * row_byte_len;
        let dst = &mut bytes[row_start..row_start + row_byte_len];
        spread_row(
          &buf_a[filter_stride..],
          dst,
          ihdr.bit_depth,
          ihdr.color_type.channel_count(),
          pixel_stride,
          ihdr.width as usize,
          ihdr.bit_depth == 16,
        );
        for p in options.processors.iter_mut() {
          p.process_row(row_index, ihdr, pixel_stride, dst)?;
        }
        core::mem::swap(&mut buf_a, &mut buf_b);
      }
    }
    Ok(())
  }

  /// Consumes chunks after the last `IDAT` up to and including `IEND`. A
  /// `tRNS` (or other ancillary chunk) here is read and CRC-checked but
  /// otherwise ignored — ancillary data arriving after the pixel format has
  /// already been committed cannot retroactively change the decode.
  fn run_post_idat(&mut self) -> PngResult<()> {
    loop {
      let header = ChunkHeader::read(&mut self.src)?;
      if header.chunk_type == ChunkType::IEND {
        self.read_chunk_payload(&header)?;
        return Ok(());
      } else if header.chunk_type == ChunkType::IHDR {
        return Err(PngError::DuplicateIhdr);
      } else if header.chunk_type == ChunkType::PLTE || header.chunk_type == ChunkType::IDAT {
        return Err(PngError::WrongChunkOrder);
      } else if header.chunk_type.is_critical() {
        return Err(PngError::WrongChunkOrder);
      }
      self.read_chunk_payload(&header)?;
    }
  }
}

#[cfg(feature = "std")]
impl PngReader<FileByteSource> {
  /// Opens a PNG from a file, verifying the signature.
  pub fn from_file(file: std::fs::File) -> PngResult<Self> {
    Self::new(FileByteSource::new(file))
  }
}
impl<'b> PngReader<MemoryByteSource<'b>> {
  /// Wraps an in-memory PNG bytestream, verifying the signature.
  pub fn from_memory(bytes: &'b [u8]) -> PngResult<Self> {
    Self::new(MemoryByteSource::new(bytes))
  }
}

fn read_exact<S: ByteSource>(inflate: &mut Inflate<'_, '_, S>, buf: &mut [u8]) -> PngResult<()> {
  let mut filled = 0;
  while filled < buf.len() {
    let n = inflate.read(&mut buf[filled..])?;
    if n == 0 {
      return Err(PngError::RowLengthMismatch);
    }
    filled += n;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pixel_format::Rgba32Pixel;
  use crate::scratch::RECOMMENDED_SCRATCH_BYTES;

  fn adler32(data: &[u8]) -> u32 {
    const MOD_ADLER: u32 = 65521;
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
      a = (a + byte as u32) % MOD_ADLER;
      b = (b + a) % MOD_ADLER;
    }
    (b << 16) | a
  }

  /// Wraps `data` as a single uncompressed ("stored") deflate block inside a
  /// minimal zlib stream — valid input for any conforming inflater,
  /// regardless of what compression a real encoder would have chosen.
  fn zlib_stored(data: &[u8]) -> Vec<u8> {
    assert!(data.len() <= 0xFFFF);
    let mut out = vec![0x78u8, 0x01, 0x01];
    let len = data.len() as u16;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(!len).to_le_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
  }

  fn chunk(ty: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(ty);
    out.extend_from_slice(payload);
    out.extend_from_slice(&chunk_crc32(ChunkType(*ty), payload).to_be_bytes());
    out
  }

  fn ihdr_payload(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> [u8; 13] {
    let mut out = [0u8; 13];
    out[0..4].copy_from_slice(&width.to_be_bytes());
    out[4..8].copy_from_slice(&height.to_be_bytes());
    out[8] = bit_depth;
    out[9] = color_type;
    out[12] = interlace;
    out
  }

  #[test]
  fn bad_signature_is_rejected() {
    let bytes = [0u8; 8];
    let src = MemoryByteSource::new(&bytes);
    assert_eq!(PngReader::new(src).err(), Some(PngError::BadSignature));
  }

  #[test]
  fn one_by_one_rgba_round_trips() {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(1, 1, 8, 6, 0)));
    let raw_row = [0u8, 10, 20, 30, 40];
    png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&raw_row)));
    png.extend_from_slice(&chunk(b"IEND", &[]));

    let mut reader = PngReader::from_memory(&png).unwrap();
    let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
    let mut options = DecodeOptions::with_defaults(&mut scratch);
    let storage = reader.load(&mut options).unwrap();
    match storage {
      PixelStorage::Rgba32(pixels) => {
        assert_eq!(pixels[0], Rgba32Pixel { r: 10, g: 20, b: 30, a: 40 });
      }
      other => panic!("unexpected storage variant: {other:?}"),
    }
  }

  #[test]
  fn trns_keys_gray8_sample_transparent_end_to_end() {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(2, 1, 8, 0, 0)));
    png.extend_from_slice(&chunk(b"tRNS", &[0x00, 0x2A]));
    let raw_row = [0u8, 0x2A, 0x10];
    png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&raw_row)));
    png.extend_from_slice(&chunk(b"IEND", &[]));

    let mut reader = PngReader::from_memory(&png).unwrap();
    let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
    let mut options = DecodeOptions::with_defaults(&mut scratch);
    let storage = reader.load(&mut options).unwrap();
    match storage {
      PixelStorage::GrayAlpha8(pixels) => {
        assert_eq!(pixels[0].a, 0);
        assert_eq!(pixels[1].a, 0xFF);
      }
      other => panic!("unexpected storage variant: {other:?}"),
    }
  }

  #[test]
  fn indexed_without_plte_is_rejected() {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(1, 1, 8, 3, 0)));
    png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&[0u8, 0])));
    png.extend_from_slice(&chunk(b"IEND", &[]));

    let mut reader = PngReader::from_memory(&png).unwrap();
    let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
    let mut options = DecodeOptions::with_defaults(&mut scratch);
    assert_eq!(reader.load(&mut options), Err(PngError::WrongChunkOrder));
  }

  #[test]
  fn indexed_with_plte_widens_to_rgba_and_expands_indices() {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(2, 1, 8, 3, 0)));
    png.extend_from_slice(&chunk(b"PLTE", &[0, 0, 0, 10, 20, 30]));
    let raw_row = [0u8, 1, 0]; // indices: pixel0 -> entry 1, pixel1 -> entry 0
    png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&raw_row)));
    png.extend_from_slice(&chunk(b"IEND", &[]));

    let mut reader = PngReader::from_memory(&png).unwrap();
    let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
    let mut options = DecodeOptions::with_defaults(&mut scratch);
    let storage = reader.load(&mut options).unwrap();
    match storage {
      PixelStorage::Rgba32(pixels) => {
        assert_eq!(pixels[0], Rgba32Pixel { r: 10, g: 20, b: 30, a: 0xFF });
        assert_eq!(pixels[1], Rgba32Pixel { r: 0, g: 0, b: 0, a: 0xFF });
      }
      other => panic!("unexpected storage variant: {other:?}"),
    }
  }

  #[test]
  fn plte_with_too_many_entries_for_bit_depth_is_rejected() {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(1, 1, 1, 3, 0)));
    png.extend_from_slice(&chunk(b"PLTE", &[0u8; 3 * 4])); // 4 entries, only 2 allowed at bit depth 1
    png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&[0u8, 0])));
    png.extend_from_slice(&chunk(b"IEND", &[]));

    let mut reader = PngReader::from_memory(&png).unwrap();
    let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
    let mut options = DecodeOptions::with_defaults(&mut scratch);
    assert_eq!(reader.load(&mut options), Err(PngError::PaletteTooLarge));
  }

  #[test]
  fn plte_is_rejected_for_a_color_type_with_no_palette() {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(1, 1, 8, 0, 0)));
    png.extend_from_slice(&chunk(b"PLTE", &[0, 0, 0]));
    png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&[0u8, 0])));
    png.extend_from_slice(&chunk(b"IEND", &[]));

    let mut reader = PngReader::from_memory(&png).unwrap();
    let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
    let mut options = DecodeOptions::with_defaults(&mut scratch);
    assert_eq!(reader.load(&mut options), Err(PngError::PaletteForbiddenForColorType));
  }

  #[test]
  fn plte_with_length_not_a_multiple_of_three_is_rejected() {
    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(1, 1, 8, 3, 0)));
    png.extend_from_slice(&chunk(b"PLTE", &[0, 0, 0, 10]));
    png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&[0u8, 0])));
    png.extend_from_slice(&chunk(b"IEND", &[]));

    let mut reader = PngReader::from_memory(&png).unwrap();
    let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
    let mut options = DecodeOptions::with_defaults(&mut scratch);
    assert_eq!(reader.load(&mut options), Err(PngError::PaletteLengthNotMultipleOfThree));
  }
}
