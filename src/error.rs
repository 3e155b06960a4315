/// An error from decoding a PNG.
///
/// Every structural problem in the container collapses to one of the
/// `InvalidData`-flavored variants below; only [`PngError::EndOfStream`] means
/// the source ran dry before a required record finished, and only
/// [`PngError::Io`] / [`PngError::ScratchExhausted`] are resource errors
/// rather than malformed-data errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum PngError {
  BadSignature,
  DuplicateIhdr,
  MissingIhdr,
  NotAnIhdrChunk,
  WrongChunkOrder,
  UnexpectedIend,
  DuplicatePlte,
  PaletteForbiddenForColorType,
  PaletteLengthNotMultipleOfThree,
  PaletteTooLarge,
  TrnsLengthMismatch,
  ChunkCrcMismatch,
  IllegalFilterType,
  IllegalColorTypeBitDepthCombination,
  IllegalCompressionMethod,
  IllegalFlagCheck,
  IllegalFilterMethod,
  IllegalInterlaceMethod,
  IllegalWidthOrHeight,
  RowLengthMismatch,
  CompressionError,
  ScratchExhausted,
  EndOfStream,
  /// A [`crate::processor::Processor`] requested a destination format
  /// narrower than the one already committed to.
  ProcessorWidenedToSmallerFormat,
  /// The underlying byte source reported an I/O failure.
  #[cfg(feature = "std")]
  Io,
}
pub type PngResult<T> = Result<T, PngError>;

impl core::fmt::Display for PngError {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let s = match self {
      Self::BadSignature => "the first 8 bytes are not the PNG signature",
      Self::DuplicateIhdr => "a second IHDR chunk was found",
      Self::MissingIhdr => "the first chunk was not IHDR",
      Self::NotAnIhdrChunk => "chunk is not a well-formed IHDR",
      Self::WrongChunkOrder => "a chunk appeared out of its required order",
      Self::UnexpectedIend => "IEND appeared before any IDAT",
      Self::DuplicatePlte => "a second PLTE chunk was found",
      Self::PaletteForbiddenForColorType => "PLTE is not allowed for this color type",
      Self::PaletteLengthNotMultipleOfThree => "PLTE length is not a multiple of 3",
      Self::PaletteTooLarge => "PLTE has more entries than 2^bit_depth allows",
      Self::TrnsLengthMismatch => "tRNS length does not match the color type",
      Self::ChunkCrcMismatch => "a chunk's CRC-32 did not match its contents",
      Self::IllegalFilterType => "a scanline used a filter type greater than 4",
      Self::IllegalColorTypeBitDepthCombination => {
        "this (color type, bit depth) pair is not legal PNG"
      }
      Self::IllegalCompressionMethod => "IHDR compression method was not 0",
      Self::IllegalFlagCheck => "zlib header failed its FCHECK",
      Self::IllegalFilterMethod => "IHDR filter method was not 0",
      Self::IllegalInterlaceMethod => "IHDR interlace method was neither 0 nor 1",
      Self::IllegalWidthOrHeight => "width or height was 0 or exceeded 2^31-1",
      Self::RowLengthMismatch => "the inflate stream ended mid-row",
      Self::CompressionError => "the IDAT stream is not valid zlib/deflate",
      Self::ScratchExhausted => "the temporary allocator ran out of space",
      Self::EndOfStream => "the byte source ran out of data",
      Self::ProcessorWidenedToSmallerFormat => {
        "a processor requested a pixel format narrower than the current one"
      }
      #[cfg(feature = "std")]
      Self::Io => "an I/O error occurred while reading the byte source",
    };
    f.write_str(s)
  }
}

#[cfg(feature = "std")]
impl std::error::Error for PngError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for PngError {
  #[inline]
  fn from(_: std::io::Error) -> Self {
    Self::Io
  }
}
