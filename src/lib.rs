#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
//! A streaming, chunk-driven PNG decoder.
//!
//! [`PngReader`] walks a PNG bytestream one chunk at a time, inflating,
//! defiltering, and (if interlaced) deinterlacing `IDAT` data directly into
//! one of a closed set of typed [`PixelStorage`] layouts. [`Processor`]s hook
//! the decode to interpret ancillary chunks (`tRNS`, `PLTE`) and may widen
//! the destination format as they go.
//!
//! Requires an allocator: the `alloc` feature pulls one in for `no_std`
//! targets, and the default `std` feature (which also unlocks
//! [`PngReader::from_file`]) implies it.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// Prints a trace line when the `trace` feature is on; compiles to nothing
/// otherwise.
#[macro_export]
macro_rules! trace {
  ($($arg:tt)*) => {
    #[cfg(feature = "trace")] {
      ::std::print!("{file}:{line}> ", file = file!(), line = line!());
      ::std::println!($($arg)*);
    }
  }
}

mod adam7;
mod byte_source;
mod chunk;
mod error;
mod filtering;
mod idat_stream;
mod ihdr;
mod inflate;
mod pixel_format;
mod pixel_storage;
mod processor;
mod reader;
mod row_spread;
mod scratch;

pub use byte_source::{ByteSource, MemoryByteSource};
#[cfg(feature = "std")]
pub use byte_source::FileByteSource;
pub use chunk::{ChunkType, PNG_SIGNATURE};
pub use error::{PngError, PngResult};
pub use ihdr::{ColorType, Ihdr, InterlaceMethod};
pub use pixel_format::{
  Bgr24, Bgra32, Float32Rgba, Gray16, Gray8, GrayAlpha16, GrayAlpha8, PixelFormatTag, Rgb24, Rgb48, Rgb555,
  Rgb565, Rgba32, Rgba32Pixel, Rgba64,
};
pub use pixel_storage::{IndexBuffer, PixelStorage};
pub use processor::{PlteProcessor, Processor, TrnsProcessor};
pub use reader::{DecodeOptions, PngReader};
pub use scratch::{FixedScratch, ScratchArena, RECOMMENDED_SCRATCH_BYTES};
