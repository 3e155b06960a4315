use pngread::{DecodeOptions, FixedScratch, PixelStorage, PngError, PngReader, RECOMMENDED_SCRATCH_BYTES};

fn crc32(bytes: &[u8]) -> u32 {
  let mut crc = 0xFFFF_FFFFu32;
  for &b in bytes {
    crc ^= b as u32;
    for _ in 0..8 {
      crc = if crc & 1 != 0 { 0xEDB8_8320 ^ (crc >> 1) } else { crc >> 1 };
    }
  }
  crc ^ 0xFFFF_FFFF
}

fn adler32(data: &[u8]) -> u32 {
  const MOD_ADLER: u32 = 65521;
  let (mut a, mut b) = (1u32, 0u32);
  for &byte in data {
    a = (a + byte as u32) % MOD_ADLER;
    b = (b + a) % MOD_ADLER;
  }
  (b << 16) | a
}

/// Wraps `data` as a single uncompressed zlib stream, valid input for any
/// conforming inflater regardless of what a real encoder would have chosen.
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
  let mut crc_input = ty.to_vec();
  crc_input.extend_from_slice(payload);
  out.extend_from_slice(payload);
  out.extend_from_slice(&crc32(&crc_input).to_be_bytes());
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

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn load(png: &[u8]) -> Result<PixelStorage, PngError> {
  let mut reader = PngReader::from_memory(png)?;
  let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
  let mut options = DecodeOptions::with_defaults(&mut scratch);
  reader.load(&mut options)
}

#[test]
fn bad_signature_is_rejected_from_the_public_api() {
  let bytes = [0u8; 16];
  assert_eq!(PngReader::from_memory(&bytes).err(), Some(PngError::BadSignature));
}

#[test]
fn idat_split_across_two_chunks_decodes_the_same_as_one() {
  let mut png = Vec::new();
  png.extend_from_slice(&PNG_SIGNATURE);
  png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(1, 1, 8, 6, 0)));
  let raw_row = [0u8, 10, 20, 30, 40];
  let compressed = zlib_stored(&raw_row);
  let split_at = compressed.len() / 2;
  png.extend_from_slice(&chunk(b"IDAT", &compressed[..split_at]));
  png.extend_from_slice(&chunk(b"IDAT", &compressed[split_at..]));
  png.extend_from_slice(&chunk(b"IEND", &[]));

  let storage = load(&png).unwrap();
  match storage {
    PixelStorage::Rgba32(pixels) => {
      assert_eq!(pixels.len(), 1);
      assert_eq!((pixels[0].r, pixels[0].g, pixels[0].b, pixels[0].a), (10, 20, 30, 40));
    }
    other => panic!("unexpected storage variant: {other:?}"),
  }
}

#[test]
fn adam7_interlaced_2x2_grayscale_scatters_every_pixel() {
  let mut png = Vec::new();
  png.extend_from_slice(&PNG_SIGNATURE);
  png.extend_from_slice(&chunk(b"IHDR", &ihdr_payload(2, 2, 8, 0, 1)));
  // Only passes 1, 6, and 7 produce any rows for a 2x2 image.
  let mut raw = Vec::new();
  raw.extend_from_slice(&[0u8, 10]); // pass 1: pixel (0,0)
  raw.extend_from_slice(&[0u8, 20]); // pass 6: pixel (1,0)
  raw.extend_from_slice(&[0u8, 30, 40]); // pass 7: pixels (0,1),(1,1)
  png.extend_from_slice(&chunk(b"IDAT", &zlib_stored(&raw)));
  png.extend_from_slice(&chunk(b"IEND", &[]));

  let storage = load(&png).unwrap();
  match storage {
    PixelStorage::Gray8 { pixels, .. } => {
      assert_eq!(pixels.iter().map(|p| p.y).collect::<Vec<_>>(), vec![10, 20, 30, 40]);
    }
    other => panic!("unexpected storage variant: {other:?}"),
  }
}

#[test]
fn bad_chunk_crc_is_rejected() {
  let mut png = Vec::new();
  png.extend_from_slice(&PNG_SIGNATURE);
  let mut ihdr_chunk = chunk(b"IHDR", &ihdr_payload(1, 1, 8, 2, 0));
  let last = ihdr_chunk.len() - 1;
  ihdr_chunk[last] ^= 0xFF;
  png.extend_from_slice(&ihdr_chunk);

  assert_eq!(PngReader::from_memory(&png).unwrap().load_header().err(), Some(PngError::ChunkCrcMismatch));
}

#[test]
fn random_bytes_after_a_valid_signature_never_panic() {
  for _ in 0..20 {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend(super::rand_bytes(256));
    if let Ok(mut reader) = PngReader::from_memory(&bytes) {
      let mut scratch = FixedScratch::<RECOMMENDED_SCRATCH_BYTES>::new();
      let mut options = DecodeOptions::with_defaults(&mut scratch);
      let _ = reader.load(&mut options);
    }
  }
}
