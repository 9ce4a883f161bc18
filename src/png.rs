//! Minimal PNG writer.
//!
//! Emits exactly `IHDR`, a single `IDAT` and `IEND` for 8-bit RGBA images,
//! with filter type 0 on every scanline and zlib at the best compression
//! level. [`read_chunks`] walks a stream back into chunks and checks every
//! CRC; it does not decode pixels.

use std::io::Write;

use crc32fast::Hasher;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, trace};

use crate::error::{EncodingError, Result};
use crate::pixel::{self, PixelBuffer};

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

pub const IHDR: [u8; 4] = *b"IHDR";
pub const IDAT: [u8; 4] = *b"IDAT";
pub const IEND: [u8; 4] = *b"IEND";

const BIT_DEPTH: u8 = 8;
/// Truecolour with alpha.
const COLOR_TYPE_RGBA: u8 = 6;
const FILTER_NONE: u8 = 0;
const MAX_CHUNK_LEN: u32 = (1 << 31) - 1;

/// A chunk borrowed from an encoded stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub tag: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl Chunk<'_> {
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// Image header fields as stored in `IHDR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression: u8,
    pub filter: u8,
    pub interlace: u8,
}

impl Header {
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: BIT_DEPTH,
            color_type: COLOR_TYPE_RGBA,
            compression: 0,
            filter: 0,
            interlace: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; 13] {
        let mut out = [0u8; 13];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.bit_depth;
        out[9] = self.color_type;
        out[10] = self.compression;
        out[11] = self.filter;
        out[12] = self.interlace;
        out
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != 13 {
            return Err(EncodingError::Malformed(format!(
                "IHDR payload is {} bytes, expected 13",
                data.len()
            )));
        }
        let be32 = |at: usize| {
            u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
        };
        Ok(Self {
            width: be32(0),
            height: be32(4),
            bit_depth: data[8],
            color_type: data[9],
            compression: data[10],
            filter: data[11],
            interlace: data[12],
        })
    }
}

/// CRC-32 over the chunk tag followed by its payload.
pub fn chunk_crc(tag: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(tag);
    hasher.update(data);
    hasher.finalize()
}

/// Append one framed chunk (length, tag, payload, CRC) to `out`.
pub fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len())
        .ok()
        .filter(|&n| n <= MAX_CHUNK_LEN)
        .ok_or_else(|| {
            EncodingError::Malformed(format!(
                "{} payload of {} bytes exceeds the chunk limit",
                String::from_utf8_lossy(tag),
                data.len()
            ))
        })?;
    out.reserve(12 + data.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(tag, data).to_be_bytes());
    Ok(())
}

/// Encode a pixel buffer as an RGBA8 PNG.
pub fn encode_rgba(buf: &PixelBuffer) -> Result<Vec<u8>> {
    encode_raw(buf.as_bytes(), buf.width(), buf.height())
}

/// Encode raw row-major RGBA bytes, validating their length first.
pub fn encode_raw(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = pixel::byte_len(width, height)?;
    if data.len() != expected {
        return Err(EncodingError::BufferSize {
            expected,
            actual: data.len(),
        });
    }

    trace!("begin encode");
    let idat = compress_scanlines(data, width as usize * 4)?;
    debug!(
        "encoded {width}x{height}: {} raw bytes -> {} IDAT bytes",
        data.len(),
        idat.len()
    );

    let mut out = Vec::with_capacity(SIGNATURE.len() + 3 * 12 + 13 + idat.len());
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, &IHDR, &Header::rgba8(width, height).to_bytes())?;
    write_chunk(&mut out, &IDAT, &idat)?;
    write_chunk(&mut out, &IEND, &[])?;

    trace!("end encode");
    Ok(out)
}

/// Prefix each scanline with a filter byte and deflate the lot.
fn compress_scanlines(data: &[u8], stride: usize) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    for row in data.chunks_exact(stride) {
        encoder.write_all(&[FILTER_NONE])?;
        encoder.write_all(row)?;
    }
    Ok(encoder.finish()?)
}

/// Split an encoded PNG into its chunks, verifying the signature, every
/// length and every CRC. Stops after `IEND`; trailing bytes are an error.
pub fn read_chunks(bytes: &[u8]) -> Result<Vec<Chunk<'_>>> {
    let rest = bytes
        .strip_prefix(&SIGNATURE[..])
        .ok_or_else(|| EncodingError::Malformed("missing PNG signature".into()))?;

    let mut chunks = Vec::new();
    let mut pos = 0usize;
    loop {
        let head = rest.get(pos..pos + 8).ok_or_else(|| {
            EncodingError::Malformed(format!("truncated chunk header at offset {}", pos + 8))
        })?;
        let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as usize;
        let tag = [head[4], head[5], head[6], head[7]];

        let data_start = pos + 8;
        let data_end = data_start
            .checked_add(len)
            .ok_or_else(|| EncodingError::Malformed("chunk length overflow".into()))?;
        let name = String::from_utf8_lossy(&tag);
        let data = rest
            .get(data_start..data_end)
            .ok_or_else(|| EncodingError::Malformed(format!("{name} chunk runs past end of stream")))?;
        let trailer = rest
            .get(data_end..data_end + 4)
            .ok_or_else(|| EncodingError::Malformed(format!("{name} chunk is missing its CRC")))?;
        let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);

        let chunk = Chunk { tag, data, crc: stored };
        let computed = chunk_crc(&tag, data);
        if computed != stored {
            return Err(EncodingError::CrcMismatch {
                tag: chunk.tag_str(),
                stored,
                computed,
            });
        }

        chunks.push(chunk);
        pos = data_end + 4;

        if tag == IEND {
            break;
        }
    }

    if pos != rest.len() {
        return Err(EncodingError::Malformed(format!(
            "{} trailing bytes after IEND",
            rest.len() - pos
        )));
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Rgba;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn checker(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::filled(width, height, Rgba::BACKGROUND).unwrap();
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    buf.set_pixel(x, y, Rgba([x as u8, y as u8, 7, 128]));
                }
            }
        }
        buf
    }

    #[test]
    fn starts_with_signature_and_has_three_chunks() {
        let png = encode_rgba(&checker(5, 3)).unwrap();
        assert_eq!(&png[..8], &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

        let chunks = read_chunks(&png).unwrap();
        let tags: Vec<_> = chunks.iter().map(|c| c.tag).collect();
        assert_eq!(tags, vec![IHDR, IDAT, IEND]);
        assert!(chunks[2].data.is_empty());
    }

    #[test]
    fn header_declares_rgba8() {
        let png = encode_rgba(&checker(7, 4)).unwrap();
        let chunks = read_chunks(&png).unwrap();
        let header = Header::parse(chunks[0].data).unwrap();
        assert_eq!(header, Header::rgba8(7, 4));
        assert_eq!(chunks[0].data, &[0, 0, 0, 7, 0, 0, 0, 4, 8, 6, 0, 0, 0]);
    }

    #[test]
    fn idat_inflates_to_filtered_scanlines() {
        let buf = checker(3, 2);
        let png = encode_rgba(&buf).unwrap();
        let chunks = read_chunks(&png).unwrap();

        let mut raw = Vec::new();
        ZlibDecoder::new(chunks[1].data).read_to_end(&mut raw).unwrap();

        assert_eq!(raw.len(), 2 * (1 + 3 * 4));
        let mut expected = Vec::new();
        for row in buf.as_bytes().chunks_exact(12) {
            expected.push(0);
            expected.extend_from_slice(row);
        }
        assert_eq!(raw, expected);
    }

    #[test]
    fn iend_crc_is_the_well_known_value() {
        let mut out = Vec::new();
        write_chunk(&mut out, &IEND, &[]).unwrap();
        assert_eq!(out, [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn rejects_mismatched_buffer_length() {
        let err = encode_raw(&[0u8; 15], 2, 2).unwrap_err();
        assert!(matches!(
            err,
            EncodingError::BufferSize {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            encode_raw(&[], 0, 4),
            Err(EncodingError::ZeroDimension { .. })
        ));
    }

    #[test]
    fn corrupted_payload_fails_crc_check() {
        let mut png = encode_rgba(&checker(4, 4)).unwrap();
        // first IHDR payload byte
        png[16] ^= 0xff;
        match read_chunks(&png) {
            Err(EncodingError::CrcMismatch { tag, .. }) => assert_eq!(tag, "IHDR"),
            other => panic!("expected CRC mismatch, got {other:?}"),
        }
    }

    #[test]
    fn truncated_stream_is_malformed() {
        let png = encode_rgba(&checker(4, 4)).unwrap();
        assert!(matches!(
            read_chunks(&png[..png.len() - 2]),
            Err(EncodingError::Malformed(_))
        ));
        assert!(matches!(
            read_chunks(&png[1..]),
            Err(EncodingError::Malformed(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut png = encode_rgba(&checker(2, 2)).unwrap();
        png.push(0);
        assert!(matches!(read_chunks(&png), Err(EncodingError::Malformed(_))));
    }
}
