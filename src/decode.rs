//! PNG decoding stream driver.
//!
//! The decoder validates the signature, walks the chunk sequence while
//! enforcing the ordering rules, inflates the concatenated IDAT payload,
//! and reconstructs each pass row by row into the output RGBA buffer.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;

use crate::chunk;
use crate::color::ColorType;
use crate::error::{Error, Result};
use crate::filter::FilterType;
use crate::interlace::InterlaceMethod;

/// Maximum dimension for decoded images (16 million pixels per side).
/// This matches the encoder limit and prevents decompression bombs.
const MAX_DIMENSION: u32 = 1 << 24;

/// Ceiling on the decoded RGBA raster. IHDR dimensions are read from the
/// stream before any IDAT byte exists, so they alone must never be able
/// to demand a larger output allocation than this.
const MAX_RASTER_BYTES: u64 = 1 << 30;

/// A decoded image: RGBA pixels, row-major, top-to-bottom.
#[derive(Debug, Clone)]
pub struct Raster {
    /// `4 * width * height` bytes of RGBA samples.
    pub pixels: Vec<u8>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

/// Validated IHDR fields.
struct Header {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: ColorType,
    interlace: InterlaceMethod,
}

fn parse_ihdr(data: &[u8]) -> Result<Header> {
    if data.len() != 13 {
        return Err(Error::InvalidColorConfig(format!(
            "IHDR payload is {} bytes, expected 13",
            data.len()
        )));
    }
    let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    if width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || width as u64 * height as u64 * 4 > MAX_RASTER_BYTES
    {
        return Err(Error::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }

    let bit_depth = data[8];
    let color_type = ColorType::from_id(data[9])?;
    color_type.validate_bit_depth(bit_depth)?;

    if data[10] != 0 {
        return Err(Error::UnsupportedEncoding("unknown compression method"));
    }
    if data[11] != 0 {
        return Err(Error::UnsupportedEncoding("unknown filter method"));
    }
    let interlace = InterlaceMethod::from_id(data[12])?;

    Ok(Header {
        width,
        height,
        bit_depth,
        color_type,
        interlace,
    })
}

/// Decode a PNG stream into RGBA pixels.
pub fn decode<R: Read>(mut source: R) -> Result<Raster> {
    let mut signature = [0u8; 8];
    source.read_exact(&mut signature)?;
    if signature != chunk::SIGNATURE {
        return Err(Error::BadSignature);
    }

    let mut header: Option<Header> = None;
    let mut palette: Option<Vec<[u8; 4]>> = None;
    let mut seen_trns = false;
    let mut idat = Vec::new();
    let mut seen_idat = false;
    let mut idat_done = false;

    loop {
        let (chunk_type, data) = chunk::read_chunk(&mut source)?;
        if chunk_type == *b"IHDR" {
            if header.is_some() {
                return Err(Error::BadChunkOrder("IHDR appears more than once"));
            }
            header = Some(parse_ihdr(&data)?);
            continue;
        }
        let hdr = match header.as_ref() {
            Some(hdr) => hdr,
            None => return Err(Error::BadChunkOrder("first chunk must be IHDR")),
        };
        if seen_idat && chunk_type != *b"IDAT" {
            idat_done = true;
        }
        match &chunk_type {
            b"PLTE" => {
                if hdr.color_type != ColorType::Indexed {
                    return Err(Error::BadChunkOrder(
                        "PLTE present but color type is not indexed",
                    ));
                }
                if palette.is_some() {
                    return Err(Error::BadChunkOrder("PLTE appears more than once"));
                }
                if data.len() % 3 != 0 {
                    return Err(Error::InvalidColorConfig(format!(
                        "PLTE length {} is not a multiple of 3",
                        data.len()
                    )));
                }
                if data.len() / 3 > 256 {
                    return Err(Error::InvalidColorConfig(format!(
                        "PLTE has {} entries, limit is 256",
                        data.len() / 3
                    )));
                }
                palette = Some(
                    data.chunks_exact(3)
                        .map(|rgb| [rgb[0], rgb[1], rgb[2], 0xFF])
                        .collect(),
                );
            }
            b"tRNS" => {
                if hdr.color_type != ColorType::Indexed {
                    return Err(Error::BadChunkOrder(
                        "tRNS present but color type is not indexed",
                    ));
                }
                if seen_trns {
                    return Err(Error::BadChunkOrder("tRNS appears more than once"));
                }
                let entries = palette
                    .as_mut()
                    .ok_or(Error::BadChunkOrder("tRNS must follow PLTE"))?;
                if data.len() > entries.len() {
                    return Err(Error::InvalidColorConfig(format!(
                        "tRNS has {} entries but PLTE has {}",
                        data.len(),
                        entries.len()
                    )));
                }
                for (entry, &alpha) in entries.iter_mut().zip(&data) {
                    entry[3] = alpha;
                }
                seen_trns = true;
            }
            b"IDAT" => {
                if idat_done {
                    return Err(Error::BadChunkOrder("IDAT chunks must be consecutive"));
                }
                if hdr.color_type == ColorType::Indexed && palette.is_none() {
                    return Err(Error::BadChunkOrder(
                        "PLTE must precede IDAT for indexed images",
                    ));
                }
                idat.extend_from_slice(&data);
                seen_idat = true;
            }
            b"IEND" => {
                if !seen_idat {
                    return Err(Error::BadChunkOrder("no IDAT before IEND"));
                }
                break;
            }
            other => {
                if !chunk::is_ancillary(other) {
                    return Err(Error::UnknownCriticalChunk(*other));
                }
                // Unrecognized ancillary chunks are CRC-checked and skipped.
            }
        }
    }

    let hdr = match header {
        Some(hdr) => hdr,
        None => return Err(Error::BadChunkOrder("first chunk must be IHDR")),
    };
    let entries: &[[u8; 4]] = palette.as_deref().unwrap_or(&[]);

    let width = hdr.width as usize;
    let height = hdr.height as usize;
    let mut pixels = vec![0u8; width * height * 4];

    let pixel_bytes = hdr.color_type.pixel_bytes(hdr.bit_depth);
    let max_row_bytes = hdr.color_type.row_bytes(width, hdr.bit_depth);
    let mut row = vec![0u8; max_row_bytes];
    let mut prev = vec![0u8; max_row_bytes];
    let mut rgba_row = vec![0u8; width * 4];

    let mut inflater = ZlibDecoder::new(&idat[..]);
    for pass in hdr.interlace.passes(hdr.width, hdr.height) {
        let row_bytes = hdr.color_type.row_bytes(pass.width, hdr.bit_depth);
        for y in 0..pass.height {
            let mut filter_id = [0u8; 1];
            read_inflated(&mut inflater, &mut filter_id)?;
            let filter = FilterType::from_id(filter_id[0])?;

            read_inflated(&mut inflater, &mut row[..row_bytes])?;
            let prev_row = if y == 0 { None } else { Some(&prev[..row_bytes]) };
            filter.reconstruct_row(&mut row[..row_bytes], prev_row, pixel_bytes);

            hdr.color_type.unpack_row(
                entries,
                pass.width,
                hdr.bit_depth,
                &row[..row_bytes],
                &mut rgba_row[..pass.width * 4],
            )?;
            pass.scatter_row(&rgba_row[..pass.width * 4], &mut pixels, width, y);

            prev[..row_bytes].copy_from_slice(&row[..row_bytes]);
        }
    }

    Ok(Raster {
        pixels,
        width: hdr.width,
        height: hdr.height,
    })
}

/// Read exactly `buf.len()` bytes from the inflater, mapping its failure
/// modes onto the codec's error channels.
fn read_inflated<R: Read>(decoder: &mut ZlibDecoder<R>, buf: &mut [u8]) -> Result<()> {
    decoder.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::TruncatedStream,
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => {
            Error::DecompressorError(e.to_string())
        }
        _ => Error::Io(e),
    })
}
