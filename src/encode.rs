//! PNG encoding stream driver.
//!
//! The encoder scans the input once to accumulate the palette and the
//! greyscale/alpha predicates, picks the cheapest color representation,
//! then emits signature, IHDR, optional PLTE/tRNS, one zlib stream split
//! into IDAT chunks, and IEND.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::chunk;
use crate::color::ColorType;
use crate::error::{Error, Result};
use crate::filter::{self, FilterScratch};
use crate::interlace::InterlaceMethod;
use crate::palette::PaletteBuilder;

/// Maximum supported image dimension.
const MAX_DIMENSION: u32 = 1 << 24; // 16 million pixels

/// Default IDAT payload ceiling.
const DEFAULT_IDAT_CHUNK_SIZE: usize = 1024;

/// PNG encoding options.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Interlace method written to IHDR.
    pub interlace: InterlaceMethod,
    /// Upper bound on each IDAT chunk's payload, in bytes. A policy knob
    /// only; any positive value produces a conformant stream.
    pub idat_chunk_size: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            interlace: InterlaceMethod::None,
            idat_chunk_size: DEFAULT_IDAT_CHUNK_SIZE,
        }
    }
}

/// Encode an RGBA image (`4 * width * height` bytes, row-major,
/// top-to-bottom) as a PNG stream written to `sink`.
pub fn encode<W: Write>(sink: W, image: &[u8], width: u32, height: u32) -> Result<()> {
    encode_with_options(sink, image, width, height, &EncodeOptions::default())
}

/// Encode an RGBA image as PNG and return the stream as bytes.
pub fn encode_to_vec(image: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode(&mut output, image, width, height)?;
    Ok(output)
}

/// Encode an RGBA image as a PNG stream with custom options.
pub fn encode_with_options<W: Write>(
    mut sink: W,
    image: &[u8],
    width: u32,
    height: u32,
    options: &EncodeOptions,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    let expected = 4 * width as usize * height as usize;
    if image.len() != expected {
        return Err(Error::InvalidDataLength {
            expected,
            actual: image.len(),
        });
    }

    // Single scan: palette accumulation plus the type-selection predicates.
    // The greyscale criterion is r == g && b == a.
    let mut palette = PaletteBuilder::new();
    let mut greyscale = true;
    let mut alpha = false;
    for px in image.chunks_exact(4) {
        if px[0] != px[1] || px[2] != px[3] {
            greyscale = false;
        }
        if px[3] != 0xFF {
            alpha = true;
        }
        palette.add([px[0], px[1], px[2], px[3]]);
    }
    palette.sort();

    let (color_type, bit_depth) = select_color_mode(&palette, greyscale, alpha);
    color_type.validate_bit_depth(bit_depth)?;

    sink.write_all(&chunk::SIGNATURE)?;
    write_ihdr(&mut sink, width, height, bit_depth, color_type, options.interlace)?;

    if color_type == ColorType::Indexed {
        write_plte(&mut sink, &palette)?;
        if alpha {
            write_trns(&mut sink, &palette)?;
        }
    }

    let raw = filter_image(image, width, height, color_type, bit_depth, &palette, options.interlace);
    let compressed = deflate(&raw)?;
    for payload in compressed.chunks(options.idat_chunk_size.max(1)) {
        chunk::write_chunk(&mut sink, b"IDAT", payload)?;
    }

    chunk::write_chunk(&mut sink, b"IEND", &[])
}

/// Pick the cheapest color representation, in priority order: indexed at
/// the smallest depth that fits the palette, then greyscale/truecolor
/// with or without alpha at depth 8.
fn select_color_mode(palette: &PaletteBuilder, greyscale: bool, alpha: bool) -> (ColorType, u8) {
    if !palette.overflowed() {
        return (ColorType::Indexed, palette_bit_depth(palette.len()));
    }
    match (alpha, greyscale) {
        (false, true) => (ColorType::Greyscale, 8),
        (false, false) => (ColorType::Truecolor, 8),
        (true, true) => (ColorType::GreyscaleAlpha, 8),
        (true, false) => (ColorType::TruecolorAlpha, 8),
    }
}

/// Smallest legal indexed bit depth for a palette of `len` entries.
fn palette_bit_depth(len: usize) -> u8 {
    if len <= 2 {
        1
    } else if len <= 4 {
        2
    } else if len <= 16 {
        4
    } else {
        8
    }
}

fn write_ihdr<W: Write>(
    sink: &mut W,
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: ColorType,
    interlace: InterlaceMethod,
) -> Result<()> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.push(bit_depth);
    data.push(color_type.id());
    data.push(0); // compression method: deflate
    data.push(0); // filter method: adaptive
    data.push(interlace.id());
    chunk::write_chunk(sink, b"IHDR", &data)
}

fn write_plte<W: Write>(sink: &mut W, palette: &PaletteBuilder) -> Result<()> {
    let mut data = Vec::with_capacity(palette.len() * 3);
    for entry in palette.entries() {
        data.extend_from_slice(&entry[..3]);
    }
    chunk::write_chunk(sink, b"PLTE", &data)
}

/// tRNS carries the alphas of the leading non-opaque palette entries only.
fn write_trns<W: Write>(sink: &mut W, palette: &PaletteBuilder) -> Result<()> {
    let data: Vec<u8> = palette.entries()[..palette.alpha_len()]
        .iter()
        .map(|entry| entry[3])
        .collect();
    chunk::write_chunk(sink, b"tRNS", &data)
}

/// Pack, filter and concatenate every pass row into one buffer, the
/// uncompressed content of the zlib stream.
fn filter_image(
    image: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
    bit_depth: u8,
    palette: &PaletteBuilder,
    interlace: InterlaceMethod,
) -> Vec<u8> {
    let pixel_bytes = color_type.pixel_bytes(bit_depth);
    let max_row_bytes = color_type.row_bytes(width as usize, bit_depth);

    // Row buffers sized for the widest pass are reused everywhere.
    let mut pass_row = vec![0u8; width as usize * 4];
    let mut packed = vec![0u8; max_row_bytes];
    let mut prev = vec![0u8; max_row_bytes];
    let mut scratch = FilterScratch::new(max_row_bytes);

    let passes = interlace.passes(width, height);
    let total: usize = passes
        .iter()
        .map(|p| p.height * (1 + color_type.row_bytes(p.width, bit_depth)))
        .sum();
    let mut raw = Vec::with_capacity(total);

    for pass in &passes {
        let row_bytes = color_type.row_bytes(pass.width, bit_depth);
        for row in 0..pass.height {
            pass.gather_row(image, width as usize, row, &mut pass_row[..pass.width * 4]);
            color_type.pack_row(
                palette,
                pass.width,
                bit_depth,
                &pass_row[..pass.width * 4],
                &mut packed[..row_bytes],
            );
            let prev_row = if row == 0 { None } else { Some(&prev[..row_bytes]) };
            filter::filter_into(&mut raw, &packed[..row_bytes], prev_row, pixel_bytes, &mut scratch);
            prev[..row_bytes].copy_from_slice(&packed[..row_bytes]);
        }
    }
    raw
}

/// The DEFLATE collaborator: one zlib stream over all filtered rows.
fn deflate(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(raw)
        .map_err(|e| Error::CompressorError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| Error::CompressorError(e.to_string()))
}
