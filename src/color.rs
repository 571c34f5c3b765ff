//! Color types and row-byte packing.
//!
//! A [`ColorType`] knows its PNG id, its permitted bit depths, and how to
//! translate between RGBA pixels and the packed sample bytes of one
//! scanline. Sub-byte samples are packed most-significant-bit first;
//! 16-bit samples carry the 8-bit value in the high octet.

use crate::error::{Error, Result};
use crate::palette::PaletteBuilder;

/// PNG color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    /// One luminance sample per pixel.
    Greyscale,
    /// R, G, B samples per pixel.
    Truecolor,
    /// One palette index per pixel.
    Indexed,
    /// Luminance and alpha samples per pixel.
    GreyscaleAlpha,
    /// R, G, B, A samples per pixel.
    TruecolorAlpha,
}

/// Integer division luminance used for the greyscale color types.
#[inline]
fn luminance(pixel: [u8; 4]) -> u8 {
    ((pixel[0] as u16 + pixel[1] as u16 + pixel[2] as u16) / 3) as u8
}

impl ColorType {
    /// PNG color type id as stored in IHDR.
    pub const fn id(self) -> u8 {
        match self {
            ColorType::Greyscale => 0,
            ColorType::Truecolor => 2,
            ColorType::Indexed => 3,
            ColorType::GreyscaleAlpha => 4,
            ColorType::TruecolorAlpha => 6,
        }
    }

    /// Look up a color type by its IHDR id.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(ColorType::Greyscale),
            2 => Ok(ColorType::Truecolor),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GreyscaleAlpha),
            6 => Ok(ColorType::TruecolorAlpha),
            _ => Err(Error::InvalidColorConfig(format!(
                "unknown color type id {id}"
            ))),
        }
    }

    /// Samples per pixel.
    pub const fn components(self) -> usize {
        match self {
            ColorType::Greyscale | ColorType::Indexed => 1,
            ColorType::GreyscaleAlpha => 2,
            ColorType::Truecolor => 3,
            ColorType::TruecolorAlpha => 4,
        }
    }

    /// Check a bit depth against the depths PNG permits for this type.
    pub fn validate_bit_depth(self, bit_depth: u8) -> Result<()> {
        let valid = match self {
            ColorType::Greyscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            ColorType::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
            ColorType::Truecolor | ColorType::GreyscaleAlpha | ColorType::TruecolorAlpha => {
                matches!(bit_depth, 8 | 16)
            }
        };
        if valid {
            Ok(())
        } else {
            Err(Error::InvalidColorConfig(format!(
                "bit depth {bit_depth} is not valid for color type {self:?}"
            )))
        }
    }

    /// Byte distance between two horizontally adjacent pixels, as used by
    /// the row filters. Sub-byte depths count as one byte.
    pub const fn pixel_bytes(self, bit_depth: u8) -> usize {
        let per_component = if bit_depth < 8 {
            1
        } else {
            bit_depth as usize / 8
        };
        per_component * self.components()
    }

    /// Packed bytes in one scanline of `width` pixels.
    pub fn row_bytes(self, width: usize, bit_depth: u8) -> usize {
        (width * self.components() * bit_depth as usize).div_ceil(8)
    }

    /// Convert one RGBA pixel to this type's samples; returns the sample
    /// count written into `out`.
    fn to_samples(self, palette: &PaletteBuilder, pixel: [u8; 4], out: &mut [u8; 4]) -> usize {
        match self {
            ColorType::Greyscale => {
                out[0] = luminance(pixel);
                1
            }
            ColorType::Truecolor => {
                out[..3].copy_from_slice(&pixel[..3]);
                3
            }
            ColorType::Indexed => {
                out[0] = palette.get_index(pixel);
                1
            }
            ColorType::GreyscaleAlpha => {
                out[0] = luminance(pixel);
                out[1] = pixel[3];
                2
            }
            ColorType::TruecolorAlpha => {
                *out = pixel;
                4
            }
        }
    }

    /// Expand this type's samples back to one RGBA pixel.
    fn from_samples(self, palette: &[[u8; 4]], samples: &[u8]) -> Result<[u8; 4]> {
        match self {
            ColorType::Greyscale => Ok([samples[0], samples[0], samples[0], 255]),
            ColorType::Truecolor => Ok([samples[0], samples[1], samples[2], 255]),
            ColorType::Indexed => {
                palette
                    .get(samples[0] as usize)
                    .copied()
                    .ok_or_else(|| {
                        Error::InvalidColorConfig(format!(
                            "palette index {} out of range ({} entries)",
                            samples[0],
                            palette.len()
                        ))
                    })
            }
            ColorType::GreyscaleAlpha => Ok([samples[0], samples[0], samples[0], samples[1]]),
            ColorType::TruecolorAlpha => {
                Ok([samples[0], samples[1], samples[2], samples[3]])
            }
        }
    }

    /// Pack one row of RGBA pixels (`width * 4` bytes) into `out`
    /// (`row_bytes(width, bit_depth)` bytes).
    pub fn pack_row(
        self,
        palette: &PaletteBuilder,
        width: usize,
        bit_depth: u8,
        rgba: &[u8],
        out: &mut [u8],
    ) {
        debug_assert_eq!(rgba.len(), width * 4);
        debug_assert_eq!(out.len(), self.row_bytes(width, bit_depth));

        out.fill(0);
        let mut byte_pos = 0usize;
        let mut bit_pos = 0u8;
        let mut samples = [0u8; 4];
        for chunk in rgba.chunks_exact(4) {
            let pixel = [chunk[0], chunk[1], chunk[2], chunk[3]];
            let count = self.to_samples(palette, pixel, &mut samples);
            if bit_depth == 16 {
                for &sample in &samples[..count] {
                    out[byte_pos] = sample;
                    out[byte_pos + 1] = 0;
                    byte_pos += 2;
                }
            } else if bit_depth == 8 {
                out[byte_pos..byte_pos + count].copy_from_slice(&samples[..count]);
                byte_pos += count;
            } else {
                for &sample in &samples[..count] {
                    // Palette indices already fit; other samples shrink to range.
                    let value = if self == ColorType::Indexed {
                        sample
                    } else {
                        sample >> (8 - bit_depth)
                    };
                    out[byte_pos] |= value << (8 - bit_depth - bit_pos);
                    bit_pos += bit_depth;
                    if bit_pos == 8 {
                        bit_pos = 0;
                        byte_pos += 1;
                    }
                }
            }
        }
    }

    /// Unpack one reconstructed scanline into RGBA pixels (`width * 4`
    /// bytes). `palette` is consulted for indexed rows only.
    pub fn unpack_row(
        self,
        palette: &[[u8; 4]],
        width: usize,
        bit_depth: u8,
        row: &[u8],
        out: &mut [u8],
    ) -> Result<()> {
        debug_assert_eq!(row.len(), self.row_bytes(width, bit_depth));
        debug_assert_eq!(out.len(), width * 4);

        let components = self.components();
        let mut byte_pos = 0usize;
        let mut bit_pos = 0u8;
        let mut samples = [0u8; 4];
        for x in 0..width {
            if bit_depth == 16 {
                for (j, sample) in samples[..components].iter_mut().enumerate() {
                    *sample = row[byte_pos + j * 2];
                }
                byte_pos += components * 2;
            } else if bit_depth == 8 {
                samples[..components].copy_from_slice(&row[byte_pos..byte_pos + components]);
                byte_pos += components;
            } else {
                for sample in samples[..components].iter_mut() {
                    let raw = (row[byte_pos] >> (8 - bit_depth - bit_pos)) & ((1 << bit_depth) - 1);
                    *sample = if self == ColorType::Indexed {
                        raw
                    } else {
                        raw << (8 - bit_depth)
                    };
                    bit_pos += bit_depth;
                    if bit_pos == 8 {
                        bit_pos = 0;
                        byte_pos += 1;
                    }
                }
            }
            let pixel = self.from_samples(palette, &samples[..components])?;
            out[x * 4..x * 4 + 4].copy_from_slice(&pixel);
        }
        Ok(())
    }
}
