//! # pngpack
//!
//! A compact PNG codec: encode 8-bit RGBA rasters into small PNG streams
//! and decode them back, strictly conforming to the PNG specification.
//!
//! The encoder scans the image once and automatically picks the most
//! economical color representation: indexed color at bit depth 1, 2, 4 or
//! 8 while at most 256 unique colors exist, otherwise greyscale or
//! truecolor, each with or without an alpha channel. Palettes order their
//! translucent entries first so the tRNS chunk stays short. Every row is
//! filtered with whichever of the five PNG filters minimizes the absolute
//! sum. Both single-pass and Adam7 interlaced streams are supported in
//! both directions.
//!
//! DEFLATE is delegated to `flate2` (zlib wrapper, best compression);
//! chunk CRCs use `crc32fast`.
//!
//! ## Example
//!
//! ```rust
//! use pngpack::{decode, encode_to_vec};
//!
//! // 2x1 image: black, then white, both opaque.
//! let pixels = vec![0, 0, 0, 255, 255, 255, 255, 255];
//! let png = encode_to_vec(&pixels, 2, 1).unwrap();
//!
//! let raster = decode(&png[..]).unwrap();
//! assert_eq!((raster.width, raster.height), (2, 1));
//! assert_eq!(raster.pixels, pixels);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chunk;
pub mod color;
pub mod decode;
pub mod encode;
pub mod error;
pub mod filter;
pub mod interlace;
pub mod palette;

pub use color::ColorType;
pub use decode::{decode, Raster};
pub use encode::{encode, encode_to_vec, encode_with_options, EncodeOptions};
pub use error::{Error, Result};
pub use filter::FilterType;
pub use interlace::InterlaceMethod;
