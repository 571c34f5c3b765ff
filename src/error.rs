//! Error types for the pngpack library.

use std::fmt;
use std::io;

/// Result type alias for pngpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during PNG encoding or decoding.
#[derive(Debug)]
pub enum Error {
    /// The input does not start with the PNG signature.
    BadSignature,
    /// A chunk type contains a byte outside `[A-Za-z]`.
    InvalidChunkType {
        /// The offending type byte.
        byte: u8,
    },
    /// Stored chunk CRC does not match the CRC computed over type and payload.
    BadCrc {
        /// CRC read from the stream.
        stored: u32,
        /// CRC computed over type and payload.
        computed: u32,
    },
    /// A chunk appears in a position the chunk-sequence rules forbid.
    BadChunkOrder(&'static str),
    /// IHDR declares a compression or filter method this codec does not know.
    UnsupportedEncoding(&'static str),
    /// A color-related field is out of range or inconsistent.
    InvalidColorConfig(String),
    /// The source ended before a complete record could be read.
    TruncatedStream,
    /// A chunk declares a length with the high bit set.
    ChunkTooLarge {
        /// The declared length.
        length: u32,
    },
    /// An unrecognized chunk whose type marks it as critical.
    UnknownCriticalChunk([u8; 4]),
    /// Image width or height of zero.
    InvalidDimensions {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
    /// Image dimensions exceed the codec's supported size.
    ImageTooLarge {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Maximum supported dimension.
        max: u32,
    },
    /// Pixel data length doesn't match the declared dimensions.
    InvalidDataLength {
        /// Expected number of bytes.
        expected: usize,
        /// Actual number of bytes provided.
        actual: usize,
    },
    /// The DEFLATE collaborator failed while compressing.
    CompressorError(String),
    /// The DEFLATE collaborator failed while decompressing.
    DecompressorError(String),
    /// An I/O failure on the source or sink other than an unexpected EOF.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadSignature => write!(f, "Not a PNG stream: signature mismatch"),
            Error::InvalidChunkType { byte } => {
                write!(f, "Invalid chunk type byte 0x{byte:02X}")
            }
            Error::BadCrc { stored, computed } => {
                write!(
                    f,
                    "Chunk CRC mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}"
                )
            }
            Error::BadChunkOrder(detail) => write!(f, "Invalid chunk order: {detail}"),
            Error::UnsupportedEncoding(detail) => {
                write!(f, "Unsupported encoding: {detail}")
            }
            Error::InvalidColorConfig(detail) => {
                write!(f, "Invalid color configuration: {detail}")
            }
            Error::TruncatedStream => write!(f, "Unexpected end of stream"),
            Error::ChunkTooLarge { length } => {
                write!(f, "Chunk length {length} exceeds the 31-bit limit")
            }
            Error::UnknownCriticalChunk(chunk_type) => {
                write!(
                    f,
                    "Unknown critical chunk {}",
                    String::from_utf8_lossy(chunk_type)
                )
            }
            Error::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {width}x{height}")
            }
            Error::ImageTooLarge { width, height, max } => {
                write!(
                    f,
                    "Image {width}x{height} exceeds maximum dimension {max}"
                )
            }
            Error::InvalidDataLength { expected, actual } => {
                write!(
                    f,
                    "Invalid pixel data length: expected {expected} bytes, got {actual}"
                )
            }
            Error::CompressorError(msg) => write!(f, "Compressor error: {msg}"),
            Error::DecompressorError(msg) => write!(f, "Decompressor error: {msg}"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        // A short read mid-record is a truncated stream, not a generic I/O error.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::TruncatedStream
        } else {
            Error::Io(err)
        }
    }
}
