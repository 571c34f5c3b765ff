//! PNG chunk framing.
//!
//! A chunk is a length-type-data-CRC record. The CRC covers the type and
//! payload bytes, using the polynomial shared with zlib (0xEDB88320).

use std::io::{Read, Write};

use crc32fast::Hasher;

use crate::error::{Error, Result};

/// PNG file signature (magic bytes).
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Compute the CRC-32 of a chunk: type bytes followed by payload bytes.
pub fn chunk_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

/// Returns true when the chunk type marks the chunk as ancillary
/// (lowercase first byte); decoders may skip such chunks.
pub fn is_ancillary(chunk_type: &[u8; 4]) -> bool {
    chunk_type[0].is_ascii_lowercase()
}

fn validate_chunk_type(chunk_type: &[u8; 4]) -> Result<()> {
    for &byte in chunk_type {
        if !byte.is_ascii_alphabetic() {
            return Err(Error::InvalidChunkType { byte });
        }
    }
    Ok(())
}

/// Write one chunk (length, type, data, CRC) to the sink.
pub fn write_chunk<W: Write>(sink: &mut W, chunk_type: &[u8; 4], data: &[u8]) -> Result<()> {
    validate_chunk_type(chunk_type)?;
    let crc = chunk_crc(chunk_type, data);
    sink.write_all(&(data.len() as u32).to_be_bytes())?;
    sink.write_all(chunk_type)?;
    sink.write_all(data)?;
    sink.write_all(&crc.to_be_bytes())?;
    Ok(())
}

/// Read one chunk from the source, validating type syntax and CRC.
pub fn read_chunk<R: Read>(source: &mut R) -> Result<([u8; 4], Vec<u8>)> {
    let mut length_bytes = [0u8; 4];
    source.read_exact(&mut length_bytes)?;
    let length = u32::from_be_bytes(length_bytes);
    if length > i32::MAX as u32 {
        return Err(Error::ChunkTooLarge { length });
    }

    let mut chunk_type = [0u8; 4];
    source.read_exact(&mut chunk_type)?;
    validate_chunk_type(&chunk_type)?;

    let mut data = vec![0u8; length as usize];
    source.read_exact(&mut data)?;

    let mut crc_bytes = [0u8; 4];
    source.read_exact(&mut crc_bytes)?;
    let stored = u32::from_be_bytes(crc_bytes);
    let computed = chunk_crc(&chunk_type, &data);
    if stored != computed {
        return Err(Error::BadCrc { stored, computed });
    }

    Ok((chunk_type, data))
}
