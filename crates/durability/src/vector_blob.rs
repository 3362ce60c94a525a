//! Vector blob serialization
//!
//! ## Format (Version 0x01)
//!
//! ```text
//! [Magic: "RSVB"]
//! [Version: u8]
//! [Dimension: u32 LE]
//! [Count: u64 LE]
//! [Metadata CRC32: u32 LE of the companion metadata document]
//! [Vectors: count * dimension * f32 LE, row-major in dense-id order]
//! [CRC32: u32 LE over every preceding byte]
//! ```
//!
//! Embeddings are stored raw; no compression. The metadata checksum ties
//! the blob to the exact document written alongside it, so a blob paired
//! with any other document is detected even when the row counts agree.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{PersistenceError, PersistenceResult};

/// Magic bytes at the start of every vector blob
pub const VECTOR_BLOB_MAGIC: [u8; 4] = *b"RSVB";

/// Vector blob format version
pub const VECTOR_BLOB_VERSION: u8 = 0x01;

/// magic + version + dimension + count + metadata crc
const HEADER_LEN: usize = 4 + 1 + 4 + 8 + 4;
const FOOTER_LEN: usize = 4;

/// Decoded vector matrix
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatrix {
    /// Row length
    pub dimension: usize,
    /// Row-major data, `count * dimension` floats
    pub data: Vec<f32>,
    /// CRC32 of the metadata document this blob was written with
    pub metadata_crc: u32,
}

impl VectorMatrix {
    /// Number of rows
    pub fn count(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }
}

/// Encode a row-major matrix into blob bytes
///
/// `data.len()` must be a multiple of `dimension`. `metadata_crc` is the
/// CRC32 of the companion metadata document bytes.
pub fn encode(dimension: usize, data: &[f32], metadata_crc: u32) -> PersistenceResult<Vec<u8>> {
    if dimension == 0 || data.len() % dimension != 0 {
        return Err(PersistenceError::Inconsistent(format!(
            "{} floats do not form rows of dimension {}",
            data.len(),
            dimension
        )));
    }
    let count = (data.len() / dimension) as u64;

    let mut buf = Vec::with_capacity(HEADER_LEN + data.len() * 4 + FOOTER_LEN);
    buf.extend_from_slice(&VECTOR_BLOB_MAGIC);
    buf.write_u8(VECTOR_BLOB_VERSION)?;
    buf.write_u32::<LittleEndian>(dimension as u32)?;
    buf.write_u64::<LittleEndian>(count)?;
    buf.write_u32::<LittleEndian>(metadata_crc)?;
    for &value in data {
        buf.write_f32::<LittleEndian>(value)?;
    }

    let crc = crc32fast::hash(&buf);
    buf.write_u32::<LittleEndian>(crc)?;
    Ok(buf)
}

/// Decode blob bytes, verifying magic, version, size and checksum
pub fn decode(bytes: &[u8]) -> PersistenceResult<VectorMatrix> {
    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(PersistenceError::TooShort {
            expected: HEADER_LEN + FOOTER_LEN,
            actual: bytes.len(),
        });
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[..4]);
    if magic != VECTOR_BLOB_MAGIC {
        return Err(PersistenceError::InvalidMagic { found: magic });
    }

    let crc_offset = bytes.len() - FOOTER_LEN;
    let mut footer = Cursor::new(&bytes[crc_offset..]);
    let expected = footer.read_u32::<LittleEndian>()?;
    let actual = crc32fast::hash(&bytes[..crc_offset]);
    if expected != actual {
        return Err(PersistenceError::ChecksumMismatch { expected, actual });
    }

    let mut reader = Cursor::new(&bytes[4..crc_offset]);
    let version = reader.read_u8()?;
    if version != VECTOR_BLOB_VERSION {
        return Err(PersistenceError::UnsupportedVersion(version));
    }
    let dimension = reader.read_u32::<LittleEndian>()? as usize;
    let count = reader.read_u64::<LittleEndian>()? as usize;
    let metadata_crc = reader.read_u32::<LittleEndian>()?;

    let payload_len = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| {
            PersistenceError::Inconsistent(format!(
                "header claims {} rows of dimension {}",
                count, dimension
            ))
        })?;
    if crc_offset != HEADER_LEN + payload_len {
        return Err(PersistenceError::TooShort {
            expected: HEADER_LEN + payload_len + FOOTER_LEN,
            actual: bytes.len(),
        });
    }
    if dimension == 0 {
        return Err(PersistenceError::Inconsistent(
            "blob records a zero dimension".to_string(),
        ));
    }

    let mut data = vec![0f32; count * dimension];
    reader.read_f32_into::<LittleEndian>(&mut data)?;

    Ok(VectorMatrix {
        dimension,
        data,
        metadata_crc,
    })
}
