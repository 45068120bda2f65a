//! # Chunk Reader

use std::io::{Read, Seek, SeekFrom};

use crate::errors::BFResult;

/// A ``[start, end)`` byte range of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkRange {
    /// The first byte offset.
    pub start: u64,

    /// One past the last byte offset.
    pub end: u64,
}

impl ChunkRange {
    /// The number of bytes in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Is the range empty?
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Pair up consecutive boundaries into [`ChunkRange`]s.
pub fn chunk_ranges(boundaries: &[u64]) -> Vec<ChunkRange> {
    boundaries
        .windows(2)
        .map(|w| ChunkRange {
            start: w[0],
            end: w[1],
        })
        .collect()
}

/// Decode bytes as UTF-8, replacing invalid sequences with ``U+FFFD``.
///
/// Valid input is moved, not copied.
pub fn decode_lossy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Read one chunk from `source` and decode it lossily.
pub fn read_chunk_lossy<R: Read + Seek>(
    source: &mut R,
    range: ChunkRange,
) -> BFResult<String> {
    source.seek(SeekFrom::Start(range.start))?;

    let mut buf = vec![0u8; range.len() as usize];
    source.read_exact(&mut buf)?;

    Ok(decode_lossy(buf))
}
