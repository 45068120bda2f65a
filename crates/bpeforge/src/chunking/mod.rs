//! # Input Chunking
//!
//! Splits a (possibly large) input into byte ranges which can be
//! pre-tokenized independently.
//!
//! Every interior boundary is placed at the start of a split marker
//! (a special token); so no pre-token, and no multi-byte character,
//! ever straddles two chunks.

mod boundary_finder;
mod chunk_reader;

#[doc(inline)]
pub use boundary_finder::{MINI_CHUNK_SIZE, find_chunk_boundaries};
#[doc(inline)]
pub use chunk_reader::{ChunkRange, chunk_ranges, decode_lossy, read_chunk_lossy};
