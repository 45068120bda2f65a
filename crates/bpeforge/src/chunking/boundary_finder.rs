//! # Chunk Boundary Finder

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use memchr::memmem;

use crate::errors::{BFResult, BpeForgeError};

/// The scan block size used when searching for a split marker.
pub const MINI_CHUNK_SIZE: usize = 4096;

/// Find chunk boundaries aligned to `split_marker`.
///
/// Guesses ``desired_num_chunks + 1`` uniformly spaced offsets; then moves
/// every interior guess forward to the start of the next `split_marker`
/// (or to the end of the source, if there is none).
///
/// ## Arguments
/// * `source` - the seekable byte source.
/// * `desired_num_chunks` - the upper bound on the number of chunks; must be >= 1.
/// * `split_marker` - the marker to align to; an empty marker disables splitting.
///
/// ## Returns
/// Sorted, unique offsets ``b[0] = 0 < b[1] < ... < b[k] = size``, with ``k <= desired_num_chunks``.
/// An empty source yields ``[0]``.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn find_chunk_boundaries<R: Read + Seek>(
    source: &mut R,
    desired_num_chunks: usize,
    split_marker: &[u8],
) -> BFResult<Vec<u64>> {
    if desired_num_chunks == 0 {
        return Err(BpeForgeError::InvalidConfig(
            "num_chunks must be >= 1".to_string(),
        ));
    }

    let file_size = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(0))?;

    if split_marker.is_empty() || desired_num_chunks == 1 {
        let mut boundaries = vec![0, file_size];
        boundaries.dedup();
        return Ok(boundaries);
    }

    let chunk_size = file_size / desired_num_chunks as u64;

    let mut boundaries: Vec<u64> = (0..=desired_num_chunks as u64)
        .map(|i| i * chunk_size)
        .collect();
    boundaries[desired_num_chunks] = file_size;

    let finder = memmem::Finder::new(split_marker);
    for boundary in boundaries[1..desired_num_chunks].iter_mut() {
        *boundary = scan_for_marker(source, *boundary, &finder)?.unwrap_or(file_size);
    }

    boundaries.sort_unstable();
    boundaries.dedup();

    log::debug!("chunk boundaries: {boundaries:?}");
    Ok(boundaries)
}

/// Scan forward from `start` for the first occurrence of the marker.
///
/// Reads in [`MINI_CHUNK_SIZE`] blocks; the last ``marker.len() - 1`` bytes
/// of each window are carried into the next, so a marker straddling
/// two blocks is still found.
fn scan_for_marker<R: Read + Seek>(
    source: &mut R,
    start: u64,
    finder: &memmem::Finder,
) -> BFResult<Option<u64>> {
    source.seek(SeekFrom::Start(start))?;

    let overlap = finder.needle().len() - 1;
    let mut window: Vec<u8> = Vec::with_capacity(MINI_CHUNK_SIZE + overlap);
    let mut window_start = start;
    let mut block = vec![0u8; MINI_CHUNK_SIZE];

    loop {
        let n = match source.read(&mut block) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Ok(None);
        }
        window.extend_from_slice(&block[..n]);

        if let Some(found_at) = finder.find(&window) {
            return Ok(Some(window_start + found_at as u64));
        }

        let drop = window.len() - overlap.min(window.len());
        window.drain(..drop);
        window_start += drop as u64;
    }
}
