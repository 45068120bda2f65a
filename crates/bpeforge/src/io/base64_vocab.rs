//! # Base64 Vocabulary IO

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use base64::{Engine, prelude::BASE64_STANDARD};

use crate::{
    errors::{BFResult, BpeForgeError},
    io::{decode_field, split_line},
    training::BpeVocab,
};

/// Save a [`BpeVocab`] to a base64 vocab file.
///
/// Lines are:
/// ```terminaloutput
/// {BASE64 SPAN} {ID}
/// ```
///
/// # Arguments
/// * `vocab` - the vocabulary to save.
/// * `path` - the path to save the vocabulary to.
pub fn write_base64_vocab_path<P: AsRef<Path>>(
    vocab: &BpeVocab,
    path: P,
) -> BFResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_base64_vocab(vocab, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a [`BpeVocab`] to a [`Write`] writer, in id order.
pub fn write_base64_vocab<W: Write>(
    vocab: &BpeVocab,
    writer: &mut W,
) -> BFResult<()> {
    for (id, span) in vocab.iter() {
        writeln!(writer, "{} {}", BASE64_STANDARD.encode(span), id)?;
    }
    Ok(())
}

/// Load a [`BpeVocab`] from a base64 vocab file.
///
/// # Arguments
/// * `path` - the path to the vocabulary file.
/// * `num_specials` - the number of special tokens at the head of the vocabulary.
pub fn load_base64_vocab_path<P: AsRef<Path>>(
    path: P,
    num_specials: usize,
) -> BFResult<BpeVocab> {
    read_base64_vocab(BufReader::new(File::open(path)?), num_specials)
}

/// Read a [`BpeVocab`] from a base64 vocab line reader.
///
/// Ids must be dense, starting at 0, in line order.
pub fn read_base64_vocab<R: BufRead>(
    reader: R,
    num_specials: usize,
) -> BFResult<BpeVocab> {
    let mut spans: Vec<Vec<u8>> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.is_empty() {
            continue;
        }

        let (span, id) = split_line(line_no, &line)?;
        let span = decode_field(line_no, span)?;
        let id: usize = id
            .trim()
            .parse()
            .map_err(|e: core::num::ParseIntError| {
                BpeForgeError::Parse(format!("line {line_no}: {e}"))
            })?;

        if id != spans.len() {
            return Err(BpeForgeError::Parse(format!(
                "line {line_no}: expected id {}, found {id}",
                spans.len()
            )));
        }
        spans.push(span);
    }

    BpeVocab::from_spans(spans, num_specials)
}
