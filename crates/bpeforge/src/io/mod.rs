//! # Vocabulary and Merge List IO
//!
//! Trained vocabularies are written in the tiktoken base64 format:
//! ```terminaloutput
//! {BASE64 SPAN} {ID}
//! ```
//!
//! Merge lists are written one rule per line, in merge order:
//! ```terminaloutput
//! {BASE64 A} {BASE64 B}
//! ```

mod base64_merges;
mod base64_vocab;

#[doc(inline)]
pub use base64_merges::{
    load_base64_merges_path,
    read_base64_merges,
    write_base64_merges,
    write_base64_merges_path,
};
#[doc(inline)]
pub use base64_vocab::{
    load_base64_vocab_path,
    read_base64_vocab,
    write_base64_vocab,
    write_base64_vocab_path,
};

use crate::errors::BpeForgeError;

/// Split a ``{A} {B}`` line.
fn split_line(
    line_no: usize,
    line: &str,
) -> Result<(&str, &str), BpeForgeError> {
    line.split_once(' ')
        .ok_or_else(|| BpeForgeError::Parse(format!("line {line_no}: expected two fields")))
}

/// Decode one base64 field.
fn decode_field(
    line_no: usize,
    field: &str,
) -> Result<Vec<u8>, BpeForgeError> {
    use base64::{Engine, prelude::BASE64_STANDARD};

    BASE64_STANDARD
        .decode(field)
        .map_err(|e| BpeForgeError::Parse(format!("line {line_no}: {e}")))
}
