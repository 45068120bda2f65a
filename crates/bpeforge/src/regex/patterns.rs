//! # Pre-Tokenization Patterns

use crate::regex::RegexWrapperPattern;

/// The GPT-2 style pre-tokenization pattern.
///
/// In priority order, this matches:
/// * common English contractions;
/// * an optional space followed by letters;
/// * an optional space followed by digits;
/// * an optional space followed by a run of symbols/punctuation;
/// * trailing whitespace before a non-space;
/// * any whitespace run.
pub const PRETOKEN_PATTERN: &str =
    r"'(?:[sdmt]|ll|ve|re)| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

impl RegexWrapperPattern {
    /// The [`PRETOKEN_PATTERN`], as a `fancy_regex` pattern.
    pub fn pretoken() -> Self {
        Self::Fancy(PRETOKEN_PATTERN.to_string())
    }
}
