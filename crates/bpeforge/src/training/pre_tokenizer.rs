//! # Pre-Tokenizer

use crate::{
    errors::BFResult,
    regex::{RegexWrapper, RegexWrapperPattern, exact_match_union_regex_pattern},
    training::{CountType, SpanCountTable, StringChunkType},
};

/// Expected average pre-token length in bytes.
/// Used when pre-allocating count tables.
const EXPECTED_PRETOKEN_LENGTH: usize = 5;

/// Splits text into special-token-free documents, and counts
/// the pre-tokens of each document.
///
/// Pre-tokenization is a pure function of ``(text, special_tokens)``;
/// a single `PreTokenizer` is shared across workers.
#[derive(Debug, Clone)]
pub struct PreTokenizer {
    /// Regex for splitting words.
    pub word_re: RegexWrapper,

    /// Regex for matching special tokens.
    pub special_re: Option<RegexWrapper>,
}

impl PreTokenizer {
    /// Create a pre-tokenizer with the given word pattern and special tokens.
    ///
    /// ## Arguments
    /// * `word_pattern` - the pre-tokenization pattern.
    /// * `specials` - the special tokens; empty strings never match.
    pub fn new<P, S>(
        word_pattern: P,
        specials: &[S],
    ) -> BFResult<Self>
    where
        P: Into<RegexWrapperPattern>,
        S: AsRef<str>,
    {
        let word_re = word_pattern.into().compile()?;

        let special_re = match exact_match_union_regex_pattern(specials) {
            Some(pattern) => Some(pattern.compile()?),
            None => None,
        };

        Ok(Self {
            word_re,
            special_re,
        })
    }

    /// Create a pre-tokenizer using the [`crate::regex::PRETOKEN_PATTERN`].
    pub fn with_specials<S: AsRef<str>>(specials: &[S]) -> BFResult<Self> {
        Self::new(RegexWrapperPattern::pretoken(), specials)
    }

    /// Split `text` on special tokens, discarding them.
    ///
    /// No pre-token ever spans a special token.
    pub fn split_documents<'h>(
        &self,
        text: &'h str,
    ) -> BFResult<Vec<&'h str>> {
        match &self.special_re {
            Some(re) => Ok(re.split(text)?),
            None => Ok(vec![text]),
        }
    }

    /// Count the pre-tokens of `chunk` into `table`.
    pub fn update_counts<K, C>(
        &self,
        chunk: &str,
        table: &mut SpanCountTable<K, C>,
    ) -> BFResult<()>
    where
        K: StringChunkType,
        C: CountType,
    {
        for doc in self.split_documents(chunk)? {
            for range in self.word_re.find_iter(doc) {
                table.increment(&doc[range?]);
            }
        }
        Ok(())
    }

    /// Pre-tokenize one chunk.
    ///
    /// ## Returns
    /// The pre-token frequency table of `chunk`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn pre_tokenize<K, C>(
        &self,
        chunk: &str,
    ) -> BFResult<SpanCountTable<K, C>>
    where
        K: StringChunkType,
        C: CountType,
    {
        let mut table = SpanCountTable::with_capacity(chunk.len() / (4 * EXPECTED_PRETOKEN_LENGTH));
        self.update_counts(chunk, &mut table)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use compact_str::CompactString;

    use super::*;
    use crate::types::static_is_send_sync_check;

    type Table = SpanCountTable<CompactString, u64>;

    fn sorted_counts(table: &Table) -> Vec<(String, u64)> {
        let mut counts = table
            .iter()
            .map(|(k, c)| (k.to_string(), c))
            .collect::<Vec<_>>();
        counts.sort();
        counts
    }

    #[test]
    fn test_pre_tokenize_counts() {
        let empty: [&str; 0] = [];
        let pt = PreTokenizer::with_specials(&empty).unwrap();
        static_is_send_sync_check(&pt);

        let table: Table = pt.pre_tokenize("low low lower newest newest").unwrap();
        assert_eq!(
            sorted_counts(&table),
            vec![
                (" low".to_string(), 1),
                (" lower".to_string(), 1),
                (" newest".to_string(), 2),
                ("low".to_string(), 1),
            ]
        );
        assert_eq!(table.total_count(), 5);
    }

    #[test]
    fn test_special_tokens_split_documents() {
        let pt = PreTokenizer::with_specials(&["<|endoftext|>"]).unwrap();

        assert_eq!(
            pt.split_documents("hello<|endoftext|> world<|endoftext|>").unwrap(),
            vec!["hello", " world", ""]
        );

        let table: Table = pt.pre_tokenize("hello<|endoftext|>hello").unwrap();
        assert_eq!(sorted_counts(&table), vec![("hello".to_string(), 2)]);
    }

    #[test]
    fn test_special_tokens_block_merging_across() {
        // Without the split, "a<|x|>b" would pre-tokenize punctuation with the letters.
        let pt = PreTokenizer::with_specials(&["<|x|>"]).unwrap();
        let table: Table = pt.pre_tokenize("ab<|x|>!!").unwrap();
        assert_eq!(
            sorted_counts(&table),
            vec![("!!".to_string(), 1), ("ab".to_string(), 1)]
        );
    }

    #[test]
    fn test_only_special_tokens() {
        let pt = PreTokenizer::with_specials(&["<|endoftext|>", "<|pad|>"]).unwrap();
        let table: Table = pt
            .pre_tokenize("<|endoftext|><|pad|><|endoftext|>")
            .unwrap();
        assert!(table.is_empty());

        let table: Table = pt.pre_tokenize("").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_special_token_is_ignored() {
        let pt = PreTokenizer::with_specials(&[""]).unwrap();
        assert!(pt.special_re.is_none());
        assert_eq!(pt.split_documents("abc").unwrap(), vec!["abc"]);
    }

    #[test]
    fn test_update_counts_accumulates() {
        let empty: [&str; 0] = [];
        let pt = PreTokenizer::with_specials(&empty).unwrap();

        let mut table = Table::new();
        pt.update_counts("a b", &mut table).unwrap();
        pt.update_counts("a b", &mut table).unwrap();
        assert_eq!(
            sorted_counts(&table),
            vec![(" b".to_string(), 2), ("a".to_string(), 2)]
        );
    }

    #[test]
    fn test_custom_pattern() {
        let empty: [&str; 0] = [];
        let pt = PreTokenizer::new(r"\w+", &empty).unwrap();
        assert!(pt.word_re.is_basic());

        let table: Table = pt.pre_tokenize("Foo world bar world").unwrap();
        assert_eq!(table.get("world"), 2);
        assert_eq!(table.len(), 3);
    }
}
