//! # Token Span Buffer

use crate::{
    training::utility::SymbolTable,
    types::{Pair, TokenType},
};

/// A mutable pre-token: a sequence of symbol ids.
///
/// Iteratively rewritten during BPE vocabulary training.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenSpanBuf<T: TokenType> {
    tokens: Vec<T>,
}

impl<T: TokenType, S: AsRef<[T]>> From<S> for TokenSpanBuf<T> {
    fn from(tokens: S) -> Self {
        Self::from_tokens(tokens)
    }
}

impl<T: TokenType> TokenSpanBuf<T> {
    const DEC: i32 = -1;
    const INC: i32 = 1;

    /// Create a new span buffer from tokens.
    pub fn from_tokens<S>(tokens: S) -> Self
    where
        S: AsRef<[T]>,
    {
        Self {
            tokens: tokens.as_ref().to_vec(),
        }
    }

    /// Create a new span buf of single-byte symbols.
    ///
    /// The iteration unit is the byte, not the character:
    /// a multi-byte character becomes multiple symbols.
    ///
    /// # Arguments
    /// * `bytes` - the bytes to translate to byte-level symbols.
    /// * `symbols` - the symbol table providing the byte symbols.
    pub fn from_bytes<B: AsRef<[u8]>>(
        bytes: B,
        symbols: &SymbolTable<T>,
    ) -> Self {
        Self {
            tokens: bytes
                .as_ref()
                .iter()
                .map(|&b| symbols.byte_symbol(b))
                .collect(),
        }
    }

    /// View the tokens as a slice.
    pub fn tokens(&self) -> &[T] {
        &self.tokens
    }

    /// Get the length of the span.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Is this span empty?
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Get an iterator over [`Pair<T>`] windows of this span.
    pub fn pairs(&self) -> impl Iterator<Item = Pair<T>> + '_ {
        self.tokens.windows(2).map(|w| (w[0], w[1]))
    }

    /// Concatenate the bytes of every symbol in this span.
    pub fn to_bytes(
        &self,
        symbols: &SymbolTable<T>,
    ) -> Vec<u8> {
        self.tokens
            .iter()
            .flat_map(|&t| symbols.span(t).iter().copied())
            .collect()
    }

    /// Merge all non-overlapping occurrences of `pair -> replacement`.
    ///
    /// Occurrences are consumed greedily from the left:
    /// ``(a, a)`` applied to ``[a, a, a]`` yields ``[aa, a]``.
    ///
    /// # Arguments
    /// * `pair` - the pair to merge.
    /// * `replacement` - the token to replace `pair` with.
    /// * `on_merge` - a callback function to invoke for each incremental pair delta.
    ///   The function is called with:
    ///   - `pair` - the pair whose local count changed.
    ///   - `delta` - the pair count delta: `+1` for an added pair, `-1` for a removed pair.
    ///
    /// # Returns
    /// The number of occurrences merged.
    pub fn merge_pair_cb<F>(
        &mut self,
        pair: Pair<T>,
        replacement: T,
        on_merge: &mut F,
    ) -> usize
    where
        F: FnMut(Pair<T>, i32),
    {
        let (a, b) = pair;
        let n = self.tokens.len();

        if n < 2 {
            return 0;
        }

        let mut new_tokens: Vec<T> = Vec::with_capacity(n);
        let mut merged = 0;

        let mut i = 0;
        while i < n {
            let current = self.tokens[i];

            if i + 1 < n && pair == (current, self.tokens[i + 1]) {
                // The left neighbor now sits against the replacement.
                if let Some(&x) = new_tokens.last() {
                    on_merge((x, a), Self::DEC);
                    on_merge((x, replacement), Self::INC);
                }

                on_merge(pair, Self::DEC);

                // As does the right neighbor.
                if i + 2 < n {
                    let y = self.tokens[i + 2];
                    on_merge((b, y), Self::DEC);
                    on_merge((replacement, y), Self::INC);
                }

                new_tokens.push(replacement);
                merged += 1;

                i += 2;
            } else {
                new_tokens.push(current);
                i += 1;
            }
        }

        self.tokens = new_tokens;
        merged
    }

    /// Merge all non-overlapping occurrences of `pair -> replacement`.
    ///
    /// # Returns
    /// a delta list of pair count deltas for this span:
    /// * `(Pair, +1)` - for each instance of an added `Pair`.
    /// * `(Pair, -1)` - for each instance of a removed `Pair`.
    pub fn merge_pair(
        &mut self,
        pair: Pair<T>,
        replacement: T,
    ) -> Vec<(Pair<T>, i32)> {
        let mut deltas: Vec<(Pair<T>, i32)> = Vec::with_capacity(6);
        self.merge_pair_cb(pair, replacement, &mut |p, d| deltas.push((p, d)));
        deltas
    }
}
