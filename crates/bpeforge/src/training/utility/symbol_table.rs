//! # Symbol Arena

use std::sync::Arc;

use crate::{
    errors::{BFResult, BpeForgeError},
    types::{CommonHashMap, Pair, TokenType},
};

/// An append-only arena of interned byte-string symbols.
///
/// * symbols ``0..=255`` are the single bytes, in byte order;
/// * later symbols are concatenations produced by merges.
///
/// Symbols are interned by their bytes: merging to a byte string which
/// already exists yields the existing symbol. Ids are never reused.
#[derive(Debug, Clone)]
pub struct SymbolTable<T: TokenType> {
    spans: Vec<Arc<[u8]>>,
    index: CommonHashMap<Arc<[u8]>, T>,
    byte_symbols: [T; 256],
}

impl<T: TokenType> Default for SymbolTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TokenType> SymbolTable<T> {
    /// Create a table holding the 256 single-byte symbols.
    pub fn new() -> Self {
        let byte_symbols: [T; 256] =
            core::array::from_fn(|b| T::from_usize(b).expect("a byte fits every TokenType"));

        let mut spans = Vec::with_capacity(512);
        let mut index = CommonHashMap::with_capacity(512);
        for (b, &symbol) in byte_symbols.iter().enumerate() {
            let span: Arc<[u8]> = Arc::from(&[b as u8][..]);
            index.insert(span.clone(), symbol);
            spans.push(span);
        }

        Self {
            spans,
            index,
            byte_symbols,
        }
    }

    /// The number of symbols.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Is the table empty? Never true; the byte symbols are always present.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The symbol of a single byte.
    pub fn byte_symbol(
        &self,
        byte: u8,
    ) -> T {
        self.byte_symbols[byte as usize]
    }

    /// The bytes of a symbol.
    ///
    /// ## Panics
    /// If `symbol` was not allocated by this table.
    pub fn span(
        &self,
        symbol: T,
    ) -> &Arc<[u8]> {
        &self.spans[symbol.to_usize().unwrap_or(usize::MAX)]
    }

    /// Look up the symbol for a byte string.
    pub fn lookup(
        &self,
        span: &[u8],
    ) -> Option<T> {
        self.index.get(span).copied()
    }

    /// Intern the concatenation of `pair`.
    ///
    /// ## Returns
    /// The (possibly pre-existing) symbol and its bytes.
    pub fn intern_pair(
        &mut self,
        pair: Pair<T>,
    ) -> BFResult<(T, Arc<[u8]>)> {
        let (a, b) = pair;
        let mut joined = Vec::with_capacity(self.span(a).len() + self.span(b).len());
        joined.extend_from_slice(self.span(a));
        joined.extend_from_slice(self.span(b));

        if let Some(&symbol) = self.index.get(joined.as_slice()) {
            return Ok((symbol, self.span(symbol).clone()));
        }

        let symbol = T::from_usize(self.spans.len()).ok_or(BpeForgeError::VocabSizeOverflow {
            size: self.spans.len() + 1,
        })?;
        let span: Arc<[u8]> = Arc::from(joined);
        self.index.insert(span.clone(), symbol);
        self.spans.push(span.clone());
        Ok((symbol, span))
    }
}
