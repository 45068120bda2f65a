//! # Vocabulary Builder

use crate::{
    errors::{BFResult, BpeForgeError},
    types::{CommonHashMap, Pair, SpanPair, TokenType},
};

/// The size of the u8 space.
pub const U8_SIZE: usize = u8::MAX as usize + 1;

/// A trained vocabulary: ``{ id -> bytes }``, with dense ids from 0.
///
/// Layout:
/// * ``0..S``: the special tokens, in input order;
/// * ``S..S+256``: the single bytes, in byte order;
/// * ``S+256..``: one entry per merge, in merge order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpeVocab {
    spans: Vec<Vec<u8>>,
    num_specials: usize,
}

impl BpeVocab {
    /// Rebuild a vocabulary from its entries, in id order.
    ///
    /// ## Errors
    /// [`BpeForgeError::VocabConflict`] if the single-byte entries are not at
    /// ``num_specials..num_specials + 256``, in byte order.
    pub fn from_spans(
        spans: Vec<Vec<u8>>,
        num_specials: usize,
    ) -> BFResult<Self> {
        let byte_spans = spans.get(num_specials..num_specials + U8_SIZE).ok_or_else(|| {
            BpeForgeError::VocabConflict(format!(
                "vocab has {} entries; expected at least {}",
                spans.len(),
                num_specials + U8_SIZE
            ))
        })?;

        if let Some(idx) = byte_spans
            .iter()
            .enumerate()
            .position(|(b, span)| span.as_slice() != [b as u8])
        {
            return Err(BpeForgeError::VocabConflict(format!(
                "entry {} is not the byte 0x{idx:02X}",
                num_specials + idx
            )));
        }

        Ok(Self {
            spans,
            num_specials,
        })
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Is the vocabulary empty?
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The number of special tokens at the head of the vocabulary.
    pub fn num_specials(&self) -> usize {
        self.num_specials
    }

    /// The id of the first merged entry.
    pub fn first_merge_id(&self) -> usize {
        self.num_specials + U8_SIZE
    }

    /// The number of merged entries.
    pub fn num_merged(&self) -> usize {
        self.len().saturating_sub(self.first_merge_id())
    }

    /// Get the bytes of an entry.
    pub fn get(
        &self,
        id: usize,
    ) -> Option<&[u8]> {
        self.spans.get(id).map(Vec::as_slice)
    }

    /// Get the bytes of an entry, by a typed token id.
    pub fn get_token<T: TokenType>(
        &self,
        token: T,
    ) -> Option<&[u8]> {
        token.to_usize().and_then(|id| self.get(id))
    }

    /// The special token entries.
    pub fn special_spans(&self) -> &[Vec<u8>] {
        &self.spans[..self.num_specials]
    }

    /// The id of the single-byte entry `byte`.
    pub fn byte_id(
        &self,
        byte: u8,
    ) -> usize {
        self.num_specials + byte as usize
    }

    /// Iterate over ``(id, bytes)`` entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        self.spans
            .iter()
            .enumerate()
            .map(|(id, span)| (id, span.as_slice()))
    }

    /// Release the entries, in id order.
    pub fn into_spans(self) -> Vec<Vec<u8>> {
        self.spans
    }

    /// Translate byte-level merges to id-level merges.
    ///
    /// Each merge ``(A, B)`` at position ``k`` maps to
    /// ``((id(A), id(B)), first_merge_id + k)``; where ``id(X)`` is the
    /// lowest non-special id whose bytes are ``X``.
    pub fn merges_as_pairs<T: TokenType>(
        &self,
        merges: &[SpanPair],
    ) -> BFResult<Vec<(Pair<T>, T)>> {
        let mut ids: CommonHashMap<&[u8], usize> = CommonHashMap::with_capacity(self.len());
        for (id, span) in self.iter().skip(self.num_specials) {
            ids.entry(span).or_insert(id);
        }

        let to_token = |id: usize| {
            T::from_usize(id).ok_or(BpeForgeError::VocabSizeOverflow { size: id + 1 })
        };
        let lookup = |span: &[u8]| {
            ids.get(span).copied().ok_or_else(|| {
                BpeForgeError::VocabConflict(format!(
                    "merge symbol {span:?} is not in the vocabulary"
                ))
            })
        };

        merges
            .iter()
            .enumerate()
            .map(|(k, (a, b))| {
                let pair = (
                    to_token(lookup(a.as_slice())?)?,
                    to_token(lookup(b.as_slice())?)?,
                );
                Ok((pair, to_token(self.first_merge_id() + k)?))
            })
            .collect()
    }
}

/// Builds a [`BpeVocab`].
///
/// Seeds the special tokens and the 256 single bytes;
/// then appends one entry per merge.
#[derive(Debug, Clone)]
pub struct VocabBuilder {
    spans: Vec<Vec<u8>>,
    num_specials: usize,
}

impl VocabBuilder {
    /// Create a builder holding the seed vocabulary.
    ///
    /// Duplicate special tokens get duplicate entries, at distinct ids.
    pub fn new<S: AsRef<str>>(special_tokens: &[S]) -> Self {
        let mut spans = Vec::with_capacity(special_tokens.len() + U8_SIZE);
        spans.extend(special_tokens.iter().map(|s| s.as_ref().as_bytes().to_vec()));
        spans.extend((0..=u8::MAX).map(|b| vec![b]));

        Self {
            spans,
            num_specials: special_tokens.len(),
        }
    }

    /// The number of entries so far.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Is the builder empty? Never true; the byte entries are always present.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The size of the seed vocabulary: ``specials + 256``.
    pub fn seed_size(&self) -> usize {
        self.num_specials + U8_SIZE
    }

    /// Append the concatenation of a merged pair.
    ///
    /// ## Returns
    /// The id of the new entry.
    pub fn push_merge(
        &mut self,
        left: &[u8],
        right: &[u8],
    ) -> usize {
        let mut span = Vec::with_capacity(left.len() + right.len());
        span.extend_from_slice(left);
        span.extend_from_slice(right);
        self.spans.push(span);
        self.spans.len() - 1
    }

    /// Finish the vocabulary.
    pub fn build(self) -> BpeVocab {
        BpeVocab {
            spans: self.spans,
            num_specials: self.num_specials,
        }
    }
}
