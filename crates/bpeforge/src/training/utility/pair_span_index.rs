//! # `PairIndex` Builder

use crate::{
    training::{CountType, utility::token_span_buffer::TokenSpanBuf},
    types::{CommonHashMap, CommonHashSet, Pair, TokenType},
};

/// A map from [`Pair`] to its weighted occurrence count.
pub type PairCountMap<T, C> = CommonHashMap<Pair<T>, C>;

/// A map from [`Pair`] to indices over ``spans``.
pub type PairIndexMap<T> = CommonHashMap<Pair<T>, CommonHashSet<usize>>;

/// An index of ``(T, T)`` pair information relative to a ``&[TokenSpanBuf<T>]``.
#[derive(Debug, Clone)]
pub struct PairSpanIndex<T: TokenType, C: CountType> {
    /// A map from [`Pair`] to its occurrence count.
    ///
    /// ``sum(spans[i].adjacency_count(pair) * counts[i]) for all i``
    pub pair_counts: PairCountMap<T, C>,

    /// A map from [`Pair`] to the indices of the spans containing it.
    pub pair_index: PairIndexMap<T>,
}

impl<T: TokenType, C: CountType> PairSpanIndex<T, C> {
    /// Build a [`PairSpanIndex`] from a slice of [`TokenSpanBuf`]s, using a count table.
    ///
    /// # Arguments
    /// * `spans` - a sequence of pre-token spans.
    /// * `counts` - `counts[i]` is the count of `spans[i]`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn from_span_count_table(
        spans: &[TokenSpanBuf<T>],
        counts: &[C],
    ) -> Self {
        let size_hint = spans.len() / 8;

        let mut index = PairSpanIndex {
            pair_counts: PairCountMap::with_capacity(size_hint),
            pair_index: PairIndexMap::with_capacity(size_hint),
        };

        let zero = C::zero();

        for (idx, (span, &count)) in spans.iter().zip(counts).enumerate() {
            if count == zero || span.len() < 2 {
                continue;
            }
            for p in span.pairs() {
                *index.pair_counts.entry(p).or_default() += count;
                index.pair_index.entry(p).or_default().insert(idx);
            }
        }

        index
    }
}
