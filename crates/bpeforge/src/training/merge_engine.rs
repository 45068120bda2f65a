//! # Merge Engine
//!
//! The iterative core of BPE training.
//!
//! Pair counts are maintained incrementally: merging a pair into a word only
//! touches the pairs adjacent to each rewritten occurrence, weighted by the
//! word's count. Selection uses a max-heap with lazy refresh; stale entries are
//! re-checked against the live count when popped.

use core::cmp::Ordering;
use std::sync::Arc;

use dary_heap::OctonaryHeap;

use crate::{
    errors::BFResult,
    training::{
        CountType,
        SpanCountTable,
        StringChunkType,
        utility::{PairCountMap, PairIndexMap, PairSpanIndex, SymbolTable, TokenSpanBuf},
    },
    types::{CommonHashSet, Pair, TokenType},
};

/// Merge engine state.
///
/// ```text
/// Init -> Counting -> Selecting -> Rewriting -> (Counting | Terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Words are loaded; no pair counts yet.
    Init,

    /// Pair counts are current.
    Counting,

    /// Choosing the next pair.
    Selecting,

    /// Applying a merge to every word containing the pair.
    Rewriting,

    /// No further merges will be produced.
    Terminal,
}

/// A candidate [`Pair`] in the selection heap.
#[derive(Debug, Clone, Eq)]
pub struct MergeJob<T: TokenType, C: CountType> {
    /// The weighted count of the pair, when this job was pushed.
    pub count: C,

    /// The pair to merge.
    pub pair: Pair<T>,

    /// The bytes of ``pair.0``.
    pub left: Arc<[u8]>,

    /// The bytes of ``pair.1``.
    pub right: Arc<[u8]>,
}

impl<T: TokenType, C: CountType> MergeJob<T, C> {
    /// The job key.
    ///
    /// Max-heap by count; ties go to the lexicographically greater
    /// ``(left bytes, right bytes)``.
    pub fn heap_key(&self) -> (C, &[u8], &[u8]) {
        (self.count, &self.left[..], &self.right[..])
    }
}

impl<T: TokenType, C: CountType> PartialEq for MergeJob<T, C> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.heap_key() == other.heap_key()
    }
}

impl<T: TokenType, C: CountType> PartialOrd for MergeJob<T, C> {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TokenType, C: CountType> Ord for MergeJob<T, C> {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.heap_key().cmp(&other.heap_key())
    }
}

/// One applied merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRecord<T: TokenType, C: CountType> {
    /// The merged pair.
    pub pair: Pair<T>,

    /// The bytes of the left symbol.
    pub left: Arc<[u8]>,

    /// The bytes of the right symbol.
    pub right: Arc<[u8]>,

    /// The symbol which replaced the pair.
    pub symbol: T,

    /// The bytes of ``symbol``: ``left ++ right``.
    pub span: Arc<[u8]>,

    /// The weighted count of the pair when it was selected.
    pub count: C,
}

/// The BPE merge loop over a weighted set of words.
///
/// # Parameters
/// * `T` - the symbol id type.
/// * `C` - the count type.
#[derive(Debug, Clone)]
pub struct MergeEngine<T: TokenType, C: CountType> {
    symbols: SymbolTable<T>,
    words: Vec<TokenSpanBuf<T>>,
    word_counts: Vec<C>,
    pair_counts: PairCountMap<T, C>,
    pair_index: PairIndexMap<T>,
    heap: OctonaryHeap<MergeJob<T, C>>,
    state: EngineState,
    merges_done: usize,
}

impl<T: TokenType, C: CountType> MergeEngine<T, C> {
    /// Load the words of a pre-token frequency table.
    ///
    /// Each pre-token becomes a sequence of single-byte symbols.
    pub fn from_span_counts<K: StringChunkType>(table: &SpanCountTable<K, C>) -> Self {
        let mut entries: Vec<(&K, C)> = table.iter().collect();
        // Word order does not affect results; sorting keeps runs reproducible.
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        Self::from_words(
            entries
                .into_iter()
                .map(|(key, count)| (key.as_ref().as_bytes(), count)),
        )
    }

    /// Load ``(bytes, count)`` words.
    pub fn from_words<B, I>(words: I) -> Self
    where
        B: AsRef<[u8]>,
        I: IntoIterator<Item = (B, C)>,
    {
        let symbols = SymbolTable::new();
        let (words, word_counts): (Vec<TokenSpanBuf<T>>, Vec<C>) = words
            .into_iter()
            .map(|(bytes, count)| (TokenSpanBuf::from_bytes(bytes, &symbols), count))
            .unzip();

        Self {
            symbols,
            words,
            word_counts,
            pair_counts: PairCountMap::default(),
            pair_index: PairIndexMap::default(),
            heap: OctonaryHeap::new(),
            state: EngineState::Init,
            merges_done: 0,
        }
    }

    /// The current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The number of merges applied.
    pub fn merges_done(&self) -> usize {
        self.merges_done
    }

    /// The symbol table.
    pub fn symbols(&self) -> &SymbolTable<T> {
        &self.symbols
    }

    /// The words, as currently rewritten.
    pub fn words(&self) -> &[TokenSpanBuf<T>] {
        &self.words
    }

    /// The weight of each word.
    pub fn word_counts(&self) -> &[C] {
        &self.word_counts
    }

    /// The bytes of word `idx`; always the bytes of the original pre-token.
    pub fn span_bytes(
        &self,
        idx: usize,
    ) -> Vec<u8> {
        self.words[idx].to_bytes(&self.symbols)
    }

    /// The live weighted count of `pair`; zero when absent.
    ///
    /// Zero before the first [`MergeEngine::step`].
    pub fn pair_count(
        &self,
        pair: Pair<T>,
    ) -> C {
        self.pair_counts.get(&pair).copied().unwrap_or_else(C::zero)
    }

    /// Stop producing merges.
    pub fn finish(&mut self) {
        self.state = EngineState::Terminal;
    }

    fn job(
        &self,
        pair: Pair<T>,
        count: C,
    ) -> MergeJob<T, C> {
        MergeJob {
            count,
            pair,
            left: self.symbols.span(pair.0).clone(),
            right: self.symbols.span(pair.1).clone(),
        }
    }

    /// Build the pair counts, the pair index, and the heap.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    fn count_pairs(&mut self) {
        let PairSpanIndex {
            pair_counts,
            pair_index,
        } = PairSpanIndex::from_span_count_table(&self.words, &self.word_counts);

        log::debug!("building heap with {} unique pairs", pair_counts.len());

        let jobs: Vec<MergeJob<T, C>> = pair_counts
            .iter()
            .map(|(&pair, &count)| self.job(pair, count))
            .collect();

        self.heap = OctonaryHeap::from(jobs);
        self.pair_counts = pair_counts;
        self.pair_index = pair_index;
        self.state = EngineState::Counting;
    }

    /// Pop the winning pair, refreshing stale jobs.
    fn select(&mut self) -> Option<MergeJob<T, C>> {
        let zero = C::zero();
        while let Some(mut job) = self.heap.pop() {
            let current = self.pair_count(job.pair);
            if job.count == current {
                return Some(job);
            }
            if current > zero {
                job.count = current;
                self.heap.push(job);
            }
        }
        None
    }

    /// Replace every occurrence of `pair` with `symbol`, updating pair counts.
    fn rewrite(
        &mut self,
        pair: Pair<T>,
        symbol: T,
    ) {
        let Self {
            words,
            word_counts,
            pair_counts,
            pair_index,
            ..
        } = self;

        let zero = C::zero();
        let mut increased: CommonHashSet<Pair<T>> = CommonHashSet::default();

        let word_indices = pair_index.remove(&pair).unwrap_or_default();
        for word_idx in word_indices {
            let count = word_counts[word_idx];

            words[word_idx].merge_pair_cb(pair, symbol, &mut |p, delta| {
                if delta < 0 {
                    if let Some(c) = pair_counts.get_mut(&p) {
                        *c -= count;
                        if *c == zero {
                            pair_counts.remove(&p);
                            pair_index.remove(&p);
                        }
                    }
                } else {
                    *pair_counts.entry(p).or_default() += count;
                    pair_index.entry(p).or_default().insert(word_idx);
                    increased.insert(p);
                }
            });
        }

        // A pair whose count went up may now outrank its heap entry.
        for p in increased {
            let count = self.pair_count(p);
            if count > zero {
                let job = self.job(p, count);
                self.heap.push(job);
            }
        }
    }

    /// Apply one merge.
    ///
    /// ## Returns
    /// * `Some(record)` - the applied merge.
    /// * `None` - no adjacent pair remains, or the engine was finished;
    ///   the engine is [`EngineState::Terminal`].
    pub fn step(&mut self) -> BFResult<Option<MergeRecord<T, C>>> {
        if self.state == EngineState::Init {
            self.count_pairs();
        }
        if self.state == EngineState::Terminal {
            return Ok(None);
        }

        self.state = EngineState::Selecting;
        let Some(job) = self.select() else {
            self.state = EngineState::Terminal;
            return Ok(None);
        };

        self.state = EngineState::Rewriting;
        let (symbol, span) = self.symbols.intern_pair(job.pair)?;
        self.rewrite(job.pair, symbol);

        self.merges_done += 1;
        self.state = EngineState::Counting;

        Ok(Some(MergeRecord {
            pair: job.pair,
            left: job.left,
            right: job.right,
            symbol,
            span,
            count: job.count,
        }))
    }
}
