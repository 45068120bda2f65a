//! # BPE Trainer

use core::{marker::PhantomData, num::NonZeroUsize};
use std::{
    borrow::Cow,
    fs::File,
    io::{Cursor, Read, Seek},
    path::Path,
};

use compact_str::CompactString;
use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::{
    chunking::{ChunkRange, chunk_ranges, find_chunk_boundaries, read_chunk_lossy},
    concurrency::{est_max_parallelism, run_in_pool},
    errors::{BFResult, BpeForgeError},
    regex::RegexWrapperPattern,
    training::{
        BpeVocab,
        CancelFlag,
        CountType,
        MergeEngine,
        PreTokenizer,
        SpanCountTable,
        StringChunkType,
        U8_SIZE,
        VocabBuilder,
        merge_span_counts,
    },
    types::{Pair, SpanPair, TokenType},
};

/// Options for [`BpeTrainer`].
#[derive(Debug, Clone, PartialEq)]
pub struct BpeTrainerOptions {
    /// The regex pattern used for pre-tokenization.
    pub pattern: RegexWrapperPattern,

    /// The target vocab size, including special tokens and the 256 bytes.
    pub vocab_size: usize,

    /// The special tokens, in id order.
    pub special_tokens: Vec<String>,

    /// The desired number of input chunks; an upper bound.
    pub num_chunks: usize,

    /// The max number of pre-tokenization workers.
    ///
    /// When unset, the global ``rayon`` pool is used.
    pub max_threads: Option<NonZeroUsize>,
}

impl BpeTrainerOptions {
    /// Create new options.
    ///
    /// ## Arguments
    /// * `vocab_size` - The target vocabulary size.
    ///
    /// ## Returns
    /// Options using [`crate::regex::PRETOKEN_PATTERN`], no special tokens,
    /// and one chunk per available core.
    pub fn new(vocab_size: usize) -> Self {
        Self {
            pattern: RegexWrapperPattern::pretoken(),
            vocab_size,
            special_tokens: Vec::new(),
            num_chunks: est_max_parallelism(),
            max_threads: None,
        }
    }

    /// Sets the vocab size.
    pub fn with_vocab_size(
        self,
        vocab_size: usize,
    ) -> Self {
        Self { vocab_size, ..self }
    }

    /// Sets the special tokens.
    ///
    /// Duplicates are kept, and receive distinct ids.
    pub fn with_special_tokens<I, S>(
        self,
        special_tokens: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            special_tokens: special_tokens
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
            ..self
        }
    }

    /// Sets the desired number of input chunks.
    pub fn with_num_chunks(
        self,
        num_chunks: usize,
    ) -> Self {
        Self { num_chunks, ..self }
    }

    /// Sets the max number of pre-tokenization workers.
    pub fn with_max_threads(
        self,
        max_threads: Option<NonZeroUsize>,
    ) -> Self {
        Self {
            max_threads,
            ..self
        }
    }

    /// Sets the pre-tokenization pattern.
    ///
    /// The pattern is compiled by [`BpeTrainerOptions::init`].
    pub fn with_pattern<P: Into<RegexWrapperPattern>>(
        self,
        pattern: P,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            ..self
        }
    }

    /// The size of the seed vocabulary: ``specials + 256``.
    pub fn seed_size(&self) -> usize {
        self.special_tokens.len() + U8_SIZE
    }

    /// The max number of merges to learn.
    pub fn num_merges(&self) -> usize {
        self.vocab_size.saturating_sub(self.seed_size())
    }

    /// The marker chunk boundaries are aligned to.
    ///
    /// This is the first non-empty special token which no special token
    /// occurrence can straddle: no special token (the marker included)
    /// overlaps the marker's start at a non-zero offset. Every occurrence
    /// of such a marker begins a special token match in the unchunked text.
    ///
    /// Without one, the input is read as a single chunk.
    pub fn split_marker(&self) -> Option<&[u8]> {
        let specials = || {
            self.special_tokens
                .iter()
                .map(|s| s.as_bytes())
                .filter(|s| !s.is_empty())
        };

        specials().find(|marker| {
            specials().all(|special| {
                (1..special.len()).all(|k| {
                    let tail = &special[k..];
                    !(tail.starts_with(marker) || marker.starts_with(tail))
                })
            })
        })
    }

    /// Check the options against the token type `T`.
    pub fn validate<T: TokenType>(&self) -> BFResult<()> {
        if self.vocab_size == 0 {
            return Err(BpeForgeError::InvalidConfig(
                "vocab_size must be >= 1".to_string(),
            ));
        }
        if self.num_chunks == 0 {
            return Err(BpeForgeError::InvalidConfig(
                "num_chunks must be >= 1".to_string(),
            ));
        }

        let size = self.vocab_size.max(self.seed_size());
        if T::from_usize(size - 1).is_none() {
            return Err(BpeForgeError::VocabSizeOverflow { size });
        }
        Ok(())
    }

    /// Initializes a [`BpeTrainer`] from these options.
    pub fn init<T, K, C>(self) -> BFResult<BpeTrainer<T, K, C>>
    where
        T: TokenType,
        K: StringChunkType,
        C: CountType,
    {
        BpeTrainer::new(self)
    }
}

/// Pre-tokenization statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainStats {
    /// The number of chunks the input was split into.
    ///
    /// Zero when the counts were supplied directly.
    pub num_chunks: usize,

    /// The number of distinct pre-tokens.
    pub num_pre_tokens: usize,

    /// The total number of pre-token occurrences.
    pub total_pre_token_count: u64,
}

/// Trained vocabulary and merges.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainResults {
    /// The vocabulary.
    pub vocab: BpeVocab,

    /// The merge rules, in the order learned.
    pub merges: Vec<SpanPair>,

    /// Pre-tokenization statistics.
    pub stats: TrainStats,
}

impl TrainResults {
    /// The merges as ``((id(A), id(B)), id(A ++ B))`` triples.
    ///
    /// See [`BpeVocab::merges_as_pairs`].
    pub fn merges_as_pairs<T: TokenType>(&self) -> BFResult<Vec<(Pair<T>, T)>> {
        self.vocab.merges_as_pairs(&self.merges)
    }
}

/// A BPE training session.
///
/// Drives boundary finding, parallel pre-tokenization, count merging,
/// the merge loop, and vocabulary assembly.
///
/// # Parameters
/// * `T` - the token id type.
/// * `K` - the type used to store pre-token text.
/// * `C` - the type used to store counts.
#[derive(Debug, Clone)]
pub struct BpeTrainer<T = u32, K = CompactString, C = u64>
where
    T: TokenType,
    K: StringChunkType,
    C: CountType,
{
    options: BpeTrainerOptions,
    pre_tokenizer: PreTokenizer,
    cancel: CancelFlag,
    _marker: PhantomData<fn() -> (T, K, C)>,
}

impl<T, K, C> BpeTrainer<T, K, C>
where
    T: TokenType,
    K: StringChunkType,
    C: CountType,
{
    /// Initializes a [`BpeTrainer`].
    ///
    /// ## Errors
    /// * invalid options, see [`BpeTrainerOptions::validate`];
    /// * a pattern which does not compile.
    pub fn new(options: BpeTrainerOptions) -> BFResult<Self> {
        options.validate::<T>()?;

        let pre_tokenizer = PreTokenizer::new(options.pattern.clone(), &options.special_tokens)?;

        Ok(Self {
            options,
            pre_tokenizer,
            cancel: CancelFlag::new(),
            _marker: PhantomData,
        })
    }

    /// Replace the cancellation flag.
    pub fn with_cancel_flag(
        self,
        cancel: CancelFlag,
    ) -> Self {
        Self { cancel, ..self }
    }

    /// The trainer options.
    pub fn options(&self) -> &BpeTrainerOptions {
        &self.options
    }

    /// The pre-tokenizer.
    pub fn pre_tokenizer(&self) -> &PreTokenizer {
        &self.pre_tokenizer
    }

    /// The cancellation flag; cancel a clone of it to stop training.
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    fn boundaries<R: Read + Seek>(
        &self,
        source: &mut R,
    ) -> BFResult<Vec<ChunkRange>> {
        let marker = self.options.split_marker().unwrap_or_default();
        let boundaries = find_chunk_boundaries(source, self.options.num_chunks, marker)?;
        Ok(chunk_ranges(&boundaries))
    }

    /// Pre-tokenize every chunk in parallel, and merge the counts.
    fn count_chunks<S, F>(
        &self,
        ranges: &[ChunkRange],
        load: F,
    ) -> BFResult<SpanCountTable<K, C>>
    where
        S: AsRef<str>,
        F: Fn(usize, ChunkRange) -> BFResult<S> + Sync,
    {
        log::info!("pre-tokenizing {} chunks", ranges.len());

        let tables = run_in_pool(self.options.max_threads, || {
            ranges
                .par_iter()
                .enumerate()
                .map(|(idx, &range)| {
                    self.cancel.check()?;

                    let text = load(idx, range)?;
                    let table: SpanCountTable<K, C> =
                        self.pre_tokenizer.pre_tokenize(text.as_ref())?;

                    log::debug!(
                        "chunk {idx} [{}, {}): {} distinct pre-tokens",
                        range.start,
                        range.end,
                        table.len()
                    );
                    Ok(table)
                })
                .collect::<BFResult<Vec<_>>>()
        })??;

        let table = merge_span_counts(tables);
        log::info!(
            "counted {} distinct pre-tokens ({} total)",
            table.len(),
            table.total_count()
        );
        Ok(table)
    }

    /// Count the pre-tokens of a file.
    ///
    /// Each worker opens the file for itself.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, path)))]
    pub fn count_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> BFResult<(SpanCountTable<K, C>, usize)> {
        let path = path.as_ref();
        let ranges = self.boundaries(&mut File::open(path)?)?;

        let table = self.count_chunks(&ranges, |_, range| {
            let mut file = File::open(path)?;
            read_chunk_lossy(&mut file, range)
        })?;
        Ok((table, ranges.len()))
    }

    /// Count the pre-tokens of a seekable reader.
    ///
    /// Chunks are read sequentially; then pre-tokenized in parallel.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn count_reader<R: Read + Seek>(
        &self,
        reader: &mut R,
    ) -> BFResult<(SpanCountTable<K, C>, usize)> {
        let ranges = self.boundaries(reader)?;

        let mut texts = Vec::with_capacity(ranges.len());
        for &range in &ranges {
            self.cancel.check()?;
            texts.push(read_chunk_lossy(reader, range)?);
        }

        let table = self.count_chunks(&ranges, |idx, _| Ok(texts[idx].as_str()))?;
        Ok((table, ranges.len()))
    }

    /// Count the pre-tokens of an in-memory corpus.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn count_bytes(
        &self,
        bytes: &[u8],
    ) -> BFResult<(SpanCountTable<K, C>, usize)> {
        let ranges = self.boundaries(&mut Cursor::new(bytes))?;

        let table = self.count_chunks(&ranges, |_, range| {
            Ok::<Cow<str>, BpeForgeError>(String::from_utf8_lossy(
                &bytes[range.start as usize..range.end as usize],
            ))
        })?;
        Ok((table, ranges.len()))
    }

    /// Train on a file.
    pub fn train_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> BFResult<TrainResults> {
        let (table, num_chunks) = self.count_path(path)?;
        self.train_counted(&table, num_chunks)
    }

    /// Train on a seekable reader.
    pub fn train_reader<R: Read + Seek>(
        &self,
        reader: &mut R,
    ) -> BFResult<TrainResults> {
        let (table, num_chunks) = self.count_reader(reader)?;
        self.train_counted(&table, num_chunks)
    }

    /// Train on an in-memory corpus.
    pub fn train_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
    ) -> BFResult<TrainResults> {
        let (table, num_chunks) = self.count_bytes(bytes.as_ref())?;
        self.train_counted(&table, num_chunks)
    }

    /// Train on pre-computed pre-token counts.
    pub fn train_span_counts(
        &self,
        table: &SpanCountTable<K, C>,
    ) -> BFResult<TrainResults> {
        self.train_counted(table, 0)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, table)))]
    fn train_counted(
        &self,
        table: &SpanCountTable<K, C>,
        num_chunks: usize,
    ) -> BFResult<TrainResults> {
        let stats = TrainStats {
            num_chunks,
            num_pre_tokens: table.len(),
            total_pre_token_count: table.total_count().to_u64().unwrap_or(u64::MAX),
        };

        let mut builder = VocabBuilder::new(&self.options.special_tokens);

        let num_merges = self.options.num_merges();
        if self.options.vocab_size < builder.seed_size() {
            log::warn!(
                "vocab_size ({}) is below the seed vocabulary size ({}); no merges will be learned",
                self.options.vocab_size,
                builder.seed_size()
            );
        }

        let mut merges: Vec<SpanPair> = Vec::with_capacity(num_merges);

        if num_merges > 0 {
            log::info!("starting BPE training: {num_merges} merges to compute");

            let mut engine: MergeEngine<T, C> = MergeEngine::from_span_counts(table);
            let mut last_log_percent = 0;

            while merges.len() < num_merges {
                self.cancel.check()?;

                let Some(record) = engine.step()? else {
                    break;
                };

                builder.push_merge(&record.left, &record.right);
                merges.push((record.left.to_vec(), record.right.to_vec()));

                // Log progress every 1%
                let current_percent = (merges.len() * 100) / num_merges;
                if current_percent > last_log_percent {
                    log::info!(
                        "progress: {}% ({}/{} merges) - last merge: {:?} + {:?} (frequency: {})",
                        current_percent,
                        merges.len(),
                        num_merges,
                        String::from_utf8_lossy(&record.left),
                        String::from_utf8_lossy(&record.right),
                        record.count
                    );
                    last_log_percent = current_percent;
                }
            }
            engine.finish();

            if merges.len() < num_merges {
                log::warn!(
                    "vocab_size ({}) is unreachable: no pairs remain after {} merges",
                    self.options.vocab_size,
                    merges.len()
                );
            }
        }

        log::info!("finished training: {} merges completed", merges.len());

        Ok(TrainResults {
            vocab: builder.build(),
            merges,
            stats,
        })
    }
}
