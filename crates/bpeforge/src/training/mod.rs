//! # Vocabulary Training
//!
//! Training runs in two phases:
//! * pre-tokenization, in parallel over marker-aligned input chunks;
//!   each chunk yields a [`SpanCountTable`], and the tables are summed;
//! * the merge loop, single-threaded, in [`MergeEngine`].
//!
//! The [`BpeTrainer`] session drives both phases, and assembles the
//! [`BpeVocab`] with a [`VocabBuilder`].
//!
//! Results are deterministic given the input bytes, the special tokens,
//! and the vocab size; they do not depend on the number of chunks or workers.
//!
//! ## Training Example
//!
//! Expect pre-tokenization to scale with the worker count; the merge loop
//! runs on one thread.
//!
//! ```rust,no_run
//! use bpeforge::{
//!     io::{write_base64_merges_path, write_base64_vocab_path},
//!     training::{BpeTrainer, BpeTrainerOptions},
//! };
//!
//! fn example(
//!     corpus_path: &str,
//!     vocab_size: usize,
//! ) -> bpeforge::BFResult<()> {
//!     // We can pick any unsigned integer type > vocab_size;
//!     // See [`bpeforge::types::TokenType`].
//!     type T = u32;
//!
//!     let trainer: BpeTrainer<T> = BpeTrainerOptions::new(vocab_size)
//!         .with_special_tokens(["<|endoftext|>"])
//!         .init()?;
//!
//!     let results = trainer.train_path(corpus_path)?;
//!
//!     write_base64_vocab_path(&results.vocab, "vocab.tiktoken")?;
//!     write_base64_merges_path(&results.merges, "merges.txt")?;
//!     Ok(())
//! }
//! ```

pub mod utility;

mod bpe_trainer;
mod cancel;
mod merge_engine;
mod pre_tokenizer;
mod span_counts;
mod training_types;
mod vocab_builder;

#[doc(inline)]
pub use bpe_trainer::{BpeTrainer, BpeTrainerOptions, TrainResults, TrainStats};
#[doc(inline)]
pub use cancel::CancelFlag;
#[doc(inline)]
pub use merge_engine::{EngineState, MergeEngine, MergeJob, MergeRecord};
#[doc(inline)]
pub use pre_tokenizer::PreTokenizer;
#[doc(inline)]
pub use span_counts::{SpanCountTable, merge_span_counts};
#[doc(inline)]
pub use training_types::{CountType, StringChunkType};
#[doc(inline)]
pub use vocab_builder::{BpeVocab, U8_SIZE, VocabBuilder};
