//! # `bpeforge` BPE Tokenizer Trainer
//!
//! Trains a byte-level byte-pair encoding (BPE) vocabulary from a UTF-8
//! text corpus.
//!
//! Training produces:
//! * a vocabulary: ``{ id -> bytes }``, densely allocated from 0;
//! * an ordered list of merge rules ``(A, B)``.
//!
//! The vocabulary layout is fixed:
//! * the special tokens, in the order given;
//! * the 256 single-byte symbols, in byte order;
//! * one entry per merge rule, in merge order.
//!
//! See:
//! * [`chunking`] to split a large input into independently countable chunks.
//! * [`training`] for pre-tokenization, pair merging, and the [`training::BpeTrainer`] session.
//! * [`io`] to dump trained vocabularies and merge lists.
//!
//! ## Crate Features
//!
//! #### feature: ``ahash``
//!
//! This swaps all HashMap/HashSet implementations for ``ahash``; which is a performance
//! win on many/(most?) modern CPUs.
//!
//! #### feature: ``tracing``
//!
//! This enables a number of ``tracing`` instrumentation points.
//! This is only useful for timing tracing of the library itself.
//!
//! ## Training Example
//!
//! ```rust,no_run
//! use bpeforge::training::{BpeTrainer, BpeTrainerOptions};
//!
//! fn example(path: &str) -> bpeforge::errors::BFResult<()> {
//!     let trainer: BpeTrainer = BpeTrainerOptions::new(10_000)
//!         .with_special_tokens(["<|endoftext|>"])
//!         .with_num_chunks(16)
//!         .init()?;
//!
//!     let results = trainer.train_path(path)?;
//!
//!     assert_eq!(results.vocab.get(0), Some(&b"<|endoftext|>"[..]));
//!     println!("learned {} merges", results.merges.len());
//!     Ok(())
//! }
//! ```
#![warn(missing_docs, unused)]

pub mod chunking;
pub mod concurrency;
pub mod errors;
pub mod io;
pub mod regex;
pub mod training;
pub mod types;

#[doc(inline)]
pub use errors::{BFResult, BpeForgeError};
#[doc(inline)]
pub use training::{BpeTrainer, BpeTrainerOptions, BpeVocab, TrainResults};
