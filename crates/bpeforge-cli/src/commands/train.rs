use core::num::NonZeroUsize;
use std::io::Write;

use bpeforge::{
    concurrency::est_max_parallelism,
    io::{write_base64_merges, write_base64_vocab},
    training::{BpeTrainer, BpeTrainerOptions},
};

use crate::{LogArgs, input_output::open_writer};

/// Args for the train command.
#[derive(clap::Args, Debug)]
pub struct TrainArgs {
    /// Input corpus; UTF-8 text.
    input: String,

    #[clap(flatten)]
    pub logging: LogArgs,

    /// Target vocab size; includes the special tokens and the 256 byte tokens.
    #[arg(long, default_value = "10000")]
    vocab_size: usize,

    /// Special token; may be repeated. The first one also aligns chunk boundaries.
    #[arg(long = "special-token", value_name = "TOKEN")]
    special_tokens: Vec<String>,

    /// Desired number of input chunks; defaults to the available parallelism.
    #[arg(long)]
    num_chunks: Option<usize>,

    /// Max pre-tokenization worker threads.
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Vocab output file; "-" or unset writes to stdout.
    #[arg(long)]
    vocab_output: Option<String>,

    /// Merges output file.
    #[arg(long)]
    merges_output: Option<String>,
}

impl TrainArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let options = BpeTrainerOptions::new(self.vocab_size)
            .with_special_tokens(&self.special_tokens)
            .with_num_chunks(self.num_chunks.unwrap_or_else(est_max_parallelism))
            .with_max_threads(self.threads);

        let trainer: BpeTrainer = options.init()?;

        log::info!("training on: {}", self.input);
        let results = trainer.train_path(&self.input)?;

        log::info!(
            "vocab size: {} ({} merges; {} distinct pre-tokens over {} chunks)",
            results.vocab.len(),
            results.merges.len(),
            results.stats.num_pre_tokens,
            results.stats.num_chunks
        );

        if let Some(path) = &self.vocab_output {
            log::info!("vocab output: {path}");
        }
        let mut writer = open_writer(&self.vocab_output)?;
        write_base64_vocab(&results.vocab, &mut writer)?;
        writer.flush()?;

        if let Some(path) = &self.merges_output {
            log::info!("merges output: {path}");
            let mut writer = open_writer(&self.merges_output)?;
            write_base64_merges(&results.merges, &mut writer)?;
            writer.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::{Args, commands::Commands};

    #[test]
    fn test_parse_train_args() {
        let args = Args::try_parse_from([
            "bpeforge",
            "train",
            "corpus.txt",
            "--vocab-size",
            "500",
            "--special-token",
            "<|endoftext|>",
            "--special-token",
            "<|pad|>",
            "--threads",
            "2",
            "--merges-output",
            "merges.txt",
            "-vv",
        ])
        .unwrap();

        let Commands::Train(train) = args.command;
        assert_eq!(train.input, "corpus.txt");
        assert_eq!(train.vocab_size, 500);
        assert_eq!(train.special_tokens, vec!["<|endoftext|>", "<|pad|>"]);
        assert_eq!(train.num_chunks, None);
        assert_eq!(train.threads.map(|t| t.get()), Some(2));
        assert_eq!(train.vocab_output, None);
        assert_eq!(train.merges_output.as_deref(), Some("merges.txt"));
        assert_eq!(train.logging.verbose, 2);
        assert!(!train.logging.quiet);

        assert!(Args::try_parse_from(["bpeforge", "train", "x", "--threads", "0"]).is_err());
    }
}
