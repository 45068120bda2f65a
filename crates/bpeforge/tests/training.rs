#![allow(missing_docs)]

use std::{fs, path::Path};

use bpeforge::{
    BpeForgeError,
    io::{
        load_base64_merges_path,
        load_base64_vocab_path,
        write_base64_merges_path,
        write_base64_vocab_path,
    },
    training::{BpeTrainer, BpeTrainerOptions, CancelFlag, TrainResults, TrainStats},
};

const EOT: &str = "<|endoftext|>";

fn train(
    text: &str,
    special_tokens: &[&str],
    vocab_size: usize,
) -> TrainResults {
    let trainer: BpeTrainer = BpeTrainerOptions::new(vocab_size)
        .with_special_tokens(special_tokens)
        .init()
        .unwrap();
    trainer.train_bytes(text).unwrap()
}

fn merge(
    a: &[u8],
    b: &[u8],
) -> (Vec<u8>, Vec<u8>) {
    (a.to_vec(), b.to_vec())
}

/// Every merged entry is the concatenation of its rule; and both halves exist earlier.
fn assert_well_formed(results: &TrainResults) {
    let vocab = &results.vocab;
    assert_eq!(vocab.num_merged(), results.merges.len());

    for (k, (a, b)) in results.merges.iter().enumerate() {
        let id = vocab.first_merge_id() + k;
        assert_eq!(vocab.get(id), Some([a.as_slice(), b.as_slice()].concat().as_slice()));

        let earlier = |span: &[u8]| {
            vocab
                .iter()
                .skip(vocab.num_specials())
                .take(id - vocab.num_specials())
                .any(|(_, s)| s == span)
        };
        assert!(earlier(a), "merge {k}: {a:?} is not in the vocab");
        assert!(earlier(b), "merge {k}: {b:?} is not in the vocab");
    }
}

/// A deterministic corpus of documents separated by [`EOT`].
fn generate_corpus(target_len: usize) -> String {
    const SYLLABLES: &[&str] = &[
        "ka", "lo", "mi", "ne", "ru", "sa", "to", "wi", "est", "é", "ß", "東", "42", "'s", "!", "\n",
    ];

    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = move || {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut corpus = String::with_capacity(target_len + 64);
    while corpus.len() < target_len {
        let doc_len = 10 + (next() % 90) as usize;
        for i in 0..doc_len {
            if i > 0 {
                corpus.push(' ');
            }
            for _ in 0..1 + next() % 3 {
                corpus.push_str(SYLLABLES[(next() % SYLLABLES.len() as u64) as usize]);
            }
        }
        corpus.push_str(EOT);
    }
    corpus
}

#[test]
fn test_low_lower_newest_widest() {
    let results = train(
        "low low low low low lower newest newest newest newest newest newest widest widest widest",
        &[],
        256 + 6,
    );
    assert_well_formed(&results);

    assert_eq!(results.merges.len(), 6);
    assert_eq!(results.vocab.len(), 262);

    // (e, s) and (s, t) tie at 9; the greater pair wins.
    assert_eq!(results.merges[0], merge(b"s", b"t"));
    assert_eq!(results.merges[1], merge(b"e", b"st"));
    assert_eq!(results.vocab.get(257), Some(&b"est"[..]));
}

#[test]
fn test_special_tokens_split_documents() {
    let results = train("hello<|endoftext|>hello", &[EOT], 257 + 3);
    assert_well_formed(&results);

    assert_eq!(results.vocab.get(0), Some(EOT.as_bytes()));
    assert_eq!(results.merges.len(), 3);
    for (a, b) in &results.merges {
        let joined = [a.as_slice(), b.as_slice()].concat();
        assert!(
            b"hello".windows(joined.len()).any(|w| w == joined.as_slice()),
            "{joined:?} is not a substring of \"hello\""
        );
    }
}

#[test]
fn test_empty_input() {
    let results = train("", &[EOT], 1000);
    assert!(results.merges.is_empty());
    assert_eq!(results.vocab.len(), 257);
    assert_eq!(results.stats.num_pre_tokens, 0);
    assert_eq!(results.stats.total_pre_token_count, 0);

    let results = train("<|endoftext|><|endoftext|>", &[EOT], 1000);
    assert!(results.merges.is_empty());
    assert_eq!(results.vocab.len(), 257);
}

#[test]
fn test_greedy_overlap() {
    let results = train("aaaa", &[], 258);
    assert_eq!(
        results.merges,
        vec![merge(b"a", b"a"), merge(b"aa", b"aa")]
    );
    assert_eq!(results.vocab.get(257), Some(&b"aaaa"[..]));
}

#[test]
fn test_byte_level_symbols() {
    let results = train("é é é", &[], 258);
    assert_eq!(results.merges[0], merge(&[0xC3], &[0xA9]));
    assert_eq!(results.vocab.get(256), Some("é".as_bytes()));
}

#[test]
fn test_pair_tie_break() {
    let results = train("aa bb", &[], 257);
    assert_eq!(results.merges, vec![merge(b"b", b"b")]);
}

#[test]
fn test_zero_merge_budget() {
    let results = train("hello hello", &[EOT, "<|pad|>"], 258);
    assert!(results.merges.is_empty());
    assert_eq!(results.vocab.len(), 258);
    assert_eq!(results.vocab.get(1), Some(&b"<|pad|>"[..]));
    assert_eq!(results.vocab.get(2), Some(&[0u8][..]));
}

#[test]
fn test_duplicate_special_tokens() {
    let results = train("ab<s>ab", &["<s>", "<s>"], 259);
    assert_eq!(results.vocab.get(0), Some(&b"<s>"[..]));
    assert_eq!(results.vocab.get(1), Some(&b"<s>"[..]));
    assert_eq!(results.merges, vec![merge(b"a", b"b")]);
    assert_eq!(results.vocab.get(258), Some(&b"ab"[..]));
}

#[test]
fn test_invalid_config() {
    let err = BpeTrainerOptions::new(0).init::<u32, String, u64>();
    assert!(matches!(err, Err(BpeForgeError::InvalidConfig(_))));

    let err = BpeTrainerOptions::new(1000)
        .with_num_chunks(0)
        .init::<u32, String, u64>();
    assert!(matches!(err, Err(BpeForgeError::InvalidConfig(_))));
}

#[test]
fn test_chunking_does_not_change_results() {
    let corpus = generate_corpus(1 << 20);

    let dir = tempdir::TempDir::new("bpeforge_corpus").unwrap();
    let path = dir.path().join("corpus.txt");
    fs::write(&path, &corpus).unwrap();

    let train_path = |num_chunks: usize| {
        let trainer: BpeTrainer = BpeTrainerOptions::new(257 + 200)
            .with_special_tokens([EOT])
            .with_num_chunks(num_chunks)
            .init()
            .unwrap();
        trainer.train_path(&path).unwrap()
    };

    let one = train_path(1);
    let eight = train_path(8);

    assert_eq!(one.stats.num_chunks, 1);
    assert!(eight.stats.num_chunks > 1);
    assert_eq!(one.stats.num_pre_tokens, eight.stats.num_pre_tokens);
    assert_eq!(
        one.stats.total_pre_token_count,
        eight.stats.total_pre_token_count
    );

    assert_eq!(one.merges.len(), 200);
    assert_eq!(one.vocab, eight.vocab);
    assert_eq!(one.merges, eight.merges);
    assert_well_formed(&eight);

    let in_memory: BpeTrainer = BpeTrainerOptions::new(257 + 200)
        .with_special_tokens([EOT])
        .with_num_chunks(3)
        .init()
        .unwrap();
    assert_eq!(in_memory.train_bytes(&corpus).unwrap().merges, one.merges);
}

#[test]
fn test_chunking_with_nested_special_tokens() {
    let train_chunked = |text: &str, specials: &[&str], num_chunks: usize| {
        let trainer: BpeTrainer = BpeTrainerOptions::new(278)
            .with_special_tokens(specials)
            .with_num_chunks(num_chunks)
            .init()
            .unwrap();
        trainer.train_bytes(text).unwrap()
    };

    // "<|e|>" also occurs inside "zz<|e|>qq".
    let text = "hello world zz<|e|>qq ".repeat(200);
    let specials = ["<|e|>", "zz<|e|>qq"];
    let one = train_chunked(&text, &specials, 1);
    let eight = train_chunked(&text, &specials, 8);

    assert!(eight.stats.num_chunks > 1);
    assert_eq!(one.stats, TrainStats { num_chunks: 1, ..eight.stats });
    assert_eq!(one.vocab, eight.vocab);
    assert_eq!(one.merges, eight.merges);
    assert!(
        !one.merges
            .iter()
            .any(|(a, b)| a.contains(&b'z') || b.contains(&b'q'))
    );

    // A self-overlapping special token is never used to split.
    let text = "ab aaa cd aaaa ".repeat(300);
    let one = train_chunked(&text, &["aa"], 1);
    let eight = train_chunked(&text, &["aa"], 8);
    assert_eq!(eight.stats.num_chunks, 1);
    assert_eq!(one.merges, eight.merges);
}

#[test]
fn test_empty_file() {
    let dir = tempdir::TempDir::new("bpeforge_empty").unwrap();
    let path = dir.path().join("empty.txt");
    fs::write(&path, "").unwrap();

    let trainer: BpeTrainer = BpeTrainerOptions::new(1000)
        .with_special_tokens([EOT])
        .with_num_chunks(4)
        .init()
        .unwrap();
    let results = trainer.train_path(&path).unwrap();

    assert!(results.merges.is_empty());
    assert_eq!(results.vocab.len(), 257);
    assert_eq!(results.stats.num_chunks, 0);
}

#[test]
fn test_missing_file() {
    let trainer: BpeTrainer = BpeTrainerOptions::new(1000).init().unwrap();
    let res = trainer.train_path(Path::new("/definitely/not/a/corpus.txt"));
    assert!(matches!(res, Err(BpeForgeError::Io(_))));
}

#[test]
fn test_malformed_utf8_is_tolerated() {
    let mut bytes = b"abc abc ".to_vec();
    bytes.extend_from_slice(&[0xFF, 0xFE]);
    bytes.extend_from_slice(b" abc");

    let trainer: BpeTrainer = BpeTrainerOptions::new(261).init().unwrap();
    let results = trainer.train_bytes(&bytes).unwrap();
    assert_eq!(
        results.merges,
        vec![
            merge(b"b", b"c"),
            merge(b"a", b"bc"),
            merge(&[0xEF], &[0xBF]),
            merge(&[0xEF, 0xBF], &[0xBD]),
            merge(b" ", b"abc"),
        ]
    );
    // The invalid bytes were replaced by U+FFFD.
    assert_eq!(results.vocab.get(259), Some("\u{FFFD}".as_bytes()));
}

#[test]
fn test_cancellation() {
    let cancel = CancelFlag::new();
    let trainer: BpeTrainer = BpeTrainerOptions::new(1000)
        .init()
        .unwrap()
        .with_cancel_flag(cancel.clone());

    cancel.cancel();
    assert!(matches!(
        trainer.train_bytes(generate_corpus(10_000)),
        Err(BpeForgeError::Cancelled)
    ));
}

#[test]
fn test_dump_and_reload() {
    let results = train(&generate_corpus(50_000), &[EOT], 257 + 50);

    let dir = tempdir::TempDir::new("bpeforge_dump").unwrap();
    let vocab_path = dir.path().join("vocab.tiktoken");
    let merges_path = dir.path().join("merges.txt");

    write_base64_vocab_path(&results.vocab, &vocab_path).unwrap();
    write_base64_merges_path(&results.merges, &merges_path).unwrap();

    assert_eq!(load_base64_vocab_path(&vocab_path, 1).unwrap(), results.vocab);
    assert_eq!(load_base64_merges_path(&merges_path).unwrap(), results.merges);
}
