//! Integrity checks for pinyin.bin / pinyin-words.bin
//!
//! Usage: cargo run --release --bin verify_index -- [--dir data] [--samples 1000]

use anyhow::{Context, Result};
use clap::Parser;
use pinyin_index::{init_tracing, CharIndex, WordIndex};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "verify_index", about = "Check the pinyin indexes for format invariants.")]
struct Args {
    #[clap(short, long, default_value = "data")]
    dir: PathBuf,

    #[clap(long, default_value = "pinyin.bin")]
    chars: String,

    #[clap(long, default_value = "pinyin-words.bin")]
    words: String,

    /// Random lookups per index.
    #[clap(long, default_value_t = 1000)]
    samples: usize,

    #[clap(long, default_value_t = 1)]
    seed: u64,
}

fn status(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let chars_path = args.dir.join(&args.chars);
    let words_path = args.dir.join(&args.words);
    let chars_raw = fs::read(&chars_path).with_context(|| format!("read {}", chars_path.display()))?;
    let words_raw = fs::read(&words_path).with_context(|| format!("read {}", words_path.display()))?;

    let chars = CharIndex::parse(&chars_raw).with_context(|| format!("parse {}", chars_path.display()))?;
    let words = WordIndex::parse(&words_raw).with_context(|| format!("parse {}", words_path.display()))?;

    let mut failed = 0usize;
    let mut check = |name: &str, detail: String, ok: bool| {
        println!("  {name}: {detail} {}", status(ok));
        if !ok {
            failed += 1;
        }
    };

    println!("=== FORMAT ===");
    check(
        "pinyin.bin re-encodes identically",
        format!("{} bytes", chars_raw.len()),
        chars.encode()? == chars_raw,
    );
    check(
        "pinyin-words.bin re-encodes identically",
        format!("{} bytes", words_raw.len()),
        words.encode()? == words_raw,
    );

    println!("\n=== READINGS ===");
    let unique: HashSet<&str> = chars.readings.spellings().iter().map(|s| s.as_str()).collect();
    check(
        "unique spellings",
        format!("{}/{}", unique.len(), chars.readings.len()),
        unique.len() == chars.readings.len(),
    );
    let reserved_tones = chars
        .entries
        .iter()
        .flat_map(|e| e.readings.iter())
        .chain(words.entries.iter().flat_map(|e| e.readings.iter()))
        .filter(|id| id.tone().is_none())
        .count();
    check(
        "tones within 0..=4",
        format!("{reserved_tones} reserved codes"),
        reserved_tones == 0,
    );
    let word_ids_ok = words
        .max_base_id()
        .map_or(true, |m| (m as usize) < chars.readings.len());
    check(
        "word readings resolve in pinyin.bin",
        format!("max base id {:?}", words.max_base_id()),
        word_ids_ok,
    );

    println!("\n=== RECORDS ===");
    let distinct_chars: HashSet<char> = chars.entries.iter().map(|e| e.ch).collect();
    check(
        "no duplicate characters",
        format!("{}/{}", distinct_chars.len(), chars.len()),
        distinct_chars.len() == chars.len(),
    );
    let distinct_seqs: HashSet<&[_]> = words.entries.iter().map(|e| e.readings.as_slice()).collect();
    check(
        "no duplicate sequences",
        format!("{}/{}", distinct_seqs.len(), words.len()),
        distinct_seqs.len() == words.len(),
    );
    let dup_words = words
        .entries
        .iter()
        .filter(|e| e.words.iter().collect::<HashSet<_>>().len() != e.words.len())
        .count();
    check("no duplicate words per sequence", format!("{dup_words} groups"), dup_words == 0);
    let empty_groups = words.entries.iter().filter(|e| e.words.is_empty()).count();
    check("no empty word groups", format!("{empty_groups} groups"), empty_groups == 0);

    println!("\n=== RANDOM LOOKUPS (seed {}) ===", args.seed);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut misses = 0usize;
    if !chars.is_empty() {
        for _ in 0..args.samples {
            let e = &chars.entries[rng.gen_range(0..chars.len())];
            if chars.get(e.ch) != Some(e) {
                misses += 1;
            }
        }
    }
    if !words.is_empty() {
        for _ in 0..args.samples {
            let e = &words.entries[rng.gen_range(0..words.len())];
            if words.lookup(&e.readings) != Some(e.words.as_slice()) {
                misses += 1;
            }
        }
    }
    check("sampled lookups", format!("{misses} misses"), misses == 0);

    if failed > 0 {
        anyhow::bail!("Integrity check failed with {failed} errors");
    }
    println!("\nOK: all checks passed.");
    Ok(())
}
