//! Build pinyin.bin and pinyin-words.bin from the upstream tables
//!
//! Usage:
//!   cargo run --release --bin pinyin_index -- \
//!     --chars build/chars.txt --readings build/pinyin.txt \
//!     --phrases build/large_pinyin.txt --out-dir data

use anyhow::{Context, Result};
use clap::Parser;
use pinyin_index::sources::SourceEncoding;
use pinyin_index::{init_tracing, IndexBuild, Sources};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "pinyin_index", about = "Build the pinyin character and word indexes.")]
struct Args {
    /// Character frequency corpus (tab-separated, 6 columns). `.gz` is accepted.
    #[clap(long)]
    chars: Option<PathBuf>,

    /// Encoding of the frequency corpus.
    #[clap(long, default_value = "gb18030")]
    chars_encoding: SourceEncoding,

    /// Per-character readings (`U+4E2D: zhōng,zhòng`).
    #[clap(long)]
    readings: Option<PathBuf>,

    /// Phrase readings (`商鞅: shāng yāng`). May be repeated; groups merge.
    #[clap(long)]
    phrases: Vec<PathBuf>,

    /// Output directory.
    #[clap(short, long, default_value = "data")]
    out_dir: PathBuf,

    #[clap(long, default_value = "pinyin.bin")]
    chars_out: String,

    #[clap(long, default_value = "pinyin-words.bin")]
    words_out: String,

    /// Write a JSON build report here.
    #[clap(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.chars.is_none() && args.readings.is_none() && args.phrases.is_empty() {
        anyhow::bail!("nothing to build: pass at least one of --chars, --readings, --phrases");
    }

    let sources = Sources {
        frequency: args.chars.clone(),
        frequency_encoding: args.chars_encoding,
        readings: args.readings.clone(),
        phrases: args.phrases.clone(),
    };

    println!("[1/3] Loading sources...");
    let (chars, words) = sources.load().context("load sources")?;
    println!("  {} characters, {} reading sequences", chars.len(), words.len());

    println!("\n[2/3] Building indexes...");
    let mut build = IndexBuild::new();
    build.add_characters(&chars).context("build character index")?;
    build.add_words(&words).context("build word index")?;
    println!("  {} distinct base spellings", build.readings().len());
    let built = build.finish().context("serialize indexes")?;

    println!("\n[3/3] Publishing...");
    let chars_path = args.out_dir.join(&args.chars_out);
    let words_path = args.out_dir.join(&args.words_out);
    let report = built
        .publish(&chars_path, &words_path)
        .with_context(|| format!("publish into {}", args.out_dir.display()))?;

    println!(
        "✓ {} created ({} characters, {} readings, {:.1} KB)",
        chars_path.display(),
        report.character_count,
        report.reading_count,
        report.char_index_bytes as f64 / 1000.0
    );
    println!(
        "✓ {} created ({} sequences, {} words, {:.1} KB)",
        words_path.display(),
        report.sequence_count,
        report.word_count,
        report.word_index_bytes as f64 / 1000.0
    );
    if report.characters_without_readings > 0 {
        println!(
            "  note: {} characters have no reading",
            report.characters_without_readings
        );
    }

    if let Some(p) = &args.report {
        let f = File::create(p).with_context(|| format!("create {}", p.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(f), &report).context("write report")?;
        println!("✓ report written to {}", p.display());
    }
    Ok(())
}
