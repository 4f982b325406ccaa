//! Read pinyin.bin / pinyin-words.bin back and look things up
//!
//! Usage:
//!   cargo run --release --bin dump_index -- [--dir data] [中 | shang1 yang1 | --prefix zh]

use anyhow::{Context, Result};
use clap::Parser;
use pinyin_index::quantize::log_frequency;
use pinyin_index::{init_tracing, normalize, CharIndex, Lexicon, PackedReadingId, WordIndex};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "dump_index", about = "Inspect the pinyin indexes.")]
struct Args {
    #[clap(short, long, default_value = "data")]
    dir: PathBuf,

    #[clap(long, default_value = "pinyin.bin")]
    chars: String,

    #[clap(long, default_value = "pinyin-words.bin")]
    words: String,

    /// List base spellings starting with this prefix.
    #[clap(long)]
    prefix: Option<String>,

    /// A character, or a sequence of syllables (`shang1 yang1`, `shāng yāng`).
    query: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let chars_path = args.dir.join(&args.chars);
    let words_path = args.dir.join(&args.words);
    let chars = CharIndex::open(&chars_path)
        .with_context(|| format!("open {}", chars_path.display()))?;
    let words = WordIndex::open(&words_path)
        .with_context(|| format!("open {}", words_path.display()))?;

    println!("=== {} ===", chars_path.display());
    println!("Readings:   {}", chars.readings.len());
    println!("Characters: {}", chars.len());
    println!("=== {} ===", words_path.display());
    println!("Sequences:  {}", words.len());
    println!("Words:      {}", words.word_count());

    let lexicon = Lexicon::from_table(&chars.readings).context("build spelling lexicon")?;

    if let Some(prefix) = &args.prefix {
        println!("\n=== Spellings with prefix '{}' ===", prefix);
        for (spelling, id) in lexicon.with_prefix(prefix, 50) {
            println!("  {:6} id={}", spelling, id);
        }
    }

    let query = args.query.join(" ");
    let mut it = query.chars();
    match (it.next(), it.next()) {
        (None, _) => {}
        (Some(c), None) if !c.is_ascii() => print_char(&chars, c),
        _ => print_sequence(&chars, &lexicon, &words, &query)?,
    }
    Ok(())
}

fn print_char(index: &CharIndex, c: char) {
    println!("\n=== Lookup: '{}' (U+{:04X}) ===", c, c as u32);
    match index.get(c) {
        Some(e) => {
            println!(
                "weight={} (ln(count+1.1)={:.3})",
                e.weight,
                log_frequency(e.weight)
            );
            let readings = index.readings_of(c);
            if readings.is_empty() {
                println!("No readings");
            } else {
                println!("Readings: {}", readings.join(", "));
            }
        }
        None => println!("Character not in index"),
    }
}

fn print_sequence(index: &CharIndex, lexicon: &Lexicon, words: &WordIndex, query: &str) -> Result<()> {
    println!("\n=== Lookup: {} ===", query);
    let mut seq = Vec::new();
    for syllable in query.split_whitespace() {
        let r = normalize(syllable).with_context(|| format!("normalize {syllable:?}"))?;
        match lexicon.get(&r.base) {
            Some(id) => seq.push(PackedReadingId::pack(id, r.tone.as_u8())),
            None => {
                println!("'{}' is not a known spelling", r.base);
                return Ok(());
            }
        }
    }

    match words.lookup(&seq) {
        Some(ws) => println!("Exact: {}", ws.join(" ")),
        None => println!("Exact: (none)"),
    }

    let bases: Vec<u16> = seq.iter().map(|id| id.base_id()).collect();
    for (i, e) in words.lookup_untoned(&bases).take(20).enumerate() {
        let spelled: Vec<String> = e
            .readings
            .iter()
            .map(|&id| index.readings.render(id).unwrap_or_else(|| "?".into()))
            .collect();
        println!("  {:2}. [{}] {}", i + 1, spelled.join(" "), e.words.join(" "));
    }
    Ok(())
}
