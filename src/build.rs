//! One build run: owns the reading table both builders intern into.

use crate::char_index::{self, CharEntry};
use crate::error::Result;
use crate::publish::{publish, Output};
use crate::reading_table::ReadingTable;
use crate::sources::{
    load_text, merge_chars, merge_phrases, parse_frequency, parse_phrases, parse_readings,
    CharTable, SourceEncoding, WordTable,
};
use crate::word_index::{self, WordEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the upstream tables live. Any of them may be absent.
#[derive(Debug, Clone)]
pub struct Sources {
    pub frequency: Option<PathBuf>,
    pub frequency_encoding: SourceEncoding,
    pub readings: Option<PathBuf>,
    pub phrases: Vec<PathBuf>,
}

impl Sources {
    /// Parse and merge every configured source.
    pub fn load(&self) -> Result<(CharTable, WordTable)> {
        let frequency = match &self.frequency {
            Some(p) => parse_frequency(&load_text(p, self.frequency_encoding)?, &name(p))?,
            None => Vec::new(),
        };
        let readings = match &self.readings {
            Some(p) => parse_readings(&load_text(p, SourceEncoding::Utf8)?, &name(p))?,
            None => Vec::new(),
        };
        let chars = merge_chars(&frequency, &readings);

        let mut words = WordTable::new();
        for p in &self.phrases {
            let rows = parse_phrases(&load_text(p, SourceEncoding::Utf8)?, &name(p))?;
            merge_phrases(&mut words, &rows)?;
        }
        info!(
            characters = chars.len(),
            sequences = words.len(),
            "sources merged"
        );
        Ok((chars, words))
    }
}

fn name(p: &Path) -> String {
    p.display().to_string()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub reading_count: usize,
    pub character_count: usize,
    pub characters_without_readings: usize,
    pub max_count: u64,
    pub max_weight: u16,
    pub sequence_count: usize,
    pub word_count: usize,
    pub char_index_bytes: usize,
    pub word_index_bytes: usize,
}

/// Build state shared by the character and word builders.
#[derive(Debug, Default)]
pub struct IndexBuild {
    readings: ReadingTable,
    chars: Vec<CharEntry>,
    words: Vec<WordEntry>,
    max_count: u64,
}

impl IndexBuild {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_characters(&mut self, table: &CharTable) -> Result<()> {
        let entries = char_index::build_entries(table, &mut self.readings)?;
        self.max_count = table.iter().map(|r| r.count).fold(self.max_count, u64::max);
        self.chars.extend(entries);
        Ok(())
    }

    pub fn add_words(&mut self, table: &WordTable) -> Result<()> {
        let entries = word_index::build_entries(table, &mut self.readings)?;
        self.words.extend(entries);
        Ok(())
    }

    pub fn readings(&self) -> &ReadingTable {
        &self.readings
    }

    /// Serialize both files. The reading table is frozen from here on.
    pub fn finish(self) -> Result<BuiltIndexes> {
        let mut chars: Vec<u8> = Vec::new();
        char_index::write_char_index(&mut chars, &self.readings, &self.chars)?;
        let mut words: Vec<u8> = Vec::new();
        word_index::write_word_index(&mut words, &self.words)?;

        let report = BuildReport {
            reading_count: self.readings.len(),
            character_count: self.chars.len(),
            characters_without_readings: self.chars.iter().filter(|e| e.readings.is_empty()).count(),
            max_count: self.max_count,
            max_weight: self.chars.iter().map(|e| e.weight).max().unwrap_or(0),
            sequence_count: self.words.len(),
            word_count: self.words.iter().map(|e| e.words.len()).sum(),
            char_index_bytes: chars.len(),
            word_index_bytes: words.len(),
        };
        info!(
            readings = report.reading_count,
            characters = report.character_count,
            sequences = report.sequence_count,
            "indexes serialized"
        );
        Ok(BuiltIndexes {
            chars,
            words,
            report,
        })
    }
}

pub struct BuiltIndexes {
    pub chars: Vec<u8>,
    pub words: Vec<u8>,
    pub report: BuildReport,
}

impl BuiltIndexes {
    pub fn publish(self, chars_path: &Path, words_path: &Path) -> Result<BuildReport> {
        publish(vec![
            Output {
                path: chars_path.to_path_buf(),
                bytes: self.chars,
            },
            Output {
                path: words_path.to_path_buf(),
                bytes: self.words,
            },
        ])?;
        Ok(self.report)
    }
}
