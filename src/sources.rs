//! Upstream tables and the merge maps built from them.
//!
//! Three sources feed a build:
//! - frequency corpus: `num\tchar\tcount\tcdf\tpinyin\tenglish`, `/*` lines are comments
//! - per-character readings: `U+4E2D: zhōng,zhòng  # 中`
//! - phrase readings: `商鞅: shāng yāng`
//!
//! Merge maps keep first-seen order, which fixes record order on disk.

use crate::error::{IndexError, Result};
use crate::normalize::{normalize, Reading};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Gb18030,
}

impl FromStr for SourceEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(SourceEncoding::Utf8),
            "gb18030" | "gbk" => Ok(SourceEncoding::Gb18030),
            other => Err(format!("unsupported encoding {other:?}")),
        }
    }
}

/// Read a source file, decompressing `.gz` and decoding to UTF-8.
pub fn load_text(path: &Path, encoding: SourceEncoding) -> Result<String> {
    let file = File::open(path)?;
    let mut raw = Vec::new();
    if path.extension().is_some_and(|e| e == "gz") {
        BufReader::new(GzDecoder::new(file)).read_to_end(&mut raw)?;
    } else {
        BufReader::new(file).read_to_end(&mut raw)?;
    }

    let codec = match encoding {
        SourceEncoding::Utf8 => encoding_rs::UTF_8,
        SourceEncoding::Gb18030 => encoding_rs::GB18030,
    };
    let (text, _, had_errors) = codec.decode(&raw);
    if had_errors {
        return Err(IndexError::MalformedRow {
            source_name: path.display().to_string(),
            line: 0,
            reason: format!("not valid {}", codec.name()),
        });
    }
    Ok(text.into_owned())
}

fn malformed(source_name: &str, line: usize, reason: impl Into<String>) -> IndexError {
    IndexError::MalformedRow {
        source_name: source_name.to_string(),
        line,
        reason: reason.into(),
    }
}

fn single_char(field: &str) -> Option<char> {
    let mut it = field.chars();
    match (it.next(), it.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Parse the frequency corpus into `(char, count)` rows in file order.
pub fn parse_frequency(text: &str, source_name: &str) -> Result<Vec<(char, u64)>> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let lineno = i + 1;
        if line.starts_with("/*") || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 6 {
            return Err(malformed(
                source_name,
                lineno,
                format!("expected 6 tab-separated fields, got {}", fields.len()),
            ));
        }
        let ch = single_char(fields[1])
            .ok_or_else(|| malformed(source_name, lineno, format!("bad character field {:?}", fields[1])))?;
        let count: u64 = fields[2]
            .trim()
            .parse()
            .map_err(|e| malformed(source_name, lineno, format!("bad count {:?}: {e}", fields[2])))?;
        rows.push((ch, count));
    }
    debug!(source = source_name, rows = rows.len(), "parsed frequency table");
    Ok(rows)
}

/// Parse `U+XXXX: a,b  # c` rows into `(char, toned readings)`.
pub fn parse_readings(text: &str, source_name: &str) -> Result<Vec<(char, Vec<String>)>> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let lineno = i + 1;
        if !line.starts_with("U+") {
            continue;
        }
        let (code, rest) = line
            .split_once(':')
            .ok_or_else(|| malformed(source_name, lineno, "missing ':'"))?;
        let value = u32::from_str_radix(code[2..].trim(), 16)
            .map_err(|e| malformed(source_name, lineno, format!("bad code point {code:?}: {e}")))?;
        let ch = char::from_u32(value).ok_or(IndexError::InvalidCodePoint { value })?;
        let body = rest.split('#').next().unwrap_or("").trim();
        let readings: Vec<String> = body
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if readings.is_empty() {
            return Err(malformed(source_name, lineno, "no readings"));
        }
        rows.push((ch, readings));
    }
    debug!(source = source_name, rows = rows.len(), "parsed reading table");
    Ok(rows)
}

/// Parse `word: syl syl` phrase rows.
pub fn parse_phrases(text: &str, source_name: &str) -> Result<Vec<(String, Vec<String>)>> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let lineno = i + 1;
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (word, pinyin) = line
            .split_once(':')
            .ok_or_else(|| malformed(source_name, lineno, "missing ':'"))?;
        let word = word.trim();
        let syllables: Vec<String> = pinyin.split_whitespace().map(String::from).collect();
        if word.is_empty() || syllables.is_empty() {
            return Err(malformed(source_name, lineno, "empty word or reading"));
        }
        rows.push((word.to_string(), syllables));
    }
    debug!(source = source_name, rows = rows.len(), "parsed phrase table");
    Ok(rows)
}

/// One character after merging frequency and reading sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharRecord {
    pub ch: char,
    pub count: u64,
    /// Toned readings as sourced, deduplicated, first-seen order.
    pub readings: Vec<String>,
}

/// `char -> (count, readings)` in first-seen order.
#[derive(Debug, Default)]
pub struct CharTable {
    records: Vec<CharRecord>,
    index: HashMap<char, usize>,
}

impl CharTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, ch: char) -> &mut CharRecord {
        let idx = match self.index.get(&ch) {
            Some(&idx) => idx,
            None => {
                self.records.push(CharRecord {
                    ch,
                    count: 0,
                    readings: Vec::new(),
                });
                self.index.insert(ch, self.records.len() - 1);
                self.records.len() - 1
            }
        };
        &mut self.records[idx]
    }

    /// Counts for the same character are summed.
    pub fn add_count(&mut self, ch: char, count: u64) {
        let rec = self.slot(ch);
        rec.count = rec.count.saturating_add(count);
    }

    pub fn add_readings<I, S>(&mut self, ch: char, readings: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rec = self.slot(ch);
        for r in readings {
            let r = r.as_ref();
            if !rec.readings.iter().any(|x| x == r) {
                rec.readings.push(r.to_string());
            }
        }
    }

    pub fn get(&self, ch: char) -> Option<&CharRecord> {
        self.index.get(&ch).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One reading sequence and every word that shares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordGroup {
    pub readings: Vec<Reading>,
    pub words: Vec<String>,
}

/// `reading sequence -> words` in first-seen order. Sequences are keyed on
/// normalized readings so `shāng yāng` and `shang1 yang1` land in one group.
#[derive(Debug, Default)]
pub struct WordTable {
    groups: Vec<WordGroup>,
    index: HashMap<Vec<Reading>, usize>,
}

impl WordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add words under a sequence of toned syllables; duplicates merge.
    pub fn insert<S, W>(&mut self, syllables: &[S], words: W) -> Result<()>
    where
        S: AsRef<str>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        let readings = syllables
            .iter()
            .map(|s| normalize(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().nfc().collect::<String>())
            .collect();
        if words.iter().any(|w| w.is_empty()) {
            return Err(IndexError::EmptyWord {
                sequence: syllables.iter().map(|s| s.as_ref().to_string()).collect(),
            });
        }
        if words.is_empty() {
            return Ok(());
        }

        let idx = match self.index.get(&readings) {
            Some(&idx) => idx,
            None => {
                self.groups.push(WordGroup {
                    readings: readings.clone(),
                    words: Vec::new(),
                });
                self.index.insert(readings, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        let group = &mut self.groups[idx];
        for w in words {
            if !group.words.contains(&w) {
                group.words.push(w);
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Merge frequency rows first, then reading rows, preserving first sight.
pub fn merge_chars(frequency: &[(char, u64)], readings: &[(char, Vec<String>)]) -> CharTable {
    let mut table = CharTable::new();
    for &(ch, count) in frequency {
        table.add_count(ch, count);
    }
    for (ch, rs) in readings {
        table.add_readings(*ch, rs);
    }
    table
}

/// Fold phrase rows into a word table.
pub fn merge_phrases(table: &mut WordTable, phrases: &[(String, Vec<String>)]) -> Result<()> {
    for (word, syllables) in phrases {
        table.insert(syllables, [word])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Tone;

    const FREQ: &str = "/* header */\n\
1\t的\t7922684\t4.09\tde/di2/di4\tof\n\
2\t中\t1000\t9.0\tzhong1\tmiddle\n\
3\t中\t24\t9.1\tzhong1\tmiddle\n";

    const READINGS: &str = "# comment\n\
U+4E2D: zhōng,zhòng  # 中\n\
U+56FD: guó  # 国\n";

    #[test]
    fn frequency_rows() {
        let rows = parse_frequency(FREQ, "chars.txt").unwrap();
        assert_eq!(rows, vec![('的', 7922684), ('中', 1000), ('中', 24)]);
    }

    #[test]
    fn frequency_row_with_wrong_field_count() {
        let err = parse_frequency("1\t中\t10\n", "chars.txt").unwrap_err();
        assert!(matches!(err, IndexError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn reading_rows() {
        let rows = parse_readings(READINGS, "pinyin.txt").unwrap();
        assert_eq!(rows[0], ('中', vec!["zhōng".to_string(), "zhòng".to_string()]));
        assert_eq!(rows[1], ('国', vec!["guó".to_string()]));
        assert!(parse_readings("U+ZZZZ: a\n", "pinyin.txt").is_err());
    }

    #[test]
    fn phrase_rows() {
        let rows = parse_phrases("# c\n\n商鞅: shāng yāng # note\n", "p.txt").unwrap();
        assert_eq!(
            rows,
            vec![("商鞅".to_string(), vec!["shāng".to_string(), "yāng".to_string()])]
        );
        assert!(parse_phrases("商鞅 shāng\n", "p.txt").is_err());
    }

    #[test]
    fn merge_sums_counts_and_keeps_order() {
        let freq = parse_frequency(FREQ, "chars.txt").unwrap();
        let readings = parse_readings(READINGS, "pinyin.txt").unwrap();
        let table = merge_chars(&freq, &readings);
        let order: Vec<char> = table.iter().map(|r| r.ch).collect();
        assert_eq!(order, vec!['的', '中', '国']);
        assert_eq!(table.get('中').unwrap().count, 1024);
        assert_eq!(table.get('国').unwrap().count, 0);
        assert!(table.get('的').unwrap().readings.is_empty());
    }

    #[test]
    fn reading_union_dedupes() {
        let mut table = CharTable::new();
        table.add_readings('中', ["zhōng", "zhòng"]);
        table.add_readings('中', ["zhòng", "zhōng"]);
        assert_eq!(table.get('中').unwrap().readings, vec!["zhōng", "zhòng"]);
    }

    #[test]
    fn word_groups_merge_across_sources() {
        let mut table = WordTable::new();
        table.insert(&["shang1", "yang1"], ["商鞅"]).unwrap();
        table.insert(&["shāng", "yāng"], ["商羊"]).unwrap();
        table.insert(&["shang1", "yang1"], ["商鞅"]).unwrap();
        assert_eq!(table.len(), 1);
        let group = table.iter().next().unwrap();
        assert_eq!(group.words, vec!["商鞅", "商羊"]);
        assert_eq!(
            group.readings,
            vec![Reading::new("shang", Tone::Flat), Reading::new("yang", Tone::Flat)]
        );
    }

    #[test]
    fn word_sequence_order_matters() {
        let mut table = WordTable::new();
        table.insert(&["a1", "b2"], ["x"]).unwrap();
        table.insert(&["b2", "a1"], ["y"]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rejects_empty_word_and_bad_syllable() {
        let mut table = WordTable::new();
        assert!(matches!(
            table.insert(&["a1"], [""]),
            Err(IndexError::EmptyWord { .. })
        ));
        assert!(matches!(
            table.insert(&["A1"], ["x"]),
            Err(IndexError::UnrecognizedChar { .. })
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn encoding_names() {
        assert_eq!("GB18030".parse::<SourceEncoding>().unwrap(), SourceEncoding::Gb18030);
        assert_eq!("utf-8".parse::<SourceEncoding>().unwrap(), SourceEncoding::Utf8);
        assert!("latin1".parse::<SourceEncoding>().is_err());
    }
}
