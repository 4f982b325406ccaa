//! Spelling -> base id lookup over a parsed reading table
//!
//! Backed by an in-memory `fst::Map` so a consumer splitting typed pinyin can
//! ask both "is this a spelling" and "which spellings start with this".

use crate::error::Result;
use crate::reading_table::ReadingTable;
use fst::automaton::{Automaton, Str};
use fst::{IntoStreamer, Map, MapBuilder, Streamer};

pub struct Lexicon {
    map: Map<Vec<u8>>,
}

impl Lexicon {
    pub fn from_table(table: &ReadingTable) -> Result<Self> {
        // fst needs lexicographically sorted keys
        let mut keys: Vec<(&str, u64)> = table
            .spellings()
            .iter()
            .enumerate()
            .map(|(id, s)| (s.as_str(), id as u64))
            .collect();
        keys.sort_unstable();
        keys.dedup_by(|a, b| a.0 == b.0);

        let mut builder = MapBuilder::memory();
        for (key, id) in keys {
            builder.insert(key, id)?;
        }
        let map = builder.into_map();
        Ok(Self { map })
    }

    pub fn get(&self, spelling: &str) -> Option<u16> {
        self.map.get(spelling).map(|v| v as u16)
    }

    /// Whether some spelling starts with `prefix`.
    pub fn is_prefix(&self, prefix: &str) -> bool {
        let mut s = self.map.search(Str::new(prefix).starts_with()).into_stream();
        s.next().is_some()
    }

    /// Spellings starting with `prefix`, sorted, at most `limit`.
    pub fn with_prefix(&self, prefix: &str, limit: usize) -> Vec<(String, u16)> {
        let mut out = Vec::new();
        let mut s = self.map.search(Str::new(prefix).starts_with()).into_stream();
        while let Some((k, v)) = s.next() {
            if out.len() >= limit {
                break;
            }
            out.push((String::from_utf8_lossy(k).into_owned(), v as u16));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        let table = ReadingTable::from_spellings(
            ["zhong", "guo", "zhang", "zha", "ren"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        Lexicon::from_table(&table).unwrap()
    }

    #[test]
    fn exact_lookup_returns_table_id() {
        let lex = lexicon();
        assert_eq!(lex.get("zhong"), Some(0));
        assert_eq!(lex.get("ren"), Some(4));
        assert_eq!(lex.get("zh"), None);
        assert_eq!(lex.len(), 5);
    }

    #[test]
    fn prefix_search() {
        let lex = lexicon();
        assert!(lex.is_prefix("zh"));
        assert!(!lex.is_prefix("x"));
        let hits: Vec<String> = lex.with_prefix("zh", 10).into_iter().map(|(s, _)| s).collect();
        assert_eq!(hits, vec!["zha", "zhang", "zhong"]);
        assert_eq!(lex.with_prefix("zh", 1).len(), 1);
    }
}
