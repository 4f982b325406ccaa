//! Word Index (`pinyin-words.bin`)
//!
//! Layout, little-endian:
//! ```text
//! u32                 sequence_count N
//! N x record:
//!   u8                sequence length L
//!   L x u16           packed reading id
//!   repeated:
//!     u8              word length W in UTF-16 units (W > 0)
//!     W x u16         UTF-16 code units
//!   u8                0x00 terminator
//! ```

use crate::bytes::ByteCursor;
use crate::error::{IndexError, Result};
use crate::reading_table::{PackedReadingId, ReadingTable};
use crate::sources::WordTable;
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub readings: Vec<PackedReadingId>,
    pub words: Vec<String>,
}

/// Intern every reading of every group through the shared table.
pub fn build_entries(table: &WordTable, readings: &mut ReadingTable) -> Result<Vec<WordEntry>> {
    let mut entries = Vec::with_capacity(table.len());
    for group in table.iter() {
        if group.words.is_empty() {
            continue;
        }
        if group.readings.len() > u8::MAX as usize {
            return Err(IndexError::overflow(
                "sequence length",
                group.readings.len(),
                u8::MAX as usize,
            ));
        }
        let ids = group
            .readings
            .iter()
            .map(|r| readings.intern_reading(r))
            .collect::<Result<Vec<_>>>()?;
        entries.push(WordEntry {
            readings: ids,
            words: group.words.clone(),
        });
    }
    debug!(
        sequences = entries.len(),
        spellings = readings.len(),
        "word entries built"
    );
    Ok(entries)
}

pub fn write_word_index<W: Write>(out: &mut W, entries: &[WordEntry]) -> Result<()> {
    out.write_all(&(entries.len() as u32).to_le_bytes())?;
    for e in entries {
        if e.readings.len() > u8::MAX as usize {
            return Err(IndexError::overflow(
                "sequence length",
                e.readings.len(),
                u8::MAX as usize,
            ));
        }
        out.write_all(&[e.readings.len() as u8])?;
        for id in &e.readings {
            out.write_all(&id.0.to_le_bytes())?;
        }
        for word in &e.words {
            let units: Vec<u16> = word.encode_utf16().collect();
            if units.is_empty() {
                return Err(IndexError::EmptyWord {
                    sequence: e.readings.iter().map(|id| id.0.to_string()).collect(),
                });
            }
            if units.len() > u8::MAX as usize {
                return Err(IndexError::overflow("word length", units.len(), u8::MAX as usize));
            }
            out.write_all(&[units.len() as u8])?;
            for u in units {
                out.write_all(&u.to_le_bytes())?;
            }
        }
        out.write_all(&[0])?;
    }
    Ok(())
}

/// Parsed Word Index.
#[derive(Debug)]
pub struct WordIndex {
    pub entries: Vec<WordEntry>,
    by_sequence: HashMap<Vec<PackedReadingId>, usize>,
    by_bases: HashMap<Vec<u16>, Vec<usize>>,
}

impl WordIndex {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::parse(&mmap)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cur = ByteCursor::new(data);
        let n = cur.read_u32()? as usize;
        let mut entries = Vec::with_capacity(n.min(1 << 20));
        for _ in 0..n {
            let len = cur.read_u8()? as usize;
            let mut ids = Vec::with_capacity(len);
            for _ in 0..len {
                ids.push(PackedReadingId(cur.read_u16()?));
            }
            let mut words = Vec::new();
            loop {
                let w = cur.read_u8()? as usize;
                if w == 0 {
                    break;
                }
                let offset = cur.position();
                let raw = cur.take(w * 2)?;
                let units = raw.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
                let word = char::decode_utf16(units)
                    .collect::<std::result::Result<String, _>>()
                    .map_err(|_| IndexError::InvalidUtf16 { offset })?;
                words.push(word);
            }
            entries.push(WordEntry {
                readings: ids,
                words,
            });
        }
        cur.finish()?;

        let mut by_sequence = HashMap::with_capacity(entries.len());
        let mut by_bases: HashMap<Vec<u16>, Vec<usize>> = HashMap::new();
        for (i, e) in entries.iter().enumerate() {
            by_sequence.entry(e.readings.clone()).or_insert(i);
            let bases = e.readings.iter().map(|id| id.base_id()).collect();
            by_bases.entry(bases).or_default().push(i);
        }
        Ok(Self {
            entries,
            by_sequence,
            by_bases,
        })
    }

    /// Words for an exact toned sequence.
    pub fn lookup(&self, sequence: &[PackedReadingId]) -> Option<&[String]> {
        self.by_sequence
            .get(sequence)
            .map(|&i| self.entries[i].words.as_slice())
    }

    /// Every group whose base spellings match, ignoring tone.
    pub fn lookup_untoned(&self, bases: &[u16]) -> impl Iterator<Item = &WordEntry> {
        self.by_bases
            .get(bases)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    /// Highest base id referenced, used to check against the reading table.
    pub fn max_base_id(&self) -> Option<u16> {
        self.entries
            .iter()
            .flat_map(|e| e.readings.iter().map(|id| id.base_id()))
            .max()
    }

    pub fn word_count(&self) -> usize {
        self.entries.iter().map(|e| e.words.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        write_word_index(&mut out, &self.entries)?;
        Ok(out)
    }
}
