//! Character Index (`pinyin.bin`)
//!
//! Layout, little-endian:
//! ```text
//! u32                 reading_count N
//! N x [u8; 6]         base spelling, ASCII, NUL-padded
//! u32                 character_count M
//! M x record:
//!   u24               code point
//!   u16               quantized weight
//!   u8                reading count R
//!   R x u16           packed reading id (base_id * 8 + tone)
//! ```

use crate::bytes::ByteCursor;
use crate::error::{IndexError, Result};
use crate::normalize::normalize;
use crate::quantize::quantize;
use crate::reading_table::{
    validate_spelling, PackedReadingId, ReadingTable, MAX_BASE_ID, SPELLING_SLOT,
};
use crate::sources::{CharRecord, CharTable};
use memmap2::Mmap;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

const MAX_CODE_POINT: u32 = 0xFF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharEntry {
    pub ch: char,
    pub weight: u16,
    pub readings: Vec<PackedReadingId>,
}

/// Normalize, intern and quantize every merged character, in table order.
pub fn build_entries(table: &CharTable, readings: &mut ReadingTable) -> Result<Vec<CharEntry>> {
    let mut entries = Vec::with_capacity(table.len());
    let mut bare = 0usize;
    for rec in table.iter() {
        let entry = build_entry(rec, readings).map_err(|e| e.for_char(rec.ch))?;
        if entry.readings.is_empty() {
            bare += 1;
        }
        entries.push(entry);
    }
    if bare > 0 {
        warn!(characters = bare, "characters without any reading");
    }
    debug!(
        characters = entries.len(),
        spellings = readings.len(),
        "character entries built"
    );
    Ok(entries)
}

fn build_entry(rec: &CharRecord, readings: &mut ReadingTable) -> Result<CharEntry> {
    let weight = quantize(rec.count)?;
    let mut packed: Vec<PackedReadingId> = Vec::with_capacity(rec.readings.len());
    for toned in &rec.readings {
        let id = readings.intern_reading(&normalize(toned)?)?;
        if !packed.contains(&id) {
            packed.push(id);
        }
    }
    if packed.len() > u8::MAX as usize {
        return Err(IndexError::overflow("reading count", packed.len(), u8::MAX as usize));
    }
    Ok(CharEntry {
        ch: rec.ch,
        weight,
        readings: packed,
    })
}

pub fn write_char_index<W: Write>(
    out: &mut W,
    readings: &ReadingTable,
    entries: &[CharEntry],
) -> Result<()> {
    out.write_all(&(readings.len() as u32).to_le_bytes())?;
    for spelling in readings.spellings() {
        validate_spelling(spelling)?;
        let mut slot = [0u8; SPELLING_SLOT];
        slot[..spelling.len()].copy_from_slice(spelling.as_bytes());
        out.write_all(&slot)?;
    }

    out.write_all(&(entries.len() as u32).to_le_bytes())?;
    for e in entries {
        let cp = e.ch as u32;
        if cp > MAX_CODE_POINT {
            return Err(IndexError::overflow("code point", cp as usize, MAX_CODE_POINT as usize));
        }
        if e.readings.len() > u8::MAX as usize {
            return Err(IndexError::overflow(
                "reading count",
                e.readings.len(),
                u8::MAX as usize,
            ));
        }
        out.write_all(&cp.to_le_bytes()[..3])?;
        out.write_all(&e.weight.to_le_bytes())?;
        out.write_all(&[e.readings.len() as u8])?;
        for id in &e.readings {
            out.write_all(&id.0.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Parsed Character Index.
#[derive(Debug)]
pub struct CharIndex {
    pub readings: ReadingTable,
    pub entries: Vec<CharEntry>,
    by_char: HashMap<char, usize>,
}

impl CharIndex {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::parse(&mmap)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cur = ByteCursor::new(data);

        let n = cur.read_u32()? as usize;
        if n > MAX_BASE_ID as usize + 1 {
            return Err(IndexError::Corrupt {
                offset: 0,
                reason: format!("{n} spellings, ids hold at most {}", MAX_BASE_ID as usize + 1),
            });
        }
        let mut spellings = Vec::with_capacity(n);
        let mut seen = HashSet::with_capacity(n);
        for _ in 0..n {
            let offset = cur.position();
            let slot = cur.take(SPELLING_SLOT)?;
            let end = slot.iter().position(|&b| b == 0).ok_or_else(|| IndexError::Corrupt {
                offset,
                reason: "spelling slot not NUL-terminated".into(),
            })?;
            let spelling = std::str::from_utf8(&slot[..end])
                .ok()
                .filter(|s| s.is_ascii())
                .ok_or_else(|| IndexError::Corrupt {
                    offset,
                    reason: "spelling is not ASCII".into(),
                })?;
            if !seen.insert(spelling) {
                return Err(IndexError::Corrupt {
                    offset,
                    reason: format!("duplicate spelling {spelling:?}"),
                });
            }
            spellings.push(spelling.to_string());
        }
        let readings = ReadingTable::from_spellings(spellings)?;

        let m = cur.read_u32()? as usize;
        let mut entries = Vec::with_capacity(m.min(1 << 20));
        let mut by_char = HashMap::with_capacity(m.min(1 << 20));
        for _ in 0..m {
            let value = cur.read_u24()?;
            let ch = char::from_u32(value).ok_or(IndexError::InvalidCodePoint { value })?;
            let weight = cur.read_u16()?;
            let r = cur.read_u8()? as usize;
            let mut ids = Vec::with_capacity(r);
            for _ in 0..r {
                let offset = cur.position();
                let id = PackedReadingId(cur.read_u16()?);
                if id.base_id() as usize >= readings.len() {
                    return Err(IndexError::Corrupt {
                        offset,
                        reason: format!("base id {} out of {}", id.base_id(), readings.len()),
                    });
                }
                ids.push(id);
            }
            by_char.entry(ch).or_insert(entries.len());
            entries.push(CharEntry {
                ch,
                weight,
                readings: ids,
            });
        }
        cur.finish()?;

        Ok(Self {
            readings,
            entries,
            by_char,
        })
    }

    pub fn get(&self, ch: char) -> Option<&CharEntry> {
        self.by_char.get(&ch).map(|&i| &self.entries[i])
    }

    /// Readings of `ch` in `zhong1` form.
    pub fn readings_of(&self, ch: char) -> Vec<String> {
        self.get(ch)
            .map(|e| {
                e.readings
                    .iter()
                    .filter_map(|&id| self.readings.render(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        write_char_index(&mut out, &self.readings, &self.entries)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CharTable {
        let mut table = CharTable::new();
        table.add_count('中', 1000);
        table.add_readings('中', ["zhōng"]);
        table.add_count('国', 800);
        table.add_readings('国', ["guó"]);
        table.add_count('〇', 12);
        table
    }

    #[test]
    fn round_trip_three_characters() {
        let mut readings = ReadingTable::new();
        let entries = build_entries(&sample(), &mut readings).unwrap();
        let mut bytes: Vec<u8> = Vec::new();
        write_char_index(&mut bytes, &readings, &entries).unwrap();

        let index = CharIndex::parse(&bytes).unwrap();
        assert_eq!(index.entries, entries);
        assert_eq!(index.readings.spellings(), &["zhong", "guo"]);

        let zhong = index.get('中').unwrap();
        assert_eq!(zhong.ch as u32, 0x4E2D);
        assert_eq!(zhong.weight, quantize(1000).unwrap());
        assert_eq!(index.readings_of('中'), vec!["zhong1"]);
        assert_eq!(index.readings_of('国'), vec!["guo2"]);
        assert_eq!(index.get('国').unwrap().weight, quantize(800).unwrap());
        assert!(index.get('〇').unwrap().readings.is_empty());
    }

    #[test]
    fn exact_bytes() {
        let mut readings = ReadingTable::new();
        let entries = build_entries(&sample(), &mut readings).unwrap();
        let mut bytes: Vec<u8> = Vec::new();
        write_char_index(&mut bytes, &readings, &entries).unwrap();

        let w = quantize(1000).unwrap().to_le_bytes();
        let mut expected = vec![2, 0, 0, 0];
        expected.extend_from_slice(b"zhong\0guo\0\0\0");
        expected.extend_from_slice(&[3, 0, 0, 0]);
        expected.extend_from_slice(&[0x2D, 0x4E, 0x00, w[0], w[1], 1, 1, 0]);
        assert_eq!(&bytes[..expected.len()], &expected[..]);
        // 3 + 2 + 1 + 2 per reading, zero readings for the last record
        assert_eq!(bytes.len(), 4 + 12 + 4 + 8 + 8 + 6);
    }

    #[test]
    fn empty_reading_set_keeps_alignment() {
        let mut table = CharTable::new();
        table.add_count('〇', 3);
        table.add_count('一', 5);
        table.add_readings('一', ["yī"]);
        let mut readings = ReadingTable::new();
        let entries = build_entries(&table, &mut readings).unwrap();
        let mut bytes: Vec<u8> = Vec::new();
        write_char_index(&mut bytes, &readings, &entries).unwrap();

        let index = CharIndex::parse(&bytes).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries[0].readings.len(), 0);
        assert_eq!(index.readings_of('一'), vec!["yi1"]);
    }

    #[test]
    fn duplicate_readings_collapse() {
        let mut table = CharTable::new();
        table.add_readings('中', ["zhōng", "zhong1", "zhòng"]);
        let mut readings = ReadingTable::new();
        let entries = build_entries(&table, &mut readings).unwrap();
        assert_eq!(entries[0].readings.len(), 2);
        assert_eq!(readings.len(), 1);
    }

    #[test]
    fn build_aborts_on_bad_data() {
        let mut table = CharTable::new();
        table.add_readings('中', ["zhōng", "ZHONG"]);
        let err = build_entries(&table, &mut ReadingTable::new()).unwrap_err();
        assert!(matches!(err.root(), IndexError::UnrecognizedChar { ch: 'Z', .. }));

        let mut table = CharTable::new();
        table.add_count('的', 10_000_000);
        let err = build_entries(&table, &mut ReadingTable::new()).unwrap_err();
        assert!(matches!(err.root(), IndexError::WeightOutOfRange { .. }));

        let mut table = CharTable::new();
        table.add_readings('庄', ["zhuāng"]);
        let err = build_entries(&table, &mut ReadingTable::new()).unwrap_err();
        assert!(matches!(err.root(), IndexError::SpellingTooLong { .. }));
    }

    #[test]
    fn build_errors_name_the_character() {
        let mut table = CharTable::new();
        table.add_count('中', 1000);
        table.add_count('的', 10_000_000);
        let err = build_entries(&table, &mut ReadingTable::new()).unwrap_err();
        assert!(matches!(
            err,
            IndexError::Character { ch: '的', code_point: 0x7684, .. }
        ));
        let msg = err.to_string();
        assert!(msg.contains("U+7684"), "{msg}");
        assert!(msg.contains("10000000"), "{msg}");
        assert!(msg.contains("66019"), "{msg}");

        let mut table = CharTable::new();
        table.add_readings('庄', ["zhuāng"]);
        let msg = build_entries(&table, &mut ReadingTable::new())
            .unwrap_err()
            .to_string();
        assert!(msg.contains("'庄'") && msg.contains("U+5E84"), "{msg}");
        assert!(msg.contains("zhuang"), "{msg}");
    }

    fn header(spellings: &[&str]) -> Vec<u8> {
        let mut bytes = (spellings.len() as u32).to_le_bytes().to_vec();
        for s in spellings {
            let mut slot = [0u8; SPELLING_SLOT];
            slot[..s.len()].copy_from_slice(s.as_bytes());
            bytes.extend_from_slice(&slot);
        }
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn rejects_oversized_reading_table() {
        let names: Vec<String> = (0..=MAX_BASE_ID as u32).map(|i| format!("{i:x}")).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let index = CharIndex::parse(&header(&refs)).unwrap();
        assert_eq!(index.readings.len(), MAX_BASE_ID as usize + 1);
        assert_eq!(index.readings.id_of("1fff"), Some(MAX_BASE_ID));

        // 65_537 spellings would wrap a u16 id back to 0
        let names: Vec<String> = (0..65_537u32).map(|i| format!("{i:05}")).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        assert!(matches!(
            CharIndex::parse(&header(&refs)),
            Err(IndexError::Corrupt { offset: 0, .. })
        ));

        let mut bytes = header(&[]);
        bytes[..4].copy_from_slice(&(MAX_BASE_ID as u32 + 2).to_le_bytes());
        assert!(matches!(
            CharIndex::parse(&bytes),
            Err(IndexError::Corrupt { offset: 0, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_spellings() {
        let err = CharIndex::parse(&header(&["zhong", "guo", "zhong"])).unwrap_err();
        // third slot: 4-byte count + two 6-byte slots
        assert!(matches!(err, IndexError::Corrupt { offset: 16, .. }), "{err}");
    }

    #[test]
    fn rejects_truncated_and_trailing() {
        let mut readings = ReadingTable::new();
        let entries = build_entries(&sample(), &mut readings).unwrap();
        let mut bytes: Vec<u8> = Vec::new();
        write_char_index(&mut bytes, &readings, &entries).unwrap();

        assert!(matches!(
            CharIndex::parse(&bytes[..bytes.len() - 1]),
            Err(IndexError::Truncated { .. })
        ));
        bytes.push(0);
        assert!(matches!(
            CharIndex::parse(&bytes),
            Err(IndexError::TrailingBytes { count: 1, .. })
        ));
    }
}
