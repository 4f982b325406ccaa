use crate::error::{IndexError, Result};
use crate::normalize::{Reading, Tone};
use std::collections::HashMap;

/// Width of one base spelling slot on disk: up to 5 ASCII bytes plus NUL.
pub const SPELLING_SLOT: usize = 6;
pub const MAX_SPELLING_LEN: usize = SPELLING_SLOT - 1;

/// Largest base id that still packs into a u16 (`8191 * 8 + 7 == 0xFFFF`).
pub const MAX_BASE_ID: u16 = 8191;

/// `base_id * 8 + tone`. Tones 5..=7 are reserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackedReadingId(pub u16);

impl PackedReadingId {
    pub fn pack(base_id: u16, tone: u8) -> Self {
        debug_assert!(base_id <= MAX_BASE_ID && tone < 8);
        PackedReadingId((base_id << 3) | (tone as u16 & 7))
    }

    pub fn base_id(self) -> u16 {
        self.0 >> 3
    }

    pub fn tone_bits(self) -> u8 {
        (self.0 & 7) as u8
    }

    pub fn tone(self) -> Option<Tone> {
        Tone::from_u8(self.tone_bits())
    }

    pub fn unpack(self) -> (u16, u8) {
        (self.base_id(), self.tone_bits())
    }
}

/// Insertion-ordered set of base spellings. Ids are dense and only meaningful
/// within the build that produced them.
#[derive(Debug, Default, Clone)]
pub struct ReadingTable {
    spellings: Vec<String>,
    ids: HashMap<String, u16>,
}

impl ReadingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from spellings already in id order (reader side).
    pub fn from_spellings(spellings: Vec<String>) -> Result<Self> {
        let mut ids = HashMap::with_capacity(spellings.len());
        for (i, s) in spellings.iter().enumerate() {
            let id = u16::try_from(i)
                .ok()
                .filter(|&id| id <= MAX_BASE_ID)
                .ok_or_else(|| IndexError::ReadingTableFull { spelling: s.clone() })?;
            if ids.insert(s.clone(), id).is_some() {
                return Err(IndexError::DuplicateSpelling { spelling: s.clone() });
            }
        }
        Ok(Self { spellings, ids })
    }

    /// Return the id of `base`, appending it on first sight.
    pub fn intern(&mut self, base: &str) -> Result<u16> {
        if let Some(&id) = self.ids.get(base) {
            return Ok(id);
        }
        validate_spelling(base)?;
        if self.spellings.len() > MAX_BASE_ID as usize {
            return Err(IndexError::ReadingTableFull {
                spelling: base.to_string(),
            });
        }
        let id = self.spellings.len() as u16;
        self.spellings.push(base.to_string());
        self.ids.insert(base.to_string(), id);
        Ok(id)
    }

    /// Intern the base of a normalized reading and pack it with its tone.
    pub fn intern_reading(&mut self, reading: &Reading) -> Result<PackedReadingId> {
        let id = self.intern(&reading.base)?;
        Ok(PackedReadingId::pack(id, reading.tone.as_u8()))
    }

    pub fn id_of(&self, base: &str) -> Option<u16> {
        self.ids.get(base).copied()
    }

    pub fn spelling(&self, id: u16) -> Option<&str> {
        self.spellings.get(id as usize).map(|s| s.as_str())
    }

    /// Render a packed id back to `zhong1` form.
    pub fn render(&self, packed: PackedReadingId) -> Option<String> {
        let base = self.spelling(packed.base_id())?;
        Some(match packed.tone_bits() {
            0 => base.to_string(),
            t => format!("{base}{t}"),
        })
    }

    pub fn spellings(&self) -> &[String] {
        &self.spellings
    }

    pub fn len(&self) -> usize {
        self.spellings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spellings.is_empty()
    }
}

pub fn validate_spelling(base: &str) -> Result<()> {
    if base.len() > MAX_SPELLING_LEN || !base.is_ascii() || base.contains('\0') {
        return Err(IndexError::SpellingTooLong {
            spelling: base.to_string(),
            len: base.len(),
        });
    }
    Ok(())
}
