//! Toned pinyin syllable -> (ASCII base spelling, tone class)
//!
//! Accepts the diacritic form used by pinyin-data (`zhōng`, `lǜ`, `ńg`) and
//! the digit form (`zhong1`). Anything outside the recognized sets is a data
//! bug and is rejected, never skipped.

use crate::error::{IndexError, Result};
use std::fmt;

/// Tone class stored in the low 3 bits of a packed reading id.
///
/// `Unmarked` means the source syllable carried no tone mark. pinyin-data
/// writes neutral-tone syllables without a mark, so consumers read
/// `Unmarked` as the neutral tone; the index never distinguishes "neutral"
/// from "unknown".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tone {
    Unmarked = 0,
    Flat = 1,
    Rising = 2,
    Dipping = 3,
    Falling = 4,
}

impl Tone {
    pub fn from_u8(v: u8) -> Option<Tone> {
        match v {
            0 => Some(Tone::Unmarked),
            1 => Some(Tone::Flat),
            2 => Some(Tone::Rising),
            3 => Some(Tone::Dipping),
            4 => Some(Tone::Falling),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A normalized reading: base spelling plus tone class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reading {
    pub base: String,
    pub tone: Tone,
}

impl Reading {
    pub fn new(base: impl Into<String>, tone: Tone) -> Self {
        Self {
            base: base.into(),
            tone,
        }
    }
}

/// `zhong1`, or the bare base for unmarked syllables.
impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tone {
            Tone::Unmarked => f.write_str(&self.base),
            t => write!(f, "{}{}", self.base, t.as_u8()),
        }
    }
}

// Syllabic nasals and interjections, matched on the whole syllable before
// any per-character rule runs.
const SPECIAL_SYLLABLES: &[(&str, &str, Tone)] = &[
    ("\u{148}", "en", Tone::Dipping),           // ň
    ("\u{148}g", "eng", Tone::Dipping),         // ňg
    ("m\u{304}", "mun", Tone::Flat),            // m̄
    ("\u{1e3f}", "mun", Tone::Rising),          // ḿ
    ("m\u{300}", "mun", Tone::Falling),         // m̀
    ("\u{144}", "en", Tone::Rising),            // ń
    ("\u{144}g", "eng", Tone::Rising),          // ńg
    ("\u{1f9}", "en", Tone::Falling),           // ǹ
    ("\u{1f9}g", "eng", Tone::Falling),         // ǹg
];

/// Combining macron and caron, dropped without contributing a tone.
const COMBINING_MARKS: [char; 2] = ['\u{304}', '\u{30c}'];

/// Tone-bearing vowels and their plain letter.
pub const DIACRITIC_TABLE: &[(char, char, Tone)] = &[
    ('ā', 'a', Tone::Flat),
    ('á', 'a', Tone::Rising),
    ('ǎ', 'a', Tone::Dipping),
    ('à', 'a', Tone::Falling),
    ('ō', 'o', Tone::Flat),
    ('ó', 'o', Tone::Rising),
    ('ǒ', 'o', Tone::Dipping),
    ('ò', 'o', Tone::Falling),
    ('ē', 'e', Tone::Flat),
    ('é', 'e', Tone::Rising),
    ('ě', 'e', Tone::Dipping),
    ('è', 'e', Tone::Falling),
    ('ī', 'i', Tone::Flat),
    ('í', 'i', Tone::Rising),
    ('ǐ', 'i', Tone::Dipping),
    ('ì', 'i', Tone::Falling),
    ('ū', 'u', Tone::Flat),
    ('ú', 'u', Tone::Rising),
    ('ǔ', 'u', Tone::Dipping),
    ('ù', 'u', Tone::Falling),
    ('ǖ', 'v', Tone::Flat),
    ('ǘ', 'v', Tone::Rising),
    ('ǚ', 'v', Tone::Dipping),
    ('ǜ', 'v', Tone::Falling),
];

/// Vowels spelled with a substitute letter and no tone. The `ê` family only
/// appears in interjections and collapses onto plain `e`.
const SUBSTITUTES: &[(char, char)] = &[('ü', 'v'), ('ê', 'e'), ('ế', 'e'), ('ề', 'e')];

enum Glyph {
    CombiningMark,
    Toned(char, Tone),
    Substitute(char),
    Plain(char),
}

fn classify(c: char) -> Option<Glyph> {
    if COMBINING_MARKS.contains(&c) {
        return Some(Glyph::CombiningMark);
    }
    if let Some(&(_, plain, tone)) = DIACRITIC_TABLE.iter().find(|(k, _, _)| *k == c) {
        return Some(Glyph::Toned(plain, tone));
    }
    if let Some(&(_, plain)) = SUBSTITUTES.iter().find(|(k, _)| *k == c) {
        return Some(Glyph::Substitute(plain));
    }
    if c.is_ascii_lowercase() {
        return Some(Glyph::Plain(c));
    }
    None
}

/// Normalize one toned syllable.
pub fn normalize(syllable: &str) -> Result<Reading> {
    if syllable.is_empty() {
        return Err(IndexError::EmptySyllable);
    }
    if let Some(&(_, base, tone)) = SPECIAL_SYLLABLES.iter().find(|(k, _, _)| *k == syllable) {
        return Ok(Reading::new(base, tone));
    }

    // Digit form: a single trailing tone digit.
    let (body, digit_tone) = match syllable.chars().last() {
        Some(d @ '0'..='5') => {
            let tone = match d {
                '0' | '5' => Tone::Unmarked,
                _ => Tone::from_u8(d as u8 - b'0').unwrap_or(Tone::Unmarked),
            };
            (&syllable[..syllable.len() - 1], Some(tone))
        }
        _ => (syllable, None),
    };
    if body.is_empty() {
        return Err(IndexError::EmptySyllable);
    }

    let mut base = String::with_capacity(body.len());
    let mut tone: Option<Tone> = None;
    for c in body.chars() {
        let glyph = classify(c).ok_or_else(|| IndexError::UnrecognizedChar {
            syllable: syllable.to_string(),
            ch: c,
        })?;
        match glyph {
            Glyph::CombiningMark => {}
            Glyph::Toned(plain, t) => {
                if tone.replace(t).is_some() {
                    return Err(IndexError::MultipleTones {
                        syllable: syllable.to_string(),
                    });
                }
                base.push(plain);
            }
            Glyph::Substitute(plain) | Glyph::Plain(plain) => base.push(plain),
        }
    }

    let tone = match (tone, digit_tone) {
        (Some(_), Some(_)) => {
            return Err(IndexError::MultipleTones {
                syllable: syllable.to_string(),
            })
        }
        (Some(t), None) | (None, Some(t)) => t,
        (None, None) => Tone::Unmarked,
    };
    if base.is_empty() {
        return Err(IndexError::EmptySyllable);
    }
    Ok(Reading { base, tone })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn norm(s: &str) -> (String, u8) {
        let r = normalize(s).unwrap();
        (r.base, r.tone.as_u8())
    }

    #[test]
    fn diacritic_table_entries_normalize_to_their_pair() {
        for &(marked, plain, tone) in DIACRITIC_TABLE {
            let syllable = format!("x{marked}n");
            let r = normalize(&syllable).unwrap();
            assert_eq!(r.base, format!("x{plain}n"));
            assert_eq!(r.tone, tone);
        }
    }

    #[test]
    fn distinct_marks_never_collide() {
        let mut seen = HashSet::new();
        for &(marked, _, _) in DIACRITIC_TABLE {
            let r = normalize(&marked.to_string()).unwrap();
            assert!(seen.insert((r.base, r.tone)), "collision on {marked}");
        }
    }

    #[test]
    fn common_syllables() {
        assert_eq!(norm("zhōng"), ("zhong".into(), 1));
        assert_eq!(norm("guó"), ("guo".into(), 2));
        assert_eq!(norm("xiǎo"), ("xiao".into(), 3));
        assert_eq!(norm("lǜ"), ("lv".into(), 4));
        assert_eq!(norm("nü"), ("nv".into(), 0));
        assert_eq!(norm("de"), ("de".into(), 0));
    }

    #[test]
    fn special_syllables_take_priority() {
        assert_eq!(norm("ň"), ("en".into(), 3));
        assert_eq!(norm("ńg"), ("eng".into(), 2));
        assert_eq!(norm("ǹg"), ("eng".into(), 4));
        assert_eq!(norm("m\u{304}"), ("mun".into(), 1));
        assert_eq!(norm("ḿ"), ("mun".into(), 2));
        assert_eq!(norm("m\u{300}"), ("mun".into(), 4));
    }

    #[test]
    fn combining_marks_are_dropped() {
        assert_eq!(norm("ê\u{304}"), ("e".into(), 0));
        assert_eq!(norm("ê\u{30c}"), ("e".into(), 0));
        assert_eq!(norm("ê"), ("e".into(), 0));
        assert_eq!(norm("ế"), ("e".into(), 0));
    }

    #[test]
    fn digit_form() {
        assert_eq!(norm("zhong1"), ("zhong".into(), 1));
        assert_eq!(norm("ma5"), ("ma".into(), 0));
        assert_eq!(norm("lv4"), ("lv".into(), 4));
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(
            normalize("Zhong"),
            Err(IndexError::UnrecognizedChar { ch: 'Z', .. })
        ));
        assert!(matches!(
            normalize("m\u{300}a"),
            Err(IndexError::UnrecognizedChar { ch: '\u{300}', .. })
        ));
        assert!(matches!(normalize(""), Err(IndexError::EmptySyllable)));
        assert!(matches!(normalize("3"), Err(IndexError::EmptySyllable)));
        assert!(matches!(
            normalize("zhōng1"),
            Err(IndexError::MultipleTones { .. })
        ));
        assert!(matches!(
            normalize("zhōngguó"),
            Err(IndexError::MultipleTones { .. })
        ));
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(normalize("shàng").unwrap(), normalize("shàng").unwrap());
        assert_eq!(normalize("shàng").unwrap().to_string(), "shang4");
        assert_eq!(normalize("ne").unwrap().to_string(), "ne");
    }
}
