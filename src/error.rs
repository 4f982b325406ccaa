use std::io;

pub type Result<T, E = IndexError> = std::result::Result<T, E>;

/// Every failure in this crate aborts the whole build; nothing is recoverable
/// mid-build.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("syllable {syllable:?}: unrecognized character {ch:?}")]
    UnrecognizedChar { syllable: String, ch: char },

    #[error("empty syllable")]
    EmptySyllable,

    #[error("syllable {syllable:?} carries more than one tone mark")]
    MultipleTones { syllable: String },

    #[error("base spelling {spelling:?} is {len} bytes, slot holds at most 5")]
    SpellingTooLong { spelling: String, len: usize },

    #[error("reading table full, cannot intern {spelling:?}")]
    ReadingTableFull { spelling: String },

    #[error("base spelling {spelling:?} appears more than once")]
    DuplicateSpelling { spelling: String },

    #[error("count {count} quantizes to {value}, which does not fit in u16")]
    WeightOutOfRange { count: u64, value: f64 },

    #[error("{what} = {value} exceeds field maximum {max}")]
    FieldOverflow {
        what: &'static str,
        value: u64,
        max: u64,
    },

    #[error("character {ch:?} (U+{code_point:04X}): {source}")]
    Character {
        ch: char,
        code_point: u32,
        source: Box<IndexError>,
    },

    #[error("empty word for reading sequence {sequence:?}")]
    EmptyWord { sequence: Vec<String> },

    #[error("{source_name}:{line}: {reason}")]
    MalformedRow {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("truncated input at offset {offset}: need {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    #[error("{count} trailing bytes after offset {offset}")]
    TrailingBytes { offset: usize, count: usize },

    #[error("invalid UTF-16 word at offset {offset}")]
    InvalidUtf16 { offset: usize },

    #[error("corrupt index at offset {offset}: {reason}")]
    Corrupt { offset: usize, reason: String },

    #[error("invalid code point 0x{value:06X}")]
    InvalidCodePoint { value: u32 },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Fst(#[from] fst::Error),
}

impl IndexError {
    /// Attach the character whose record failed to build.
    pub(crate) fn for_char(self, ch: char) -> Self {
        IndexError::Character {
            ch,
            code_point: ch as u32,
            source: Box::new(self),
        }
    }

    /// The innermost error, past any character context.
    pub fn root(&self) -> &IndexError {
        match self {
            IndexError::Character { source, .. } => source.root(),
            e => e,
        }
    }

    pub(crate) fn overflow(what: &'static str, value: usize, max: usize) -> Self {
        IndexError::FieldOverflow {
            what,
            value: value as u64,
            max: max as u64,
        }
    }
}
