//! Build and read the pinyin binary indexes consumed by the input method:
//! `pinyin.bin` (character -> readings + weight) and `pinyin-words.bin`
//! (reading sequence -> words).

pub mod build;
pub mod bytes;
pub mod char_index;
pub mod error;
pub mod lexicon;
pub mod normalize;
pub mod publish;
pub mod quantize;
pub mod reading_table;
pub mod sources;
pub mod word_index;

pub use build::{BuildReport, IndexBuild, Sources};
pub use char_index::CharIndex;
pub use error::{IndexError, Result};
pub use lexicon::Lexicon;
pub use normalize::{normalize, Reading, Tone};
pub use reading_table::{PackedReadingId, ReadingTable};
pub use word_index::WordIndex;

use tracing_subscriber::EnvFilter;

/// Log to stderr, `RUST_LOG` overrides the default of `info` for this crate.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,pinyin_index=info".into()),
        )
        .init();
}
