//! Write-then-rename publication of finished index files.
//!
//! Every output is written and synced to a temp file next to its final path
//! before any rename happens, so a failed build leaves previously published
//! files untouched and never exposes a half-written one.

use crate::error::Result;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub struct Output {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

pub fn publish(outputs: Vec<Output>) -> Result<()> {
    let mut staged = Vec::with_capacity(outputs.len());
    for out in outputs {
        let parent = out.path.parent().unwrap_or_else(|| Path::new("."));
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        fs::create_dir_all(parent)?;

        let tmp = NamedTempFile::new_in(parent)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            w.write_all(&out.bytes)?;
            w.flush()?;
        }
        tmp.as_file().sync_all()?;
        staged.push((tmp, out.path, out.bytes.len()));
    }

    for (tmp, path, len) in staged {
        tmp.persist(&path).map_err(|e| e.error)?;
        info!(path = %path.display(), bytes = len, "published");
    }
    Ok(())
}
