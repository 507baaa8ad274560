//! Writes preference stores as tab-separated text.

use super::store::PreferenceStore;
use crate::error::DatasetError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Writes `store` to `path` as `user\titem\tpreference[\ttimestamp]` lines.
///
/// Lines are emitted in canonical (user, item) order so the same store always
/// produces the same bytes. Fails with [`DatasetError::AlreadyExists`] if the
/// file exists and `overwrite` is false.
pub fn write_store(
    store: &PreferenceStore,
    path: &Path,
    overwrite: bool,
) -> Result<(), DatasetError> {
    if path.exists() && !overwrite {
        return Err(DatasetError::AlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| DatasetError::io(path, e))?;
    let mut out = BufWriter::new(file);
    write_to(store, &mut out).map_err(|e| DatasetError::io(path, e))?;
    out.flush().map_err(|e| DatasetError::io(path, e))?;

    debug!(
        "Wrote {} preferences to {}",
        store.num_preferences(),
        path.display()
    );
    Ok(())
}

/// Serializes `store` into any writer using the same line format.
pub fn write_to<W: Write>(store: &PreferenceStore, out: &mut W) -> std::io::Result<()> {
    for (user, item, value) in store.triples() {
        match store.timestamp(user, item) {
            Some(time) => writeln!(out, "{}\t{}\t{}\t{}", user, item, value, time)?,
            None => writeln!(out, "{}\t{}\t{}", user, item, value)?,
        }
    }
    Ok(())
}
