use anyhow::{Context, Result};
use std::path::Path;

/// Write data to a file atomically using temp-file + rename.
///
/// The temp file lives in the target's directory so the rename never crosses
/// filesystems. Readers see either the previous content or the new content.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target.parent().context("Target path has no parent")?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;

    std::io::Write::write_all(&mut tmp, data).context("Failed to write temp file")?;
    tmp.as_file()
        .sync_all()
        .context("Failed to flush temp file")?;

    tmp.persist(target)
        .with_context(|| format!("Failed to persist to {}", target.display()))?;

    Ok(())
}
