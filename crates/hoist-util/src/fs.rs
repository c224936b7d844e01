use std::io::Write;
use std::path::{Path, PathBuf};

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Ensure a directory exists, creating it and any parents if needed.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Write `data` to a temporary file next to `dest`, ready to be persisted
/// over it. Dropping the returned file removes it.
pub fn stage_atomic(dest: &Path, data: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let dir = dest.parent().unwrap_or(Path::new("."));
    ensure_dir(dir)?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".hoist-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Write `data` to `dest` through a temporary file in the same directory,
/// then rename it into place.
///
/// Readers of `dest` see either the previous content or the complete new
/// content. If the write fails the temporary file is removed.
pub fn write_atomic(dest: &Path, data: &[u8]) -> std::io::Result<()> {
    stage_atomic(dest, data)?
        .persist(dest)
        .map_err(|e| e.error)?;
    Ok(())
}
