//! Crash-safe file replacement
//!
//! Uses the write-fsync-rename pattern:
//! 1. Write to a temporary sibling (`.<name>.tmp`)
//! 2. fsync the temporary file
//! 3. Atomic rename to the final path
//! 4. fsync the parent directory
//!
//! Either the complete new file is visible at the final path or the
//! previous one is; a partially written file never is.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const TEMP_PREFIX: &str = ".";
const TEMP_SUFFIX: &str = ".tmp";

/// Temporary path used while writing `path`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}{}", TEMP_PREFIX, name, TEMP_SUFFIX))
}

/// Write `bytes` to a temp file next to `path` and fsync it.
///
/// Returns the temp path. Call [`commit`] to move it into place.
pub fn stage(path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    let temp_path = temp_path_for(path);

    if temp_path.exists() {
        warn!(path = %temp_path.display(), "Removing stale temp file");
        let _ = std::fs::remove_file(&temp_path);
    }

    let result = (|| {
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();

    if let Err(e) = result {
        warn!(
            temp_path = %temp_path.display(),
            error = %e,
            "Write failed, cleaning up temp file"
        );
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(temp_path)
}

/// Rename a staged temp file over `path` and fsync the parent directory.
pub fn commit(temp_path: &Path, path: &Path) -> io::Result<()> {
    if let Err(e) = std::fs::rename(temp_path, path) {
        warn!(
            temp_path = %temp_path.display(),
            error = %e,
            "Rename failed, cleaning up temp file"
        );
        let _ = std::fs::remove_file(temp_path);
        return Err(e);
    }
    sync_parent(path)?;
    debug!(path = %path.display(), "Atomic rename completed");
    Ok(())
}

/// Remove temp files left behind by a crash mid-write.
///
/// Returns the number of files removed.
pub fn cleanup_temp_files(dir: &Path) -> io::Result<usize> {
    let mut count = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX) {
            std::fs::remove_file(entry.path())?;
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
        _ => Ok(()),
    }
}

// Directories can't be opened for fsync on Windows; rename durability is
// left to the filesystem there.
#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}
