use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Per-project tracker directory, also used under the home directory
pub const DATA_DIR_NAME: &str = ".weektrack";

/// The single JSON document holding every task and week
pub const TRACKER_FILE_NAME: &str = "tracker.json";

/// Directory the tracker document lives in.
///
/// The nearest `.weektrack` at or above the working directory wins; with none
/// found the per-user `~/.weektrack` is used.
pub fn get_tracker_dir() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;

    if let Some(local_dir) = find_local_dir(&current_dir) {
        return Ok(local_dir);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DATA_DIR_NAME))
}

/// Nearest ancestor of `start_dir` (itself included) that has a `.weektrack`
fn find_local_dir(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let data_dir = current.join(DATA_DIR_NAME);
        if data_dir.is_dir() {
            return Some(data_dir);
        }

        current = current.parent()?;
    }
}

/// Resolved tracker directory, created when missing
pub fn ensure_tracker_dir() -> Result<PathBuf> {
    let dir = get_tracker_dir()?;
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(dir)
}

/// Create `.weektrack` in the working directory so this project gets its own tracker.
/// Fails if one is already there.
pub fn init_local_dir() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    let data_dir = current_dir.join(DATA_DIR_NAME);

    if data_dir.exists() {
        anyhow::bail!("Tracker directory already exists: {}", data_dir.display());
    }

    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create directory: {}", data_dir.display()))?;

    Ok(data_dir)
}

/// Default location of `tracker.json` when no `--file` is given
pub fn tracker_file() -> Result<PathBuf> {
    Ok(ensure_tracker_dir()?.join(TRACKER_FILE_NAME))
}

/// Replace the tracker document in one step, so a crash never leaves a half-written file.
/// The temp file is created next to `path` to keep the rename on one filesystem.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Contents of a tracker document, `None` when there is none yet
pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
