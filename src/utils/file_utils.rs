//! File system utilities

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Ensure directory exists, creating all missing parents
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| anyhow!("Failed to create directory {}: {}", path.display(), e))?;
    }
    Ok(())
}

/// Check that the current process can create files inside `dir`.
///
/// Creates and removes a probe file; permission bits alone are not reliable
/// across platforms and mounts.
pub fn dir_is_writable(dir: &Path) -> bool {
    let probe = dir.join(".tube2mp3-write-probe");
    match fs::OpenOptions::new().write(true).create(true).open(&probe) {
        Ok(file) => {
            drop(file);
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Resolve a user-supplied path to an absolute, lexically normalized form
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    std::path::absolute(path)
}
