//! Staged output directories.
//!
//! Filtered files are first written to a hidden sibling of the target
//! directory and only moved into place once every file succeeded, so a
//! failed run never leaves a half-written target behind.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Names of the `.csv` files directly inside `dir`, sorted.
///
/// # Errors
///
/// Returns an error if `dir` cannot be read.
pub fn csv_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_csv(&name) {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

fn is_csv(name: &str) -> bool {
    name.to_lowercase().ends_with(".csv")
}

/// A temporary directory next to the target, removed on drop.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    /// Creates a uniquely named staging directory beside `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn beside(target: &Path) -> io::Result<Self> {
        let parent = target
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let path = parent.join(format!(".unfallatlas-extract-{}", uuid::Uuid::new_v4()));
        fs::create_dir(&path)?;
        log::debug!("Staging output in {}", path.display());
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves every staged `.csv` file into `target` and deletes `.csv`
    /// files in `target` that were not staged. Other files are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be removed or moved.
    pub fn sync_into(&self, target: &Path) -> io::Result<()> {
        fs::create_dir_all(target)?;
        let staged = csv_files(&self.path)?;
        let keep: BTreeSet<String> = staged.iter().map(|name| name.to_lowercase()).collect();

        for stale in csv_files(target)? {
            if !keep.contains(&stale.to_lowercase()) {
                log::info!("Removing stale {stale}");
                fs::remove_file(target.join(&stale))?;
            }
        }

        for name in &staged {
            let destination = target.join(name);
            match fs::remove_file(&destination) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            fs::rename(self.path.join(name), destination)?;
        }
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            log::warn!("Failed to remove {}: {e}", self.path.display());
        }
    }
}
