// src/lock.rs
//! Exclusive lock file so overlapping scheduled runs do not race on the
//! remote document.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Held for the duration of one run; the file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// `Ok(None)` when another run holds the lock.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        Self::acquire_with(path, |w| {
            let stamp = format!(
                "pid={}\nstarted={}\n",
                std::process::id(),
                chrono::Utc::now().to_rfc3339()
            );
            w.write_all(stamp.as_bytes())
        })
    }

    fn acquire_with<F>(path: &Path, stamp: F) -> Result<Option<Self>>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut f) => {
                // Built before the stamp: dropping it on error removes the file.
                let lock = Self {
                    path: path.to_path_buf(),
                };
                let written = stamp(&mut f);
                drop(f);
                written.with_context(|| format!("writing lock file {}", path.display()))?;
                Ok(Some(lock))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e).with_context(|| format!("creating lock file {}", path.display())),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(error = ?e, path = %self.path.display(), "could not remove run lock");
        }
    }
}
