//! Single-instance lock file.
//!
//! Two controllers driving the same GPIO lines would fight over the motor, so the
//! daemon holds an exclusive `fs2` lock on `$XDG_RUNTIME_DIR/coopdoor.lock` for
//! its whole lifetime. The holder's PID is written inside for diagnostics.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::LOCK_FILE_NAME;

/// A held lock. Released and removed on drop.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Outcome of trying to take the lock.
#[derive(Debug)]
pub enum LockAttempt {
    Acquired(LockFile),
    /// Another instance holds the lock; its PID when the file was readable.
    HeldBy(Option<u32>),
}

/// Default lock location, falling back to `/tmp` without a runtime directory.
pub fn default_lock_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(LOCK_FILE_NAME)
}

/// Try to take the lock at `path` without blocking.
pub fn acquire_lock(path: &Path) -> Result<LockAttempt> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        let holder = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| content.lines().next()?.trim().parse().ok());
        return Ok(LockAttempt::HeldBy(holder));
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;

    Ok(LockAttempt::Acquired(LockFile {
        file,
        path: path.to_path_buf(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_writes_pid_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let lock = match acquire_lock(&path).unwrap() {
            LockAttempt::Acquired(lock) => lock,
            LockAttempt::HeldBy(pid) => panic!("unexpectedly held by {pid:?}"),
        };
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_lock_reports_holder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let _held = acquire_lock(&path).unwrap();
        match acquire_lock(&path).unwrap() {
            LockAttempt::HeldBy(pid) => assert_eq!(pid, Some(std::process::id())),
            LockAttempt::Acquired(_) => panic!("lock acquired twice"),
        }
    }
}
