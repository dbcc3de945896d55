//! Per-file advisory locking.
//!
//! Writers lock a sidecar `.<file>.lock` next to the phonebook file rather
//! than the file itself, because the phonebook is replaced by rename and a
//! lock on the old inode would protect nothing. OS file locks work across
//! processes as well as across threads holding separate handles.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PhonebookError, PhonebookResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Exclusive lock on one phonebook file, released on drop.
#[derive(Debug)]
pub struct PathLock {
    file: File,
    lock_path: PathBuf,
}

/// Location of the sidecar lock file for `target`.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "phonebook".to_string());
    target.with_file_name(format!(".{}.lock", name))
}

impl PathLock {
    /// Block until the lock on `target` is held or `timeout` passes.
    ///
    /// Times out with [`PhonebookError::Busy`].
    pub fn acquire(target: &Path, timeout: Duration) -> PhonebookResult<Self> {
        let lock_path = lock_path_for(target);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| PhonebookError::io(&lock_path, source))?;

        let started = Instant::now();
        let mut contended = false;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    if contended {
                        tracing::debug!(
                            "Acquired lock on {} after {} ms",
                            target.display(),
                            started.elapsed().as_millis()
                        );
                    }
                    return Ok(Self { file, lock_path });
                }
                Err(err) if is_contended(&err) => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        tracing::warn!(
                            "Timed out after {} ms waiting for lock on {}",
                            waited.as_millis(),
                            target.display()
                        );
                        return Err(PhonebookError::Busy {
                            path: target.to_path_buf(),
                            waited_ms: waited.as_millis() as u64,
                        });
                    }
                    contended = true;
                    thread::sleep(POLL_INTERVAL.min(timeout - waited));
                }
                Err(source) => return Err(PhonebookError::io(&lock_path, source)),
            }
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == fs2::lock_contended_error().kind() || err.kind() == io::ErrorKind::WouldBlock
}

impl Drop for PathLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_is_hidden_sidecar() {
        let path = lock_path_for(Path::new("/data/rem.xml"));
        assert_eq!(path, PathBuf::from("/data/.rem.xml.lock"));
    }

    #[test]
    fn test_second_acquire_times_out_as_busy() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("rem.xml");

        let held = PathLock::acquire(&target, Duration::from_millis(100)).unwrap();
        let started = Instant::now();
        let second = PathLock::acquire(&target, Duration::from_millis(60));
        assert!(matches!(second, Err(PhonebookError::Busy { .. })));
        assert!(started.elapsed() >= Duration::from_millis(60));

        drop(held);
        assert!(PathLock::acquire(&target, Duration::from_millis(100)).is_ok());
    }

    #[test]
    fn test_locks_are_per_path() {
        let dir = TempDir::new().unwrap();
        let _a = PathLock::acquire(&dir.path().join("a.xml"), Duration::ZERO).unwrap();
        let b = PathLock::acquire(&dir.path().join("b.xml"), Duration::ZERO);
        assert!(b.is_ok());
    }

    #[test]
    fn test_waiter_gets_lock_after_release() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("rem.xml");
        let held = PathLock::acquire(&target, Duration::ZERO).unwrap();

        let waiter_target = target.clone();
        let waiter = thread::spawn(move || {
            PathLock::acquire(&waiter_target, Duration::from_secs(5)).map(|_| ())
        });
        thread::sleep(Duration::from_millis(50));
        drop(held);
        assert!(waiter.join().unwrap().is_ok());
    }
}
