//! Atomic file replacement.
//!
//! Content goes to a uniquely named temporary file next to the target,
//! is flushed to disk, and is then renamed over the target. Readers see
//! either the old file or the new one, never a prefix of the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{PhonebookError, PhonebookResult};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

fn temp_path_for(path: &Path) -> PhonebookResult<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        PhonebookError::io(path, io::Error::other("path has no parent directory"))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| PhonebookError::io(path, io::Error::other("path has no file name")))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    Ok(parent.join(format!(
        ".{}.tmp.{}.{}.{}",
        file_name.to_string_lossy(),
        std::process::id(),
        nanos,
        seq
    )))
}

/// Replace `path` with `contents`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> PhonebookResult<()> {
    write_atomic_with(path, |file| file.write_all(contents))
}

/// Replace `path` with whatever `write` puts into the temporary file.
///
/// If `write` fails, the temporary file is removed and `path` is left
/// exactly as it was.
pub fn write_atomic_with<F>(path: &Path, write: F) -> PhonebookResult<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let tmp_path = temp_path_for(path)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| PhonebookError::io(&tmp_path, source))?;

    let written = write(&mut file).and_then(|()| file.sync_all());
    drop(file);
    if let Err(source) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(PhonebookError::io(&tmp_path, source));
    }

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(PhonebookError::io(path, source));
    }

    #[cfg(unix)]
    {
        // Persist the rename itself; failure here does not undo it.
        if let Some(dir) = path.parent().and_then(|parent| File::open(parent).ok()) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
