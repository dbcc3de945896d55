//! Filesystem plumbing for the repository: where the file is, how it is
//! replaced, and how writers take turns.

pub mod atomic;
pub mod location;
pub mod lock;

pub use atomic::{write_atomic, write_atomic_with};
pub use location::{prepare_directory, LocalDirectory, StorageLocation};
pub use lock::{lock_path_for, PathLock};
