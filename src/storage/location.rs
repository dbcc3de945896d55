//! Where the phonebook file lives.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::info;

use super::atomic::write_atomic;
use crate::codec::markup;
use crate::config::Config;
use crate::error::{PhonebookError, PhonebookResult};
use crate::models::Phonebook;

/// Supplies the directory holding the phonebook file.
///
/// The repository asks for the directory once per operation, so a change
/// made through [`set_directory`](StorageLocation::set_directory) takes
/// effect on the next call.
pub trait StorageLocation: Send + Sync {
    fn current_directory(&self) -> PhonebookResult<PathBuf>;

    /// Switch to another directory, creating it and seeding an empty
    /// phonebook file if needed.
    fn set_directory(&self, path: &Path) -> PhonebookResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageSettings {
    phonebook_dir: PathBuf,
}

fn invalid_path(path: &Path, reason: impl Into<String>) -> PhonebookError {
    PhonebookError::InvalidPath {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Make sure `directory` exists and contains `file_name`, writing the
/// empty phonebook skeleton when the file is absent.
pub fn prepare_directory(directory: &Path, file_name: &str) -> PhonebookResult<()> {
    if directory.as_os_str().is_empty() {
        return Err(invalid_path(directory, "path is empty"));
    }
    fs::create_dir_all(directory)
        .map_err(|e| invalid_path(directory, format!("cannot create directory: {}", e)))?;
    if !directory.is_dir() {
        return Err(invalid_path(directory, "not a directory"));
    }

    let file = directory.join(file_name);
    match fs::metadata(&file) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(invalid_path(&file, "phonebook path is not a regular file")),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            write_atomic(&file, &markup::encode(&Phonebook::new())).map_err(|e| {
                invalid_path(directory, format!("directory is not writable: {}", e))
            })?;
            info!("Seeded empty phonebook at {}", file.display());
            Ok(())
        }
        Err(err) => Err(invalid_path(&file, err.to_string())),
    }
}

fn read_settings(path: &Path) -> PhonebookResult<Option<StorageSettings>> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            PhonebookError::Format(format!("invalid settings file {}: {}", path.display(), e))
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PhonebookError::io(path, source)),
    }
}

fn write_settings(path: &Path, settings: &StorageSettings) -> PhonebookResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PhonebookError::io(parent, source))?;
    }
    let json = serde_json::to_vec_pretty(settings)
        .map_err(|e| PhonebookError::Encode(format!("settings: {}", e)))?;
    write_atomic(path, &json)
}

/// A directory on the local filesystem, optionally remembered in a JSON
/// settings file across restarts.
#[derive(Debug)]
pub struct LocalDirectory {
    directory: RwLock<PathBuf>,
    file_name: String,
    settings_file: Option<PathBuf>,
}

impl LocalDirectory {
    /// Use `directory`, preparing it for `file_name`.
    pub fn new(directory: impl Into<PathBuf>, file_name: impl Into<String>) -> PhonebookResult<Self> {
        let directory = directory.into();
        let file_name = file_name.into();
        prepare_directory(&directory, &file_name)?;
        Ok(Self {
            directory: RwLock::new(directory),
            file_name,
            settings_file: None,
        })
    }

    /// Persist future directory changes to `path`.
    pub fn with_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    /// Build from configuration. A directory saved in the settings file
    /// wins over `PHONEBOOK_DIR`.
    pub fn from_config(config: &Config) -> PhonebookResult<Self> {
        let saved = match &config.settings_file {
            Some(path) => read_settings(path)?,
            None => None,
        };
        let directory = saved
            .map(|settings| settings.phonebook_dir)
            .unwrap_or_else(|| config.phonebook_dir.clone());

        let location = Self::new(directory, config.phonebook_filename.clone())?;
        Ok(match &config.settings_file {
            Some(path) => location.with_settings_file(path.clone()),
            None => location,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl StorageLocation for LocalDirectory {
    fn current_directory(&self) -> PhonebookResult<PathBuf> {
        Ok(self
            .directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set_directory(&self, path: &Path) -> PhonebookResult<()> {
        prepare_directory(path, &self.file_name)?;
        if let Some(settings_file) = &self.settings_file {
            write_settings(
                settings_file,
                &StorageSettings {
                    phonebook_dir: path.to_path_buf(),
                },
            )?;
        }

        let mut current = self
            .directory
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        info!(
            "Phonebook directory changed from {} to {}",
            current.display(),
            path.display()
        );
        *current = path.to_path_buf();
        Ok(())
    }
}
