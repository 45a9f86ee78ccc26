//! File-based settings store adapter.
//!
//! Each category lives in its own pretty-printed JSON file,
//! `<dir>/<category>.json`. Each write goes to its own temporary file and
//! is renamed into place, so neither a crash nor a concurrent writer can
//! publish a half-written category.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::traits::{SettingsError, SettingsStore};

#[derive(Debug, Error)]
enum FileStoreError {
    #[error("invalid category name '{0}'")]
    InvalidCategory(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}: expected a JSON object")]
    NotAnObject(PathBuf),
}

impl From<FileStoreError> for SettingsError {
    fn from(err: FileStoreError) -> Self {
        match err {
            FileStoreError::InvalidCategory(_) => SettingsError::Other(err.to_string()),
            FileStoreError::Io { .. } => SettingsError::Io(err.to_string()),
            FileStoreError::Json { .. } | FileStoreError::NotAnObject(_) => {
                SettingsError::Serialization(err.to_string())
            }
        }
    }
}

/// File-based settings store.
///
/// # Example
///
/// ```ignore
/// use educloud::adapters::FileSettingsStore;
///
/// let store = FileSettingsStore::new("/var/lib/educloud/settings");
/// let storage = store.get("storage").await?;
/// ```
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    dir: PathBuf,
}

impl FileSettingsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `category`.
    pub fn category_path(&self, category: &str) -> Result<PathBuf, SettingsError> {
        Ok(self.checked_path(category)?)
    }

    fn checked_path(&self, category: &str) -> Result<PathBuf, FileStoreError> {
        let valid = !category.is_empty()
            && category
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(FileStoreError::InvalidCategory(category.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", category)))
    }

    fn read(&self, category: &str) -> Result<Option<Map<String, Value>>, FileStoreError> {
        let path = self.checked_path(category)?;
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path).map_err(|source| FileStoreError::Io {
            path: path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| FileStoreError::Json {
                path: path.clone(),
                source,
            })?;

        match value {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(FileStoreError::NotAnObject(path)),
        }
    }

    fn write(&self, category: &str, value: &Map<String, Value>) -> Result<(), FileStoreError> {
        let path = self.checked_path(category)?;
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let tmp = self.dir.join(format!(".{}.{}.tmp", category, Uuid::new_v4().simple()));
        let written = write_json(&tmp, value).and_then(|()| {
            fs::rename(&tmp, &path).map_err(io_error(&path))
        });
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }
}

fn write_json(tmp: &Path, value: &Map<String, Value>) -> Result<(), FileStoreError> {
    let file = File::create(tmp).map_err(io_error(tmp))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| FileStoreError::Json {
        path: tmp.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error(tmp))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> FileStoreError {
    let path = path.to_path_buf();
    move |source| FileStoreError::Io { path, source }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, category: &str) -> Result<Option<Map<String, Value>>, SettingsError> {
        Ok(self.read(category)?)
    }

    async fn set(&self, category: &str, value: Map<String, Value>) -> Result<(), SettingsError> {
        Ok(self.write(category, &value)?)
    }
}
