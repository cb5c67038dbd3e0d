//! File-backed secure store
//!
//! One record per file, sealed with [`envelope::seal`]. The fallible calls
//! report every failure; the recovering calls substitute the default and log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::atomic::{remove_if_exists, write_text_atomic};
use super::envelope::{self, Keys};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct SecureStore {
    path: PathBuf,
    keys: Keys,
}

impl SecureStore {
    /// Store at `path` under the default master secret
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_keys(path, Keys::default())
    }

    pub fn with_secret<P: AsRef<Path>>(path: P, master: &str) -> Self {
        Self::with_keys(path, Keys::derive(master))
    }

    pub fn with_keys<P: AsRef<Path>>(path: P, keys: Keys) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            keys,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn save<T: Serialize>(&self, record: &T) -> Result<()> {
        let json = serde_json::to_vec(record)?;
        let sealed = envelope::seal(&self.keys, &json)?;
        write_text_atomic(&self.path, &sealed)?;
        Ok(())
    }

    /// `Ok(None)` when the file does not exist
    pub fn try_load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let encoded = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        let plaintext = envelope::open(&self.keys, &encoded)?;
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    /// Load the record, or the type's default on any failure
    pub fn load_or_default<T: DeserializeOwned + Default>(&self) -> T {
        match self.try_load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::info!("No saved data at {}", self.path.display());
                T::default()
            }
            Err(error) => {
                log::warn!("Discarding {}: {error}", self.path.display());
                T::default()
            }
        }
    }

    /// Save, logging instead of propagating a failure. Returns whether it succeeded.
    pub fn save_or_log<T: Serialize>(&self, record: &T) -> bool {
        match self.save(record) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("Failed to write {}: {error}", self.path.display());
                false
            }
        }
    }

    pub fn delete(&self) -> Result<()> {
        remove_if_exists(&self.path).map_err(StoreError::from)
    }
}
