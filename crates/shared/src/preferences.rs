//! Persisted user preferences: the selected currency and the watchlist.
//!
//! Values are loaded once when the store is created and written through to
//! the backend on every mutation. A persisted value that cannot be parsed is
//! discarded, replaced by its default and written back.

use crate::types::Currency;
use crate::watchlist::Watchlist;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CURRENCY_KEY: &str = "currency";
pub const WATCHLIST_KEY: &str = "crypto-watchlist";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to write preferences: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Flat string key/value storage, the same shape as browser local storage.
pub trait StorageBackend: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), PreferenceError>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Stores all keys as one JSON object in a single file. The whole file is
/// rewritten on every `set`.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileBackend {
    /// Opens the file at `path`. A missing file starts empty; an unreadable
    /// or corrupt one is logged and also starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Discarding corrupt preferences file {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences file at {}, starting fresh", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Failed to read preferences file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        FileBackend { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

pub struct PreferenceStore {
    backend: Box<dyn StorageBackend>,
    currency: Currency,
    watchlist: Watchlist,
}

impl PreferenceStore {
    pub fn load(backend: impl StorageBackend + 'static) -> Self {
        let mut backend: Box<dyn StorageBackend> = Box::new(backend);

        let currency = match backend.get(CURRENCY_KEY) {
            None => Currency::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("Resetting persisted currency: {}", e);
                let currency = Currency::default();
                persist(backend.as_mut(), CURRENCY_KEY, currency.as_str().to_string());
                currency
            }),
        };

        let watchlist = match backend.get(WATCHLIST_KEY) {
            None => Watchlist::default(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Failed to parse watchlist, resetting: {}", e);
                persist(backend.as_mut(), WATCHLIST_KEY, "[]".to_string());
                Watchlist::default()
            }),
        };

        debug!(
            "Loaded preferences: currency={}, {} watched coins",
            currency,
            watchlist.len()
        );

        PreferenceStore {
            backend,
            currency,
            watchlist,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn set_currency(&mut self, currency: Currency) -> Result<(), PreferenceError> {
        if self.currency == currency {
            return Ok(());
        }
        self.currency = currency;
        self.backend.set(CURRENCY_KEY, currency.as_str().to_string())
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn is_in_watchlist(&self, coin_id: &str) -> bool {
        self.watchlist.contains(coin_id)
    }

    pub fn add_to_watchlist(&mut self, coin_id: &str) -> Result<bool, PreferenceError> {
        let added = self.watchlist.insert(coin_id);
        if added {
            self.save_watchlist()?;
        }
        Ok(added)
    }

    pub fn remove_from_watchlist(&mut self, coin_id: &str) -> Result<bool, PreferenceError> {
        let removed = self.watchlist.remove(coin_id);
        if removed {
            self.save_watchlist()?;
        }
        Ok(removed)
    }

    /// Returns whether the coin is watched after the toggle.
    pub fn toggle_watchlist(&mut self, coin_id: &str) -> Result<bool, PreferenceError> {
        let watched = self.watchlist.toggle(coin_id);
        self.save_watchlist()?;
        Ok(watched)
    }

    fn save_watchlist(&mut self) -> Result<(), PreferenceError> {
        let encoded = serde_json::to_string(&self.watchlist)?;
        self.backend.set(WATCHLIST_KEY, encoded)
    }
}

fn persist(backend: &mut dyn StorageBackend, key: &str, value: String) {
    if let Err(e) = backend.set(key, value) {
        warn!("Failed to persist default for {}: {}", key, e);
    }
}
