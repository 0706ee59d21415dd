//! Persistence: key/value storage backends and the score store
//!
//! Features:
//! - `StorageBackend` over LocalStorage (web) or memory (native, tests)
//! - JSON score books keyed by game id
//! - Corrupt payloads are reported, never silently replaced

use std::collections::HashMap;
use std::fmt;

use crate::highscores::{ScoreBook, SessionStats};

/// Why a storage call failed
#[derive(Debug)]
pub enum StorageError {
    /// No storage available (private mode, no window)
    Unavailable,
    /// The backend refused the operation (quota, security error)
    Backend(String),
    /// Stored payload could not be parsed
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
    /// Value could not be encoded
    Encode(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "storage unavailable"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
            StorageError::Corrupt { key, source } => {
                write!(f, "corrupt data under '{key}': {source}")
            }
            StorageError::Encode(e) => write!(f, "failed to encode value: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Corrupt { source, .. } => Some(source),
            StorageError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

/// String key/value store
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local storage, used natively and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageBackend {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageBackend {
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }
}

/// High score and session statistics per game id
pub trait ScoreStore {
    fn load(&self, game: &str) -> Result<ScoreBook, StorageError>;
    fn save(&mut self, game: &str, book: &ScoreBook) -> Result<(), StorageError>;

    fn high_score(&self, game: &str) -> Result<u64, StorageError> {
        Ok(self.load(game)?.high_score)
    }

    fn set_high_score(&mut self, game: &str, score: u64) -> Result<(), StorageError> {
        let mut book = self.load(game)?;
        book.high_score = score;
        self.save(game, &book)
    }

    fn stats(&self, game: &str) -> Result<SessionStats, StorageError> {
        Ok(self.load(game)?.stats)
    }

    fn set_stats(&mut self, game: &str, stats: &SessionStats) -> Result<(), StorageError> {
        let mut book = self.load(game)?;
        book.stats = *stats;
        self.save(game, &book)
    }
}

/// Score books serialized as JSON into a storage backend
#[derive(Debug, Clone, Default)]
pub struct BookStore<B> {
    backend: B,
}

impl<B: StorageBackend> BookStore<B> {
    const KEY_PREFIX: &'static str = "retro_arcade_scores_";

    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn key(game: &str) -> String {
        format!("{}{}", Self::KEY_PREFIX, game)
    }
}

impl<B: StorageBackend> ScoreStore for BookStore<B> {
    fn load(&self, game: &str) -> Result<ScoreBook, StorageError> {
        let key = Self::key(game);
        match self.backend.get(&key)? {
            Some(json) => {
                serde_json::from_str(&json).map_err(|source| StorageError::Corrupt { key, source })
            }
            None => Ok(ScoreBook::default()),
        }
    }

    fn save(&mut self, game: &str, book: &ScoreBook) -> Result<(), StorageError> {
        let json = serde_json::to_string(book).map_err(StorageError::Encode)?;
        self.backend.set(&Self::key(game), &json)?;
        log::debug!("Saved score book for '{}' (best {})", game, book.high_score);
        Ok(())
    }
}

/// Read and decode a JSON value, `None` when the key is absent
pub fn load_json<T: serde::de::DeserializeOwned>(
    backend: &dyn StorageBackend,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match backend.get(key)? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub fn save_json<T: serde::Serialize>(
    backend: &mut dyn StorageBackend,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(StorageError::Encode)?;
    backend.set(key, &json)
}
