// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for the courseware player.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::prefs::PlayerPrefs;

/// Logical key under which [`PlayerPrefs`] are stored.
pub const PLAYER_PREFS_KEY: &str = "player-prefs";

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("config key not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    /// Blob was not valid JSON for the requested type.
    #[error("config decode error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure.
    #[error("config store error: {0}")]
    Other(String),
}

/// Serializes config values as JSON and delegates storage to a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize the value for `key`. Missing or empty blobs are `Ok(None)`.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist `value` under `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Load player prefs, falling back to defaults when nothing has been saved.
    pub fn load_player_prefs(&self) -> Result<PlayerPrefs, ConfigError> {
        Ok(self.load(PLAYER_PREFS_KEY)?.unwrap_or_default())
    }

    /// Persist player prefs under [`PLAYER_PREFS_KEY`].
    pub fn save_player_prefs(&self, prefs: &PlayerPrefs) -> Result<(), ConfigError> {
        self.save(PLAYER_PREFS_KEY, prefs)
    }
}
