// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use std::sync::{Arc, Mutex, MutexGuard};

use courseware_app_core::config::{ConfigError, ConfigStore, PLAYER_PREFS_KEY};
use courseware_app_core::prefs::PlayerPrefs;
use rustc_hash::FxHashMap;

/// In-memory [`ConfigStore`] that counts calls and can be told to fail.
///
/// Clones share state, so a test can hand one clone to a `ConfigService`
/// and inspect the other.
///
/// # Example
///
/// ```
/// use courseware_app_core::config::ConfigService;
/// use courseware_app_core::prefs::PlayerPrefs;
/// use courseware_dry_tests::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// assert_eq!(service.load_player_prefs().unwrap(), PlayerPrefs::default());
/// service.save_player_prefs(&PlayerPrefs::default()).unwrap();
/// assert_eq!((store.load_count(), store.save_count()), (1, 1));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: FxHashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already holding `prefs` under the player prefs key.
    pub fn with_prefs(prefs: &PlayerPrefs) -> Self {
        let store = Self::new();
        // Plain fields only; serialization is infallible.
        let bytes = serde_json::to_vec(prefs).unwrap_or_default();
        store.lock().data.insert(PLAYER_PREFS_KEY.to_owned(), bytes);
        store
    }

    /// Store holding a raw blob under `key` (e.g. corrupt JSON).
    pub fn with_raw(key: &str, bytes: &[u8]) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), bytes.to_vec());
        store
    }

    /// Make `load_raw` fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Make `save_raw` fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Attempted loads, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Attempted saves, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Raw blob under `key`, if any.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().data.get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
