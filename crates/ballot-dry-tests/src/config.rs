// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use ballot_app_core::config::{ConfigError, ConfigStore};

/// In-memory [`ConfigStore`] that counts saves and can simulate failures.
///
/// Clones share state, so a test can hand one clone to a `ConfigService` and
/// inspect the other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    save_count: usize,
    fail_on_load: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `key` → `json`.
    pub fn with_json(key: &str, json: &str) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), json.as_bytes().to_vec());
        store
    }

    /// Make every subsequent load fail with `ConfigError::Other`.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Number of `save_raw` calls so far.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Stored blob for `key` as UTF-8, if any.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.lock()
            .data
            .get(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let inner = self.lock();
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use ballot_app_core::config::ConfigService;
    use ballot_engine::{EngineSettings, SETTINGS_KEY};

    #[test]
    fn engine_settings_are_persisted_once_when_absent() {
        let store = InMemoryConfigStore::new();
        let svc = ConfigService::new(store.clone());

        let first: EngineSettings = svc.load_or_init(SETTINGS_KEY).unwrap();
        assert_eq!(first, EngineSettings::default());
        assert_eq!(store.save_count(), 1);

        let _again: EngineSettings = svc.load_or_init(SETTINGS_KEY).unwrap();
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn stored_settings_win_over_defaults() {
        let store = InMemoryConfigStore::with_json(SETTINGS_KEY, r#"{"listing_display":3}"#);
        let svc = ConfigService::new(store.clone());
        let s: EngineSettings = svc.load_or_init(SETTINGS_KEY).unwrap();
        assert_eq!(s.listing_display, 3);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn load_failure_surfaces_as_error() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_load(true);
        let svc = ConfigService::new(store);
        assert!(matches!(
            svc.load::<EngineSettings>(SETTINGS_KEY),
            Err(ConfigError::Other(_))
        ));
    }
}
