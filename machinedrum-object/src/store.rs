//! Preferences that should outlive the session, when the host lets them.
//!
//! [`PersistentKeyValueStore`] writes through to a [`DurableBackend`] and keeps an
//! in-process copy of anything the backend refused. Callers never see a failure, only a
//! `false` from the writing operations telling them the value is not durable.

use crate::error::StoreError;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

/// Firmware version the user last selected.
pub const KEY_OS_VERSION: &str = "md.osVersion";
/// Hardware model the user last selected.
pub const KEY_MODEL: &str = "md.model";

pub const DEFAULT_STORE_PATH: &str = "~/.machinedrum/preferences.json";

const PROBE_KEY: &str = "__md_store_probe__";

/// A persistent string map provided by the host.
pub trait DurableBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;

    /// Writes, reads back and removes a sentinel entry.
    fn probe(&self) -> Result<(), StoreError> {
        self.set(PROBE_KEY, PROBE_KEY)?;
        let read_back = self.get(PROBE_KEY)?;
        self.remove(PROBE_KEY)?;
        if read_back.as_deref() == Some(PROBE_KEY) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "the probe entry did not read back".to_owned(),
            ))
        }
    }
}

/// Expands a leading `~` to the home directory, leaving the path as is when there is none.
#[instrument]
pub fn expand_tilde(path_candidate: &str) -> Utf8PathBuf {
    let Some(path_without_tilde) = path_candidate.strip_prefix('~') else {
        return Utf8PathBuf::from(path_candidate);
    };

    match homedir::my_home().ok().flatten() {
        Some(home_dir) => match home_dir.to_str() {
            Some(home_dir_str) => {
                let expanded_path = format!("{home_dir_str}{path_without_tilde}");
                debug!("Expanded {} to {}.", path_candidate, expanded_path);
                Utf8PathBuf::from(expanded_path)
            }
            None => {
                warn!("Home directory is not valid UTF-8, the path will be used as is.");
                Utf8PathBuf::from(path_candidate)
            }
        },
        None => {
            warn!("Failed to get home directory, the path will be used as is.");
            Utf8PathBuf::from(path_candidate)
        }
    }
}

/// Keeps the whole map in one pretty printed JSON file.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: Utf8PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            path: expand_tilde(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let mut map = self.load()?;
        f(&mut map);
        self.save(&map)
    }
}

impl DurableBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|map| {
            map.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|map| {
            map.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.into_keys().collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.save(&BTreeMap::new())
    }
}

/// A backend living in memory. The failing variant refuses every call, standing in for a
/// host whose storage is disabled. A read only backend passes its probe until switched,
/// then refuses writes, like a disk that filled up mid session.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
    failing: bool,
    read_only: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Release);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Unavailable("storage is disabled".to_owned()))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.read_only.load(Ordering::Acquire) {
            Err(StoreError::Unavailable("storage is read only".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl DurableBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.check()?;
        Ok(self.entries.lock().keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.check_writable()?;
        self.entries.lock().clear();
        Ok(())
    }
}

/// Writes the durable backend refused. Always newer than what the backend holds.
#[derive(Debug, Default)]
struct Overlay {
    values: HashMap<String, String>,
    removed: BTreeSet<String>,
}

/// Key value store that degrades to memory instead of failing.
pub struct PersistentKeyValueStore<B: DurableBackend> {
    backend: B,
    usable: OnceLock<bool>,
    overlay: Mutex<Overlay>,
}

impl PersistentKeyValueStore<JsonFileBackend> {
    /// A store backed by the preferences file in the user's home directory.
    pub fn open_default() -> Self {
        Self::new(JsonFileBackend::new(DEFAULT_STORE_PATH))
    }
}

impl<B: DurableBackend> PersistentKeyValueStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            usable: OnceLock::new(),
            overlay: Mutex::new(Overlay::default()),
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the backend passed its probe. The probe runs once per store.
    pub fn is_durable(&self) -> bool {
        *self.usable.get_or_init(|| match self.backend.probe() {
            Ok(()) => true,
            Err(err) => {
                warn!("Durable store unusable, preferences will last for this session only. {}", err);
                false
            }
        })
    }

    fn durable<T>(&self, op: &str, f: impl FnOnce(&B) -> Result<T, StoreError>) -> Option<T> {
        if !self.is_durable() {
            return None;
        }
        f(&self.backend)
            .inspect_err(|err| warn!("Store {} fell back to memory. {}", op, err))
            .ok()
    }

    #[instrument(skip(self))]
    pub fn get(&self, key: &str) -> Option<String> {
        {
            let overlay = self.overlay.lock();
            if overlay.removed.contains(key) {
                return None;
            }
            if let Some(value) = overlay.values.get(key) {
                return Some(value.clone());
            }
        }
        self.durable("get", |b| b.get(key)).flatten()
    }

    /// Returns false when the value only made it into memory.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: &str) -> bool {
        let durable = self.durable("set", |b| b.set(key, value)).is_some();
        let mut overlay = self.overlay.lock();
        overlay.removed.remove(key);
        if durable {
            overlay.values.remove(key);
        } else {
            overlay.values.insert(key.to_owned(), value.to_owned());
        }
        durable
    }

    /// Returns false when the removal only holds for this session.
    #[instrument(skip(self))]
    pub fn remove(&self, key: &str) -> bool {
        let durable = self.durable("remove", |b| b.remove(key)).is_some();
        let mut overlay = self.overlay.lock();
        overlay.values.remove(key);
        if durable {
            overlay.removed.remove(key);
        } else {
            overlay.removed.insert(key.to_owned());
        }
        durable
    }

    /// Every key known to either side, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self
            .durable("keys", |b| b.keys())
            .unwrap_or_default()
            .into_iter()
            .collect();
        let overlay = self.overlay.lock();
        keys.retain(|key| !overlay.removed.contains(key));
        keys.extend(overlay.values.keys().cloned());
        keys.into_iter().collect()
    }

    pub fn clear(&self) -> bool {
        if self.durable("clear", |b| b.clear()).is_some() {
            *self.overlay.lock() = Overlay::default();
            return true;
        }
        // Whatever the backend still holds must stay hidden.
        let stale = self.durable("keys", |b| b.keys()).unwrap_or_default();
        let mut overlay = self.overlay.lock();
        overlay.values.clear();
        overlay.removed.extend(stale);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get_with_durable_backend() {
        let store = PersistentKeyValueStore::new(MemoryBackend::new());
        assert!(store.is_durable());
        assert!(store.set(KEY_OS_VERSION, "1.63"));
        assert_eq!(store.get(KEY_OS_VERSION).as_deref(), Some("1.63"));
    }

    #[test]
    fn test_set_then_get_without_durable_backend() {
        let store = PersistentKeyValueStore::new(MemoryBackend::failing());
        assert!(!store.is_durable());
        assert!(!store.set(KEY_OS_VERSION, "1.63"));
        assert_eq!(store.get(KEY_OS_VERSION).as_deref(), Some("1.63"));
        assert_eq!(store.keys(), vec![KEY_OS_VERSION.to_owned()]);
        assert!(!store.remove(KEY_OS_VERSION));
        assert_eq!(store.get(KEY_OS_VERSION), None);
    }

    #[test]
    fn test_clear_and_keys() {
        let store = PersistentKeyValueStore::new(MemoryBackend::new());
        store.set("b", "2");
        store.set("a", "1");
        assert_eq!(store.keys(), vec!["a".to_owned(), "b".to_owned()]);
        assert!(store.clear());
        assert!(store.keys().is_empty());
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_probe_leaves_no_trace() {
        let store = PersistentKeyValueStore::new(MemoryBackend::new());
        assert!(store.is_durable());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_json_file_backend_persists_between_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let path = path.to_str().unwrap().to_owned();

        let store = PersistentKeyValueStore::new(JsonFileBackend::new(&path));
        assert!(store.set(KEY_MODEL, "uw_mk1"));
        drop(store);

        let store = PersistentKeyValueStore::new(JsonFileBackend::new(&path));
        assert_eq!(store.get(KEY_MODEL).as_deref(), Some("uw_mk1"));
        assert!(store.remove(KEY_MODEL));
        assert_eq!(store.get(KEY_MODEL), None);
    }

    #[test]
    fn test_corrupt_file_degrades_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = PersistentKeyValueStore::new(JsonFileBackend::new(path.to_str().unwrap()));
        assert!(!store.is_durable());
        assert!(!store.set("k", "v"));
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_tilde_expansion_only_touches_leading_tilde() {
        assert_eq!(expand_tilde("/tmp/x~y"), Utf8PathBuf::from("/tmp/x~y"));
        assert!(!expand_tilde("~/prefs.json").as_str().is_empty());
    }

    #[test]
    fn test_refused_writes_shadow_older_durable_values() {
        let store = PersistentKeyValueStore::new(MemoryBackend::new());
        assert!(store.set(KEY_OS_VERSION, "1.70"));
        store.backend().set_read_only(true);

        assert!(!store.set(KEY_OS_VERSION, "1.63"));
        assert_eq!(store.get(KEY_OS_VERSION).as_deref(), Some("1.63"));

        assert!(!store.remove(KEY_OS_VERSION));
        assert_eq!(store.get(KEY_OS_VERSION), None);
        assert!(store.keys().is_empty());

        assert!(!store.set(KEY_MODEL, "mk2"));
        assert!(!store.clear());
        assert_eq!(store.get(KEY_MODEL), None);
        assert!(store.keys().is_empty());

        store.backend().set_read_only(false);
        assert!(store.set(KEY_OS_VERSION, "1.71"));
        assert_eq!(store.get(KEY_OS_VERSION).as_deref(), Some("1.71"));
        assert_eq!(store.keys(), vec![KEY_OS_VERSION.to_owned()]);
    }
}
