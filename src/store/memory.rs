/// In-process store with change notifications and an optional JSON snapshot
use super::{KeyPath, Listener, ListenerId, RemoteStore, StoreError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    values: BTreeMap<String, String>,
    listeners: BTreeMap<KeyPath, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

/// Listeners run with the store locked and must not call back into it.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load values from `path` if it exists; every write is saved back there
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let values = if path.exists() {
            serde_json::from_str(&fs::read_to_string(path)?)?
        } else {
            BTreeMap::new()
        };

        log::info!("store snapshot at {} ({} keys)", path.display(), values.len());
        Ok(Self {
            inner: Mutex::new(Inner {
                values,
                ..Inner::default()
            }),
            snapshot: Some(path.to_path_buf()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &KeyPath) -> Option<String> {
        self.lock().values.get(key.as_str()).cloned()
    }

    pub fn listener_count(&self, key: &KeyPath) -> usize {
        self.lock().listeners.get(key).map_or(0, Vec::len)
    }

    /// Write the snapshot file, if this store has one
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.lock().values)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn on_value(&self, key: &KeyPath, mut listener: Listener) -> ListenerId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);

        listener(inner.values.get(key.as_str()).map(String::as_str));
        inner
            .listeners
            .entry(key.clone())
            .or_default()
            .push((id, listener));
        id
    }

    fn off(&self, key: &KeyPath, id: ListenerId) {
        let mut inner = self.lock();
        if let Some(listeners) = inner.listeners.get_mut(key) {
            listeners.retain(|(listener_id, _)| *listener_id != id);
            if listeners.is_empty() {
                inner.listeners.remove(key);
            }
        }
    }

    fn set(&self, key: &KeyPath, value: &str) {
        {
            let mut inner = self.lock();
            inner
                .values
                .insert(key.as_str().to_string(), value.to_string());
            if let Some(listeners) = inner.listeners.get_mut(key) {
                for (_, listener) in listeners.iter_mut() {
                    listener(Some(value));
                }
            }
        }

        if let Err(e) = self.save() {
            log::warn!("could not save store snapshot: {}", e);
        }
    }
}
