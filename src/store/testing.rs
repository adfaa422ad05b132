/// Store fake: a `MemoryStore` that records every call made against it
use super::{KeyPath, Listener, ListenerId, MemoryStore, RemoteStore};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    On(KeyPath),
    Off(KeyPath),
    Set(KeyPath, String),
}

#[derive(Default)]
pub struct RecordingStore {
    store: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.store
    }
}

impl RemoteStore for RecordingStore {
    fn on_value(&self, key: &KeyPath, listener: Listener) -> ListenerId {
        self.calls.lock().unwrap().push(StoreCall::On(key.clone()));
        self.store.on_value(key, listener)
    }

    fn off(&self, key: &KeyPath, id: ListenerId) {
        self.calls.lock().unwrap().push(StoreCall::Off(key.clone()));
        self.store.off(key, id);
    }

    fn set(&self, key: &KeyPath, value: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Set(key.clone(), value.to_string()));
        self.store.set(key, value);
    }
}
