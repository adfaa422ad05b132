/// Persistence binding - mirrors one remote key into local state
use super::{KeyPath, ListenerId, SharedStore};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct BindingState {
    /// Last value seen at the bound key; empty when the key holds nothing
    pub value: String,
    /// Local play toggle, never written to the store
    pub is_playing: bool,
}

impl Default for BindingState {
    fn default() -> Self {
        Self {
            value: String::new(),
            is_playing: true,
        }
    }
}

struct Subscription {
    key: KeyPath,
    id: ListenerId,
}

pub struct Binding {
    store: SharedStore,
    state: Arc<Mutex<BindingState>>,
    subscription: Option<Subscription>,
}

impl Binding {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(BindingState::default())),
            subscription: None,
        }
    }

    pub fn bind(store: SharedStore, key: KeyPath) -> Self {
        let mut binding = Self::new(store);
        binding.listen_to(key);
        binding
    }

    /// Move the subscription to `key`, dropping the previous one first
    pub fn listen_to(&mut self, key: KeyPath) {
        self.unsubscribe();

        let state = Arc::clone(&self.state);
        let id = self.store.on_value(
            &key,
            Box::new(move |value| {
                lock(&state).value = value.unwrap_or_default().to_string();
            }),
        );
        log::debug!("subscribed to {}", key);
        self.subscription = Some(Subscription { key, id });
    }

    pub fn unsubscribe(&mut self) {
        if let Some(Subscription { key, id }) = self.subscription.take() {
            self.store.off(&key, id);
            log::debug!("unsubscribed from {}", key);
        }
    }

    pub fn key(&self) -> Option<&KeyPath> {
        self.subscription.as_ref().map(|s| &s.key)
    }

    /// Push `value` to the bound key. Does nothing while unbound.
    pub fn write(&self, value: &str) {
        if let Some(subscription) = &self.subscription {
            self.store.set(&subscription.key, value);
        }
    }

    pub fn state(&self) -> BindingState {
        lock(&self.state).clone()
    }

    pub fn value(&self) -> String {
        lock(&self.state).value.clone()
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).is_playing
    }

    pub fn set_playing(&self, is_playing: bool) {
        lock(&self.state).is_playing = is_playing;
    }
}

fn lock(state: &Mutex<BindingState>) -> MutexGuard<'_, BindingState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{RecordingStore, StoreCall};
    use crate::store::RemoteStore;

    fn key(title: &str) -> KeyPath {
        KeyPath::root("sequencers").unwrap().child(title).unwrap()
    }

    #[test]
    fn test_mirrors_remote_value() {
        let store = Arc::new(RecordingStore::default());
        store.set(&key("demo"), "first");

        let binding = Binding::bind(store.clone(), key("demo"));
        assert_eq!(binding.value(), "first");

        store.set(&key("demo"), "second");
        assert_eq!(binding.value(), "second");
    }

    #[test]
    fn test_missing_key_reads_as_empty() {
        let store = Arc::new(RecordingStore::default());
        let binding = Binding::bind(store, key("fresh"));
        assert_eq!(binding.state(), BindingState::default());
    }

    #[test]
    fn test_switching_keys_moves_the_subscription() {
        let store = Arc::new(RecordingStore::default());
        let mut binding = Binding::bind(store.clone(), key("one"));
        store.reset();

        binding.listen_to(key("two"));
        assert_eq!(
            store.calls(),
            vec![StoreCall::Off(key("one")), StoreCall::On(key("two"))]
        );
        assert_eq!(store.inner().listener_count(&key("one")), 0);

        store.set(&key("one"), "stale");
        assert_eq!(binding.value(), "");
        assert_eq!(binding.key(), Some(&key("two")));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let store = Arc::new(RecordingStore::default());
        let binding = Binding::bind(store.clone(), key("demo"));
        drop(binding);

        assert_eq!(store.calls().last(), Some(&StoreCall::Off(key("demo"))));
        assert_eq!(store.inner().listener_count(&key("demo")), 0);
    }

    #[test]
    fn test_write_goes_to_bound_key() {
        let store = Arc::new(RecordingStore::default());
        let unbound = Binding::new(store.clone());
        unbound.write("ignored");
        assert!(store.calls().is_empty());

        let binding = Binding::bind(store.clone(), key("demo"));
        binding.write("C D E");
        assert_eq!(store.inner().get(&key("demo")).as_deref(), Some("C D E"));
        assert_eq!(binding.value(), "C D E");
    }

    #[test]
    fn test_play_toggle_is_local() {
        let store = Arc::new(RecordingStore::default());
        let binding = Binding::bind(store.clone(), key("demo"));
        store.reset();

        assert!(binding.is_playing());
        binding.set_playing(false);
        assert!(!binding.is_playing());
        assert!(store.calls().is_empty());
    }
}
