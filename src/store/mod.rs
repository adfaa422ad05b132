/// Remote key-value store contract: value subscriptions and writes by key path
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod binding;
pub mod memory;
#[cfg(test)]
pub mod testing;

pub use binding::{Binding, BindingState};
pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeyError {
    #[error("key path segment is empty")]
    Empty,

    #[error("key path segment {segment:?} contains {found:?}")]
    InvalidChar { segment: String, found: char },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Slash-separated path to a value; segments never contain `. # $ [ ] /`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(String);

impl KeyPath {
    pub fn root(segment: &str) -> Result<Self, KeyError> {
        validate_segment(segment)?;
        Ok(Self(segment.to_string()))
    }

    pub fn child(&self, segment: &str) -> Result<Self, KeyError> {
        validate_segment(segment)?;
        Ok(Self(format!("{}/{}", self.0, segment)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate_segment(segment: &str) -> Result<(), KeyError> {
    if segment.is_empty() {
        return Err(KeyError::Empty);
    }

    match segment
        .chars()
        .find(|c| matches!(c, '.' | '#' | '$' | '[' | ']' | '/') || c.is_control())
    {
        Some(found) => Err(KeyError::InvalidChar {
            segment: segment.to_string(),
            found,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

/// Receives the value at a key; `None` when nothing is stored there
pub type Listener = Box<dyn FnMut(Option<&str>) + Send>;

pub trait RemoteStore: Send + Sync {
    /// Subscribe to `key`. The listener is called right away with the
    /// current value and again after every change.
    fn on_value(&self, key: &KeyPath, listener: Listener) -> ListenerId;

    fn off(&self, key: &KeyPath, id: ListenerId);

    /// Fire-and-forget write
    fn set(&self, key: &KeyPath, value: &str);
}

pub type SharedStore = Arc<dyn RemoteStore>;
