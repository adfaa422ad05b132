use crate::midi::{MidiError, PitchError};
use crate::store::{KeyError, StoreError};
use crate::time::TimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("time: {0}")]
    Time(#[from] TimeError),

    #[error("pitch: {0}")]
    Pitch(#[from] PitchError),

    #[error("key: {0}")]
    Key(#[from] KeyError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("MIDI: {0}")]
    Midi(#[from] MidiError),
}

pub type Result<T> = std::result::Result<T, Error>;
