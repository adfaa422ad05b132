/// PLUCKSEQ - a pattern sequencer over a shared transport clock
///
/// This library provides the pieces a sequencer page is built from:
/// - Transport clock and the adapter that configures it
/// - Voices and notes with clear-before-reschedule registration
/// - Audio and MIDI instruments
/// - A key-value store binding for the pattern value

pub mod audio;
pub mod config;
pub mod error;
pub mod midi;
pub mod page;
pub mod sequencer;
pub mod store;
pub mod time;
pub mod transport;

// Re-export commonly used types
pub use audio::{AudioOutput, Instrument, InstrumentFactory, PluckSynth};
pub use error::{Error, Result};
pub use midi::{midi_note_name, MidiInstrument, Pitch};
pub use page::{Collaborators, Page};
pub use sequencer::{NoteParams, Sequencer};
pub use store::{Binding, MemoryStore, RemoteStore};
pub use time::TimeExpr;
pub use transport::{Clock, Scheduler, Transport, TransportConfig};
