/// MIDI output using midir, and pitch names shared with the audio side
use crate::audio::Instrument;
use midir::{MidiOutput, MidiOutputConnection};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;

const CLIENT_NAME: &str = "pluckseq MIDI Output";
const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Sound controller 2 ("timbre/harmonic content"), used for resonance
const CC_RESONANCE: u8 = 71;

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("failed to create MIDI output: {0}")]
    Init(String),

    #[error("invalid MIDI port index {0}")]
    InvalidPort(usize),

    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("failed to send message: {0}")]
    Send(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    #[error("invalid pitch name: {0:?}")]
    Invalid(String),

    #[error("pitch out of MIDI range: {0:?}")]
    OutOfRange(String),
}

/// A MIDI note number; `C4` is 60
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pitch(u8);

impl Pitch {
    pub fn new(note: u8) -> Self {
        Self(note.min(127))
    }

    pub fn midi(&self) -> u8 {
        self.0
    }

    pub fn frequency(&self) -> f32 {
        440.0 * 2.0_f32.powf((self.0 as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&midi_note_name(self.0))
    }
}

impl FromStr for Pitch {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PitchError::Invalid(s.to_string());
        let s = s.trim();
        let mut chars = s.chars();

        let semitone: i32 = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (accidental, octave) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave.parse().map_err(|_| invalid())?;
        let note = (octave + 1) * 12 + semitone + accidental;
        u8::try_from(note)
            .ok()
            .filter(|n| *n <= 127)
            .map(Pitch)
            .ok_or_else(|| PitchError::OutOfRange(s.to_string()))
    }
}

pub fn midi_note_name(note: u8) -> String {
    let octave = (note / 12) as i32 - 1;
    let note_index = (note % 12) as usize;
    format!("{}{}", NOTE_NAMES[note_index], octave)
}

/// A voice that plays through an external MIDI port on its own channel
pub struct MidiInstrument {
    connection: Arc<Mutex<MidiOutputConnection>>,
    channel: u8,
}

impl MidiInstrument {
    pub fn available_ports() -> Vec<String> {
        if let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) {
            midi_out
                .ports()
                .iter()
                .filter_map(|p| midi_out.port_name(p).ok())
                .collect()
        } else {
            vec![]
        }
    }

    pub fn connect(port_index: usize, channel: u8) -> Result<Self, MidiError> {
        let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;

        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or(MidiError::InvalidPort(port_index))?;

        let connection = midi_out
            .connect(port, "pluckseq")
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        let channel = channel & 0x0f;
        log::info!("connected MIDI port {} on channel {}", port_index, channel + 1);
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            channel,
        })
    }

    fn send(&self, message: &[u8]) -> Result<(), MidiError> {
        send(&self.connection, message)
    }
}

fn send(connection: &Mutex<MidiOutputConnection>, message: &[u8]) -> Result<(), MidiError> {
    let mut conn = connection
        .lock()
        .map_err(|_| MidiError::Send("connection lock poisoned".to_string()))?;
    conn.send(message).map_err(|e| MidiError::Send(e.to_string()))
}

impl Instrument for MidiInstrument {
    fn set_resonance(&mut self, resonance: f32) {
        let value = (resonance / 10.0 * 127.0).clamp(0.0, 127.0) as u8;
        if let Err(e) = self.send(&[0xB0 | self.channel, CC_RESONANCE, value]) {
            log::warn!("resonance not sent: {}", e);
        }
    }

    fn trigger_attack_release(&mut self, pitch: Pitch, duration: f64, _time: f64, velocity: f32) {
        let note = pitch.midi();
        let velocity = (velocity.clamp(0.0, 1.0) * 127.0).round() as u8;
        if let Err(e) = self.send(&[0x90 | self.channel, note, velocity]) {
            log::warn!("note on {} not sent: {}", pitch, e);
            return;
        }

        // Schedule note off
        let connection = Arc::clone(&self.connection);
        let status = 0x80 | self.channel;
        let hold = Duration::from_secs_f64(duration.max(0.0));
        thread::spawn(move || {
            thread::sleep(hold);
            if let Err(e) = send(&connection, &[status, note, 0]) {
                log::warn!("note off {} not sent: {}", note, e);
            }
        });
    }
}
