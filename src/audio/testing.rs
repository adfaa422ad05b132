use super::Instrument;
use crate::midi::Pitch;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub pitch: Pitch,
    pub duration: f64,
    pub time: f64,
    pub velocity: f32,
}

#[derive(Default)]
struct Log {
    resonance: Option<f32>,
    triggers: Vec<Trigger>,
}

/// Instrument fake; clones share one log
#[derive(Clone, Default)]
pub struct RecordingInstrument {
    log: Arc<Mutex<Log>>,
}

impl RecordingInstrument {
    pub fn resonance(&self) -> Option<f32> {
        self.log.lock().unwrap().resonance
    }

    pub fn triggers(&self) -> Vec<Trigger> {
        self.log.lock().unwrap().triggers.clone()
    }
}

impl Instrument for RecordingInstrument {
    fn set_resonance(&mut self, resonance: f32) {
        self.log.lock().unwrap().resonance = Some(resonance);
    }

    fn trigger_attack_release(&mut self, pitch: Pitch, duration: f64, time: f64, velocity: f32) {
        self.log.lock().unwrap().triggers.push(Trigger {
            pitch,
            duration,
            time,
            velocity,
        });
    }
}
