/// Voice - one instrument and the notes scheduled on it
use super::note::{Note, NoteParams};
use super::pattern::VoiceSpec;
use crate::audio::{Instrument, SharedInstrument, DEFAULT_RESONANCE};
use crate::midi::Pitch;
use crate::time::TimeExpr;
use crate::transport::{Callback, EventId, Fire, SharedScheduler};
use std::sync::{Arc, Mutex};

/// Scheduling capability a voice hands to its notes
#[derive(Clone)]
pub struct VoiceContext {
    scheduler: SharedScheduler,
    instrument: SharedInstrument,
}

impl VoiceContext {
    pub fn new(scheduler: SharedScheduler, instrument: Box<dyn Instrument>) -> Self {
        Self {
            scheduler,
            instrument: Arc::new(Mutex::new(instrument)),
        }
    }

    /// Register a one-shot trigger of `note` at transport `time`
    pub fn schedule(
        &self,
        note: Pitch,
        time: TimeExpr,
        duration: TimeExpr,
        velocity: f32,
    ) -> EventId {
        let instrument = Arc::clone(&self.instrument);
        let play: Callback = Box::new(move |fire: Fire| {
            let mut instrument = instrument.lock().unwrap_or_else(|e| e.into_inner());
            instrument.trigger_attack_release(note, duration.to_seconds(fire.bpm), fire.time, velocity);
        });
        self.scheduler.schedule(play, time)
    }

    pub fn clear(&self, id: EventId) {
        self.scheduler.clear(id);
    }

    fn set_resonance(&self, resonance: f32) {
        self.instrument
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .set_resonance(resonance);
    }
}

pub struct Voice {
    context: VoiceContext,
    notes: Vec<Note>,
}

impl Voice {
    /// Resonance is fixed here for the lifetime of the voice
    pub fn mount(scheduler: SharedScheduler, instrument: Box<dyn Instrument>, spec: &VoiceSpec) -> Self {
        let context = VoiceContext::new(scheduler, instrument);
        context.set_resonance(spec.resonance.unwrap_or(DEFAULT_RESONANCE));

        let mut voice = Self {
            context,
            notes: Vec::with_capacity(spec.notes.len()),
        };
        voice.render(&spec.notes);
        voice
    }

    /// Match notes up by position: update, mount new ones, drop the rest
    pub fn render(&mut self, notes: &[NoteParams]) {
        for (i, params) in notes.iter().enumerate() {
            match self.notes.get_mut(i) {
                Some(note) => note.update(params.clone()),
                None => self.notes.push(Note::mount(self.context.clone(), params.clone())),
            }
        }
        self.notes.truncate(notes.len());
    }

    pub fn context(&self) -> VoiceContext {
        self.context.clone()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}
