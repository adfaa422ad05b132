/// Note - one scheduled event, re-registered whenever its parameters change
use super::voice::VoiceContext;
use crate::midi::Pitch;
use crate::time::TimeExpr;
use crate::transport::EventId;

#[derive(Debug, Clone, PartialEq)]
pub struct NoteParams {
    pub note: Pitch,
    pub time: TimeExpr,
    pub duration: TimeExpr,
    /// 0.0..=1.0
    pub velocity: f32,
}

impl NoteParams {
    pub fn new(note: Pitch, time: TimeExpr, duration: TimeExpr) -> Self {
        Self {
            note,
            time,
            duration,
            velocity: 1.0,
        }
    }

    /// Build from textual pitch and time expressions, e.g. `("C2", "0:1", "8n")`
    pub fn parse(note: &str, time: &str, duration: &str) -> crate::Result<Self> {
        Ok(Self::new(note.parse()?, time.parse()?, duration.parse()?))
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }
}

/// A mounted note. Owns at most one scheduler registration, which is
/// cleared before every reschedule and when the note is dropped.
pub struct Note {
    voice: VoiceContext,
    params: NoteParams,
    registration: Option<EventId>,
}

impl Note {
    pub fn mount(voice: VoiceContext, params: NoteParams) -> Self {
        let mut note = Self {
            voice,
            params,
            registration: None,
        };
        note.load();
        note
    }

    /// Reschedule if `params` differ from the current ones
    pub fn update(&mut self, params: NoteParams) {
        if params == self.params {
            return;
        }
        self.params = params;
        self.load();
    }

    pub fn params(&self) -> &NoteParams {
        &self.params
    }

    pub fn registration(&self) -> Option<EventId> {
        self.registration
    }

    fn load(&mut self) {
        self.release();
        let NoteParams {
            note,
            time,
            duration,
            velocity,
        } = self.params;
        let id = self.voice.schedule(note, time, duration, velocity);
        log::debug!("scheduled {} at {} as {}", note, time, id);
        self.registration = Some(id);
    }

    fn release(&mut self) {
        if let Some(id) = self.registration.take() {
            self.voice.clear(id);
        }
    }
}

impl Drop for Note {
    fn drop(&mut self) {
        self.release();
    }
}
