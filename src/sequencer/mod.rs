/// Sequencer container - a transport and the voices playing against it
pub mod note;
pub mod pattern;
pub mod voice;

pub use note::{Note, NoteParams};
pub use pattern::{demo_pattern, PatternSpec, VoiceSpec};
pub use voice::{Voice, VoiceContext};

use crate::audio::InstrumentFactory;
use crate::transport::{SharedScheduler, Transport, TransportConfig};

pub struct Sequencer {
    transport: Transport,
    voices: Vec<Voice>,
    instruments: InstrumentFactory,
}

impl Sequencer {
    pub fn mount(
        scheduler: SharedScheduler,
        instruments: InstrumentFactory,
        config: TransportConfig,
        pattern: &PatternSpec,
    ) -> Self {
        let transport = Transport::mount(scheduler, config);
        let mut sequencer = Self {
            transport,
            voices: Vec::with_capacity(pattern.voices.len()),
            instruments,
        };
        sequencer.render_voices(pattern);
        sequencer
    }

    /// Push new transport settings and pattern down the tree
    pub fn render(&mut self, config: TransportConfig, pattern: &PatternSpec) {
        self.transport.update(config);
        self.render_voices(pattern);
    }

    fn render_voices(&mut self, pattern: &PatternSpec) {
        for (i, spec) in pattern.voices.iter().enumerate() {
            match self.voices.get_mut(i) {
                Some(voice) => voice.render(&spec.notes),
                None => {
                    let instrument = (self.instruments)();
                    self.voices
                        .push(Voice::mount(self.transport.scheduler(), instrument, spec));
                }
            }
        }
        self.voices.truncate(pattern.voices.len());
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
}
