/// Static pattern data: voices and the notes each one plays
use super::note::NoteParams;
use crate::midi::Pitch;
use crate::time::{TimeExpr, PPQ};

/// Ascending major scale, in semitones above the root
const MAJOR_SCALE: [u8; 8] = [0, 2, 4, 5, 7, 9, 11, 12];

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSpec {
    pub resonance: Option<f32>,
    pub notes: Vec<NoteParams>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternSpec {
    pub voices: Vec<VoiceSpec>,
}

impl PatternSpec {
    pub fn note_count(&self) -> usize {
        self.voices.iter().map(|v| v.notes.len()).sum()
    }
}

/// C major run over two bars, one note per quarter: `"0:0"` .. `"1:3"`, each `"8n"`
fn scale_run(root: Pitch) -> Vec<NoteParams> {
    let eighth = TimeExpr::ticks(PPQ / 2.0);
    MAJOR_SCALE
        .iter()
        .enumerate()
        .map(|(step, offset)| {
            let note = Pitch::new(root.midi() + offset);
            let time = TimeExpr::ticks(step as f64 * PPQ);
            NoteParams::new(note, time, eighth)
        })
        .collect()
}

/// Three voices, C2 / C3 / C4 runs, resonance 3
pub fn demo_pattern() -> PatternSpec {
    let roots = [Pitch::new(36), Pitch::new(48), Pitch::new(60)];
    PatternSpec {
        voices: roots
            .into_iter()
            .map(|root| VoiceSpec {
                resonance: Some(3.0),
                notes: scale_run(root),
            })
            .collect(),
    }
}
