/// Audio output using cpal, and the instrument contract voices play through
use crate::midi::Pitch;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

#[cfg(test)]
pub mod testing;

/// Resonance a voice uses when its pattern doesn't give one
pub const DEFAULT_RESONANCE: f32 = 1.5;

const FALLBACK_SAMPLE_RATE: f32 = 44_100.0;
const PEAK_LEVEL: f32 = 0.2;
const SILENCE: f32 = 1.0e-4;
/// Seconds of ring per unit of resonance
const RING_PER_RESONANCE: f32 = 0.1;
const RELEASE_SECS: f32 = 0.02;

/// One synthesis instance owned by a voice
pub trait Instrument: Send {
    fn set_resonance(&mut self, resonance: f32);

    /// Play `pitch` for `duration` seconds; `time` is the clock's audio time
    fn trigger_attack_release(&mut self, pitch: Pitch, duration: f64, time: f64, velocity: f32);
}

pub type SharedInstrument = Arc<Mutex<Box<dyn Instrument>>>;

/// Builds one fresh instrument per mounted voice
pub type InstrumentFactory = Arc<dyn Fn() -> Box<dyn Instrument> + Send + Sync>;

#[derive(Debug, Clone, Default)]
struct PluckState {
    frequency: f32,
    phase: f32,
    level: f32,
    hold_samples: u32,
    ring: f32,
    release: f32,
}

impl PluckState {
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if self.level < SILENCE {
            self.level = 0.0;
            return 0.0;
        }

        let sample = (self.phase * 2.0 * std::f32::consts::PI).sin() * self.level;
        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        if self.hold_samples > 0 {
            self.hold_samples -= 1;
            self.level *= self.ring;
        } else {
            self.level *= self.release;
        }
        sample
    }
}

/// Handle onto the voices summed by an `AudioOutput` stream
#[derive(Clone)]
pub struct Mixer {
    voices: Arc<Mutex<Vec<PluckState>>>,
    sample_rate: f32,
}

impl Mixer {
    fn new(sample_rate: f32) -> Self {
        Self {
            voices: Arc::new(Mutex::new(Vec::new())),
            sample_rate,
        }
    }

    /// Add a voice slot and return the synth that drives it
    pub fn voice(&self) -> PluckSynth {
        let mut voices = self.voices.lock().unwrap_or_else(|e| e.into_inner());
        voices.push(PluckState::default());
        PluckSynth {
            mixer: self.clone(),
            index: voices.len() - 1,
            resonance: DEFAULT_RESONANCE,
        }
    }

    fn render(&self, data: &mut [f32], channels: usize) {
        let mut voices = self.voices.lock().unwrap_or_else(|e| e.into_inner());
        for frame in data.chunks_mut(channels.max(1)) {
            let mixed: f32 = voices
                .iter_mut()
                .map(|v| v.next_sample(self.sample_rate))
                .sum();
            frame.fill(mixed.clamp(-1.0, 1.0));
        }
    }
}

/// Plucked tone: a sine whose ring time grows with resonance
pub struct PluckSynth {
    mixer: Mixer,
    index: usize,
    resonance: f32,
}

impl Instrument for PluckSynth {
    fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.max(0.01);
    }

    fn trigger_attack_release(&mut self, pitch: Pitch, duration: f64, _time: f64, velocity: f32) {
        let sample_rate = self.mixer.sample_rate;
        let ring_secs = self.resonance * RING_PER_RESONANCE;
        let mut voices = self.mixer.voices.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = voices.get_mut(self.index) {
            *state = PluckState {
                frequency: pitch.frequency(),
                phase: 0.0,
                level: PEAK_LEVEL * velocity.clamp(0.0, 1.0),
                hold_samples: (duration.max(0.0) * sample_rate as f64) as u32,
                ring: (-1.0 / (ring_secs * sample_rate)).exp(),
                release: (-1.0 / (RELEASE_SECS * sample_rate)).exp(),
            };
        }
    }
}

pub struct AudioOutput {
    _stream: Option<cpal::Stream>,
    mixer: Mixer,
}

impl AudioOutput {
    pub fn new() -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device()?;
        let config = device.default_output_config().ok()?;

        let mixer = Mixer::new(config.sample_rate().0 as f32);
        let stream = Self::setup_audio_stream(&device, config, mixer.clone())?;

        Some(Self {
            _stream: Some(stream),
            mixer,
        })
    }

    fn setup_audio_stream(
        device: &cpal::Device,
        config: cpal::SupportedStreamConfig,
        mixer: Mixer,
    ) -> Option<cpal::Stream> {
        let channels = config.channels() as usize;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mixer.render(data, channels);
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            ),
            format => {
                log::warn!("unsupported sample format {:?}", format);
                return None;
            }
        };

        match stream {
            Ok(stream) => {
                if let Err(e) = stream.play() {
                    log::warn!("audio stream did not start: {}", e);
                }
                Some(stream)
            }
            Err(e) => {
                log::warn!("could not open audio stream: {}", e);
                None
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self._stream.is_some()
    }

    pub fn mixer(&self) -> Mixer {
        self.mixer.clone()
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new().unwrap_or_else(|| Self {
            _stream: None,
            mixer: Mixer::new(FALLBACK_SAMPLE_RATE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voices_are_independent() {
        let mixer = Mixer::new(1000.0);
        let mut a = mixer.voice();
        let _b = mixer.voice();

        a.trigger_attack_release(Pitch::new(69), 0.01, 0.0, 1.0);

        let voices = mixer.voices.lock().unwrap();
        assert!(voices[0].level > 0.0);
        assert_eq!(voices[1].level, 0.0);
    }

    #[test]
    fn test_pluck_decays_to_silence() {
        let mixer = Mixer::new(1000.0);
        let mut synth = mixer.voice();
        synth.set_resonance(DEFAULT_RESONANCE);
        synth.trigger_attack_release(Pitch::new(60), 0.05, 0.0, 1.0);

        let mut buffer = vec![0.0f32; 200];
        mixer.render(&mut buffer, 2);
        assert!(buffer.iter().any(|s| s.abs() > 0.0));
        // Stereo frames carry the same sample on both channels
        assert_eq!(buffer[2], buffer[3]);

        let mut tail = vec![0.0f32; 4000];
        mixer.render(&mut tail, 1);
        assert!(tail[3990..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_higher_resonance_rings_longer() {
        let mixer = Mixer::new(1000.0);
        let mut short = mixer.voice();
        let mut long = mixer.voice();
        short.set_resonance(0.5);
        long.set_resonance(3.0);
        short.trigger_attack_release(Pitch::new(60), 1.0, 0.0, 1.0);
        long.trigger_attack_release(Pitch::new(60), 1.0, 0.0, 1.0);

        let voices = mixer.voices.lock().unwrap();
        assert!(voices[1].ring > voices[0].ring);
    }

    #[test]
    fn test_default_output_without_device() {
        let output = AudioOutput {
            _stream: None,
            mixer: Mixer::new(FALLBACK_SAMPLE_RATE),
        };
        assert!(!output.is_active());
        let _voice = output.mixer().voice();
    }
}
