#[cfg(feature = "gui")]
use eframe::egui;

use clap::Parser;
use pluckseq::MidiInstrument;
use std::path::PathBuf;

#[cfg(feature = "gui")]
use pluckseq::{
    audio::Mixer,
    config::{Backend, Config},
    time::PPQ,
    AudioOutput, Clock, Collaborators, Instrument, InstrumentFactory, MemoryStore, Page,
};
#[cfg(feature = "gui")]
use std::sync::atomic::{AtomicU8, Ordering};
#[cfg(feature = "gui")]
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pluckseq", about = "Step sequencer bound to a stored pattern")]
#[cfg_attr(not(feature = "gui"), allow(dead_code))]
struct Args {
    /// Pattern title; the value is stored under sequencers/<title>
    title: Option<String>,

    /// Config file to use instead of the user config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the available MIDI output ports and exit
    #[arg(long)]
    list_midi: bool,
}

fn list_midi_ports() {
    let ports = MidiInstrument::available_ports();
    if ports.is_empty() {
        println!("No MIDI ports available");
    }
    for (i, name) in ports.iter().enumerate() {
        println!("{}: {}", i, name);
    }
}

#[cfg(feature = "gui")]
fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    let args = Args::parse();
    if args.list_midi {
        list_midi_ports();
        return Ok(());
    }

    let config = Config::load(args.config.as_deref());
    let title = args.title.unwrap_or_else(|| config.title().to_string());

    let app = match SequencerApp::new(&config, &title) {
        Ok(app) => app,
        Err(e) => {
            log::error!("cannot open pattern {:?}: {}", title, e);
            std::process::exit(2);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 420.0])
            .with_title("pluckseq"),
        ..Default::default()
    };

    eframe::run_native("pluckseq", options, Box::new(|_cc| Ok(Box::new(app))))
}

#[cfg(not(feature = "gui"))]
fn main() {
    env_logger::init();
    let args = Args::parse();
    if args.list_midi {
        list_midi_ports();
        return;
    }

    eprintln!("This binary requires the 'gui' feature to be enabled");
    std::process::exit(1);
}

/// One instrument per voice, on the configured backend
#[cfg(feature = "gui")]
fn instrument_factory(config: &Config, mixer: Mixer) -> InstrumentFactory {
    match config.backend() {
        Backend::Audio => Arc::new(move || -> Box<dyn Instrument> { Box::new(mixer.voice()) }),
        Backend::Midi => {
            let port = config.midi_port();
            let next_channel = AtomicU8::new(0);
            Arc::new(move || -> Box<dyn Instrument> {
                let channel = next_channel.fetch_add(1, Ordering::Relaxed) % 16;
                match MidiInstrument::connect(port, channel) {
                    Ok(midi) => Box::new(midi),
                    Err(e) => {
                        log::warn!("MIDI unavailable ({}), voice falls back to audio", e);
                        Box::new(mixer.voice())
                    }
                }
            })
        }
    }
}

#[cfg(feature = "gui")]
struct SequencerApp {
    page: Page,
    clock: Arc<Clock>,
    _audio_output: AudioOutput,

    // UI state
    route_draft: String,
    route_error: Option<String>,
}

#[cfg(feature = "gui")]
impl SequencerApp {
    fn new(config: &Config, title: &str) -> pluckseq::Result<Self> {
        let audio_output = AudioOutput::default();
        if !audio_output.is_active() {
            log::warn!("no audio output device, audio voices are silent");
        }

        let store = match config.snapshot_path() {
            Some(path) => MemoryStore::open(path).unwrap_or_else(|e| {
                log::warn!("store snapshot {} unusable ({}), keeping values in memory", path.display(), e);
                MemoryStore::new()
            }),
            None => MemoryStore::new(),
        };

        let clock = Arc::new(Clock::new());
        let collaborators = Collaborators {
            scheduler: clock.clone(),
            store: Arc::new(store),
            instruments: instrument_factory(config, audio_output.mixer()),
        };
        log::info!("output backend: {:?}", config.backend());

        let page = Page::mount(title, &collaborators)?;

        Ok(Self {
            page,
            clock,
            _audio_output: audio_output,
            route_draft: title.to_string(),
            route_error: None,
        })
    }
}

#[cfg(feature = "gui")]
impl eframe::App for SequencerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.page.title());
            ui.add_space(10.0);

            // Route
            ui.horizontal(|ui| {
                ui.label("Pattern:");
                ui.text_edit_singleline(&mut self.route_draft);
                if ui.button("Open").clicked() {
                    self.route_error = self
                        .page
                        .navigate(self.route_draft.trim())
                        .err()
                        .map(|e| e.to_string());
                }
            });
            if let Some(error) = &self.route_error {
                ui.colored_label(egui::Color32::YELLOW, format!("⚠ {}", error));
            }

            ui.add_space(10.0);

            // Transport controls
            ui.horizontal(|ui| {
                let mut is_playing = self.page.binding().is_playing();
                if ui.checkbox(&mut is_playing, "Play").changed() {
                    self.page.set_playing(is_playing);
                }

                ui.add_space(20.0);
                ui.label(format!("BPM: {}", self.clock.bpm()));
            });

            ui.add_space(10.0);

            // Stored value
            ui.horizontal(|ui| {
                ui.label("Value:");
                let mut value = self.page.binding().value();
                if ui.text_edit_singleline(&mut value).changed() {
                    self.page.write(&value);
                }
            });

            ui.add_space(20.0);

            // One row per voice, current quarter highlighted
            let is_playing = self.clock.is_running();
            let bpm = self.clock.bpm();
            let step = (self.clock.position() / PPQ) as usize;

            for voice in self.page.sequencer().voices() {
                ui.horizontal(|ui| {
                    for note in voice.notes() {
                        let params = note.params();
                        let is_current =
                            is_playing && (params.time.to_ticks(bpm) / PPQ) as usize == step;

                        let button = egui::Button::new(params.note.to_string())
                            .min_size(egui::vec2(70.0, 40.0))
                            .fill(if is_current {
                                egui::Color32::from_rgb(100, 200, 100)
                            } else {
                                egui::Color32::from_rgb(60, 60, 200)
                            });
                        ui.add(button);
                    }
                });
            }
        });
    }
}
