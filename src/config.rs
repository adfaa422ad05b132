use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");
const DEFAULT_TITLE: &str = "demo";

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    route: RouteConfig,
    #[serde(default)]
    output: OutputConfig,
    #[serde(default)]
    store: StoreConfig,
}

#[derive(Deserialize, Default)]
struct RouteConfig {
    title: Option<String>,
}

#[derive(Deserialize, Default)]
struct OutputConfig {
    backend: Option<String>,
    midi_port: Option<usize>,
}

#[derive(Deserialize, Default)]
struct StoreConfig {
    snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Audio,
    Midi,
}

pub struct Config {
    file: ConfigFile,
}

impl Config {
    /// Embedded defaults overlaid by `path`, or by the user config file
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = Self::embedded();

        let path = path.map(Path::to_path_buf).or_else(user_config_path);
        if let Some(path) = path.filter(|p| p.exists()) {
            match std::fs::read_to_string(&path) {
                Ok(contents) => config.overlay(&contents, &path.display().to_string()),
                Err(e) => {
                    log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                }
            }
        }

        config
    }

    fn embedded() -> Self {
        let file = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });
        Self { file }
    }

    fn overlay(&mut self, contents: &str, origin: &str) {
        match toml::from_str::<ConfigFile>(contents) {
            Ok(user) => {
                let base = &mut self.file;
                base.route.title = user.route.title.or(base.route.title.take());
                base.output.backend = user.output.backend.or(base.output.backend.take());
                base.output.midi_port = user.output.midi_port.or(base.output.midi_port);
                base.store.snapshot = user.store.snapshot.or(base.store.snapshot.take());
            }
            Err(e) => {
                log::warn!(target: "config", "ignoring malformed config {}: {}", origin, e)
            }
        }
    }

    pub fn title(&self) -> &str {
        self.file.route.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn backend(&self) -> Backend {
        match self.file.output.backend.as_deref() {
            Some("midi") => Backend::Midi,
            Some("audio") | None => Backend::Audio,
            Some(other) => {
                log::warn!(target: "config", "unknown backend {:?}, using audio", other);
                Backend::Audio
            }
        }
    }

    pub fn midi_port(&self) -> usize {
        self.file.output.midi_port.unwrap_or(0)
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.file.store.snapshot.as_deref()
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pluckseq").join("config.toml"))
}
