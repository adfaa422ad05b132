/// Transport - the shared clock contract and the adapter that configures it
use crate::time::TimeExpr;
use std::fmt;
use std::sync::Arc;

pub mod clock;
#[cfg(test)]
pub mod testing;

pub use clock::Clock;

/// Handle to one scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Passed to a callback when its event fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fire {
    /// Seconds since the clock was started
    pub time: f64,
    /// Tempo in effect when the event fired
    pub bpm: f64,
}

pub type Callback = Box<dyn FnMut(Fire) + Send>;

/// A transport clock that runs callbacks at musical positions
pub trait Scheduler: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn set_loop(&self, enabled: bool);
    fn set_loop_end(&self, end: Option<TimeExpr>);
    fn set_bpm(&self, bpm: f64);

    /// Run `callback` every time the transport passes `time`
    fn schedule(&self, callback: Callback, time: TimeExpr) -> EventId;

    /// Cancel a scheduled callback. Unknown ids are ignored.
    fn clear(&self, id: EventId);
}

pub type SharedScheduler = Arc<dyn Scheduler>;

/// Loop flag; a time value turns looping on and doubles as the loop end
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Looping {
    #[default]
    Disabled,
    Enabled,
    Until(TimeExpr),
}

impl From<bool> for Looping {
    fn from(enabled: bool) -> Self {
        if enabled {
            Looping::Enabled
        } else {
            Looping::Disabled
        }
    }
}

impl From<TimeExpr> for Looping {
    fn from(end: TimeExpr) -> Self {
        Looping::Until(end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub is_playing: bool,
    pub looping: Looping,
    pub loop_end: Option<TimeExpr>,
    pub bpm: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            is_playing: false,
            looping: Looping::Disabled,
            loop_end: None,
            bpm: 120.0,
        }
    }
}

impl TransportConfig {
    pub fn loop_enabled(&self) -> bool {
        !matches!(self.looping, Looping::Disabled)
    }

    /// Explicit loop end, falling back to a time-valued loop flag
    pub fn effective_loop_end(&self) -> Option<TimeExpr> {
        match (self.loop_end, self.looping) {
            (Some(end), _) => Some(end),
            (None, Looping::Until(end)) => Some(end),
            _ => None,
        }
    }
}

/// Applies a declarative `TransportConfig` to the shared scheduler
pub struct Transport {
    scheduler: SharedScheduler,
    applied: TransportConfig,
}

impl Transport {
    pub fn mount(scheduler: SharedScheduler, config: TransportConfig) -> Self {
        apply(scheduler.as_ref(), &config);
        Self {
            scheduler,
            applied: config,
        }
    }

    /// Reapply when any field differs from the last applied config
    pub fn update(&mut self, config: TransportConfig) {
        if config != self.applied {
            apply(self.scheduler.as_ref(), &config);
            self.applied = config;
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.applied
    }

    /// The scheduler voices register their notes with
    pub fn scheduler(&self) -> SharedScheduler {
        Arc::clone(&self.scheduler)
    }
}

fn apply(scheduler: &dyn Scheduler, config: &TransportConfig) {
    log::debug!(
        "transport: playing={} loop={} end={:?} bpm={}",
        config.is_playing,
        config.loop_enabled(),
        config.effective_loop_end(),
        config.bpm
    );

    if config.is_playing {
        scheduler.start();
    } else {
        scheduler.stop();
    }

    scheduler.set_loop(config.loop_enabled());
    scheduler.set_loop_end(config.effective_loop_end());
    scheduler.set_bpm(config.bpm);
}
