/// Clock - thread-driven transport that fires scheduled callbacks
use super::{Callback, EventId, Fire, Scheduler};
use crate::time::{TimeExpr, PPQ};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Loops shorter than one tick are treated as no loop
const MIN_LOOP_TICKS: f64 = 1.0;

struct ScheduledEvent {
    tick: f64,
    callback: Callback,
}

struct ClockState {
    running: bool,
    // Bumped on every start so a superseded thread exits
    generation: u64,
    bpm: f64,
    loop_enabled: bool,
    loop_end: Option<TimeExpr>,
    position: f64,
    elapsed: f64,
    events: BTreeMap<EventId, ScheduledEvent>,
    next_id: u64,
}

impl ClockState {
    fn new() -> Self {
        Self {
            running: false,
            generation: 0,
            bpm: 120.0,
            loop_enabled: false,
            loop_end: None,
            position: 0.0,
            elapsed: 0.0,
            events: BTreeMap::new(),
            next_id: 0,
        }
    }

    fn ticks_per_second(&self) -> f64 {
        self.bpm / 60.0 * PPQ
    }

    fn loop_end_ticks(&self) -> Option<f64> {
        if !self.loop_enabled {
            return None;
        }
        self.loop_end
            .map(|end| end.to_ticks(self.bpm))
            .filter(|end| *end >= MIN_LOOP_TICKS)
    }

    /// Move the playhead forward by `dt`, firing every event passed on the way
    fn advance(&mut self, dt: Duration) {
        if !self.running {
            return;
        }

        let ticks_per_second = self.ticks_per_second();
        let loop_end = self.loop_end_ticks();
        let mut remaining = dt.as_secs_f64() * ticks_per_second;

        loop {
            let from = self.position;
            match loop_end {
                Some(end) if from >= end => {
                    self.position = 0.0;
                }
                Some(end) if from + remaining >= end => {
                    self.fire_window(from, end);
                    remaining -= end - from;
                    self.elapsed += (end - from) / ticks_per_second;
                    self.position = 0.0;
                    if remaining <= 0.0 {
                        break;
                    }
                }
                _ => {
                    self.fire_window(from, from + remaining);
                    self.elapsed += remaining / ticks_per_second;
                    self.position = from + remaining;
                    break;
                }
            }
        }
    }

    /// Fire events with `from <= tick < to`
    fn fire_window(&mut self, from: f64, to: f64) {
        if to <= from {
            return;
        }

        let bpm = self.bpm;
        let elapsed = self.elapsed;
        let ticks_per_second = self.ticks_per_second();
        for event in self.events.values_mut() {
            if event.tick >= from && event.tick < to {
                let time = elapsed + (event.tick - from) / ticks_per_second;
                (event.callback)(Fire { time, bpm });
            }
        }
    }
}

/// The transport clock. Callbacks run on the clock thread with the clock
/// locked, so they must not call back into the clock.
pub struct Clock {
    state: Arc<Mutex<ClockState>>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn bpm(&self) -> f64 {
        self.lock().bpm
    }

    pub fn loop_enabled(&self) -> bool {
        self.lock().loop_enabled
    }

    pub fn loop_end(&self) -> Option<TimeExpr> {
        self.lock().loop_end
    }

    /// Playhead in ticks
    pub fn position(&self) -> f64 {
        self.lock().position
    }

    pub fn scheduled_count(&self) -> usize {
        self.lock().events.len()
    }
}

fn lock(state: &Mutex<ClockState>) -> MutexGuard<'_, ClockState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.lock().running = false;
    }
}

impl Scheduler for Clock {
    fn start(&self) {
        let generation = {
            let mut state = self.lock();
            if state.running {
                return;
            }
            state.running = true;
            state.generation += 1;
            state.generation
        };

        let state = Arc::clone(&self.state);
        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                thread::sleep(TICK_INTERVAL);
                let now = Instant::now();

                let mut state = lock(&state);
                if !state.running || state.generation != generation {
                    break;
                }
                state.advance(now.duration_since(last_tick));
                last_tick = now;
            }
        });
    }

    fn stop(&self) {
        let mut state = self.lock();
        state.running = false;
        state.position = 0.0;
        state.elapsed = 0.0;
    }

    fn set_loop(&self, enabled: bool) {
        self.lock().loop_enabled = enabled;
    }

    fn set_loop_end(&self, end: Option<TimeExpr>) {
        self.lock().loop_end = end;
    }

    fn set_bpm(&self, bpm: f64) {
        if bpm.is_finite() && bpm > 0.0 {
            self.lock().bpm = bpm;
        } else {
            log::warn!("ignoring tempo {}", bpm);
        }
    }

    fn schedule(&self, callback: Callback, time: TimeExpr) -> EventId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = EventId(state.next_id);
        let tick = time.to_ticks(state.bpm);
        state.events.insert(id, ScheduledEvent { tick, callback });
        id
    }

    fn clear(&self, id: EventId) {
        self.lock().events.remove(&id);
    }
}
