/// Scheduler fake that records every call and can fire what was scheduled
use super::{Callback, EventId, Fire, Scheduler};
use crate::time::TimeExpr;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start,
    Stop,
    SetLoop(bool),
    SetLoopEnd(Option<TimeExpr>),
    SetBpm(f64),
    Schedule(EventId, TimeExpr),
    Clear(EventId),
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    pending: BTreeMap<EventId, Callback>,
    next_id: u64,
}

#[derive(Default)]
pub struct RecordingScheduler {
    inner: Mutex<Inner>,
}

impl RecordingScheduler {
    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.inner.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn scheduled_times(&self) -> Vec<TimeExpr> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Schedule(_, time) => Some(time),
                _ => None,
            })
            .collect()
    }

    pub fn reset(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    /// Ids scheduled and not yet cleared
    pub fn live(&self) -> Vec<EventId> {
        self.inner.lock().unwrap().pending.keys().copied().collect()
    }

    pub fn fire(&self, id: EventId, fire: Fire) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(callback) = inner.pending.get_mut(&id) {
            callback(fire);
        }
    }
}

impl Scheduler for RecordingScheduler {
    fn start(&self) {
        self.inner.lock().unwrap().calls.push(Call::Start);
    }

    fn stop(&self) {
        self.inner.lock().unwrap().calls.push(Call::Stop);
    }

    fn set_loop(&self, enabled: bool) {
        self.inner.lock().unwrap().calls.push(Call::SetLoop(enabled));
    }

    fn set_loop_end(&self, end: Option<TimeExpr>) {
        self.inner.lock().unwrap().calls.push(Call::SetLoopEnd(end));
    }

    fn set_bpm(&self, bpm: f64) {
        self.inner.lock().unwrap().calls.push(Call::SetBpm(bpm));
    }

    fn schedule(&self, callback: Callback, time: TimeExpr) -> EventId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = EventId(inner.next_id);
        inner.pending.insert(id, callback);
        inner.calls.push(Call::Schedule(id, time));
        id
    }

    fn clear(&self, id: EventId) {
        let mut inner = self.inner.lock().unwrap();
        inner.pending.remove(&id);
        inner.calls.push(Call::Clear(id));
    }
}
