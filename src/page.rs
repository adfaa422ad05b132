/// Page glue - turns a route title into a store key and mounts the sequencer
use crate::audio::InstrumentFactory;
use crate::sequencer::{demo_pattern, PatternSpec, Sequencer};
use crate::store::{Binding, KeyPath, SharedStore};
use crate::time::TimeExpr;
use crate::transport::{Looping, SharedScheduler, TransportConfig};

/// Every pattern lives under this key
pub const ROOT_KEY: &str = "sequencers";
pub const PAGE_BPM: f64 = 200.0;
pub const PAGE_LOOP_MEASURES: f64 = 2.0;

/// What a page needs from the outside world
#[derive(Clone)]
pub struct Collaborators {
    pub scheduler: SharedScheduler,
    pub store: SharedStore,
    pub instruments: InstrumentFactory,
}

/// `sequencers/<title>`, rejecting titles that aren't valid key segments
pub fn pattern_key(title: &str) -> crate::Result<KeyPath> {
    Ok(KeyPath::root(ROOT_KEY)?.child(title)?)
}

fn transport_config(is_playing: bool) -> TransportConfig {
    TransportConfig {
        is_playing,
        looping: Looping::Enabled,
        loop_end: Some(TimeExpr::measures(PAGE_LOOP_MEASURES)),
        bpm: PAGE_BPM,
    }
}

pub struct Page {
    title: String,
    binding: Binding,
    pattern: PatternSpec,
    sequencer: Sequencer,
}

impl Page {
    pub fn mount(title: &str, collaborators: &Collaborators) -> crate::Result<Self> {
        let key = pattern_key(title)?;
        let binding = Binding::bind(collaborators.store.clone(), key);
        let pattern = demo_pattern();
        let sequencer = Sequencer::mount(
            collaborators.scheduler.clone(),
            collaborators.instruments.clone(),
            transport_config(binding.is_playing()),
            &pattern,
        );

        log::info!("mounted pattern {:?}", title);
        Ok(Self {
            title: title.to_string(),
            binding,
            pattern,
            sequencer,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Flip the play toggle and re-render
    pub fn set_playing(&mut self, is_playing: bool) {
        self.binding.set_playing(is_playing);
        self.render();
    }

    pub fn write(&self, value: &str) {
        self.binding.write(value);
    }

    /// Follow a route change: rebind to the new key, keep the voices
    pub fn navigate(&mut self, title: &str) -> crate::Result<()> {
        let key = pattern_key(title)?;
        self.binding.listen_to(key);
        self.title = title.to_string();
        self.render();
        Ok(())
    }

    pub fn render(&mut self) {
        let config = transport_config(self.binding.is_playing());
        self.sequencer.render(config, &self.pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::RecordingInstrument;
    use crate::audio::Instrument;
    use crate::store::testing::{RecordingStore, StoreCall};
    use crate::store::RemoteStore;
    use crate::transport::testing::{Call, RecordingScheduler};
    use std::sync::Arc;

    struct Harness {
        scheduler: Arc<RecordingScheduler>,
        store: Arc<RecordingStore>,
        collaborators: Collaborators,
    }

    fn harness() -> Harness {
        let scheduler = Arc::new(RecordingScheduler::default());
        let store = Arc::new(RecordingStore::default());
        let collaborators = Collaborators {
            scheduler: scheduler.clone(),
            store: store.clone(),
            instruments: Arc::new(|| Box::new(RecordingInstrument::default()) as Box<dyn Instrument>),
        };
        Harness {
            scheduler,
            store,
            collaborators,
        }
    }

    #[test]
    fn test_mount_demo_page() {
        let h = harness();
        let page = Page::mount("demo", &h.collaborators).unwrap();

        assert_eq!(page.title(), "demo");
        assert_eq!(
            h.store.calls(),
            vec![StoreCall::On(pattern_key("demo").unwrap())]
        );
        assert_eq!(page.binding().key().map(KeyPath::as_str), Some("sequencers/demo"));

        let calls = h.scheduler.calls();
        assert!(calls.contains(&Call::SetBpm(200.0)));
        assert!(calls.contains(&Call::SetLoop(true)));
        assert!(calls.contains(&Call::SetLoopEnd(Some("2m".parse().unwrap()))));

        // Document order: each voice's run in turn
        let times = h.scheduler.scheduled_times();
        assert_eq!(times.len(), 24);
        let run: Vec<TimeExpr> = ["0:0", "0:1", "0:2", "0:3", "1:0", "1:1", "1:2", "1:3"]
            .iter()
            .map(|t| t.parse().unwrap())
            .collect();
        for voice in times.chunks(8) {
            assert_eq!(voice, run.as_slice());
        }
        let voices = page.sequencer().voices();
        assert_eq!(voices[0].notes()[0].params().note.to_string(), "C2");
        assert_eq!(voices[2].notes()[7].params().note.to_string(), "C5");
    }

    #[test]
    fn test_play_toggle_starts_once() {
        let h = harness();
        let mut page = Page::mount("demo", &h.collaborators).unwrap();
        // Playing by default
        assert_eq!(h.scheduler.count(|c| *c == Call::Start), 1);

        page.set_playing(false);
        assert!(!page.binding().is_playing());
        assert_eq!(h.scheduler.count(|c| *c == Call::Stop), 1);
        h.scheduler.reset();

        page.set_playing(true);
        assert!(page.binding().is_playing());
        assert_eq!(h.scheduler.count(|c| *c == Call::Start), 1);
        assert_eq!(h.scheduler.count(|c| matches!(c, Call::Schedule(_, _))), 0);

        page.render();
        assert_eq!(h.scheduler.count(|c| *c == Call::Start), 1);
    }

    #[test]
    fn test_navigate_rebinds_without_rescheduling() {
        let h = harness();
        let mut page = Page::mount("demo", &h.collaborators).unwrap();
        h.store.inner().set(&pattern_key("other").unwrap(), "remote");
        h.store.reset();
        h.scheduler.reset();

        page.navigate("other").unwrap();

        assert_eq!(page.title(), "other");
        assert_eq!(page.binding().value(), "remote");
        assert_eq!(
            h.store.calls(),
            vec![
                StoreCall::Off(pattern_key("demo").unwrap()),
                StoreCall::On(pattern_key("other").unwrap()),
            ]
        );
        assert!(h.scheduler.calls().is_empty());
    }

    #[test]
    fn test_write_reaches_store() {
        let h = harness();
        let page = Page::mount("demo", &h.collaborators).unwrap();
        page.write("edited");

        assert_eq!(
            h.store.inner().get(&pattern_key("demo").unwrap()).as_deref(),
            Some("edited")
        );
        assert_eq!(page.binding().value(), "edited");
    }

    #[test]
    fn test_unsafe_titles_are_rejected() {
        let h = harness();
        assert!(matches!(
            Page::mount("a.b", &h.collaborators),
            Err(crate::Error::Key(_))
        ));
        assert!(matches!(Page::mount("", &h.collaborators), Err(crate::Error::Key(_))));
        assert!(h.store.calls().is_empty());
        assert!(h.scheduler.calls().is_empty());

        let mut page = Page::mount("demo", &h.collaborators).unwrap();
        assert!(page.navigate("x/y").is_err());
        assert_eq!(page.title(), "demo");
    }
}
