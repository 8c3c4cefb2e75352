use crate::clock::{ClockEngine, Scheduler, TimeSource};
use crate::config::Config;
use crate::format::format_elapsed_ms;
use crate::laps::{LapTracker, LapView};
use crate::persist::{KeyValueStore, PersistedSnapshot, PersistenceStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlsState {
    pub can_lap: bool,
    pub can_reset: bool,
    pub is_running: bool,
    pub lap_count: usize,
}

/// Everything the stopwatch tells the outside world. Styling and layout
/// are the implementor's business.
pub trait Presenter {
    fn on_time_update(&mut self, display: &str);
    fn on_lap_added(&mut self, lap: &LapView);
    /// Full lap list, newest first, after earlier laps changed marks or the
    /// oldest was evicted.
    fn on_laps_changed(&mut self, _laps: &[LapView]) {}
    fn on_laps_cleared(&mut self);
    fn on_status_message(&mut self, text: &str, severity: Severity);
    fn on_controls_state_changed(&mut self, controls: ControlsState);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    /// Start when stopped, pause when running.
    Toggle,
    Reset,
    Lap,
    ClearLaps,
    PeriodicSave,
    /// Delivered by the render loop.
    Tick,
}

/// Owns the stopwatch state and applies commands to it.
pub struct Controller<T, S, K, P> {
    time: T,
    scheduler: S,
    store: PersistenceStore<K>,
    presenter: P,
    clock: ClockEngine,
    laps: LapTracker,
    save_failing: bool,
}

impl<T, S, K, P> Controller<T, S, K, P>
where
    T: TimeSource,
    S: Scheduler,
    K: KeyValueStore,
    P: Presenter,
{
    pub fn new(config: &Config, time: T, scheduler: S, store: K, presenter: P) -> Self {
        Self {
            time,
            scheduler,
            store: PersistenceStore::new(store, config.storage_key.clone()),
            presenter,
            clock: ClockEngine::with_render_interval(config.render_interval_ms),
            laps: LapTracker::with_capacity(config.max_laps),
            save_failing: false,
        }
    }

    /// Bring back the last saved session, resuming the clock if it was
    /// running. Returns whether anything was restored.
    pub fn restore(&mut self) -> bool {
        let Some(snapshot) = self.store.load() else {
            self.render();
            self.report_controls();
            return false;
        };

        self.clock.restore(snapshot.elapsed_ms);
        self.laps.restore(
            snapshot.lap_counter,
            snapshot.best_split_ms,
            snapshot.worst_split_ms,
            snapshot.restored_laps(),
        );
        if !self.laps.is_empty() {
            self.presenter.on_laps_changed(&self.laps.views());
        }
        if snapshot.is_running {
            // the run segment restarts now; time since the last save is lost
            let now = self.time.now_ms();
            self.clock.start(now, &mut self.scheduler);
        }
        log::info!(
            "restored {} ms with {} (running: {})",
            snapshot.elapsed_ms,
            self.laps.count_label(),
            snapshot.is_running
        );
        self.render();
        self.report_controls();
        self.presenter
            .on_status_message("Restored previous session", Severity::Info);
        true
    }

    pub fn dispatch(&mut self, command: Command) {
        log::trace!("dispatch {:?}", command);
        match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Toggle => {
                if self.clock.is_running() {
                    self.pause()
                } else {
                    self.start()
                }
            }
            Command::Reset => self.reset(),
            Command::Lap => self.lap(),
            Command::ClearLaps => self.clear_laps(),
            Command::PeriodicSave => self.periodic_save(),
            Command::Tick => {
                // ticks queued before a pause are dropped here
                if self.clock.is_running() {
                    self.render();
                }
            }
        }
    }

    fn start(&mut self) {
        let now = self.time.now_ms();
        if self.clock.start(now, &mut self.scheduler) {
            self.after_mutation();
        }
    }

    fn pause(&mut self) {
        let now = self.time.now_ms();
        if self.clock.pause(now) {
            self.after_mutation();
        }
    }

    fn reset(&mut self) {
        let now = self.time.now_ms();
        self.clock.pause(now);
        self.clock.reset(now);
        let had_laps = !self.laps.is_empty();
        self.laps.clear();
        if had_laps {
            self.presenter.on_laps_cleared();
        }
        self.presenter.on_status_message("Stopwatch reset", Severity::Info);
        self.after_mutation();
    }

    fn lap(&mut self) {
        let now = self.time.now_ms();
        let Some(recorded) = self.laps.record_lap(&self.clock, now) else {
            return;
        };
        self.presenter.on_lap_added(&recorded.lap.view());
        if recorded.others_changed() {
            self.presenter.on_laps_changed(&self.laps.views());
        }
        self.after_mutation();
    }

    fn clear_laps(&mut self) {
        self.laps.clear();
        self.presenter.on_laps_cleared();
        self.presenter.on_status_message("Laps cleared", Severity::Info);
        self.after_mutation();
    }

    fn periodic_save(&mut self) {
        let snapshot = self.snapshot();
        if !snapshot.is_idle() {
            self.save(&snapshot);
        }
    }

    fn after_mutation(&mut self) {
        self.render();
        self.report_controls();
        let snapshot = self.snapshot();
        self.save(&snapshot);
    }

    // Tells the user once per outage; the details only go to the log.
    fn save(&mut self, snapshot: &PersistedSnapshot) {
        let saved = self.store.save(snapshot);
        if !saved && !self.save_failing {
            self.presenter
                .on_status_message("Progress is not being saved", Severity::Warning);
        }
        self.save_failing = !saved;
    }

    fn render(&mut self) {
        let display = format_elapsed_ms(self.elapsed_ms());
        self.presenter.on_time_update(&display);
    }

    fn report_controls(&mut self) {
        let controls = self.controls();
        self.presenter.on_controls_state_changed(controls);
    }

    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot::capture(&self.clock, &self.laps, self.time.now_ms())
    }

    pub fn controls(&self) -> ControlsState {
        let is_running = self.clock.is_running();
        ControlsState {
            can_lap: is_running,
            can_reset: is_running || self.elapsed_ms() > 0 || !self.laps.is_empty(),
            is_running,
            lap_count: self.laps.count(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms(self.time.now_ms())
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn laps(&self) -> &LapTracker {
        &self.laps
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn store(&self) -> &K {
        self.store.store()
    }
}
