//! Hand-driven fakes for the platform traits.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::clock::{RepeatingTask, Scheduler, TimeSource};
use crate::controller::{ControlsState, Presenter, Severity};
use crate::laps::LapView;
use crate::persist::{KeyValueStore, StoreError};

#[derive(Clone, Default)]
pub struct ManualScheduler {
    active: Rc<Cell<usize>>,
    scheduled: Rc<RefCell<Vec<u64>>>,
}

impl ManualScheduler {
    pub fn active(&self) -> usize {
        self.active.get()
    }

    pub fn scheduled(&self) -> Vec<u64> {
        self.scheduled.borrow().clone()
    }
}

impl Scheduler for ManualScheduler {
    fn repeat_every(&mut self, interval_ms: u64) -> RepeatingTask {
        self.scheduled.borrow_mut().push(interval_ms);
        self.active.set(self.active.get() + 1);
        let active = self.active.clone();
        RepeatingTask::new(move || active.set(active.get() - 1))
    }
}

#[derive(Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<u64>>,
}

impl ManualTime {
    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Time(String),
    LapAdded(LapView),
    LapsChanged(Vec<LapView>),
    LapsCleared,
    Status(String, Severity),
    Controls(ControlsState),
}

#[derive(Clone, Default)]
pub struct RecordingPresenter {
    events: Rc<RefCell<Vec<Event>>>,
}

impl RecordingPresenter {
    pub fn take(&self) -> Vec<Event> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn last_time(&self) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            Event::Time(t) => Some(t.clone()),
            _ => None,
        })
    }

    pub fn last_controls(&self) -> Option<ControlsState> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            Event::Controls(c) => Some(*c),
            _ => None,
        })
    }
}

impl Presenter for RecordingPresenter {
    fn on_time_update(&mut self, display: &str) {
        self.events.borrow_mut().push(Event::Time(display.to_string()));
    }

    fn on_lap_added(&mut self, lap: &LapView) {
        self.events.borrow_mut().push(Event::LapAdded(lap.clone()));
    }

    fn on_laps_changed(&mut self, laps: &[LapView]) {
        self.events.borrow_mut().push(Event::LapsChanged(laps.to_vec()));
    }

    fn on_laps_cleared(&mut self) {
        self.events.borrow_mut().push(Event::LapsCleared);
    }

    fn on_status_message(&mut self, text: &str, severity: Severity) {
        self.events
            .borrow_mut()
            .push(Event::Status(text.to_string(), severity));
    }

    fn on_controls_state_changed(&mut self, controls: ControlsState) {
        self.events.borrow_mut().push(Event::Controls(controls));
    }
}

/// Store that rejects every operation, like a disabled or full backend.
#[derive(Clone, Copy, Default)]
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::QuotaExceeded)
    }
}
