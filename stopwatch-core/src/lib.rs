//! Pure stopwatch logic with no platform dependencies.
//! Testable on host; the app supplies time, scheduling, storage and display.

pub mod clock;
pub mod config;
pub mod controller;
pub mod format;
pub mod input;
pub mod laps;
pub mod persist;
pub mod scroll;

#[cfg(test)]
mod testing;

pub use clock::{ClockEngine, RepeatingTask, Scheduler, TimeSource, TimerState};
pub use config::Config;
pub use controller::{Command, Controller, ControlsState, Presenter, Severity};
pub use format::{format_elapsed, format_elapsed_ms, parse_elapsed};
pub use input::{shortcut, Control, Focus};
pub use laps::{Lap, LapTracker, LapView, RecordedLap};
pub use persist::{
    KeyValueStore, MemoryStore, PersistedLap, PersistedSnapshot, PersistenceStore, StoreError,
};
pub use scroll::ScrollToggle;
