use std::collections::VecDeque;

use crate::clock::ClockEngine;
use crate::config::MAX_LAPS;
use crate::format::format_elapsed_ms;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lap {
    /// 1-based, keeps counting across evictions until cleared.
    pub index: u32,
    pub split_ms: u64,
    pub cumulative_ms: u64,
    pub is_best: bool,
    pub is_worst: bool,
}

impl Lap {
    pub fn name(&self) -> String {
        format!("Lap {}", self.index)
    }

    pub fn view(&self) -> LapView {
        LapView {
            index: self.index,
            name: self.name(),
            split: format_elapsed_ms(self.split_ms),
            total: format_elapsed_ms(self.cumulative_ms),
            is_best: self.is_best,
            is_worst: self.is_worst,
        }
    }
}

/// A lap as handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LapView {
    pub index: u32,
    pub name: String,
    pub split: String,
    pub total: String,
    pub is_best: bool,
    pub is_worst: bool,
}

/// Result of a successful lap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedLap {
    pub lap: Lap,
    /// Best/worst marks changed on laps recorded earlier.
    pub marks_moved: bool,
    /// Oldest lap pushed out by the capacity limit.
    pub evicted: Option<Lap>,
}

impl RecordedLap {
    /// Whether laps other than the new one need redrawing.
    pub fn others_changed(&self) -> bool {
        self.marks_moved || self.evicted.is_some()
    }
}

#[derive(Debug)]
pub struct LapTracker {
    laps: VecDeque<Lap>,
    best_split_ms: Option<u64>,
    longest_split_ms: Option<u64>,
    lap_counter: u32,
    last_cumulative_ms: Option<u64>,
    max_laps: usize,
}

impl Default for LapTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LapTracker {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LAPS)
    }

    pub fn with_capacity(max_laps: usize) -> Self {
        Self {
            laps: VecDeque::new(),
            best_split_ms: None,
            longest_split_ms: None,
            lap_counter: 0,
            last_cumulative_ms: None,
            max_laps: max_laps.max(1),
        }
    }

    /// Record a lap at the clock's current elapsed time. Does nothing unless
    /// the clock is running.
    pub fn record_lap(&mut self, clock: &ClockEngine, now_ms: u64) -> Option<RecordedLap> {
        if !clock.is_running() {
            return None;
        }
        let elapsed = clock.elapsed_ms(now_ms);
        let split_ms = elapsed.saturating_sub(self.last_cumulative_ms.unwrap_or(0));

        self.lap_counter = self.lap_counter.saturating_add(1);
        self.best_split_ms = Some(self.best_split_ms.map_or(split_ms, |b| b.min(split_ms)));
        self.longest_split_ms = Some(self.longest_split_ms.map_or(split_ms, |w| w.max(split_ms)));
        self.last_cumulative_ms = Some(elapsed);

        self.laps.push_front(Lap {
            index: self.lap_counter,
            split_ms,
            cumulative_ms: elapsed,
            is_best: false,
            is_worst: false,
        });
        let evicted = if self.laps.len() > self.max_laps {
            self.laps.pop_back()
        } else {
            None
        };
        if let Some(lap) = &evicted {
            log::debug!("lap {} evicted", lap.index);
        }

        let marks_moved = self.refresh_marks();
        self.laps.front().map(|lap| RecordedLap {
            lap: lap.clone(),
            marks_moved,
            evicted,
        })
    }

    pub fn clear(&mut self) {
        self.laps.clear();
        self.best_split_ms = None;
        self.longest_split_ms = None;
        self.lap_counter = 0;
        self.last_cumulative_ms = None;
    }

    /// Hydrate from a snapshot. `laps` is newest first.
    pub fn restore(
        &mut self,
        lap_counter: u32,
        best_split_ms: Option<u64>,
        worst_split_ms: Option<u64>,
        laps: Vec<Lap>,
    ) {
        self.clear();
        self.laps = laps.into_iter().take(self.max_laps).collect();
        let held_max = self.laps.iter().map(|l| l.index).max().unwrap_or(0);
        self.lap_counter = lap_counter.max(held_max);

        let held_best = self.laps.iter().map(|l| l.split_ms).min();
        let held_worst = self.laps.iter().map(|l| l.split_ms).max();
        self.best_split_ms = match (best_split_ms, held_best) {
            (Some(b), Some(h)) => Some(b.min(h)),
            (b, h) => b.or(h),
        };
        self.longest_split_ms = match (worst_split_ms, held_worst) {
            (Some(w), Some(h)) => Some(w.max(h)),
            (w, h) => w.or(h),
        };
        self.last_cumulative_ms = self.laps.front().map(|l| l.cumulative_ms);
        self.refresh_marks();
    }

    pub fn count(&self) -> usize {
        self.laps.len()
    }

    pub fn count_label(&self) -> String {
        match self.count() {
            1 => "1 lap".to_string(),
            n => format!("{} laps", n),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    /// Newest first.
    pub fn laps(&self) -> impl Iterator<Item = &Lap> {
        self.laps.iter()
    }

    pub fn lap_counter(&self) -> u32 {
        self.lap_counter
    }

    pub fn best_split_ms(&self) -> Option<u64> {
        self.best_split_ms
    }

    /// Only defined once at least two laps have been recorded.
    pub fn worst_split_ms(&self) -> Option<u64> {
        if self.lap_counter >= 2 {
            self.longest_split_ms
        } else {
            None
        }
    }

    pub fn views(&self) -> Vec<LapView> {
        self.laps.iter().map(Lap::view).collect()
    }

    // Returns true if a lap other than the newest changed marks.
    fn refresh_marks(&mut self) -> bool {
        let best = self.best_split_ms;
        let worst = self.worst_split_ms();
        let mut moved = false;
        for (pos, lap) in self.laps.iter_mut().enumerate() {
            let is_best = best == Some(lap.split_ms);
            let is_worst = !is_best && worst == Some(lap.split_ms);
            if pos > 0 && (lap.is_best != is_best || lap.is_worst != is_worst) {
                moved = true;
            }
            lap.is_best = is_best;
            lap.is_worst = is_worst;
        }
        moved
    }
}
