use std::fmt;

use crate::config::RENDER_INTERVAL_MS;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerState {
    Stopped,
    Running,
}

/// Source of monotonic milliseconds.
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

/// Something that can deliver a callback on a fixed period until told to stop.
pub trait Scheduler {
    fn repeat_every(&mut self, interval_ms: u64) -> RepeatingTask;
}

/// Handle to a running repeating callback. Cancelling or dropping it stops
/// the callback.
pub struct RepeatingTask {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl RepeatingTask {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn cancel(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.fire();
    }
}

impl fmt::Debug for RepeatingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatingTask")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Run/pause state and elapsed-time accounting for the stopwatch.
///
/// Time only advances while running; closed run segments are folded into
/// the accumulator on pause. The render loop handle lives here so that it
/// exists exactly while the clock runs.
#[derive(Debug)]
pub struct ClockEngine {
    state: TimerState,
    accumulated_ms: u64,
    segment_start_ms: u64,
    render_interval_ms: u64,
    render_task: Option<RepeatingTask>,
}

impl Default for ClockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockEngine {
    pub fn new() -> Self {
        Self::with_render_interval(RENDER_INTERVAL_MS)
    }

    pub fn with_render_interval(render_interval_ms: u64) -> Self {
        Self {
            state: TimerState::Stopped,
            accumulated_ms: 0,
            segment_start_ms: 0,
            render_interval_ms,
            render_task: None,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Returns false if the clock was already running.
    pub fn start<S: Scheduler + ?Sized>(&mut self, now_ms: u64, scheduler: &mut S) -> bool {
        if self.state == TimerState::Running {
            return false;
        }
        self.segment_start_ms = now_ms;
        self.state = TimerState::Running;
        self.render_task = Some(scheduler.repeat_every(self.render_interval_ms));
        log::debug!("clock started at {} with {} ms banked", now_ms, self.accumulated_ms);
        true
    }

    /// Returns false if the clock was already stopped.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.accumulated_ms += now_ms.saturating_sub(self.segment_start_ms);
        self.state = TimerState::Stopped;
        self.cancel_render();
        log::debug!("clock paused at {} ms", self.accumulated_ms);
        true
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.cancel_render();
        self.accumulated_ms = 0;
        self.segment_start_ms = now_ms;
        self.state = TimerState::Stopped;
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        match self.state {
            TimerState::Running => {
                self.accumulated_ms + now_ms.saturating_sub(self.segment_start_ms)
            }
            TimerState::Stopped => self.accumulated_ms,
        }
    }

    /// Hydrate from a saved snapshot. Leaves the clock stopped; the caller
    /// starts it again if the snapshot was running.
    pub fn restore(&mut self, elapsed_ms: u64) {
        self.cancel_render();
        self.accumulated_ms = elapsed_ms;
        self.state = TimerState::Stopped;
    }

    fn cancel_render(&mut self) {
        if let Some(task) = self.render_task.take() {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualScheduler;
    use proptest::prelude::*;

    #[test]
    fn test_stopwatch_basic() {
        let mut sched = ManualScheduler::default();
        let mut sw = ClockEngine::new();
        assert_eq!(sw.state(), TimerState::Stopped);
        assert_eq!(sw.elapsed_ms(0), 0);

        assert!(sw.start(1000, &mut sched));
        assert_eq!(sw.state(), TimerState::Running);
        assert_eq!(sw.elapsed_ms(1500), 500);
        assert_eq!(sw.elapsed_ms(2000), 1000);

        assert!(sw.pause(2000));
        assert_eq!(sw.state(), TimerState::Stopped);
        assert_eq!(sw.elapsed_ms(5000), 1000); // frozen while stopped

        sw.start(5000, &mut sched);
        assert_eq!(sw.elapsed_ms(5500), 1500);

        sw.reset(6000);
        assert_eq!(sw.state(), TimerState::Stopped);
        assert_eq!(sw.elapsed_ms(10000), 0);
    }

    #[test]
    fn test_start_and_pause_are_idempotent() {
        let mut sched = ManualScheduler::default();
        let mut sw = ClockEngine::new();
        assert!(!sw.pause(100));
        assert!(sw.start(100, &mut sched));
        assert!(!sw.start(400, &mut sched));
        // second start must not move the segment marker
        assert_eq!(sw.elapsed_ms(600), 500);
        assert_eq!(sched.scheduled(), vec![RENDER_INTERVAL_MS]);
    }

    #[test]
    fn test_render_loop_follows_run_state() {
        let mut sched = ManualScheduler::default();
        let mut sw = ClockEngine::with_render_interval(20);
        assert_eq!(sched.active(), 0);

        sw.start(0, &mut sched);
        assert_eq!(sched.active(), 1);
        assert_eq!(sched.scheduled(), vec![20]);

        sw.pause(10);
        assert_eq!(sched.active(), 0);

        sw.start(20, &mut sched);
        assert_eq!(sched.active(), 1);
        sw.reset(30);
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn test_drop_cancels_render_loop() {
        let mut sched = ManualScheduler::default();
        {
            let mut sw = ClockEngine::new();
            sw.start(0, &mut sched);
            assert_eq!(sched.active(), 1);
        }
        assert_eq!(sched.active(), 0);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut sched = ManualScheduler::default();

        let mut running = ClockEngine::new();
        running.start(0, &mut sched);
        running.reset(5000);
        assert_eq!(running.elapsed_ms(9000), 0);
        assert!(!running.is_running());

        let mut paused = ClockEngine::new();
        paused.start(0, &mut sched);
        paused.pause(700);
        paused.reset(800);
        assert_eq!(paused.elapsed_ms(900), 0);
        assert!(!paused.is_running());
    }

    #[test]
    fn test_restore_then_resume() {
        let mut sched = ManualScheduler::default();
        let mut sw = ClockEngine::new();
        sw.restore(42_000);
        assert!(!sw.is_running());
        assert_eq!(sw.elapsed_ms(0), 42_000);

        sw.start(100, &mut sched);
        assert_eq!(sw.elapsed_ms(1100), 43_000);
    }

    #[test]
    fn test_clock_going_backwards_does_not_underflow() {
        let mut sched = ManualScheduler::default();
        let mut sw = ClockEngine::new();
        sw.start(1000, &mut sched);
        assert_eq!(sw.elapsed_ms(500), 0);
        sw.pause(500);
        assert_eq!(sw.elapsed_ms(500), 0);
    }

    proptest! {
        #[test]
        fn elapsed_is_sum_of_closed_segments(steps in proptest::collection::vec((any::<bool>(), 0u64..10_000), 1..40)) {
            let mut sched = ManualScheduler::default();
            let mut sw = ClockEngine::new();
            let mut now = 0u64;
            let mut closed = 0u64;
            let mut open_since: Option<u64> = None;
            let mut last_elapsed = 0u64;

            for (start, gap) in steps {
                now += gap;
                if start {
                    sw.start(now, &mut sched);
                    if open_since.is_none() {
                        open_since = Some(now);
                    }
                } else {
                    sw.pause(now);
                    if let Some(since) = open_since.take() {
                        closed += now - since;
                    }
                }

                let elapsed = sw.elapsed_ms(now);
                prop_assert!(elapsed >= last_elapsed);
                let expected = closed + open_since.map(|since| now - since).unwrap_or(0);
                prop_assert_eq!(elapsed, expected);
                last_elapsed = elapsed;
            }
        }
    }
}
