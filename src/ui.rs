use std::io::Write;

use stopwatch_core::{Control, ControlsState, LapView, Presenter, Severity};

/// Draws the stopwatch as plain text. The time is redrawn in place; laps
/// and messages scroll above it. Lines end in `\r\n` since raw mode turns
/// off the terminal's own newline translation.
pub struct TerminalUi<W: Write> {
    out: W,
    time_on_line: bool,
}

impl<W: Write> TerminalUi<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            time_on_line: false,
        }
    }

    pub fn draw_help(&mut self) {
        self.end_time_line();
        write!(self.out, "STOPWATCH\r\n").ok();
        write!(self.out, "  space/enter=start/pause  l=lap  r=reset  q=quit\r\n").ok();
        let buttons: Vec<String> = Control::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}={}", i + 1, c.label()))
            .collect();
        write!(self.out, "  buttons: {}\r\n", buttons.join("  ")).ok();
        self.out.flush().ok();
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn end_time_line(&mut self) {
        if self.time_on_line {
            write!(self.out, "\r\n").ok();
            self.time_on_line = false;
        }
    }

    fn draw_lap(&mut self, lap: &LapView) {
        let mark = if lap.is_best {
            "  best"
        } else if lap.is_worst {
            "  worst"
        } else {
            ""
        };
        write!(self.out, "{:>8}: {}  ({}){}\r\n", lap.name, lap.split, lap.total, mark).ok();
    }
}

impl<W: Write> Presenter for TerminalUi<W> {
    fn on_time_update(&mut self, display: &str) {
        write!(self.out, "\r  {}", display).ok();
        self.out.flush().ok();
        self.time_on_line = true;
    }

    fn on_lap_added(&mut self, lap: &LapView) {
        self.end_time_line();
        self.draw_lap(lap);
    }

    fn on_laps_changed(&mut self, laps: &[LapView]) {
        self.end_time_line();
        write!(self.out, "-- laps --\r\n").ok();
        for lap in laps {
            self.draw_lap(lap);
        }
    }

    fn on_laps_cleared(&mut self) {
        self.end_time_line();
        write!(self.out, "-- laps cleared --\r\n").ok();
    }

    fn on_status_message(&mut self, text: &str, severity: Severity) {
        self.end_time_line();
        match severity {
            Severity::Info => write!(self.out, "[{}]\r\n", text).ok(),
            Severity::Warning => write!(self.out, "[! {}]\r\n", text).ok(),
        };
    }

    fn on_controls_state_changed(&mut self, controls: ControlsState) {
        log::debug!("controls: {:?}", controls);
    }
}
