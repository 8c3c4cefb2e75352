use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use stopwatch_core::Control;

/// What a single keypress asks the app to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Key(char),
    Press(Control),
    Quit,
}

/// Map a terminal key event. Digits 1-4 press the on-screen controls in
/// order; Ctrl-C and Esc quit.
pub fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Quit)
        }
        KeyCode::Char(c @ '1'..='4') => {
            let slot = c as usize - '1' as usize;
            Control::ALL.get(slot).copied().map(KeyAction::Press)
        }
        KeyCode::Char(c) => Some(KeyAction::Key(c)),
        KeyCode::Enter => Some(KeyAction::Key('\r')),
        KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Raw mode for as long as this lives. Dropping it hands the terminal back.
pub struct RawMode;

impl RawMode {
    pub fn enable() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}
