use crate::controller::Command;

/// On-screen buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
pub enum Control {
    StartPause = 0,
    Lap,
    Reset,
    ClearLaps,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::StartPause,
        Control::Lap,
        Control::Reset,
        Control::ClearLaps,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "start" | "pause" | "toggle" | "start/pause" => Some(Control::StartPause),
            "lap" => Some(Control::Lap),
            "reset" => Some(Control::Reset),
            "clear" | "clear-laps" => Some(Control::ClearLaps),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Control::StartPause => "start/pause",
            Control::Lap => "lap",
            Control::Reset => "reset",
            Control::ClearLaps => "clear-laps",
        }
    }

    pub fn command(self) -> Command {
        match self {
            Control::StartPause => Command::Toggle,
            Control::Lap => Command::Lap,
            Control::Reset => Command::Reset,
            Control::ClearLaps => Command::ClearLaps,
        }
    }
}

/// Where keyboard focus currently sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Page,
    TextInput,
}

/// Keyboard shortcut for `key`, if any. Typing into a text field never
/// triggers a shortcut.
pub fn shortcut(key: char, focus: Focus) -> Option<Command> {
    if focus == Focus::TextInput {
        return None;
    }
    match key.to_ascii_lowercase() {
        ' ' | '\r' | '\n' => Some(Command::Toggle),
        'l' => Some(Command::Lap),
        'r' => Some(Command::Reset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{FromPrimitive, ToPrimitive};

    #[test]
    fn test_shortcuts() {
        assert_eq!(shortcut(' ', Focus::Page), Some(Command::Toggle));
        assert_eq!(shortcut('\r', Focus::Page), Some(Command::Toggle));
        assert_eq!(shortcut('L', Focus::Page), Some(Command::Lap));
        assert_eq!(shortcut('r', Focus::Page), Some(Command::Reset));
        assert_eq!(shortcut('x', Focus::Page), None);
    }

    #[test]
    fn test_shortcuts_disabled_in_text_input() {
        for key in [' ', 'l', 'r'] {
            assert_eq!(shortcut(key, Focus::TextInput), None);
        }
    }

    #[test]
    fn test_control_names() {
        assert_eq!(Control::from_name("Start"), Some(Control::StartPause));
        assert_eq!(Control::from_name(" pause "), Some(Control::StartPause));
        assert_eq!(Control::from_name("clear"), Some(Control::ClearLaps));
        assert_eq!(Control::from_name("stop"), None);
        for control in Control::ALL {
            assert_eq!(Control::from_name(control.label()), Some(control));
        }
    }

    #[test]
    fn test_control_codes() {
        for control in Control::ALL {
            let code = control.to_usize().unwrap();
            assert_eq!(Control::from_usize(code), Some(control));
        }
        assert_eq!(Control::from_usize(99), None);
    }

    #[test]
    fn test_control_commands() {
        assert_eq!(Control::StartPause.command(), Command::Toggle);
        assert_eq!(Control::ClearLaps.command(), Command::ClearLaps);
    }
}
