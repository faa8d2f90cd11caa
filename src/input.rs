// Input decoding - raw terminal events to framework signals
//
// The core never sees raw device codes. The poller reads crossterm events,
// decodes them into the closed `InputSignal` set, and publishes bus events;
// states and components consume only the decoded signal.

use crate::events::{Bus, Event, LeaveIntent};
use crossterm::event::{
    self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use std::io;
use std::time::Duration;

/// A decoded, device-independent input signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSignal {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Space,
    Backspace,
    /// Function keys F1..=F12.
    Function(u8),
    /// A printable character (never space; that decodes to `Space`).
    Char(char),
    /// The quit chord (End, or Ctrl+C).
    Quit,
}

impl InputSignal {
    /// The string form used as a key in declarative `actions` maps:
    /// `"b"` for a letter, `"F3"` for a function key. Movement and editing
    /// signals are not bindable as actions.
    pub fn action_key(&self) -> Option<String> {
        match self {
            Self::Char(c) => Some(c.to_string()),
            Self::Function(n) => Some(format!("F{n}")),
            _ => None,
        }
    }
}

/// Map a crossterm key event to a signal. Release/repeat events and chords
/// the framework does not understand decode to `None`.
pub fn decode_key(key: &KeyEvent) -> Option<InputSignal> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(InputSignal::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Up => Some(InputSignal::Up),
        KeyCode::Down => Some(InputSignal::Down),
        KeyCode::Left => Some(InputSignal::Left),
        KeyCode::Right => Some(InputSignal::Right),
        KeyCode::Enter => Some(InputSignal::Enter),
        KeyCode::Esc => Some(InputSignal::Escape),
        KeyCode::Backspace => Some(InputSignal::Backspace),
        KeyCode::End => Some(InputSignal::Quit),
        KeyCode::Char(' ') => Some(InputSignal::Space),
        KeyCode::Char(c) if c.is_ascii_graphic() => Some(InputSignal::Char(c)),
        KeyCode::F(n @ 1..=12) => Some(InputSignal::Function(n as u8)),
        _ => None,
    }
}

/// Polls the terminal once per frame and publishes decoded events.
///
/// At most one blocking wait per call; any further events already queued are
/// drained without waiting so a burst of keystrokes lands in a single frame.
#[derive(Debug, Default)]
pub struct InputPoller;

impl InputPoller {
    pub fn new() -> Self {
        Self
    }

    /// Wait up to `timeout` for input, then publish every pending event.
    /// Returns true if anything was published.
    pub fn poll(&mut self, bus: &Bus, timeout: Duration) -> io::Result<bool> {
        let mut published = false;
        let mut wait = timeout;
        while event::poll(wait)? {
            wait = Duration::ZERO;
            published |= self.publish_event(bus, event::read()?);
        }
        Ok(published)
    }

    fn publish_event(&mut self, bus: &Bus, ev: TermEvent) -> bool {
        match ev {
            TermEvent::Key(key) => match decode_key(&key) {
                Some(InputSignal::Quit) => {
                    bus.publish(Event::Leave(LeaveIntent::Quit));
                    true
                }
                Some(signal) => {
                    bus.publish(Event::Input(signal));
                    true
                }
                None => false,
            },
            TermEvent::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Moved => {
                    bus.publish(Event::MouseMove {
                        x: i32::from(mouse.column),
                        y: i32::from(mouse.row),
                    });
                    true
                }
                MouseEventKind::Down(_) => {
                    bus.publish(Event::MouseClick {
                        x: i32::from(mouse.column),
                        y: i32::from(mouse.row),
                    });
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_decode_navigation_keys() {
        assert_eq!(decode_key(&press(KeyCode::Up)), Some(InputSignal::Up));
        assert_eq!(decode_key(&press(KeyCode::Down)), Some(InputSignal::Down));
        assert_eq!(decode_key(&press(KeyCode::Left)), Some(InputSignal::Left));
        assert_eq!(decode_key(&press(KeyCode::Right)), Some(InputSignal::Right));
        assert_eq!(decode_key(&press(KeyCode::Enter)), Some(InputSignal::Enter));
        assert_eq!(decode_key(&press(KeyCode::Esc)), Some(InputSignal::Escape));
    }

    #[test]
    fn test_decode_text_keys() {
        assert_eq!(
            decode_key(&press(KeyCode::Char('b'))),
            Some(InputSignal::Char('b'))
        );
        assert_eq!(
            decode_key(&press(KeyCode::Char(' '))),
            Some(InputSignal::Space)
        );
        assert_eq!(
            decode_key(&press(KeyCode::Backspace)),
            Some(InputSignal::Backspace)
        );
    }

    #[test]
    fn test_decode_quit_chords() {
        assert_eq!(decode_key(&press(KeyCode::End)), Some(InputSignal::Quit));
        assert_eq!(
            decode_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(InputSignal::Quit)
        );
    }

    #[test]
    fn test_decode_function_keys() {
        assert_eq!(
            decode_key(&press(KeyCode::F(1))),
            Some(InputSignal::Function(1))
        );
        assert_eq!(
            decode_key(&press(KeyCode::F(12))),
            Some(InputSignal::Function(12))
        );
        assert_eq!(decode_key(&press(KeyCode::F(13))), None);
    }

    #[test]
    fn test_release_events_ignored() {
        let mut key = press(KeyCode::Up);
        key.kind = KeyEventKind::Release;
        assert_eq!(decode_key(&key), None);
    }

    #[test]
    fn test_action_keys() {
        assert_eq!(InputSignal::Char('b').action_key().as_deref(), Some("b"));
        assert_eq!(InputSignal::Function(3).action_key().as_deref(), Some("F3"));
        assert_eq!(InputSignal::Up.action_key(), None);
    }
}
