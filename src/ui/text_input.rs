// Text input - a single-line editable field

use crate::data::read_path;
use crate::error::Error;
use crate::events::Bus;
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use crate::ui::{publish_change, Component};
use serde_json::Value;

/// A focusable line editor bound to a dotted path. Every edit publishes the
/// whole value, so other components bound to the same path stay in sync
/// keystroke by keystroke.
pub struct TextInput {
    frame: Frame,
    source: String,
    value: String,
    focused: bool,
}

impl TextInput {
    pub fn new(frame: Frame, source: impl Into<String>) -> Self {
        Self {
            frame,
            source: source.into(),
            value: String::new(),
            focused: false,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Component for TextInput {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn is_selectable(&self) -> bool {
        true
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn enter_focus(&mut self, _bus: &Bus) {
        self.focused = true;
    }

    fn leave_focus(&mut self, _bus: &Bus) {
        self.focused = false;
    }

    fn set_data(&mut self, data: &Value) -> Result<(), Error> {
        // A fresh input's path may not exist until the first edit writes it;
        // only an existing value overrides the field.
        if let Ok(value) = read_path(data, &self.source) {
            if let Some(text) = value.as_str() {
                self.value = text.to_string();
            }
        }
        Ok(())
    }

    fn receive(&mut self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        let edited = match input {
            InputSignal::Char(c) => {
                self.value.push(*c);
                true
            }
            InputSignal::Space => {
                self.value.push(' ');
                true
            }
            InputSignal::Backspace => self.value.pop().is_some(),
            _ => false,
        };
        if edited {
            publish_change(bus, &self.source, Value::String(self.value.clone()));
        }
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface) {
        if self.focused && self.value.is_empty() {
            // An empty focused field still needs a visible caret cell.
            surface.print_highlighted(self.frame.x, self.frame.y, " ");
        } else if self.focused {
            surface.print_highlighted(self.frame.x, self.frame.y, &self.value);
        } else {
            surface.print(self.frame.x, self.frame.y, &self.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind, Mailbox};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn model_mailbox(bus: &Bus) -> Rc<RefCell<Mailbox>> {
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::ModelChanged);
        mailbox
    }

    #[test]
    fn test_typing_appends_and_publishes() {
        let bus = Bus::new();
        let mailbox = model_mailbox(&bus);
        let mut input = TextInput::new(Frame::new(0, 0, 10, 1), "save.name");

        input.receive(&InputSignal::Char('h'), &bus).unwrap();
        input.receive(&InputSignal::Char('i'), &bus).unwrap();
        input.receive(&InputSignal::Space, &bus).unwrap();

        assert_eq!(input.value(), "hi ");
        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 3);
        let Event::ModelChanged { source, value } = &events[2] else {
            panic!("expected a model change");
        };
        assert_eq!(source, "save.name");
        assert_eq!(value, &Value::String("hi ".to_string()));
    }

    #[test]
    fn test_backspace_on_empty_is_silent() {
        let bus = Bus::new();
        let mailbox = model_mailbox(&bus);
        let mut input = TextInput::new(Frame::new(0, 0, 10, 1), "save.name");

        input.receive(&InputSignal::Backspace, &bus).unwrap();

        assert!(mailbox.borrow().is_empty());
        assert_eq!(input.value(), "");
    }

    #[test]
    fn test_rebind_adopts_existing_value() {
        let mut input = TextInput::new(Frame::new(0, 0, 10, 1), "save.name");
        input.set_data(&json!({"save": {"name": "fort"}})).unwrap();
        assert_eq!(input.value(), "fort");

        // Missing path leaves the field alone instead of failing.
        input.set_data(&json!({})).unwrap();
        assert_eq!(input.value(), "fort");
    }

    #[test]
    fn test_focused_empty_field_shows_caret_cell() {
        let bus = Bus::new();
        let mut input = TextInput::new(Frame::new(0, 0, 5, 1), "save.name");
        input.enter_focus(&bus);
        let mut surface = Surface::new(5, 1);
        input.display(&mut surface);
        let cell_style = surface.buffer().cell((0u16, 0u16)).map(|c| c.style());
        assert!(cell_style.is_some_and(|s| s
            .add_modifier
            .contains(ratatui::style::Modifier::REVERSED)));
    }
}
