// Checkbox - a data-bound boolean toggle

use crate::data::read_path;
use crate::error::Error;
use crate::events::Bus;
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use crate::ui::{publish_change, Component};
use serde_json::Value;

pub struct Checkbox {
    frame: Frame,
    label: String,
    /// Dotted path of the bound boolean; unbound boxes toggle locally only.
    source: Option<String>,
    checked: bool,
    focused: bool,
}

impl Checkbox {
    pub fn new(frame: Frame, label: impl Into<String>, source: Option<String>) -> Self {
        Self {
            frame,
            label: label.into(),
            source,
            checked: false,
            focused: false,
        }
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }
}

impl Component for Checkbox {
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
        if let Some(source) = &self.source {
            self.checked = read_path(data, source)?.as_bool().unwrap_or(false);
        }
        Ok(())
    }

    fn receive(&mut self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        if matches!(input, InputSignal::Enter) {
            self.checked = !self.checked;
            if let Some(source) = &self.source {
                publish_change(bus, source, Value::Bool(self.checked));
            }
        }
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface) {
        let mark = if self.checked { 'x' } else { ' ' };
        let text = format!("[{}] {}", mark, self.label);
        if self.focused {
            surface.print_highlighted(self.frame.x, self.frame.y, &text);
        } else {
            surface.print(self.frame.x, self.frame.y, &text);
        }
    }
}
