// Numeric components - stepped values with silent bound clamping
//
// Both widgets bind to an object `{minimum, maximum, current, step}` at
// their source path. LEFT/RIGHT step the current value; hitting a bound
// clamps without any error or feedback, and every step publishes the new
// current value at `<source>.current`.

use crate::data::read_path;
use crate::error::{BuildError, Error};
use crate::events::Bus;
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use crate::ui::{publish_change, Component};
use ratatui::symbols;
use serde_json::Value;

/// The shared bound-value model.
#[derive(Debug, Clone)]
pub(crate) struct BoundedValue {
    pub minimum: i64,
    pub maximum: i64,
    pub step: i64,
    pub current: i64,
}

impl Default for BoundedValue {
    fn default() -> Self {
        Self {
            minimum: 0,
            maximum: 0,
            step: 1,
            current: 0,
        }
    }
}

impl BoundedValue {
    fn read_field(data: &Value, source: &str, key: &str) -> Result<i64, Error> {
        let path = format!("{source}.{key}");
        let value = read_path(data, &path)?;
        value
            .as_i64()
            .ok_or_else(|| BuildError::InvalidComponent(format!("{path} must be an integer")).into())
    }

    pub fn from_data(data: &Value, source: &str) -> Result<Self, Error> {
        Ok(Self {
            minimum: Self::read_field(data, source, "minimum")?,
            maximum: Self::read_field(data, source, "maximum")?,
            step: Self::read_field(data, source, "step")?,
            current: Self::read_field(data, source, "current")?,
        })
    }

    /// Step once in `direction` (+1/-1), clamped to the bounds.
    pub fn step_by(&mut self, direction: i64) -> i64 {
        self.current = (self.current + direction * self.step).clamp(self.minimum, self.maximum);
        self.current
    }
}

/// `< value >` spinner.
pub struct NumberPicker {
    frame: Frame,
    source: String,
    value: BoundedValue,
    focused: bool,
}

impl NumberPicker {
    pub fn new(frame: Frame, source: impl Into<String>) -> Self {
        Self {
            frame,
            source: source.into(),
            value: BoundedValue::default(),
            focused: false,
        }
    }

    pub fn current(&self) -> i64 {
        self.value.current
    }

    fn step(&mut self, direction: i64, bus: &Bus) {
        let current = self.value.step_by(direction);
        publish_change(bus, &format!("{}.current", self.source), current.into());
    }
}

impl Component for NumberPicker {
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
        self.value = BoundedValue::from_data(data, &self.source)?;
        Ok(())
    }

    fn receive(&mut self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        match input {
            InputSignal::Left => self.step(-1, bus),
            InputSignal::Right => self.step(1, bus),
            _ => {}
        }
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface) {
        let text = format!("< {} >", self.value.current);
        if self.focused {
            surface.print_highlighted(self.frame.x, self.frame.y, &text);
        } else {
            surface.print(self.frame.x, self.frame.y, &text);
        }
    }
}

/// A gauge over the same bound-value model: a track with a marker at the
/// current value's proportional position.
pub struct Ruler {
    frame: Frame,
    source: String,
    value: BoundedValue,
    focused: bool,
}

impl Ruler {
    pub fn new(frame: Frame, source: impl Into<String>) -> Self {
        Self {
            frame,
            source: source.into(),
            value: BoundedValue::default(),
            focused: false,
        }
    }

    pub fn current(&self) -> i64 {
        self.value.current
    }

    fn marker_x(&self) -> i32 {
        let span = self.value.maximum - self.value.minimum;
        if span <= 0 || self.frame.w < 2 {
            return 0;
        }
        let offset = (self.value.current - self.value.minimum) * i64::from(self.frame.w - 1) / span;
        offset as i32
    }
}

impl Component for Ruler {
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
        self.value = BoundedValue::from_data(data, &self.source)?;
        Ok(())
    }

    fn receive(&mut self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        let direction = match input {
            InputSignal::Left => -1,
            InputSignal::Right => 1,
            _ => return Ok(()),
        };
        let current = self.value.step_by(direction);
        publish_change(bus, &format!("{}.current", self.source), current.into());
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface) {
        surface.hline(self.frame.x, self.frame.y, self.frame.w);
        surface.put_symbol(self.frame.x, self.frame.y, symbols::line::VERTICAL_RIGHT);
        surface.put_symbol(
            self.frame.x + self.frame.w - 1,
            self.frame.y,
            symbols::line::VERTICAL_LEFT,
        );
        let marker = if self.focused { "◆" } else { "◇" };
        surface.put_symbol(self.frame.x + self.marker_x(), self.frame.y, marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind, Mailbox};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn volume_data() -> Value {
        json!({
            "options": {
                "volume": {"minimum": 0, "maximum": 10, "step": 3, "current": 9}
            }
        })
    }

    #[test]
    fn test_increase_clamps_to_maximum() {
        let bus = Bus::new();
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::ModelChanged);
        let mut picker = NumberPicker::new(Frame::new(0, 0, 8, 1), "options.volume");
        picker.set_data(&volume_data()).unwrap();

        picker.receive(&InputSignal::Right, &bus).unwrap();

        assert_eq!(picker.current(), 10);
        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 1);
        let Event::ModelChanged { source, value } = &events[0] else {
            panic!("expected a model change");
        };
        assert_eq!(source, "options.volume.current");
        assert_eq!(value.as_i64(), Some(10));
    }

    #[test]
    fn test_decrease_clamps_to_minimum() {
        let bus = Bus::new();
        let mut picker = NumberPicker::new(Frame::new(0, 0, 8, 1), "options.volume");
        picker.set_data(&volume_data()).unwrap();

        for _ in 0..5 {
            picker.receive(&InputSignal::Left, &bus).unwrap();
        }

        assert_eq!(picker.current(), 0);
    }

    #[test]
    fn test_missing_field_is_a_path_error() {
        let mut picker = NumberPicker::new(Frame::new(0, 0, 8, 1), "options.volume");
        let data = json!({"options": {"volume": {"minimum": 0, "maximum": 10, "current": 5}}});
        let err = picker.set_data(&data).unwrap_err();
        assert!(err.to_string().contains("step"));
    }

    #[test]
    fn test_non_integer_field_is_rejected() {
        let mut picker = NumberPicker::new(Frame::new(0, 0, 8, 1), "options.volume");
        let data = json!({
            "options": {
                "volume": {"minimum": 0, "maximum": 10, "step": "big", "current": 5}
            }
        });
        assert!(picker.set_data(&data).is_err());
    }

    #[test]
    fn test_ruler_marker_tracks_value() {
        let mut ruler = Ruler::new(Frame::new(0, 0, 11, 1), "options.volume");
        let data = json!({
            "options": {
                "volume": {"minimum": 0, "maximum": 10, "step": 1, "current": 5}
            }
        });
        ruler.set_data(&data).unwrap();
        let mut surface = Surface::new(11, 1);
        ruler.display(&mut surface);
        assert_eq!(surface.row_text(0), "├────◇────┤");
    }
}
