// Button - publishes its configured events when activated

use crate::error::Error;
use crate::events::{Bus, Event};
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use crate::ui::Component;

/// A focusable label that fires a fixed list of events on confirm. The
/// events are part of the menu definition: a "Back" button carries a
/// previous-state event, a "New game" button a new-state plus a game event,
/// in the order they should be published.
pub struct Button {
    frame: Frame,
    label: String,
    events: Vec<Event>,
    focused: bool,
}

impl Button {
    pub fn new(frame: Frame, label: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            frame,
            label: label.into(),
            events,
            focused: false,
        }
    }
}

impl Component for Button {
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

    fn receive(&mut self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        if matches!(input, InputSignal::Enter) {
            for event in &self.events {
                bus.publish(event.clone());
            }
        }
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface) {
        if self.focused {
            surface.print_highlighted(self.frame.x, self.frame.y, &self.label);
        } else {
            surface.print(self.frame.x, self.frame.y, &self.label);
        }
    }
}
