// UI component tree - data-bound menu widgets
//
// Menus are trees of components drawn onto the root panel's surface. Every
// component knows its box, whether it can take focus, and how to re-bind
// itself from the menu's data dictionary. Input travels DOWN the tree (the
// state hands it to the root, containers hand it to the focused child);
// focus handoff at a container's edge travels back UP through the bus's
// top-only menu channel, so deep nesting never needs parent pointers.
//
// Components mutate nothing directly: value edits and button presses go out
// as bus events and come back through `set_data` once the state has written
// the model.

pub mod builder;
pub mod button;
pub mod checkbox;
pub mod container;
pub mod line;
pub mod list;
pub mod numbers;
pub mod root;
pub mod text;
pub mod text_input;

pub use builder::{build_menu, choice_box, question_box, text_box, BuildContext};
pub use button::Button;
pub use checkbox::Checkbox;
pub use container::Container;
pub use line::Line;
pub use list::{ListItem, ListView};
pub use numbers::{NumberPicker, Ruler};
pub use root::RootPanel;
pub use text::{DynamicText, StaticText, TextBlock};
pub use text_input::TextInput;

use crate::error::Error;
use crate::events::{Bus, Event};
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle type for tree nodes.
pub type ComponentRef = Rc<RefCell<dyn Component>>;

/// One node of the menu tree.
///
/// Non-selectable components (text, lines) keep the default no-op focus and
/// input methods; selectable leaves set their `focused` flag in
/// `enter_focus`/`leave_focus`; containers additionally subscribe to the
/// menu channel while focused.
pub trait Component {
    /// The component's box. For everything below the root panel the
    /// coordinates are local to the root panel's surface.
    fn frame(&self) -> Frame;

    fn set_frame(&mut self, frame: Frame);

    fn is_selectable(&self) -> bool {
        false
    }

    /// Groups (containers, lists) navigate among their own children, so a
    /// parent hands UP/DOWN to a focused group instead of moving its own
    /// selection.
    fn is_group(&self) -> bool {
        false
    }

    fn focused(&self) -> bool {
        false
    }

    fn enter_focus(&mut self, _bus: &Bus) {}

    fn leave_focus(&mut self, _bus: &Bus) {}

    /// Re-bind from the menu's data dictionary. Bound components fail with
    /// a path error when their source is missing; unbound ones ignore it.
    fn set_data(&mut self, _data: &Value) -> Result<(), Error> {
        Ok(())
    }

    /// Handle one decoded signal. Called only while focused.
    fn receive(&mut self, _input: &InputSignal, _bus: &Bus) -> Result<(), Error> {
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface);
}

/// Publish a model edit. The owning state writes the value back at `source`
/// and re-binds the whole tree.
pub(crate) fn publish_change(bus: &Bus, source: &str, value: Value) {
    bus.publish(Event::ModelChanged {
        source: source.to_string(),
        value,
    });
}
