// Menu state - a panel over the game, driven by the data dictionary
//
// The state owns the built panel and the data it binds. Edits never touch
// the data directly: widgets publish model changes, the state writes the
// value back at the source path and re-binds the whole tree, so one edit
// shows up everywhere the path is bound.

use crate::data::write_path;
use crate::error::Error;
use crate::events::{Bus, Event, EventKind, Receiver};
use crate::input::InputSignal;
use crate::state::{State, StateNode};
use crate::surface::Surface;
use crate::ui::{build_menu, BuildContext, Component, RootPanel};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub struct MenuState {
    node: Rc<StateNode>,
    parent: Option<String>,
    data: Value,
    root: Rc<RefCell<RootPanel>>,
}

impl MenuState {
    /// Build the menu tree the node carries. Fails with the builder's named
    /// errors, or a path error when a bound source is missing from the
    /// starting data.
    pub fn new(node: Rc<StateNode>, screen_w: i32, screen_h: i32) -> Result<Self, Error> {
        let data = node.data().clone();
        let tree = node.menu().cloned().unwrap_or(Value::Null);
        let ctx = BuildContext::new(screen_w, screen_h, &data);
        let root = build_menu(&ctx, &tree)?;
        root.borrow_mut().set_data(&data)?;
        Ok(Self {
            node,
            parent: None,
            data,
            root,
        })
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn root(&self) -> &Rc<RefCell<RootPanel>> {
        &self.root
    }

    fn apply_change(&mut self, source: &str, value: &Value) -> Result<(), Error> {
        write_path(&mut self.data, source, value.clone())?;
        self.root.borrow_mut().set_data(&self.data)?;
        Ok(())
    }
}

impl Receiver for MenuState {
    fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
        match event {
            Event::Input(InputSignal::Escape) => {
                if let Some(parent) = &self.parent {
                    bus.publish(Event::PreviousState(parent.clone()));
                }
                Ok(())
            }
            Event::Input(signal) => self.root.borrow_mut().receive(signal, bus),
            Event::ModelChanged { source, value } => self.apply_change(source, value),
            Event::MouseMove { x, y } => {
                let hit = self.root.borrow().child_at(*x, *y);
                if let Some(index) = hit {
                    self.root.borrow_mut().focus_child(index, bus);
                }
                Ok(())
            }
            Event::MouseClick { x, y } => {
                let hit = self.root.borrow().child_at(*x, *y);
                if let Some(index) = hit {
                    self.root.borrow_mut().focus_child(index, bus);
                    self.root.borrow_mut().receive(&InputSignal::Enter, bus)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl State for MenuState {
    fn name(&self) -> &str {
        &self.node.name
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[
            EventKind::Input,
            EventKind::ModelChanged,
            EventKind::MouseMove,
            EventKind::MouseClick,
        ]
    }

    fn pauses_game(&self) -> bool {
        self.node.pauses_game()
    }

    fn set_parent(&mut self, parent: &str) {
        self.parent = Some(parent.to_string());
    }

    fn activate(&mut self, bus: &Bus) {
        self.root.borrow_mut().enter_focus(bus);
    }

    fn deactivate(&mut self, bus: &Bus) {
        self.root.borrow_mut().leave_focus(bus);
    }

    fn clean(&mut self) {
        self.root.borrow_mut().clean();
    }

    fn display(&mut self, screen: &mut Surface) {
        self.root.borrow_mut().display(screen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Mailbox;
    use serde_json::json;

    fn options_state() -> (Rc<RefCell<MenuState>>, Bus) {
        let bus = Bus::new();
        let node = Rc::new(
            StateNode::parse(&json!({
                "name": "options",
                "data": {"options": {"music": false, "volume": {
                    "minimum": 0, "maximum": 10, "step": 1, "current": 4,
                }}},
                "menu": {
                    "x": 0, "y": 0, "w": 24, "h": 8,
                    "title": "Options",
                    "children": [
                        {"type": "Checkbox", "label": "music", "source": "options.music"},
                        {"type": "NumberPicker", "source": "options.volume"},
                        {"type": "DynamicText", "source": "options.volume.current"},
                    ],
                },
            }))
            .unwrap(),
        );
        let state = Rc::new(RefCell::new(MenuState::new(node, 24, 8).unwrap()));
        for kind in [
            EventKind::Input,
            EventKind::ModelChanged,
            EventKind::MouseMove,
            EventKind::MouseClick,
        ] {
            bus.subscribe(&state, kind);
        }
        state.borrow_mut().activate(&bus);
        (state, bus)
    }

    #[test]
    fn test_edit_writes_back_and_rebinds() {
        let (state, bus) = options_state();

        // ENTER toggles the focused checkbox; the change comes back through
        // the bus and lands in the data dictionary.
        bus.publish(Event::Input(InputSignal::Enter));

        assert_eq!(state.borrow().data()["options"]["music"], json!(true));
        let mut screen = Surface::new(24, 8);
        state.borrow_mut().display(&mut screen);
        assert!(screen.row_text(1).contains("[x] music"));
    }

    #[test]
    fn test_one_edit_shows_everywhere() {
        let (state, bus) = options_state();

        // Move to the number picker and step it; the dynamic text bound to
        // the same path picks the new value up on the re-bind.
        bus.publish(Event::Input(InputSignal::Down));
        bus.publish(Event::Input(InputSignal::Right));

        assert_eq!(
            state.borrow().data()["options"]["volume"]["current"],
            json!(5)
        );
        let mut screen = Surface::new(24, 8);
        state.borrow_mut().display(&mut screen);
        assert!(screen.row_text(3).contains('5'));
    }

    #[test]
    fn test_escape_targets_parent() {
        let (state, bus) = options_state();
        state.borrow_mut().set_parent("camp");
        let pops = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&pops, EventKind::PreviousState);

        bus.publish(Event::Input(InputSignal::Escape));

        let events = pops.borrow_mut().take();
        assert!(matches!(&events[0], Event::PreviousState(target) if target == "camp"));
    }

    #[test]
    fn test_mouse_click_presses_hovered_button() {
        let (state, bus) = options_state();

        // The checkbox sits on panel row 1; click it.
        bus.publish(Event::MouseClick { x: 2, y: 1 });

        assert_eq!(state.borrow().data()["options"]["music"], json!(true));
    }

    #[test]
    fn test_missing_bound_path_fails_the_build() {
        let node = Rc::new(
            StateNode::parse(&json!({
                "name": "broken",
                "menu": {
                    "children": [
                        {"type": "DynamicText", "source": "missing.path"},
                    ],
                },
            }))
            .unwrap(),
        );
        assert!(MenuState::new(node, 20, 10).is_err());
    }
}
