// World state - cursor-driven navigation over the map
//
// A world state owns the focus cursor and the viewport camera. Input moves
// the cursor, confirmed selections come back as area-select events, and the
// state decides what they mean: with a submenu it prompts for the secondary
// pick first, otherwise the area goes straight to the command sink with the
// state's action verb. Keys bound in the state tree push child states.

use crate::error::Error;
use crate::events::{Bus, Event, EventKind, Receiver};
use crate::focus::{Area, Focus, TilePos};
use crate::input::InputSignal;
use crate::state::{State, StateNode};
use crate::surface::Surface;
use crate::viewport::Viewport;
use ratatui::style::Color;
use std::rc::Rc;

const CURSOR_GLYPH: char = 'X';

/// Where confirmed commands land. The game client applies them to its world
/// model.
pub trait CommandSink {
    fn command(&mut self, verb: &str, object: Option<&str>, area: &Area, bus: &Bus);
}

pub struct WorldState {
    node: Rc<StateNode>,
    parent: Option<String>,
    focus: Focus,
    viewport: Viewport,
    sink: Box<dyn CommandSink>,
    pending: Option<Area>,
    blink: bool,
}

impl WorldState {
    pub fn new(node: Rc<StateNode>, viewport: Viewport, sink: Box<dyn CommandSink>) -> Self {
        let frame = viewport.frame;
        let cursor = TilePos::new(frame.x + frame.w / 2, frame.y + frame.h / 2, 0);
        Self {
            node,
            parent: None,
            focus: Focus::new(cursor),
            viewport,
            sink,
            pending: None,
            blink: true,
        }
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut Focus {
        &mut self.focus
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Keys bound to child states, for help menus.
    pub fn action_keys(&self) -> Vec<&str> {
        self.node.action_keys()
    }

    fn fire(&mut self, area: &Area, object: Option<&str>, bus: &Bus) {
        match self.node.action() {
            Some(verb) => self.sink.command(verb, object, area, bus),
            None => bus.feedback(format!("{}: nothing to apply here", self.node.name)),
        }
    }

    fn handle_input(&mut self, signal: &InputSignal, bus: &Bus) {
        match signal {
            InputSignal::Escape => {
                if self.focus.has_selection() || self.pending.is_some() {
                    self.pending = None;
                    self.focus.cancel();
                    self.focus.set_glyph(CURSOR_GLYPH);
                } else if let Some(parent) = &self.parent {
                    bus.publish(Event::PreviousState(parent.clone()));
                }
            }
            InputSignal::Char(key) => {
                let key = key.to_string();
                if let Some(object) = self.node.submenu().get(&key).cloned() {
                    if let Some(area) = self.pending.take() {
                        self.fire(&area, Some(&object), bus);
                        return;
                    }
                }
                if let Some(child) = self.node.child(&key) {
                    bus.publish(Event::NewState(child.clone()));
                    return;
                }
                self.focus.receive(signal, &mut self.viewport, bus);
            }
            other => self.focus.receive(other, &mut self.viewport, bus),
        }
    }

    fn handle_area(&mut self, area: &Area, bus: &Bus) {
        if !self.node.submenu().is_empty() {
            let picks: Vec<String> = self
                .node
                .submenu()
                .iter()
                .map(|(key, object)| format!("({key}) {object}"))
                .collect();
            bus.feedback(format!("Pick between {}", picks.join(", ")));
            self.pending = Some(area.clone());
            return;
        }
        self.fire(area, None, bus);
    }
}

impl Receiver for WorldState {
    fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
        match event {
            Event::Input(signal) => self.handle_input(signal, bus),
            Event::AreaSelect(area) => self.handle_area(area, bus),
            _ => {}
        }
        Ok(())
    }
}

impl State for WorldState {
    fn name(&self) -> &str {
        &self.node.name
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[EventKind::Input, EventKind::AreaSelect]
    }

    fn pauses_game(&self) -> bool {
        self.node.pauses_game()
    }

    fn set_parent(&mut self, parent: &str) {
        self.parent = Some(parent.to_string());
    }

    fn activate(&mut self, bus: &Bus) {
        let keys = self.node.action_keys();
        if !keys.is_empty() {
            bus.feedback(format!("{}: keys {}", self.node.name, keys.join(", ")));
        }
    }

    fn deactivate(&mut self, _bus: &Bus) {}

    fn clean(&mut self) {}

    fn blink(&mut self, on: bool) {
        self.blink = on;
        if on {
            self.focus.glyph_cycle();
        }
    }

    fn viewport(&self) -> Option<&Viewport> {
        Some(&self.viewport)
    }

    fn display(&mut self, screen: &mut Surface) {
        let z = self.focus.cursor().z;
        if let Some(area) = self.focus.selection() {
            for tile in area.tiles() {
                if tile.z != z {
                    continue;
                }
                if let Some((x, y)) = self.viewport.to_local(tile.x, tile.y) {
                    screen.highlight_cell(x, y, Color::Yellow);
                }
            }
        }
        if self.blink {
            let cursor = self.focus.cursor();
            if let Some((x, y)) = self.viewport.to_local(cursor.x, cursor.y) {
                screen.put_glyph(x, y, self.focus.glyph(), Color::Yellow);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Mailbox;
    use crate::geometry::Frame;
    use serde_json::json;
    use std::cell::RefCell;

    struct RecordingSink {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl CommandSink for RecordingSink {
        fn command(&mut self, verb: &str, object: Option<&str>, area: &Area, _bus: &Bus) {
            self.log.borrow_mut().push(format!(
                "{verb} {} {}",
                object.unwrap_or("-"),
                area.tiles().len()
            ));
        }
    }

    fn world_state(tree: serde_json::Value) -> (Rc<RefCell<WorldState>>, Rc<RefCell<Vec<String>>>, Bus) {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let node = Rc::new(StateNode::parse(&tree).unwrap());
        let viewport = Viewport::new(Frame::new(0, 0, 10, 10), Frame::new(0, 0, 40, 40));
        let state = Rc::new(RefCell::new(WorldState::new(
            node,
            viewport,
            Box::new(RecordingSink { log: log.clone() }),
        )));
        bus.subscribe(&state, EventKind::Input);
        bus.subscribe(&state, EventKind::AreaSelect);
        (state, log, bus)
    }

    #[test]
    fn test_confirmed_selection_reaches_the_sink() {
        let (_state, log, bus) = world_state(json!({"name": "mine", "action": "dig"}));

        bus.publish(Event::Input(InputSignal::Enter));
        bus.publish(Event::Input(InputSignal::Right));
        bus.publish(Event::Input(InputSignal::Enter));

        assert_eq!(log.borrow().as_slice(), ["dig - 2"]);
    }

    #[test]
    fn test_submenu_prompts_before_firing() {
        let (_state, log, bus) = world_state(json!({
            "name": "build", "action": "build",
            "submenu": {"d": "door", "w": "wall"},
        }));
        let feedback = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&feedback, EventKind::Feedback);

        bus.publish(Event::Input(InputSignal::Enter));
        bus.publish(Event::Input(InputSignal::Enter));
        assert!(log.borrow().is_empty());
        let prompts = feedback.borrow_mut().take();
        assert!(matches!(
            &prompts[0],
            Event::Feedback(text) if text.contains("(d) door") && text.contains("(w) wall")
        ));

        bus.publish(Event::Input(InputSignal::Char('w')));
        assert_eq!(log.borrow().as_slice(), ["build wall 1"]);
    }

    #[test]
    fn test_escape_cancels_before_popping() {
        let (state, _log, bus) = world_state(json!({"name": "mine", "action": "dig"}));
        state.borrow_mut().set_parent("camp");
        let pops = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&pops, EventKind::PreviousState);

        // First escape only discards the in-progress selection.
        bus.publish(Event::Input(InputSignal::Enter));
        bus.publish(Event::Input(InputSignal::Escape));
        assert!(pops.borrow().is_empty());
        assert!(!state.borrow().focus().has_selection());

        bus.publish(Event::Input(InputSignal::Escape));
        let events = pops.borrow_mut().take();
        assert!(matches!(&events[0], Event::PreviousState(target) if target == "camp"));
    }

    #[test]
    fn test_parentless_escape_is_ignored() {
        let (_state, _log, bus) = world_state(json!({"name": "camp"}));
        let pops = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&pops, EventKind::PreviousState);

        bus.publish(Event::Input(InputSignal::Escape));

        assert!(pops.borrow().is_empty());
    }

    #[test]
    fn test_bound_key_pushes_child_state() {
        let (_state, _log, bus) = world_state(json!({
            "name": "camp",
            "actions": {"b": {"name": "build", "action": "build"}},
        }));
        let pushes = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&pushes, EventKind::NewState);

        bus.publish(Event::Input(InputSignal::Char('b')));

        let events = pushes.borrow_mut().take();
        assert!(matches!(&events[0], Event::NewState(node) if node.name == "build"));
    }

    #[test]
    fn test_selection_highlight_tracks_viewport() {
        let (state, _log, bus) = world_state(json!({"name": "mine", "action": "dig"}));

        bus.publish(Event::Input(InputSignal::Enter));
        bus.publish(Event::Input(InputSignal::Down));

        let mut screen = Surface::new(10, 10);
        state.borrow_mut().display(&mut screen);
        // Anchor at the frame center (5,5) extended one row down; both cells
        // get the highlight color.
        let cell = screen.buffer().cell((5u16, 5u16)).unwrap();
        assert_eq!(cell.bg, Color::Yellow);
        let cell = screen.buffer().cell((5u16, 6u16)).unwrap();
        assert_eq!(cell.bg, Color::Yellow);
    }
}
