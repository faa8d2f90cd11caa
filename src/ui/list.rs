// List view - a pick list rebuilt from a bound array
//
// The list binds to an array of `{label, selected}` rows and rebuilds its
// item children on every re-bind, so rows can appear and vanish as the model
// changes. Each item addresses its own row by index ("stock.2.selected");
// toggling publishes that path and the round trip through the state's
// re-bind confirms it.

use crate::data::read_path;
use crate::error::{BuildError, Error};
use crate::events::{Bus, Event, EventKind, MenuDirection, Receiver};
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use crate::ui::{publish_change, Component};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One row of a list: a label with a toggle mark.
pub struct ListItem {
    frame: Frame,
    label: String,
    selected: bool,
    source: String,
    focused: bool,
}

impl ListItem {
    pub fn new(frame: Frame, label: String, selected: bool, source: String) -> Self {
        Self {
            frame,
            label,
            selected,
            source,
            focused: false,
        }
    }

    pub(crate) fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

impl Component for ListItem {
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
            self.selected = !self.selected;
            publish_change(bus, &self.source, Value::Bool(self.selected));
        }
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface) {
        let mark = if self.selected { 'x' } else { ' ' };
        let text = format!("[{}] {}", mark, self.label);
        if self.focused {
            surface.print_highlighted(self.frame.x, self.frame.y, &text);
        } else {
            surface.print(self.frame.x, self.frame.y, &text);
        }
    }
}

/// The list container. Navigation works like any container: UP/DOWN walk the
/// rows, and the edges leave focus and bubble on the menu channel.
pub struct ListView {
    frame: Frame,
    source: String,
    items: Vec<Rc<RefCell<ListItem>>>,
    selected: usize,
    focused: bool,
    self_ref: Weak<RefCell<ListView>>,
}

impl ListView {
    pub fn new(frame: Frame, source: impl Into<String>) -> Self {
        Self {
            frame,
            source: source.into(),
            items: Vec::new(),
            selected: 0,
            focused: false,
            self_ref: Weak::new(),
        }
    }

    /// Wrap into the shared handle the tree uses. The list keeps a weak
    /// handle to itself so it can subscribe on the menu channel when
    /// focused.
    pub fn into_ref(self) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|weak| {
            let mut list = self;
            list.self_ref = weak.clone();
            RefCell::new(list)
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn subscribe_self(&self, bus: &Bus) {
        if let Some(me) = self.self_ref.upgrade() {
            bus.subscribe(&me, EventKind::MenuAction);
        }
    }

    fn unsubscribe_self(&self, bus: &Bus) {
        if let Some(me) = self.self_ref.upgrade() {
            bus.unsubscribe(&me, EventKind::MenuAction);
        }
    }

    fn mark_selected(&self, focused: bool) {
        if let Some(item) = self.items.get(self.selected) {
            item.borrow_mut().set_focused(focused);
        }
    }

    fn move_selection(&mut self, by: i32, bus: &Bus) {
        if self.items.is_empty() {
            return;
        }
        self.mark_selected(false);
        let next = self.selected as i32 + by;
        if next < 0 {
            self.selected = 0;
            self.leave_focus(bus);
            bus.publish(Event::MenuAction(MenuDirection::Previous));
        } else if next >= self.items.len() as i32 {
            self.selected = self.items.len() - 1;
            self.leave_focus(bus);
            bus.publish(Event::MenuAction(MenuDirection::Next));
        } else {
            self.selected = next as usize;
            self.mark_selected(true);
        }
    }
}

impl Component for ListView {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn is_selectable(&self) -> bool {
        !self.items.is_empty()
    }

    fn is_group(&self) -> bool {
        true
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn enter_focus(&mut self, bus: &Bus) {
        if self.focused {
            return;
        }
        self.focused = true;
        self.subscribe_self(bus);
        self.mark_selected(true);
    }

    fn leave_focus(&mut self, bus: &Bus) {
        if !self.focused {
            return;
        }
        self.focused = false;
        self.mark_selected(false);
        self.unsubscribe_self(bus);
    }

    fn set_data(&mut self, data: &Value) -> Result<(), Error> {
        let rows = read_path(data, &self.source)?.as_array().ok_or_else(|| {
            BuildError::InvalidComponent(format!("{} must be an array", self.source))
        })?;
        self.items = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let label = row
                    .get("label")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let selected = row.get("selected").and_then(Value::as_bool).unwrap_or(false);
                let frame = Frame::new(self.frame.x, self.frame.y + index as i32, self.frame.w, 1);
                let source = format!("{}.{}.selected", self.source, index);
                Rc::new(RefCell::new(ListItem::new(frame, label, selected, source)))
            })
            .collect();
        if !self.items.is_empty() {
            self.selected = self.selected.min(self.items.len() - 1);
            if self.focused {
                self.mark_selected(true);
            }
        }
        Ok(())
    }

    fn receive(&mut self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        match input {
            InputSignal::Up => {
                self.move_selection(-1, bus);
                Ok(())
            }
            InputSignal::Down => {
                self.move_selection(1, bus);
                Ok(())
            }
            _ => match self.items.get(self.selected) {
                Some(item) => item.borrow_mut().receive(input, bus),
                None => Ok(()),
            },
        }
    }

    fn display(&mut self, surface: &mut Surface) {
        for (row, item) in self.items.iter().enumerate() {
            if row as i32 >= self.frame.h {
                break;
            }
            item.borrow_mut().display(surface);
        }
    }
}

impl Receiver for ListView {
    fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
        if let Event::MenuAction(direction) = event {
            match direction {
                MenuDirection::Next => self.move_selection(1, bus),
                MenuDirection::Previous => self.move_selection(-1, bus),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Mailbox;
    use serde_json::json;

    fn stock_data() -> Value {
        json!({
            "stock": [
                {"label": "ale", "selected": false},
                {"label": "bread", "selected": true},
                {"label": "meat", "selected": false},
            ]
        })
    }

    fn bound_list(bus: &Bus) -> Rc<RefCell<ListView>> {
        let list = ListView::new(Frame::new(0, 0, 12, 5), "stock").into_ref();
        list.borrow_mut().set_data(&stock_data()).unwrap();
        list.borrow_mut().enter_focus(bus);
        list
    }

    #[test]
    fn test_rebuilds_items_from_array() {
        let list = ListView::new(Frame::new(2, 3, 12, 5), "stock").into_ref();
        list.borrow_mut().set_data(&stock_data()).unwrap();

        let list = list.borrow();
        assert_eq!(list.len(), 3);
        let second = list.items[1].borrow();
        assert_eq!(second.frame(), Frame::new(2, 4, 12, 1));
        assert!(second.selected);
    }

    #[test]
    fn test_toggle_publishes_row_path() {
        let bus = Bus::new();
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::ModelChanged);
        let list = bound_list(&bus);

        list.borrow_mut().receive(&InputSignal::Enter, &bus).unwrap();

        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 1);
        let Event::ModelChanged { source, value } = &events[0] else {
            panic!("expected a model change");
        };
        assert_eq!(source, "stock.0.selected");
        assert_eq!(value, &Value::Bool(true));
    }

    #[test]
    fn test_selection_survives_rebind() {
        let bus = Bus::new();
        let list = bound_list(&bus);
        list.borrow_mut().receive(&InputSignal::Down, &bus).unwrap();

        list.borrow_mut().set_data(&stock_data()).unwrap();

        let list = list.borrow();
        assert_eq!(list.selected, 1);
        assert!(list.items[1].borrow().focused());
        assert!(!list.items[0].borrow().focused());
    }

    #[test]
    fn test_top_edge_bubbles_previous() {
        let bus = Bus::new();
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::MenuAction);
        let list = bound_list(&bus);

        // Index 0, moving up: the list leaves focus and bubbles out; with
        // the list unsubscribed the mailbox is the top subscriber again.
        list.borrow_mut().receive(&InputSignal::Up, &bus).unwrap();

        assert!(!list.borrow().focused());
        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::MenuAction(MenuDirection::Previous)
        ));
    }

    #[test]
    fn test_bottom_edge_bubbles_next() {
        let bus = Bus::new();
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::MenuAction);
        let list = bound_list(&bus);

        for _ in 0..3 {
            list.borrow_mut().receive(&InputSignal::Down, &bus).unwrap();
        }

        assert!(!list.borrow().focused());
        assert_eq!(list.borrow().selected, 2);
        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::MenuAction(MenuDirection::Next)));
    }

    #[test]
    fn test_non_array_source_is_rejected() {
        let list = ListView::new(Frame::new(0, 0, 12, 5), "stock").into_ref();
        let err = list.borrow_mut().set_data(&json!({"stock": 3})).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_display_highlights_focused_row() {
        let bus = Bus::new();
        let list = bound_list(&bus);
        let mut surface = Surface::new(12, 5);
        list.borrow_mut().display(&mut surface);
        assert_eq!(surface.row_text(0), "[ ] ale     ");
        assert_eq!(surface.row_text(1), "[x] bread   ");
    }
}
