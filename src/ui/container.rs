// Container - groups children and walks focus between them
//
// A container owns an ordered child list with one selected slot. UP/DOWN
// move the selection over selectable children; running off either end
// leaves focus and bubbles a menu action on the bus, where the next
// subscriber up the focused path picks it up. While focused, the container
// itself sits on the top-only menu channel so bubbles from deeper groups
// land here first.

use crate::error::Error;
use crate::events::{Bus, Event, EventKind, MenuDirection, Receiver};
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use crate::ui::{Component, ComponentRef};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Where a selection move ended up.
pub(crate) enum Edge {
    Moved,
    HitStart,
    HitEnd,
}

/// Ordered children plus the selected slot. Shared by every component that
/// navigates a child list.
pub(crate) struct ChildList {
    items: Vec<ComponentRef>,
    selected: usize,
}

impl ChildList {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
        }
    }

    pub(crate) fn push(&mut self, child: ComponentRef) {
        self.items.push(child);
        if self.items.len() == 1 || !self.selectable_at(self.selected) {
            self.select_first();
        }
    }

    pub(crate) fn replace(&mut self, children: Vec<ComponentRef>) {
        self.items = children;
        self.select_first();
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&ComponentRef> {
        self.items.get(index)
    }

    pub(crate) fn selected_index(&self) -> usize {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, index: usize) {
        if index < self.items.len() {
            self.selected = index;
        }
    }

    pub(crate) fn selectable_at(&self, index: usize) -> bool {
        self.items
            .get(index)
            .map(|child| child.borrow().is_selectable())
            .unwrap_or(false)
    }

    pub(crate) fn any_selectable(&self) -> bool {
        (0..self.items.len()).any(|index| self.selectable_at(index))
    }

    /// Park the selection on the first selectable child without focusing it.
    pub(crate) fn select_first(&mut self) {
        self.selected = (0..self.items.len())
            .find(|&index| self.selectable_at(index))
            .unwrap_or(0);
    }

    pub(crate) fn focus_selected(&self, bus: &Bus) {
        if let Some(child) = self.items.get(self.selected) {
            child.borrow_mut().enter_focus(bus);
        }
    }

    pub(crate) fn unfocus_selected(&self, bus: &Bus) {
        if let Some(child) = self.items.get(self.selected) {
            child.borrow_mut().leave_focus(bus);
        }
    }

    pub(crate) fn selected_is_focused(&self) -> bool {
        self.items
            .get(self.selected)
            .map(|child| child.borrow().focused())
            .unwrap_or(false)
    }

    pub(crate) fn selected_is_focused_group(&self) -> bool {
        self.items
            .get(self.selected)
            .map(|child| {
                let child = child.borrow();
                child.is_group() && child.focused()
            })
            .unwrap_or(false)
    }

    pub(crate) fn forward_to_selected(&self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        match self.items.get(self.selected) {
            Some(child) => child.borrow_mut().receive(input, bus),
            None => Ok(()),
        }
    }

    /// Step the selection over selectable children, stopping at the ends.
    /// On an edge the current child keeps the selection; the caller decides
    /// whether to bubble out or wrap.
    pub(crate) fn move_selection(&mut self, by: i32, bus: &Bus) -> Edge {
        let mut index = self.selected as i32;
        loop {
            index += by;
            if index < 0 {
                return Edge::HitStart;
            }
            if index >= self.items.len() as i32 {
                return Edge::HitEnd;
            }
            if self.selectable_at(index as usize) {
                self.unfocus_selected(bus);
                self.selected = index as usize;
                self.focus_selected(bus);
                return Edge::Moved;
            }
        }
    }

    /// Step the selection with wraparound, always landing focused. Used by
    /// the root panel, which never bubbles out.
    pub(crate) fn wrap_selection(&mut self, by: i32, bus: &Bus) {
        let len = self.items.len() as i32;
        if len == 0 {
            return;
        }
        let mut index = self.selected as i32;
        for _ in 0..len {
            index = (index + by).rem_euclid(len);
            if self.selectable_at(index as usize) {
                self.unfocus_selected(bus);
                self.selected = index as usize;
                self.focus_selected(bus);
                return;
            }
        }
    }

    pub(crate) fn set_data_all(&mut self, data: &Value) -> Result<(), Error> {
        for child in &self.items {
            child.borrow_mut().set_data(data)?;
        }
        Ok(())
    }

    pub(crate) fn display_all(&self, surface: &mut Surface) {
        for child in &self.items {
            child.borrow_mut().display(surface);
        }
    }

    /// Index of the selectable child under a point, in the same coordinate
    /// space as the children's frames.
    pub(crate) fn hit_test(&self, x: i32, y: i32) -> Option<usize> {
        self.items.iter().position(|child| {
            let child = child.borrow();
            child.is_selectable() && child.frame().contains(x, y)
        })
    }
}

pub struct Container {
    frame: Frame,
    list: ChildList,
    focused: bool,
    self_ref: Weak<RefCell<Container>>,
}

impl Container {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            list: ChildList::new(),
            focused: false,
            self_ref: Weak::new(),
        }
    }

    pub fn into_ref(self) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|weak| {
            let mut container = self;
            container.self_ref = weak.clone();
            RefCell::new(container)
        })
    }

    pub fn add_child(&mut self, child: ComponentRef) {
        self.list.push(child);
    }

    pub fn set_children(&mut self, children: Vec<ComponentRef>) {
        self.list.replace(children);
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    fn bubble(&mut self, edge: Edge, bus: &Bus) {
        match edge {
            Edge::Moved => {}
            Edge::HitStart => {
                self.leave_focus(bus);
                bus.publish(Event::MenuAction(MenuDirection::Previous));
            }
            Edge::HitEnd => {
                self.leave_focus(bus);
                bus.publish(Event::MenuAction(MenuDirection::Next));
            }
        }
    }
}

impl Component for Container {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn is_selectable(&self) -> bool {
        self.list.any_selectable()
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
        if let Some(me) = self.self_ref.upgrade() {
            bus.subscribe(&me, EventKind::MenuAction);
        }
        self.list.focus_selected(bus);
    }

    fn leave_focus(&mut self, bus: &Bus) {
        if !self.focused {
            return;
        }
        self.focused = false;
        self.list.unfocus_selected(bus);
        if let Some(me) = self.self_ref.upgrade() {
            bus.unsubscribe(&me, EventKind::MenuAction);
        }
    }

    fn set_data(&mut self, data: &Value) -> Result<(), Error> {
        self.list.set_data_all(data)
    }

    fn receive(&mut self, input: &InputSignal, bus: &Bus) -> Result<(), Error> {
        match input {
            InputSignal::Up | InputSignal::Down if !self.list.selected_is_focused_group() => {
                let by = if matches!(input, InputSignal::Up) { -1 } else { 1 };
                let edge = self.list.move_selection(by, bus);
                self.bubble(edge, bus);
                Ok(())
            }
            _ => self.list.forward_to_selected(input, bus),
        }
    }

    fn display(&mut self, surface: &mut Surface) {
        self.list.display_all(surface);
    }
}

impl Receiver for Container {
    fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
        if let Event::MenuAction(direction) = event {
            let by = match direction {
                MenuDirection::Next => 1,
                MenuDirection::Previous => -1,
            };
            let edge = self.list.move_selection(by, bus);
            self.bubble(edge, bus);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Mailbox;
    use crate::ui::{Button, Checkbox, StaticText};
    use serde_json::json;

    fn button(y: i32, label: &str) -> ComponentRef {
        Rc::new(RefCell::new(Button::new(
            Frame::new(0, y, 10, 1),
            label.to_string(),
            vec![Event::PlayerAction(label.to_string())],
        )))
    }

    fn label(y: i32, text: &str) -> ComponentRef {
        Rc::new(RefCell::new(StaticText::new(
            Frame::new(0, y, 10, 1),
            text.to_string(),
        )))
    }

    #[test]
    fn test_moves_over_unselectable_children() {
        let bus = Bus::new();
        let container = Container::new(Frame::new(0, 0, 10, 5)).into_ref();
        container.borrow_mut().set_children(vec![
            button(0, "first"),
            label(1, "divider"),
            button(2, "second"),
        ]);
        container.borrow_mut().enter_focus(&bus);
        assert!(container.borrow().list.get(0).unwrap().borrow().focused());

        container
            .borrow_mut()
            .receive(&InputSignal::Down, &bus)
            .unwrap();

        let container = container.borrow();
        assert_eq!(container.list.selected_index(), 2);
        assert!(container.list.get(2).unwrap().borrow().focused());
        assert!(!container.list.get(0).unwrap().borrow().focused());
    }

    #[test]
    fn test_edge_leaves_focus_and_bubbles() {
        let bus = Bus::new();
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::MenuAction);
        let container = Container::new(Frame::new(0, 0, 10, 5)).into_ref();
        container
            .borrow_mut()
            .set_children(vec![button(0, "only")]);
        container.borrow_mut().enter_focus(&bus);

        container
            .borrow_mut()
            .receive(&InputSignal::Down, &bus)
            .unwrap();

        assert!(!container.borrow().focused());
        assert!(!container.borrow().list.get(0).unwrap().borrow().focused());
        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::MenuAction(MenuDirection::Next)));
    }

    // Feeds decoded input to the container the way an owning state does, so
    // bubbled menu actions go through the bus queue instead of re-entering a
    // container the caller still holds borrowed.
    struct Driver {
        target: Rc<RefCell<Container>>,
    }

    impl Receiver for Driver {
        fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
            if let Event::Input(signal) = event {
                self.target.borrow_mut().receive(signal, bus)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_bubble_from_inner_group_moves_outer_selection() {
        let bus = Bus::new();
        let inner = Container::new(Frame::new(0, 0, 10, 1)).into_ref();
        inner.borrow_mut().set_children(vec![button(0, "inner")]);
        let outer = Container::new(Frame::new(0, 0, 10, 5)).into_ref();
        outer
            .borrow_mut()
            .set_children(vec![inner.clone(), button(1, "after")]);
        outer.borrow_mut().enter_focus(&bus);
        assert!(inner.borrow().focused());
        let driver = Rc::new(RefCell::new(Driver {
            target: outer.clone(),
        }));
        bus.subscribe(&driver, EventKind::Input);

        // DOWN reaches the inner group, which runs off its end and bubbles;
        // the outer container picks the action up and moves on.
        bus.publish(Event::Input(InputSignal::Down));

        assert!(!inner.borrow().focused());
        let outer = outer.borrow();
        assert_eq!(outer.list.selected_index(), 1);
        assert!(outer.list.get(1).unwrap().borrow().focused());
    }

    #[test]
    fn test_other_input_reaches_focused_leaf() {
        let bus = Bus::new();
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::ModelChanged);
        let container = Container::new(Frame::new(0, 0, 12, 2)).into_ref();
        container
            .borrow_mut()
            .set_children(vec![Rc::new(RefCell::new(Checkbox::new(
                Frame::new(0, 0, 12, 1),
                "music".to_string(),
                Some("options.music".to_string()),
            )))]);
        container.borrow_mut().enter_focus(&bus);

        container
            .borrow_mut()
            .receive(&InputSignal::Enter, &bus)
            .unwrap();

        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::ModelChanged { source, .. } if source == "options.music"));
    }

    #[test]
    fn test_set_data_feeds_every_child() {
        let container = Container::new(Frame::new(0, 0, 12, 3)).into_ref();
        container.borrow_mut().set_children(vec![
            Rc::new(RefCell::new(Checkbox::new(
                Frame::new(0, 0, 12, 1),
                "music".to_string(),
                Some("options.music".to_string()),
            ))),
            Rc::new(RefCell::new(Checkbox::new(
                Frame::new(0, 1, 12, 1),
                "sound".to_string(),
                Some("options.sound".to_string()),
            ))),
        ]);

        container
            .borrow_mut()
            .set_data(&json!({"options": {"music": true, "sound": false}}))
            .unwrap();

        let container = container.borrow();
        let mut surface = Surface::new(12, 2);
        container.list.display_all(&mut surface);
        assert_eq!(surface.row_text(0), "[x] music   ");
        assert_eq!(surface.row_text(1), "[ ] sound   ");
    }

    #[test]
    fn test_empty_container_is_not_selectable() {
        let container = Container::new(Frame::new(0, 0, 4, 4));
        assert!(!container.is_selectable());
    }
}
