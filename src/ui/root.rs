// Root panel - the top of a menu tree
//
// The root owns its own surface: children draw in panel-local coordinates
// and the finished panel is blitted onto the screen at its frame, so a menu
// floats over whatever the state below it rendered. Unlike an inner
// container the root never bubbles out; selection wraps around instead, so
// focus always has somewhere to land.

use crate::error::Error;
use crate::events::{Bus, Event, EventKind, MenuDirection, Receiver};
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::surface::Surface;
use crate::ui::container::ChildList;
use crate::ui::{Component, ComponentRef};
use ratatui::style::Style;
use ratatui::symbols::line;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub struct RootPanel {
    frame: Frame,
    title: String,
    surface: Surface,
    list: ChildList,
    focused: bool,
    self_ref: Weak<RefCell<RootPanel>>,
}

impl std::fmt::Debug for RootPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootPanel")
            .field("frame", &self.frame)
            .field("title", &self.title)
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}

impl RootPanel {
    pub fn new(frame: Frame, title: impl Into<String>) -> Self {
        Self {
            frame,
            title: title.into(),
            surface: Surface::new(frame.w, frame.h),
            list: ChildList::new(),
            focused: false,
            self_ref: Weak::new(),
        }
    }

    pub fn into_ref(self) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|weak| {
            let mut root = self;
            root.self_ref = weak.clone();
            RefCell::new(root)
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_child(&mut self, child: ComponentRef) {
        self.list.push(child);
    }

    /// Install the children and park the selection on the first selectable
    /// one. Nothing is focused until the owning state activates.
    pub fn set_children(&mut self, children: Vec<ComponentRef>) {
        self.list.replace(children);
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    /// Release the panel's surface. Called once when the owning state is
    /// discarded; the panel is not displayed afterwards.
    pub fn clean(&mut self) {
        self.surface = Surface::new(0, 0);
    }

    /// Index of the selectable child under a screen position.
    pub fn child_at(&self, x: i32, y: i32) -> Option<usize> {
        self.list.hit_test(x - self.frame.x, y - self.frame.y)
    }

    /// Move focus straight to a child, as the mouse does.
    pub fn focus_child(&mut self, index: usize, bus: &Bus) {
        if !self.focused || !self.list.selectable_at(index) {
            return;
        }
        if index == self.list.selected_index() && self.list.selected_is_focused() {
            return;
        }
        self.list.unfocus_selected(bus);
        self.list.set_selected(index);
        self.list.focus_selected(bus);
    }

    fn draw_border(&mut self) {
        let (w, h) = (self.frame.w, self.frame.h);
        if w < 2 || h < 2 {
            return;
        }
        self.surface.hline(1, 0, w - 2);
        self.surface.hline(1, h - 1, w - 2);
        self.surface.vline(0, 1, h - 2);
        self.surface.vline(w - 1, 1, h - 2);
        self.surface.put_symbol(0, 0, line::TOP_LEFT);
        self.surface.put_symbol(w - 1, 0, line::TOP_RIGHT);
        self.surface.put_symbol(0, h - 1, line::BOTTOM_LEFT);
        self.surface.put_symbol(w - 1, h - 1, line::BOTTOM_RIGHT);
        if !self.title.is_empty() {
            let title = format!(" {} ", self.title);
            self.surface.print_centered(0, &title, Style::default());
        }
    }
}

impl Component for RootPanel {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
        self.surface = Surface::new(frame.w, frame.h);
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
                self.list.wrap_selection(by, bus);
                Ok(())
            }
            _ => self.list.forward_to_selected(input, bus),
        }
    }

    fn display(&mut self, screen: &mut Surface) {
        self.surface.clear();
        self.draw_border();
        self.list.display_all(&mut self.surface);
        self.surface.blit_on(screen, self.frame.x, self.frame.y);
    }
}

impl Receiver for RootPanel {
    fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
        if let Event::MenuAction(direction) = event {
            let by = match direction {
                MenuDirection::Next => 1,
                MenuDirection::Previous => -1,
            };
            self.list.wrap_selection(by, bus);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{Button, Container};

    fn button(y: i32, label: &str) -> ComponentRef {
        Rc::new(RefCell::new(Button::new(
            Frame::new(1, y, 8, 1),
            label.to_string(),
            vec![Event::PlayerAction(label.to_string())],
        )))
    }

    fn two_button_root(bus: &Bus) -> Rc<RefCell<RootPanel>> {
        let root = RootPanel::new(Frame::new(0, 0, 10, 6), "Shop").into_ref();
        root.borrow_mut()
            .set_children(vec![button(1, "buy"), button(2, "sell")]);
        root.borrow_mut().enter_focus(bus);
        root
    }

    #[test]
    fn test_selection_wraps_both_ways() {
        let bus = Bus::new();
        let root = two_button_root(&bus);

        root.borrow_mut().receive(&InputSignal::Up, &bus).unwrap();
        assert_eq!(root.borrow().list.selected_index(), 1);

        root.borrow_mut().receive(&InputSignal::Down, &bus).unwrap();
        assert_eq!(root.borrow().list.selected_index(), 0);
        assert!(root.borrow().list.get(0).unwrap().borrow().focused());
    }

    // Routes decoded input through the bus the way an owning state does, so
    // bubbled menu actions drain from the queue after the borrow is gone.
    struct Driver {
        target: Rc<RefCell<RootPanel>>,
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
    fn test_bubble_from_sole_container_comes_back_around() {
        let bus = Bus::new();
        let inner = Container::new(Frame::new(1, 1, 8, 1)).into_ref();
        inner.borrow_mut().set_children(vec![button(1, "only")]);
        let root = RootPanel::new(Frame::new(0, 0, 10, 6), "").into_ref();
        root.borrow_mut().set_children(vec![inner.clone()]);
        root.borrow_mut().enter_focus(&bus);
        assert!(inner.borrow().focused());
        let driver = Rc::new(RefCell::new(Driver {
            target: root.clone(),
        }));
        bus.subscribe(&driver, EventKind::Input);

        // The container runs off its end and gives focus up; the wrap lands
        // on the same container, which re-enters cleanly.
        bus.publish(Event::Input(InputSignal::Down));

        assert!(inner.borrow().focused());
        assert_eq!(bus.subscriber_count(EventKind::MenuAction), 2);
    }

    #[test]
    fn test_border_and_title_render() {
        let bus = Bus::new();
        let root = two_button_root(&bus);
        let mut screen = Surface::new(10, 6);
        root.borrow_mut().display(&mut screen);

        assert_eq!(screen.row_text(0), "┌─ Shop ─┐");
        assert_eq!(screen.row_text(5), "└────────┘");
        assert_eq!(screen.row_text(1), "│buy     │");
    }

    #[test]
    fn test_blits_at_frame_offset() {
        let bus = Bus::new();
        let root = RootPanel::new(Frame::new(3, 2, 4, 3), "").into_ref();
        root.borrow_mut().enter_focus(&bus);
        let mut screen = Surface::new(12, 8);
        root.borrow_mut().display(&mut screen);

        assert_eq!(screen.row_text(2), "   ┌──┐     ");
        assert_eq!(screen.row_text(4), "   └──┘     ");
        assert_eq!(screen.row_text(0), "            ");
    }

    #[test]
    fn test_mouse_moves_focus_to_hovered_child() {
        let bus = Bus::new();
        let root = two_button_root(&bus);

        // Children sit at panel rows 1 and 2; the panel is at the origin so
        // screen coordinates line up.
        let hit = root.borrow().child_at(2, 2);
        assert_eq!(hit, Some(1));
        root.borrow_mut().focus_child(1, &bus);

        assert_eq!(root.borrow().list.selected_index(), 1);
        assert!(root.borrow().list.get(1).unwrap().borrow().focused());
        assert!(!root.borrow().list.get(0).unwrap().borrow().focused());
    }

    #[test]
    fn test_set_children_parks_selection_without_focus() {
        let root = RootPanel::new(Frame::new(0, 0, 10, 6), "").into_ref();
        root.borrow_mut()
            .set_children(vec![button(1, "buy"), button(2, "sell")]);
        assert_eq!(root.borrow().list.selected_index(), 0);
        assert!(!root.borrow().list.get(0).unwrap().borrow().focused());
    }
}
