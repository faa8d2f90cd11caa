// Game orchestrator - stack, frame loop, client hooks
//
// The game owns the bus, the state stack and the terminal. State changes
// never happen mid-dispatch: transition events collect in a mailbox and are
// drained once per frame, so the stack only mutates between dispatches.
// Menu-shaped trees become MenuStates here; everything else goes through
// the client's hooks.

use crate::config::Config;
use crate::error::{Error, StackError};
use crate::events::{Bus, Event, EventKind, LeaveIntent, Mailbox};
use crate::input::InputPoller;
use crate::logging::Informer;
use crate::state::{MenuState, State, StateNode};
use crate::surface::{Screen, Surface};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// What the framework cannot know about the client's game: how to build
/// non-menu states, how the world advances, and what the world looks like.
pub trait GameHooks {
    /// Build a state for a tree that is not menu-shaped. `size` is the
    /// screen in cells.
    fn build_state(
        &mut self,
        node: Rc<StateNode>,
        size: (i32, i32),
    ) -> Result<Rc<RefCell<dyn State>>, Error>;

    /// Advance the world simulation one frame.
    fn world_tick(&mut self, bus: &Bus);

    /// Draw the world layer. `viewport` is the top state's camera when it
    /// has one.
    fn render_world(&mut self, screen: &mut Surface, viewport: Option<&crate::viewport::Viewport>);
}

pub struct Game<H: GameHooks> {
    bus: Bus,
    hooks: H,
    config: Config,
    stack: Vec<Rc<RefCell<dyn State>>>,
    transitions: Rc<RefCell<Mailbox>>,
    informer: Rc<RefCell<Informer>>,
    poller: InputPoller,
    size: (i32, i32),
    running: bool,
    blink_on: bool,
    last_blink: Instant,
}

impl<H: GameHooks> Game<H> {
    pub fn new(hooks: H, config: Config) -> Self {
        let bus = Bus::new();
        bus.set_trace(config.trace);
        let transitions = Rc::new(RefCell::new(Mailbox::new()));
        for kind in [
            EventKind::NewState,
            EventKind::PreviousState,
            EventKind::Leave,
        ] {
            bus.subscribe(&transitions, kind);
        }
        let informer = Rc::new(RefCell::new(Informer::new()));
        bus.subscribe(&informer, EventKind::Feedback);
        Self {
            bus,
            hooks,
            config,
            stack: Vec::new(),
            transitions,
            informer,
            poller: InputPoller::new(),
            size: (80, 24),
            running: false,
            blink_on: true,
            last_blink: Instant::now(),
        }
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn top_name(&self) -> Option<String> {
        self.stack.last().map(|state| state.borrow().name().to_string())
    }

    pub fn set_screen_size(&mut self, width: i32, height: i32) {
        self.size = (width, height);
    }

    /// Parse a state tree and push it. The usual route is a `NewState`
    /// event; this is the direct entry for the initial state.
    pub fn push(&mut self, tree: &Value) -> Result<(), Error> {
        let node = Rc::new(StateNode::parse(tree)?);
        self.change_state(node)
    }

    /// Enter the terminal, run the frame loop on `initial`, restore.
    pub fn run(&mut self, initial: &Value) -> Result<(), Error> {
        let mut screen = Screen::new()?;
        let outcome = self.main_loop(&mut screen, initial);
        let restored = screen.restore();
        outcome?;
        restored?;
        Ok(())
    }

    fn main_loop(&mut self, screen: &mut Screen, initial: &Value) -> Result<(), Error> {
        let (w, h) = screen.size()?;
        self.size = (w, h);
        let mut surface = Surface::new(w, h);
        self.push(initial)?;
        self.running = true;
        while self.running {
            self.poller
                .poll(&self.bus, Duration::from_millis(self.config.tick_ms))?;
            self.step(&mut surface)?;
            screen.flush(&surface)?;
        }
        Ok(())
    }

    /// One headless frame: drain transitions, tick the world, render. The
    /// loop wraps this with input polling and the flush to the terminal.
    pub fn step(&mut self, surface: &mut Surface) -> Result<(), Error> {
        self.drain_transitions()?;
        if self.stack.is_empty() {
            self.running = false;
            return Ok(());
        }
        let paused = self
            .stack
            .last()
            .map(|state| state.borrow().pauses_game())
            .unwrap_or(true);
        if !paused {
            self.hooks.world_tick(&self.bus);
        }
        self.update_blink();
        self.render(surface);
        Ok(())
    }

    /// Apply the frame's collected stack transitions. A missing pop target
    /// means the stack is corrupt; that error is fatal.
    fn drain_transitions(&mut self) -> Result<(), Error> {
        let events = self.transitions.borrow_mut().take();
        for event in events {
            match event {
                Event::NewState(node) => self.change_state(node)?,
                Event::PreviousState(target) => self.pop_to(&target)?,
                Event::Leave(LeaveIntent::Back) => self.pop_back()?,
                Event::Leave(LeaveIntent::Quit) => {
                    tracing::info!("quit requested");
                    self.running = false;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn build_state(&mut self, node: Rc<StateNode>) -> Result<Rc<RefCell<dyn State>>, Error> {
        if node.menu().is_some() {
            let menu = MenuState::new(node, self.size.0, self.size.1)?;
            Ok(Rc::new(RefCell::new(menu)))
        } else {
            self.hooks.build_state(node, self.size)
        }
    }

    fn change_state(&mut self, node: Rc<StateNode>) -> Result<(), Error> {
        let state = self.build_state(node)?;
        if let Some(top) = self.stack.last() {
            let parent = top.borrow().name().to_string();
            self.unsubscribe_state(top);
            top.borrow_mut().deactivate(&self.bus);
            state.borrow_mut().set_parent(&parent);
        }
        tracing::info!(state = state.borrow().name(), depth = self.stack.len() + 1, "push");
        self.stack.push(state);
        if let Some(top) = self.stack.last() {
            self.subscribe_state(top);
            top.borrow_mut().activate(&self.bus);
        }
        Ok(())
    }

    /// Pop back to a named ancestor. Every state strictly above it gets
    /// exactly one `clean`, then the ancestor re-activates.
    fn pop_to(&mut self, target: &str) -> Result<(), Error> {
        let index = self
            .stack
            .iter()
            .position(|state| state.borrow().name() == target)
            .ok_or_else(|| StackError::TargetNotFound {
                target: target.to_string(),
            })?;
        if let Some(top) = self.stack.last() {
            self.unsubscribe_state(top);
            top.borrow_mut().deactivate(&self.bus);
        }
        for state in self.stack.drain(index + 1..) {
            state.borrow_mut().clean();
        }
        tracing::info!(state = target, depth = self.stack.len(), "pop");
        if let Some(top) = self.stack.last() {
            self.subscribe_state(top);
            top.borrow_mut().activate(&self.bus);
        }
        Ok(())
    }

    /// `Leave(Back)`: close the top state. The bottom state stays.
    fn pop_back(&mut self) -> Result<(), Error> {
        if self.stack.len() < 2 {
            return Ok(());
        }
        let target = self.stack[self.stack.len() - 2].borrow().name().to_string();
        self.pop_to(&target)
    }

    fn subscribe_state(&self, state: &Rc<RefCell<dyn State>>) {
        let kinds = state.borrow().kinds();
        for kind in kinds {
            self.bus.subscribe(state, *kind);
        }
    }

    fn unsubscribe_state(&self, state: &Rc<RefCell<dyn State>>) {
        let kinds = state.borrow().kinds();
        for kind in kinds {
            self.bus.unsubscribe(state, *kind);
        }
    }

    fn update_blink(&mut self) {
        if self.last_blink.elapsed() >= Duration::from_millis(self.config.blink_ms) {
            self.blink_on = !self.blink_on;
            self.last_blink = Instant::now();
        }
    }

    fn render(&mut self, surface: &mut Surface) {
        surface.clear();
        if let Some(top) = self.stack.last() {
            let held = top.borrow();
            self.hooks.render_world(surface, held.viewport());
            drop(held);
            top.borrow_mut().blink(self.blink_on);
            top.borrow_mut().display(surface);
        }
        self.informer.borrow().render_line(surface);
    }
}
