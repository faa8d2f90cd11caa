// Event bus - typed publish/subscribe dispatch
//
// Every cross-cutting interaction in the framework flows through here: input
// reaches the active state, widgets bubble focus moves, states request pushes
// and pops, and the game drains transitions. Using an enum per event keeps
// payloads pattern-matchable instead of stringly-typed dictionaries.
//
// Dispatch is single-threaded and synchronous. A publish issued from inside a
// receiver is queued and delivered by the outermost publish before it
// returns, so receivers can publish freely without re-entering an object that
// is still on the call stack.

use crate::error::Error;
use crate::focus::Area;
use crate::input::InputSignal;
use crate::state::StateNode;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::Location;
use std::rc::{Rc, Weak};

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Which way menu focus is asked to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuDirection {
    Next,
    Previous,
}

/// What a leave event asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveIntent {
    /// Cancel the current selection, or pop to the parent state.
    Back,
    /// Stop the game loop.
    Quit,
}

/// Every event that can travel on the bus, with its typed payload.
#[derive(Debug, Clone)]
pub enum Event {
    /// A decoded key press.
    Input(InputSignal),
    /// An area was confirmed by a focus.
    AreaSelect(Area),
    /// A domain verb fired by the player, named by the state tree.
    PlayerAction(String),
    /// Menu focus navigation, delivered top-only.
    MenuAction(MenuDirection),
    /// Escape/quit semantics.
    Leave(LeaveIntent),
    /// Push the state described by this tree.
    NewState(Rc<StateNode>),
    /// Pop back to the named ancestor on the stack.
    PreviousState(String),
    /// A menu component changed the model value at `source`.
    ModelChanged { source: String, value: Value },
    /// A line for the player (and the log).
    Feedback(String),
    /// Game-specific payload, opaque to the framework.
    Game(Value),
    /// World-simulation payload, opaque to the framework.
    World(Value),
    /// Mouse cursor position in screen coordinates.
    MouseMove { x: i32, y: i32 },
    /// Mouse button press in screen coordinates.
    MouseClick { x: i32, y: i32 },
}

/// Fieldless tags used as subscription keys, one per `Event` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Input,
    AreaSelect,
    PlayerAction,
    MenuAction,
    Leave,
    NewState,
    PreviousState,
    ModelChanged,
    Feedback,
    Game,
    World,
    MouseMove,
    MouseClick,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        EventKind::Input,
        EventKind::AreaSelect,
        EventKind::PlayerAction,
        EventKind::MenuAction,
        EventKind::Leave,
        EventKind::NewState,
        EventKind::PreviousState,
        EventKind::ModelChanged,
        EventKind::Feedback,
        EventKind::Game,
        EventKind::World,
        EventKind::MouseMove,
        EventKind::MouseClick,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::AreaSelect => "area-select",
            Self::PlayerAction => "player-action",
            Self::MenuAction => "menu-action",
            Self::Leave => "leave",
            Self::NewState => "new-state",
            Self::PreviousState => "previous-state",
            Self::ModelChanged => "model-changed",
            Self::Feedback => "feedback",
            Self::Game => "game",
            Self::World => "world",
            Self::MouseMove => "mouse-move",
            Self::MouseClick => "mouse-click",
        }
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Input(_) => EventKind::Input,
            Self::AreaSelect(_) => EventKind::AreaSelect,
            Self::PlayerAction(_) => EventKind::PlayerAction,
            Self::MenuAction(_) => EventKind::MenuAction,
            Self::Leave(_) => EventKind::Leave,
            Self::NewState(_) => EventKind::NewState,
            Self::PreviousState(_) => EventKind::PreviousState,
            Self::ModelChanged { .. } => EventKind::ModelChanged,
            Self::Feedback(_) => EventKind::Feedback,
            Self::Game(_) => EventKind::Game,
            Self::World(_) => EventKind::World,
            Self::MouseMove { .. } => EventKind::MouseMove,
            Self::MouseClick { .. } => EventKind::MouseClick,
        }
    }

    /// One-line summary used by publish tracing.
    pub fn describe(&self) -> String {
        match self {
            Self::Input(signal) => format!("input {signal:?}"),
            Self::AreaSelect(area) => format!("area-select {}", area.describe()),
            Self::PlayerAction(verb) => format!("player-action {verb:?}"),
            Self::MenuAction(dir) => format!("menu-action {dir:?}"),
            Self::Leave(intent) => format!("leave {intent:?}"),
            Self::NewState(node) => format!("new-state {:?}", node.name),
            Self::PreviousState(target) => format!("previous-state {target:?}"),
            Self::ModelChanged { source, value } => {
                format!("model-changed {source:?} = {value}")
            }
            Self::Feedback(text) => format!("feedback {text:?}"),
            Self::Game(value) => format!("game {value}"),
            Self::World(value) => format!("world {value}"),
            Self::MouseMove { x, y } => format!("mouse-move ({x}, {y})"),
            Self::MouseClick { x, y } => format!("mouse-click ({x}, {y})"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Receivers and subscriptions
// ─────────────────────────────────────────────────────────────────────────────

/// Anything that can be subscribed on the bus.
pub trait Receiver {
    fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error>;
}

/// What happened when one subscriber was offered an event.
enum Deliver {
    Done,
    Failed(Error),
    /// The receiver was dropped without unsubscribing.
    Gone,
    /// The receiver is already borrowed further up the call stack.
    Busy,
}

/// One entry in a kind's subscriber list. The closure erases the concrete
/// receiver type so one list can hold states, containers and mailboxes;
/// `key` is the receiver's address and gives unsubscribe its identity.
struct Subscription {
    key: *const (),
    deliver: Box<dyn Fn(&Event, &Bus) -> Deliver>,
}

impl Subscription {
    fn new<R>(receiver: &Rc<RefCell<R>>) -> Rc<Self>
    where
        R: Receiver + ?Sized + 'static,
    {
        let weak: Weak<RefCell<R>> = Rc::downgrade(receiver);
        Rc::new(Self {
            key: receiver_key(receiver),
            deliver: Box::new(move |event, bus| {
                let Some(cell) = weak.upgrade() else {
                    return Deliver::Gone;
                };
                let Ok(mut receiver) = cell.try_borrow_mut() else {
                    return Deliver::Busy;
                };
                match receiver.on_event(event, bus) {
                    Ok(()) => Deliver::Done,
                    Err(e) => Deliver::Failed(e),
                }
            }),
        })
    }
}

fn receiver_key<R: ?Sized>(receiver: &Rc<RefCell<R>>) -> *const () {
    Rc::as_ptr(receiver) as *const ()
}

// ─────────────────────────────────────────────────────────────────────────────
// Bus
// ─────────────────────────────────────────────────────────────────────────────

/// How events of a kind reach their subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Every subscriber, in subscription order.
    Fanout,
    /// Only the most recently subscribed live receiver. This models modal
    /// menu input: the innermost focused container owns navigation.
    TopOnly,
}

/// Publish tracing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusTrace {
    #[default]
    Off,
    /// Log every publish with a payload summary.
    Events,
    /// Additionally log the source location of the publish call.
    Callers,
}

/// Synchronous in-process publish/subscribe dispatcher.
///
/// The bus never owns receivers: subscriptions hold `Weak` references and
/// callers unsubscribe on teardown. A subscriber found dead during dispatch
/// is pruned and reported as feedback rather than crashing the frame loop.
pub struct Bus {
    subscribers: RefCell<HashMap<EventKind, Vec<Rc<Subscription>>>>,
    delivery: RefCell<HashMap<EventKind, Delivery>>,
    queue: RefCell<VecDeque<(Event, &'static Location<'static>)>>,
    dispatching: Cell<bool>,
    trace: Cell<BusTrace>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        let mut delivery = HashMap::new();
        delivery.insert(EventKind::MenuAction, Delivery::TopOnly);
        Self {
            subscribers: RefCell::new(HashMap::new()),
            delivery: RefCell::new(delivery),
            queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
            trace: Cell::new(BusTrace::Off),
        }
    }

    pub fn set_trace(&self, trace: BusTrace) {
        self.trace.set(trace);
    }

    /// Change how one kind is delivered. `MenuAction` is preset to `TopOnly`,
    /// everything else defaults to `Fanout`.
    pub fn set_delivery(&self, kind: EventKind, delivery: Delivery) {
        self.delivery.borrow_mut().insert(kind, delivery);
    }

    pub fn delivery(&self, kind: EventKind) -> Delivery {
        self.delivery
            .borrow()
            .get(&kind)
            .copied()
            .unwrap_or(Delivery::Fanout)
    }

    /// Append `receiver` to the kind's list. No duplicate check: subscribing
    /// twice means receiving twice.
    pub fn subscribe<R>(&self, receiver: &Rc<RefCell<R>>, kind: EventKind)
    where
        R: Receiver + ?Sized + 'static,
    {
        self.subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Subscription::new(receiver));
    }

    pub fn subscribe_all<R>(&self, receiver: &Rc<RefCell<R>>, kinds: &[EventKind])
    where
        R: Receiver + ?Sized + 'static,
    {
        for &kind in kinds {
            self.subscribe(receiver, kind);
        }
    }

    /// Remove one occurrence of `receiver` from the kind's list. Removing a
    /// receiver that is not subscribed is a reported diagnostic, never fatal:
    /// misordered teardown must not kill the frame loop.
    pub fn unsubscribe<R>(&self, receiver: &Rc<RefCell<R>>, kind: EventKind)
    where
        R: Receiver + ?Sized + 'static,
    {
        let key = receiver_key(receiver);
        let removed = {
            let mut table = self.subscribers.borrow_mut();
            match table.get_mut(&kind) {
                Some(subs) => match subs.iter().position(|s| s.key == key) {
                    Some(idx) => {
                        subs.remove(idx);
                        true
                    }
                    None => false,
                },
                None => false,
            }
        };
        if !removed {
            tracing::warn!(kind = kind.label(), "unsubscribe of a non-subscriber");
            self.feedback(format!(
                "unsubscribe: receiver was not subscribed to {}",
                kind.label()
            ));
        }
    }

    pub fn unsubscribe_all<R>(&self, receiver: &Rc<RefCell<R>>, kinds: &[EventKind])
    where
        R: Receiver + ?Sized + 'static,
    {
        for &kind in kinds {
            self.unsubscribe(receiver, kind);
        }
    }

    /// Publish a feedback line.
    pub fn feedback(&self, text: impl Into<String>) {
        self.publish(Event::Feedback(text.into()));
    }

    /// Publish an event. The outermost publish on the stack drives every
    /// delivery to completion before returning, including events published
    /// by receivers while it runs; a nested publish only enqueues.
    #[track_caller]
    pub fn publish(&self, event: Event) {
        self.queue
            .borrow_mut()
            .push_back((event, Location::caller()));
        if self.dispatching.get() {
            return;
        }
        self.dispatching.set(true);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some((event, location)) = next else {
                break;
            };
            self.trace_publish(&event, location);
            self.dispatch(&event);
        }
        self.dispatching.set(false);
    }

    fn trace_publish(&self, event: &Event, location: &'static Location<'static>) {
        match self.trace.get() {
            BusTrace::Off => {}
            BusTrace::Events => {
                tracing::debug!(target: "delve::events", "{}", event.describe());
            }
            BusTrace::Callers => {
                tracing::debug!(
                    target: "delve::events",
                    "{} (from {}:{})",
                    event.describe(),
                    location.file(),
                    location.line(),
                );
            }
        }
    }

    fn dispatch(&self, event: &Event) {
        let kind = event.kind();
        // Snapshot before iterating: receivers may subscribe or unsubscribe
        // while the event is being delivered, and the running fan-out must
        // not see those changes.
        let snapshot: Vec<Rc<Subscription>> = self
            .subscribers
            .borrow()
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        match self.delivery(kind) {
            Delivery::Fanout => {
                for sub in &snapshot {
                    let outcome = (sub.deliver)(event, self);
                    self.handle_outcome(outcome, kind, sub);
                }
            }
            Delivery::TopOnly => {
                // Walk down from the most recent subscriber until a live one
                // takes the event; stale entries are pruned along the way.
                for sub in snapshot.iter().rev() {
                    let outcome = (sub.deliver)(event, self);
                    let gone = matches!(outcome, Deliver::Gone);
                    self.handle_outcome(outcome, kind, sub);
                    if !gone {
                        break;
                    }
                }
            }
        }
    }

    fn handle_outcome(&self, outcome: Deliver, kind: EventKind, sub: &Rc<Subscription>) {
        match outcome {
            Deliver::Done => {}
            Deliver::Failed(error) => {
                tracing::warn!(kind = kind.label(), %error, "receiver failed");
                self.report(kind, format!("receiver failed on {}: {error}", kind.label()));
            }
            Deliver::Gone => {
                tracing::warn!(kind = kind.label(), "dropping dead subscriber");
                self.prune(kind, sub);
                self.report(
                    kind,
                    format!(
                        "a {} subscriber was dropped without unsubscribing",
                        kind.label()
                    ),
                );
            }
            Deliver::Busy => {
                tracing::warn!(kind = kind.label(), "skipping re-entered receiver");
            }
        }
    }

    /// Failures while delivering feedback itself are logged only, so the
    /// diagnostics cannot feed back into the channel that reports them.
    fn report(&self, kind: EventKind, text: String) {
        if kind != EventKind::Feedback {
            self.feedback(text);
        }
    }

    fn prune(&self, kind: EventKind, dead: &Rc<Subscription>) {
        if let Some(subs) = self.subscribers.borrow_mut().get_mut(&kind) {
            subs.retain(|s| !Rc::ptr_eq(s, dead));
        }
    }

    /// Number of live-or-stale subscriptions for one kind, for diagnostics.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .borrow()
            .get(&kind)
            .map_or(0, |subs| subs.len())
    }
}

impl fmt::Display for Bus {
    /// Who listens to what, one kind per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in EventKind::ALL {
            let count = self.subscriber_count(kind);
            if count > 0 {
                writeln!(f, "{}: {} subscriber(s)", kind.label(), count)?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mailbox
// ─────────────────────────────────────────────────────────────────────────────

/// A receiver that just collects events. The game drains one for state
/// transitions once per frame, outside any dispatch; tests use them to
/// observe publishes.
#[derive(Debug, Default)]
pub struct Mailbox {
    events: VecDeque<Event>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Remove and return everything collected so far.
    pub fn take(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

impl Receiver for Mailbox {
    fn on_event(&mut self, event: &Event, _bus: &Bus) -> Result<(), Error> {
        self.events.push_back(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records which probe saw which events, in order, across all probes.
    struct Probe {
        id: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl Probe {
        fn subscribed(
            id: &'static str,
            log: &Rc<RefCell<Vec<String>>>,
            bus: &Bus,
            kind: EventKind,
        ) -> Rc<RefCell<Probe>> {
            let probe = Rc::new(RefCell::new(Probe {
                id,
                log: Rc::clone(log),
                fail: false,
            }));
            bus.subscribe(&probe, kind);
            probe
        }
    }

    impl Receiver for Probe {
        fn on_event(&mut self, event: &Event, _bus: &Bus) -> Result<(), Error> {
            self.log
                .borrow_mut()
                .push(format!("{}:{}", self.id, event.kind().label()));
            if self.fail {
                return Err(crate::error::StackError::Empty.into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_fanout_delivers_in_subscription_order() {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _r1 = Probe::subscribed("r1", &log, &bus, EventKind::PlayerAction);
        let _r2 = Probe::subscribed("r2", &log, &bus, EventKind::PlayerAction);
        let _r3 = Probe::subscribed("r3", &log, &bus, EventKind::PlayerAction);

        bus.publish(Event::PlayerAction("dig".to_string()));

        assert_eq!(
            *log.borrow(),
            vec!["r1:player-action", "r2:player-action", "r3:player-action"]
        );
    }

    #[test]
    fn test_menu_action_reaches_only_top_subscriber() {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _c1 = Probe::subscribed("c1", &log, &bus, EventKind::MenuAction);
        let _c2 = Probe::subscribed("c2", &log, &bus, EventKind::MenuAction);

        bus.publish(Event::MenuAction(MenuDirection::Next));

        assert_eq!(*log.borrow(), vec!["c2:menu-action"]);
    }

    #[test]
    fn test_unsubscribe_unknown_is_nonfatal_diagnostic() {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _subscribed = Probe::subscribed("ok", &log, &bus, EventKind::Input);
        let stranger: Rc<RefCell<Mailbox>> = Rc::new(RefCell::new(Mailbox::new()));
        let diagnostics = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&diagnostics, EventKind::Feedback);

        bus.unsubscribe(&stranger, EventKind::Input);

        // The diagnostic went out as feedback and delivery still works.
        assert_eq!(diagnostics.borrow().len(), 1);
        bus.publish(Event::Input(InputSignal::Up));
        assert_eq!(*log.borrow(), vec!["ok:input"]);
    }

    #[test]
    fn test_unsubscribe_removes_one_occurrence() {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe = Probe::subscribed("p", &log, &bus, EventKind::Input);
        bus.subscribe(&probe, EventKind::Input);

        bus.publish(Event::Input(InputSignal::Up));
        assert_eq!(log.borrow().len(), 2);

        log.borrow_mut().clear();
        bus.unsubscribe(&probe, EventKind::Input);
        bus.publish(Event::Input(InputSignal::Up));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_nested_publish_completes_before_outer_returns() {
        struct Chainer;
        impl Receiver for Chainer {
            fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
                if matches!(event, Event::Input(_)) {
                    bus.publish(Event::PlayerAction("chained".to_string()));
                }
                Ok(())
            }
        }

        let bus = Bus::new();
        let chainer = Rc::new(RefCell::new(Chainer));
        bus.subscribe(&chainer, EventKind::Input);
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe(&mailbox, EventKind::PlayerAction);

        bus.publish(Event::Input(InputSignal::Enter));

        let events = mailbox.borrow_mut().take();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::PlayerAction(v) if v == "chained"));
    }

    #[test]
    fn test_failed_receiver_does_not_abort_fanout() {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let failing = Probe::subscribed("bad", &log, &bus, EventKind::Input);
        failing.borrow_mut().fail = true;
        let _ok = Probe::subscribed("ok", &log, &bus, EventKind::Input);

        bus.publish(Event::Input(InputSignal::Down));

        assert_eq!(*log.borrow(), vec!["bad:input", "ok:input"]);
    }

    #[test]
    fn test_dead_subscriber_is_pruned_not_fatal() {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let probe = Probe::subscribed("gone", &log, &bus, EventKind::Input);
        drop(probe);

        bus.publish(Event::Input(InputSignal::Up));

        assert!(log.borrow().is_empty());
        assert_eq!(bus.subscriber_count(EventKind::Input), 0);
    }

    #[test]
    fn test_top_only_skips_dead_top_subscriber() {
        let bus = Bus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let _c1 = Probe::subscribed("c1", &log, &bus, EventKind::MenuAction);
        let c2 = Probe::subscribed("c2", &log, &bus, EventKind::MenuAction);
        drop(c2);

        bus.publish(Event::MenuAction(MenuDirection::Previous));

        assert_eq!(*log.borrow(), vec!["c1:menu-action"]);
    }

    #[test]
    fn test_delivery_policy_is_configurable() {
        let bus = Bus::new();
        bus.set_delivery(EventKind::PlayerAction, Delivery::TopOnly);
        let log = Rc::new(RefCell::new(Vec::new()));
        let _r1 = Probe::subscribed("r1", &log, &bus, EventKind::PlayerAction);
        let _r2 = Probe::subscribed("r2", &log, &bus, EventKind::PlayerAction);

        bus.publish(Event::PlayerAction("sing".to_string()));

        assert_eq!(*log.borrow(), vec!["r2:player-action"]);
    }

    #[test]
    fn test_mailbox_collects_and_drains() {
        let bus = Bus::new();
        let mailbox = Rc::new(RefCell::new(Mailbox::new()));
        bus.subscribe_all(&mailbox, &[EventKind::NewState, EventKind::PreviousState]);

        bus.publish(Event::PreviousState("main".to_string()));
        assert_eq!(mailbox.borrow().len(), 1);

        let drained = mailbox.borrow_mut().take();
        assert!(matches!(&drained[0], Event::PreviousState(t) if t == "main"));
        assert!(mailbox.borrow().is_empty());
    }
}
