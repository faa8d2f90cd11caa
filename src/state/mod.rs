// Game states - parsed state trees and the state contract
//
// States are declared as serde_json trees: a `name`, an optional `action`
// verb, `actions` binding input keys to child state trees, an optional
// `submenu` of secondary picks, and for menu-shaped states a `menu` tree
// plus its starting `data`. The stack in `Game` drives states through
// activate/deactivate/clean; events reach them through the bus while they
// are subscribed.

pub mod menu;
pub mod world;

pub use menu::MenuState;
pub use world::{CommandSink, WorldState};

use crate::error::{BuildError, Error};
use crate::events::{Bus, EventKind, Receiver};
use crate::surface::Surface;
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One parsed node of a state tree.
#[derive(Debug)]
pub struct StateNode {
    pub name: String,
    action: Option<String>,
    actions: BTreeMap<String, Rc<StateNode>>,
    submenu: BTreeMap<String, String>,
    menu: Option<Value>,
    data: Value,
    pauses_game: bool,
}

impl StateNode {
    pub fn parse(tree: &Value) -> Result<Self, Error> {
        let name = tree
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| BuildError::StateWithoutName(tree.to_string()))?
            .to_string();
        let action = tree
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut actions = BTreeMap::new();
        if let Some(map) = tree.get("actions").and_then(Value::as_object) {
            for (key, subtree) in map {
                actions.insert(key.clone(), Rc::new(StateNode::parse(subtree)?));
            }
        }
        let mut submenu = BTreeMap::new();
        if let Some(map) = tree.get("submenu").and_then(Value::as_object) {
            for (key, object) in map {
                if let Some(object) = object.as_str() {
                    submenu.insert(key.clone(), object.to_string());
                }
            }
        }
        Ok(Self {
            name,
            action,
            actions,
            submenu,
            menu: tree.get("menu").cloned(),
            data: tree.get("data").cloned().unwrap_or_else(|| Value::Object(Default::default())),
            pauses_game: tree
                .get("pauses_game")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        })
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Child state bound to an input key, if any.
    pub fn child(&self, key: &str) -> Option<&Rc<StateNode>> {
        self.actions.get(key)
    }

    /// The input keys this state binds, in order. Help menus list these.
    pub fn action_keys(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    pub fn submenu(&self) -> &BTreeMap<String, String> {
        &self.submenu
    }

    /// Menu-shaped states carry a menu tree and become `MenuState`s.
    pub fn menu(&self) -> Option<&Value> {
        self.menu.as_ref()
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn pauses_game(&self) -> bool {
        self.pauses_game
    }
}

/// The contract a stacked state fulfills. Event delivery goes through the
/// bus: `Game` subscribes the top state on the kinds it names and
/// unsubscribes it when it stops being top.
pub trait State: Receiver {
    fn name(&self) -> &str;

    /// Event kinds the state listens on while it is the active top.
    fn kinds(&self) -> &'static [EventKind];

    /// Whether the world simulation holds still under this state.
    fn pauses_game(&self) -> bool;

    /// The state to fall back to on escape. Set by `Game` when pushed onto
    /// a previous top; the bottom state has none.
    fn set_parent(&mut self, parent: &str);

    fn activate(&mut self, bus: &Bus);

    fn deactivate(&mut self, bus: &Bus);

    /// One-shot teardown when the state is discarded from the stack.
    fn clean(&mut self);

    /// Cursor blink phase, pushed down by the frame loop.
    fn blink(&mut self, _on: bool) {}

    /// Navigational states expose their viewport so the frame loop can
    /// render the world layer under them.
    fn viewport(&self) -> Option<&crate::viewport::Viewport> {
        None
    }

    fn display(&mut self, screen: &mut Surface);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reads_bindings() {
        let node = StateNode::parse(&json!({
            "name": "mine",
            "action": "dig",
            "actions": {"b": {"name": "build", "action": "build"}},
            "submenu": {"w": "wall", "d": "door"},
        }))
        .unwrap();

        assert_eq!(node.name, "mine");
        assert_eq!(node.action(), Some("dig"));
        assert_eq!(node.child("b").unwrap().name, "build");
        assert_eq!(node.action_keys(), vec!["b"]);
        assert_eq!(node.submenu().get("w").map(String::as_str), Some("wall"));
        assert!(node.pauses_game());
    }

    #[test]
    fn test_parse_without_name_is_named_error() {
        let err = StateNode::parse(&json!({"action": "dig"})).unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::StateWithoutName(_))
        ));
    }

    #[test]
    fn test_parse_rejects_nameless_child() {
        let err = StateNode::parse(&json!({
            "name": "mine",
            "actions": {"b": {"action": "build"}},
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::StateWithoutName(_))
        ));
    }

    #[test]
    fn test_parse_keeps_menu_and_data() {
        let node = StateNode::parse(&json!({
            "name": "options",
            "pauses_game": false,
            "menu": {"title": "Options", "children": []},
            "data": {"volume": 3},
        }))
        .unwrap();

        assert!(node.menu().is_some());
        assert_eq!(node.data()["volume"], 3);
        assert!(!node.pauses_game());
    }
}
