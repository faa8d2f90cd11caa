// delve - a console/roguelike game UI framework
//
// The framework is five tightly coupled pieces: a typed publish/subscribe
// event bus, a stack of game and menu states, a focus/selection model over a
// scrollable viewport, a data-bound widget tree, and the frame loop that
// drives them. Rendering goes through a narrow Surface contract over
// ratatui; input arrives as decoded crossterm signals.
//
// Clients describe states and menus as serde_json trees, implement
// `GameHooks` for their world, and hand control to `Game::run`. The demo
// module is a complete small client.

pub mod cli;
pub mod config;
pub mod data;
pub mod demo;
pub mod error;
pub mod events;
pub mod focus;
pub mod game;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod state;
pub mod surface;
pub mod ui;
pub mod viewport;

pub use config::Config;
pub use error::Error;
pub use events::{Bus, Event, EventKind, Receiver};
pub use focus::{Area, Focus, Selection, TilePos};
pub use game::{Game, GameHooks};
pub use geometry::Frame;
pub use input::InputSignal;
pub use state::{MenuState, State, StateNode, WorldState};
pub use surface::Surface;
pub use viewport::Viewport;
