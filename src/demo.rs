// Demo: a small mining camp driving every framework subsystem
//
// The world is a deterministic cave grid with a few patrolling miners, so
// the showcase behaves the same on every run. The camp state binds keys to
// dig/build/inspect tools (point, block and flood selection), menus for
// options and stores, and canned dialogs for help and quitting.
//
// Run with: delve-demo

use crate::config::Config;
use crate::error::Error;
use crate::events::{Bus, Event, EventKind, LeaveIntent, Receiver};
use crate::focus::{Area, TilePos};
use crate::game::{Game, GameHooks};
use crate::geometry::Frame;
use crate::input::InputSignal;
use crate::state::{CommandSink, State, StateNode, WorldState};
use crate::surface::Surface;
use crate::ui::{question_box, text_box, BuildContext, Component, RootPanel};
use crate::viewport::Viewport;
use ratatui::style::Color;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

const WORLD_W: i32 = 96;
const WORLD_H: i32 = 40;

/// Cap on flood selection growth so picking a huge cavern cannot stall a
/// frame.
const FLOOD_LIMIT: usize = 400;

const HELP_TEXT: &str = "Arrows move the cursor; the camera follows. \
Enter anchors a selection, Enter again applies the current tool to it. \
Escape backs out of tools and menus.\n\n\
d dig out rock, b stamp a 3x3 building, x inspect a cavity, \
o options, s stores, h this text, q quit.";

// ─────────────────────────────────────────────────────────────────────────────
// World
// ─────────────────────────────────────────────────────────────────────────────

struct Miner {
    x: i32,
    y: i32,
    dx: i32,
}

/// The cave grid. Tiles are plain chars: '#' rock, '.' floor, '*' ore,
/// '~' water, '+' door.
pub struct DemoWorld {
    tiles: Vec<Vec<char>>,
    miners: Vec<Miner>,
    ticks: u64,
    ore_mined: u32,
}

fn passable(tile: char) -> bool {
    tile != '#'
}

/// Deterministic terrain: a rock rim, an open camp clearing, and mixed
/// cave beyond it.
fn seed_tile(x: i32, y: i32) -> char {
    if x == 0 || y == 0 || x == WORLD_W - 1 || y == WORLD_H - 1 {
        return '#';
    }
    if (8..24).contains(&x) && (6..14).contains(&y) {
        return '.';
    }
    match (x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17))) % 23 {
        0 => '*',
        1 | 2 => '#',
        3 => '~',
        _ => '.',
    }
}

fn tile_color(tile: char) -> Color {
    match tile {
        '#' => Color::Gray,
        '*' => Color::Yellow,
        '~' => Color::Blue,
        '+' => Color::White,
        _ => Color::DarkGray,
    }
}

impl DemoWorld {
    pub fn new() -> Self {
        let tiles = (0..WORLD_H)
            .map(|y| (0..WORLD_W).map(|x| seed_tile(x, y)).collect())
            .collect();
        let miners = vec![
            Miner { x: 10, y: 8, dx: 1 },
            Miner { x: 14, y: 10, dx: 1 },
            Miner { x: 20, y: 12, dx: -1 },
        ];
        Self {
            tiles,
            miners,
            ticks: 0,
            ore_mined: 0,
        }
    }

    pub fn size(&self) -> (i32, i32) {
        (WORLD_W, WORLD_H)
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<char> {
        if x < 0 || y < 0 || x >= WORLD_W || y >= WORLD_H {
            return None;
        }
        Some(self.tiles[y as usize][x as usize])
    }

    pub fn set_tile(&mut self, x: i32, y: i32, tile: char) {
        if x >= 0 && y >= 0 && x < WORLD_W && y < WORLD_H {
            self.tiles[y as usize][x as usize] = tile;
        }
    }

    pub fn ore_mined(&self) -> u32 {
        self.ore_mined
    }

    /// Open a rock tile. False when there is nothing to dig.
    pub fn dig(&mut self, x: i32, y: i32) -> bool {
        match self.tile(x, y) {
            Some('#') | Some('*') => {
                self.set_tile(x, y, '.');
                true
            }
            _ => false,
        }
    }

    /// Place a structure tile on open floor. False when the spot is taken.
    pub fn build(&mut self, x: i32, y: i32, tile: char) -> bool {
        match self.tile(x, y) {
            Some('.') => {
                self.set_tile(x, y, tile);
                true
            }
            _ => false,
        }
    }

    pub fn describe(&self, x: i32, y: i32) -> &'static str {
        match self.tile(x, y) {
            Some('#') => "solid rock",
            Some('*') => "an ore vein",
            Some('~') => "standing water",
            Some('+') => "a door",
            Some('.') => "open floor",
            _ => "the void",
        }
    }

    /// The connected walkable pocket around `from`, four-neighbour,
    /// capped at `FLOOD_LIMIT` tiles.
    pub fn flood_floor(&self, from: TilePos) -> Vec<TilePos> {
        match self.tile(from.x, from.y) {
            Some(tile) if passable(tile) => {}
            _ => return Vec::new(),
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        let mut tiles = Vec::new();
        seen.insert((from.x, from.y));
        queue.push_back((from.x, from.y));
        while let Some((x, y)) = queue.pop_front() {
            tiles.push(TilePos::new(x, y, from.z));
            if tiles.len() >= FLOOD_LIMIT {
                break;
            }
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (nx, ny) = (x + dx, y + dy);
                if seen.contains(&(nx, ny)) {
                    continue;
                }
                if matches!(self.tile(nx, ny), Some(tile) if passable(tile)) {
                    seen.insert((nx, ny));
                    queue.push_back((nx, ny));
                }
            }
        }
        tiles
    }

    /// Advance the simulation one frame: every other frame the miners step,
    /// bounce off rock, and haul any ore they walk over.
    pub fn tick(&mut self, bus: &Bus) {
        self.ticks += 1;
        if self.ticks % 2 == 0 {
            return;
        }
        for miner in &mut self.miners {
            let next = miner.x + miner.dx;
            match self.tiles[miner.y as usize].get(next as usize) {
                Some(tile) if passable(*tile) => miner.x = next,
                _ => miner.dx = -miner.dx,
            }
            if self.tiles[miner.y as usize][miner.x as usize] == '*' {
                self.tiles[miner.y as usize][miner.x as usize] = '.';
                self.ore_mined += 1;
                bus.feedback(format!("a miner struck ore ({} hauled)", self.ore_mined));
            }
        }
    }

    /// Draw the tiles visible through the viewport, or the whole grid from
    /// the origin when there is none.
    pub fn draw(&self, surface: &mut Surface, viewport: Option<&Viewport>) {
        match viewport {
            Some(vp) => {
                let frame = vp.frame;
                for wy in frame.y..frame.bottom() {
                    for wx in frame.x..frame.right() {
                        if let (Some(tile), Some((lx, ly))) =
                            (self.tile(wx, wy), vp.to_local(wx, wy))
                        {
                            surface.put_glyph(lx, ly, tile, tile_color(tile));
                        }
                    }
                }
                for miner in &self.miners {
                    if let Some((lx, ly)) = vp.to_local(miner.x, miner.y) {
                        surface.put_glyph(lx, ly, 'm', Color::LightYellow);
                    }
                }
            }
            None => {
                for y in 0..WORLD_H {
                    for x in 0..WORLD_W {
                        if let Some(tile) = self.tile(x, y) {
                            surface.put_glyph(x, y, tile, tile_color(tile));
                        }
                    }
                }
            }
        }
    }
}

impl Default for DemoWorld {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command sink
// ─────────────────────────────────────────────────────────────────────────────

/// Applies confirmed world commands to the shared grid and reports back
/// through the feedback line.
struct DemoSink {
    world: Rc<RefCell<DemoWorld>>,
}

impl CommandSink for DemoSink {
    fn command(&mut self, verb: &str, object: Option<&str>, area: &Area, bus: &Bus) {
        let tiles = area.tiles();
        let mut world = self.world.borrow_mut();
        match verb {
            "dig" => {
                let dug = tiles
                    .iter()
                    .filter(|tile| world.dig(tile.x, tile.y))
                    .count();
                bus.feedback(format!("dug {dug} of {} tiles", tiles.len()));
            }
            "build" => {
                let glyph = match object {
                    Some("door") => '+',
                    _ => '#',
                };
                let built = tiles
                    .iter()
                    .filter(|tile| world.build(tile.x, tile.y, glyph))
                    .count();
                bus.feedback(format!(
                    "built {built} {} tiles",
                    object.unwrap_or("wall")
                ));
            }
            "inspect" => {
                if let [tile] = tiles.as_slice() {
                    let what = world.describe(tile.x, tile.y);
                    bus.feedback(format!("({}, {}): {what}", tile.x, tile.y));
                } else {
                    let ore = tiles
                        .iter()
                        .filter(|tile| world.tile(tile.x, tile.y) == Some('*'))
                        .count();
                    bus.feedback(format!("{} tiles, {ore} ore veins", tiles.len()));
                }
            }
            other => bus.feedback(format!("nothing happens ({other})")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dialog state
// ─────────────────────────────────────────────────────────────────────────────

/// A modal panel built from one of the canned dialogs. Buttons carry their
/// own leave events, so the state only routes input at the panel.
struct DialogState {
    name: String,
    root: Rc<RefCell<RootPanel>>,
}

impl DialogState {
    fn new(name: &str, root: Rc<RefCell<RootPanel>>) -> Self {
        Self {
            name: name.to_string(),
            root,
        }
    }
}

impl Receiver for DialogState {
    fn on_event(&mut self, event: &Event, bus: &Bus) -> Result<(), Error> {
        match event {
            Event::Input(InputSignal::Escape) => {
                bus.publish(Event::Leave(LeaveIntent::Back));
                Ok(())
            }
            Event::Input(signal) => self.root.borrow_mut().receive(signal, bus),
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

impl State for DialogState {
    fn name(&self) -> &str {
        &self.name
    }

    fn kinds(&self) -> &'static [EventKind] {
        &[
            EventKind::Input,
            EventKind::MouseMove,
            EventKind::MouseClick,
        ]
    }

    fn pauses_game(&self) -> bool {
        true
    }

    fn set_parent(&mut self, _parent: &str) {}

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

// ─────────────────────────────────────────────────────────────────────────────
// Hooks
// ─────────────────────────────────────────────────────────────────────────────

pub struct DemoHooks {
    world: Rc<RefCell<DemoWorld>>,
    dead_zone: Option<(i32, i32)>,
}

impl DemoHooks {
    pub fn new(world: Rc<RefCell<DemoWorld>>, dead_zone: Option<(i32, i32)>) -> Self {
        Self { world, dead_zone }
    }

    /// The camera window: the whole screen minus the feedback line.
    fn viewport(&self, size: (i32, i32)) -> Viewport {
        let (world_w, world_h) = self.world.borrow().size();
        let frame = Frame::new(0, 0, size.0, (size.1 - 1).max(1));
        let world = Frame::new(0, 0, world_w, world_h);
        match self.dead_zone {
            Some(dead_zone) => Viewport::with_dead_zone(frame, world, dead_zone),
            None => Viewport::new(frame, world),
        }
    }

    fn world_state(&self, node: Rc<StateNode>, size: (i32, i32)) -> Rc<RefCell<dyn State>> {
        let sink = Box::new(DemoSink {
            world: self.world.clone(),
        });
        let mut state = WorldState::new(node.clone(), self.viewport(size), sink);
        match node.name.as_str() {
            // Buildings stamp as a shimmering 3x3 block.
            "build" => state.focus_mut().set_block(vec!['#', '+'], 3, 3),
            // Inspection picks the whole connected cavity.
            "inspect" => {
                let world = self.world.clone();
                state
                    .focus_mut()
                    .set_flood('?', Box::new(move |from| world.borrow().flood_floor(from)));
            }
            _ => {}
        }
        Rc::new(RefCell::new(state))
    }
}

impl GameHooks for DemoHooks {
    fn build_state(
        &mut self,
        node: Rc<StateNode>,
        size: (i32, i32),
    ) -> Result<Rc<RefCell<dyn State>>, Error> {
        let empty = Value::Null;
        let ctx = BuildContext::new(size.0, size.1, &empty);
        let state: Rc<RefCell<dyn State>> = match node.name.as_str() {
            "help" => Rc::new(RefCell::new(DialogState::new(
                "help",
                text_box(&ctx, "Help", HELP_TEXT),
            ))),
            "quit" => Rc::new(RefCell::new(DialogState::new(
                "quit",
                question_box(
                    &ctx,
                    "Quit",
                    "Leave the caves?",
                    vec![Event::Leave(LeaveIntent::Quit)],
                ),
            ))),
            _ => self.world_state(node, size),
        };
        Ok(state)
    }

    fn world_tick(&mut self, bus: &Bus) {
        self.world.borrow_mut().tick(bus);
    }

    fn render_world(&mut self, screen: &mut Surface, viewport: Option<&Viewport>) {
        self.world.borrow().draw(screen, viewport);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// State trees
// ─────────────────────────────────────────────────────────────────────────────

/// The root camp state and its key bindings. The world keeps running under
/// it and under the tools; menus pause it.
pub fn camp_tree() -> Value {
    json!({
        "name": "camp",
        "pauses_game": false,
        "actions": {
            "d": {"name": "dig", "action": "dig", "pauses_game": false},
            "b": {
                "name": "build",
                "action": "build",
                "pauses_game": false,
                "submenu": {"d": "door", "w": "wall"},
            },
            "x": {"name": "inspect", "action": "inspect", "pauses_game": false},
            "o": options_tree(),
            "s": stores_tree(),
            "h": {"name": "help"},
            "q": {"name": "quit"},
        },
    })
}

fn options_tree() -> Value {
    json!({
        "name": "options",
        "data": {"options": {
            "lanterns": true,
            "sounds": false,
            "nickname": "overseer",
            "volume": {"minimum": 0, "maximum": 10, "step": 1, "current": 6},
            "brightness": {"minimum": 0, "maximum": 8, "step": 2, "current": 4},
        }},
        "menu": {
            "title": "Options",
            "template": "centered 20",
            "children": [
                {"type": "Checkbox", "label": "lanterns", "source": "options.lanterns"},
                {"type": "Checkbox", "label": "sounds", "source": "options.sounds"},
                {"type": "Line"},
                {"type": "NumberPicker", "source": "options.volume"},
                {"type": "Ruler", "source": "options.brightness"},
                {"type": "Line"},
                {"type": "Input", "source": "options.nickname"},
                {"type": "DynamicText", "source": "options.nickname", "centered": true},
                {"type": "Line"},
                {"type": "Rows", "children": [
                    {"type": "Button", "label": "Done", "event_type": "Back"},
                    {"type": "Button", "label": "Quit", "event_type": "Quit"},
                ]},
            ],
        },
    })
}

fn stores_tree() -> Value {
    json!({
        "name": "stores",
        "data": {
            "stores": [
                {"label": "pickaxes", "selected": true},
                {"label": "lanterns", "selected": false},
                {"label": "rations", "selected": true},
                {"label": "rope", "selected": false},
            ],
            "crew": [{"ready": true}, {"ready": false}, {"ready": true}],
        },
        "menu": {
            "title": "Stores",
            "template": "centered 20",
            "children": [
                {"type": "Text", "content": "Expedition supplies", "centered": true},
                {"type": "Line"},
                {"type": "List", "source": "stores", "h": 4},
                {"type": "Line"},
                {"type": "Foreach", "source": "crew", "do": [
                    {"type": "Checkbox", "label": "miner ready", "source_builder": "crew.#.ready"},
                ]},
                {"type": "Line"},
                {"type": "Button", "label": "Done", "event_type": "Back"},
            ],
        },
    })
}

/// Build the world, wire the hooks and hand control to the frame loop.
pub fn run(config: Config) -> Result<(), Error> {
    let world = Rc::new(RefCell::new(DemoWorld::new()));
    let hooks = DemoHooks::new(world, config.dead_zone);
    let mut game = Game::new(hooks, config);
    game.run(&camp_tree())
}
