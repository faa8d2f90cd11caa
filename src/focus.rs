// Focus and selection - picking tiles and areas in the world view
//
// The focus is the player's cursor over the world grid. It is always in one
// of two phases: idle (just a cursor) or selecting (an active area that grows
// or moves with the cursor). Confirming a selection publishes exactly one
// area-select event and returns to idle; cancelling discards silently.
//
// Three selection modes cover the roguelike interactions: a point cursor that
// rubber-bands a rectangle, a fixed-size block that travels with the cursor
// (for stamping rooms), and a flood mode that delegates to an injected
// flood-fill callback (for picking whole cavities).

use crate::events::{Bus, Event};
use crate::input::InputSignal;
use crate::viewport::Viewport;

/// One tile in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// An axis-aligned selection rectangle on one z level, inclusive on both
/// ends. `initial_*` remember the anchor corner so extending past it flips
/// the rectangle instead of inverting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    initial_x: i32,
    initial_y: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Selection {
    /// A 1x1 selection anchored at `pos`.
    pub fn anchored(pos: TilePos) -> Self {
        Self {
            initial_x: pos.x,
            initial_y: pos.y,
            x: pos.x,
            y: pos.y,
            z: pos.z,
            x2: pos.x,
            y2: pos.y,
        }
    }

    /// A fixed `w` x `h` selection whose top-left corner is `pos`.
    pub fn block(pos: TilePos, w: i32, h: i32) -> Self {
        let w = w.max(1);
        let h = h.max(1);
        Self {
            initial_x: pos.x,
            initial_y: pos.y,
            x: pos.x,
            y: pos.y,
            z: pos.z,
            x2: pos.x + w - 1,
            y2: pos.y + h - 1,
        }
    }

    /// Grow or shrink so the rectangle spans the anchor and `(nx, ny)`,
    /// normalized so `x <= x2` and `y <= y2` whichever side of the anchor
    /// the point is on.
    pub fn extends_to(&mut self, nx: i32, ny: i32) {
        self.x = self.initial_x.min(nx);
        self.x2 = self.initial_x.max(nx);
        self.y = self.initial_y.min(ny);
        self.y2 = self.initial_y.max(ny);
    }

    /// Move rigidly so the top-left corner lands on `(nx, ny)`, preserving
    /// width and height.
    pub fn translate_to(&mut self, nx: i32, ny: i32) {
        let w = self.x2 - self.x;
        let h = self.y2 - self.y;
        self.initial_x = nx;
        self.initial_y = ny;
        self.x = nx;
        self.y = ny;
        self.x2 = nx + w;
        self.y2 = ny + h;
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x + 1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y + 1
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.x2 && y >= self.y && y <= self.y2
    }

    /// Every covered tile, row-major: y outer, x inner, both inclusive.
    pub fn tiles(&self) -> Vec<TilePos> {
        let mut tiles = Vec::with_capacity((self.width() * self.height()).max(0) as usize);
        for y in self.y..=self.y2 {
            for x in self.x..=self.x2 {
                tiles.push(TilePos::new(x, y, self.z));
            }
        }
        tiles
    }
}

/// The payload of an area-select event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Area {
    /// A confirmed rectangle (point or block mode).
    Rect(Selection),
    /// An arbitrary tile set (flood mode).
    Tiles(Vec<TilePos>),
}

impl Area {
    pub fn tiles(&self) -> Vec<TilePos> {
        match self {
            Self::Rect(selection) => selection.tiles(),
            Self::Tiles(tiles) => tiles.clone(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Rect(s) => format!("rect ({},{})-({},{}) z{}", s.x, s.y, s.x2, s.y2, s.z),
            Self::Tiles(tiles) => format!("{} tiles", tiles.len()),
        }
    }
}

/// Flood-fill callback: the world knows which tiles connect, the focus does
/// not.
pub type FloodFn = Box<dyn Fn(TilePos) -> Vec<TilePos>>;

enum Mode {
    Point,
    Block { w: i32, h: i32 },
    Flood(FloodFn),
}

pub struct Focus {
    cursor: TilePos,
    glyphs: Vec<char>,
    glyph_index: usize,
    mode: Mode,
    active: Option<Area>,
}

impl Focus {
    pub fn new(cursor: TilePos) -> Self {
        Self {
            cursor,
            glyphs: vec!['X'],
            glyph_index: 0,
            mode: Mode::Point,
            active: None,
        }
    }

    pub fn cursor(&self) -> TilePos {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: TilePos) {
        self.cursor = cursor;
    }

    /// The glyph to draw at the cursor this frame.
    pub fn glyph(&self) -> char {
        self.glyphs[self.glyph_index]
    }

    /// Advance to the next display glyph and return it. Called once per
    /// blink interval so block cursors shimmer.
    pub fn glyph_cycle(&mut self) -> char {
        self.glyph_index = (self.glyph_index + 1) % self.glyphs.len();
        self.glyphs[self.glyph_index]
    }

    /// Back to a plain single-char point cursor. Any active selection is
    /// discarded without publishing.
    pub fn set_glyph(&mut self, glyph: char) {
        self.glyphs = vec![glyph];
        self.glyph_index = 0;
        self.mode = Mode::Point;
        self.active = None;
    }

    /// Fixed-size block selection that travels with the cursor. The block
    /// exists immediately; confirm fires it without a separate entry step.
    pub fn set_block(&mut self, glyphs: Vec<char>, w: i32, h: i32) {
        self.glyphs = if glyphs.is_empty() { vec!['#'] } else { glyphs };
        self.glyph_index = 0;
        self.active = Some(Area::Rect(Selection::block(self.cursor, w, h)));
        self.mode = Mode::Block { w, h };
    }

    /// Flood selection: confirm computes the tile set through `flood`, a
    /// second confirm publishes it.
    pub fn set_flood(&mut self, glyph: char, flood: FloodFn) {
        self.glyphs = vec![glyph];
        self.glyph_index = 0;
        self.mode = Mode::Flood(flood);
        self.active = None;
    }

    pub fn has_selection(&self) -> bool {
        self.active.is_some()
    }

    /// The in-progress selection, for highlight rendering.
    pub fn selection(&self) -> Option<&Area> {
        self.active.as_ref()
    }

    /// Discard the active selection without publishing.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Tiles the next command would apply to: the active selection, or just
    /// the cursor tile when idle.
    pub fn selected_tiles(&self) -> Vec<TilePos> {
        match &self.active {
            Some(area) => area.tiles(),
            None => vec![self.cursor],
        }
    }

    /// Route one decoded signal. Directions move the cursor (kept followed
    /// by the viewport, clamped to the world); confirm enters or fires the
    /// selection. Everything else is ignored here.
    pub fn receive(&mut self, input: &InputSignal, viewport: &mut Viewport, bus: &Bus) {
        match input {
            InputSignal::Up => self.step(0, -1, viewport),
            InputSignal::Down => self.step(0, 1, viewport),
            InputSignal::Left => self.step(-1, 0, viewport),
            InputSignal::Right => self.step(1, 0, viewport),
            InputSignal::Enter => self.confirm(bus),
            _ => {}
        }
    }

    fn step(&mut self, dx: i32, dy: i32, viewport: &mut Viewport) {
        let world = *viewport.world();
        self.cursor.x = (self.cursor.x + dx).clamp(world.x, world.right() - 1);
        self.cursor.y = (self.cursor.y + dy).clamp(world.y, world.bottom() - 1);
        viewport.center_move(self.cursor.x, self.cursor.y);

        match &self.mode {
            Mode::Point => {
                if let Some(Area::Rect(selection)) = &mut self.active {
                    selection.extends_to(self.cursor.x, self.cursor.y);
                }
            }
            Mode::Block { w, h } => match &mut self.active {
                Some(Area::Rect(selection)) => selection.translate_to(self.cursor.x, self.cursor.y),
                _ => self.active = Some(Area::Rect(Selection::block(self.cursor, *w, *h))),
            },
            // Flood sets are computed on entry only; motion just moves the
            // cursor.
            Mode::Flood(_) => {}
        }
    }

    fn confirm(&mut self, bus: &Bus) {
        match &self.mode {
            Mode::Point => match self.active.take() {
                Some(area) => bus.publish(Event::AreaSelect(area)),
                None => self.active = Some(Area::Rect(Selection::anchored(self.cursor))),
            },
            Mode::Block { w, h } => {
                let area = self
                    .active
                    .take()
                    .unwrap_or_else(|| Area::Rect(Selection::block(self.cursor, *w, *h)));
                bus.publish(Event::AreaSelect(area));
            }
            Mode::Flood(flood) => match self.active.take() {
                Some(area) => bus.publish(Event::AreaSelect(area)),
                None => self.active = Some(Area::Tiles(flood(self.cursor))),
            },
        }
    }
}
