// Menu builder - declarative trees into component trees
//
// Menus ship as serde_json maps: a panel node with `title`, dimensions and
// a `children` list, each child naming its `type` plus whatever that type
// binds. Layout is cursor-driven: a child without `y` lands one row below
// the previous one, and `eat_line: false` lets siblings share a row.
// Malformed trees fail with named build errors instead of half-built menus.
//
// Recognized child types: Text, DynamicText, TextBlock, Input, Checkbox,
// List, Rows, Line, Ruler, NumberPicker, Button, Foreach.

use crate::data::read_path;
use crate::error::{BuildError, Error};
use crate::events::{Event, LeaveIntent};
use crate::geometry::Frame;
use crate::state::StateNode;
use crate::ui::{
    Button, Checkbox, Component, ComponentRef, Container, DynamicText, Line, ListView,
    NumberPicker, RootPanel, Ruler, StaticText, TextBlock, TextInput,
};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Everything a build needs besides the tree itself: the screen size for
/// templates and percentages, and the menu's data dictionary for `Foreach`
/// expansion.
pub struct BuildContext<'a> {
    width: i32,
    height: i32,
    data: &'a Value,
}

impl<'a> BuildContext<'a> {
    pub fn new(width: i32, height: i32, data: &'a Value) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

/// Running layout state while a panel's children are placed. `area` is the
/// panel's content box in panel-local coordinates; `last_y` is the last
/// occupied row.
struct Cursor {
    area: Frame,
    last_y: i32,
}

/// Build a whole menu panel from a tree.
pub fn build_menu(ctx: &BuildContext, tree: &Value) -> Result<Rc<RefCell<RootPanel>>, Error> {
    let frame = panel_frame(ctx, tree)?;
    let title = str_key(tree, "title").unwrap_or_default();
    let mut root = RootPanel::new(frame, title);
    let mut cursor = Cursor {
        area: Frame::new(1, 1, frame.w - 2, frame.h - 2),
        last_y: 0,
    };
    let mut children = Vec::new();
    if let Some(list) = tree.get("children").and_then(Value::as_array) {
        for child in list {
            build_component(ctx, child, &mut cursor, &mut children)?;
        }
    }
    root.set_children(children);
    Ok(root.into_ref())
}

// ─────────────────────────────────────────────────────────────────────────
// Panel placement
// ─────────────────────────────────────────────────────────────────────────

fn panel_frame(ctx: &BuildContext, tree: &Value) -> Result<Frame, Error> {
    if let Some(template) = tree.get("template") {
        return template_frame(ctx, template);
    }
    let x = int_key(tree, "x")?.unwrap_or(0);
    let y = int_key(tree, "y")?.unwrap_or(0);
    let w = int_key(tree, "w")?.unwrap_or(ctx.width);
    let h = int_key(tree, "h")?.unwrap_or(ctx.height);
    Ok(Frame::new(x, y, w, h))
}

/// `"centered N"`: the panel keeps an N-percent margin of the screen on
/// every side.
fn template_frame(ctx: &BuildContext, template: &Value) -> Result<Frame, Error> {
    let text = template
        .as_str()
        .ok_or_else(|| BuildError::BadTemplate(template.to_string()))?;
    let mut parts = text.split_whitespace();
    let frame = match (parts.next(), parts.next(), parts.next()) {
        (Some("centered"), Some(percent), None) => {
            let percent: i32 = percent
                .parse()
                .map_err(|_| BuildError::BadTemplate(text.to_string()))?;
            if !(0..50).contains(&percent) {
                return Err(BuildError::BadTemplate(text.to_string()).into());
            }
            let x = ctx.width * percent / 100;
            let y = ctx.height * percent / 100;
            Frame::new(x, y, ctx.width - 2 * x, ctx.height - 2 * y)
        }
        _ => return Err(BuildError::BadTemplate(text.to_string()).into()),
    };
    Ok(frame)
}

// ─────────────────────────────────────────────────────────────────────────
// Component dispatch
// ─────────────────────────────────────────────────────────────────────────

fn build_component(
    ctx: &BuildContext,
    tree: &Value,
    cursor: &mut Cursor,
    out: &mut Vec<ComponentRef>,
) -> Result<(), Error> {
    let kind = tree
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| BuildError::UnknownComponent(String::from("(no type)")))?;
    if kind == "Foreach" {
        return expand_foreach(ctx, tree, cursor, out);
    }
    out.push(build_single(ctx, kind, tree, cursor)?);
    Ok(())
}

fn build_single(
    ctx: &BuildContext,
    kind: &str,
    tree: &Value,
    cursor: &mut Cursor,
) -> Result<ComponentRef, Error> {
    let component: ComponentRef = match kind {
        "Text" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            let mut text = StaticText::new(frame, text_content(kind, tree)?);
            if bool_key(tree, "centered") {
                text = text.centered();
            }
            Rc::new(RefCell::new(text))
        }
        "DynamicText" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            let mut text = DynamicText::new(frame, require_source(kind, tree)?);
            if bool_key(tree, "centered") {
                text = text.centered();
            }
            Rc::new(RefCell::new(text))
        }
        "TextBlock" => {
            let content = text_content(kind, tree)?;
            let placed = resolve_box(tree, cursor)?;
            let h = int_key(tree, "h")?.unwrap_or_else(|| TextBlock::measure(&content, placed.w));
            let frame = place(cursor, tree, Frame::new(placed.x, placed.y, placed.w, h));
            Rc::new(RefCell::new(TextBlock::new(frame, &content)))
        }
        "Input" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            let mut input = TextInput::new(frame, require_source(kind, tree)?);
            if let Some(value) = str_key(tree, "default") {
                input = input.with_value(value);
            }
            Rc::new(RefCell::new(input))
        }
        "Checkbox" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            let label = str_key(tree, "label").unwrap_or_default();
            let source = str_key(tree, "source");
            let checked = bool_key(tree, "checked") || bool_key(tree, "default");
            Rc::new(RefCell::new(
                Checkbox::new(frame, label, source).with_checked(checked),
            ))
        }
        "List" => {
            let source = require_source(kind, tree)?;
            let placed = resolve_box(tree, cursor)?;
            let h = int_key(tree, "h")?.unwrap_or(cursor.area.bottom() - placed.y);
            let frame = place(cursor, tree, Frame::new(placed.x, placed.y, placed.w, h));
            let list = ListView::new(frame, source).into_ref();
            list.borrow_mut().set_data(ctx.data)?;
            list
        }
        "Rows" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            build_rows(ctx, tree, frame)?
        }
        "Line" => {
            // A separator spans the whole panel, borders included, so it
            // junctions into them.
            let y = int_key(tree, "y")?.unwrap_or(cursor.last_y + 1);
            let frame = place(cursor, tree, Frame::new(0, y, cursor.area.w + 2, 1));
            let line = match int_key(tree, "columns")? {
                Some(columns) => Line::columned(frame, columns.max(1) as usize),
                None => Line::new(frame),
            };
            Rc::new(RefCell::new(line.capped()))
        }
        "Ruler" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            Rc::new(RefCell::new(Ruler::new(frame, require_source(kind, tree)?)))
        }
        "NumberPicker" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            Rc::new(RefCell::new(NumberPicker::new(
                frame,
                require_source(kind, tree)?,
            )))
        }
        "Button" => {
            let frame = resolve_frame(tree, cursor, 1)?;
            let label = str_key(tree, "label").unwrap_or_default();
            Rc::new(RefCell::new(Button::new(frame, label, button_events(tree)?)))
        }
        other => return Err(BuildError::UnknownComponent(other.to_string()).into()),
    };
    Ok(component)
}

/// Column layout: every child of a `Rows` node gets an equal slice of the
/// row and lays out inside it.
fn build_rows(ctx: &BuildContext, tree: &Value, frame: Frame) -> Result<ComponentRef, Error> {
    let templates = tree
        .get("children")
        .and_then(Value::as_array)
        .ok_or_else(|| BuildError::InvalidComponent(String::from("Rows needs children")))?;
    if templates.is_empty() {
        return Err(BuildError::InvalidComponent(String::from("Rows needs children")).into());
    }
    let column_w = (frame.w / templates.len() as i32).max(1);
    let mut row = Container::new(frame);
    for (column, template) in templates.iter().enumerate() {
        let mut cursor = Cursor {
            area: Frame::new(frame.x + column as i32 * column_w, frame.y, column_w, 1),
            last_y: frame.y - 1,
        };
        let mut cell = Vec::new();
        build_component(ctx, template, &mut cursor, &mut cell)?;
        for child in cell {
            row.add_child(child);
        }
    }
    Ok(row.into_ref())
}

/// Replicate the `do` templates once per element of the array at `source`,
/// rewriting each replica's `source_builder` pattern (`#` is the index)
/// into a concrete `source`.
fn expand_foreach(
    ctx: &BuildContext,
    tree: &Value,
    cursor: &mut Cursor,
    out: &mut Vec<ComponentRef>,
) -> Result<(), Error> {
    let source = str_key(tree, "source")
        .ok_or_else(|| BuildError::InvalidComponent(String::from("Foreach needs a source")))?;
    let rows = read_path(ctx.data, &source)
        .map_err(|_| BuildError::MissingContext {
            path: source.clone(),
        })?
        .as_array()
        .ok_or_else(|| {
            BuildError::InvalidComponent(format!("Foreach source {source} must be an array"))
        })?
        .len();
    let templates = tree
        .get("do")
        .and_then(Value::as_array)
        .ok_or_else(|| BuildError::InvalidComponent(String::from("Foreach needs a do list")))?;
    for index in 0..rows {
        for template in templates {
            let spliced = splice_index(template, index);
            build_component(ctx, &spliced, cursor, out)?;
        }
    }
    Ok(())
}

fn splice_index(template: &Value, index: usize) -> Value {
    let mut copy = template.clone();
    if let Some(object) = copy.as_object_mut() {
        if let Some(Value::String(pattern)) = object.remove("source_builder") {
            let source = pattern.replace('#', &index.to_string());
            object.insert(String::from("source"), Value::String(source));
        }
    }
    copy
}

// ─────────────────────────────────────────────────────────────────────────
// Key helpers
// ─────────────────────────────────────────────────────────────────────────

struct PlacedBox {
    x: i32,
    y: i32,
    w: i32,
}

/// Resolve x/y/w with cursor defaults. Height is type-specific, so callers
/// finish with `place`.
fn resolve_box(tree: &Value, cursor: &Cursor) -> Result<PlacedBox, Error> {
    let x = int_key(tree, "x")?.unwrap_or(cursor.area.x);
    let y = int_key(tree, "y")?.unwrap_or(cursor.last_y + 1);
    let w = match tree.get("w") {
        None => cursor.area.right() - x,
        Some(value) => dimension(value, cursor.area.w)?,
    };
    Ok(PlacedBox { x, y, w })
}

fn resolve_frame(tree: &Value, cursor: &mut Cursor, h: i32) -> Result<Frame, Error> {
    let placed = resolve_box(tree, cursor)?;
    let h = int_key(tree, "h")?.unwrap_or(h);
    Ok(place(
        cursor,
        tree,
        Frame::new(placed.x, placed.y, placed.w, h),
    ))
}

/// Advance the layout cursor past the frame unless the node opts out with
/// `eat_line: false`.
fn place(cursor: &mut Cursor, tree: &Value, frame: Frame) -> Frame {
    let eats = tree
        .get("eat_line")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if eats {
        cursor.last_y = frame.bottom() - 1;
    }
    frame
}

/// A width is a plain integer or a percentage of the parent's content
/// width.
fn dimension(value: &Value, parent_w: i32) -> Result<i32, Error> {
    if let Some(n) = value.as_i64() {
        return Ok(n as i32);
    }
    if let Some(text) = value.as_str() {
        if let Some(percent) = text.strip_suffix('%') {
            if let Ok(percent) = percent.parse::<i32>() {
                return Ok(parent_w * percent / 100);
            }
        }
    }
    Err(BuildError::InvalidComponent(format!("bad dimension {value}")).into())
}

fn str_key(tree: &Value, key: &str) -> Option<String> {
    tree.get(key).and_then(Value::as_str).map(str::to_string)
}

fn int_key(tree: &Value, key: &str) -> Result<Option<i32>, Error> {
    match tree.get(key) {
        None => Ok(None),
        Some(value) => value.as_i64().map(|n| Some(n as i32)).ok_or_else(|| {
            BuildError::InvalidComponent(format!("{key} must be an integer")).into()
        }),
    }
}

fn bool_key(tree: &Value, key: &str) -> bool {
    tree.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn text_content(kind: &str, tree: &Value) -> Result<String, Error> {
    str_key(tree, "content")
        .or_else(|| str_key(tree, "text"))
        .ok_or_else(|| BuildError::InvalidComponent(format!("{kind} needs content")).into())
}

fn require_source(kind: &str, tree: &Value) -> Result<String, Error> {
    str_key(tree, "source")
        .ok_or_else(|| BuildError::InvalidComponent(format!("{kind} needs a source")).into())
}

/// A button's payload: either a single `event_type`/`event` pair on the
/// node itself, or an `events` list of such pairs.
fn button_events(tree: &Value) -> Result<Vec<Event>, Error> {
    if let Some(list) = tree.get("events").and_then(Value::as_array) {
        return list.iter().map(parse_event).collect();
    }
    Ok(vec![parse_event(tree)?])
}

fn parse_event(tree: &Value) -> Result<Event, Error> {
    let kind = tree.get("event_type").and_then(Value::as_str).ok_or_else(|| {
        BuildError::InvalidComponent(String::from("Button needs an event_type"))
    })?;
    let payload = tree.get("event");
    let payload_str = payload.and_then(Value::as_str);
    let event = match kind {
        "NewState" => {
            let tree = payload.ok_or_else(|| {
                BuildError::InvalidComponent(String::from("NewState needs a state tree"))
            })?;
            Event::NewState(Rc::new(StateNode::parse(tree)?))
        }
        "PreviousState" => Event::PreviousState(
            payload_str
                .ok_or_else(|| {
                    BuildError::InvalidComponent(String::from("PreviousState needs a target"))
                })?
                .to_string(),
        ),
        "PlayerAction" => Event::PlayerAction(
            payload_str
                .ok_or_else(|| {
                    BuildError::InvalidComponent(String::from("PlayerAction needs a verb"))
                })?
                .to_string(),
        ),
        "Game" => Event::Game(payload.cloned().unwrap_or(Value::Null)),
        "World" => Event::World(payload.cloned().unwrap_or(Value::Null)),
        "Back" => Event::Leave(LeaveIntent::Back),
        "Quit" => Event::Leave(LeaveIntent::Quit),
        other => {
            return Err(BuildError::InvalidComponent(format!("unknown event type {other}")).into())
        }
    };
    Ok(event)
}

// ─────────────────────────────────────────────────────────────────────────
// Canned dialogs
// ─────────────────────────────────────────────────────────────────────────

/// A centered message panel with an OK button that backs out of the state.
pub fn text_box(ctx: &BuildContext, title: &str, content: &str) -> Rc<RefCell<RootPanel>> {
    let w = (ctx.width * 2 / 3).max(12);
    let text_w = w - 4;
    let text_h = TextBlock::measure(content, text_w);
    let h = text_h + 4;
    let frame = centered_frame(ctx, w, h);
    let mut root = RootPanel::new(frame, title);
    root.add_child(Rc::new(RefCell::new(TextBlock::new(
        Frame::new(2, 1, text_w, text_h),
        content,
    ))));
    root.add_child(Rc::new(RefCell::new(Button::new(
        Frame::new(2, text_h + 2, text_w, 1),
        "Ok",
        vec![Event::Leave(LeaveIntent::Back)],
    ))));
    root.into_ref()
}

/// A yes/no prompt. Yes fires the given events; No backs out.
pub fn question_box(
    ctx: &BuildContext,
    title: &str,
    question: &str,
    yes: Vec<Event>,
) -> Rc<RefCell<RootPanel>> {
    let w = (ctx.width / 2).max(16);
    let text_w = w - 4;
    let text_h = TextBlock::measure(question, text_w);
    let h = text_h + 4;
    let frame = centered_frame(ctx, w, h);
    let mut root = RootPanel::new(frame, title);
    root.add_child(Rc::new(RefCell::new(TextBlock::new(
        Frame::new(2, 1, text_w, text_h),
        question,
    ))));
    let buttons = Frame::new(1, text_h + 2, w - 2, 1);
    let column_w = buttons.w / 2;
    let mut row = Container::new(buttons);
    row.add_child(Rc::new(RefCell::new(Button::new(
        Frame::new(buttons.x + 1, buttons.y, column_w - 1, 1),
        "Yes",
        yes,
    ))));
    row.add_child(Rc::new(RefCell::new(Button::new(
        Frame::new(buttons.x + column_w + 1, buttons.y, column_w - 1, 1),
        "No",
        vec![Event::Leave(LeaveIntent::Back)],
    ))));
    root.add_child(row.into_ref());
    root.into_ref()
}

/// A pick-one prompt: one button per choice plus a Cancel that backs out.
pub fn choice_box(
    ctx: &BuildContext,
    title: &str,
    choices: Vec<(String, Vec<Event>)>,
) -> Rc<RefCell<RootPanel>> {
    let longest = choices
        .iter()
        .map(|(label, _)| label.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let w = (longest + 6).max(title.chars().count() as i32 + 6).max(14);
    let h = choices.len() as i32 + 4;
    let frame = centered_frame(ctx, w, h);
    let mut root = RootPanel::new(frame, title);
    for (row, (label, events)) in choices.into_iter().enumerate() {
        root.add_child(Rc::new(RefCell::new(Button::new(
            Frame::new(2, row as i32 + 1, w - 4, 1),
            label,
            events,
        ))));
    }
    root.add_child(Rc::new(RefCell::new(Button::new(
        Frame::new(2, h - 2, w - 4, 1),
        "Cancel",
        vec![Event::Leave(LeaveIntent::Back)],
    ))));
    root.into_ref()
}

fn centered_frame(ctx: &BuildContext, w: i32, h: i32) -> Frame {
    Frame::new((ctx.width - w).max(0) / 2, (ctx.height - h).max(0) / 2, w, h)
}
