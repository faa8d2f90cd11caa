// Text components - static labels, data-bound values, wrapped paragraphs

use crate::data::read_path;
use crate::error::Error;
use crate::geometry::Frame;
use crate::surface::Surface;
use crate::ui::Component;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

/// Render a bound value the way a label wants it: strings unquoted, numbers
/// and booleans via their display form, null as empty.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Greedy word wrap by display width. Words longer than the width get a
/// line of their own and are left to clip.
pub(crate) fn wrap_text(text: &str, width: i32) -> Vec<String> {
    let width = width.max(1) as usize;
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line = word.to_string();
            } else if line.width() + 1 + word.width() <= width {
                line.push(' ');
                line.push_str(word);
            } else {
                lines.push(line);
                line = word.to_string();
            }
        }
        lines.push(line);
    }
    lines
}

/// A fixed label.
pub struct StaticText {
    frame: Frame,
    content: String,
    centered: bool,
}

impl StaticText {
    pub fn new(frame: Frame, content: impl Into<String>) -> Self {
        Self {
            frame,
            content: content.into(),
            centered: false,
        }
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }
}

impl Component for StaticText {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn display(&mut self, surface: &mut Surface) {
        let x = if self.centered {
            self.frame.x + (self.frame.w - self.content.width() as i32).max(0) / 2
        } else {
            self.frame.x
        };
        surface.print(x, self.frame.y, &self.content);
    }
}

/// A label showing the value at a dotted path, refreshed on every re-bind.
pub struct DynamicText {
    frame: Frame,
    source: String,
    text: String,
    centered: bool,
}

impl DynamicText {
    pub fn new(frame: Frame, source: impl Into<String>) -> Self {
        Self {
            frame,
            source: source.into(),
            text: String::new(),
            centered: false,
        }
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }
}

impl Component for DynamicText {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn set_data(&mut self, data: &Value) -> Result<(), Error> {
        self.text = value_text(read_path(data, &self.source)?);
        Ok(())
    }

    fn display(&mut self, surface: &mut Surface) {
        let x = if self.centered {
            self.frame.x + (self.frame.w - self.text.width() as i32).max(0) / 2
        } else {
            self.frame.x
        };
        surface.print(x, self.frame.y, &self.text);
    }
}

/// A word-wrapped paragraph filling its box, clipped at the bottom edge.
pub struct TextBlock {
    frame: Frame,
    lines: Vec<String>,
}

impl TextBlock {
    pub fn new(frame: Frame, content: &str) -> Self {
        Self {
            lines: wrap_text(content, frame.w),
            frame,
        }
    }

    /// Rows the wrapped content needs at the given width.
    pub fn measure(content: &str, width: i32) -> i32 {
        wrap_text(content, width).len() as i32
    }
}

impl Component for TextBlock {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn display(&mut self, surface: &mut Surface) {
        for (row, line) in self.lines.iter().enumerate() {
            if row as i32 >= self.frame.h {
                break;
            }
            surface.print(self.frame.x, self.frame.y + row as i32, line);
        }
    }
}
