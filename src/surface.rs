// Surface - the draw/blit contract between the core and the terminal
//
// Components and states never touch the terminal. They draw onto a Surface,
// an offscreen cell grid over ratatui's Buffer; the root panel composites
// child surfaces with blit_on and the Screen flushes the final grid once per
// frame. Coordinates are i32 everywhere in the core, so drawing off the edge
// clips instead of wrapping or panicking.

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::{Buffer, Cell};
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::Terminal;
use std::io;
use unicode_width::UnicodeWidthStr;

pub struct Surface {
    buf: Buffer,
}

impl Surface {
    pub fn new(w: i32, h: i32) -> Self {
        let w = w.max(0).min(i32::from(u16::MAX)) as u16;
        let h = h.max(0).min(i32::from(u16::MAX)) as u16;
        Self {
            buf: Buffer::empty(Rect::new(0, 0, w, h)),
        }
    }

    pub fn width(&self) -> i32 {
        i32::from(self.buf.area.width)
    }

    pub fn height(&self) -> i32 {
        i32::from(self.buf.area.height)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buf
    }

    /// Reset every cell to a blank default.
    pub fn clear(&mut self) {
        self.buf.reset();
    }

    fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.buf.cell(Position::new(x as u16, y as u16))
    }

    fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.buf.cell_mut(Position::new(x as u16, y as u16))
    }

    pub fn print(&mut self, x: i32, y: i32, text: &str) {
        self.print_styled(x, y, text, Style::default());
    }

    /// Draw a text run; clipped at the right edge, dropped entirely when the
    /// start lies outside the grid.
    pub fn print_styled(&mut self, x: i32, y: i32, text: &str, style: Style) {
        if x < 0 || y < 0 || x >= self.width() || y >= self.height() {
            return;
        }
        self.buf.set_string(x as u16, y as u16, text, style);
    }

    /// Reverse-video run, used for the focused menu entry.
    pub fn print_highlighted(&mut self, x: i32, y: i32, text: &str) {
        self.print_styled(x, y, text, Style::default().add_modifier(Modifier::REVERSED));
    }

    /// Center a run horizontally by its display width.
    pub fn print_centered(&mut self, y: i32, text: &str, style: Style) {
        let x = (self.width() - text.width() as i32) / 2;
        self.print_styled(x.max(0), y, text, style);
    }

    pub fn put_symbol(&mut self, x: i32, y: i32, symbol: &str) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.set_symbol(symbol);
        }
    }

    /// A single world glyph with a foreground color.
    pub fn put_glyph(&mut self, x: i32, y: i32, glyph: char, color: Color) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.set_char(glyph);
            cell.fg = color;
        }
    }

    /// Paint the background of one cell, leaving its glyph alone.
    pub fn highlight_cell(&mut self, x: i32, y: i32, color: Color) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.bg = color;
        }
    }

    pub fn hline(&mut self, x: i32, y: i32, len: i32) {
        for i in 0..len.max(0) {
            self.put_symbol(x + i, y, symbols::line::HORIZONTAL);
        }
    }

    pub fn vline(&mut self, x: i32, y: i32, len: i32) {
        for i in 0..len.max(0) {
            self.put_symbol(x, y + i, symbols::line::VERTICAL);
        }
    }

    /// Copy every cell of this surface onto `target` at the given offset.
    /// Cells falling outside the target are dropped. The copy is opaque;
    /// panels are solid boxes, not overlays.
    pub fn blit_on(&self, target: &mut Surface, dx: i32, dy: i32) {
        for y in 0..self.height() {
            let ty = y + dy;
            if ty < 0 || ty >= target.height() {
                continue;
            }
            for x in 0..self.width() {
                let tx = x + dx;
                if tx < 0 || tx >= target.width() {
                    continue;
                }
                if let Some(src) = self.cell(x, y) {
                    let src = src.clone();
                    if let Some(dst) = target.cell_mut(tx, ty) {
                        *dst = src;
                    }
                }
            }
        }
    }

    /// The visible text of one row, symbols concatenated. Test helper, but
    /// also handy for dumping a surface to the log.
    pub fn row_text(&self, y: i32) -> String {
        let mut out = String::new();
        for x in 0..self.width() {
            if let Some(cell) = self.cell(x, y) {
                out.push_str(cell.symbol());
            }
        }
        out
    }
}

/// The real terminal: raw mode + alternate screen on entry, restored on
/// `restore`. Holds the ratatui terminal the composited root surface is
/// flushed through.
pub struct Screen {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Screen {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    pub fn size(&self) -> io::Result<(i32, i32)> {
        let size = self.terminal.size()?;
        Ok((i32::from(size.width), i32::from(size.height)))
    }

    /// Push the root surface to the terminal. Anything past the real
    /// terminal size is clipped.
    pub fn flush(&mut self, root: &Surface) -> io::Result<()> {
        self.terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            let w = area.width.min(root.buf.area.width);
            let h = area.height.min(root.buf.area.height);
            for y in 0..h {
                for x in 0..w {
                    let src = root.buf.cell(Position::new(x, y)).cloned();
                    if let (Some(src), Some(dst)) = (src, buf.cell_mut(Position::new(x, y))) {
                        *dst = src;
                    }
                }
            }
        })?;
        Ok(())
    }

    /// Leave the alternate screen and hand the terminal back. Also called
    /// from the binary's teardown path so a panic does not strand the shell
    /// in raw mode.
    pub fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()
    }
}
