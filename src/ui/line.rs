// Line - horizontal rule, optionally with column tick marks

use crate::geometry::Frame;
use crate::surface::Surface;
use crate::ui::Component;
use ratatui::symbols;

/// A horizontal separator spanning its frame. With `columns > 1` it draws a
/// tick where each column boundary meets the rule, matching the column
/// layout the builder gives row containers. A capped line junctions into a
/// surrounding border instead of butting against it.
pub struct Line {
    frame: Frame,
    columns: usize,
    capped: bool,
}

impl Line {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            columns: 1,
            capped: false,
        }
    }

    pub fn columned(frame: Frame, columns: usize) -> Self {
        Self {
            frame,
            columns: columns.max(1),
            capped: false,
        }
    }

    pub fn capped(mut self) -> Self {
        self.capped = true;
        self
    }
}

impl Component for Line {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    fn display(&mut self, surface: &mut Surface) {
        surface.hline(self.frame.x, self.frame.y, self.frame.w);
        for col in 1..self.columns {
            let x = self.frame.x + (self.frame.w * col as i32) / self.columns as i32;
            surface.put_symbol(x, self.frame.y, symbols::line::HORIZONTAL_DOWN);
        }
        if self.capped && self.frame.w >= 2 {
            surface.put_symbol(self.frame.x, self.frame.y, symbols::line::VERTICAL_RIGHT);
            surface.put_symbol(
                self.frame.right() - 1,
                self.frame.y,
                symbols::line::VERTICAL_LEFT,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_spans_frame() {
        let mut line = Line::new(Frame::new(1, 0, 4, 1));
        let mut surface = Surface::new(6, 1);
        line.display(&mut surface);
        assert_eq!(surface.row_text(0), " ──── ");
    }

    #[test]
    fn test_columned_line_marks_boundaries() {
        let mut line = Line::columned(Frame::new(0, 0, 8, 1), 2);
        let mut surface = Surface::new(8, 1);
        line.display(&mut surface);
        assert_eq!(surface.row_text(0), "────┬───");
    }

    #[test]
    fn test_capped_line_junctions_into_borders() {
        let mut line = Line::new(Frame::new(0, 0, 6, 1)).capped();
        let mut surface = Surface::new(6, 1);
        line.display(&mut surface);
        assert_eq!(surface.row_text(0), "├────┤");
    }
}
