// Frame - integer rectangle arithmetic
//
// Frames describe both world-space regions (the world bounds, the viewport
// window) and screen-space component boxes. Coordinates are signed so camera
// deltas and off-by-one clamping stay overflow-free near zero.

/// An axis-aligned rectangle: position plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Frame {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// A frame at the origin with the given size.
    pub const fn sized(w: i32, h: i32) -> Self {
        Self::new(0, 0, w, h)
    }

    /// First column past the right edge.
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// First row past the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// The center cell of the frame, relative to its own origin.
    pub fn center_offset(&self) -> (i32, i32) {
        (self.w / 2, self.h / 2)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.x += dx;
        self.y += dy;
    }

    /// Clamp the frame's position so it lies inside `bounds`. Size is never
    /// changed; a frame wider or taller than the bounds pins to the bounds
    /// origin on that axis.
    pub fn clip(&mut self, bounds: &Frame) {
        let max_x = bounds.x + (bounds.w - self.w).max(0);
        let max_y = bounds.y + (bounds.h - self.h).max(0);
        self.x = self.x.clamp(bounds.x, max_x);
        self.y = self.y.clamp(bounds.y, max_y);
    }
}
