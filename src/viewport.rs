// Viewport - a camera frame over the world grid
//
// The viewport owns the rectangle of world tiles currently on screen and
// keeps a followed point (usually the cursor) inside a dead zone. Movement
// within the dead zone never scrolls; once the point crosses a margin the
// frame shifts just enough to re-contain it, then clips to the world bounds
// so the camera never shows space outside the map.

use crate::geometry::Frame;

pub struct Viewport {
    pub frame: Frame,
    world: Frame,
    /// Margins from the left/right and top/bottom frame edges, in tiles.
    /// The followed point roams freely between them.
    dead_zone: (i32, i32),
}

impl Viewport {
    /// A viewport whose dead zone collapses to the frame center, so the
    /// followed point stays centered whenever the world allows it.
    pub fn new(frame: Frame, world: Frame) -> Self {
        let dead_zone = frame.center_offset();
        Self::with_dead_zone(frame, world, dead_zone)
    }

    /// Margins are clamped to half the frame so the dead zone can never
    /// invert.
    pub fn with_dead_zone(frame: Frame, world: Frame, dead_zone: (i32, i32)) -> Self {
        let dead_zone = (
            dead_zone.0.clamp(0, frame.w / 2),
            dead_zone.1.clamp(0, frame.h / 2),
        );
        Self {
            frame,
            world,
            dead_zone,
        }
    }

    pub fn world(&self) -> &Frame {
        &self.world
    }

    pub fn set_world(&mut self, world: Frame) {
        self.world = world;
        self.frame.clip(&self.world);
    }

    /// Scroll so the followed world point `(fx, fy)` sits inside the dead
    /// zone, then clip to the world. The shift is exactly the overshoot past
    /// the margin, so small cursor moves keep the frame still.
    pub fn center_move(&mut self, fx: i32, fy: i32) {
        let min_x = self.frame.x + self.dead_zone.0;
        let max_x = self.frame.x + self.frame.w - self.dead_zone.0;
        if fx < min_x {
            self.frame.x -= min_x - fx;
        }
        if fx > max_x {
            self.frame.x += fx - max_x;
        }

        let min_y = self.frame.y + self.dead_zone.1;
        let max_y = self.frame.y + self.frame.h - self.dead_zone.1;
        if fy < min_y {
            self.frame.y -= min_y - fy;
        }
        if fy > max_y {
            self.frame.y += fy - max_y;
        }

        self.frame.clip(&self.world);
    }

    /// Pan the frame directly, e.g. for map scrolling unrelated to the
    /// cursor. Clipped like any other move.
    pub fn move_frame(&mut self, dx: i32, dy: i32) {
        self.frame.translate(dx, dy);
        self.frame.clip(&self.world);
    }

    /// World coordinates to frame-local drawing coordinates, or `None` when
    /// the point is off screen.
    pub fn to_local(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        if self.frame.contains(x, y) {
            Some((x - self.frame.x, y - self.frame.y))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_10x10() -> Viewport {
        // Frame pinned at the world origin, world three times wider.
        Viewport::with_dead_zone(
            Frame::new(0, 0, 10, 10),
            Frame::new(0, 0, 30, 30),
            (5, 5),
        )
    }

    #[test]
    fn test_follow_inside_dead_zone_keeps_frame_still() {
        let mut vp = Viewport::with_dead_zone(
            Frame::new(0, 0, 10, 10),
            Frame::new(0, 0, 30, 30),
            (3, 3),
        );
        vp.center_move(4, 5);
        assert_eq!((vp.frame.x, vp.frame.y), (0, 0));
    }

    #[test]
    fn test_follow_shifts_by_exact_overshoot() {
        let mut vp = viewport_10x10();
        // Margin 5 on a width-10 frame pins the point at offset 5; moving
        // the point from 5 to 12 overshoots the margin by 7.
        vp.center_move(12, 5);
        assert_eq!(vp.frame.x, 7);
        assert_eq!(vp.frame.y, 0);
    }

    #[test]
    fn test_follow_clips_to_world_edge() {
        let mut vp = viewport_10x10();
        vp.center_move(29, 29);
        // Unclipped the frame would sit at 24; the world ends at 30.
        assert_eq!((vp.frame.x, vp.frame.y), (20, 20));
    }

    #[test]
    fn test_follow_toward_origin_clips_at_zero() {
        let mut vp = viewport_10x10();
        vp.move_frame(15, 15);
        vp.center_move(0, 0);
        assert_eq!((vp.frame.x, vp.frame.y), (0, 0));
    }

    #[test]
    fn test_move_frame_pans_and_clips() {
        let mut vp = viewport_10x10();
        vp.move_frame(8, 0);
        assert_eq!(vp.frame.x, 8);
        vp.move_frame(100, 0);
        assert_eq!(vp.frame.x, 20);
        vp.move_frame(-100, -100);
        assert_eq!((vp.frame.x, vp.frame.y), (0, 0));
    }

    #[test]
    fn test_to_local_maps_and_rejects() {
        let mut vp = viewport_10x10();
        vp.move_frame(5, 5);
        assert_eq!(vp.to_local(5, 5), Some((0, 0)));
        assert_eq!(vp.to_local(14, 9), Some((9, 4)));
        assert_eq!(vp.to_local(4, 5), None);
        assert_eq!(vp.to_local(15, 5), None);
    }

    #[test]
    fn test_default_dead_zone_is_frame_center() {
        let mut vp = Viewport::new(Frame::new(0, 0, 10, 10), Frame::new(0, 0, 30, 30));
        // Centered margins pin the point, so any move past center scrolls.
        vp.center_move(6, 5);
        assert_eq!(vp.frame.x, 1);
    }

    #[test]
    fn test_shrinking_world_reclips_frame() {
        let mut vp = viewport_10x10();
        vp.move_frame(20, 20);
        vp.set_world(Frame::new(0, 0, 15, 15));
        assert_eq!((vp.frame.x, vp.frame.y), (5, 5));
    }
}
