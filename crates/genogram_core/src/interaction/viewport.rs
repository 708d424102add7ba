//! Canvas pan/zoom transform.
//!
//! Screen coordinates map to world coordinates as
//! `world = (screen - offset) / zoom`.

use crate::model::geometry::Point;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub zoom: f64,
    /// Visible canvas size in screen pixels.
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Background pan gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSession {
    pointer_start: Point,
    offset_start: Point,
}

impl Viewport {
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset_x) / self.zoom,
            (screen.y - self.offset_y) / self.zoom,
        )
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.zoom + self.offset_x,
            world.y * self.zoom + self.offset_y,
        )
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Multiplies zoom by `factor`, keeping the world point under `anchor`
    /// (screen space) fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let next = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let ratio = next / self.zoom;
        self.offset_x = anchor.x - (anchor.x - self.offset_x) * ratio;
        self.offset_y = anchor.y - (anchor.y - self.offset_y) * ratio;
        self.zoom = next;
    }

    /// Pans so that `world` sits in the middle of the visible canvas.
    pub fn center_on(&mut self, world: Point) {
        self.offset_x = self.width / 2.0 - world.x * self.zoom;
        self.offset_y = self.height / 2.0 - world.y * self.zoom;
    }

    pub fn begin_pan(&self, pointer: Point) -> PanSession {
        PanSession {
            pointer_start: pointer,
            offset_start: Point::new(self.offset_x, self.offset_y),
        }
    }

    pub fn update_pan(&mut self, pan: &PanSession, pointer: Point) {
        self.offset_x = pan.offset_start.x + (pointer.x - pan.pointer_start.x);
        self.offset_y = pan.offset_start.y + (pointer.y - pan.pointer_start.y);
    }
}

#[cfg(test)]
mod tests {
    use super::{Viewport, MAX_ZOOM};
    use crate::model::geometry::Point;

    #[test]
    fn zoom_keeps_anchor_fixed_and_clamps() {
        let mut viewport = Viewport::default();
        let anchor = Point::new(200.0, 100.0);
        let before = viewport.screen_to_world(anchor);
        viewport.zoom_at(anchor, 2.0);
        let after = viewport.screen_to_world(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);

        viewport.zoom_at(anchor, 100.0);
        assert_eq!(viewport.zoom, MAX_ZOOM);
    }

    #[test]
    fn center_on_maps_world_point_to_canvas_middle() {
        let mut viewport = Viewport::default();
        viewport.zoom = 2.0;
        viewport.center_on(Point::new(10.0, 20.0));
        assert_eq!(
            viewport.world_to_screen(Point::new(10.0, 20.0)),
            Point::new(400.0, 300.0)
        );
    }

    #[test]
    fn pan_is_absolute_from_gesture_start() {
        let mut viewport = Viewport::default();
        let pan = viewport.begin_pan(Point::new(10.0, 10.0));
        viewport.update_pan(&pan, Point::new(30.0, 0.0));
        viewport.update_pan(&pan, Point::new(40.0, 15.0));
        assert_eq!((viewport.offset_x, viewport.offset_y), (30.0, 5.0));
    }
}
