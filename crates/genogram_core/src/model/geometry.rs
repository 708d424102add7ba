//! Plain 2D geometry used by layout, drag and export code.

use serde::{Deserialize, Serialize};

/// Point in canvas (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance_to(self, other: Point) -> f64 {
        let d = self.sub(other);
        d.dot(d).sqrt()
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1).
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Square of side `size` centred on `center`.
    pub fn centered_square(center: Point, size: f64) -> Self {
        Self::new(center.x - size / 2.0, center.y - size / 2.0, size, size)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Grows the rectangle by `padding` on every side.
    pub fn padded(&self, padding: f64) -> Rect {
        Rect::new(
            self.x - padding,
            self.y - padding,
            self.width + padding * 2.0,
            self.height + padding * 2.0,
        )
    }
}

/// Rounds `value` to the nearest multiple of `grid_size`.
///
/// A non-positive or non-finite grid size leaves the value untouched.
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// Scalar projection of `p` onto segment `a -> b`, clamped to `[0, 1]`.
///
/// Returns `None` for a zero-length segment.
pub fn project_onto_segment(p: Point, a: Point, b: Point) -> Option<f64> {
    let ab = b.sub(a);
    let len_sq = ab.dot(ab);
    if len_sq <= f64::EPSILON {
        return None;
    }
    let t = p.sub(a).dot(ab) / len_sq;
    if !t.is_finite() {
        return None;
    }
    Some(t.clamp(0.0, 1.0))
}

/// Euclidean distance from `p` to the closest point of segment `a -> b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    match project_onto_segment(p, a, b) {
        Some(t) => p.distance_to(a.lerp(b, t)),
        None => p.distance_to(a),
    }
}

/// Even-odd point-in-polygon test.
pub fn polygon_contains(points: &[Point], p: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let cross_x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::{
        distance_to_segment, polygon_contains, project_onto_segment, snap_to_grid, Point, Rect,
    };

    #[test]
    fn snap_rounds_to_nearest_cell() {
        assert_eq!(snap_to_grid(29.0, 20.0), 20.0);
        assert_eq!(snap_to_grid(31.0, 20.0), 40.0);
        assert_eq!(snap_to_grid(-11.0, 20.0), -20.0);
        assert_eq!(snap_to_grid(13.0, 0.0), 13.0);
    }

    #[test]
    fn projection_clamps_far_points() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        assert_eq!(project_onto_segment(Point::new(50.0, 80.0), a, b), Some(0.5));
        assert_eq!(project_onto_segment(Point::new(-1e9, 3.0), a, b), Some(0.0));
        assert_eq!(project_onto_segment(Point::new(1e12, -7.0), a, b), Some(1.0));
        assert_eq!(project_onto_segment(Point::new(5.0, 5.0), a, a), None);
    }

    #[test]
    fn segment_distance_uses_closest_point() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
    }

    #[test]
    fn polygon_contains_square_interior() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(polygon_contains(&square, Point::new(5.0, 5.0)));
        assert!(!polygon_contains(&square, Point::new(15.0, 5.0)));
    }

    #[test]
    fn rect_union_and_padding() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, -5.0, 5.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 25.0, 15.0));
        assert_eq!(a.padded(2.0), Rect::new(-2.0, -2.0, 14.0, 14.0));
    }
}
