//! Screen geometry in global display coordinates.
//!
//! Origin is the top-left corner of the primary display and `y` grows
//! downward, matching the coordinate space of window frames reported by the
//! accessibility layer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// A zero (or negative) width or height marks a frame read mid-transition.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Strict intersection: rects that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// Area of the overlap between two rects, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        if !self.intersects(other) {
            return 0.0;
        }
        let w = self.max_x().min(other.max_x()) - self.min_x().max(other.min_x());
        let h = self.max_y().min(other.max_y()) - self.min_y().max(other.min_y());
        w.max(0.0) * h.max(0.0)
    }

    /// True when every component differs by at most `epsilon`.
    pub fn approx_eq(&self, other: &Rect, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.width - other.width).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
    }

    pub fn with_origin(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.max_x(), 110.0);
        assert_eq!(r.max_y(), 70.0);
        assert_eq!(r.origin(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 0.0, 100.0, 100.0);
        assert!(!a.intersects(&b));
        assert_eq!(a.intersection_area(&b), 0.0);
    }

    #[test]
    fn test_intersection_area() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection_area(&b), 2500.0);
    }

    #[test]
    fn test_degenerate_never_intersects() {
        let a = Rect::new(0.0, 0.0, 0.0, 100.0);
        let b = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(a.is_degenerate());
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_approx_eq() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(1.0, -1.0, 101.5, 100.0);
        assert!(a.approx_eq(&b, 2.0));
        assert!(!a.approx_eq(&b, 1.0));
    }

    #[test]
    fn test_with_origin_keeps_size() {
        let a = Rect::new(5.0, 5.0, 30.0, 40.0);
        let moved = a.with_origin(Point::new(0.0, -10.0));
        assert_eq!(moved, Rect::new(0.0, -10.0, 30.0, 40.0));
    }
}
