use serde::{Deserialize, Serialize};

/// A point in canvas coordinate space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Minimum distance from `point` to the line segment `a..b`.
///
/// Projects the point onto the infinite line through the segment, clamps the
/// projection parameter to `[0, 1]`, and measures to the clamped projection.
/// A degenerate segment (`a == b`) reduces to point distance.
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f32::EPSILON {
        return point.distance_to(a);
    }

    let t = ((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    let closest = Vec2::new(a.x + dx * t, a.y + dy * t);
    point.distance_to(closest)
}
