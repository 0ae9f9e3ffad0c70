use egui::{pos2, vec2, Pos2, Vec2};
use std::f32::consts::PI;

pub const PADDING_X: f32 = 12.0;
pub const PADDING_Y: f32 = 8.0;
pub const ARROW_LENGTH: f32 = 6.0;
pub const LABEL_LIFT: f32 = 5.0;
const EPSILON: f32 = 0.001;

pub fn font_size(focused: bool) -> f32 {
    if focused {
        16.0
    } else {
        14.0
    }
}

/// Box around a node label of the given measured width.
pub fn node_box(text_width: f32, focused: bool) -> Vec2 {
    vec2(
        text_width + PADDING_X * 2.0,
        font_size(focused) + PADDING_Y * 2.0,
    )
}

/// Point where a ray from `center` along `dir` leaves the rectangle of the
/// given size. A zero direction yields the center.
pub fn rect_boundary_point(center: Pos2, size: Vec2, dir: Vec2) -> Pos2 {
    if dir.x.abs() < EPSILON && dir.y.abs() < EPSILON {
        return center;
    }
    let half = size / 2.0;
    let scale_x = if dir.x.abs() < EPSILON {
        f32::INFINITY
    } else {
        half.x / dir.x.abs()
    };
    let scale_y = if dir.y.abs() < EPSILON {
        f32::INFINITY
    } else {
        half.y / dir.y.abs()
    };
    center + dir * scale_x.min(scale_y)
}

/// Triangle for an arrow head whose tip sits at `tip`, pointing away from `tail`.
pub fn arrow_head(tail: Pos2, tip: Pos2) -> Option<[Pos2; 3]> {
    let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
    if !angle.is_finite() {
        return None;
    }
    let wing = |offset: f32| {
        pos2(
            tip.x - ARROW_LENGTH * (angle + offset).cos(),
            tip.y - ARROW_LENGTH * (angle + offset).sin(),
        )
    };
    Some([tip, wing(-PI / 6.0), wing(PI / 6.0)])
}

pub fn label_anchor(start: Pos2, end: Pos2) -> Pos2 {
    let mid = start + (end - start) / 2.0;
    pos2(mid.x, mid.y - LABEL_LIFT)
}

/// Shortest distance from `point` to the segment `a`..`b`.
pub fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let along = b - a;
    let length_sq = along.length_sq();
    if length_sq < EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(along) / length_sq).clamp(0.0, 1.0);
    point.distance(a + along * t)
}

pub fn is_finite(point: Pos2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}
