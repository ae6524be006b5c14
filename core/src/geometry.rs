//! Axis-aligned collision, segment intersection and vector helpers.

use glam::Vec2;

use crate::ObjId;

/// Axis-aligned rectangle described by its four edges.
///
/// Entities store their box relative to their own position; adding the
/// position through [`BoundingBox::translated`] yields the world-space box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl BoundingBox {
    /// Creates a box from its edges.
    #[must_use]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box covering a full square of the provided side length anchored at the origin.
    #[must_use]
    pub const fn square(side: f32) -> Self {
        Self::new(0.0, 0.0, side, side)
    }

    /// Offsets every edge by the provided position.
    #[must_use]
    pub fn translated(self, position: Vec2) -> Self {
        Self {
            left: self.left + position.x,
            top: self.top + position.y,
            right: self.right + position.x,
            bottom: self.bottom + position.y,
        }
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Horizontal extent of the box.
    #[must_use]
    pub fn width(self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent of the box.
    #[must_use]
    pub fn height(self) -> f32 {
        self.bottom - self.top
    }

    /// Reports whether the point lies inside the box, edges included.
    #[must_use]
    pub fn contains(self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// Anything that participates in pairwise collision checks.
pub trait Collider {
    /// Identity used to exclude self-collision.
    fn collider_id(&self) -> ObjId;

    /// Pixel-space position the bounding box is relative to.
    fn position(&self) -> Vec2;

    /// Local bounding box.
    fn bounding_box(&self) -> BoundingBox;

    /// Whether the collider takes part in collision checks at all.
    fn collides(&self) -> bool;
}

/// Reports whether two world-space rectangles overlap on both axes.
///
/// The comparison is strict, so boxes that only share an edge do not overlap.
#[must_use]
pub fn boxes_overlap(pos_a: Vec2, bbox_a: BoundingBox, pos_b: Vec2, bbox_b: BoundingBox) -> bool {
    pos_a.x + bbox_a.left < pos_b.x + bbox_b.right
        && pos_a.x + bbox_a.right > pos_b.x + bbox_b.left
        && pos_a.y + bbox_a.top < pos_b.y + bbox_b.bottom
        && pos_a.y + bbox_a.bottom > pos_b.y + bbox_b.top
}

/// Reports whether two colliders are eligible for a collision check.
#[must_use]
pub fn entities_can_collide<A, B>(a: &A, b: &B) -> bool
where
    A: Collider + ?Sized,
    B: Collider + ?Sized,
{
    if a.collider_id() == b.collider_id() {
        return false;
    }

    a.collides() && b.collides()
}

/// Reports whether two colliders currently overlap.
#[must_use]
pub fn entities_collide<A, B>(a: &A, b: &B) -> bool
where
    A: Collider + ?Sized,
    B: Collider + ?Sized,
{
    entities_can_collide(a, b)
        && boxes_overlap(a.position(), a.bounding_box(), b.position(), b.bounding_box())
}

/// Parametric intersection of segment `p1..p2` with segment `p3..p4`.
///
/// Returns `(t, u)` where `t` runs along the first segment and `u` along the
/// second. Parallel segments and intersections outside either segment yield
/// `None`.
#[must_use]
pub fn segment_intersection(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<(f32, f32)> {
    let denominator = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);
    if denominator == 0.0 {
        return None;
    }

    let t = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x)) / denominator;
    let u = ((p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x)) / denominator;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u))
    } else {
        None
    }
}

/// Point where segment `start..end` crosses a world-space rectangle.
///
/// Edges are tested top, left, bottom, right and the first hit in that order
/// is returned, which is not necessarily the hit nearest to `start`.
#[must_use]
pub fn segment_rect_intersection(start: Vec2, end: Vec2, rect: BoundingBox) -> Option<Vec2> {
    let top_left = Vec2::new(rect.left, rect.top);
    let top_right = Vec2::new(rect.right, rect.top);
    let bottom_left = Vec2::new(rect.left, rect.bottom);
    let bottom_right = Vec2::new(rect.right, rect.bottom);

    let edges = [
        (top_left, top_right),
        (top_left, bottom_left),
        (bottom_left, bottom_right),
        (top_right, bottom_right),
    ];

    edges.into_iter().find_map(|(edge_start, edge_end)| {
        segment_intersection(start, end, edge_start, edge_end).map(|(t, _)| start + (end - start) * t)
    })
}

/// Euclidean length of a vector.
#[must_use]
pub fn vector_length(vector: Vec2) -> f32 {
    (vector.x * vector.x + vector.y * vector.y).sqrt()
}

/// Unit vector pointing along `vector`.
///
/// Callers must reject zero-length input beforehand.
#[must_use]
pub fn vector_normalized(vector: Vec2) -> Vec2 {
    let length = vector_length(vector);
    debug_assert!(length > 0.0, "cannot normalise a zero-length vector");
    vector / length
}

/// Restricts `value` to the inclusive range `min..=max`.
#[must_use]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Restricts `value` to `0.0..=1.0`.
#[must_use]
pub fn clamp01(value: f32) -> f32 {
    clamp(value, 0.0, 1.0)
}
