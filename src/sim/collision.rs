//! Collision detection and response for axis-aligned boxes
//!
//! Detection and resolution are separate: [`detect`] produces a
//! [`CollisionResult`], and [`resolve`] consumes it according to what the
//! other object is. Entity-specific consequences (damage, scoring) live in
//! `contact`, which calls into these helpers.

use glam::Vec2;

use super::object::{Aabb, GameObject};
use crate::consts::GROUND_PROBE_HEIGHT;

/// How far below a one-way platform's top an object's previous underside
/// may sit and still count as landing from above
pub const ONE_WAY_SLOP: f32 = 1.0;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Whether the boxes overlap
    pub has_collision: bool,
    /// Overlap extent on each axis
    pub penetration: Vec2,
    /// Unit axis pushing the first object out of the second
    pub normal: Vec2,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            has_collision: false,
            penetration: Vec2::ZERO,
            normal: Vec2::ZERO,
        }
    }

    /// Penetration along the chosen normal axis
    #[inline]
    pub fn depth(&self) -> f32 {
        if self.normal.x != 0.0 {
            self.penetration.x
        } else {
            self.penetration.y
        }
    }

    /// The first object was pushed upward (it is standing on the second)
    #[inline]
    pub fn is_landing(&self) -> bool {
        self.normal.y < 0.0
    }

    /// The first object was pushed sideways
    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.normal.x != 0.0
    }
}

/// How the other object responds when something runs into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Push the mover fully out and stop it on that axis
    Solid,
    /// Only blocks objects falling onto its top
    OneWay,
    /// Another body: both objects take half the correction
    Body,
}

/// Overlap test with the shallow-axis separation normal
///
/// Returns a miss if either object is non-collidable.
pub fn detect(a: &GameObject, b: &GameObject) -> CollisionResult {
    if !a.collidable || !b.collidable {
        return CollisionResult::miss();
    }
    detect_boxes(&a.bounds(), &b.bounds())
}

/// Box-only version of [`detect`]
pub fn detect_boxes(a: &Aabb, b: &Aabb) -> CollisionResult {
    let Some(overlap) = a.intersection(b) else {
        return CollisionResult::miss();
    };

    let penetration = Vec2::new(overlap.width(), overlap.height());
    let between = a.center() - b.center();

    // Resolve along the axis needing the smaller correction
    let normal = if penetration.x < penetration.y {
        Vec2::new(if between.x < 0.0 { -1.0 } else { 1.0 }, 0.0)
    } else {
        Vec2::new(0.0, if between.y <= 0.0 { -1.0 } else { 1.0 })
    };

    CollisionResult {
        has_collision: true,
        penetration,
        normal,
    }
}

/// Apply the correction for `result` (from `detect(mover, other)`)
///
/// Returns true if anything was moved.
pub fn resolve(
    mover: &mut GameObject,
    other: &mut GameObject,
    surface: Surface,
    result: &CollisionResult,
) -> bool {
    if !result.has_collision {
        return false;
    }

    match surface {
        Surface::Solid => {
            mover.translate(result.normal * result.depth());
            if result.is_horizontal() {
                mover.vel.x = 0.0;
            } else {
                mover.vel.y = 0.0;
            }
            true
        }
        Surface::OneWay => {
            let top = other.bounds().top;
            let falling = mover.vel.y > 0.0;
            let came_from_above = mover.prev_bounds().bottom <= top + ONE_WAY_SLOP;
            if falling && came_from_above && mover.bounds().bottom > top {
                mover.translate(Vec2::new(0.0, top - mover.bounds().bottom));
                mover.vel.y = 0.0;
                true
            } else {
                false
            }
        }
        Surface::Body => {
            let half = result.normal * (result.depth() * 0.5);
            mover.translate(half);
            other.translate(-half);
            true
        }
    }
}

/// Test a proposed move against obstacles
///
/// Builds the box swept from the current position to `pos + velocity * dt`
/// and returns the first obstacle (in iteration order) it overlaps. Obstacles
/// are not sorted by distance, so when several are crossed in one step the
/// earliest in the list wins, not the nearest.
pub fn sweep_test<'a, I>(
    object: &GameObject,
    velocity: Vec2,
    dt: f32,
    obstacles: I,
) -> Option<(usize, CollisionResult)>
where
    I: IntoIterator<Item = &'a GameObject>,
{
    if !object.collidable {
        return None;
    }

    let start = object.bounds();
    let delta = velocity * dt;
    let end = Aabb::new(
        start.left + delta.x,
        start.top + delta.y,
        start.right + delta.x,
        start.bottom + delta.y,
    );
    let swept = start.union(&end);

    obstacles
        .into_iter()
        .enumerate()
        .filter(|(_, obstacle)| obstacle.collidable)
        .map(|(i, obstacle)| (i, detect_boxes(&swept, &obstacle.bounds())))
        .find(|(_, result)| result.has_collision)
}

/// Probe a thin strip under the object for support
pub fn is_grounded(object: &GameObject, ground: &GameObject) -> bool {
    if !object.collidable || !ground.collidable {
        return false;
    }
    let b = object.bounds();
    let probe = Aabb::new(b.left, b.bottom, b.right, b.bottom + GROUND_PROBE_HEIGHT);
    probe.intersects(&ground.bounds())
}
