//! Shared entity state
//!
//! Every entity variant embeds a [`GameObject`] holding its pose, motion,
//! flags and animation counters. Position and size are private so the
//! bounding box can never go stale: every mutation goes through a setter
//! that recomputes it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::update_movement;
use crate::consts::*;
use crate::settings::PhysicsSettings;

/// Variant tag carried by every entity (drives pair dispatch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Platform,
    Collectible,
    Projectile,
}

/// Facing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit vector in screen space (y down)
    pub fn unit(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::NEG_X,
            Direction::Right => Vec2::X,
            Direction::Up => Vec2::NEG_Y,
            Direction::Down => Vec2::Y,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Discrete entity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectState {
    #[default]
    Idle,
    Moving,
    Jumping,
    Falling,
    Attacking,
    Hurt,
    Dead,
}

/// Axis-aligned bounding box in screen space (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Aabb {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Box from a top-left corner and a size
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, pos.x + size.x, pos.y + size.y)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Strict overlap; touching edges do not count
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    /// Overlap rectangle, if any
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.intersects(other) {
            return None;
        }
        Some(Aabb::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        ))
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Inclusive point containment
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// Common entity state shared by every variant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameObject {
    pub kind: EntityKind,
    /// Top-left corner
    pos: Vec2,
    size: Vec2,
    bounds: Aabb,
    /// Bounds at the start of the current step (for side probes)
    prev_bounds: Aabb,
    pub vel: Vec2,
    pub accel: Vec2,
    /// Per-axis speed caps (absolute)
    pub max_vel: Vec2,
    /// Horizontal decay coefficient; 0 disables friction and air resistance
    pub friction: f32,
    pub facing: Direction,
    pub state: ObjectState,
    pub active: bool,
    pub visible: bool,
    pub collidable: bool,
    pub grounded: bool,
    /// Whether `update` applies world gravity
    pub uses_gravity: bool,
    pub frame_index: usize,
    pub frame_timer: f32,
    pub frame_duration: f32,
    pub frame_count: usize,
}

impl GameObject {
    pub fn new(kind: EntityKind, pos: Vec2, size: Vec2) -> Self {
        let bounds = Aabb::from_pos_size(pos, size);
        Self {
            kind,
            pos,
            size,
            bounds,
            prev_bounds: bounds,
            vel: Vec2::ZERO,
            accel: Vec2::ZERO,
            max_vel: Vec2::splat(DEFAULT_MAX_SPEED),
            friction: 0.0,
            facing: Direction::Right,
            state: ObjectState::Idle,
            active: true,
            visible: true,
            collidable: true,
            grounded: false,
            uses_gravity: false,
            frame_index: 0,
            frame_timer: 0.0,
            frame_duration: FRAME_DURATION,
            frame_count: DEFAULT_FRAME_COUNT,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    #[inline]
    pub fn prev_bounds(&self) -> Aabb {
        self.prev_bounds
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Recompute the bounding box from position and size
    pub fn update_bounds(&mut self) {
        self.bounds = Aabb::from_pos_size(self.pos, self.size);
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
        self.update_bounds();
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.pos += delta;
        self.update_bounds();
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.update_bounds();
    }

    /// Move so that the box starts fresh here (no crossing history)
    pub fn teleport(&mut self, pos: Vec2) {
        self.set_position(pos);
        self.prev_bounds = self.bounds;
    }

    /// Snapshot bounds before this step's movement
    pub fn begin_step(&mut self) {
        self.prev_bounds = self.bounds;
    }

    /// Physics, then animation, then state - in that order
    pub fn update(&mut self, dt: f32, physics: &PhysicsSettings) {
        let gravity = if self.uses_gravity { physics.gravity } else { 0.0 };
        let on_ground = self.grounded || !self.uses_gravity;
        update_movement(self, dt, gravity, on_ground, physics);
        self.advance_animation(dt);
        self.refresh_state();
    }

    /// Step the animation frame once enough time has accumulated
    pub fn advance_animation(&mut self, dt: f32) {
        self.frame_timer += dt;
        if self.frame_timer >= self.frame_duration {
            self.frame_timer -= self.frame_duration;
            self.frame_index = (self.frame_index + 1) % self.frame_count.max(1);
        }
    }

    /// Derive the discrete state from velocity and the death flag
    pub fn refresh_state(&mut self) {
        if self.state == ObjectState::Dead {
            return;
        }

        if self.vel.x < 0.0 {
            self.facing = Direction::Left;
        } else if self.vel.x > 0.0 {
            self.facing = Direction::Right;
        }

        let next = if self.vel.y < 0.0 {
            ObjectState::Jumping
        } else if self.vel.y > 0.0 && !self.grounded {
            ObjectState::Falling
        } else if self.vel.x != 0.0 {
            ObjectState::Moving
        } else {
            ObjectState::Idle
        };
        self.set_state(next);
    }

    /// Change state, restarting the animation on transitions
    pub fn set_state(&mut self, state: ObjectState) {
        if self.state != state {
            self.state = state;
            self.frame_index = 0;
            self.frame_timer = 0.0;
        }
    }

    /// AABB overlap; never true when either side is non-collidable
    pub fn intersects(&self, other: &GameObject) -> bool {
        if !self.collidable || !other.collidable {
            return false;
        }
        self.bounds.intersects(&other.bounds)
    }

    #[inline]
    fn overlaps_horizontally(&self, other: &GameObject) -> bool {
        self.bounds.left < other.bounds.right && self.bounds.right > other.bounds.left
    }

    #[inline]
    fn overlaps_vertically(&self, other: &GameObject) -> bool {
        self.bounds.top < other.bounds.bottom && self.bounds.bottom > other.bounds.top
    }

    /// Our bottom edge just crossed the other's top edge (landing)
    pub fn is_collision_bottom(&self, other: &GameObject) -> bool {
        self.collidable
            && other.collidable
            && self.overlaps_horizontally(other)
            && self.bounds.bottom >= other.bounds.top
            && self.prev_bounds.bottom <= other.bounds.top
    }

    /// Our top edge just crossed the other's bottom edge (head bump)
    pub fn is_collision_top(&self, other: &GameObject) -> bool {
        self.collidable
            && other.collidable
            && self.overlaps_horizontally(other)
            && self.bounds.top <= other.bounds.bottom
            && self.prev_bounds.top >= other.bounds.bottom
    }

    /// Our left edge just crossed the other's right edge
    pub fn is_collision_left(&self, other: &GameObject) -> bool {
        self.collidable
            && other.collidable
            && self.overlaps_vertically(other)
            && self.bounds.left <= other.bounds.right
            && self.prev_bounds.left >= other.bounds.right
    }

    /// Our right edge just crossed the other's left edge
    pub fn is_collision_right(&self, other: &GameObject) -> bool {
        self.collidable
            && other.collidable
            && self.overlaps_vertically(other)
            && self.bounds.right >= other.bounds.left
            && self.prev_bounds.right <= other.bounds.left
    }

    /// Mark dead and stop colliding. Safe to call repeatedly.
    pub fn kill(&mut self) {
        self.state = ObjectState::Dead;
        self.collidable = false;
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.state == ObjectState::Dead
    }

    /// Make the object reusable (level restart) without reallocating it
    pub fn reset(&mut self) {
        self.active = true;
        self.visible = true;
        self.collidable = true;
        self.grounded = false;
        self.vel = Vec2::ZERO;
        self.accel = Vec2::ZERO;
        self.facing = Direction::Right;
        self.state = ObjectState::Idle;
        self.frame_index = 0;
        self.frame_timer = 0.0;
        self.prev_bounds = self.bounds;
    }

    /// Position and velocity are usable numbers
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.size.is_finite()
    }
}
