//! Static, moving, hazardous, breakable and one-way platforms

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{ONE_WAY_SLOP, Surface, is_grounded};
use super::object::{EntityKind, GameObject};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    Solid,
    Moving,
    Hazard,
    Breakable,
    Passthrough,
}

/// Travel axis for moving platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

impl Axis {
    fn unit(self) -> Vec2 {
        match self {
            Axis::Horizontal => Vec2::X,
            Axis::Vertical => Vec2::Y,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub body: GameObject,
    pub kind: PlatformKind,
    /// Start of the travel span for moving platforms
    pub origin: Vec2,
    pub axis: Axis,
    /// Travel span length (moving platforms)
    pub distance: f32,
    pub speed: f32,
    /// +1 toward origin + distance, -1 back toward origin
    direction: f32,
    /// Displacement during the last update (carries riders)
    delta: Vec2,
    breaking: bool,
    break_timer: f32,
    broken: bool,
}

impl Platform {
    pub fn new(kind: PlatformKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            body: GameObject::new(EntityKind::Platform, pos, size),
            kind,
            origin: pos,
            axis: Axis::Horizontal,
            distance: 0.0,
            speed: 0.0,
            direction: 1.0,
            delta: Vec2::ZERO,
            breaking: false,
            break_timer: 0.0,
            broken: false,
        }
    }

    /// A platform oscillating between `pos` and `pos + axis * distance`
    pub fn moving(pos: Vec2, size: Vec2, axis: Axis, distance: f32, speed: f32) -> Self {
        let mut platform = Self::new(PlatformKind::Moving, pos, size);
        platform.axis = axis;
        platform.distance = distance.max(0.0);
        platform.speed = speed.abs();
        platform
    }

    pub fn update(&mut self, dt: f32) {
        self.body.begin_step();
        self.delta = Vec2::ZERO;

        match self.kind {
            PlatformKind::Moving => self.oscillate(dt),
            PlatformKind::Breakable => self.tick_break(dt),
            _ => {}
        }
    }

    fn oscillate(&mut self, dt: f32) {
        if self.distance <= 0.0 || self.speed <= 0.0 {
            return;
        }
        let unit = self.axis.unit();
        let before = self.body.pos();
        let travelled = (before - self.origin).dot(unit);

        let mut next = travelled + self.direction * self.speed * dt;
        if next >= self.distance {
            next = self.distance;
            self.direction = -1.0;
        } else if next <= 0.0 {
            next = 0.0;
            self.direction = 1.0;
        }

        // Keep the off-axis coordinate fixed at the origin's
        let pos = self.origin + unit * next;
        self.body.set_position(pos);
        self.delta = pos - before;
        self.body.vel = unit * self.direction * self.speed;
    }

    fn tick_break(&mut self, dt: f32) {
        if !self.breaking || self.broken {
            return;
        }
        self.break_timer -= dt;
        if self.break_timer <= 0.0 {
            self.broken = true;
            self.breaking = false;
            self.body.collidable = false;
            self.body.visible = false;
            self.body.active = false;
            log::debug!("Breakable platform at {:?} gave way", self.origin);
        }
    }

    /// First contact on a breakable platform starts the timer. Returns true
    /// only when the timer was started by this call.
    pub fn start_breaking(&mut self) -> bool {
        if self.kind != PlatformKind::Breakable || self.breaking || self.broken {
            return false;
        }
        self.breaking = true;
        self.break_timer = BREAK_DELAY;
        true
    }

    #[inline]
    pub fn is_breaking(&self) -> bool {
        self.breaking
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    #[inline]
    pub fn is_hazard(&self) -> bool {
        self.kind == PlatformKind::Hazard
    }

    /// Last update's displacement
    #[inline]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    /// How objects running into this platform are stopped
    pub fn surface(&self) -> Surface {
        match self.kind {
            PlatformKind::Passthrough => Surface::OneWay,
            _ => Surface::Solid,
        }
    }

    /// Whether `object` is standing on this platform
    pub fn supports(&self, object: &GameObject) -> bool {
        if !is_grounded(object, &self.body) {
            return false;
        }
        match self.kind {
            PlatformKind::Passthrough => {
                object.vel.y >= 0.0
                    && object.bounds().bottom <= self.body.bounds().top + ONE_WAY_SLOP
            }
            _ => true,
        }
    }
}
