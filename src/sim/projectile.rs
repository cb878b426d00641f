//! Bullets fired by the player and by shooter enemies

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::object::{Aabb, Direction, EntityKind, GameObject};
use crate::consts::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub body: GameObject,
    pub direction: Direction,
    pub from_player: bool,
    pub damage: u32,
    /// Seconds until it fizzles
    pub lifetime: f32,
    has_hit: bool,
}

impl Projectile {
    pub fn new(pos: Vec2, direction: Direction, from_player: bool) -> Self {
        let size = match direction {
            Direction::Left | Direction::Right => Vec2::new(PROJECTILE_WIDTH, PROJECTILE_HEIGHT),
            Direction::Up | Direction::Down => Vec2::new(PROJECTILE_HEIGHT, PROJECTILE_WIDTH),
        };
        let mut body = GameObject::new(EntityKind::Projectile, pos, size);
        body.facing = direction;
        body.vel = direction.unit() * PROJECTILE_SPEED;
        body.max_vel = Vec2::splat(PROJECTILE_SPEED);

        Self {
            body,
            direction,
            from_player,
            damage: PROJECTILE_DAMAGE,
            lifetime: PROJECTILE_LIFETIME,
            has_hit: false,
        }
    }

    /// Straight-line travel; no gravity, no friction
    pub fn update(&mut self, dt: f32) {
        if !self.body.active {
            return;
        }
        self.body.begin_step();
        self.body.translate(self.body.vel * dt);
        self.body.advance_animation(dt);

        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.expire();
        }
    }

    /// Latch the first hit. Returns false if it already hit something.
    pub fn register_hit(&mut self) -> bool {
        if self.has_hit {
            return false;
        }
        self.has_hit = true;
        self.expire();
        true
    }

    #[inline]
    pub fn has_hit(&self) -> bool {
        self.has_hit
    }

    /// Expire if it has left the level
    pub fn cull_outside(&mut self, level_bounds: &Aabb) {
        if !self.body.bounds().intersects(level_bounds) {
            self.expire();
        }
    }

    fn expire(&mut self) {
        self.body.active = false;
        self.body.collidable = false;
        self.body.visible = false;
    }
}
