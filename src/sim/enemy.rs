//! Enemy behaviors
//!
//! Each kind has its own movement law: walkers patrol a fixed span, flyers
//! trace a closed-form path around their spawn point, shooters stand still
//! and fire on a timer, jumpers hop on a timer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::object::{Direction, EntityKind, GameObject, ObjectState};
use super::projectile::Projectile;
use crate::consts::*;
use crate::settings::PhysicsSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Walker,
    Flyer,
    Shooter,
    Jumper,
}

impl EnemyKind {
    /// Score for defeating this kind
    pub fn points(self) -> u64 {
        match self {
            EnemyKind::Walker => 100,
            EnemyKind::Flyer => 150,
            EnemyKind::Shooter => 200,
            EnemyKind::Jumper => 150,
        }
    }

    pub fn hit_points(self) -> u32 {
        match self {
            EnemyKind::Shooter => 2,
            _ => 1,
        }
    }

    /// Walks on platforms (takes part in platform and body collisions)
    pub fn is_grounded_kind(self) -> bool {
        !matches!(self, EnemyKind::Flyer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub body: GameObject,
    pub kind: EnemyKind,
    /// Spawn point (patrol start / flight center)
    pub origin: Vec2,
    pub patrol_distance: f32,
    pub health: u32,
    /// Shoot or jump timer, depending on kind
    action_timer: f32,
    flight_phase: f32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, pos: Vec2, patrol_distance: f32) -> Self {
        let mut body = GameObject::new(EntityKind::Enemy, pos, Vec2::splat(ENEMY_SIZE));
        body.max_vel = Vec2::new(ENEMY_MAX_SPEED, MAX_FALL_SPEED);
        body.uses_gravity = kind.is_grounded_kind();
        // Walkers set their speed every tick; jumpers and shooters skid to a stop
        body.friction = match kind {
            EnemyKind::Walker | EnemyKind::Flyer => 0.0,
            EnemyKind::Shooter | EnemyKind::Jumper => GROUND_FRICTION,
        };

        Self {
            body,
            kind,
            origin: pos,
            patrol_distance: patrol_distance.max(0.0),
            health: kind.hit_points(),
            action_timer: 0.0,
            flight_phase: 0.0,
        }
    }

    #[inline]
    pub fn points(&self) -> u64 {
        self.kind.points()
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.body.is_dead()
    }

    /// Advance one tick. Shooters may hand back a projectile to spawn.
    pub fn update(
        &mut self,
        dt: f32,
        physics: &PhysicsSettings,
        player_center: Option<Vec2>,
    ) -> Option<Projectile> {
        if !self.is_alive() || !self.body.active {
            return None;
        }

        match self.kind {
            EnemyKind::Walker => {
                self.patrol(dt, physics);
                None
            }
            EnemyKind::Flyer => {
                self.fly(dt);
                None
            }
            EnemyKind::Shooter => self.guard(dt, physics, player_center),
            EnemyKind::Jumper => {
                self.hop(dt, physics);
                None
            }
        }
    }

    fn patrol(&mut self, dt: f32, physics: &PhysicsSettings) {
        let dir = match self.body.facing {
            Direction::Left => -1.0,
            _ => 1.0,
        };
        self.body.vel.x = dir * WALKER_SPEED;
        self.body.update(dt, physics);

        let min_x = self.origin.x;
        let max_x = self.origin.x + self.patrol_distance;
        let y = self.body.y();
        if dir < 0.0 && self.body.x() <= min_x {
            self.body.set_position(Vec2::new(min_x, y));
            self.reverse();
        } else if dir > 0.0 && self.body.x() >= max_x {
            self.body.set_position(Vec2::new(max_x, y));
            self.reverse();
        }
    }

    fn fly(&mut self, dt: f32) {
        self.body.begin_step();
        self.flight_phase = (self.flight_phase + FLYER_FREQUENCY * dt) % std::f32::consts::TAU;
        let offset = Vec2::new(
            self.flight_phase.sin() * self.patrol_distance * 0.5,
            (self.flight_phase * 2.0).sin() * FLYER_AMPLITUDE,
        );
        self.body.set_position(self.origin + offset);

        // d(sin)/dphase = cos: heading right while cos > 0
        self.body.facing = if self.flight_phase.cos() >= 0.0 {
            Direction::Right
        } else {
            Direction::Left
        };
        self.body.advance_animation(dt);
        self.body.set_state(ObjectState::Moving);
    }

    fn guard(
        &mut self,
        dt: f32,
        physics: &PhysicsSettings,
        player_center: Option<Vec2>,
    ) -> Option<Projectile> {
        self.body.update(dt, physics);
        if let Some(target) = player_center {
            self.body.facing = if target.x < self.body.center().x {
                Direction::Left
            } else {
                Direction::Right
            };
        }

        self.action_timer += dt;
        if self.action_timer < SHOOT_INTERVAL {
            return None;
        }
        self.action_timer -= SHOOT_INTERVAL;
        self.body.set_state(ObjectState::Attacking);

        let b = self.body.bounds();
        let x = match self.body.facing {
            Direction::Left => b.left - PROJECTILE_WIDTH,
            _ => b.right,
        };
        let muzzle = Vec2::new(x, b.center().y - PROJECTILE_HEIGHT * 0.5);
        let dir = match self.body.facing {
            Direction::Left => Direction::Left,
            _ => Direction::Right,
        };
        Some(Projectile::new(muzzle, dir, false))
    }

    fn hop(&mut self, dt: f32, physics: &PhysicsSettings) {
        self.action_timer += dt;
        if self.body.grounded && self.action_timer >= JUMP_INTERVAL {
            self.body.vel.y = JUMPER_JUMP_VELOCITY;
            self.body.grounded = false;
            self.action_timer = 0.0;
        }
        self.body.update(dt, physics);
    }

    /// Turn around (patrol bound or wall)
    pub fn reverse(&mut self) {
        self.body.facing = self.body.facing.opposite();
        self.body.vel.x = -self.body.vel.x;
    }

    /// Ran into a wall sideways
    pub fn on_wall_hit(&mut self) {
        if self.kind == EnemyKind::Walker {
            self.reverse();
        }
    }

    /// Apply damage. Returns true if this hit killed it.
    pub fn take_hit(&mut self, damage: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = self.health.saturating_sub(damage);
        if self.health == 0 {
            self.body.kill();
            true
        } else {
            self.body.set_state(ObjectState::Hurt);
            false
        }
    }
}
