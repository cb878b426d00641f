//! The player character
//!
//! Movement intents set horizontal acceleration; friction takes over when
//! the player stops. Jumps are an impulse sustained while the button is held
//! (up to `max_jump_time`) and cut short on release.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collectible::CollectibleKind;
use super::object::{Direction, EntityKind, GameObject, ObjectState};
use super::physics::update_movement;
use super::projectile::Projectile;
use crate::consts::*;
use crate::settings::{PhysicsSettings, PlayerSettings};

/// Outcome of a damage attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Blocked by invulnerability or already dead
    Ignored,
    /// Lost a life and became invulnerable
    Hurt,
    /// Lost the last life
    Died,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: GameObject,
    pub lives: u32,
    pub score: u64,
    pub tuning: PlayerSettings,
    /// Horizontal intent (-1, 0, 1)
    move_dir: i8,
    jump_held: bool,
    jump_timer: f32,
    pub invulnerable: bool,
    pub invulnerability_timer: f32,
    pub has_gun: bool,
    pub has_jetpack: bool,
    pub has_key: bool,
    pub jetpack_active: bool,
    pub jetpack_fuel: f32,
    shoot_cooldown: f32,
    attack_timer: f32,
    /// Set by a CROWN pickup
    pub level_complete: bool,
}

impl Player {
    pub fn new(start: Vec2, tuning: PlayerSettings, physics: &PhysicsSettings) -> Self {
        let mut body = GameObject::new(
            EntityKind::Player,
            start,
            Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
        );
        body.uses_gravity = true;
        body.friction = physics.ground_friction;
        body.max_vel = Vec2::new(tuning.move_speed, physics.max_fall_speed);

        Self {
            body,
            lives: tuning.start_lives,
            score: 0,
            tuning,
            move_dir: 0,
            jump_held: false,
            jump_timer: 0.0,
            invulnerable: false,
            invulnerability_timer: 0.0,
            has_gun: false,
            has_jetpack: false,
            has_key: false,
            jetpack_active: false,
            jetpack_fuel: 0.0,
            shoot_cooldown: 0.0,
            attack_timer: 0.0,
            level_complete: false,
        }
    }

    pub fn move_left(&mut self) {
        self.move_dir = -1;
        self.body.facing = Direction::Left;
    }

    pub fn move_right(&mut self) {
        self.move_dir = 1;
        self.body.facing = Direction::Right;
    }

    pub fn stop_moving(&mut self) {
        self.move_dir = 0;
    }

    /// Start a jump if standing on something. Returns true if it started.
    pub fn jump(&mut self) -> bool {
        if !self.body.grounded || self.body.is_dead() {
            return false;
        }
        self.body.vel.y = self.tuning.jump_velocity;
        self.body.grounded = false;
        self.jump_held = true;
        self.jump_timer = 0.0;
        true
    }

    /// Jump button released: stop sustaining and cut the rise
    pub fn release_jump(&mut self) {
        if self.jump_held && self.body.vel.y < 0.0 {
            self.body.vel.y *= self.tuning.jump_cut;
        }
        self.jump_held = false;
    }

    /// Stop sustaining without cutting (head bump, stomp)
    pub fn end_jump(&mut self) {
        self.jump_held = false;
    }

    pub fn is_jumping(&self) -> bool {
        self.jump_held
    }

    /// Toggle the jetpack; needs the pickup and some fuel
    pub fn toggle_jetpack(&mut self) -> bool {
        if self.jetpack_active {
            self.jetpack_active = false;
        } else if self.has_jetpack && self.jetpack_fuel > 0.0 {
            self.jetpack_active = true;
        }
        self.jetpack_active
    }

    /// Fire in the facing direction if armed and off cooldown
    pub fn shoot(&mut self) -> Option<Projectile> {
        if !self.has_gun || self.shoot_cooldown > 0.0 || self.body.is_dead() {
            return None;
        }
        self.shoot_cooldown = self.tuning.shoot_cooldown;
        self.attack_timer = ATTACK_TIME;

        let dir = match self.body.facing {
            Direction::Left => Direction::Left,
            _ => Direction::Right,
        };
        let b = self.body.bounds();
        let muzzle_x = match dir {
            Direction::Left => b.left - PROJECTILE_WIDTH,
            _ => b.right,
        };
        let muzzle = Vec2::new(muzzle_x, b.center().y - PROJECTILE_HEIGHT * 0.5);
        Some(Projectile::new(muzzle, dir, true))
    }

    pub fn update(&mut self, dt: f32, physics: &PhysicsSettings) {
        if self.body.is_dead() {
            return;
        }

        self.tick_timers(dt);

        // Horizontal drive
        self.body.accel.x = self.move_dir as f32 * self.tuning.acceleration;
        if self.move_dir != 0 && self.body.vel.x * self.move_dir as f32 <= 0.0 {
            // Turning around: drop the opposing speed immediately
            self.body.vel.x = 0.0;
        }

        // Sustained jump
        if self.jump_held {
            self.jump_timer += dt;
            if self.jump_timer < self.tuning.max_jump_time {
                self.body.vel.y = self.tuning.jump_velocity;
            } else {
                self.jump_held = false;
            }
        }

        let mut gravity = physics.gravity;
        let mut on_ground = self.body.grounded;
        if self.jetpack_active {
            gravity *= 0.5;
            on_ground = false;
            self.body.vel.y -= self.tuning.jetpack_thrust * dt;
            self.jetpack_fuel = (self.jetpack_fuel - self.tuning.jetpack_drain * dt).max(0.0);
            if self.jetpack_fuel <= 0.0 {
                self.jetpack_active = false;
                log::debug!("Jetpack out of fuel");
            }
        }

        update_movement(&mut self.body, dt, gravity, on_ground, physics);
        self.body.advance_animation(dt);
        self.body.refresh_state();

        if self.invulnerable && self.invulnerability_timer > self.tuning.invulnerability_time * 0.5
        {
            self.body.set_state(ObjectState::Hurt);
        } else if self.attack_timer > 0.0 {
            self.body.set_state(ObjectState::Attacking);
        }
    }

    fn tick_timers(&mut self, dt: f32) {
        if self.invulnerable {
            self.invulnerability_timer -= dt;
            if self.invulnerability_timer <= 0.0 {
                self.invulnerability_timer = 0.0;
                self.invulnerable = false;
            }
        }
        self.shoot_cooldown = (self.shoot_cooldown - dt).max(0.0);
        self.attack_timer = (self.attack_timer - dt).max(0.0);
    }

    /// Take a hit from `source_x` (knockback pushes away from it)
    pub fn take_damage(&mut self, source_x: f32) -> DamageOutcome {
        if self.invulnerable || self.body.is_dead() {
            return DamageOutcome::Ignored;
        }
        self.lose_life();
        if self.body.is_dead() {
            return DamageOutcome::Died;
        }

        self.invulnerable = true;
        self.invulnerability_timer = self.tuning.invulnerability_time;
        self.jump_held = false;
        let away = if self.body.center().x < source_x { -1.0 } else { 1.0 };
        self.body.vel.x = away * self.tuning.knockback_speed;
        self.body.vel.y = self.tuning.jump_velocity * 0.5;
        self.body.grounded = false;
        self.body.set_state(ObjectState::Hurt);
        DamageOutcome::Hurt
    }

    /// Lose a life regardless of invulnerability (pits, time-outs)
    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.body.kill();
            self.body.vel = Vec2::ZERO;
            self.jetpack_active = false;
        }
    }

    /// Stomp rebound off an enemy
    pub fn bounce(&mut self) {
        self.body.vel.y = self.tuning.stomp_bounce;
        self.body.grounded = false;
        self.jump_held = false;
    }

    /// Apply a pickup's secondary effect
    pub fn apply_pickup(&mut self, kind: CollectibleKind) {
        match kind {
            CollectibleKind::Trophy => {}
            CollectibleKind::Gun => self.has_gun = true,
            CollectibleKind::ExtraLife => {
                self.lives = (self.lives + 1).min(self.tuning.max_lives);
            }
            CollectibleKind::Jetpack => {
                self.has_jetpack = true;
                self.jetpack_fuel = self.tuning.jetpack_max_fuel;
            }
            CollectibleKind::Key => self.has_key = true,
            CollectibleKind::Crown => self.level_complete = true,
        }
    }

    pub fn add_score(&mut self, points: u64) {
        self.score += points;
    }

    /// Whether to draw this frame (blinks while invulnerable)
    pub fn blink_visible(&self) -> bool {
        if !self.invulnerable {
            return true;
        }
        let phase = (self.invulnerability_timer * self.tuning.blink_rate) as u32;
        phase % 2 == 0
    }

    /// Reuse for a level start: move to `start`, clear motion and per-level
    /// flags. Lives, score and inventory carry over.
    pub fn reset(&mut self, start: Vec2) {
        self.body.set_position(start);
        self.body.reset();
        self.move_dir = 0;
        self.jump_held = false;
        self.jump_timer = 0.0;
        self.invulnerable = false;
        self.invulnerability_timer = 0.0;
        self.jetpack_active = false;
        self.shoot_cooldown = 0.0;
        self.attack_timer = 0.0;
        self.has_key = false;
        self.level_complete = false;
    }

    /// Put back at `start` after losing a life mid-level
    pub fn respawn(&mut self, start: Vec2) {
        self.body.teleport(start);
        self.body.vel = Vec2::ZERO;
        self.body.grounded = false;
        self.jump_held = false;
        self.jetpack_active = false;
        self.invulnerable = true;
        self.invulnerability_timer = self.tuning.invulnerability_time;
    }
}
