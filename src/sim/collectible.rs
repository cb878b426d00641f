//! Pickups: trophies, power-ups and the level-ending crown

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::object::{EntityKind, GameObject};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    Trophy,
    Gun,
    ExtraLife,
    Jetpack,
    Key,
    Crown,
}

impl CollectibleKind {
    /// Fixed score for picking this up
    pub fn points(self) -> u64 {
        match self {
            CollectibleKind::Trophy => 100,
            CollectibleKind::Gun => 50,
            CollectibleKind::ExtraLife => 200,
            CollectibleKind::Jetpack => 50,
            CollectibleKind::Key => 150,
            CollectibleKind::Crown => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub body: GameObject,
    pub kind: CollectibleKind,
    /// Resting height the float oscillates around
    base_y: f32,
    float_phase: f32,
    collected: bool,
    /// Seconds since collection (animation clock)
    collect_timer: f32,
}

impl Collectible {
    pub fn new(kind: CollectibleKind, pos: Vec2) -> Self {
        Self::with_phase(kind, pos, 0.0)
    }

    /// Start the float at a given phase so neighbours don't bob in sync
    pub fn with_phase(kind: CollectibleKind, pos: Vec2, phase: f32) -> Self {
        let body = GameObject::new(
            EntityKind::Collectible,
            pos,
            Vec2::splat(COLLECTIBLE_SIZE),
        );
        Self {
            body,
            kind,
            base_y: pos.y,
            float_phase: phase,
            collected: false,
            collect_timer: 0.0,
        }
    }

    #[inline]
    pub fn points(&self) -> u64 {
        self.kind.points()
    }

    #[inline]
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Mark collected. Only the first call counts.
    pub fn collect(&mut self) -> bool {
        if self.collected {
            return false;
        }
        self.collected = true;
        self.collect_timer = 0.0;
        self.body.collidable = false;
        true
    }

    pub fn update(&mut self, dt: f32) {
        if !self.body.active {
            return;
        }
        self.body.begin_step();
        self.body.advance_animation(dt);

        if self.collected {
            self.collect_timer += dt;
            let rise = self.collect_timer.min(COLLECT_ANIMATION_TIME) * COLLECT_RISE_SPEED;
            let x = self.body.x();
            self.body.set_position(Vec2::new(x, self.base_y - rise));
            if self.collect_timer >= COLLECT_ANIMATION_TIME {
                self.body.visible = false;
                self.body.collidable = false;
                self.body.active = false;
            }
        } else {
            self.float_phase = (self.float_phase + FLOAT_SPEED * dt) % std::f32::consts::TAU;
            let x = self.body.x();
            let y = self.base_y + self.float_phase.sin() * FLOAT_AMPLITUDE;
            self.body.set_position(Vec2::new(x, y));
        }
    }

    /// Collection animation progress (0 = just collected, 1 = gone)
    pub fn collect_progress(&self) -> f32 {
        if !self.collected {
            return 0.0;
        }
        (self.collect_timer / COLLECT_ANIMATION_TIME).clamp(0.0, 1.0)
    }

    /// Draw scale (shrinks while collecting)
    pub fn scale(&self) -> f32 {
        1.0 - self.collect_progress()
    }

    /// Draw opacity (fades while collecting)
    pub fn alpha(&self) -> f32 {
        1.0 - self.collect_progress()
    }

    /// Animation finished; safe to drop
    pub fn is_finished(&self) -> bool {
        self.collected && !self.body.visible
    }
}
