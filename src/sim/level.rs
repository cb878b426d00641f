//! Level descriptors
//!
//! A [`GameLevel`] is an already-parsed value object. The simulation copies
//! entities out of it on every load, so the descriptor itself is never
//! mutated and a restart always sees the original layout.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collectible::{Collectible, CollectibleKind};
use super::enemy::{Enemy, EnemyKind};
use super::object::Aabb;
use super::platform::{Axis, Platform, PlatformKind};
use crate::consts::*;
use crate::error::LevelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDef {
    pub kind: PlatformKind,
    pub pos: Vec2,
    pub size: Vec2,
    /// Moving platforms only
    #[serde(default)]
    pub axis: Axis,
    #[serde(default)]
    pub distance: f32,
    #[serde(default)]
    pub speed: f32,
}

impl PlatformDef {
    pub fn new(kind: PlatformKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            pos,
            size,
            axis: Axis::Horizontal,
            distance: 0.0,
            speed: 0.0,
        }
    }

    pub fn moving(pos: Vec2, size: Vec2, axis: Axis, distance: f32) -> Self {
        Self {
            kind: PlatformKind::Moving,
            pos,
            size,
            axis,
            distance,
            speed: MOVING_PLATFORM_SPEED,
        }
    }

    pub fn build(&self) -> Platform {
        match self.kind {
            PlatformKind::Moving => {
                Platform::moving(self.pos, self.size, self.axis, self.distance, self.speed)
            }
            kind => Platform::new(kind, self.pos, self.size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub kind: EnemyKind,
    pub pos: Vec2,
    #[serde(default = "default_patrol")]
    pub patrol_distance: f32,
}

fn default_patrol() -> f32 {
    DEFAULT_PATROL_DISTANCE
}

impl EnemyDef {
    pub fn build(&self) -> Enemy {
        Enemy::new(self.kind, self.pos, self.patrol_distance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectibleDef {
    pub kind: CollectibleKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLevel {
    pub id: u32,
    pub name: String,
    pub player_start: Vec2,
    pub platforms: Vec<PlatformDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub collectibles: Vec<CollectibleDef>,
    pub bounds: Aabb,
    /// Score needed before trophies can finish the level
    #[serde(default)]
    pub required_score: Option<u64>,
    /// Seconds allowed per attempt
    #[serde(default)]
    pub time_limit: Option<f32>,
    /// Overrides the world gravity
    #[serde(default)]
    pub gravity: Option<f32>,
    #[serde(default)]
    pub background: Option<String>,
}

impl GameLevel {
    pub fn new(id: u32, name: impl Into<String>, player_start: Vec2, bounds: Aabb) -> Self {
        Self {
            id,
            name: name.into(),
            player_start,
            platforms: Vec::new(),
            enemies: Vec::new(),
            collectibles: Vec::new(),
            bounds,
            required_score: None,
            time_limit: None,
            gravity: None,
            background: None,
        }
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.bounds.is_empty() {
            return Err(LevelError::EmptyBounds);
        }
        if self.platforms.is_empty() {
            return Err(LevelError::NoPlatforms);
        }
        if !self.bounds.contains_point(self.player_start) {
            return Err(LevelError::StartOutOfBounds {
                x: self.player_start.x,
                y: self.player_start.y,
            });
        }
        if let Some(limit) = self.time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(LevelError::InvalidTimeLimit(limit));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn spawn_platforms(&self) -> Vec<Platform> {
        self.platforms.iter().map(PlatformDef::build).collect()
    }

    pub fn spawn_enemies(&self) -> Vec<Enemy> {
        self.enemies.iter().map(EnemyDef::build).collect()
    }

    /// Neighbouring pickups get staggered float phases
    pub fn spawn_collectibles(&self) -> Vec<Collectible> {
        self.collectibles
            .iter()
            .enumerate()
            .map(|(i, def)| Collectible::with_phase(def.kind, def.pos, i as f32 * 0.7))
            .collect()
    }

    pub fn trophy_count(&self) -> usize {
        self.collectibles
            .iter()
            .filter(|c| c.kind == CollectibleKind::Trophy)
            .count()
    }
}

const DEMO_WIDTH: f32 = 1600.0;
const DEMO_HEIGHT: f32 = 600.0;
const DEMO_FLOOR_HEIGHT: f32 = 40.0;
const DEMO_LEDGES: usize = 6;

/// Build a playable level from a seed (same seed, same layout)
pub fn generate_demo_level(seed: u64) -> GameLevel {
    let mut rng = Pcg32::seed_from_u64(seed);
    let floor_top = DEMO_HEIGHT - DEMO_FLOOR_HEIGHT;

    let mut level = GameLevel::new(
        (seed % 1000) as u32 + 1,
        format!("Demo {seed}"),
        Vec2::new(64.0, floor_top - PLAYER_HEIGHT - 32.0),
        Aabb::new(0.0, 0.0, DEMO_WIDTH, DEMO_HEIGHT),
    );
    level.background = Some("sky".into());

    level.platforms.push(PlatformDef::new(
        PlatformKind::Solid,
        Vec2::new(0.0, floor_top),
        Vec2::new(DEMO_WIDTH, DEMO_FLOOR_HEIGHT),
    ));

    // Ledges stepping across the level, each holding a trophy
    let step = (DEMO_WIDTH - 320.0) / DEMO_LEDGES as f32;
    for i in 0..DEMO_LEDGES {
        let x = 200.0 + i as f32 * step + rng.random_range(0.0..step * 0.3);
        let y = floor_top - rng.random_range(110.0..260.0);
        let width = rng.random_range(96.0..176.0);
        let size = Vec2::new(width, 16.0);
        let pos = Vec2::new(x, y);

        let def = match rng.random_range(0..4u32) {
            0 => PlatformDef::new(PlatformKind::Passthrough, pos, size),
            1 => PlatformDef::new(PlatformKind::Breakable, pos, size),
            2 => PlatformDef::moving(pos, size, Axis::Horizontal, rng.random_range(48.0..96.0)),
            _ => PlatformDef::new(PlatformKind::Solid, pos, size),
        };
        level.platforms.push(def);

        level.collectibles.push(CollectibleDef {
            kind: CollectibleKind::Trophy,
            pos: Vec2::new(x + width * 0.5 - COLLECTIBLE_SIZE * 0.5, y - COLLECTIBLE_SIZE - 12.0),
        });
    }

    // Spikes on the floor between the first ledges
    let spike_x = 200.0 + step * rng.random_range(0.5..1.5);
    level.platforms.push(PlatformDef::new(
        PlatformKind::Hazard,
        Vec2::new(spike_x, floor_top - 12.0),
        Vec2::new(48.0, 12.0),
    ));

    let ground_y = floor_top - ENEMY_SIZE;
    level.enemies.push(EnemyDef {
        kind: EnemyKind::Walker,
        pos: Vec2::new(rng.random_range(400.0..600.0), ground_y),
        patrol_distance: rng.random_range(96.0..192.0),
    });
    level.enemies.push(EnemyDef {
        kind: EnemyKind::Jumper,
        pos: Vec2::new(rng.random_range(800.0..1000.0), ground_y),
        patrol_distance: 0.0,
    });
    level.enemies.push(EnemyDef {
        kind: EnemyKind::Shooter,
        pos: Vec2::new(DEMO_WIDTH - 96.0, ground_y),
        patrol_distance: 0.0,
    });
    level.enemies.push(EnemyDef {
        kind: EnemyKind::Flyer,
        pos: Vec2::new(rng.random_range(600.0..1100.0), rng.random_range(120.0..220.0)),
        patrol_distance: 160.0,
    });

    let pickup_y = floor_top - COLLECTIBLE_SIZE - 8.0;
    level.collectibles.push(CollectibleDef {
        kind: CollectibleKind::Gun,
        pos: Vec2::new(150.0, pickup_y),
    });
    level.collectibles.push(CollectibleDef {
        kind: CollectibleKind::Jetpack,
        pos: Vec2::new(rng.random_range(650.0..750.0), pickup_y),
    });
    level.collectibles.push(CollectibleDef {
        kind: CollectibleKind::ExtraLife,
        pos: Vec2::new(rng.random_range(1100.0..1300.0), pickup_y),
    });

    log::info!(
        "Generated demo level {} ({} platforms, {} enemies, {} trophies)",
        level.id,
        level.platforms.len(),
        level.enemies.len(),
        level.trophy_count()
    );
    level
}
