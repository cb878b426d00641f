//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Timers driven only by the `dt` passed in
//! - Seeded RNG only
//! - Stable iteration order (collection order)
//! - No rendering or threading dependencies

pub mod collectible;
pub mod collision;
pub mod contact;
pub mod enemy;
pub mod level;
pub mod object;
pub mod physics;
pub mod platform;
pub mod player;
pub mod projectile;
pub mod state;

pub use collectible::{Collectible, CollectibleKind};
pub use collision::{CollisionResult, Surface, detect, is_grounded, resolve, sweep_test};
pub use contact::{ContactRule, contact_rule};
pub use enemy::{Enemy, EnemyKind};
pub use level::{CollectibleDef, EnemyDef, GameLevel, PlatformDef, generate_demo_level};
pub use object::{Aabb, Direction, EntityKind, GameObject, ObjectState};
pub use physics::update_movement;
pub use platform::{Axis, Platform, PlatformKind};
pub use player::{DamageOutcome, Player};
pub use projectile::Projectile;
pub use state::{GameEvent, GamePhase, GameState, Intent, time_bonus};
