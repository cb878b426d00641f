//! Trophy Dash - simulation core for a 2D platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, physics, collisions, game state)
//! - `game_loop`: Fixed timestep scheduler thread with frame-skip catch-up
//! - `render`: Render target boundary and asset registry
//! - `settings`: Data-driven tuning, loadable from JSON
//! - `error`: Error types surfaced to the host

pub mod error;
pub mod game_loop;
pub mod render;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, LevelError, RenderError, SimError};
pub use game_loop::{Clock, FramePacer, GameLoop, LoopRunner, SystemClock};
pub use render::{AssetRegistry, DrawCommand, RenderSurface};
pub use settings::Settings;

/// Game configuration constants (defaults for [`Settings`])
pub mod consts {
    /// Target simulation rate
    pub const TARGET_FPS: u32 = 60;
    /// Nominal frame period in seconds
    pub const FRAME_PERIOD: f32 = 1.0 / TARGET_FPS as f32;
    /// Lowest rate we integrate at; deltas are clamped to 1 / MIN_FPS
    pub const MIN_FPS: u32 = 30;
    /// Maximum catch-up updates per iteration when running behind
    pub const MAX_FRAME_SKIPS: u32 = 5;
    /// Wait slice while paused (ms)
    pub const PAUSE_WAIT_MS: u64 = 50;
    /// Bounded wait when joining the simulation thread (ms)
    pub const STOP_JOIN_TIMEOUT_MS: u64 = 1000;
    /// Events held for the host before new ones are dropped
    pub const EVENT_QUEUE_CAPACITY: usize = 1024;

    /// World physics (pixels, seconds; y grows downward)
    pub const GRAVITY: f32 = 1200.0;
    pub const MAX_FALL_SPEED: f32 = 900.0;
    /// Fraction of horizontal speed removed per second on the ground
    pub const GROUND_FRICTION: f32 = 8.0;
    /// Fraction of horizontal speed removed per second in the air
    pub const AIR_RESISTANCE: f32 = 1.5;
    /// Horizontal speeds below this snap to zero
    pub const MIN_MOVEMENT: f32 = 5.0;
    /// Velocity cap for objects that don't configure their own
    pub const DEFAULT_MAX_SPEED: f32 = 1000.0;
    /// Thickness of the ground probe below an object
    pub const GROUND_PROBE_HEIGHT: f32 = 2.0;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 32.0;
    pub const PLAYER_HEIGHT: f32 = 48.0;
    /// Top horizontal run speed
    pub const PLAYER_MOVE_SPEED: f32 = 220.0;
    /// Horizontal acceleration while a move intent is held
    pub const PLAYER_ACCELERATION: f32 = 1800.0;
    pub const PLAYER_JUMP_VELOCITY: f32 = -520.0;
    /// How long a held jump keeps its impulse
    pub const MAX_JUMP_TIME: f32 = 0.25;
    /// Upward speed multiplier when jump is released early
    pub const JUMP_CUT: f32 = 0.5;
    pub const STOMP_BOUNCE_VELOCITY: f32 = -350.0;
    pub const KNOCKBACK_SPEED: f32 = 180.0;
    pub const START_LIVES: u32 = 3;
    pub const MAX_LIVES: u32 = 9;
    pub const INVULNERABILITY_TIME: f32 = 2.0;
    /// Blink toggles per second while invulnerable
    pub const BLINK_RATE: f32 = 10.0;
    pub const JETPACK_MAX_FUEL: f32 = 100.0;
    /// Fuel units per second
    pub const JETPACK_DRAIN: f32 = 25.0;
    pub const JETPACK_THRUST: f32 = 900.0;
    pub const SHOOT_COOLDOWN: f32 = 0.35;
    /// Duration of the ATTACKING state after a shot
    pub const ATTACK_TIME: f32 = 0.15;

    /// Enemy defaults
    pub const ENEMY_SIZE: f32 = 32.0;
    pub const ENEMY_MAX_SPEED: f32 = 600.0;
    pub const WALKER_SPEED: f32 = 60.0;
    pub const DEFAULT_PATROL_DISTANCE: f32 = 128.0;
    /// Flyer path angular speed (radians per second)
    pub const FLYER_FREQUENCY: f32 = 1.5;
    pub const FLYER_AMPLITUDE: f32 = 24.0;
    pub const SHOOT_INTERVAL: f32 = 2.0;
    pub const JUMP_INTERVAL: f32 = 1.5;
    pub const JUMPER_JUMP_VELOCITY: f32 = -450.0;

    /// Platform defaults
    pub const MOVING_PLATFORM_SPEED: f32 = 60.0;
    /// Delay between first contact and a breakable platform vanishing
    pub const BREAK_DELAY: f32 = 0.5;

    /// Collectible defaults
    pub const COLLECTIBLE_SIZE: f32 = 24.0;
    pub const FLOAT_AMPLITUDE: f32 = 4.0;
    /// Float phase speed (radians per second)
    pub const FLOAT_SPEED: f32 = 3.0;
    pub const COLLECT_ANIMATION_TIME: f32 = 0.5;
    pub const COLLECT_RISE_SPEED: f32 = 40.0;

    /// Projectile defaults
    pub const PROJECTILE_WIDTH: f32 = 12.0;
    pub const PROJECTILE_HEIGHT: f32 = 6.0;
    pub const PROJECTILE_SPEED: f32 = 420.0;
    pub const PROJECTILE_LIFETIME: f32 = 2.0;
    pub const PROJECTILE_DAMAGE: u32 = 1;

    /// Animation defaults
    pub const FRAME_DURATION: f32 = 0.1;
    pub const DEFAULT_FRAME_COUNT: usize = 4;

    /// Level-clear time bonus tiers: (elapsed seconds below, bonus)
    pub const TIME_BONUS_TIERS: [(f32, u64); 3] = [(30.0, 1000), (60.0, 500), (120.0, 250)];
}
