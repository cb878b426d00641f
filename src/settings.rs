//! Simulation tuning and loop timing
//!
//! Every field defaults to the matching constant in [`crate::consts`]; a JSON
//! file only needs to name the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// World physics parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    /// Terminal vertical speed
    pub max_fall_speed: f32,
    /// Horizontal decay rate while grounded (1/s)
    pub ground_friction: f32,
    /// Horizontal decay rate while airborne (1/s)
    pub air_resistance: f32,
    /// Speeds below this snap to zero
    pub min_movement: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,
            ground_friction: GROUND_FRICTION,
            air_resistance: AIR_RESISTANCE,
            min_movement: MIN_MOVEMENT,
        }
    }
}

impl PhysicsSettings {
    /// Same parameters with a different gravity (levels may override it)
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }
}

/// Player feel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub move_speed: f32,
    pub acceleration: f32,
    pub jump_velocity: f32,
    pub max_jump_time: f32,
    pub jump_cut: f32,
    pub stomp_bounce: f32,
    pub knockback_speed: f32,
    pub start_lives: u32,
    pub max_lives: u32,
    pub invulnerability_time: f32,
    pub blink_rate: f32,
    pub jetpack_max_fuel: f32,
    pub jetpack_drain: f32,
    pub jetpack_thrust: f32,
    pub shoot_cooldown: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            move_speed: PLAYER_MOVE_SPEED,
            acceleration: PLAYER_ACCELERATION,
            jump_velocity: PLAYER_JUMP_VELOCITY,
            max_jump_time: MAX_JUMP_TIME,
            jump_cut: JUMP_CUT,
            stomp_bounce: STOMP_BOUNCE_VELOCITY,
            knockback_speed: KNOCKBACK_SPEED,
            start_lives: START_LIVES,
            max_lives: MAX_LIVES,
            invulnerability_time: INVULNERABILITY_TIME,
            blink_rate: BLINK_RATE,
            jetpack_max_fuel: JETPACK_MAX_FUEL,
            jetpack_drain: JETPACK_DRAIN,
            jetpack_thrust: JETPACK_THRUST,
            shoot_cooldown: SHOOT_COOLDOWN,
        }
    }
}

/// Scheduler timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub target_fps: u32,
    /// Deltas are clamped to 1 / min_fps
    pub min_fps: u32,
    pub max_frame_skips: u32,
    pub pause_wait_ms: u64,
    pub stop_timeout_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            target_fps: TARGET_FPS,
            min_fps: MIN_FPS,
            max_frame_skips: MAX_FRAME_SKIPS,
            pause_wait_ms: PAUSE_WAIT_MS,
            stop_timeout_ms: STOP_JOIN_TIMEOUT_MS,
        }
    }
}

impl TimingSettings {
    /// Nominal fixed step in seconds
    pub fn frame_period(&self) -> f32 {
        1.0 / self.target_fps as f32
    }

    /// Largest delta handed to a single update
    pub fn max_delta(&self) -> f32 {
        1.0 / self.min_fps as f32
    }

    /// Frame rates must be positive and the clamp rate may not exceed the target
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 || self.min_fps == 0 {
            return Err(ConfigError::Invalid("frame rates must be positive".into()));
        }
        if self.min_fps > self.target_fps {
            return Err(ConfigError::Invalid(format!(
                "min_fps {} exceeds target_fps {}",
                self.min_fps, self.target_fps
            )));
        }
        Ok(())
    }
}

/// All tunables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsSettings,
    pub player: PlayerSettings,
    pub timing: TimingSettings,
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the scheduler or integrator cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing.validate()?;
        let p = &self.physics;
        if p.max_fall_speed <= 0.0 || p.min_movement < 0.0 {
            return Err(ConfigError::Invalid(
                "max_fall_speed must be positive and min_movement non-negative".into(),
            ));
        }
        if p.ground_friction < 0.0 || p.air_resistance < 0.0 {
            return Err(ConfigError::Invalid("friction must be non-negative".into()));
        }
        if self.player.start_lives == 0 {
            return Err(ConfigError::Invalid("start_lives must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "physics": { "gravity": 900.0 } }"#).unwrap();
        assert_eq!(settings.physics.gravity, 900.0);
        assert_eq!(settings.physics.max_fall_speed, MAX_FALL_SPEED);
        assert_eq!(settings.timing.target_fps, TARGET_FPS);
        assert_eq!(settings.player.start_lives, START_LIVES);
    }

    #[test]
    fn test_rejects_zero_fps() {
        let err = Settings::from_json(r#"{ "timing": { "target_fps": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Settings::from_json("{ physics: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_timing_derived_values() {
        let timing = TimingSettings::default();
        assert!((timing.frame_period() - 1.0 / 60.0).abs() < 1e-6);
        assert!((timing.max_delta() - 1.0 / 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_timing_rejects_min_above_target() {
        let timing = TimingSettings {
            target_fps: 30,
            min_fps: 60,
            ..TimingSettings::default()
        };
        assert!(matches!(timing.validate(), Err(ConfigError::Invalid(_))));
        assert!(TimingSettings::default().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
