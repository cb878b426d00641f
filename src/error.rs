//! Error types surfaced to the host
//!
//! Per-tick faults inside the simulation are logged and skipped; only
//! initialization, configuration and loop start/stop failures become errors.

use std::fmt;
use std::time::Duration;

/// Why a level descriptor was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum LevelError {
    /// Level has no platforms at all
    NoPlatforms,
    /// Player start lies outside the level bounds
    StartOutOfBounds { x: f32, y: f32 },
    /// Level bounds have zero or negative area
    EmptyBounds,
    /// Time limit is zero, negative or not a number
    InvalidTimeLimit(f32),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPlatforms => write!(f, "level has no platforms"),
            Self::StartOutOfBounds { x, y } => {
                write!(f, "player start ({x}, {y}) lies outside level bounds")
            }
            Self::EmptyBounds => write!(f, "level bounds are empty"),
            Self::InvalidTimeLimit(limit) => {
                write!(f, "time limit {limit} must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for LevelError {}

/// Simulation and loop lifecycle errors
#[derive(Debug)]
pub enum SimError {
    /// Player or level not ready; the game cannot start
    NotInitialized,
    /// Level descriptor failed validation
    InvalidLevel(LevelError),
    /// Loop timing cannot be scheduled
    InvalidTiming(ConfigError),
    /// Operation requires a running game but the game is over
    GameOver,
    /// The simulation thread could not be spawned
    SpawnFailed(std::io::Error),
    /// The simulation thread panicked; its state is lost
    ThreadPanicked,
    /// The simulation thread did not finish within the bounded wait
    JoinTimeout(Duration),
}

impl From<LevelError> for SimError {
    fn from(e: LevelError) -> Self {
        SimError::InvalidLevel(e)
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "game state is not initialized"),
            Self::InvalidLevel(e) => write!(f, "invalid level: {e}"),
            Self::InvalidTiming(e) => write!(f, "invalid loop timing: {e}"),
            Self::GameOver => write!(f, "game is over"),
            Self::SpawnFailed(e) => write!(f, "failed to spawn simulation thread: {e}"),
            Self::ThreadPanicked => write!(f, "simulation thread panicked"),
            Self::JoinTimeout(d) => {
                write!(f, "simulation thread did not stop within {} ms", d.as_millis())
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidLevel(e) => Some(e),
            Self::InvalidTiming(e) => Some(e),
            Self::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Settings loading errors
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid setting: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A render target refused a draw or present call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Surface(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Surface(msg) => write!(f, "render surface error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}
