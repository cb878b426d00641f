//! Render target boundary
//!
//! The simulation never talks to a graphics API. It turns its entities into
//! [`DrawCommand`]s and hands them to whatever implements [`RenderSurface`].
//! Images come from an explicitly owned [`AssetRegistry`]; when a sprite has
//! no frames registered the command carries no frame and the surface draws a
//! debug box in the command's tint instead.

use std::collections::HashMap;

use crate::error::RenderError;
use crate::sim::collectible::CollectibleKind;
use crate::sim::enemy::EnemyKind;
use crate::sim::object::{Aabb, ObjectState};
use crate::sim::platform::PlatformKind;

/// Opaque image handle owned by the host's texture provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u32);

/// Which sprite sheet an entity uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteId {
    Player,
    Enemy(EnemyKind),
    Platform(PlatformKind),
    Collectible(CollectibleKind),
    Projectile { from_player: bool },
}

impl SpriteId {
    /// Flat colour for the debug shape
    pub fn debug_color(self) -> [f32; 3] {
        match self {
            SpriteId::Player => [0.2, 0.6, 1.0],
            SpriteId::Enemy(EnemyKind::Walker) => [0.9, 0.3, 0.2],
            SpriteId::Enemy(EnemyKind::Flyer) => [0.8, 0.4, 0.9],
            SpriteId::Enemy(EnemyKind::Shooter) => [1.0, 0.5, 0.1],
            SpriteId::Enemy(EnemyKind::Jumper) => [0.9, 0.8, 0.2],
            SpriteId::Platform(PlatformKind::Hazard) => [1.0, 0.1, 0.1],
            SpriteId::Platform(PlatformKind::Breakable) => [0.6, 0.45, 0.3],
            SpriteId::Platform(PlatformKind::Passthrough) => [0.5, 0.7, 0.5],
            SpriteId::Platform(_) => [0.45, 0.45, 0.5],
            SpriteId::Collectible(CollectibleKind::Trophy) => [1.0, 0.85, 0.1],
            SpriteId::Collectible(CollectibleKind::Crown) => [1.0, 0.95, 0.5],
            SpriteId::Collectible(_) => [0.3, 0.9, 0.6],
            SpriteId::Projectile { from_player: true } => [1.0, 1.0, 0.6],
            SpriteId::Projectile { from_player: false } => [1.0, 0.3, 0.6],
        }
    }
}

/// Animation lookup key: sprite sheet plus entity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationKey {
    pub sprite: SpriteId,
    pub state: ObjectState,
}

impl AnimationKey {
    pub fn new(sprite: SpriteId, state: ObjectState) -> Self {
        Self { sprite, state }
    }
}

/// Frame sequences per animation key
///
/// Loaded once per level by the host and released at teardown.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    animations: HashMap<AnimationKey, Vec<FrameHandle>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: AnimationKey, frames: Vec<FrameHandle>) {
        self.animations.insert(key, frames);
    }

    /// Frames for `key`, falling back to the sprite's idle frames. Missing
    /// sprites yield an empty slice.
    pub fn frames(&self, key: AnimationKey) -> &[FrameHandle] {
        self.animations
            .get(&key)
            .or_else(|| {
                self.animations
                    .get(&AnimationKey::new(key.sprite, ObjectState::Idle))
            })
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Frame to show for an animation at `index` (wraps)
    pub fn frame(&self, key: AnimationKey, index: usize) -> Option<FrameHandle> {
        let frames = self.frames(key);
        if frames.is_empty() {
            None
        } else {
            Some(frames[index % frames.len()])
        }
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Drop everything (level teardown)
    pub fn release(&mut self) {
        log::debug!("Releasing {} animations", self.animations.len());
        self.animations.clear();
    }
}

/// One sprite (or debug box) to draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub sprite: SpriteId,
    pub rect: Aabb,
    /// `None` when no frames are registered
    pub frame: Option<FrameHandle>,
    pub flip_x: bool,
    /// Debug tint with opacity in the last channel
    pub color: [f32; 4],
}

impl DrawCommand {
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.color[3]
    }
}

/// Whatever the host draws into
pub trait RenderSurface {
    fn draw(&mut self, command: &DrawCommand) -> Result<(), RenderError>;

    /// Called once after all commands of a frame
    fn present(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}
