//! Game state and the per-tick simulation driver
//!
//! Everything that must survive a snapshot lives in [`GameState`]. Only this
//! module adds or removes entities; removal happens in the cleanup phase at
//! the end of a tick, never while entities are being updated or collided.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collectible::{Collectible, CollectibleKind};
use super::contact::{self, COLLISION_PASSES, ContactRule, contact_rule};
use super::enemy::{Enemy, EnemyKind};
use super::level::GameLevel;
use super::object::{Aabb, Direction, GameObject};
use super::platform::Platform;
use super::player::Player;
use super::projectile::Projectile;
use crate::consts::TIME_BONUS_TIERS;
use crate::error::{LevelError, RenderError, SimError};
use crate::render::{AnimationKey, AssetRegistry, DrawCommand, RenderSurface, SpriteId};
use crate::settings::{PhysicsSettings, Settings};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No player or level yet
    Uninitialized,
    /// Level loaded, waiting for `start`
    Ready,
    Running,
    Paused,
    /// Out of lives
    GameOver,
}

/// Things that happened during a tick, for audio and UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Jumped,
    Collected { kind: CollectibleKind, points: u64 },
    PlayerHurt { lives: u32 },
    PlayerDied,
    EnemyKilled { kind: EnemyKind, points: u64 },
    ProjectileFired { from_player: bool },
    PlatformBroke,
    LevelCompleted { time: f32, bonus: u64 },
    GameOver { score: u64 },
}

/// Discrete player input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    Stop,
    Jump,
    ReleaseJump,
    Shoot,
    ToggleJetpack,
}

/// Completion bonus for finishing a level in `elapsed` seconds
pub fn time_bonus(elapsed: f32) -> u64 {
    TIME_BONUS_TIERS
        .iter()
        .find(|(limit, _)| elapsed < *limit)
        .map_or(0, |(_, bonus)| *bonus)
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub settings: Settings,
    pub phase: GamePhase,
    pub player: Option<Player>,
    pub enemies: Vec<Enemy>,
    pub platforms: Vec<Platform>,
    pub collectibles: Vec<Collectible>,
    pub projectiles: Vec<Projectile>,
    /// Collected pickups still playing their collection animation
    pub fading: Vec<Collectible>,
    /// Running total including time bonuses
    pub score: u64,
    /// Seconds spent in the current attempt at this level
    pub level_time: f32,
    pub total_time: f32,
    pub level_number: u32,
    level_completed: bool,
    /// Descriptor of the loaded level (restart source)
    level: Option<GameLevel>,
    /// World physics with the level's gravity override applied
    physics: PhysicsSettings,
    trophies_total: usize,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(settings: Settings) -> Self {
        Self {
            physics: settings.physics,
            settings,
            phase: GamePhase::Uninitialized,
            player: None,
            enemies: Vec::new(),
            platforms: Vec::new(),
            collectibles: Vec::new(),
            projectiles: Vec::new(),
            fading: Vec::new(),
            score: 0,
            level_time: 0.0,
            total_time: 0.0,
            level_number: 0,
            level_completed: false,
            level: None,
            trophies_total: 0,
            events: Vec::new(),
        }
    }

    /// Create the player and load the first level
    pub fn initialize(&mut self, level: &GameLevel) -> Result<(), SimError> {
        if let Err(e) = level.validate() {
            log::error!("Cannot initialize with level {}: {}", level.id, e);
            return Err(e.into());
        }
        self.player = Some(Player::new(
            level.player_start,
            self.settings.player,
            &self.settings.physics,
        ));
        self.score = 0;
        self.total_time = 0.0;
        self.load_level(level)?;
        self.phase = GamePhase::Ready;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), SimError> {
        if self.player.is_none() || self.level.is_none() {
            return Err(SimError::NotInitialized);
        }
        match self.phase {
            GamePhase::Uninitialized => Err(SimError::NotInitialized),
            GamePhase::GameOver => Err(SimError::GameOver),
            GamePhase::Ready | GamePhase::Paused => {
                self.phase = GamePhase::Running;
                log::info!("Game running (level {})", self.level_number);
                Ok(())
            }
            GamePhase::Running => Ok(()),
        }
    }

    /// Replace all non-player entities with fresh copies from `level` and put
    /// the player (if any) back at its start
    pub fn load_level(&mut self, level: &GameLevel) -> Result<(), LevelError> {
        if let Err(e) = level.validate() {
            log::warn!("Rejected level {} '{}': {}", level.id, level.name, e);
            return Err(e);
        }

        self.physics = match level.gravity {
            Some(gravity) => self.settings.physics.with_gravity(gravity),
            None => self.settings.physics,
        };
        self.platforms = level.spawn_platforms();
        self.enemies = level.spawn_enemies();
        self.collectibles = level.spawn_collectibles();
        self.projectiles.clear();
        self.fading.clear();
        self.trophies_total = level.trophy_count();
        self.level_time = 0.0;
        self.level_completed = false;
        self.level_number = level.id;

        if let Some(player) = self.player.as_mut() {
            player.reset(level.player_start);
        }
        self.level = Some(level.clone());

        log::info!(
            "Loaded level {} '{}': {} platforms, {} enemies, {} collectibles",
            level.id,
            level.name,
            self.platforms.len(),
            self.enemies.len(),
            self.collectibles.len()
        );
        Ok(())
    }

    /// Reload the current level from its descriptor
    pub fn restart_level(&mut self) -> Result<(), SimError> {
        if self.phase == GamePhase::GameOver {
            return Err(SimError::GameOver);
        }
        let level = self.level.clone().ok_or(SimError::NotInitialized)?;
        self.load_level(&level)?;
        Ok(())
    }

    pub fn pause(&mut self) -> bool {
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Running;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.phase != GamePhase::Uninitialized
    }

    #[inline]
    pub fn level_completed(&self) -> bool {
        self.level_completed
    }

    pub fn level(&self) -> Option<&GameLevel> {
        self.level.as_ref()
    }

    /// Effective world physics for the loaded level
    pub fn physics(&self) -> &PhysicsSettings {
        &self.physics
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Route an input intent to the player
    pub fn handle_intent(&mut self, intent: Intent) {
        if !matches!(self.phase, GamePhase::Ready | GamePhase::Running) {
            return;
        }
        let Some(player) = self.player.as_mut() else {
            return;
        };

        match intent {
            Intent::MoveLeft => player.move_left(),
            Intent::MoveRight => player.move_right(),
            Intent::Stop => player.stop_moving(),
            Intent::Jump => {
                if player.jump() {
                    self.events.push(GameEvent::Jumped);
                }
            }
            Intent::ReleaseJump => player.release_jump(),
            Intent::Shoot => {
                if let Some(shot) = player.shoot() {
                    self.projectiles.push(shot);
                    self.events.push(GameEvent::ProjectileFired { from_player: true });
                }
            }
            Intent::ToggleJetpack => {
                player.toggle_jetpack();
            }
        }
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.phase != GamePhase::Running {
            return;
        }
        let Some(mut player) = self.player.take() else {
            log::warn!("Running without a player; skipping tick");
            return;
        };

        self.level_time += dt;
        self.total_time += dt;

        self.update_entities(&mut player, dt);
        self.quarantine_non_finite(&mut player);
        self.check_boundaries(&mut player);
        self.collision_pass(&mut player, dt);
        self.cleanup();
        self.check_level_complete(&mut player);

        if player.body.is_dead() {
            self.phase = GamePhase::GameOver;
            self.events.push(GameEvent::GameOver { score: self.score });
            log::info!("Game over with score {}", self.score);
        }
        self.player = Some(player);
    }

    fn update_entities(&mut self, player: &mut Player, dt: f32) {
        player.update(dt, &self.physics);
        let target = (!player.body.is_dead()).then(|| player.body.center());

        let mut spawned = Vec::new();
        for enemy in &mut self.enemies {
            if let Some(shot) = enemy.update(dt, &self.physics, target) {
                spawned.push(shot);
            }
        }

        for platform in &mut self.platforms {
            let was_broken = platform.is_broken();
            platform.update(dt);
            if !was_broken && platform.is_broken() {
                self.events.push(GameEvent::PlatformBroke);
            }
        }

        for item in self.collectibles.iter_mut().chain(self.fading.iter_mut()) {
            item.update(dt);
        }

        let bounds = self.bounds();
        for shot in &mut self.projectiles {
            shot.update(dt);
            shot.cull_outside(&bounds);
        }

        // New shots start moving next tick
        for shot in spawned {
            self.events.push(GameEvent::ProjectileFired { from_player: false });
            self.projectiles.push(shot);
        }
    }

    /// Take entities whose numbers blew up out of play instead of letting
    /// NaN spread through collisions
    fn quarantine_non_finite(&mut self, player: &mut Player) {
        if !player.body.is_finite() {
            log::warn!("Player state became non-finite; respawning");
            player.respawn(self.player_start());
        }

        let bodies = self
            .enemies
            .iter_mut()
            .map(|e| &mut e.body)
            .chain(self.platforms.iter_mut().map(|p| &mut p.body))
            .chain(self.collectibles.iter_mut().map(|c| &mut c.body))
            .chain(self.projectiles.iter_mut().map(|s| &mut s.body));
        for body in bodies {
            if body.active && !body.is_finite() {
                log::warn!("{:?} state became non-finite; removing it", body.kind);
                disable(body);
            }
        }
    }

    /// Falling out of the level or running out of time costs a life
    fn check_boundaries(&mut self, player: &mut Player) {
        if player.body.is_dead() {
            return;
        }
        let fell = player.body.bounds().top > self.bounds().bottom;
        let time_limit = self.level.as_ref().and_then(|l| l.time_limit);
        let timed_out = time_limit.is_some_and(|limit| self.level_time >= limit);
        if !fell && !timed_out {
            return;
        }

        player.lose_life();
        if timed_out {
            self.level_time = 0.0;
        }
        if player.body.is_dead() {
            self.events.push(GameEvent::PlayerDied);
        } else {
            self.events.push(GameEvent::PlayerHurt { lives: player.lives });
            player.respawn(self.player_start());
        }
        log::info!(
            "Player {} ({} lives left)",
            if fell { "fell out of the level" } else { "ran out of time" },
            player.lives
        );
    }

    fn collision_pass(&mut self, player: &mut Player, dt: f32) {
        for (a, b) in COLLISION_PASSES {
            let Some(rule) = contact_rule(a, b) else {
                continue;
            };
            let points = match rule {
                ContactRule::PlayerPlatform => {
                    for platform in &mut self.platforms {
                        contact::player_platform(player, platform, &mut self.events);
                    }
                    player.body.grounded = self.platforms.iter().any(|p| p.supports(&player.body));
                    0
                }
                ContactRule::EnemyPlatform => {
                    for enemy in &mut self.enemies {
                        for platform in &mut self.platforms {
                            contact::enemy_platform(enemy, platform);
                        }
                        enemy.body.grounded = enemy.kind.is_grounded_kind()
                            && self.platforms.iter().any(|p| p.supports(&enemy.body));
                    }
                    0
                }
                ContactRule::EnemyEnemy => {
                    for i in 0..self.enemies.len() {
                        let (head, tail) = self.enemies.split_at_mut(i + 1);
                        let a = &mut head[i];
                        for b in tail {
                            contact::enemy_enemy(a, b);
                        }
                    }
                    0
                }
                ContactRule::PlayerEnemy => {
                    let mut points = 0;
                    for enemy in &mut self.enemies {
                        points += contact::player_enemy(player, enemy, &mut self.events);
                    }
                    points
                }
                ContactRule::PlayerCollectible => {
                    let mut points = 0;
                    for item in &mut self.collectibles {
                        points += contact::player_collectible(player, item, &mut self.events);
                    }
                    points
                }
                ContactRule::EnemyProjectile => {
                    let mut points = 0;
                    for shot in &mut self.projectiles {
                        for enemy in &mut self.enemies {
                            points += contact::projectile_enemy(shot, enemy, &mut self.events);
                        }
                    }
                    points
                }
                ContactRule::PlayerProjectile => {
                    for shot in &mut self.projectiles {
                        contact::projectile_player(shot, player, &mut self.events);
                    }
                    0
                }
                ContactRule::ProjectilePlatform => {
                    for shot in &mut self.projectiles {
                        contact::projectile_platforms(shot, &self.platforms, dt);
                    }
                    0
                }
            };
            self.award(player, points);
        }
    }

    fn award(&mut self, player: &mut Player, points: u64) {
        if points > 0 {
            self.score += points;
            player.add_score(points);
        }
    }

    /// The only place entities leave their collections
    fn cleanup(&mut self) {
        self.enemies.retain(|e| e.body.active && e.is_alive());
        self.platforms.retain(|p| p.body.active);
        self.projectiles.retain(|s| s.body.active);

        let (collected, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.collectibles)
            .into_iter()
            .filter(|c| c.body.active || c.is_collected())
            .partition(Collectible::is_collected);
        self.collectibles = live;
        self.fading.extend(collected);
        self.fading.retain(|c| !c.is_finished());
    }

    fn check_level_complete(&mut self, player: &mut Player) {
        if self.level_completed || player.body.is_dead() {
            return;
        }

        let trophies_done = self.trophies_total > 0
            && !self
                .collectibles
                .iter()
                .any(|c| c.kind == CollectibleKind::Trophy);
        let required = self.level.as_ref().and_then(|l| l.required_score);
        let score_ok = required.is_none_or(|needed| self.score >= needed);

        if player.level_complete || (trophies_done && score_ok) {
            let bonus = time_bonus(self.level_time);
            self.level_completed = true;
            self.score += bonus;
            self.events.push(GameEvent::LevelCompleted {
                time: self.level_time,
                bonus,
            });
            log::info!(
                "Level {} completed in {:.1}s (time bonus {}, score {})",
                self.level_number,
                self.level_time,
                bonus,
                self.score
            );
        }
    }

    fn bounds(&self) -> Aabb {
        self.level.as_ref().map(|l| l.bounds).unwrap_or_default()
    }

    fn player_start(&self) -> Vec2 {
        self.level.as_ref().map_or(Vec2::ZERO, |l| l.player_start)
    }

    /// Draw list in painter's order: platforms, collectibles, enemies,
    /// projectiles, then the player on top
    pub fn draw_commands(&self, assets: &AssetRegistry) -> Vec<DrawCommand> {
        let mut commands = Vec::with_capacity(
            self.platforms.len()
                + self.collectibles.len()
                + self.fading.len()
                + self.enemies.len()
                + self.projectiles.len()
                + 1,
        );

        for platform in &self.platforms {
            commands.extend(draw(assets, SpriteId::Platform(platform.kind), &platform.body, 1.0, 1.0));
        }
        for item in self.collectibles.iter().chain(&self.fading) {
            let sprite = SpriteId::Collectible(item.kind);
            commands.extend(draw(assets, sprite, &item.body, item.alpha(), item.scale()));
        }
        for enemy in &self.enemies {
            commands.extend(draw(assets, SpriteId::Enemy(enemy.kind), &enemy.body, 1.0, 1.0));
        }
        for shot in &self.projectiles {
            let sprite = SpriteId::Projectile {
                from_player: shot.from_player,
            };
            commands.extend(draw(assets, sprite, &shot.body, 1.0, 1.0));
        }
        if let Some(player) = &self.player {
            if player.blink_visible() {
                commands.extend(draw(assets, SpriteId::Player, &player.body, 1.0, 1.0));
            }
        }
        commands
    }

    /// Draw the frame. A failed draw is logged and the rest still render.
    pub fn render<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        assets: &AssetRegistry,
    ) -> Result<(), RenderError> {
        for command in self.draw_commands(assets) {
            if let Err(e) = surface.draw(&command) {
                log::warn!("Failed to draw {:?}: {}", command.sprite, e);
            }
        }
        surface.present()
    }

    /// Serialize for save/continue (events are not kept)
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn restore(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn disable(body: &mut GameObject) {
    body.active = false;
    body.collidable = false;
    body.visible = false;
}

fn draw(
    assets: &AssetRegistry,
    sprite: SpriteId,
    body: &GameObject,
    alpha: f32,
    scale: f32,
) -> Option<DrawCommand> {
    if !body.visible {
        return None;
    }
    let b = body.bounds();
    let center = b.center();
    let half = Vec2::new(b.width(), b.height()) * 0.5 * scale;
    let [r, g, bl] = sprite.debug_color();

    Some(DrawCommand {
        sprite,
        rect: Aabb::new(center.x - half.x, center.y - half.y, center.x + half.x, center.y + half.y),
        frame: assets.frame(AnimationKey::new(sprite, body.state), body.frame_index),
        flip_x: body.facing == Direction::Left,
        color: [r, g, bl, alpha],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::render::FrameHandle;
    use crate::sim::level::{CollectibleDef, EnemyDef, PlatformDef, generate_demo_level};
    use crate::sim::object::ObjectState;
    use crate::sim::platform::PlatformKind;

    const FLOOR_TOP: f32 = 400.0;

    /// Wide floor, player standing on it at x = 100
    fn floor_level() -> GameLevel {
        let mut level = GameLevel::new(
            1,
            "Floor",
            Vec2::new(100.0, FLOOR_TOP - PLAYER_HEIGHT),
            Aabb::new(0.0, 0.0, 1000.0, 500.0),
        );
        level.platforms.push(PlatformDef::new(
            PlatformKind::Solid,
            Vec2::new(0.0, FLOOR_TOP),
            Vec2::new(1000.0, 40.0),
        ));
        level
    }

    fn trophy_at(x: f32) -> CollectibleDef {
        CollectibleDef {
            kind: CollectibleKind::Trophy,
            pos: Vec2::new(x, FLOOR_TOP - 40.0),
        }
    }

    fn running(level: &GameLevel) -> GameState {
        let mut state = GameState::new(Settings::default());
        state.initialize(level).unwrap();
        state.start().unwrap();
        state
    }

    fn player(state: &GameState) -> &Player {
        state.player.as_ref().unwrap()
    }

    #[test]
    fn test_update_requires_running() {
        let mut state = GameState::new(Settings::default());
        state.update(FRAME_PERIOD);
        assert_eq!(state.phase, GamePhase::Uninitialized);
        assert!(matches!(state.start(), Err(SimError::NotInitialized)));

        state.initialize(&floor_level()).unwrap();
        assert_eq!(state.phase, GamePhase::Ready);
        state.update(FRAME_PERIOD);
        assert_eq!(state.level_time, 0.0);

        state.start().unwrap();
        state.update(FRAME_PERIOD);
        assert!(state.level_time > 0.0);
    }

    #[test]
    fn test_pause_stops_time() {
        let mut state = running(&floor_level());
        assert!(state.pause());
        assert!(state.is_paused());
        state.update(FRAME_PERIOD);
        assert_eq!(state.total_time, 0.0);

        assert!(state.resume());
        state.update(FRAME_PERIOD);
        assert_eq!(state.total_time, FRAME_PERIOD);
    }

    #[test]
    fn test_collecting_trophy_scores_and_removes_it() {
        let mut level = floor_level();
        level.collectibles.push(trophy_at(104.0));
        level.collectibles.push(trophy_at(800.0));
        let mut state = running(&level);
        assert_eq!(state.score, 0);

        state.update(FRAME_PERIOD);
        assert_eq!(state.score, 100);
        assert_eq!(player(&state).score, 100);
        assert_eq!(state.collectibles.len(), 1);
        assert_eq!(state.fading.len(), 1);
        assert!(!state.level_completed());
        assert!(state.events().contains(&GameEvent::Collected {
            kind: CollectibleKind::Trophy,
            points: 100
        }));

        // Fade finishes, then the effect is dropped
        for _ in 0..60 {
            state.update(FRAME_PERIOD);
        }
        assert!(state.fading.is_empty());
    }

    #[test]
    fn test_enemy_contact_costs_one_life() {
        let mut level = floor_level();
        level.enemies.push(EnemyDef {
            kind: EnemyKind::Walker,
            pos: Vec2::new(110.0, FLOOR_TOP - ENEMY_SIZE),
            patrol_distance: 64.0,
        });
        let mut state = running(&level);

        state.update(FRAME_PERIOD);
        let p = player(&state);
        assert_eq!(p.lives, 2);
        assert!(p.invulnerable);
        assert_eq!(p.invulnerability_timer, INVULNERABILITY_TIME);

        for _ in 0..10 {
            state.update(FRAME_PERIOD);
        }
        assert_eq!(player(&state).lives, 2);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let mut empty = floor_level();
        empty.platforms.clear();
        assert!(!empty.is_valid());

        let mut state = GameState::new(Settings::default());
        assert!(matches!(
            state.initialize(&empty),
            Err(SimError::InvalidLevel(LevelError::NoPlatforms))
        ));
        assert_eq!(state.phase, GamePhase::Uninitialized);
        assert!(state.player.is_none());

        // A running game keeps its current level
        let mut state = running(&floor_level());
        assert_eq!(state.load_level(&empty), Err(LevelError::NoPlatforms));
        assert_eq!(state.platforms.len(), 1);
    }

    #[test]
    fn test_zero_time_limit_rejected() {
        let mut level = floor_level();
        level.time_limit = Some(0.0);
        let mut state = GameState::new(Settings::default());
        assert!(matches!(
            state.initialize(&level),
            Err(SimError::InvalidLevel(LevelError::InvalidTimeLimit(_)))
        ));
        assert_eq!(state.phase, GamePhase::Uninitialized);
    }

    #[test]
    fn test_breakable_platform_gives_way() {
        let mut level = floor_level();
        level.platforms[0].kind = PlatformKind::Breakable;
        let mut state = running(&level);

        let ticks = (BREAK_DELAY / FRAME_PERIOD) as usize + 3;
        for _ in 0..ticks {
            state.update(FRAME_PERIOD);
        }
        assert!(state.platforms.is_empty());
        assert!(state.events().contains(&GameEvent::PlatformBroke));
        assert!(!player(&state).body.grounded);
    }

    #[test]
    fn test_level_completion_awards_time_bonus() {
        let mut level = floor_level();
        level.collectibles.push(trophy_at(104.0));
        let mut state = running(&level);

        state.update(FRAME_PERIOD);
        assert!(state.level_completed());
        assert_eq!(state.score, 100 + 1000);
        assert_eq!(player(&state).score, 100);

        // Only once
        state.update(FRAME_PERIOD);
        assert_eq!(state.score, 1100);
    }

    #[test]
    fn test_time_bonus_tiers() {
        assert_eq!(time_bonus(10.0), 1000);
        assert_eq!(time_bonus(45.0), 500);
        assert_eq!(time_bonus(90.0), 250);
        assert_eq!(time_bonus(500.0), 0);
    }

    #[test]
    fn test_required_score_withholds_completion() {
        let mut level = floor_level();
        level.collectibles.push(trophy_at(104.0));
        level.required_score = Some(1000);
        let mut state = running(&level);
        state.update(FRAME_PERIOD);
        assert_eq!(state.score, 100);
        assert!(!state.level_completed());
    }

    #[test]
    fn test_crown_completes_without_trophies() {
        let mut level = floor_level();
        level.required_score = Some(1_000_000);
        level.collectibles.push(CollectibleDef {
            kind: CollectibleKind::Crown,
            pos: Vec2::new(104.0, FLOOR_TOP - 40.0),
        });
        let mut state = running(&level);
        state.update(FRAME_PERIOD);
        assert!(state.level_completed());
    }

    #[test]
    fn test_falling_out_respawns() {
        let mut level = floor_level();
        // Floor far to the right; the player drops straight out
        level.platforms[0] = PlatformDef::new(
            PlatformKind::Solid,
            Vec2::new(600.0, FLOOR_TOP),
            Vec2::new(100.0, 40.0),
        );
        let mut state = running(&level);
        for _ in 0..120 {
            state.update(FRAME_PERIOD);
            if !state.events().is_empty() {
                break;
            }
        }
        assert_eq!(state.events(), &[GameEvent::PlayerHurt { lives: 2 }]);
        assert_eq!(player(&state).body.pos(), level.player_start);
        assert!(player(&state).invulnerable);
    }

    #[test]
    fn test_losing_last_life_ends_game() {
        let mut level = floor_level();
        level.platforms[0].kind = PlatformKind::Hazard;
        let mut state = running(&level);
        state.player.as_mut().unwrap().lives = 1;

        state.update(FRAME_PERIOD);
        assert!(state.is_game_over());
        assert!(state.events().contains(&GameEvent::PlayerDied));
        assert!(matches!(state.start(), Err(SimError::GameOver)));
        assert!(matches!(state.restart_level(), Err(SimError::GameOver)));

        let frozen = state.total_time;
        state.update(FRAME_PERIOD);
        assert_eq!(state.total_time, frozen);
    }

    #[test]
    fn test_time_limit_costs_life() {
        let mut level = floor_level();
        level.time_limit = Some(0.5);
        let mut state = running(&level);
        for _ in 0..40 {
            state.update(FRAME_PERIOD);
        }
        assert_eq!(player(&state).lives, 2);
        assert!(state.level_time < 0.5);
    }

    #[test]
    fn test_shoot_requires_gun() {
        let mut state = running(&floor_level());
        state.handle_intent(Intent::Shoot);
        assert!(state.projectiles.is_empty());

        state.player.as_mut().unwrap().has_gun = true;
        state.handle_intent(Intent::Shoot);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::ProjectileFired { from_player: true }]
        );
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_restart_restores_layout() {
        let mut level = floor_level();
        level.collectibles.push(trophy_at(104.0));
        level.collectibles.push(trophy_at(800.0));
        let mut state = running(&level);
        state.update(FRAME_PERIOD);
        assert_eq!(state.collectibles.len(), 1);

        state.restart_level().unwrap();
        assert_eq!(state.collectibles.len(), 2);
        assert_eq!(state.level_time, 0.0);
        // Score carries over
        assert_eq!(state.score, 100);
    }

    #[test]
    fn test_draw_order_puts_player_last() {
        let mut level = floor_level();
        level.collectibles.push(trophy_at(800.0));
        level.enemies.push(EnemyDef {
            kind: EnemyKind::Flyer,
            pos: Vec2::new(500.0, 100.0),
            patrol_distance: 100.0,
        });
        let state = running(&level);

        let mut assets = AssetRegistry::new();
        assets.register(
            AnimationKey::new(SpriteId::Player, ObjectState::Idle),
            vec![FrameHandle(7)],
        );
        let commands = state.draw_commands(&assets);
        let sprites: Vec<_> = commands.iter().map(|c| c.sprite).collect();
        assert_eq!(
            sprites,
            vec![
                SpriteId::Platform(PlatformKind::Solid),
                SpriteId::Collectible(CollectibleKind::Trophy),
                SpriteId::Enemy(EnemyKind::Flyer),
                SpriteId::Player,
            ]
        );
        assert_eq!(commands[0].frame, None);
        assert_eq!(commands[3].frame, Some(FrameHandle(7)));
    }

    struct FlakySurface {
        draws: usize,
        presented: bool,
    }

    impl RenderSurface for FlakySurface {
        fn draw(&mut self, _command: &DrawCommand) -> Result<(), RenderError> {
            self.draws += 1;
            if self.draws == 1 {
                Err(RenderError::Surface("lost texture".into()))
            } else {
                Ok(())
            }
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.presented = true;
            Ok(())
        }
    }

    #[test]
    fn test_render_survives_failed_draw() {
        let mut level = floor_level();
        level.collectibles.push(trophy_at(800.0));
        let state = running(&level);
        let mut surface = FlakySurface {
            draws: 0,
            presented: false,
        };
        assert!(state.render(&mut surface, &AssetRegistry::new()).is_ok());
        assert_eq!(surface.draws, 3);
        assert!(surface.presented);
    }

    #[test]
    fn test_determinism() {
        let level = generate_demo_level(42);
        let mut a = running(&level);
        let mut b = running(&level);

        let script = [
            Intent::MoveRight,
            Intent::Jump,
            Intent::ReleaseJump,
            Intent::Stop,
            Intent::MoveLeft,
        ];
        for (i, intent) in script.iter().cycle().take(300).enumerate() {
            if i % 20 == 0 {
                a.handle_intent(*intent);
                b.handle_intent(*intent);
            }
            a.update(FRAME_PERIOD);
            b.update(FRAME_PERIOD);
        }

        assert_eq!(a.score, b.score);
        assert_eq!(player(&a).body.pos(), player(&b).body.pos());
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_snapshot_restores_state() {
        let level = generate_demo_level(3);
        let mut state = running(&level);
        for _ in 0..30 {
            state.update(FRAME_PERIOD);
        }
        let json = state.snapshot().unwrap();
        let restored = GameState::restore(&json).unwrap();
        assert_eq!(restored.phase, GamePhase::Running);
        assert_eq!(player(&restored).body.pos(), player(&state).body.pos());
        assert_eq!(restored.platforms.len(), state.platforms.len());
        assert!(restored.events().is_empty());
    }
}
