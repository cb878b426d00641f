//! Entity-vs-entity contact rules
//!
//! [`contact_rule`] is the only place that decides which pairs of entity
//! kinds interact. `GameState` walks [`COLLISION_PASSES`] in order, looks
//! each pair up here, and calls the matching handler. Handlers apply the
//! physical response through `collision` and report side effects as
//! [`GameEvent`]s; points earned are returned so the caller can credit them.

use glam::Vec2;

use super::collectible::Collectible;
use super::collision::{Surface, detect, resolve, sweep_test};
use super::enemy::Enemy;
use super::object::{EntityKind, GameObject};
use super::platform::{Platform, PlatformKind};
use super::player::{DamageOutcome, Player};
use super::projectile::Projectile;
use super::state::GameEvent;

/// How a pair of entity kinds interacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactRule {
    PlayerPlatform,
    PlayerEnemy,
    PlayerCollectible,
    PlayerProjectile,
    EnemyPlatform,
    EnemyEnemy,
    EnemyProjectile,
    ProjectilePlatform,
}

/// Pair lookup; symmetric in its arguments
pub fn contact_rule(a: EntityKind, b: EntityKind) -> Option<ContactRule> {
    use EntityKind::*;

    let rule = match (a, b) {
        (Player, Platform) | (Platform, Player) => ContactRule::PlayerPlatform,
        (Player, Enemy) | (Enemy, Player) => ContactRule::PlayerEnemy,
        (Player, Collectible) | (Collectible, Player) => ContactRule::PlayerCollectible,
        (Player, Projectile) | (Projectile, Player) => ContactRule::PlayerProjectile,
        (Enemy, Platform) | (Platform, Enemy) => ContactRule::EnemyPlatform,
        (Enemy, Enemy) => ContactRule::EnemyEnemy,
        (Enemy, Projectile) | (Projectile, Enemy) => ContactRule::EnemyProjectile,
        (Projectile, Platform) | (Platform, Projectile) => ContactRule::ProjectilePlatform,
        // Pickups sit still, platforms never touch each other, and
        // projectiles pass through one another
        _ => return None,
    };
    Some(rule)
}

/// Collision pass order: bodies settle against platforms first, then the
/// player meets enemies and pickups, then projectiles hit everything
pub const COLLISION_PASSES: [(EntityKind, EntityKind); 8] = [
    (EntityKind::Player, EntityKind::Platform),
    (EntityKind::Enemy, EntityKind::Platform),
    (EntityKind::Enemy, EntityKind::Enemy),
    (EntityKind::Player, EntityKind::Enemy),
    (EntityKind::Player, EntityKind::Collectible),
    (EntityKind::Projectile, EntityKind::Enemy),
    (EntityKind::Projectile, EntityKind::Player),
    (EntityKind::Projectile, EntityKind::Platform),
];

/// Push the events for a damage outcome
pub fn report_damage(outcome: DamageOutcome, player: &Player, events: &mut Vec<GameEvent>) {
    match outcome {
        DamageOutcome::Ignored => {}
        DamageOutcome::Hurt => events.push(GameEvent::PlayerHurt { lives: player.lives }),
        DamageOutcome::Died => events.push(GameEvent::PlayerDied),
    }
}

/// Move a rider standing on a moving platform along with it
fn carry_rider(platform: &Platform, rider: &mut GameObject) {
    if platform.kind != PlatformKind::Moving || platform.delta() == Vec2::ZERO {
        return;
    }
    if rider.vel.y >= 0.0 && platform.supports(rider) {
        rider.translate(platform.delta());
    }
}

pub fn player_platform(player: &mut Player, platform: &mut Platform, events: &mut Vec<GameEvent>) {
    if player.body.is_dead() || !platform.body.collidable {
        return;
    }
    carry_rider(platform, &mut player.body);

    let result = detect(&player.body, &platform.body);
    let touching = result.has_collision || platform.supports(&player.body);
    if !touching {
        return;
    }

    if platform.is_hazard() {
        let outcome = player.take_damage(platform.body.center().x);
        report_damage(outcome, player, events);
    }

    if platform.kind == PlatformKind::Breakable && platform.start_breaking() {
        log::debug!("Player stepped on breakable platform at {:?}", platform.origin);
    }

    let surface = platform.surface();
    if resolve(&mut player.body, &mut platform.body, surface, &result)
        && surface == Surface::Solid
        && result.normal.y > 0.0
    {
        // Head bump
        player.end_jump();
    }
}

/// Stomp from above, otherwise the enemy hurts the player
pub fn player_enemy(player: &mut Player, enemy: &mut Enemy, events: &mut Vec<GameEvent>) -> u64 {
    if !enemy.is_alive() || !player.body.intersects(&enemy.body) {
        return 0;
    }

    if player.body.vel.y > 0.0 && player.body.is_collision_bottom(&enemy.body) {
        let health = enemy.health;
        enemy.take_hit(health);
        player.bounce();
        let points = enemy.points();
        events.push(GameEvent::EnemyKilled {
            kind: enemy.kind,
            points,
        });
        log::debug!("Stomped {:?} for {} points", enemy.kind, points);
        return points;
    }

    let outcome = player.take_damage(enemy.body.center().x);
    report_damage(outcome, player, events);
    0
}

pub fn player_collectible(
    player: &mut Player,
    item: &mut Collectible,
    events: &mut Vec<GameEvent>,
) -> u64 {
    if player.body.is_dead() || !player.body.intersects(&item.body) || !item.collect() {
        return 0;
    }
    player.apply_pickup(item.kind);
    let points = item.points();
    events.push(GameEvent::Collected {
        kind: item.kind,
        points,
    });
    points
}

/// Enemy shot hitting the player. Invulnerability blocks the damage but
/// the shot is still spent.
pub fn projectile_player(shot: &mut Projectile, player: &mut Player, events: &mut Vec<GameEvent>) {
    if shot.from_player || !shot.body.intersects(&player.body) || !shot.register_hit() {
        return;
    }
    let outcome = player.take_damage(shot.body.center().x);
    report_damage(outcome, player, events);
}

/// Player shot hitting an enemy
pub fn projectile_enemy(shot: &mut Projectile, enemy: &mut Enemy, events: &mut Vec<GameEvent>) -> u64 {
    if !shot.from_player || !shot.body.intersects(&enemy.body) || !shot.register_hit() {
        return 0;
    }
    if !enemy.take_hit(shot.damage) {
        return 0;
    }
    let points = enemy.points();
    events.push(GameEvent::EnemyKilled {
        kind: enemy.kind,
        points,
    });
    points
}

/// Shots stop at anything but one-way platforms. The path covered during
/// the last `dt` is swept so fast shots cannot skip thin platforms.
pub fn projectile_platforms(shot: &mut Projectile, platforms: &[Platform], dt: f32) -> bool {
    if !shot.body.active || shot.has_hit() {
        return false;
    }
    let blockers = platforms
        .iter()
        .filter(|p| p.kind != PlatformKind::Passthrough)
        .map(|p| &p.body);
    if sweep_test(&shot.body, -shot.body.vel, dt, blockers).is_some() {
        return shot.register_hit();
    }
    false
}

pub fn enemy_platform(enemy: &mut Enemy, platform: &mut Platform) {
    if !enemy.kind.is_grounded_kind() || !enemy.is_alive() || !platform.body.collidable {
        return;
    }
    carry_rider(platform, &mut enemy.body);

    let surface = platform.surface();
    let result = detect(&enemy.body, &platform.body);
    if resolve(&mut enemy.body, &mut platform.body, surface, &result)
        && result.is_horizontal()
    {
        enemy.on_wall_hit();
    }
}

/// Ground enemies push each other apart
pub fn enemy_enemy(a: &mut Enemy, b: &mut Enemy) {
    if !a.kind.is_grounded_kind() || !b.kind.is_grounded_kind() {
        return;
    }
    let result = detect(&a.body, &b.body);
    if resolve(&mut a.body, &mut b.body, Surface::Body, &result) && result.is_horizontal() {
        a.on_wall_hit();
        b.on_wall_hit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::collectible::CollectibleKind;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::object::Direction;
    use crate::settings::{PhysicsSettings, PlayerSettings};

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y), PlayerSettings::default(), &PhysicsSettings::default())
    }

    fn floor(kind: PlatformKind) -> Platform {
        Platform::new(kind, Vec2::new(0.0, 100.0), Vec2::new(400.0, 20.0))
    }

    #[test]
    fn test_contact_table_is_symmetric() {
        let kinds = [
            EntityKind::Player,
            EntityKind::Enemy,
            EntityKind::Platform,
            EntityKind::Collectible,
            EntityKind::Projectile,
        ];
        for a in kinds {
            for b in kinds {
                assert_eq!(contact_rule(a, b), contact_rule(b, a));
            }
        }
        assert_eq!(contact_rule(EntityKind::Platform, EntityKind::Platform), None);
        assert_eq!(
            contact_rule(EntityKind::Collectible, EntityKind::Enemy),
            None
        );
    }

    #[test]
    fn test_every_pass_has_a_rule() {
        for (a, b) in COLLISION_PASSES {
            assert!(contact_rule(a, b).is_some(), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_player_lands_on_solid() {
        let mut events = Vec::new();
        let mut ground = floor(PlatformKind::Solid);
        let mut p = player_at(50.0, 100.0 - PLAYER_HEIGHT - 2.0);
        p.body.begin_step();
        p.body.vel.y = 300.0;
        p.body.translate(Vec2::new(0.0, 6.0));

        player_platform(&mut p, &mut ground, &mut events);
        assert_eq!(p.body.bounds().bottom, 100.0);
        assert_eq!(p.body.vel.y, 0.0);
        assert!(ground.supports(&p.body));
        assert!(events.is_empty());
    }

    #[test]
    fn test_hazard_hurts_standing_player() {
        let mut events = Vec::new();
        let mut spikes = floor(PlatformKind::Hazard);
        let mut p = player_at(50.0, 100.0 - PLAYER_HEIGHT);

        player_platform(&mut p, &mut spikes, &mut events);
        assert_eq!(p.lives, START_LIVES - 1);
        assert_eq!(events, vec![GameEvent::PlayerHurt { lives: START_LIVES - 1 }]);
    }

    #[test]
    fn test_breakable_starts_on_contact() {
        let mut events = Vec::new();
        let mut plank = floor(PlatformKind::Breakable);
        let mut p = player_at(50.0, 100.0 - PLAYER_HEIGHT);

        player_platform(&mut p, &mut plank, &mut events);
        assert!(plank.is_breaking());
    }

    #[test]
    fn test_rider_carried_by_moving_platform() {
        let mut events = Vec::new();
        let mut lift = Platform::moving(
            Vec2::new(0.0, 100.0),
            Vec2::new(100.0, 16.0),
            crate::sim::platform::Axis::Horizontal,
            200.0,
            60.0,
        );
        let mut p = player_at(20.0, 100.0 - PLAYER_HEIGHT);
        lift.update(0.5);
        player_platform(&mut p, &mut lift, &mut events);
        assert_eq!(p.body.x(), 50.0);
    }

    #[test]
    fn test_stomp_kills_enemy() {
        let mut events = Vec::new();
        let mut enemy = Enemy::new(EnemyKind::Walker, Vec2::new(50.0, 100.0), 64.0);
        let mut p = player_at(50.0, 100.0 - PLAYER_HEIGHT - 4.0);
        p.body.begin_step();
        p.body.vel.y = 200.0;
        p.body.translate(Vec2::new(0.0, 8.0));

        let points = player_enemy(&mut p, &mut enemy, &mut events);
        assert_eq!(points, EnemyKind::Walker.points());
        assert!(!enemy.is_alive());
        assert_eq!(p.body.vel.y, STOMP_BOUNCE_VELOCITY);
        assert_eq!(p.lives, START_LIVES);
    }

    #[test]
    fn test_enemy_contact_hurts_once() {
        let mut events = Vec::new();
        let mut enemy = Enemy::new(EnemyKind::Walker, Vec2::new(60.0, 100.0), 64.0);
        let mut p = player_at(50.0, 90.0);

        assert_eq!(player_enemy(&mut p, &mut enemy, &mut events), 0);
        assert_eq!(p.lives, 2);
        assert!(p.invulnerable);
        assert_eq!(p.invulnerability_timer, INVULNERABILITY_TIME);

        player_enemy(&mut p, &mut enemy, &mut events);
        assert_eq!(p.lives, 2);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_collect_awards_once() {
        let mut events = Vec::new();
        let mut p = player_at(0.0, 0.0);
        let mut trophy = Collectible::new(CollectibleKind::Trophy, Vec2::new(4.0, 4.0));
        assert_eq!(player_collectible(&mut p, &mut trophy, &mut events), 100);
        assert_eq!(player_collectible(&mut p, &mut trophy, &mut events), 0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_shots_only_hit_the_other_side() {
        let mut events = Vec::new();
        let mut p = player_at(0.0, 0.0);
        let mut own = Projectile::new(Vec2::new(5.0, 5.0), Direction::Right, true);
        projectile_player(&mut own, &mut p, &mut events);
        assert!(!own.has_hit());
        assert_eq!(p.lives, START_LIVES);

        let mut hostile = Projectile::new(Vec2::new(5.0, 5.0), Direction::Left, false);
        projectile_player(&mut hostile, &mut p, &mut events);
        assert!(hostile.has_hit());
        assert_eq!(p.lives, START_LIVES - 1);
    }

    #[test]
    fn test_shot_kills_after_hit_points() {
        let mut events = Vec::new();
        let mut shooter = Enemy::new(EnemyKind::Shooter, Vec2::ZERO, 0.0);
        let mut first = Projectile::new(Vec2::new(4.0, 4.0), Direction::Right, true);
        let mut second = Projectile::new(Vec2::new(4.0, 4.0), Direction::Right, true);
        assert_eq!(projectile_enemy(&mut first, &mut shooter, &mut events), 0);
        assert_eq!(
            projectile_enemy(&mut second, &mut shooter, &mut events),
            EnemyKind::Shooter.points()
        );
        assert!(!shooter.is_alive());
    }

    #[test]
    fn test_shots_pass_one_way_platforms() {
        let platforms = vec![floor(PlatformKind::Passthrough)];
        let mut shot = Projectile::new(Vec2::new(50.0, 105.0), Direction::Right, true);
        assert!(!projectile_platforms(&mut shot, &platforms, FRAME_PERIOD));

        let walls = vec![floor(PlatformKind::Solid)];
        assert!(projectile_platforms(&mut shot, &walls, FRAME_PERIOD));
        assert!(!shot.body.active);
    }

    #[test]
    fn test_walker_turns_at_wall() {
        let mut wall = Platform::new(PlatformKind::Solid, Vec2::new(100.0, 0.0), Vec2::new(20.0, 200.0));
        // 2px into the wall
        let mut walker = Enemy::new(EnemyKind::Walker, Vec2::new(70.0, 50.0), 200.0);
        assert_eq!(walker.body.facing, Direction::Right);
        assert_eq!(walker.body.bounds().right, 70.0 + ENEMY_SIZE);

        enemy_platform(&mut walker, &mut wall);
        assert_eq!(walker.body.bounds().right, 100.0);
        assert_eq!(walker.body.facing, Direction::Left);
    }
}
