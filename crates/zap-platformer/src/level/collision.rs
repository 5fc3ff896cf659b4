//! Player-vs-world collision and the enemy-vs-enemy shell rule.
//!
//! The player moves on Y and resolves, including stomps, before it moves on
//! X. On each axis only the first collider found is handled, searched in
//! precedence order: ground and pipes, then fixed and random terrain, then
//! enemies, then the boss.

use crate::api::context::{Commands, Intent};
use crate::api::types::{Direction, EntityId, LevelEvent, SoundCue};
use crate::core::geometry::{first_hit, Rect};
use crate::core::scene::Scene;
use crate::entities::boss::Boss;
use crate::entities::enemy::{Enemy, StompOutcome, STOMP_SCORE};
use crate::entities::player::{HitOutcome, Player, PlayerState};
use crate::entities::powerup::{PowerUp, POWERUP_SCORE};

/// A stomp counts while the player's bottom is at most this far below the
/// target's top.
pub const STOMP_TOLERANCE: f32 = 15.0;
pub const ENEMY_BOUNCE: f32 = -7.0;
pub const BOSS_BOUNCE: f32 = -10.0;
/// Gap between the player's head and a reward power-up.
pub const REWARD_OFFSET: f32 = 16.0;
pub const KNOCKOUT_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Hit {
    Solid(Rect),
    Enemy(EntityId),
    Boss,
}

/// Everything the player can run into this tick.
pub struct Contacts<'a> {
    /// Ground segments and pipes.
    pub ground: &'a [Rect],
    /// Fixed plus random terrain.
    pub terrain: &'a [Rect],
    pub enemies: &'a mut Scene<Enemy>,
    pub boss: Option<&'a mut Boss>,
    pub stomp_reward_threshold: u32,
    pub level_width: f32,
    pub now_ms: u64,
}

impl Contacts<'_> {
    fn find_hit(&self, rect: &Rect) -> Option<Hit> {
        if rect.is_degenerate() {
            log::trace!("degenerate player rect {:?}; collision skipped", rect);
            return None;
        }
        if let Some(r) = first_hit(rect, self.ground) {
            return Some(Hit::Solid(*r));
        }
        if let Some(r) = first_hit(rect, self.terrain) {
            return Some(Hit::Solid(*r));
        }
        if let Some(e) = self
            .enemies
            .iter()
            .find(|e| e.is_live() && e.rect().intersects(rect))
        {
            return Some(Hit::Enemy(e.id));
        }
        match &self.boss {
            Some(b) if !b.is_dying() && b.rect().intersects(rect) => Some(Hit::Boss),
            _ => None,
        }
    }

    fn solid_below(&self, rect: &Rect) -> bool {
        let mut probe = *rect;
        probe.y += 1.0;
        first_hit(&probe, self.ground).is_some() || first_hit(&probe, self.terrain).is_some()
    }
}

/// Move the player by its velocity and resolve what it runs into.
pub fn move_player(player: &mut Player, world: &mut Contacts, cmds: &mut Commands) {
    let vertical = player.in_transition_state != Some(true);
    if vertical {
        player.rect.y += player.y_vel;
        if let Some(hit) = world.find_hit(&player.rect) {
            resolve_y(player, hit, world, cmds);
        }
    }

    player.rect.x += player.x_vel;
    if let Some(hit) = world.find_hit(&player.rect) {
        resolve_x(player, hit, world, cmds);
    }

    if vertical
        && !matches!(player.state, PlayerState::Jump | PlayerState::DeathJump)
        && !world.solid_below(&player.rect)
    {
        player.state = PlayerState::Fall;
    }

    if player.rect.left() < 0.0 {
        player.rect.set_left(0.0);
    } else if player.rect.right() > world.level_width {
        player.rect.set_right(world.level_width);
    }
}

fn resolve_x(player: &mut Player, hit: Hit, world: &mut Contacts, cmds: &mut Commands) {
    match hit {
        Hit::Solid(collider) => {
            if player.rect.x < collider.x {
                player.rect.set_right(collider.left());
            } else {
                player.rect.set_left(collider.right());
            }
            player.x_vel = 0.0;
        }
        Hit::Enemy(id) => touch_enemy(player, id, world, cmds),
        Hit::Boss => touch_boss(player, cmds),
    }
}

fn resolve_y(player: &mut Player, hit: Hit, world: &mut Contacts, cmds: &mut Commands) {
    match hit {
        Hit::Solid(collider) => {
            if collider.bottom() > player.rect.bottom() {
                player.land(collider.top());
            } else if collider.top() < player.rect.top() {
                player.bump_head(collider.bottom());
                cmds.play(SoundCue::Bump);
            }
        }
        Hit::Enemy(id) => {
            let Some(enemy) = world.enemies.get_mut(id) else {
                return;
            };
            let top = enemy.rect().top();
            if player.y_vel > 0.0 && player.rect.bottom() <= top + STOMP_TOLERANCE {
                stomp_enemy(player, enemy, world.now_ms, cmds);
            } else {
                touch_enemy(player, id, world, cmds);
            }
        }
        Hit::Boss => {
            let Some(boss) = world.boss.as_deref_mut() else {
                return;
            };
            let top = boss.rect().top();
            if player.y_vel > 0.0 && player.rect.bottom() <= top + STOMP_TOLERANCE {
                stomp_boss(player, boss, world.stomp_reward_threshold, world.now_ms, cmds);
            } else {
                touch_boss(player, cmds);
            }
        }
    }
}

fn stomp_enemy(player: &mut Player, enemy: &mut Enemy, now_ms: u64, cmds: &mut Commands) {
    let outcome = enemy.on_stomp(player.rect.center_x(), now_ms);
    if outcome == StompOutcome::Ignored {
        return;
    }
    let top = enemy.rect().top();
    player.rect.set_bottom(top);
    player.bounce(ENEMY_BOUNCE);
    match outcome {
        StompOutcome::Squashed | StompOutcome::Shelled => {
            if outcome == StompOutcome::Squashed {
                cmds.push(Intent::MarkDying(enemy.id));
            }
            cmds.push(Intent::SpawnScore {
                x: enemy.rect().x,
                y: top,
                value: STOMP_SCORE,
            });
            cmds.play(SoundCue::Stomp);
            cmds.emit(LevelEvent::EnemyStomped {
                id: enemy.id,
                score: STOMP_SCORE,
            });
        }
        StompOutcome::Kicked => {
            cmds.play(SoundCue::Kick);
            cmds.emit(LevelEvent::ShellKicked { id: enemy.id });
        }
        StompOutcome::Stopped | StompOutcome::Ignored => cmds.play(SoundCue::Stomp),
    }
}

fn touch_enemy(player: &mut Player, id: EntityId, world: &mut Contacts, cmds: &mut Commands) {
    let Some(enemy) = world.enemies.get_mut(id) else {
        return;
    };
    if enemy.is_resting_shell() {
        if enemy.kick(player.rect.center_x(), world.now_ms) {
            cmds.play(SoundCue::Kick);
            cmds.emit(LevelEvent::ShellKicked { id });
        }
        return;
    }
    if enemy.is_sliding_shell() {
        // A shell sliding away from the player (just kicked) is harmless.
        let away = Direction::from_sign(enemy.rect().center_x() - player.rect.center_x());
        if enemy.direction() == away {
            return;
        }
    }
    if enemy.is_harmful() {
        hurt_player(player, world.now_ms, cmds);
    }
}

fn stomp_boss(player: &mut Player, boss: &mut Boss, threshold: u32, now_ms: u64, cmds: &mut Commands) {
    if boss.is_dying() {
        return;
    }
    // Counted first so the lethal stomp still registers.
    boss.on_stomp();
    boss.receive_damage(1, now_ms);
    player.rect.set_bottom(boss.rect().top());
    player.bounce(BOSS_BOUNCE);
    cmds.play(SoundCue::BossHurt);
    cmds.emit(LevelEvent::BossDamaged { health: boss.health });
    if boss.take_stomp_reward(threshold) {
        let (x, y) = (player.rect.center_x(), player.rect.top() - REWARD_OFFSET);
        cmds.push(Intent::SpawnPowerUp { x, y });
        cmds.play(SoundCue::PowerupAppears);
        cmds.emit(LevelEvent::PowerUpSpawned { x, y });
    }
}

/// Boss side contact is always lethal.
fn touch_boss(player: &mut Player, cmds: &mut Commands) {
    if player.is_vulnerable() {
        player.start_death_jump();
        cmds.play(SoundCue::Death);
        cmds.emit(LevelEvent::PlayerDied);
    }
}

fn hurt_player(player: &mut Player, now_ms: u64, cmds: &mut Commands) {
    match player.take_hit(now_ms) {
        HitOutcome::Ignored => {}
        HitOutcome::Shrunk => cmds.emit(LevelEvent::PlayerHurt),
        HitOutcome::Killed => {
            cmds.play(SoundCue::Death);
            cmds.emit(LevelEvent::PlayerDied);
        }
    }
}

/// Sliding shells knock out every other live enemy they touch.
pub fn shells_vs_enemies(enemies: &mut Scene<Enemy>, now_ms: u64, cmds: &mut Commands) {
    let shells: Vec<(EntityId, Rect, Direction)> = enemies
        .iter()
        .filter(|e| e.is_sliding_shell())
        .map(|e| (e.id, e.rect(), e.direction()))
        .collect();
    for (shell_id, shell_rect, direction) in shells {
        for enemy in enemies.iter_mut() {
            if enemy.id == shell_id || !enemy.is_live() || !enemy.rect().intersects(&shell_rect) {
                continue;
            }
            if enemy.start_death_jump(direction, now_ms) {
                cmds.push(Intent::MarkDying(enemy.id));
                cmds.push(Intent::SpawnScore {
                    x: enemy.rect().x,
                    y: enemy.rect().top(),
                    value: KNOCKOUT_SCORE,
                });
                cmds.play(SoundCue::Kick);
                cmds.emit(LevelEvent::EnemyKnockedOut { id: enemy.id });
            }
        }
    }
}

/// Collect any power-up the player touches.
pub fn collect_powerups(player: &mut Player, powerups: &Scene<PowerUp>, cmds: &mut Commands) {
    if player.dead {
        return;
    }
    let reach = player.rect;
    for p in powerups.iter().filter(|p| p.rect().intersects(&reach)) {
        cmds.push(Intent::Despawn(p.id));
        cmds.push(Intent::SpawnScore {
            x: p.rect().x,
            y: p.rect().top(),
            value: POWERUP_SCORE,
        });
        player.set_big(true);
        cmds.play(SoundCue::Powerup);
        cmds.emit(LevelEvent::PowerUpCollected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::context::BossConfig;
    use crate::entities::enemy::EnemyState;

    const GROUND_TOP: f32 = 540.0;

    struct Fixture {
        ground: Vec<Rect>,
        terrain: Vec<Rect>,
        enemies: Scene<Enemy>,
        boss: Option<Boss>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                ground: vec![Rect::new(0.0, GROUND_TOP, 2400.0, 60.0)],
                terrain: Vec::new(),
                enemies: Scene::new(),
                boss: None,
            }
        }

        fn run(&mut self, player: &mut Player, now_ms: u64) -> Commands {
            let mut cmds = Commands::new();
            let mut world = Contacts {
                ground: &self.ground,
                terrain: &self.terrain,
                enemies: &mut self.enemies,
                boss: self.boss.as_mut(),
                stomp_reward_threshold: 4,
                level_width: 2400.0,
                now_ms,
            };
            move_player(player, &mut world, &mut cmds);
            cmds
        }
    }

    fn falling_player(x: f32, bottom: f32, y_vel: f32) -> Player {
        let mut p = Player::new(x, bottom);
        p.state = PlayerState::Fall;
        p.y_vel = y_vel;
        p
    }

    #[test]
    fn lands_on_ground() {
        let mut f = Fixture::new();
        let mut p = falling_player(100.0, GROUND_TOP - 2.0, 8.0);
        f.run(&mut p, 0);
        assert_eq!(p.rect.bottom(), GROUND_TOP);
        assert_eq!(p.y_vel, 0.0);
        assert_eq!(p.state, PlayerState::Walk);
    }

    #[test]
    fn head_bump_sends_player_down() {
        let mut f = Fixture::new();
        f.terrain.push(Rect::new(80.0, 300.0, 80.0, 40.0));
        let mut p = Player::new(100.0, 390.0);
        p.state = PlayerState::Jump;
        p.y_vel = -12.0;
        f.run(&mut p, 0);
        assert_eq!(p.rect.top(), 340.0);
        assert_eq!(p.y_vel, 7.0);
        assert_eq!(p.state, PlayerState::Fall);
    }

    #[test]
    fn walls_stop_the_player() {
        let mut f = Fixture::new();
        f.ground.push(Rect::new(200.0, 460.0, 60.0, 80.0));
        let mut p = Player::new(155.0, GROUND_TOP);
        p.x_vel = 6.0;
        f.run(&mut p, 0);
        assert_eq!(p.rect.right(), 200.0);
        assert_eq!(p.x_vel, 0.0);
    }

    #[test]
    fn vertical_move_resolves_before_horizontal_at_a_corner() {
        let mut f = Fixture::new();
        f.terrain.push(Rect::new(200.0, 400.0, 80.0, 40.0));
        let mut p = falling_player(158.0, 395.0, 8.0);
        p.x_vel = 6.0;
        f.run(&mut p, 0);
        // Still beside the block after the drop, so the sideways move hits
        // its wall instead of landing on its corner.
        assert_eq!(p.rect.right(), 200.0);
        assert_eq!(p.rect.bottom(), 403.0);
        assert_eq!(p.x_vel, 0.0);
        assert_eq!(p.state, PlayerState::Fall);
    }

    #[test]
    fn ground_beats_enemy_on_the_same_axis() {
        let mut f = Fixture::new();
        // Only reachable after the Y move, where the ground is found first.
        f.enemies.spawn(Enemy::goomba(EntityId(1), 100.0, GROUND_TOP + 40.0, Direction::Left, 0));
        let mut p = falling_player(100.0, GROUND_TOP - 2.0, 8.0);
        let cmds = f.run(&mut p, 0);
        assert_eq!(p.state, PlayerState::Walk);
        assert!(cmds.intents.is_empty());
        assert!(!p.dead);
    }

    #[test]
    fn stomping_a_goomba_marks_it_dying_and_bounces() {
        let mut f = Fixture::new();
        f.enemies.spawn(Enemy::goomba(EntityId(1), 100.0, GROUND_TOP, Direction::Left, 0));
        let mut p = falling_player(100.0, GROUND_TOP - 42.0, 5.0);
        let cmds = f.run(&mut p, 100);
        assert_eq!(p.y_vel, ENEMY_BOUNCE);
        assert_eq!(p.rect.bottom(), GROUND_TOP - 40.0);
        assert!(cmds.intents.contains(&Intent::MarkDying(EntityId(1))));
        assert!(cmds.sounds.contains(&SoundCue::Stomp));
        assert!(matches!(
            f.enemies.get(EntityId(1)).map(|e| e.state),
            Some(EnemyState::JumpedOn { since_ms: 100 })
        ));
    }

    #[test]
    fn walking_into_goomba_kills_small_player() {
        let mut f = Fixture::new();
        f.enemies.spawn(Enemy::goomba(EntityId(1), 130.0, GROUND_TOP, Direction::Left, 0));
        let mut p = Player::new(86.0, GROUND_TOP);
        p.x_vel = 6.0;
        let cmds = f.run(&mut p, 0);
        assert!(p.dead);
        assert_eq!(p.state, PlayerState::DeathJump);
        assert!(cmds.events.contains(&LevelEvent::PlayerDied));
    }

    #[test]
    fn side_touch_kicks_resting_shell_without_harm() {
        let mut f = Fixture::new();
        let mut shell = Enemy::koopa(EntityId(2), 130.0, GROUND_TOP, Direction::Left, 0);
        shell.on_stomp(0.0, 0);
        f.enemies.spawn(shell);
        let mut p = Player::new(86.0, GROUND_TOP);
        p.x_vel = 6.0;
        let cmds = f.run(&mut p, 10);
        assert!(!p.dead);
        assert!(cmds.sounds.contains(&SoundCue::Kick));
        let shell = f.enemies.get(EntityId(2)).unwrap();
        assert!(shell.is_sliding_shell());
        assert_eq!(shell.direction(), Direction::Right);
        // Still overlapping next tick while it slides away: no harm.
        f.run(&mut p, 26);
        assert!(!p.dead);
    }

    #[test]
    fn boss_stomp_damages_and_bounces() {
        let mut f = Fixture::new();
        f.boss = Some(Boss::new(EntityId(9), &BossConfig::default(), GROUND_TOP, 0));
        let boss_top = GROUND_TOP - 90.0;
        let mut p = falling_player(1930.0, boss_top - 2.0, 6.0);
        let cmds = f.run(&mut p, 500);
        let boss = f.boss.as_ref().unwrap();
        assert_eq!(boss.health, 2);
        assert_eq!(boss.stomp_count, 1);
        assert_eq!(p.y_vel, BOSS_BOUNCE);
        assert_eq!(p.rect.bottom(), boss_top);
        assert!(cmds.events.contains(&LevelEvent::BossDamaged { health: 2 }));
    }

    #[test]
    fn every_boss_stomp_counts_including_the_lethal_one() {
        let mut f = Fixture::new();
        f.boss = Some(Boss::new(EntityId(9), &BossConfig::default(), GROUND_TOP, 0));
        let boss_top = GROUND_TOP - 90.0;
        let mut counts = Vec::new();
        for stomp in 1..=3u64 {
            let mut p = falling_player(1930.0, boss_top - 2.0, 6.0);
            f.run(&mut p, stomp * 100);
            counts.push(f.boss.as_ref().unwrap().stomp_count);
        }
        assert_eq!(counts, vec![1, 2, 3]);
        let boss = f.boss.as_ref().unwrap();
        assert_eq!(boss.health, 0);
        assert!(boss.is_dying());

        // The flashing boss is no longer solid, so nothing more is counted.
        let mut p = falling_player(1930.0, boss_top - 2.0, 6.0);
        let cmds = f.run(&mut p, 400);
        assert_eq!(f.boss.as_ref().unwrap().stomp_count, 3);
        assert!(!cmds.intents.iter().any(|i| matches!(i, Intent::SpawnPowerUp { .. })));
    }

    #[test]
    fn fourth_stomp_spawns_reward_above_player() {
        let mut f = Fixture::new();
        let cfg = BossConfig { health: 10, ..Default::default() };
        let mut boss = Boss::new(EntityId(9), &cfg, GROUND_TOP, 0);
        boss.stomp_count = 3;
        f.boss = Some(boss);
        let boss_top = GROUND_TOP - 90.0;
        let mut p = falling_player(1930.0, boss_top - 2.0, 6.0);
        let cmds = f.run(&mut p, 500);
        let expected = Intent::SpawnPowerUp {
            x: p.rect.center_x(),
            y: p.rect.top() - REWARD_OFFSET,
        };
        assert!(cmds.intents.contains(&expected));
        assert_eq!(f.boss.as_ref().unwrap().stomp_count, 0);
    }

    #[test]
    fn boss_side_contact_starts_death_jump() {
        let mut f = Fixture::new();
        f.boss = Some(Boss::new(EntityId(9), &BossConfig::default(), GROUND_TOP, 0));
        let mut p = Player::new(1856.0, GROUND_TOP);
        p.set_big(true);
        p.x_vel = 6.0;
        f.run(&mut p, 0);
        assert!(p.dead);
    }

    #[test]
    fn dying_boss_ignores_contact() {
        let mut f = Fixture::new();
        let mut boss = Boss::new(EntityId(9), &BossConfig::default(), GROUND_TOP, 0);
        boss.start_dying(0);
        f.boss = Some(boss);
        let mut p = Player::new(1856.0, GROUND_TOP);
        p.x_vel = 6.0;
        f.run(&mut p, 0);
        assert!(!p.dead);
    }

    #[test]
    fn walking_off_a_ledge_falls() {
        let mut f = Fixture::new();
        f.ground = vec![Rect::new(0.0, GROUND_TOP, 100.0, 60.0)];
        let mut p = Player::new(150.0, GROUND_TOP);
        p.state = PlayerState::Walk;
        f.run(&mut p, 0);
        assert_eq!(p.state, PlayerState::Fall);
    }

    #[test]
    fn sliding_shell_knocks_out_walkers() {
        let mut enemies = Scene::new();
        let mut shell = Enemy::koopa(EntityId(1), 100.0, GROUND_TOP, Direction::Left, 0);
        shell.on_stomp(0.0, 0);
        shell.kick(0.0, 0);
        enemies.spawn(shell);
        enemies.spawn(Enemy::goomba(EntityId(2), 120.0, GROUND_TOP, Direction::Left, 0));
        enemies.spawn(Enemy::goomba(EntityId(3), 900.0, GROUND_TOP, Direction::Left, 0));
        let mut cmds = Commands::new();
        shells_vs_enemies(&mut enemies, 50, &mut cmds);
        assert!(cmds.intents.contains(&Intent::MarkDying(EntityId(2))));
        assert!(!cmds.intents.contains(&Intent::MarkDying(EntityId(3))));
        assert!(matches!(
            enemies.get(EntityId(2)).map(|e| e.state),
            Some(EnemyState::DeathJump { .. })
        ));
    }

    #[test]
    fn touching_a_mushroom_powers_up() {
        let mut powerups = Scene::new();
        powerups.spawn(PowerUp::mushroom(EntityId(5), 120.0, GROUND_TOP, Direction::Right));
        let mut p = Player::new(100.0, GROUND_TOP);
        let mut cmds = Commands::new();
        collect_powerups(&mut p, &powerups, &mut cmds);
        assert!(p.big);
        assert!(cmds.intents.contains(&Intent::Despawn(EntityId(5))));
        assert_eq!(cmds.sounds, vec![SoundCue::Powerup]);
    }
}
