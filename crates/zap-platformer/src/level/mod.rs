//! The level orchestrator: owns every entity collection and runs the
//! fixed per-tick protocol.
//!
//! Per active tick:
//! 1. regenerate random terrain when its interval has elapsed
//! 2. update the player and every other entity against the merged platforms,
//!    dropping enemies whose death has fully played out
//! 3. run the boss spawner
//! 4. resolve the player against ground, terrain, enemies and the boss
//! 5. commit queued spawns/despawns, then cull out-of-bounds entities
//! 6. scroll the viewport
//! 7. tick the clock and check death, time-out and exit
//!
//! Rendering (step 8) is a separate call so the host decides when to draw.
//! While frozen only the player, the camera and score popups advance.

pub mod camera;
pub mod collision;
pub mod render;
pub mod spawner;
pub mod transition;

use glam::Vec2;

use crate::api::context::{Commands, Intent, LevelConfig, TickContext};
use crate::api::types::{Direction, EntityId, LevelEvent, NextScene, SoundCue};
use crate::assets::registry::LevelSprites;
use crate::components::layer::RenderLayer;
use crate::components::terrain::{Placement, TerrainSet};
use crate::core::geometry::Rect;
use crate::core::rng::Rng;
use crate::core::scene::Scene;
use crate::core::time::elapsed;
use crate::entities::boss::Boss;
use crate::entities::enemy::{Enemy, EnemyKind};
use crate::entities::player::Player;
use crate::entities::powerup::PowerUp;
use crate::entities::score_popup::ScorePopup;
use crate::input::keys::KeySnapshot;
use crate::persist::save::{
    BossSnapshot, EnemyPose, EnemySnapshot, LevelSnapshot, SaveError, SaveSnapshot, SNAPSHOT_VERSION,
};
use crate::persist::stats::GameStats;

use self::camera::Viewport;
use self::collision::{collect_powerups, move_player, shells_vs_enemies, Contacts};
use self::render::{RenderSurface, SKY_COLOR};
use self::spawner::BossSpawner;
use self::transition::{finish_level, FreezeReason, LevelClock, Transition};

pub struct Level {
    config: LevelConfig,
    now_ms: u64,
    next_id: u32,
    player: Player,
    enemies: Scene<Enemy>,
    /// Stomped or knocked-out enemies playing out their death.
    dying: Scene<Enemy>,
    boss: Option<Boss>,
    spawner: Option<BossSpawner>,
    powerups: Scene<PowerUp>,
    popups: Scene<ScorePopup>,
    terrain: TerrainSet,
    rng: Rng,
    last_regen_ms: u64,
    viewport: Viewport,
    clock: LevelClock,
    frozen: bool,
    freeze: Option<FreezeReason>,
    transition: Transition,
    outcome: Option<NextScene>,
    sprites: LevelSprites,
    hud_score: u32,
    hud_lives: u32,
    cmds: Commands,
}

impl Level {
    pub fn new(config: LevelConfig, stats: &GameStats, now_ms: u64) -> Self {
        let ground_top = config.ground_top();
        let mut viewport = Viewport::new(config.viewport_width, config.viewport_height, config.level_width);
        viewport.look_at(stats.camera_start_x);
        let mut level = Self {
            terrain: TerrainSet::from_config(&config),
            player: Player::new(config.player_start_x, ground_top),
            rng: Rng::new(config.random_terrain.seed),
            clock: LevelClock::new(config.time_limit, now_ms),
            transition: Transition::new(config.transition_delay_ms),
            now_ms,
            next_id: 1,
            enemies: Scene::new(),
            dying: Scene::new(),
            boss: None,
            spawner: None,
            powerups: Scene::new(),
            popups: Scene::new(),
            last_regen_ms: now_ms,
            viewport,
            frozen: false,
            freeze: None,
            outcome: None,
            sprites: LevelSprites::default(),
            hud_score: stats.score,
            hud_lives: stats.lives,
            cmds: Commands::new(),
            config,
        };

        for spawn in level.config.enemies.clone() {
            level.spawn_enemy(spawn.kind, spawn.x, ground_top, spawn.direction);
        }
        if let Some(boss_config) = level.config.boss.clone() {
            let id = level.alloc_id();
            level.boss = Some(Boss::new(id, &boss_config, ground_top, now_ms));
            level.spawner = Some(BossSpawner::new(&boss_config, now_ms));
        }
        let placed = level.regenerate_terrain();
        log::info!(
            "level start: {}x{}, {} enemies, boss: {}, {} random blocks",
            level.config.level_width,
            level.config.level_height,
            level.enemies.len(),
            level.boss.is_some(),
            placed
        );
        level
    }

    /// Use resolved sprites instead of placeholders.
    pub fn with_sprites(mut self, sprites: LevelSprites) -> Self {
        self.sprites = sprites;
        self
    }

    // -- Accessors --------------------------------------------------------

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn enemies(&self) -> &Scene<Enemy> {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut Scene<Enemy> {
        &mut self.enemies
    }

    pub fn dying(&self) -> &Scene<Enemy> {
        &self.dying
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    pub fn boss_mut(&mut self) -> Option<&mut Boss> {
        self.boss.as_mut()
    }

    pub fn powerups(&self) -> &Scene<PowerUp> {
        &self.powerups
    }

    pub fn popups(&self) -> &Scene<ScorePopup> {
        &self.popups
    }

    pub fn terrain(&self) -> &TerrainSet {
        &self.terrain
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn clock(&self) -> &LevelClock {
        &self.clock
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze_reason(&self) -> Option<FreezeReason> {
        self.freeze
    }

    /// Set once the transition delay has run out.
    pub fn outcome(&self) -> Option<NextScene> {
        self.outcome
    }

    pub fn drain_sounds(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cmds.sounds)
    }

    pub fn drain_events(&mut self) -> Vec<LevelEvent> {
        std::mem::take(&mut self.cmds.events)
    }

    // -- Spawning ---------------------------------------------------------

    fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, x: f32, bottom: f32, direction: Direction) -> EntityId {
        let id = self.alloc_id();
        self.enemies.spawn(Enemy::new(id, kind, x, bottom, direction, self.now_ms));
        id
    }

    /// Replace the random terrain layer, keeping clear of every actor.
    fn regenerate_terrain(&mut self) -> usize {
        let mut avoid = vec![self.player.rect];
        avoid.extend(self.enemies.iter().map(Enemy::rect));
        avoid.extend(self.dying.iter().map(Enemy::rect));
        avoid.extend(self.powerups.iter().map(PowerUp::rect));
        avoid.extend(self.boss.iter().map(Boss::rect));
        let placement = Placement {
            config: &self.config.random_terrain,
            level_width: self.config.level_width,
            ground_top: self.config.ground_top(),
            exclusion: self.config.exclusion_zone(),
            avoid: &avoid,
        };
        let placed = self.terrain.regenerate(&mut self.rng, &placement);
        self.last_regen_ms = self.now_ms;
        placed
    }

    // -- Tick -------------------------------------------------------------

    /// Advance the level to `now_ms`. A non-advancing clock is a no-op.
    pub fn update(&mut self, stats: &mut GameStats, keys: &KeySnapshot, now_ms: u64) {
        let dt_ms = now_ms.saturating_sub(self.now_ms);
        if dt_ms == 0 || self.outcome.is_some() {
            return;
        }
        self.now_ms = now_ms;
        self.sync_transition_state();

        if self.frozen {
            self.update_frozen(keys, dt_ms);
        } else {
            self.update_active(stats, keys, dt_ms);
        }
        self.check_end_conditions();

        if self.transition.is_ready(now_ms) {
            let next = finish_level(stats, self.player.dead, self.clock.time);
            self.outcome = Some(next);
            self.cmds.emit(LevelEvent::Finished(next));
        }
        self.hud_score = stats.score;
        self.hud_lives = stats.lives;
    }

    /// `Some(true)` freezes, `Some(false)` releases unless a terminal
    /// condition holds, `None` leaves things as they are.
    fn sync_transition_state(&mut self) {
        let terminal = self.freeze.is_some() || self.player.dead;
        let was_frozen = self.frozen;
        self.frozen = match self.player.in_transition_state {
            Some(true) => true,
            Some(false) => terminal,
            None => self.frozen || terminal,
        };
        if was_frozen && !self.frozen {
            self.clock.resume(self.now_ms);
        }
    }

    fn update_frozen(&mut self, keys: &KeySnapshot, dt_ms: u64) {
        self.player.update(keys, self.now_ms);
        self.viewport.follow(&self.player.rect, self.player.x_vel);
        self.update_popups(dt_ms);
        self.sync_transition_state();
    }

    fn update_active(&mut self, stats: &mut GameStats, keys: &KeySnapshot, dt_ms: u64) {
        let now_ms = self.now_ms;
        let level_width = self.config.level_width;

        if elapsed(now_ms, self.last_regen_ms, self.config.random_terrain.interval_ms) {
            let placed = self.regenerate_terrain();
            log::debug!("random terrain regenerated: {} blocks", placed);
            self.cmds.emit(LevelEvent::TerrainRegenerated { blocks: placed as u32 });
        }

        self.player.update(keys, now_ms);
        let ctx = TickContext {
            now_ms,
            dt_ms,
            player: self.player.view(),
            platforms: self.terrain.platforms(),
            level_width,
            level_height: self.config.level_height,
        };
        for enemy in self.enemies.iter_mut().chain(self.dying.iter_mut()) {
            if let Err(fault) = enemy.update(&ctx) {
                log::warn!("enemy {:?} skipped this tick: {}", enemy.id, fault);
            }
        }
        let level_height = self.config.level_height;
        self.enemies.retain(|e| !e.is_resolved(now_ms, level_height));
        self.dying.retain(|e| !e.is_resolved(now_ms, level_height));
        if let Some(boss) = self.boss.as_mut() {
            if let Err(fault) = boss.update(&ctx, &mut self.cmds) {
                log::warn!("boss skipped this tick: {}", fault);
            }
        }
        for powerup in self.powerups.iter_mut() {
            if let Err(fault) = powerup.update(&ctx, &mut self.cmds) {
                log::warn!("power-up {:?} skipped this tick: {}", powerup.id, fault);
            }
        }
        self.update_popups(dt_ms);
        shells_vs_enemies(&mut self.enemies, now_ms, &mut self.cmds);

        if let (Some(spawner), Some(boss)) = (self.spawner.as_mut(), self.boss.as_mut()) {
            let live = self.enemies.iter().filter(|e| e.is_live()).count();
            spawner.update(now_ms, boss, live, level_width, &mut self.cmds);
        }

        let mut contacts = Contacts {
            ground: self.terrain.ground(),
            terrain: self.terrain.procedural(),
            enemies: &mut self.enemies,
            boss: self.boss.as_mut(),
            stomp_reward_threshold: self.config.boss.as_ref().map_or(0, |b| b.stomp_reward_threshold),
            level_width,
            now_ms,
        };
        move_player(&mut self.player, &mut contacts, &mut self.cmds);
        collect_powerups(&mut self.player, &self.powerups, &mut self.cmds);

        self.commit(stats);
        self.cull();
        self.viewport.follow(&self.player.rect, self.player.x_vel);
        if let Some(cue) = self.clock.tick(now_ms) {
            self.cmds.play(cue);
        }
    }

    fn update_popups(&mut self, dt_ms: u64) {
        let (now_ms, level_height) = (self.now_ms, self.config.level_height);
        let expired: Vec<EntityId> = self
            .popups
            .iter_mut()
            .filter_map(|p| (!p.update(now_ms, dt_ms, level_height)).then_some(p.id))
            .collect();
        for id in expired {
            self.popups.despawn(id);
        }
    }

    /// Apply every intent queued during the tick.
    fn commit(&mut self, stats: &mut GameStats) {
        for intent in self.cmds.take_intents() {
            match intent {
                Intent::Despawn(id) => self.despawn(id),
                Intent::MarkDying(id) => {
                    if let Some(enemy) = self.enemies.despawn(id) {
                        self.dying.spawn(enemy);
                    }
                }
                Intent::SpawnEnemy { kind, x, bottom, direction } => {
                    self.spawn_enemy(kind, x, bottom, direction);
                }
                Intent::SpawnPowerUp { x, y } => {
                    let id = self.alloc_id();
                    self.powerups
                        .spawn(PowerUp::mushroom(id, x, y, self.player.direction));
                }
                Intent::SpawnScore { x, y, value } => {
                    stats.add_score(value);
                    let id = self.alloc_id();
                    self.popups.spawn(ScorePopup::new(id, x, y, value, self.now_ms));
                }
            }
        }
    }

    fn despawn(&mut self, id: EntityId) {
        if self.enemies.despawn(id).is_some()
            || self.dying.despawn(id).is_some()
            || self.powerups.despawn(id).is_some()
            || self.popups.despawn(id).is_some()
        {
            return;
        }
        if self.boss.as_ref().is_some_and(|b| b.id == id) {
            log::info!("boss removed");
            self.boss = None;
            self.spawner = None;
        }
    }

    /// Drop entities that left the level sideways or fell out the bottom.
    fn cull(&mut self) {
        let (width, height) = (self.config.level_width, self.config.level_height);
        let inside = |r: Rect| !(r.right() < 0.0 || r.left() > width || r.top() > height);
        self.enemies.retain(|e| inside(e.rect()));
        self.dying.retain(|e| inside(e.rect()));
        self.powerups.retain(|p| inside(p.rect()));
    }

    fn check_end_conditions(&mut self) {
        if self.freeze.is_some() {
            return;
        }
        let player = &mut self.player;
        let reason = if player.rect.y > self.config.level_height {
            if !player.dead {
                player.dead = true;
                player.x_vel = 0.0;
                self.cmds.play(SoundCue::Death);
                self.cmds.emit(LevelEvent::PlayerDied);
            }
            Some(FreezeReason::PlayerDead)
        } else if player.dead {
            Some(FreezeReason::PlayerDead)
        } else if self.clock.is_expired() {
            player.start_death_jump();
            self.cmds.play(SoundCue::Death);
            self.cmds.emit(LevelEvent::PlayerDied);
            Some(FreezeReason::TimeOut)
        } else if self.boss.is_none()
            && player.rect.right() >= self.config.level_width - self.config.exit_width
        {
            self.cmds.play(SoundCue::StageClear);
            self.cmds.emit(LevelEvent::LevelCleared);
            Some(FreezeReason::Cleared)
        } else {
            None
        };
        if let Some(reason) = reason {
            log::info!("level frozen: {:?}", reason);
            self.freeze = Some(reason);
            self.frozen = true;
            self.transition.start(self.now_ms);
        }
    }

    // -- Rendering --------------------------------------------------------

    /// Composite the level back to front in screen space.
    pub fn render<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        let vp = &self.viewport;
        let screen = |r: Rect| {
            let at = vp.to_screen(Vec2::new(r.x, r.y));
            Rect::new(at.x, at.y, r.w, r.h)
        };
        let sprites = &self.sprites;

        surface.begin_layer(RenderLayer::Sky);
        surface.fill(SKY_COLOR);

        surface.begin_layer(RenderLayer::Background);
        let backdrop = Rect::new(0.0, 0.0, self.config.level_width, self.config.level_height);
        surface.draw_sprite(sprites.background, 0, screen(backdrop), false, 1.0);

        surface.begin_layer(RenderLayer::Terrain);
        for block in self.terrain.ground().iter().filter(|r| vp.is_rect_visible(r)) {
            let sprite = if self.config.pipes.contains(block) {
                sprites.pipe
            } else {
                sprites.ground
            };
            surface.draw_sprite(sprite, 0, screen(*block), false, 1.0);
        }
        for block in self.terrain.terrain().filter(|r| vp.is_rect_visible(r)) {
            surface.draw_sprite(sprites.block, 0, screen(*block), false, 1.0);
        }

        surface.begin_layer(RenderLayer::Entities);
        for p in self.powerups.iter() {
            surface.draw_sprite(sprites.mushroom, 0, screen(p.rect()), false, 1.0);
        }
        for e in self.enemies.iter() {
            draw_enemy(surface, sprites, e, screen(e.rect()));
        }
        if let Some(boss) = &self.boss {
            let alpha = if boss.is_visible() { 1.0 } else { 0.0 };
            let flip = boss.physics.direction == Direction::Right;
            surface.draw_sprite(sprites.boss, boss.sprite_frame(), screen(boss.rect()), flip, alpha);
        }
        let player_sprite = sprites.by_name(self.player.sprite_name());
        surface.draw_sprite(
            player_sprite,
            self.player.sprite_frame(),
            screen(self.player.rect),
            self.player.direction == Direction::Left,
            1.0,
        );

        surface.begin_layer(RenderLayer::DeathPending);
        for e in self.dying.iter() {
            draw_enemy(surface, sprites, e, screen(e.rect()));
        }

        surface.begin_layer(RenderLayer::Hud);
        for p in self.popups.iter() {
            let at = vp.to_screen(Vec2::new(p.x, p.y));
            surface.draw_text(&p.text(), at.x, at.y);
        }
        surface.draw_text(&format!("SCORE {:06}", self.hud_score), 20.0, 20.0);
        surface.draw_text(&format!("LIVES {}", self.hud_lives), 300.0, 20.0);
        surface.draw_text(&format!("TIME {:03}", self.clock.time), vp.width - 140.0, 20.0);
    }

    // -- Persistence ------------------------------------------------------

    pub fn snapshot(&self, stats: &GameStats, timestamp: u64) -> SaveSnapshot {
        let enemies = self
            .enemies
            .iter()
            .filter(|e| e.is_live())
            .map(|e| EnemySnapshot {
                kind: e.kind,
                x: e.rect().x,
                bottom: e.rect().bottom(),
                direction: e.direction(),
                pose: if e.is_sliding_shell() {
                    EnemyPose::SlidingShell
                } else if e.is_resting_shell() {
                    EnemyPose::Shell
                } else {
                    EnemyPose::Walking
                },
            })
            .collect();
        SaveSnapshot {
            version: SNAPSHOT_VERSION,
            timestamp,
            stats: stats.clone(),
            level: LevelSnapshot {
                now_ms: self.now_ms,
                player: self.player.clone(),
                clock: self.clock.clone(),
                enemies,
                boss: self.boss.as_ref().filter(|b| !b.is_dying()).map(|b| BossSnapshot {
                    x: b.rect().x,
                    health: b.health,
                    stomp_count: b.stomp_count,
                }),
                random_terrain: self.terrain.random().to_vec(),
                rng: self.rng.clone(),
                camera_x: self.viewport.x,
            },
        }
    }

    /// Validate a snapshot against this level's config, then apply it.
    /// On error the level is left untouched.
    pub fn restore(&mut self, snapshot: &SaveSnapshot, stats: &mut GameStats) -> Result<(), SaveError> {
        self.validate(snapshot)?;
        let level = &snapshot.level;
        let now_ms = level.now_ms;
        let ground_top = self.config.ground_top();

        self.now_ms = now_ms;
        self.player = level.player.clone();
        self.clock = level.clock.clone();
        self.enemies.clear();
        self.dying.clear();
        self.powerups.clear();
        self.popups.clear();
        for saved in &level.enemies {
            let id = self.alloc_id();
            self.enemies.spawn(rebuild_enemy(id, saved, now_ms));
        }
        self.boss = None;
        self.spawner = None;
        if let (Some(saved), Some(boss_config)) = (&level.boss, self.config.boss.clone()) {
            let id = self.alloc_id();
            let mut boss = Boss::new(id, &boss_config, ground_top, now_ms);
            boss.physics.rect.x = saved.x;
            boss.health = saved.health;
            boss.stomp_count = saved.stomp_count;
            self.boss = Some(boss);
            self.spawner = Some(BossSpawner::new(&boss_config, now_ms));
        }
        self.terrain.replace_random(level.random_terrain.clone());
        self.rng = level.rng.clone();
        self.last_regen_ms = now_ms;
        self.viewport.look_at(level.camera_x);
        self.frozen = false;
        self.freeze = None;
        self.transition = Transition::new(self.config.transition_delay_ms);
        self.outcome = None;
        self.cmds.clear();
        *stats = snapshot.stats.clone();
        self.hud_score = stats.score;
        self.hud_lives = stats.lives;
        self.sync_transition_state();
        log::info!("level restored at {} ms", now_ms);
        Ok(())
    }

    fn validate(&self, snapshot: &SaveSnapshot) -> Result<(), SaveError> {
        let reject = |why: &str| Err(SaveError::Mismatch(why.to_string()));
        if snapshot.version != SNAPSHOT_VERSION {
            return reject("unsupported snapshot version");
        }
        let level = &snapshot.level;
        let bounds = Rect::new(0.0, 0.0, self.config.level_width, self.config.level_height);
        let inside = |r: &Rect| {
            r.is_finite()
                && !r.is_degenerate()
                && r.left() >= bounds.left()
                && r.right() <= bounds.right()
                && r.bottom() <= bounds.bottom()
        };
        if !inside(&level.player.rect) || !level.player.x_vel.is_finite() || !level.player.y_vel.is_finite() {
            return reject("player outside the level");
        }
        if level.player.dead {
            return reject("player is dead");
        }
        if !level.random_terrain.iter().all(|r| inside(r)) {
            return reject("terrain block outside the level");
        }
        for enemy in &level.enemies {
            if !enemy.x.is_finite() || !enemy.bottom.is_finite() {
                return reject("enemy position is not finite");
            }
            if enemy.kind == EnemyKind::Goomba && enemy.pose != EnemyPose::Walking {
                return reject("goombas have no shell");
            }
        }
        match (&level.boss, &self.config.boss) {
            (Some(_), None) => return reject("level has no boss"),
            (Some(b), Some(_)) if b.health <= 0 || !b.x.is_finite() => return reject("invalid boss state"),
            _ => {}
        }
        if level.clock.time > self.config.time_limit {
            return reject("clock exceeds the time limit");
        }
        Ok(())
    }
}

fn draw_enemy<S: RenderSurface + ?Sized>(surface: &mut S, sprites: &LevelSprites, enemy: &Enemy, dest: Rect) {
    let sprite = sprites.by_name(enemy.kind.sprite_name());
    let flip = enemy.direction() == Direction::Right;
    surface.draw_sprite(sprite, enemy.sprite_frame(), dest, flip, 1.0);
}

fn rebuild_enemy(id: EntityId, saved: &EnemySnapshot, now_ms: u64) -> Enemy {
    let mut enemy = Enemy::new(id, saved.kind, saved.x, saved.bottom, saved.direction, now_ms);
    if saved.pose != EnemyPose::Walking {
        let center = enemy.rect().center_x();
        enemy.on_stomp(center, now_ms);
        if saved.pose == EnemyPose::SlidingShell {
            // Kicked from behind so it keeps its saved direction.
            enemy.kick(center - saved.direction.sign(), now_ms);
        }
    }
    enemy
}

#[cfg(test)]
mod tests {
    use super::render::recording::{Draw, RecordingSurface};
    use super::*;
    use crate::api::context::{BossConfig, RandomTerrainConfig};
    use crate::entities::player::PlayerState;

    const GROUND_TOP: f32 = 540.0;

    /// Default geometry without pits, enemies, boss or random blocks.
    fn quiet_config() -> LevelConfig {
        LevelConfig {
            pits: Vec::new(),
            enemies: Vec::new(),
            boss: None,
            random_terrain: RandomTerrainConfig {
                block_count: 0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn run(level: &mut Level, stats: &mut GameStats, keys: KeySnapshot, from_ms: u64, to_ms: u64) {
        let mut now = from_ms;
        while now < to_ms {
            now = (now + 16).min(to_ms);
            level.update(stats, &keys, now);
        }
    }

    #[test]
    fn zero_step_changes_nothing() {
        let mut stats = GameStats::default();
        let mut level = Level::new(LevelConfig::default(), &stats, 0);
        run(&mut level, &mut stats, KeySnapshot::NONE, 0, 320);
        let player = level.player().clone();
        let enemies: Vec<_> = level.enemies().iter().map(|e| e.physics.clone()).collect();
        let boss = level.boss().map(|b| b.physics.clone());

        level.update(&mut stats, &KeySnapshot { right: true, jump: true, ..Default::default() }, 320);
        level.update(&mut stats, &KeySnapshot::NONE, 100);

        assert_eq!(level.player(), &player);
        let after: Vec<_> = level.enemies().iter().map(|e| e.physics.clone()).collect();
        assert_eq!(after, enemies);
        assert_eq!(level.boss().map(|b| b.physics.clone()), boss);
    }

    #[test]
    fn falling_out_of_the_level_freezes_then_transitions() {
        let mut stats = GameStats::default();
        let mut level = Level::new(quiet_config(), &stats, 0);
        let goomba = level.spawn_enemy(EnemyKind::Goomba, 1000.0, GROUND_TOP, Direction::Left);
        level.player_mut().rect.y = 601.0;
        level.update(&mut stats, &KeySnapshot::NONE, 16);

        assert!(level.player().dead);
        assert!(level.is_frozen());
        assert_eq!(level.freeze_reason(), Some(FreezeReason::PlayerDead));
        assert!(level.drain_sounds().contains(&SoundCue::Death));

        let frozen_at = level.enemies().get(goomba).map(|e| e.rect());
        level.update(&mut stats, &KeySnapshot::NONE, 16 + 2999);
        assert_eq!(level.outcome(), None);
        assert_eq!(level.enemies().get(goomba).map(|e| e.rect()), frozen_at);

        level.update(&mut stats, &KeySnapshot::NONE, 16 + 3000);
        assert_eq!(level.outcome(), Some(NextScene::LoadScreen));
        assert_eq!(stats.lives, 2);
        assert!(level.drain_events().contains(&LevelEvent::Finished(NextScene::LoadScreen)));
    }

    #[test]
    fn last_life_lost_is_game_over() {
        let mut stats = GameStats { lives: 1, camera_start_x: 400.0, ..Default::default() };
        let mut level = Level::new(quiet_config(), &stats, 0);
        level.player_mut().rect.y = 601.0;
        run(&mut level, &mut stats, KeySnapshot::NONE, 0, 3100);
        assert_eq!(level.outcome(), Some(NextScene::GameOver));
        assert_eq!(stats.camera_start_x, 0.0);
    }

    #[test]
    fn clock_running_out_starts_death_jump_and_times_out() {
        let mut stats = GameStats::default();
        let config = LevelConfig { time_limit: 1, ..quiet_config() };
        let mut level = Level::new(config, &stats, 0);
        run(&mut level, &mut stats, KeySnapshot::NONE, 0, 1008);
        assert_eq!(level.clock().time, 0);
        assert_eq!(level.freeze_reason(), Some(FreezeReason::TimeOut));
        assert_eq!(level.player().state, PlayerState::DeathJump);

        run(&mut level, &mut stats, KeySnapshot::NONE, 1008, 1008 + 2999);
        assert_eq!(level.outcome(), None);
        run(&mut level, &mut stats, KeySnapshot::NONE, 1008 + 2999, 1008 + 3000);
        assert_eq!(level.outcome(), Some(NextScene::TimeOut));
        assert_eq!(stats.lives, 2);
    }

    #[test]
    fn reaching_the_exit_clears_the_level() {
        let mut stats = GameStats { camera_start_x: 300.0, score: 50, ..Default::default() };
        let mut level = Level::new(quiet_config(), &stats, 0);
        level.player_mut().rect.x = 2350.0;
        level.update(&mut stats, &KeySnapshot::NONE, 16);
        assert_eq!(level.freeze_reason(), Some(FreezeReason::Cleared));
        assert!(level.drain_sounds().contains(&SoundCue::StageClear));

        run(&mut level, &mut stats, KeySnapshot::NONE, 16, 3016);
        assert_eq!(level.outcome(), Some(NextScene::MainMenu));
        assert_eq!(stats.lives, 3);
        assert_eq!(stats.top_score, 50);
        assert_eq!(stats.camera_start_x, 0.0);
    }

    #[test]
    fn exit_is_closed_while_the_boss_lives() {
        let mut stats = GameStats::default();
        let config = LevelConfig { boss: Some(BossConfig { x: 200.0, ..Default::default() }), ..quiet_config() };
        let mut level = Level::new(config, &stats, 0);
        level.player_mut().rect.x = 2350.0;
        level.update(&mut stats, &KeySnapshot::NONE, 16);
        assert_eq!(level.freeze_reason(), None);
    }

    #[test]
    fn stomped_goomba_moves_to_death_layer_then_disappears() {
        let mut stats = GameStats::default();
        let mut level = Level::new(quiet_config(), &stats, 0);
        let id = level.spawn_enemy(EnemyKind::Goomba, 200.0, GROUND_TOP, Direction::Left);
        let player = level.player_mut();
        player.rect = Rect::from_bottom_left(200.0, GROUND_TOP - 42.0, 40.0, 40.0);
        player.state = PlayerState::Fall;
        player.y_vel = 5.0;

        level.update(&mut stats, &KeySnapshot::NONE, 16);
        assert!(!level.enemies().contains(id));
        assert!(level.dying().contains(id));
        assert_eq!(stats.score, 100);
        assert_eq!(level.popups().len(), 1);
        assert!(level.player().y_vel < 0.0);

        run(&mut level, &mut stats, KeySnapshot::NONE, 16, 512);
        assert!(level.dying().contains(id));
        // Dropped by the dispatch pass of the tick its linger runs out.
        level.update(&mut stats, &KeySnapshot::NONE, 516);
        assert!(level.dying().is_empty());
        assert_eq!(stats.score, 100);
    }

    #[test]
    fn knocked_out_enemy_leaves_once_below_the_level() {
        let mut stats = GameStats::default();
        let mut level = Level::new(quiet_config(), &stats, 0);
        let id = level.spawn_enemy(EnemyKind::Koopa, 900.0, GROUND_TOP, Direction::Left);
        level.update(&mut stats, &KeySnapshot::NONE, 16);
        if let Some(e) = level.enemies_mut().get_mut(id) {
            e.start_death_jump(Direction::Right, 16);
        }
        let mut now = 16;
        while level.enemies().contains(id) && now < 5000 {
            now += 16;
            level.update(&mut stats, &KeySnapshot::NONE, now);
        }
        assert!(now < 5000);
        assert!(level.dying().is_empty());
    }

    #[test]
    fn fourth_boss_stomp_spawns_mushroom_above_player() {
        let mut stats = GameStats::default();
        let boss_config = BossConfig { x: 1000.0, health: 10, spawn_interval_ms: 60_000, ..Default::default() };
        let config = LevelConfig { boss: Some(boss_config), ..quiet_config() };
        let mut level = Level::new(config, &stats, 0);
        if let Some(boss) = level.boss_mut() {
            boss.stomp_count = 3;
        }
        let boss_top = GROUND_TOP - 90.0;
        let player = level.player_mut();
        player.rect = Rect::from_bottom_left(1030.0, boss_top - 2.0, 40.0, 40.0);
        player.state = PlayerState::Fall;
        player.y_vel = 5.0;

        level.update(&mut stats, &KeySnapshot::NONE, 16);
        let boss = level.boss().unwrap();
        assert_eq!(boss.health, 9);
        assert_eq!(boss.stomp_count, 0);
        assert_eq!(level.player().y_vel, -10.0);

        let player_rect = level.player().rect;
        let mushroom = level.powerups().iter().next().unwrap();
        assert_eq!(mushroom.rect().center_x(), player_rect.center_x());
        assert_eq!(mushroom.rect().bottom(), player_rect.top() - 16.0);
        assert!(level.drain_sounds().contains(&SoundCue::PowerupAppears));
    }

    #[test]
    fn defeated_boss_flashes_then_is_removed() {
        let mut stats = GameStats::default();
        let boss_config = BossConfig { x: 1000.0, health: 1, ..Default::default() };
        let config = LevelConfig { boss: Some(boss_config), ..quiet_config() };
        let mut level = Level::new(config, &stats, 0);
        let player = level.player_mut();
        player.rect = Rect::from_bottom_left(1030.0, GROUND_TOP - 92.0, 40.0, 40.0);
        player.state = PlayerState::Fall;
        player.y_vel = 5.0;

        level.update(&mut stats, &KeySnapshot::NONE, 16);
        assert!(level.boss().is_some_and(|b| b.is_dying()));
        run(&mut level, &mut stats, KeySnapshot::NONE, 16, 1200);
        assert!(level.boss().is_none());
        assert!(level.drain_events().contains(&LevelEvent::BossDefeated));
    }

    #[test]
    fn boss_spawns_minions_when_enemies_run_low() {
        let mut stats = GameStats::default();
        let boss_config = BossConfig { x: 1800.0, spawn_interval_ms: 1000, ..Default::default() };
        let config = LevelConfig { boss: Some(boss_config), ..quiet_config() };
        let mut level = Level::new(config, &stats, 0);
        run(&mut level, &mut stats, KeySnapshot::NONE, 0, 1008);
        assert_eq!(level.enemies().len(), 2);
        let kinds: Vec<_> = level.enemies().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EnemyKind::Goomba, EnemyKind::Koopa]);
    }

    #[test]
    fn camera_stays_clamped_while_running() {
        let mut stats = GameStats::default();
        let config = LevelConfig { pipes: Vec::new(), fixed_terrain: Vec::new(), ..quiet_config() };
        let mut level = Level::new(config, &stats, 0);
        let keys = KeySnapshot { right: true, ..Default::default() };
        let mut now = 0;
        for _ in 0..600 {
            now += 16;
            level.update(&mut stats, &keys, now);
            let x = level.viewport().x;
            assert!((0.0..=1600.0).contains(&x), "viewport x {}", x);
        }
        assert!(level.viewport().x > 0.0);
    }

    #[test]
    fn camera_keeps_following_while_frozen() {
        let mut stats = GameStats::default();
        let mut level = Level::new(quiet_config(), &stats, 0);
        let player = level.player_mut();
        player.rect.x = 500.0;
        player.in_transition_state = Some(true);
        let keys = KeySnapshot { right: true, ..Default::default() };
        run(&mut level, &mut stats, keys, 0, 160);
        assert!(level.is_frozen());
        assert_eq!(level.player().rect.x, 500.0);
        assert!(level.viewport().x > 0.0);
    }

    #[test]
    fn transition_state_freezes_and_releases() {
        let mut stats = GameStats::default();
        let mut level = Level::new(quiet_config(), &stats, 0);
        let id = level.spawn_enemy(EnemyKind::Goomba, 1000.0, GROUND_TOP, Direction::Left);
        level.player_mut().in_transition_state = Some(true);
        level.update(&mut stats, &KeySnapshot::NONE, 16);
        assert!(level.is_frozen());
        let x = level.enemies().get(id).map(|e| e.rect().x);
        level.update(&mut stats, &KeySnapshot::NONE, 32);
        assert_eq!(level.enemies().get(id).map(|e| e.rect().x), x);

        level.player_mut().in_transition_state = None;
        level.update(&mut stats, &KeySnapshot::NONE, 48);
        assert!(level.is_frozen());

        level.player_mut().in_transition_state = Some(false);
        level.update(&mut stats, &KeySnapshot::NONE, 64);
        assert!(!level.is_frozen());
        assert_ne!(level.enemies().get(id).map(|e| e.rect().x), x);
    }

    #[test]
    fn faulty_entity_is_skipped_not_fatal() {
        let mut stats = GameStats::default();
        let mut level = Level::new(quiet_config(), &stats, 0);
        let bad = level.spawn_enemy(EnemyKind::Goomba, 1000.0, GROUND_TOP, Direction::Left);
        let good = level.spawn_enemy(EnemyKind::Goomba, 1400.0, GROUND_TOP, Direction::Left);
        if let Some(e) = level.enemies_mut().get_mut(bad) {
            e.physics.vel.x = f32::NAN;
        }
        level.update(&mut stats, &KeySnapshot::NONE, 16);
        assert_eq!(level.enemies().get(good).map(|e| e.rect().x), Some(1398.0));
        assert!(level.enemies().contains(bad));
    }

    #[test]
    fn random_terrain_regenerates_on_interval() {
        let mut stats = GameStats::default();
        let mut config = quiet_config();
        config.random_terrain.block_count = 6;
        config.random_terrain.interval_ms = 2000;
        let mut level = Level::new(config, &stats, 0);
        let initial = level.terrain().random().to_vec();
        run(&mut level, &mut stats, KeySnapshot::NONE, 0, 2000);
        let events = level.drain_events();
        assert!(events.iter().any(|e| matches!(e, LevelEvent::TerrainRegenerated { .. })));
        assert_ne!(level.terrain().random(), initial.as_slice());
        let zone = level.config().exclusion_zone().unwrap();
        assert!(level.terrain().random().iter().all(|b| !b.intersects(&zone)));
    }

    #[test]
    fn snapshot_restores_into_a_fresh_level() {
        let mut stats = GameStats { score: 1200, ..Default::default() };
        let mut level = Level::new(LevelConfig::default(), &stats, 0);
        run(&mut level, &mut stats, KeySnapshot::NONE, 0, 480);
        let snap = level.snapshot(&stats, 42);

        let mut other_stats = GameStats::default();
        let mut other = Level::new(LevelConfig::default(), &other_stats, 0);
        other.restore(&snap, &mut other_stats).unwrap();

        assert_eq!(other_stats, stats);
        assert_eq!(other.now_ms(), 480);
        assert_eq!(other.player(), level.player());
        assert_eq!(other.clock(), level.clock());
        assert_eq!(other.terrain().random(), level.terrain().random());
        assert_eq!(other.enemies().len(), level.enemies().len());
        assert_eq!(other.boss().map(|b| b.health), level.boss().map(|b| b.health));
        assert_eq!(other.snapshot(&other_stats, 42), snap);
    }

    #[test]
    fn invalid_snapshot_is_rejected_and_level_untouched() {
        let mut stats = GameStats::default();
        let mut level = Level::new(LevelConfig::default(), &stats, 0);
        let mut snap = level.snapshot(&stats, 0);
        snap.level.player.rect.x = f32::NAN;
        snap.stats.score = 999;
        assert!(matches!(level.restore(&snap, &mut stats), Err(SaveError::Mismatch(_))));
        assert_eq!(stats.score, 0);

        let mut quiet = Level::new(quiet_config(), &stats, 0);
        let with_boss = level.snapshot(&stats, 0);
        assert!(quiet.restore(&with_boss, &mut stats).is_err());
    }

    #[test]
    fn render_draws_layers_back_to_front() {
        let stats = GameStats::default();
        let level = Level::new(LevelConfig::default(), &stats, 0);
        let mut surface = RecordingSurface::default();
        level.render(&mut surface);
        assert_eq!(surface.layers(), RenderLayer::ALL.to_vec());
        assert_eq!(surface.draws[0], Draw::Layer(RenderLayer::Sky));
        assert_eq!(surface.draws[1], Draw::Fill(SKY_COLOR));
        assert!(surface.draws.contains(&Draw::Text("TIME 300".to_string())));
    }

    #[test]
    fn render_offsets_sprites_by_the_camera() {
        let stats = GameStats { camera_start_x: 600.0, ..Default::default() };
        let config = LevelConfig { boss: Some(BossConfig { x: 1000.0, ..Default::default() }), ..quiet_config() };
        let level = Level::new(config, &stats, 0);
        assert_eq!(level.viewport().x, 600.0);
        let boss_rect = level.boss().map(|b| b.rect()).unwrap();
        let mut surface = RecordingSurface::default();
        level.render(&mut surface);
        let on_screen = Rect::new(boss_rect.x - 600.0, boss_rect.y, boss_rect.w, boss_rect.h);
        assert!(surface
            .draws
            .iter()
            .any(|d| matches!(d, Draw::Sprite { dest, .. } if *dest == on_screen)));
    }

    #[test]
    fn dying_boss_renders_invisible_frames_with_zero_alpha() {
        let stats = GameStats::default();
        let config = LevelConfig { boss: Some(BossConfig { x: 300.0, ..Default::default() }), ..quiet_config() };
        let mut level = Level::new(config, &stats, 0);
        if let Some(boss) = level.boss_mut() {
            boss.start_dying(0);
            boss.dying = boss.dying.map(|mut d| {
                d.visible = false;
                d
            });
        }
        let boss_rect = level.boss().map(|b| b.rect()).unwrap();
        let mut surface = RecordingSurface::default();
        level.render(&mut surface);
        let boss_alpha = surface.draws.iter().find_map(|d| match d {
            Draw::Sprite { dest, alpha, .. } if *dest == boss_rect => Some(*alpha),
            _ => None,
        });
        assert_eq!(boss_alpha, Some(0.0));
    }
}
