//! The boss: a multi-state actor with health, chase AI and a death-flash
//! sequence.
//!
//! `dying` is orthogonal to [`BossState`]. Once set it suspends the state
//! handlers and only the flash sequence runs until the boss asks to be
//! removed.

use std::collections::HashMap;

use crate::api::context::{BossConfig, Commands, Intent, TickContext};
use crate::api::types::{Direction, EntityId, LevelEvent, SoundCue};
use crate::components::animation::{AnimationComponent, AnimationDef};
use crate::components::physics::{ActorFault, ActorPhysics};
use crate::core::geometry::Rect;
use crate::core::scene::SceneEntity;
use crate::core::time::elapsed;

pub const BOSS_SIZE: (f32, f32) = (110.0, 90.0);
pub const BOSS_GRAVITY: f32 = 0.5;
pub const MIN_SPEED: f32 = 2.0;
pub const MAX_SPEED: f32 = 4.0;
/// Distance (px) per unit of walking speed.
pub const SPEED_FALLOFF: f32 = 50.0;
/// Horizontal drift toward the player while attacking.
pub const ATTACK_NUDGE: f32 = 1.0;
pub const HURT_COOLDOWN_MS: u64 = 800;
pub const ATTACK_COOLDOWN_MS: u64 = 1500;
pub const FLASH_INTERVAL_MS: u64 = 120;
pub const MAX_FLASHES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossState {
    Idle,
    Walk,
    Attack,
    Hurt,
}

/// Death-flash progress. Visibility toggles every [`FLASH_INTERVAL_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathFlash {
    pub flashes: u32,
    pub visible: bool,
    pub timer_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Boss {
    pub id: EntityId,
    pub physics: ActorPhysics,
    pub health: i32,
    pub attack_range: f32,
    /// Level time before which no new attack may start.
    pub attack_cooldown_until: u64,
    pub state: BossState,
    pub dying: Option<DeathFlash>,
    pub stomp_count: u32,
    pub anim: AnimationComponent<BossState>,
    /// Set once the removal request has been issued.
    removal_requested: bool,
}

impl SceneEntity for Boss {
    fn id(&self) -> EntityId {
        self.id
    }
}

fn clips() -> HashMap<BossState, AnimationDef> {
    let mut clips = HashMap::new();
    clips.insert(BossState::Idle, AnimationDef::strip(0, 3, 200));
    clips.insert(BossState::Walk, AnimationDef::strip(3, 3, 150));
    clips.insert(BossState::Attack, AnimationDef::strip(6, 3, 100).once());
    clips.insert(BossState::Hurt, AnimationDef::strip(9, 3, 150).once());
    clips
}

impl Boss {
    pub fn new(id: EntityId, config: &BossConfig, ground_top: f32, now_ms: u64) -> Self {
        let rect = Rect::from_bottom_left(config.x, ground_top, BOSS_SIZE.0, BOSS_SIZE.1);
        let mut physics = ActorPhysics::walker(rect, Direction::Left, 0.0);
        physics.gravity = BOSS_GRAVITY;
        Self {
            id,
            physics,
            health: config.health,
            attack_range: config.attack_range,
            attack_cooldown_until: 0,
            state: BossState::Idle,
            dying: None,
            stomp_count: 0,
            anim: AnimationComponent::new(clips(), BossState::Idle, now_ms),
            removal_requested: false,
        }
    }

    pub fn rect(&self) -> Rect {
        self.physics.rect
    }

    pub fn is_dying(&self) -> bool {
        self.dying.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.dying.map_or(true, |d| d.visible)
    }

    pub fn sprite_frame(&self) -> u32 {
        self.anim.current_frame().unwrap_or(0)
    }

    fn enter(&mut self, state: BossState, now_ms: u64) {
        if self.state != state {
            log::debug!("boss {:?} -> {:?}", self.state, state);
        }
        self.state = state;
        self.anim.play(state, now_ms);
    }

    /// Take damage. Returns false (and does nothing) while dying.
    pub fn receive_damage(&mut self, amount: i32, now_ms: u64) -> bool {
        if self.is_dying() {
            return false;
        }
        self.health -= amount;
        self.attack_cooldown_until = now_ms + HURT_COOLDOWN_MS;
        self.enter(BossState::Hurt, now_ms);
        if self.health <= 0 {
            self.start_dying(now_ms);
        }
        true
    }

    /// Begin the flash sequence. Runs at most once per boss.
    pub fn start_dying(&mut self, now_ms: u64) -> bool {
        if self.is_dying() {
            return false;
        }
        log::info!("boss defeated");
        self.physics.vel = glam::Vec2::ZERO;
        self.dying = Some(DeathFlash {
            flashes: 0,
            visible: true,
            timer_ms: now_ms,
        });
        true
    }

    /// Count a player stomp toward the reward threshold.
    pub fn on_stomp(&mut self) {
        if !self.is_dying() {
            self.stomp_count += 1;
        }
    }

    /// Consume the stomp counter if it has reached `threshold`.
    pub fn take_stomp_reward(&mut self, threshold: u32) -> bool {
        if threshold > 0 && self.stomp_count >= threshold {
            self.stomp_count = 0;
            true
        } else {
            false
        }
    }

    /// Force the attack animation (used when minions spawn).
    pub fn trigger_attack(&mut self, now_ms: u64) -> bool {
        if self.is_dying() || self.state == BossState::Hurt {
            return false;
        }
        self.attack_cooldown_until = now_ms + ATTACK_COOLDOWN_MS;
        self.enter(BossState::Attack, now_ms);
        true
    }

    pub fn update(&mut self, ctx: &TickContext, cmds: &mut Commands) -> Result<(), ActorFault> {
        self.physics.validate()?;
        if ctx.is_zero_step() {
            return Ok(());
        }
        if self.is_dying() {
            self.update_death_flash(ctx.now_ms, cmds);
            return Ok(());
        }

        self.physics.apply_gravity();
        self.physics.resolve_y(ctx.platforms);

        self.anim.tick(ctx.now_ms);
        let dx = ctx.player.rect.center_x() - self.physics.rect.center_x();
        match self.state {
            BossState::Idle => {
                if !ctx.player.dead {
                    self.enter(BossState::Walk, ctx.now_ms);
                }
            }
            BossState::Walk => {
                if ctx.player.dead {
                    self.enter(BossState::Idle, ctx.now_ms);
                } else {
                    self.chase(dx);
                    if dx.abs() < self.attack_range && ctx.now_ms >= self.attack_cooldown_until {
                        self.trigger_attack(ctx.now_ms);
                    }
                }
            }
            BossState::Attack => {
                self.physics.face(Direction::from_sign(dx));
                if dx.abs() > ATTACK_NUDGE {
                    self.physics.rect.x += self.physics.direction.sign() * ATTACK_NUDGE;
                }
                if self.anim.is_finished() {
                    self.enter(BossState::Walk, ctx.now_ms);
                }
            }
            BossState::Hurt => {
                if self.anim.is_finished() {
                    self.enter(BossState::Walk, ctx.now_ms);
                }
            }
        }

        let r = &mut self.physics.rect;
        if r.left() < 0.0 {
            r.set_left(0.0);
        } else if r.right() > ctx.level_width {
            r.set_right(ctx.level_width);
        }
        Ok(())
    }

    /// Walk toward the player, faster the further away it is.
    fn chase(&mut self, dx: f32) {
        self.physics.face(Direction::from_sign(dx));
        let speed = (dx.abs() / SPEED_FALLOFF).clamp(MIN_SPEED, MAX_SPEED);
        let step = speed.min(dx.abs());
        self.physics.vel.x = self.physics.direction.sign() * step;
        self.physics.rect.x += self.physics.vel.x;
    }

    fn update_death_flash(&mut self, now_ms: u64, cmds: &mut Commands) {
        if self.removal_requested {
            return;
        }
        let Some(flash) = self.dying.as_mut() else {
            return;
        };
        if !elapsed(now_ms, flash.timer_ms, FLASH_INTERVAL_MS) {
            return;
        }
        flash.visible = !flash.visible;
        flash.flashes += 1;
        flash.timer_ms = now_ms;
        if flash.flashes >= MAX_FLASHES {
            self.removal_requested = true;
            cmds.push(Intent::Despawn(self.id));
            cmds.play(SoundCue::BossDefeated);
            cmds.emit(LevelEvent::BossDefeated);
        }
    }
}
