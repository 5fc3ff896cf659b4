//! Walking enemies built on [`ActorPhysics`].
//!
//! Goomba and Koopa share one state machine; their differences live in the
//! per-kind transition table and hooks (`on_stomp`, `on_tick`, `on_wall_hit`)
//! selected by matching on [`EnemyKind`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::context::TickContext;
use crate::api::types::{Direction, EntityId};
use crate::components::animation::{AnimationComponent, AnimationDef};
use crate::components::physics::{ActorFault, ActorPhysics, VerticalContact};
use crate::core::geometry::Rect;
use crate::core::scene::SceneEntity;
use crate::core::time::elapsed;

pub const WALK_SPEED: f32 = 2.0;
pub const SHELL_SPEED: f32 = 10.0;
/// Squashed enemies linger this long before removal.
pub const JUMPED_ON_LINGER_MS: u64 = 500;
pub const WALK_FRAME_MS: u64 = 125;
pub const DEATH_JUMP_VELOCITY: f32 = -8.0;
pub const DEATH_JUMP_DRIFT: f32 = 2.0;
pub const DEATH_JUMP_GRAVITY: f32 = 0.5;
pub const STOMP_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Goomba,
    Koopa,
}

impl EnemyKind {
    /// Walking body size in px.
    pub fn size(self) -> (f32, f32) {
        match self {
            EnemyKind::Goomba => (40.0, 40.0),
            EnemyKind::Koopa => (40.0, 60.0),
        }
    }

    pub fn sprite_name(self) -> &'static str {
        match self {
            EnemyKind::Goomba => "goomba",
            EnemyKind::Koopa => "koopa",
        }
    }

    fn clips(self) -> HashMap<EnemyClip, AnimationDef> {
        let mut clips = HashMap::new();
        clips.insert(EnemyClip::Walk, AnimationDef::strip(0, 2, WALK_FRAME_MS));
        clips.insert(EnemyClip::Knocked, AnimationDef::still(3));
        match self {
            EnemyKind::Goomba => {
                clips.insert(EnemyClip::Squashed, AnimationDef::still(2));
            }
            EnemyKind::Koopa => {
                clips.insert(EnemyClip::Shell, AnimationDef::still(2));
            }
        }
        clips
    }
}

/// Koopa shell body size in px.
pub const SHELL_SIZE: (f32, f32) = (40.0, 37.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyClip {
    Walk,
    Squashed,
    Shell,
    Knocked,
}

/// Enemy state. Each variant carries only the data it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyState {
    Walk,
    Fall,
    /// Stomped at `since_ms`. Goombas expire; Koopas rest as a shell.
    JumpedOn { since_ms: u64 },
    ShellSlide,
    /// Scripted knock-out arc; ignores terrain.
    DeathJump { gravity: f32 },
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyTrigger {
    Landed,
    LostFooting,
    Stomped,
    Kicked,
    KnockedOut,
}

/// The transition table. `None` means the trigger does not apply.
pub fn transition(
    kind: EnemyKind,
    state: EnemyState,
    trigger: EnemyTrigger,
    now_ms: u64,
) -> Option<EnemyState> {
    use EnemyState::*;
    use EnemyTrigger::*;
    match (kind, state, trigger) {
        (_, DeathJump { .. }, _) => None,
        (_, _, KnockedOut) => Some(DeathJump { gravity: DEATH_JUMP_GRAVITY }),
        (_, Walk, LostFooting) => Some(Fall),
        (_, Fall, Landed) => Some(Walk),
        (_, Walk | Fall, Stomped) => Some(JumpedOn { since_ms: now_ms }),
        (EnemyKind::Koopa, JumpedOn { .. }, Stomped | Kicked) => Some(ShellSlide),
        (EnemyKind::Koopa, ShellSlide, Stomped) => Some(JumpedOn { since_ms: now_ms }),
        _ => None,
    }
}

/// What a stomp did, for the level to score and route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompOutcome {
    /// Squashed; moves to the death-pending layer.
    Squashed,
    /// Walking Koopa became a resting shell.
    Shelled,
    /// Resting shell sent sliding.
    Kicked,
    /// Sliding shell brought to rest.
    Stopped,
    /// Nothing to stomp (already terminal).
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub physics: ActorPhysics,
    pub state: EnemyState,
    pub anim: AnimationComponent<EnemyClip>,
}

impl SceneEntity for Enemy {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, x: f32, bottom: f32, direction: Direction, now_ms: u64) -> Self {
        let (w, h) = kind.size();
        Self {
            id,
            kind,
            physics: ActorPhysics::walker(Rect::from_bottom_left(x, bottom, w, h), direction, WALK_SPEED),
            state: EnemyState::Walk,
            anim: AnimationComponent::new(kind.clips(), EnemyClip::Walk, now_ms),
        }
    }

    pub fn goomba(id: EntityId, x: f32, bottom: f32, direction: Direction, now_ms: u64) -> Self {
        Self::new(id, EnemyKind::Goomba, x, bottom, direction, now_ms)
    }

    pub fn koopa(id: EntityId, x: f32, bottom: f32, direction: Direction, now_ms: u64) -> Self {
        Self::new(id, EnemyKind::Koopa, x, bottom, direction, now_ms)
    }

    pub fn rect(&self) -> Rect {
        self.physics.rect
    }

    pub fn direction(&self) -> Direction {
        self.physics.direction
    }

    /// Contact with this enemy hurts the player.
    pub fn is_harmful(&self) -> bool {
        matches!(
            self.state,
            EnemyState::Walk | EnemyState::Fall | EnemyState::ShellSlide
        )
    }

    pub fn is_resting_shell(&self) -> bool {
        self.kind == EnemyKind::Koopa && matches!(self.state, EnemyState::JumpedOn { .. })
    }

    pub fn is_sliding_shell(&self) -> bool {
        self.state == EnemyState::ShellSlide
    }

    /// Still part of the live enemy population (spawn threshold counting).
    pub fn is_live(&self) -> bool {
        !matches!(self.state, EnemyState::DeathJump { .. })
            && !(self.kind == EnemyKind::Goomba && matches!(self.state, EnemyState::JumpedOn { .. }))
    }

    /// Finished for good: a squashed Goomba past its linger, or a knocked-out
    /// enemy that has dropped below the level. Resting Koopa shells can be
    /// kicked again and never resolve.
    pub fn is_resolved(&self, now_ms: u64, level_height: f32) -> bool {
        match self.state {
            EnemyState::JumpedOn { since_ms } => {
                self.kind == EnemyKind::Goomba && elapsed(now_ms, since_ms, JUMPED_ON_LINGER_MS)
            }
            EnemyState::DeathJump { .. } => self.physics.rect.top() > level_height,
            _ => false,
        }
    }

    fn apply(&mut self, trigger: EnemyTrigger, now_ms: u64) -> bool {
        match transition(self.kind, self.state, trigger, now_ms) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }

    /// Player landed on top. `player_center_x` decides which way a kicked
    /// shell slides.
    pub fn on_stomp(&mut self, player_center_x: f32, now_ms: u64) -> StompOutcome {
        let before = self.state;
        if !self.apply(EnemyTrigger::Stomped, now_ms) {
            return StompOutcome::Ignored;
        }
        match (self.kind, before) {
            (EnemyKind::Goomba, _) => {
                self.physics.vel.x = 0.0;
                self.anim.play(EnemyClip::Squashed, now_ms);
                StompOutcome::Squashed
            }
            (EnemyKind::Koopa, EnemyState::Walk | EnemyState::Fall) => {
                self.physics.vel.x = 0.0;
                self.physics.rect.resize_keep_bottom(SHELL_SIZE.0, SHELL_SIZE.1);
                self.anim.play(EnemyClip::Shell, now_ms);
                StompOutcome::Shelled
            }
            (EnemyKind::Koopa, EnemyState::JumpedOn { .. }) => {
                self.launch_shell(away_from(player_center_x, self.rect().center_x()));
                StompOutcome::Kicked
            }
            (EnemyKind::Koopa, _) => {
                self.physics.vel.x = 0.0;
                StompOutcome::Stopped
            }
        }
    }

    /// Side contact with a resting shell sends it sliding away from the kicker.
    pub fn kick(&mut self, kicker_center_x: f32, now_ms: u64) -> bool {
        if !self.apply(EnemyTrigger::Kicked, now_ms) {
            return false;
        }
        self.launch_shell(away_from(kicker_center_x, self.rect().center_x()));
        true
    }

    fn launch_shell(&mut self, direction: Direction) {
        self.physics.direction = direction;
        self.physics.set_speed(SHELL_SPEED);
    }

    /// Scripted knock-out: hop up, drift, and fall through the level.
    pub fn start_death_jump(&mut self, direction: Direction, now_ms: u64) -> bool {
        if !self.apply(EnemyTrigger::KnockedOut, now_ms) {
            return false;
        }
        self.physics.vel.y = DEATH_JUMP_VELOCITY;
        self.physics.vel.x = direction.sign() * DEATH_JUMP_DRIFT;
        self.physics.gravity = DEATH_JUMP_GRAVITY;
        self.anim.play(EnemyClip::Knocked, now_ms);
        true
    }

    /// Advance one tick. Once [`Enemy::is_resolved`] holds the enemy stops
    /// moving; the owner drops it during the same dispatch pass.
    pub fn update(&mut self, ctx: &TickContext) -> Result<(), ActorFault> {
        self.physics.validate()?;
        if ctx.is_zero_step() || self.is_resolved(ctx.now_ms, ctx.level_height) {
            return Ok(());
        }

        if let EnemyState::DeathJump { gravity } = self.state {
            self.physics.gravity = gravity;
            self.physics.integrate_free();
            self.anim.tick(ctx.now_ms);
            return Ok(());
        }

        let report = self.physics.step(ctx.platforms);
        if report.turned {
            self.on_wall_hit();
        }
        match report.vertical {
            VerticalContact::Landed => {
                self.apply(EnemyTrigger::Landed, ctx.now_ms);
            }
            VerticalContact::Airborne if self.physics.vel.y > 0.0 => {
                self.apply(EnemyTrigger::LostFooting, ctx.now_ms);
            }
            _ => {}
        }
        self.on_tick();
        if matches!(self.state, EnemyState::Walk | EnemyState::Fall | EnemyState::ShellSlide) {
            self.physics.enforce_level_bounds(ctx.level_width);
        }
        self.anim.tick(ctx.now_ms);
        Ok(())
    }

    /// Per-state velocity upkeep.
    fn on_tick(&mut self) {
        match self.state {
            EnemyState::ShellSlide => self.physics.set_speed(SHELL_SPEED),
            EnemyState::JumpedOn { .. } => self.physics.vel.x = 0.0,
            _ => {}
        }
    }

    fn on_wall_hit(&mut self) {
        log::trace!("{:?} {:?} turned at x={}", self.kind, self.id, self.physics.rect.x);
    }

    pub fn sprite_frame(&self) -> u32 {
        self.anim.current_frame().unwrap_or(0)
    }
}

fn away_from(source_x: f32, target_x: f32) -> Direction {
    if source_x <= target_x {
        Direction::Right
    } else {
        Direction::Left
    }
}
