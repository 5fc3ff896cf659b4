//! The player avatar's contract with the level, plus enough movement to
//! drive it from held keys.
//!
//! The level owns collision for the player (it needs the terrain/enemy/boss
//! precedence rules), so `update` only turns input and gravity into
//! velocities. The scripted death-jump is the one case where the player
//! moves itself.

use serde::{Deserialize, Serialize};

use crate::api::context::PlayerView;
use crate::api::types::Direction;
use crate::core::geometry::Rect;
use crate::core::time::elapsed;
use crate::input::keys::KeySnapshot;

pub const SMALL_SIZE: (f32, f32) = (40.0, 40.0);
pub const BIG_SIZE: (f32, f32) = (40.0, 80.0);
pub const WALK_ACCEL: f32 = 0.5;
pub const MAX_WALK_SPEED: f32 = 6.0;
pub const FRICTION: f32 = 0.5;
pub const JUMP_VELOCITY: f32 = -12.0;
pub const GRAVITY: f32 = 1.0;
/// Lighter gravity while the jump key is held on the way up.
pub const JUMP_GRAVITY: f32 = 0.4;
pub const MAX_FALL_SPEED: f32 = 11.0;
pub const DEATH_JUMP_VELOCITY: f32 = -11.0;
pub const DEATH_JUMP_GRAVITY: f32 = 0.5;
/// Downward speed after bumping a ceiling.
pub const HEAD_BUMP_VELOCITY: f32 = 7.0;
pub const HURT_INVINCIBLE_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Stand,
    Walk,
    Jump,
    Fall,
    DeathJump,
}

/// Result of harmful contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Invincible, hurt-invincible or already dead.
    Ignored,
    /// Lost the power-up and is briefly hurt-invincible.
    Shrunk,
    /// Death-jump started.
    Killed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub rect: Rect,
    pub x_vel: f32,
    pub y_vel: f32,
    pub state: PlayerState,
    pub direction: Direction,
    pub big: bool,
    pub invincible: bool,
    pub hurt_invincible: bool,
    pub hurt_since_ms: u64,
    pub dead: bool,
    /// `Some(true)` freezes the level, `Some(false)` releases it, `None` is
    /// "no opinion".
    pub in_transition_state: Option<bool>,
    pub gravity: f32,
    jump_held: bool,
}

impl Player {
    pub fn new(x: f32, bottom: f32) -> Self {
        Self {
            rect: Rect::from_bottom_left(x, bottom, SMALL_SIZE.0, SMALL_SIZE.1),
            x_vel: 0.0,
            y_vel: 0.0,
            state: PlayerState::Stand,
            direction: Direction::Right,
            big: false,
            invincible: false,
            hurt_invincible: false,
            hurt_since_ms: 0,
            dead: false,
            in_transition_state: Some(false),
            gravity: GRAVITY,
            jump_held: false,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            rect: self.rect,
            x_vel: self.x_vel,
            y_vel: self.y_vel,
            dead: self.dead,
        }
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self.state, PlayerState::Jump | PlayerState::Fall)
    }

    /// Harm is possible right now.
    pub fn is_vulnerable(&self) -> bool {
        !(self.dead || self.invincible || self.hurt_invincible)
    }

    /// Start the scripted death arc. Safe to call repeatedly.
    pub fn start_death_jump(&mut self) {
        if self.state == PlayerState::DeathJump {
            return;
        }
        self.dead = true;
        self.state = PlayerState::DeathJump;
        self.x_vel = 0.0;
        self.y_vel = DEATH_JUMP_VELOCITY;
        self.gravity = DEATH_JUMP_GRAVITY;
        self.in_transition_state = Some(true);
    }

    pub fn take_hit(&mut self, now_ms: u64) -> HitOutcome {
        if !self.is_vulnerable() {
            return HitOutcome::Ignored;
        }
        if self.big {
            self.set_big(false);
            self.hurt_invincible = true;
            self.hurt_since_ms = now_ms;
            HitOutcome::Shrunk
        } else {
            self.start_death_jump();
            HitOutcome::Killed
        }
    }

    /// Grow or shrink, keeping the feet where they are.
    pub fn set_big(&mut self, big: bool) {
        self.big = big;
        let (w, h) = if big { BIG_SIZE } else { SMALL_SIZE };
        self.rect.resize_keep_bottom(w, h);
    }

    /// Bounce off something stomped.
    pub fn bounce(&mut self, velocity: f32) {
        self.y_vel = velocity;
        self.state = PlayerState::Jump;
    }

    pub fn land(&mut self, top: f32) {
        self.rect.set_bottom(top);
        self.y_vel = 0.0;
        self.state = PlayerState::Walk;
    }

    pub fn bump_head(&mut self, bottom: f32) {
        self.rect.set_top(bottom);
        self.y_vel = HEAD_BUMP_VELOCITY;
        self.state = PlayerState::Fall;
    }

    /// Turn held keys and gravity into velocities for this tick.
    pub fn update(&mut self, keys: &KeySnapshot, now_ms: u64) {
        if self.hurt_invincible && elapsed(now_ms, self.hurt_since_ms, HURT_INVINCIBLE_MS) {
            self.hurt_invincible = false;
        }
        if self.state == PlayerState::DeathJump {
            self.rect.y += self.y_vel;
            self.y_vel += self.gravity;
            self.jump_held = keys.jump;
            return;
        }

        self.walk(keys);
        let pressed = keys.jump && !self.jump_held;
        if pressed && matches!(self.state, PlayerState::Stand | PlayerState::Walk) {
            self.y_vel = JUMP_VELOCITY;
            self.state = PlayerState::Jump;
        }
        match self.state {
            PlayerState::Jump => {
                let g = if keys.jump { JUMP_GRAVITY } else { GRAVITY };
                self.y_vel += g;
                if self.y_vel >= 0.0 {
                    self.state = PlayerState::Fall;
                }
            }
            PlayerState::Fall => {
                self.y_vel = (self.y_vel + GRAVITY).min(MAX_FALL_SPEED);
            }
            _ => {
                self.state = if self.x_vel == 0.0 {
                    PlayerState::Stand
                } else {
                    PlayerState::Walk
                };
            }
        }
        self.jump_held = keys.jump;
    }

    fn walk(&mut self, keys: &KeySnapshot) {
        let axis = keys.horizontal();
        if axis != 0.0 {
            self.direction = Direction::from_sign(axis);
            self.x_vel = (self.x_vel + axis * WALK_ACCEL).clamp(-MAX_WALK_SPEED, MAX_WALK_SPEED);
        } else if self.x_vel.abs() <= FRICTION {
            self.x_vel = 0.0;
        } else {
            self.x_vel -= self.x_vel.signum() * FRICTION;
        }
    }

    pub fn sprite_name(&self) -> &'static str {
        if self.big {
            "mario_big"
        } else {
            "mario_small"
        }
    }

    pub fn sprite_frame(&self) -> u32 {
        match self.state {
            PlayerState::Stand => 0,
            PlayerState::Walk => 1,
            PlayerState::Jump | PlayerState::Fall => 4,
            PlayerState::DeathJump => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_is_edge_triggered() {
        let mut p = Player::new(0.0, 540.0);
        let held = KeySnapshot { jump: true, ..Default::default() };
        p.update(&held, 0);
        assert_eq!(p.state, PlayerState::Jump);
        assert!(p.y_vel < 0.0);
        // Landing while the key is still held does not re-jump.
        p.land(540.0);
        p.update(&held, 16);
        assert_eq!(p.state, PlayerState::Stand);
        p.update(&KeySnapshot::NONE, 32);
        p.update(&held, 48);
        assert_eq!(p.state, PlayerState::Jump);
    }

    #[test]
    fn walking_accelerates_and_friction_stops() {
        let mut p = Player::new(0.0, 540.0);
        let right = KeySnapshot { right: true, ..Default::default() };
        for t in 0..30 {
            p.update(&right, t * 16);
        }
        assert_eq!(p.x_vel, MAX_WALK_SPEED);
        assert_eq!(p.state, PlayerState::Walk);
        for t in 30..60 {
            p.update(&KeySnapshot::NONE, t * 16);
        }
        assert_eq!(p.x_vel, 0.0);
        assert_eq!(p.state, PlayerState::Stand);
    }

    #[test]
    fn big_player_shrinks_then_is_briefly_safe() {
        let mut p = Player::new(0.0, 540.0);
        p.set_big(true);
        assert_eq!(p.rect.h, BIG_SIZE.1);
        assert_eq!(p.rect.bottom(), 540.0);
        assert_eq!(p.take_hit(1000), HitOutcome::Shrunk);
        assert_eq!(p.rect.h, SMALL_SIZE.1);
        assert_eq!(p.take_hit(1500), HitOutcome::Ignored);
        p.update(&KeySnapshot::NONE, 3000);
        assert!(!p.hurt_invincible);
        assert_eq!(p.take_hit(3000), HitOutcome::Killed);
        assert!(p.dead);
        assert_eq!(p.in_transition_state, Some(true));
    }

    #[test]
    fn death_jump_arcs_and_ignores_input() {
        let mut p = Player::new(100.0, 540.0);
        p.start_death_jump();
        assert_eq!(p.y_vel, DEATH_JUMP_VELOCITY);
        let y0 = p.rect.y;
        p.update(&KeySnapshot { right: true, ..Default::default() }, 16);
        assert_eq!(p.rect.y, y0 + DEATH_JUMP_VELOCITY);
        assert_eq!(p.x_vel, 0.0);
        // Repeat call does not restart the arc.
        let vy = p.y_vel;
        p.start_death_jump();
        assert_eq!(p.y_vel, vy);
    }

    #[test]
    fn invincible_ignores_hits() {
        let mut p = Player::new(0.0, 540.0);
        p.invincible = true;
        assert_eq!(p.take_hit(0), HitOutcome::Ignored);
        assert!(!p.dead);
    }
}
