//! Shared actor physics: velocity integration, gravity and axis-separated
//! collision resolution against a platform set.
//!
//! Resolution is always Y first, then X. The vertical pass settles ground
//! contact before any horizontal movement is tested, so an actor standing on
//! the ground never mistakes the floor for a wall.

use glam::Vec2;
use thiserror::Error;

use crate::api::types::Direction;
use crate::core::geometry::Rect;

/// Default enemy gravity, px per tick squared.
pub const ENEMY_GRAVITY: f32 = 1.5;
/// Terminal fall speed for walkers.
pub const MAX_FALL_SPEED: f32 = 10.0;

/// An actor whose state can no longer be simulated this tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActorFault {
    #[error("non-finite position or velocity ({x}, {y}) vel ({vx}, {vy})")]
    NonFinite { x: f32, y: f32, vx: f32, vy: f32 },
    #[error("negative size {w}x{h}")]
    NegativeSize { w: f32, h: f32 },
}

/// Vertical contact found during the Y pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalContact {
    /// Fell onto a platform top; y-velocity zeroed.
    Landed,
    /// Rose into a platform bottom; y-velocity zeroed.
    HeadBump,
    /// Touched nothing.
    Airborne,
}

/// Result of one constrained physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub vertical: VerticalContact,
    /// Hit a wall on the X pass and turned around.
    pub turned: bool,
}

impl StepReport {
    pub const FREE: StepReport = StepReport {
        vertical: VerticalContact::Airborne,
        turned: false,
    };
}

/// Position, velocity, facing and gravity shared by every moving actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorPhysics {
    pub rect: Rect,
    pub vel: Vec2,
    pub direction: Direction,
    pub gravity: f32,
    pub max_fall: f32,
}

impl ActorPhysics {
    /// An actor walking in `direction` at `speed` px per tick.
    pub fn walker(rect: Rect, direction: Direction, speed: f32) -> Self {
        Self {
            rect,
            vel: Vec2::new(direction.sign() * speed, 0.0),
            direction,
            gravity: ENEMY_GRAVITY,
            max_fall: MAX_FALL_SPEED,
        }
    }

    pub fn validate(&self) -> Result<(), ActorFault> {
        let r = &self.rect;
        if !r.is_finite() || !self.vel.is_finite() {
            return Err(ActorFault::NonFinite {
                x: r.x,
                y: r.y,
                vx: self.vel.x,
                vy: self.vel.y,
            });
        }
        if r.w < 0.0 || r.h < 0.0 {
            return Err(ActorFault::NegativeSize { w: r.w, h: r.h });
        }
        Ok(())
    }

    /// Unconstrained integration: move, then accelerate.
    pub fn integrate_free(&mut self) {
        self.rect.translate(self.vel);
        self.vel.y += self.gravity;
    }

    pub fn apply_gravity(&mut self) {
        self.vel.y = (self.vel.y + self.gravity).min(self.max_fall);
    }

    /// Set horizontal speed along the current facing.
    pub fn set_speed(&mut self, speed: f32) {
        self.vel.x = self.direction.sign() * speed.abs();
    }

    pub fn face(&mut self, direction: Direction) {
        self.direction = direction;
        self.vel.x = direction.sign() * self.vel.x.abs();
    }

    /// Gravity, then the Y pass, then the X pass.
    /// With no platforms the actor integrates freely.
    pub fn step(&mut self, platforms: &[Rect]) -> StepReport {
        if platforms.is_empty() {
            self.integrate_free();
            return StepReport::FREE;
        }
        self.apply_gravity();
        if self.rect.is_degenerate() {
            log::trace!("degenerate actor rect {:?}; collision skipped", self.rect);
            self.rect.translate(self.vel);
            return StepReport::FREE;
        }
        let vertical = self.resolve_y(platforms);
        let turned = self.resolve_x(platforms);
        StepReport { vertical, turned }
    }

    /// Move by y-velocity and settle against the platform set.
    pub fn resolve_y(&mut self, platforms: &[Rect]) -> VerticalContact {
        self.rect.y += self.vel.y;
        let rect = self.rect;
        let mut hits = platforms.iter().filter(|p| p.intersects(&rect)).peekable();
        if hits.peek().is_none() {
            return VerticalContact::Airborne;
        }
        if self.vel.y > 0.0 {
            let top = hits.map(|p| p.top()).fold(f32::INFINITY, f32::min);
            self.rect.set_bottom(top);
            self.vel.y = 0.0;
            VerticalContact::Landed
        } else if self.vel.y < 0.0 {
            let bottom = hits.map(|p| p.bottom()).fold(f32::NEG_INFINITY, f32::max);
            self.rect.set_top(bottom);
            self.vel.y = 0.0;
            VerticalContact::HeadBump
        } else {
            VerticalContact::Airborne
        }
    }

    /// Move by x-velocity; on a wall, snap flush, reverse and flip facing.
    /// Returns true if the actor turned around. At most one reversal per call.
    pub fn resolve_x(&mut self, platforms: &[Rect]) -> bool {
        self.rect.x += self.vel.x;
        let rect = self.rect;
        let mut hits = platforms.iter().filter(|p| p.intersects(&rect)).peekable();
        if hits.peek().is_none() {
            return false;
        }
        if self.vel.x > 0.0 {
            let left = hits.map(|p| p.left()).fold(f32::INFINITY, f32::min);
            self.rect.set_right(left);
            self.vel.x = -self.vel.x;
            self.direction = Direction::Left;
            true
        } else if self.vel.x < 0.0 {
            let right = hits.map(|p| p.right()).fold(f32::NEG_INFINITY, f32::max);
            self.rect.set_left(right);
            self.vel.x = -self.vel.x;
            self.direction = Direction::Right;
            true
        } else {
            false
        }
    }

    /// Keep the actor inside [0, width]. Assigns the inward direction outright
    /// rather than toggling, so it can never undo a turn made earlier in the
    /// same tick. Returns true if the actor was at an edge moving outward.
    pub fn enforce_level_bounds(&mut self, width: f32) -> bool {
        if self.rect.left() < 0.0 && self.vel.x <= 0.0 {
            self.rect.set_left(0.0);
            self.face(Direction::Right);
            true
        } else if self.rect.right() > width && self.vel.x >= 0.0 {
            self.rect.set_right(width);
            self.face(Direction::Left);
            true
        } else {
            false
        }
    }
}
