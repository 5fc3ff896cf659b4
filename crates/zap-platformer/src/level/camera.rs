use glam::Vec2;

use crate::core::geometry::Rect;

/// Horizontal-scrolling camera window into the level.
///
/// The window size is fixed; `x` is always clamped to
/// `[0, max(0, level_width - width)]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub level_width: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, level_width: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            level_width,
        }
    }

    pub fn max_x(&self) -> f32 {
        (self.level_width - self.width).max(0.0)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Jump straight to `x`, clamped.
    pub fn look_at(&mut self, x: f32) {
        self.x = x.clamp(0.0, self.max_x());
    }

    /// Scroll after the player moved by `x_vel` this tick.
    ///
    /// Moving right, scrolling starts once the player's centre passes the
    /// first third of the window; it runs at half the player's speed while
    /// the player's right edge is still short of the window centre and at
    /// full speed beyond it. Moving left mirrors this around the last third.
    pub fn follow(&mut self, player: &Rect, x_vel: f32) {
        let third = self.width / 3.0;
        let center = self.center_x();
        if x_vel > 0.0 && player.center_x() >= self.x + third {
            let mult = if player.right() < center { 0.5 } else { 1.0 };
            self.look_at(self.x + mult * x_vel);
        } else if x_vel < 0.0 && player.center_x() <= self.x + 2.0 * third {
            let mult = if player.left() > center { 0.5 } else { 1.0 };
            self.look_at(self.x + mult * x_vel);
        }
    }

    /// World to screen space.
    pub fn to_screen(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x - self.x, p.y - self.y)
    }

    pub fn is_rect_visible(&self, rect: &Rect) -> bool {
        rect.right() >= self.x
            && rect.left() <= self.x + self.width
            && rect.bottom() >= self.y
            && rect.top() <= self.y + self.height
    }
}
