use crate::api::types::EntityId;
use crate::core::scene::SceneEntity;
use crate::core::time::elapsed;

pub const POPUP_RISE_SPEED: f32 = 3.0;
pub const POPUP_LIFETIME_MS: u64 = 750;

/// Floating score text. Rises for its lifetime and is then removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePopup {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub value: u32,
    pub spawned_ms: u64,
}

impl SceneEntity for ScorePopup {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl ScorePopup {
    pub fn new(id: EntityId, x: f32, y: f32, value: u32, now_ms: u64) -> Self {
        Self {
            id,
            x,
            y,
            value,
            spawned_ms: now_ms,
        }
    }

    /// Advance one tick. Returns false once the popup should be removed.
    pub fn update(&mut self, now_ms: u64, dt_ms: u64, level_height: f32) -> bool {
        if dt_ms > 0 {
            self.y -= POPUP_RISE_SPEED;
        }
        !(self.is_done(now_ms) || self.y > level_height)
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        elapsed(now_ms, self.spawned_ms, POPUP_LIFETIME_MS)
    }

    pub fn text(&self) -> String {
        self.value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_until_lifetime_expires() {
        let mut p = ScorePopup::new(EntityId(1), 10.0, 300.0, 100, 1000);
        assert!(p.update(1016, 16, 600.0));
        assert_eq!(p.y, 300.0 - POPUP_RISE_SPEED);
        assert!(!p.update(1000 + POPUP_LIFETIME_MS, 16, 600.0));
    }

    #[test]
    fn zero_step_holds_position() {
        let mut p = ScorePopup::new(EntityId(1), 10.0, 300.0, 100, 0);
        p.update(0, 0, 600.0);
        assert_eq!(p.y, 300.0);
    }

    #[test]
    fn below_level_is_removed() {
        let mut p = ScorePopup::new(EntityId(1), 10.0, 700.0, 100, 0);
        assert!(!p.update(16, 16, 600.0));
        assert_eq!(p.text(), "100");
    }
}
