use serde::{Deserialize, Serialize};

pub const STARTING_LIVES: u32 = 3;

/// Cross-level stats owned by the game session and lent to each level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStats {
    pub score: u32,
    pub lives: u32,
    pub coin_total: u32,
    pub top_score: u32,
    /// Where the next level's camera starts.
    pub camera_start_x: f32,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            score: 0,
            lives: STARTING_LIVES,
            coin_total: 0,
            top_score: 0,
            camera_start_x: 0.0,
        }
    }
}

impl GameStats {
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Record a new top score if the current one beats it.
    pub fn update_top_score(&mut self) -> bool {
        if self.score > self.top_score {
            self.top_score = self.score;
            true
        } else {
            false
        }
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_score_only_moves_up() {
        let mut s = GameStats { score: 500, top_score: 800, ..Default::default() };
        assert!(!s.update_top_score());
        s.add_score(400);
        assert!(s.update_top_score());
        assert_eq!(s.top_score, 900);
    }

    #[test]
    fn lives_never_underflow() {
        let mut s = GameStats { lives: 0, ..Default::default() };
        s.lose_life();
        assert_eq!(s.lives, 0);
    }
}
