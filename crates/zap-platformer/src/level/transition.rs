//! Level clock, freeze timer and the next-scene decision.

use serde::{Deserialize, Serialize};

use crate::api::types::{NextScene, SoundCue};
use crate::core::time::elapsed;
use crate::persist::stats::GameStats;

/// HUD time at which the hurry-up cue plays.
pub const HURRY_UP_AT: u32 = 100;
pub const CLOCK_PERIOD_MS: u64 = 1000;

/// HUD countdown in whole seconds of unfrozen level time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelClock {
    pub time: u32,
    pub last_tick_ms: u64,
    pub hurry_up_played: bool,
}

impl LevelClock {
    pub fn new(time_limit: u32, now_ms: u64) -> Self {
        Self {
            time: time_limit,
            last_tick_ms: now_ms,
            hurry_up_played: time_limit <= HURRY_UP_AT,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.time == 0
    }

    /// Count down one second per period. Returns the hurry-up cue the first
    /// time the clock reaches [`HURRY_UP_AT`].
    pub fn tick(&mut self, now_ms: u64) -> Option<SoundCue> {
        if self.time == 0 || !elapsed(now_ms, self.last_tick_ms, CLOCK_PERIOD_MS) {
            return None;
        }
        self.time -= 1;
        self.last_tick_ms = now_ms;
        if !self.hurry_up_played && self.time <= HURRY_UP_AT {
            self.hurry_up_played = true;
            return Some(SoundCue::HurryUp);
        }
        None
    }

    /// Restart the period so frozen time is not counted.
    pub fn resume(&mut self, now_ms: u64) {
        self.last_tick_ms = now_ms;
    }
}

/// Why the level stopped simulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FreezeReason {
    PlayerDead,
    TimeOut,
    Cleared,
}

/// Advisory transition schedule: a start stamp compared to the clock each
/// tick. A later, higher-precedence condition only changes the outcome
/// computed when the delay runs out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub started_ms: Option<u64>,
    pub delay_ms: u64,
}

impl Transition {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            started_ms: None,
            delay_ms,
        }
    }

    /// Start the timer. Later calls keep the first stamp.
    pub fn start(&mut self, now_ms: u64) {
        if self.started_ms.is_none() {
            self.started_ms = Some(now_ms);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_ms.is_some()
    }

    pub fn is_ready(&self, now_ms: u64) -> bool {
        self.started_ms
            .is_some_and(|since| elapsed(now_ms, since, self.delay_ms))
    }
}

/// Settle the session stats and pick the next scene.
///
/// Precedence: lives exhausted, then a living player (level cleared), then
/// time ran out, otherwise the generic load screen.
pub fn finish_level(stats: &mut GameStats, player_dead: bool, time_left: u32) -> NextScene {
    stats.update_top_score();
    if player_dead {
        stats.lose_life();
    }
    let next = if stats.lives == 0 {
        stats.camera_start_x = 0.0;
        NextScene::GameOver
    } else if !player_dead {
        stats.camera_start_x = 0.0;
        NextScene::MainMenu
    } else if time_left == 0 {
        NextScene::TimeOut
    } else {
        NextScene::LoadScreen
    };
    log::info!(
        "level finished: {:?} (score {}, lives {})",
        next,
        stats.score,
        stats.lives
    );
    next
}
