use serde::{Deserialize, Serialize};

/// Unique identifier for an entity in a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Left,
    Right,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// -1.0 for left, 1.0 for right.
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    /// Direction pointing along the sign of `dx` (zero counts as right).
    pub fn from_sign(dx: f32) -> Self {
        if dx < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

/// Named sound cue emitted by level logic.
/// Playback policy belongs to the external dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Stomp,
    Kick,
    Bump,
    PowerupAppears,
    Powerup,
    BossHurt,
    BossDefeated,
    Death,
    HurryUp,
    StageClear,
}

impl SoundCue {
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Stomp => "stomp",
            SoundCue::Kick => "kick",
            SoundCue::Bump => "bump",
            SoundCue::PowerupAppears => "powerup_appears",
            SoundCue::Powerup => "powerup",
            SoundCue::BossHurt => "boss_hurt",
            SoundCue::BossDefeated => "boss_defeated",
            SoundCue::Death => "death",
            SoundCue::HurryUp => "hurry_up",
            SoundCue::StageClear => "stage_clear",
        }
    }
}

/// Where the game should go once a level finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextScene {
    GameOver,
    MainMenu,
    TimeOut,
    LoadScreen,
}

/// Gameplay event reported by a tick, for HUD/analytics consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelEvent {
    EnemyStomped { id: EntityId, score: u32 },
    EnemyKnockedOut { id: EntityId },
    ShellKicked { id: EntityId },
    BossDamaged { health: i32 },
    BossDefeated,
    BossSpawnedMinions { count: u32 },
    PowerUpSpawned { x: f32, y: f32 },
    PowerUpCollected,
    PlayerHurt,
    PlayerDied,
    TerrainRegenerated { blocks: u32 },
    LevelCleared,
    Finished(NextScene),
}
