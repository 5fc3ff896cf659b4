use serde::{Deserialize, Serialize};

use crate::api::types::{Direction, EntityId, LevelEvent, SoundCue};
use crate::core::geometry::Rect;
use crate::entities::enemy::EnemyKind;

/// A horizontal gap in the ground, given as left edge and width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pit {
    pub x: f32,
    pub w: f32,
}

/// An enemy placed at level start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub x: f32,
    #[serde(default)]
    pub direction: Direction,
}

/// Periodic random terrain placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomTerrainConfig {
    /// Blocks requested per regeneration.
    pub block_count: u32,
    /// Milliseconds between wholesale regenerations.
    pub interval_ms: u64,
    pub seed: u64,
    /// Placement attempts per regeneration before accepting a partial fill.
    pub max_attempts: u32,
    /// Highest allowed block top (smaller y is higher up).
    pub min_y: f32,
    /// Minimum vertical gap left between a block bottom and the ground.
    pub ground_clearance: f32,
    pub cell_size: f32,
    pub min_cells: u32,
    pub max_cells: u32,
}

impl Default for RandomTerrainConfig {
    fn default() -> Self {
        Self {
            block_count: 6,
            interval_ms: 10_000,
            seed: 0x5EED,
            max_attempts: 200,
            min_y: 220.0,
            ground_clearance: 100.0,
            cell_size: 40.0,
            min_cells: 2,
            max_cells: 4,
        }
    }
}

/// Boss placement and encounter tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub x: f32,
    pub health: i32,
    /// Horizontal distance under which the boss starts an attack.
    pub attack_range: f32,
    /// Milliseconds between minion spawn checks.
    pub spawn_interval_ms: u64,
    /// Minions are only spawned while fewer live enemies than this exist.
    pub spawn_threshold: usize,
    /// Stomps needed to earn a power-up.
    pub stomp_reward_threshold: u32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            x: 1900.0,
            health: 3,
            attack_range: 200.0,
            spawn_interval_ms: 8_000,
            spawn_threshold: 3,
            stomp_reward_threshold: 4,
        }
    }
}

/// Configuration for a level, in the engine's px / ms units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Fixed tick length in milliseconds (default: 16).
    pub fixed_dt_ms: u64,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub level_width: f32,
    pub level_height: f32,
    /// Height of the ground strip along the bottom of the level.
    pub ground_height: f32,
    pub pits: Vec<Pit>,
    /// Pipes share the ground's collision group.
    pub pipes: Vec<Rect>,
    pub fixed_terrain: Vec<Rect>,
    /// Zone random terrain must stay out of. Defaults to the fixed terrain's
    /// bounding box grown by 20 px.
    pub terrain_exclusion: Option<Rect>,
    pub random_terrain: RandomTerrainConfig,
    pub enemies: Vec<EnemySpawn>,
    pub boss: Option<BossConfig>,
    pub player_start_x: f32,
    /// Width of the exit zone at the right end of the level.
    pub exit_width: f32,
    /// HUD clock start value, in seconds.
    pub time_limit: u32,
    /// Freeze time between death/clear and the scene transition.
    pub transition_delay_ms: u64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        let level_height = 600.0;
        let ground_top = level_height - 60.0;
        Self {
            fixed_dt_ms: 16,
            viewport_width: 800.0,
            viewport_height: 600.0,
            level_width: 2400.0,
            level_height,
            ground_height: 60.0,
            pits: vec![Pit { x: 1100.0, w: 80.0 }],
            pipes: vec![
                Rect::new(600.0, ground_top - 80.0, 60.0, 80.0),
                Rect::new(1500.0, ground_top - 100.0, 60.0, 100.0),
            ],
            fixed_terrain: vec![
                Rect::new(300.0, ground_top - 40.0, 40.0, 40.0),
                Rect::new(340.0, ground_top - 80.0, 40.0, 80.0),
                Rect::new(380.0, ground_top - 120.0, 40.0, 120.0),
                Rect::new(800.0, ground_top - 160.0, 160.0, 40.0),
            ],
            terrain_exclusion: None,
            random_terrain: RandomTerrainConfig::default(),
            enemies: vec![
                EnemySpawn { kind: EnemyKind::Goomba, x: 720.0, direction: Direction::Left },
                EnemySpawn { kind: EnemyKind::Koopa, x: 1300.0, direction: Direction::Left },
                EnemySpawn { kind: EnemyKind::Goomba, x: 1650.0, direction: Direction::Left },
            ],
            boss: Some(BossConfig::default()),
            player_start_x: 50.0,
            exit_width: 60.0,
            time_limit: 300,
            transition_delay_ms: 3_000,
        }
    }
}

impl LevelConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn ground_top(&self) -> f32 {
        self.level_height - self.ground_height
    }

    /// Zone random terrain must not intrude into.
    pub fn exclusion_zone(&self) -> Option<Rect> {
        if self.terrain_exclusion.is_some() {
            return self.terrain_exclusion;
        }
        let mut blocks = self.fixed_terrain.iter();
        let first = *blocks.next()?;
        Some(blocks.fold(first, |acc, r| acc.union(r)).inflate(20.0))
    }
}

/// What an entity can see of the player during its update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerView {
    pub rect: Rect,
    pub x_vel: f32,
    pub y_vel: f32,
    pub dead: bool,
}

/// Read-only view of the level handed to every entity update.
/// Entities never hold a reference back to the level.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Monotonic level clock, in milliseconds.
    pub now_ms: u64,
    /// Time since the previous tick. Zero means nothing advances.
    pub dt_ms: u64,
    pub player: PlayerView,
    /// Merged ground + fixed + random terrain. Empty means free-fall integration.
    pub platforms: &'a [Rect],
    pub level_width: f32,
    pub level_height: f32,
}

impl TickContext<'_> {
    pub fn is_zero_step(&self) -> bool {
        self.dt_ms == 0
    }
}

/// Structural change requested during iteration, applied at commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Remove from every collection.
    Despawn(EntityId),
    /// Move from the active enemies to the death-pending layer.
    MarkDying(EntityId),
    SpawnEnemy {
        kind: EnemyKind,
        x: f32,
        bottom: f32,
        direction: Direction,
    },
    SpawnPowerUp { x: f32, y: f32 },
    SpawnScore { x: f32, y: f32, value: u32 },
}

/// Per-tick intent buffer plus the sounds and events the tick produced.
#[derive(Debug, Default)]
pub struct Commands {
    pub intents: Vec<Intent>,
    pub sounds: Vec<SoundCue>,
    pub events: Vec<LevelEvent>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    pub fn play(&mut self, cue: SoundCue) {
        self.sounds.push(cue);
    }

    pub fn emit(&mut self, event: LevelEvent) {
        self.events.push(event);
    }

    /// Take the pending intents, leaving sounds and events in place.
    pub fn take_intents(&mut self) -> Vec<Intent> {
        std::mem::take(&mut self.intents)
    }

    pub fn clear(&mut self) {
        self.intents.clear();
        self.sounds.clear();
        self.events.clear();
    }
}
