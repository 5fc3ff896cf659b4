//! Save snapshots and slot storage.
//!
//! The level produces and accepts a [`SaveSnapshot`]; where the bytes end up
//! is the host's business, behind [`SaveStore`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::types::Direction;
use crate::core::geometry::Rect;
use crate::core::rng::Rng;
use crate::entities::enemy::EnemyKind;
use crate::entities::player::Player;
use crate::level::transition::LevelClock;
use crate::persist::stats::GameStats;

pub const SLOT_COUNT: u8 = 3;
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save slot {0} out of range (1..=3)")]
    InvalidSlot(u8),
    #[error("no save in slot {0}")]
    NotFound(u8),
    #[error("corrupt save data: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("snapshot rejected: {0}")]
    Mismatch(String),
}

/// How an enemy was caught at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyPose {
    Walking,
    Shell,
    SlidingShell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub kind: EnemyKind,
    pub x: f32,
    pub bottom: f32,
    pub direction: Direction,
    pub pose: EnemyPose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub x: f32,
    pub health: i32,
    pub stomp_count: u32,
}

/// Level-specific state. Entities mid-death are not saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub now_ms: u64,
    pub player: Player,
    pub clock: LevelClock,
    pub enemies: Vec<EnemySnapshot>,
    /// `None` once the boss has been defeated.
    pub boss: Option<BossSnapshot>,
    pub random_terrain: Vec<Rect>,
    pub rng: Rng,
    pub camera_x: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveSnapshot {
    pub version: u32,
    /// Host-supplied save time, opaque to the level.
    pub timestamp: u64,
    pub stats: GameStats,
    pub level: LevelSnapshot,
}

/// Summary shown on a load menu.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    pub score: u32,
    pub lives: u32,
    pub coins: u32,
    pub timestamp: u64,
}

/// Byte storage for save slots.
pub trait SaveStore {
    fn read(&self, slot: u8) -> Result<Option<String>, SaveError>;
    fn write(&mut self, slot: u8, data: String) -> Result<(), SaveError>;
    /// Returns false if there was nothing to remove.
    fn remove(&mut self, slot: u8) -> Result<bool, SaveError>;
}

/// In-memory store, for tests and hosts without persistent storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<u8, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access, e.g. to plant a damaged save.
    pub fn insert_raw(&mut self, slot: u8, data: impl Into<String>) {
        self.slots.insert(slot, data.into());
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, slot: u8) -> Result<Option<String>, SaveError> {
        Ok(self.slots.get(&slot).cloned())
    }

    fn write(&mut self, slot: u8, data: String) -> Result<(), SaveError> {
        self.slots.insert(slot, data);
        Ok(())
    }

    fn remove(&mut self, slot: u8) -> Result<bool, SaveError> {
        Ok(self.slots.remove(&slot).is_some())
    }
}

/// Three JSON save slots, numbered from 1.
#[derive(Debug)]
pub struct SaveManager<S> {
    store: S,
    pub current_slot: u8,
}

fn check_slot(slot: u8) -> Result<u8, SaveError> {
    if (1..=SLOT_COUNT).contains(&slot) {
        Ok(slot)
    } else {
        Err(SaveError::InvalidSlot(slot))
    }
}

impl<S: SaveStore> SaveManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current_slot: 1,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&mut self, slot: u8, snapshot: &SaveSnapshot) -> Result<(), SaveError> {
        let slot = check_slot(slot)?;
        let json = serde_json::to_string(snapshot)?;
        match self.store.write(slot, json) {
            Ok(()) => {
                log::info!("saved game to slot {}", slot);
                Ok(())
            }
            Err(e) => {
                log::warn!("saving slot {} failed: {}", slot, e);
                Err(e)
            }
        }
    }

    pub fn load(&self, slot: u8) -> Result<SaveSnapshot, SaveError> {
        let slot = check_slot(slot)?;
        let data = self.store.read(slot)?.ok_or(SaveError::NotFound(slot))?;
        let snapshot: SaveSnapshot = serde_json::from_str(&data).map_err(|e| {
            log::warn!("slot {} is corrupt: {}", slot, e);
            SaveError::Corrupt(e)
        })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SaveError::Mismatch(format!(
                "version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        log::info!("loaded game from slot {}", slot);
        Ok(snapshot)
    }

    pub fn slot_exists(&self, slot: u8) -> bool {
        check_slot(slot)
            .and_then(|s| self.store.read(s))
            .is_ok_and(|data| data.is_some())
    }

    /// Summary of a slot, or `None` if it is empty or unreadable.
    pub fn slot_info(&self, slot: u8) -> Option<SlotInfo> {
        let snapshot = self.load(slot).ok()?;
        Some(SlotInfo {
            score: snapshot.stats.score,
            lives: snapshot.stats.lives,
            coins: snapshot.stats.coin_total,
            timestamp: snapshot.timestamp,
        })
    }

    pub fn delete(&mut self, slot: u8) -> Result<bool, SaveError> {
        let slot = check_slot(slot)?;
        let removed = self.store.remove(slot)?;
        if removed {
            log::info!("deleted save in slot {}", slot);
        }
        Ok(removed)
    }
}
