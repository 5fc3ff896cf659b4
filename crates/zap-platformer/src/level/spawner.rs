use serde::{Deserialize, Serialize};

use crate::api::context::{BossConfig, Commands, Intent};
use crate::api::types::{Direction, LevelEvent};
use crate::core::time::elapsed;
use crate::entities::boss::Boss;
use crate::entities::enemy::EnemyKind;

/// Horizontal gap between the boss and a freshly spawned minion.
pub const FLANK_GAP: f32 = 80.0;

/// Boss-driven minion spawns on a fixed interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossSpawner {
    pub interval_ms: u64,
    pub threshold: usize,
    pub last_check_ms: u64,
}

impl BossSpawner {
    pub fn new(config: &BossConfig, now_ms: u64) -> Self {
        Self {
            interval_ms: config.spawn_interval_ms,
            threshold: config.spawn_threshold,
            last_check_ms: now_ms,
        }
    }

    /// On each interval, if fewer than `threshold` live enemies remain,
    /// queue one Goomba left of the boss and one Koopa right of it and
    /// start the boss's attack animation. Returns true if it spawned.
    pub fn update(
        &mut self,
        now_ms: u64,
        boss: &mut Boss,
        live_enemies: usize,
        level_width: f32,
        cmds: &mut Commands,
    ) -> bool {
        if boss.is_dying() || !elapsed(now_ms, self.last_check_ms, self.interval_ms) {
            return false;
        }
        self.last_check_ms = now_ms;
        if live_enemies >= self.threshold {
            return false;
        }

        let body = boss.rect();
        let (goomba_w, _) = EnemyKind::Goomba.size();
        let (koopa_w, _) = EnemyKind::Koopa.size();
        let left_x = (body.left() - FLANK_GAP - goomba_w).max(0.0);
        let right_x = (body.right() + FLANK_GAP).min((level_width - koopa_w).max(0.0));
        cmds.push(Intent::SpawnEnemy {
            kind: EnemyKind::Goomba,
            x: left_x,
            bottom: body.bottom(),
            direction: Direction::Left,
        });
        cmds.push(Intent::SpawnEnemy {
            kind: EnemyKind::Koopa,
            x: right_x,
            bottom: body.bottom(),
            direction: Direction::Right,
        });
        boss.trigger_attack(now_ms);
        cmds.emit(LevelEvent::BossSpawnedMinions { count: 2 });
        log::debug!("boss spawned minions ({} live before)", live_enemies);
        true
    }
}
