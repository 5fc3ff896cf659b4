use crate::api::context::LevelConfig;
use crate::api::types::{LevelEvent, NextScene, SoundCue};
use crate::assets::registry::LevelSprites;
use crate::core::time::FixedTimestep;
use crate::input::keys::{KeyEvent, KeyQueue};
use crate::level::render::InstanceSurface;
use crate::level::Level;
use crate::persist::save::{SaveError, SaveManager, SaveStore};
use crate::persist::stats::GameStats;

/// Receives the sound cues a frame produced. Playback policy is the host's.
pub trait SoundDispatcher {
    fn play(&mut self, cue: SoundCue);
}

impl SoundDispatcher for Vec<SoundCue> {
    fn play(&mut self, cue: SoundCue) {
        self.push(cue);
    }
}

/// Drives one level from wall-clock frame deltas.
///
/// Each frame folds pending key events, runs as many fixed ticks as the
/// accumulated time allows, forwards the collected sound cues and rebuilds
/// the instance buffer.
pub struct LevelRunner {
    level: Level,
    stats: GameStats,
    keys: KeyQueue,
    timestep: FixedTimestep,
    clock_ms: u64,
    surface: InstanceSurface,
    /// Events from the most recent frame.
    events: Vec<LevelEvent>,
}

impl LevelRunner {
    pub fn new(config: LevelConfig, stats: GameStats) -> Self {
        let timestep = FixedTimestep::new(config.fixed_dt_ms);
        let level = Level::new(config, &stats, 0);
        Self {
            level,
            stats,
            keys: KeyQueue::new(),
            timestep,
            clock_ms: 0,
            surface: InstanceSurface::new(),
            events: Vec::new(),
        }
    }

    pub fn with_sprites(mut self, sprites: LevelSprites) -> Self {
        self.level = self.level.with_sprites(sprites);
        self
    }

    pub fn push_key(&mut self, event: KeyEvent) {
        self.keys.push(event);
    }

    /// Run one frame of `frame_ms` wall-clock milliseconds.
    pub fn tick(&mut self, frame_ms: u64, sounds: &mut impl SoundDispatcher) {
        self.events.clear();
        let keys = self.keys.snapshot();

        let steps = self.timestep.accumulate(frame_ms);
        for _ in 0..steps {
            if self.level.outcome().is_some() {
                break;
            }
            self.clock_ms += self.timestep.dt_ms();
            self.level.update(&mut self.stats, &keys, self.clock_ms);
        }

        for cue in self.level.drain_sounds() {
            sounds.play(cue);
        }
        self.events.extend(self.level.drain_events());

        self.surface.clear();
        self.level.render(&mut self.surface);
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn events(&self) -> &[LevelEvent] {
        &self.events
    }

    pub fn surface(&self) -> &InstanceSurface {
        &self.surface
    }

    pub fn outcome(&self) -> Option<NextScene> {
        self.level.outcome()
    }

    pub fn save<S: SaveStore>(
        &self,
        saves: &mut SaveManager<S>,
        slot: u8,
        timestamp: u64,
    ) -> Result<(), SaveError> {
        saves.save(slot, &self.level.snapshot(&self.stats, timestamp))?;
        saves.current_slot = slot;
        Ok(())
    }

    /// Load a slot into the running level. The runner's clock jumps to the
    /// snapshot's time.
    pub fn load<S: SaveStore>(&mut self, saves: &mut SaveManager<S>, slot: u8) -> Result<(), SaveError> {
        let snapshot = saves.load(slot)?;
        if let Err(e) = self.level.restore(&snapshot, &mut self.stats) {
            log::warn!("restoring slot {} failed: {}", slot, e);
            return Err(e);
        }
        self.clock_ms = snapshot.level.now_ms;
        saves.current_slot = slot;
        Ok(())
    }
}
