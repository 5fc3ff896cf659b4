//! Static level geometry: ground and pipes, fixed terrain, and the random
//! terrain layer that is regenerated wholesale on an interval.

use crate::api::context::{LevelConfig, RandomTerrainConfig};
use crate::core::geometry::Rect;
use crate::core::rng::Rng;

/// Rules for one random-terrain regeneration.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub config: &'a RandomTerrainConfig,
    pub level_width: f32,
    pub ground_top: f32,
    pub exclusion: Option<Rect>,
    /// Actor rects new blocks must not spawn inside.
    pub avoid: &'a [Rect],
}

#[derive(Debug, Clone, Default)]
pub struct TerrainSet {
    ground: Vec<Rect>,
    fixed: Vec<Rect>,
    random: Vec<Rect>,
    /// ground + fixed + random, rebuilt whenever a layer changes.
    merged: Vec<Rect>,
}

impl TerrainSet {
    pub fn new(ground: Vec<Rect>, fixed: Vec<Rect>) -> Self {
        let mut set = Self {
            ground,
            fixed,
            random: Vec::new(),
            merged: Vec::new(),
        };
        set.rebuild_merged();
        set
    }

    /// Ground segments (the full width minus pits), pipes and fixed terrain.
    pub fn from_config(cfg: &LevelConfig) -> Self {
        let mut ground = ground_segments(cfg);
        ground.extend(cfg.pipes.iter().copied());
        Self::new(ground, cfg.fixed_terrain.clone())
    }

    pub fn ground(&self) -> &[Rect] {
        &self.ground
    }

    pub fn fixed(&self) -> &[Rect] {
        &self.fixed
    }

    pub fn random(&self) -> &[Rect] {
        &self.random
    }

    /// Fixed plus random terrain: the procedural collision tier.
    pub fn terrain(&self) -> impl Iterator<Item = &Rect> {
        self.fixed.iter().chain(self.random.iter())
    }

    /// Fixed and random blocks as one slice.
    pub fn procedural(&self) -> &[Rect] {
        &self.merged[self.ground.len()..]
    }

    /// Every platform, in precedence order.
    pub fn platforms(&self) -> &[Rect] {
        &self.merged
    }

    /// Swap in a new random layer in one step.
    pub fn replace_random(&mut self, blocks: Vec<Rect>) {
        self.random = blocks;
        self.rebuild_merged();
    }

    /// Build a fresh random layer and replace the old one.
    /// Returns the number of blocks placed, which may fall short of the
    /// requested count if the attempt budget runs out.
    pub fn regenerate(&mut self, rng: &mut Rng, placement: &Placement) -> usize {
        let blocks = self.generate_random(rng, placement);
        let placed = blocks.len();
        if placed < placement.config.block_count as usize {
            log::debug!(
                "random terrain: placed {} of {} blocks",
                placed,
                placement.config.block_count
            );
        }
        self.replace_random(blocks);
        placed
    }

    fn generate_random(&self, rng: &mut Rng, p: &Placement) -> Vec<Rect> {
        let cfg = p.config;
        let cell = cfg.cell_size.max(1.0);
        let wanted = cfg.block_count as usize;
        let mut blocks: Vec<Rect> = Vec::with_capacity(wanted);

        let lowest_top = p.ground_top - cfg.ground_clearance - cell;
        if lowest_top < cfg.min_y {
            return blocks;
        }
        let rows = ((lowest_top - cfg.min_y) / cell).floor() as u32 + 1;

        for _ in 0..cfg.max_attempts {
            if blocks.len() >= wanted {
                break;
            }
            let cells = rng.range_inclusive(cfg.min_cells as i32, cfg.max_cells.max(cfg.min_cells) as i32);
            let w = cells.max(1) as f32 * cell;
            let cols = ((p.level_width - w) / cell).floor();
            if cols < 0.0 {
                continue;
            }
            let x = rng.next_int(cols as u32 + 1) as f32 * cell;
            let y = cfg.min_y + rng.next_int(rows) as f32 * cell;
            let candidate = Rect::new(x, y, w, cell);

            let blocked = p.exclusion.is_some_and(|zone| zone.intersects(&candidate))
                || self.ground.iter().any(|r| r.intersects(&candidate))
                || self.fixed.iter().any(|r| r.intersects(&candidate))
                || blocks.iter().any(|r| r.intersects(&candidate))
                || p.avoid.iter().any(|r| r.intersects(&candidate));
            if !blocked {
                blocks.push(candidate);
            }
        }
        blocks
    }

    fn rebuild_merged(&mut self) {
        self.merged.clear();
        self.merged.extend_from_slice(&self.ground);
        self.merged.extend_from_slice(&self.fixed);
        self.merged.extend_from_slice(&self.random);
    }
}

/// The ground strip split around pits.
pub fn ground_segments(cfg: &LevelConfig) -> Vec<Rect> {
    let top = cfg.ground_top();
    let mut pits = cfg.pits.clone();
    pits.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut segments = Vec::new();
    let mut start = 0.0_f32;
    for pit in pits {
        if pit.x > start {
            segments.push(Rect::new(start, top, pit.x - start, cfg.ground_height));
        }
        start = start.max(pit.x + pit.w);
    }
    if start < cfg.level_width {
        segments.push(Rect::new(start, top, cfg.level_width - start, cfg.ground_height));
    }
    segments
}
