/// Fixed timestep accumulator, in whole milliseconds.
/// Turns variable wall-clock frame deltas into a whole number of level ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    /// Length of one tick in milliseconds.
    dt_ms: u64,
    /// Milliseconds carried over from previous frames.
    accumulator: u64,
}

impl FixedTimestep {
    /// Maximum ticks run for a single frame (prevents the spiral of death).
    pub const MAX_STEPS: u32 = 10;

    pub fn new(dt_ms: u64) -> Self {
        Self {
            dt_ms: dt_ms.max(1),
            accumulator: 0,
        }
    }

    /// Add frame time to the accumulator. Returns the number of ticks to run.
    pub fn accumulate(&mut self, frame_ms: u64) -> u32 {
        self.accumulator += frame_ms;
        self.accumulator = self.accumulator.min(self.dt_ms * Self::MAX_STEPS as u64);
        let steps = self.accumulator / self.dt_ms;
        self.accumulator -= steps * self.dt_ms;
        steps as u32
    }

    pub fn dt_ms(&self) -> u64 {
        self.dt_ms
    }
}

/// True once at least `duration_ms` has passed since `since_ms`.
pub fn elapsed(now_ms: u64, since_ms: u64, duration_ms: u64) -> bool {
    now_ms.saturating_sub(since_ms) >= duration_ms
}
