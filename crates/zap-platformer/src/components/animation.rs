//! Frame animation driven by the level clock.
//!
//! Frames advance on a fixed per-clip cadence measured in milliseconds of
//! level time. Looping clips wrap; one-shot clips stop on their last frame
//! and report `is_finished` once that frame has been shown for a full cadence.

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::time::elapsed;

/// Definition of a single animation sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    /// Sprite frame indices, in playback order.
    pub frames: Vec<u32>,
    /// Milliseconds each frame stays on screen.
    pub frame_duration_ms: u64,
    /// Whether to loop when reaching the end.
    pub looping: bool,
}

impl AnimationDef {
    /// Consecutive frames `start..start + count`, looping.
    pub fn strip(start: u32, count: u32, frame_duration_ms: u64) -> Self {
        Self {
            frames: (start..start + count).collect(),
            frame_duration_ms,
            looping: true,
        }
    }

    /// A single held frame.
    pub fn still(frame: u32) -> Self {
        Self {
            frames: vec![frame],
            frame_duration_ms: u64::MAX,
            looping: true,
        }
    }

    /// Same frames, played once.
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Animation state for an actor, keyed by a clip identifier.
#[derive(Debug, Clone)]
pub struct AnimationComponent<K> {
    pub clips: HashMap<K, AnimationDef>,
    pub current: K,
    pub frame_index: usize,
    /// Level time of the last frame change (or clip start).
    pub timer_ms: u64,
    /// Cleared when a one-shot clip completes.
    pub playing: bool,
}

impl<K: Copy + Eq + Hash> AnimationComponent<K> {
    pub fn new(clips: HashMap<K, AnimationDef>, initial: K, now_ms: u64) -> Self {
        Self {
            clips,
            current: initial,
            frame_index: 0,
            timer_ms: now_ms,
            playing: true,
        }
    }

    /// Play a clip from its first frame. Unknown clips are ignored.
    pub fn play(&mut self, clip: K, now_ms: u64) {
        if !self.clips.contains_key(&clip) {
            return;
        }
        self.current = clip;
        self.frame_index = 0;
        self.timer_ms = now_ms;
        self.playing = true;
    }

    pub fn current_def(&self) -> Option<&AnimationDef> {
        self.clips.get(&self.current)
    }

    pub fn current_frame(&self) -> Option<u32> {
        self.current_def()
            .and_then(|def| def.frames.get(self.frame_index).copied())
    }

    /// True once a one-shot clip has shown its last frame for a full cadence.
    pub fn is_finished(&self) -> bool {
        !self.playing
    }

    /// Advance on the clip cadence. Returns true if the frame changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if !self.playing {
            return false;
        }
        let Some(def) = self.clips.get(&self.current) else {
            return false;
        };
        if def.frames.is_empty() || !elapsed(now_ms, self.timer_ms, def.frame_duration_ms) {
            return false;
        }
        self.timer_ms = now_ms;
        if self.frame_index + 1 < def.frames.len() {
            self.frame_index += 1;
            true
        } else if def.looping {
            let changed = self.frame_index != 0;
            self.frame_index = 0;
            changed
        } else {
            self.playing = false;
            false
        }
    }
}
