pub mod save;
pub mod stats;

pub use save::{LevelSnapshot, MemoryStore, SaveError, SaveManager, SaveSnapshot, SaveStore, SlotInfo};
pub use stats::GameStats;
