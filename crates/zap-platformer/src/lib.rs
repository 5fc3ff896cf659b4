pub mod api;
pub mod core;
pub mod components;
pub mod entities;
pub mod level;
pub mod input;
pub mod assets;
pub mod persist;
pub mod runner;

// Re-export key types at crate root for convenience
pub use api::context::{BossConfig, Commands, EnemySpawn, Intent, LevelConfig, Pit, RandomTerrainConfig, TickContext};
pub use api::types::{Direction, EntityId, LevelEvent, NextScene, SoundCue};
pub use core::geometry::Rect;
pub use core::rng::Rng;
pub use core::scene::{Scene, SceneEntity};
pub use core::time::FixedTimestep;
pub use components::animation::{AnimationComponent, AnimationDef};
pub use components::layer::RenderLayer;
pub use components::physics::{ActorFault, ActorPhysics};
pub use components::terrain::TerrainSet;
pub use entities::{Boss, BossState, Enemy, EnemyKind, EnemyState, HitOutcome, Player, PlayerState, PowerUp, ScorePopup};
pub use level::Level;
pub use level::camera::Viewport;
pub use level::render::{InstanceSurface, LayerBatch, RenderInstance, RenderSurface};
pub use level::transition::{FreezeReason, LevelClock};
pub use input::{Key, KeyEvent, KeyQueue, KeySnapshot};
pub use assets::{AssetManifest, LevelSprites, SpriteHandle, SpriteRegistry};
pub use persist::{GameStats, LevelSnapshot, MemoryStore, SaveError, SaveManager, SaveSnapshot, SaveStore, SlotInfo};
pub use runner::{LevelRunner, SoundDispatcher};
