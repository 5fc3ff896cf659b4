pub mod boss;
pub mod enemy;
pub mod player;
pub mod powerup;
pub mod score_popup;

pub use boss::{Boss, BossState};
pub use enemy::{Enemy, EnemyKind, EnemyState, StompOutcome};
pub use player::{HitOutcome, Player, PlayerState};
pub use powerup::PowerUp;
pub use score_popup::ScorePopup;
