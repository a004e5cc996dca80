// 技量段階の決定
pub mod skill;

// 目標選定
pub mod targeting;

// 操縦AI
pub mod carrier_ai;
pub mod ground_ai;

pub use carrier_ai::CarrierAi;
pub use ground_ai::{EXEC_PERIOD_MS, GroundAi, Observation};
pub use skill::{DifficultyContext, SkillTier, derive_skill_tier};
pub use targeting::select_target;
