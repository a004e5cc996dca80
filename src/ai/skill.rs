use crate::models::{
    common::{IFF_ALIEN_THRESHOLD, Iff},
    ship::Ship,
};

/// AIの技量段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SkillTier {
    Low = 0,
    #[default]
    Medium = 1,
    High = 2,
}

impl SkillTier {
    /// 数値レベルから段階を解決（範囲外は None）
    pub fn from_level(level: i32) -> Option<SkillTier> {
        match level {
            0 => Some(SkillTier::Low),
            1 => Some(SkillTier::Medium),
            2 => Some(SkillTier::High),
            _ => None,
        }
    }

    pub fn level(self) -> i32 {
        self as i32
    }
}

/// 難易度コンテキスト
///
/// 視点（プレイヤー）艦のIFFと、プレイヤーが設定した難易度を構築時に渡す。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DifficultyContext {
    /// プレイヤー艦のIFF（プレイヤー艦がない場合は None）
    pub player_iff: Option<Iff>,
    /// プレイヤーの設定難易度（プレイヤー情報がない場合は None）
    pub player_skill: Option<SkillTier>,
}

impl DifficultyContext {
    /// プレイヤー艦がない場合の既定の陣営
    pub const DEFAULT_PLAYER_TEAM: Iff = 1;

    pub fn new(player_iff: Option<Iff>, player_skill: Option<SkillTier>) -> Self {
        Self {
            player_iff,
            player_skill,
        }
    }

    pub fn player_team(&self) -> Iff {
        self.player_iff.unwrap_or(Self::DEFAULT_PLAYER_TEAM)
    }
}

/// 艦に適用するAI技量段階の決定
///
/// プレイヤーに敵対する艦はプレイヤーの設定難易度を継承する（最低段階は Medium に引き上げ）。
/// 異星勢力（IFF > 1）で高度な機動が可能な艦は常に High。
pub fn derive_skill_tier(ship: Option<&Ship>, ctx: &DifficultyContext) -> SkillTier {
    let mut tier = SkillTier::default();

    if let (Some(ship), Some(player_skill)) = (ship, ctx.player_skill) {
        let iff = ship.get_iff();
        if iff != 0 && iff != ctx.player_team() {
            tier = player_skill.max(SkillTier::Medium);
        }
    }

    // evil alien ships are *always* smart
    if let Some(ship) = ship {
        if ship.get_iff() > IFF_ALIEN_THRESHOLD && ship.design().has_advanced_maneuvering() {
            tier = SkillTier::High;
        }
    }

    tier
}
