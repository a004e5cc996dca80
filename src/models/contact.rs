use crate::models::common::{Iff, Point, ShipId, ShotId};
use crate::models::ship::Ship;

/// センサー接触情報
///
/// シミュレーションが毎ステップ再生成する。AIからは読み取り専用。
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    ship: Option<ShipId>,
    shot: Option<ShotId>,
    /// 接触対象の実IFF（弾体の場合は発射元のIFF）
    iff: Iff,
    /// 識別済みかどうか
    identified: bool,
    location: Point,
}

impl Contact {
    pub fn for_ship(ship: ShipId, iff: Iff, location: Point, identified: bool) -> Self {
        Self {
            ship: Some(ship),
            shot: None,
            iff,
            identified,
            location,
        }
    }

    pub fn for_shot(shot: ShotId, owner_iff: Iff, location: Point) -> Self {
        Self {
            ship: None,
            shot: Some(shot),
            iff: owner_iff,
            identified: true,
            location,
        }
    }

    /// 観測艦から見たIFF
    ///
    /// 未識別の艦は、観測艦と同じIFFでない限り 0（不明）を返す。
    pub fn get_iff(&self, viewer: &Ship) -> Iff {
        if self.identified || self.iff == viewer.get_iff() {
            self.iff
        } else {
            0
        }
    }

    pub fn get_ship(&self) -> Option<ShipId> {
        self.ship
    }

    pub fn get_shot(&self) -> Option<ShotId> {
        self.shot
    }

    pub fn is_identified(&self) -> bool {
        self.identified
    }

    pub fn location(&self) -> Point {
        self.location
    }
}
