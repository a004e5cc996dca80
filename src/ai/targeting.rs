//! # Targeting モジュール
//!
//! 自艦の接触リストから、交戦すべき単一の敵艦を選定します。
//!
//! 選定規則:
//!
//! 1. はぐれ艦、または IFF が正・自艦と異なる・中立番兵値未満の接触のみ対象
//! 2. 実体の艦が解決でき、遷移中でないこと（弾体のみの接触は対象外）
//! 3. 候補がまだないか、艦種順位が現候補以下かつ距離が現候補より近い場合に置き換え
//!
//! 接触リストは選定の間だけ読み取り専用のスナップショットとして扱い、変更しません。

use crate::models::{
    common::{IFF_NEUTRAL_SENTINEL, Iff, ShipId},
    contact::Contact,
    ship::Ship,
    world::World,
};

/// IFFによる敵対判定
pub fn is_hostile_iff(contact_iff: Iff, own_iff: Iff, rogue: bool) -> bool {
    rogue || (contact_iff > 0 && contact_iff != own_iff && contact_iff < IFF_NEUTRAL_SENTINEL)
}

/// 接触が交戦可能な敵艦を指していれば、その艦を返す
pub fn resolve_hostile<'w>(world: &'w World, ship: &Ship, contact: &Contact) -> Option<&'w Ship> {
    let c_ship = contact.get_ship().and_then(|id| world.ship(id));
    let rogue = c_ship.is_some_and(|s| s.is_rogue());
    let c_iff = contact.get_iff(ship);

    if !is_hostile_iff(c_iff, ship.get_iff(), rogue) {
        return None;
    }

    c_ship.filter(|s| !s.in_transition())
}

/// 交戦可能な全敵艦（接触リスト順）
pub fn hostile_ships(world: &World, ship: &Ship) -> Vec<ShipId> {
    ship.contact_list()
        .filter_map(|c| resolve_hostile(world, ship, c))
        .map(|s| s.id())
        .collect()
}

/// 最良の目標を選定する
///
/// 自艦が存在しない場合や、交戦可能な接触がない場合は None。
pub fn select_target(world: &World, own: ShipId) -> Option<ShipId> {
    let ship = world.ship(own)?;

    let mut best: Option<&Ship> = None;
    let mut best_dist = f64::INFINITY;

    for contact in ship.contact_list() {
        let Some(c_ship) = resolve_hostile(world, ship, contact) else {
            continue;
        };

        let dist = ship.location().distance(&c_ship.location());

        let replace = match best {
            None => true,
            Some(current) => c_ship.class().rank() <= current.class().rank() && dist < best_dist,
        };

        if replace {
            best = Some(c_ship);
            best_dist = dist;
        }
    }

    best.map(|s| s.id())
}
