use std::collections::BTreeMap;

use crate::models::{
    common::{ElementId, Iff, Point, ShipId, ShotId, SimObjectId},
    contact::Contact,
    radio::RadioMessage,
    ship::{Ship, Shot},
    traits::ISimObservable,
};

/// 編隊（エレメント）
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub members: Vec<ShipId>,
    /// 実体化していない艦載機の機数
    pub craft: u32,
}

/// シミュレーション世界
///
/// 艦・弾体・編隊を所有し、識別子による非所有参照の解決を提供する。
/// 反復順は識別子の昇順で決定的。
#[derive(Debug, Default)]
pub struct World {
    ships: BTreeMap<ShipId, Ship>,
    shots: BTreeMap<ShotId, Shot>,
    elements: BTreeMap<ElementId, Element>,
    /// 未配送の無線メッセージ
    outbox: Vec<RadioMessage>,
    transmitted: usize,
    next_ship: u32,
    next_shot: u32,
    next_element: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// 艦を追加し、新しい識別子を割り当てる
    pub fn add_ship(&mut self, mut ship: Ship) -> ShipId {
        self.next_ship += 1;
        let id = ShipId(self.next_ship);
        ship.set_id(id);
        self.ships.insert(id, ship);
        id
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(&id)
    }

    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut Ship> {
        self.ships.get_mut(&id)
    }

    pub fn ship_by_name(&self, name: &str) -> Option<&Ship> {
        self.ships.values().find(|s| s.name() == name)
    }

    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.values()
    }

    pub fn ship_ids(&self) -> Vec<ShipId> {
        self.ships.keys().copied().collect()
    }

    pub fn num_ships(&self) -> usize {
        self.ships.len()
    }

    /// 艦を世界から取り出す
    ///
    /// 呼び出し側は、返された艦を破棄する前に登録済み観測者へ通知すること。
    /// 編隊の所属からも除かれる。
    pub fn remove_ship(&mut self, id: ShipId) -> Option<Ship> {
        let ship = self.ships.remove(&id)?;
        for element in self.elements.values_mut() {
            element.members.retain(|m| *m != id);
        }
        Some(ship)
    }

    pub fn add_shot(&mut self, mut shot: Shot) -> ShotId {
        self.next_shot += 1;
        let id = ShotId(self.next_shot);
        shot.set_id(id);
        self.shots.insert(id, shot);
        id
    }

    pub fn shot(&self, id: ShotId) -> Option<&Shot> {
        self.shots.get(&id)
    }

    /// 観測可能オブジェクトの解決
    pub fn observable_mut(&mut self, id: SimObjectId) -> Option<&mut dyn ISimObservable> {
        match id {
            SimObjectId::Ship(ship) => self
                .ships
                .get_mut(&ship)
                .map(|s| s as &mut dyn ISimObservable),
            SimObjectId::Shot(shot) => self
                .shots
                .get_mut(&shot)
                .map(|s| s as &mut dyn ISimObservable),
        }
    }

    pub fn create_element(
        &mut self,
        name: impl Into<String>,
        members: Vec<ShipId>,
        craft: u32,
    ) -> ElementId {
        self.next_element += 1;
        let id = ElementId(self.next_element);
        self.elements.insert(
            id,
            Element {
                id,
                name: name.into(),
                members,
                craft,
            },
        );
        id
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// 艦が所属する最初の編隊
    pub fn element_of(&self, ship: ShipId) -> Option<ElementId> {
        self.elements
            .values()
            .find(|e| e.members.contains(&ship))
            .map(|e| e.id)
    }

    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        self.elements.remove(&id)
    }

    /// 無線メッセージの送信（配送されるまで送信待ちに置く）
    pub fn transmit(&mut self, message: RadioMessage) {
        self.transmitted += 1;
        self.outbox.push(message);
    }

    pub fn pending_radio(&self) -> &[RadioMessage] {
        &self.outbox
    }

    /// 送信待ちのメッセージを取り出す。取り出したメッセージは世界に残らない。
    pub fn drain_radio(&mut self) -> Vec<RadioMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// これまでに送信されたメッセージの総数
    pub fn radio_transmitted(&self) -> usize {
        self.transmitted
    }

    /// 探知範囲に基づく全艦の接触リストの再生成
    ///
    /// 探知範囲の半分以内の艦は識別済みとして扱う。
    pub fn refresh_contacts(&mut self) {
        let ship_snapshot: Vec<(ShipId, Iff, Point)> = self
            .ships
            .values()
            .map(|s| (s.id(), s.get_iff(), s.location()))
            .collect();
        let shot_snapshot: Vec<(ShotId, Iff, Point)> = self
            .shots
            .values()
            .map(|s| (s.id(), s.owner_iff, s.location))
            .collect();

        for ship in self.ships.values_mut() {
            let range = ship.sensor_range;
            if range <= 0.0 {
                ship.set_contacts(Vec::new());
                continue;
            }

            let own = ship.location();
            let mut contacts = Vec::new();

            for (id, iff, location) in &ship_snapshot {
                if *id == ship.id() {
                    continue;
                }
                let distance = own.distance(location);
                if distance <= range {
                    contacts.push(Contact::for_ship(*id, *iff, *location, distance <= range * 0.5));
                }
            }

            for (id, iff, location) in &shot_snapshot {
                if own.distance(location) <= range {
                    contacts.push(Contact::for_shot(*id, *iff, *location));
                }
            }

            ship.set_contacts(contacts);
        }
    }
}
