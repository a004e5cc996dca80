use serde::{Deserialize, Serialize};

use crate::models::{
    common::{ElementId, Iff, Point, ShipId, ShotId, SimObjectId},
    contact::Contact,
    traits::{ISimObservable, ObserverId},
    weapon::{Shield, WeaponGroup},
};

/// 艦種分類
///
/// 値はビットフラグで、数値の小さい艦種ほど目標選定で優先される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ShipClass {
    Drone = 0x0000_0001,
    Fighter = 0x0000_0002,
    Attack = 0x0000_0004,
    Lca = 0x0000_0008,
    Courier = 0x0000_0010,
    Cargo = 0x0000_0020,
    Corvette = 0x0000_0040,
    Freighter = 0x0000_0080,
    Frigate = 0x0000_0100,
    Destroyer = 0x0000_0200,
    Cruiser = 0x0000_0400,
    Battleship = 0x0000_0800,
    Carrier = 0x0000_1000,
    Dreadnaught = 0x0000_2000,
    Station = 0x0000_4000,
    Farcaster = 0x0000_8000,
    Mine = 0x0001_0000,
    Comsat = 0x0002_0000,
    Defsat = 0x0004_0000,
    Swacs = 0x0008_0000,
    Building = 0x0010_0000,
    Factory = 0x0020_0000,
    Sam = 0x0040_0000,
    Ewr = 0x0080_0000,
    C3i = 0x0100_0000,
    Starbase = 0x0200_0000,
}

impl ShipClass {
    /// 目標選定で用いる優先順位（小さいほど優先）
    pub fn rank(self) -> u32 {
        self as u32
    }
}

/// 艦種グループのビットマスク
pub mod class_mask {
    pub const DROPSHIPS: u32 = 0x0000_000f;
    pub const STARSHIPS: u32 = 0x0000_fff0;
    pub const SPACE_UNITS: u32 = 0x000f_0000;
    pub const GROUND_UNITS: u32 = 0xfff0_0000;

    /// 名前からマスクを解決（艦種グループ名または個別艦種名）
    pub fn parse(name: &str) -> Option<u32> {
        match name.to_lowercase().as_str() {
            "dropships" => Some(DROPSHIPS),
            "starships" => Some(STARSHIPS),
            "space_units" => Some(SPACE_UNITS),
            "ground_units" => Some(GROUND_UNITS),
            other => serde_yaml::from_str::<super::ShipClass>(other)
                .ok()
                .map(|c| c.rank()),
        }
    }
}

/// 艦の設計情報（AIが参照する項目のみ）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipDesign {
    pub name: String,
    /// 自動ロール制御のレベル（1を超えると高度な機動が可能）
    pub auto_roll: i32,
}

impl ShipDesign {
    pub fn has_advanced_maneuvering(&self) -> bool {
        self.auto_roll > 1
    }
}

/// 格納庫の飛行隊
#[derive(Debug, Clone, PartialEq)]
pub struct HangarSquadron {
    pub name: String,
    pub design_class: ShipClass,
    /// 格納中で発艦可能な機数
    pub ready: u32,
    /// 発艦済みの機数
    pub deployed: u32,
    /// 発艦中の編隊
    pub flight: Option<ElementId>,
}

impl HangarSquadron {
    pub fn new(name: impl Into<String>, design_class: ShipClass, count: u32) -> Self {
        Self {
            name: name.into(),
            design_class,
            ready: count,
            deployed: 0,
            flight: None,
        }
    }
}

/// 格納庫
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hangar {
    pub squadrons: Vec<HangarSquadron>,
}

impl Hangar {
    pub fn new(squadrons: Vec<HangarSquadron>) -> Self {
        Self { squadrons }
    }

    pub fn total_ready(&self) -> u32 {
        self.squadrons.iter().map(|s| s.ready).sum()
    }

    pub fn total_deployed(&self) -> u32 {
        self.squadrons.iter().map(|s| s.deployed).sum()
    }
}

/// 艦（ユニット）
///
/// AIが消費するユニットインターフェースを提供する。
/// 移動・衝突・弾道などの物理はこの構造体の範囲外。
#[derive(Debug, Clone)]
pub struct Ship {
    id: ShipId,
    name: String,
    iff: Iff,
    class: ShipClass,
    pub location: Point,
    pub design: ShipDesign,
    pub hangar: Option<Hangar>,
    pub command_ai_level: i32,
    pub shield: Option<Shield>,
    pub weapons: Vec<WeaponGroup>,
    /// 探知範囲（メートル、球形半径）
    pub sensor_range: f64,
    /// 名前付きサブシステム（精密攻撃の対象）
    pub systems: Vec<String>,
    in_transition: bool,
    rogue: bool,
    contacts: Vec<Contact>,
    observers: Vec<ObserverId>,
}

impl Ship {
    pub fn new(id: ShipId, name: impl Into<String>, iff: Iff, class: ShipClass) -> Self {
        Self {
            id,
            name: name.into(),
            iff,
            class,
            location: Point::zero(),
            design: ShipDesign::default(),
            hangar: None,
            command_ai_level: 0,
            shield: None,
            weapons: Vec::new(),
            sensor_range: 0.0,
            systems: Vec::new(),
            in_transition: false,
            rogue: false,
            contacts: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> ShipId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ShipId) {
        self.id = id;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_iff(&self) -> Iff {
        self.iff
    }

    pub fn class(&self) -> ShipClass {
        self.class
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn design(&self) -> &ShipDesign {
        &self.design
    }

    pub fn get_hangar(&self) -> Option<&Hangar> {
        self.hangar.as_ref()
    }

    pub fn get_hangar_mut(&mut self) -> Option<&mut Hangar> {
        self.hangar.as_mut()
    }

    pub fn get_command_ai_level(&self) -> i32 {
        self.command_ai_level
    }

    pub fn get_shield(&self) -> Option<&Shield> {
        self.shield.as_ref()
    }

    pub fn get_shield_mut(&mut self) -> Option<&mut Shield> {
        self.shield.as_mut()
    }

    pub fn weapons(&self) -> &[WeaponGroup] {
        &self.weapons
    }

    pub fn weapons_mut(&mut self) -> impl Iterator<Item = &mut WeaponGroup> {
        self.weapons.iter_mut()
    }

    /// 遷移中（超光速遷移・発艦など）かどうか
    pub fn in_transition(&self) -> bool {
        self.in_transition
    }

    pub fn set_in_transition(&mut self, in_transition: bool) {
        self.in_transition = in_transition;
    }

    /// 全勢力に敵対する「はぐれ」艦かどうか
    pub fn is_rogue(&self) -> bool {
        self.rogue
    }

    pub fn set_rogue(&mut self, rogue: bool) {
        self.rogue = rogue;
    }

    /// 現在の接触リスト（シミュレーション順）
    pub fn contact_list(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    /// 接触リストの差し替え（シミュレーションエンジン用）
    pub fn set_contacts(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
    }

    pub fn has_system(&self, name: &str) -> bool {
        self.systems.iter().any(|s| s == name)
    }
}

impl ISimObservable for Ship {
    fn object_id(&self) -> SimObjectId {
        SimObjectId::Ship(self.id)
    }

    fn register_observer(&mut self, observer: ObserverId) {
        if !self.observers.contains(&observer) {
            self.observers.push(observer);
        }
    }

    fn unregister_observer(&mut self, observer: ObserverId) {
        self.observers.retain(|o| *o != observer);
    }

    fn observers(&self) -> &[ObserverId] {
        &self.observers
    }
}

/// 弾体
#[derive(Debug, Clone)]
pub struct Shot {
    id: ShotId,
    pub owner_iff: Iff,
    pub location: Point,
    observers: Vec<ObserverId>,
}

impl Shot {
    pub fn new(id: ShotId, owner_iff: Iff, location: Point) -> Self {
        Self {
            id,
            owner_iff,
            location,
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> ShotId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ShotId) {
        self.id = id;
    }
}

impl ISimObservable for Shot {
    fn object_id(&self) -> SimObjectId {
        SimObjectId::Shot(self.id)
    }

    fn register_observer(&mut self, observer: ObserverId) {
        if !self.observers.contains(&observer) {
            self.observers.push(observer);
        }
    }

    fn unregister_observer(&mut self, observer: ObserverId) {
        self.observers.retain(|o| *o != observer);
    }

    fn observers(&self) -> &[ObserverId] {
        &self.observers
    }
}
