use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// 3次元位置を表す構造体
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64, // m
    pub y: f64, // m
    pub z: f64, // m
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 原点
    pub fn zero() -> Self {
        Self::default()
    }

    /// ベクトルの長さ（原点からの距離）
    pub fn length(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// 3次元距離を計算
    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

/// 艦船（ユニット）の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(pub u32);

/// 弾体（ミサイル・砲弾）の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShotId(pub u32);

/// 編隊（エレメント）の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ship#{}", self.0)
    }
}

impl fmt::Display for ShotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shot#{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// シミュレーション上の任意オブジェクトへの参照（所有しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SimObjectId {
    Ship(ShipId),
    Shot(ShotId),
}

impl SimObjectId {
    pub fn as_ship(&self) -> Option<ShipId> {
        match self {
            SimObjectId::Ship(id) => Some(*id),
            SimObjectId::Shot(_) => None,
        }
    }
}

impl From<ShipId> for SimObjectId {
    fn from(id: ShipId) -> Self {
        SimObjectId::Ship(id)
    }
}

impl From<ShotId> for SimObjectId {
    fn from(id: ShotId) -> Self {
        SimObjectId::Shot(id)
    }
}

impl fmt::Display for SimObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimObjectId::Ship(id) => id.fmt(f),
            SimObjectId::Shot(id) => id.fmt(f),
        }
    }
}

/// IFFコード（敵味方識別）
pub type Iff = i32;

/// これ以上のIFFコードは非戦闘・環境カテゴリを表し、攻撃対象にならない
pub const IFF_NEUTRAL_SENTINEL: Iff = 1000;

/// このIFFコードを超える艦は「異星勢力」とみなす
pub const IFF_ALIEN_THRESHOLD: Iff = 1;

/// ゲーム時刻（ミリ秒）
///
/// シミュレーションエンジンが所有し、フレーム毎に進める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct GameTime(pub i64);

impl GameTime {
    pub fn from_secs(secs: f64) -> Self {
        Self((secs * 1000.0).round() as i64)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn secs(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// 指定ミリ秒だけ進めた時刻
    pub fn advanced(&self, millis: i64) -> Self {
        Self(self.0 + millis)
    }
}
