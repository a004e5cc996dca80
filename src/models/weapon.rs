use crate::models::common::ShipId;

/// 兵装グループの射撃命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FiringOrders {
    /// 手動射撃（命令待ち）
    #[default]
    Manual,
    /// 自動射撃
    Auto,
    /// 小型高速目標に対する近接防御
    PointDefense,
}

/// 兵装グループ
///
/// 同種兵装の束。AIからは命令的インターフェース（射撃命令・目標指定）のみを使う。
#[derive(Debug, Clone)]
pub struct WeaponGroup {
    pub name: String,
    /// 所属する兵装の数
    pub num_weapons: usize,
    /// 交戦可能な艦種のビットマスク（`ShipClass` の値の論理和）
    pub target_types: u32,
    orders: FiringOrders,
    target: Option<ShipId>,
    subtarget: Option<String>,
}

impl WeaponGroup {
    pub fn new(name: impl Into<String>, num_weapons: usize, target_types: u32) -> Self {
        Self {
            name: name.into(),
            num_weapons,
            target_types,
            orders: FiringOrders::default(),
            target: None,
            subtarget: None,
        }
    }

    pub fn num_weapons(&self) -> usize {
        self.num_weapons
    }

    /// 指定した艦種マスクのいずれかと交戦できるか
    pub fn can_target(&self, class_mask: u32) -> bool {
        self.target_types & class_mask != 0
    }

    pub fn firing_orders(&self) -> FiringOrders {
        self.orders
    }

    pub fn set_firing_orders(&mut self, orders: FiringOrders) {
        self.orders = orders;
    }

    /// 目標の指定。`None` は「目標なし（射撃待機）」の正当な命令。
    pub fn set_target(&mut self, target: Option<ShipId>, subtarget: Option<String>) {
        self.target = target;
        self.subtarget = if target.is_some() { subtarget } else { None };
    }

    pub fn target(&self) -> Option<ShipId> {
        self.target
    }

    pub fn subtarget(&self) -> Option<&str> {
        self.subtarget.as_deref()
    }
}

/// シールド
#[derive(Debug, Clone, PartialEq)]
pub struct Shield {
    power_level: f64, // %
}

impl Shield {
    pub fn new(power_level: f64) -> Self {
        Self {
            power_level: power_level.clamp(0.0, 100.0),
        }
    }

    pub fn power_level(&self) -> f64 {
        self.power_level
    }

    /// 出力配分の設定（0〜100%）
    pub fn set_power_level(&mut self, level: f64) {
        self.power_level = level.clamp(0.0, 100.0);
    }
}

impl Default for Shield {
    fn default() -> Self {
        Self::new(0.0)
    }
}
