//! # Radio モジュール
//!
//! ユニット間無線通信（RadioMessage）の語彙とメッセージ封筒を定義します。
//!
//! 無線アクションは閉じた列挙型で、数値（序数）は航法命令（Instruction）の
//! 語彙と空間を共有します。`DOCK_WITH` と `RTB` は航法命令の値をそのまま用い、
//! `QUANTUM_TO` 以降は航法命令の `NUM_ACTIONS` から連番で続きます。
//! 序数の共有やエイリアス関係は暗黙の数値一致に頼らず、
//! [`RadioAction::alias`] の明示的な対応表として提供します。
//!
//! メッセージの配送機構はこのモジュールの範囲外です。

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::common::{ElementId, Point, ShipId, SimObjectId};

/// 航法命令（Instruction）のアクション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum InstructionAction {
    Vector = 0,
    Launch = 1,
    Dock = 2,
    Rtb = 3,
    Defend = 4,
    Escort = 5,
    Patrol = 6,
    Sweep = 7,
    Intercept = 8,
    Strike = 9,
    Assault = 10,
    Recon = 11,
}

impl InstructionAction {
    /// 航法命令アクションの総数（無線アクションの拡張開始位置）
    pub const NUM_ACTIONS: i32 = 12;

    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

/// 無線アクションの意味的な分類（文書用途のみ、挙動は分岐しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioCategory {
    Navigation,
    Protocol,
    TargetManagement,
    CombatManagement,
    SensorManagement,
    FormationManagement,
    MissionManagement,
    Announcement,
    FriendlyFire,
    Support,
    TrafficControl,
}

/// 序数が他のアクションと意味を共有する場合の参照先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionAlias {
    /// 別の無線アクションの表示上の別名
    Radio(RadioAction),
    /// 航法命令の値をそのまま用いる
    Instruction(InstructionAction),
}

/// 無線アクション
///
/// 判別値は通信上の整数値でもあるため、並びと値を変更してはならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum RadioAction {
    None = 0,

    DockWith = InstructionAction::Dock as i32,
    Rtb = InstructionAction::Rtb as i32,
    QuantumTo = InstructionAction::NUM_ACTIONS,
    FarcastTo,

    // protocol
    Ack,
    Nack,

    // target mgt
    Attack,
    Escort,
    Bracket,
    Identify,

    // combat mgt
    CoverMe,
    WepFree,
    WepHold,
    FormUp,
    SayPosition,

    // sensor mgt
    LaunchProbe,
    GoEmcon1,
    GoEmcon2,
    GoEmcon3,

    // formation mgt
    GoDiamond,
    GoSpread,
    GoBox,
    GoTrail,

    // mission mgt
    MovePatrol,
    SkipNavpoint,
    ResumeMission,

    // announcements
    CallEngaging,
    Fox1,
    Fox2,
    Fox3,
    Splash1,
    Splash2,
    Splash3,
    Splash4,
    Splash5,
    Splash6,
    Splash7,
    Distress,
    BreakOrbit,
    MakeOrbit,
    QuantumJump,

    // friendly fire
    WarnAccident,
    WarnTargeted,
    DeclareRogue,

    // support
    Picture,
    RequestPicture,
    RequestSupport,

    // traffic control
    CallInbound,
    CallApproach,
    CallClearance,
    CallFinals,
    CallWaveOff,
}

impl RadioAction {
    /// 無線アクションの序数の上限（最後のアクション + 1）
    pub const NUM_ACTIONS: i32 = RadioAction::CallWaveOff as i32 + 1;

    /// 定義済みの全アクション（序数順）
    pub const ALL: [RadioAction; 53] = [
        RadioAction::None,
        RadioAction::DockWith,
        RadioAction::Rtb,
        RadioAction::QuantumTo,
        RadioAction::FarcastTo,
        RadioAction::Ack,
        RadioAction::Nack,
        RadioAction::Attack,
        RadioAction::Escort,
        RadioAction::Bracket,
        RadioAction::Identify,
        RadioAction::CoverMe,
        RadioAction::WepFree,
        RadioAction::WepHold,
        RadioAction::FormUp,
        RadioAction::SayPosition,
        RadioAction::LaunchProbe,
        RadioAction::GoEmcon1,
        RadioAction::GoEmcon2,
        RadioAction::GoEmcon3,
        RadioAction::GoDiamond,
        RadioAction::GoSpread,
        RadioAction::GoBox,
        RadioAction::GoTrail,
        RadioAction::MovePatrol,
        RadioAction::SkipNavpoint,
        RadioAction::ResumeMission,
        RadioAction::CallEngaging,
        RadioAction::Fox1,
        RadioAction::Fox2,
        RadioAction::Fox3,
        RadioAction::Splash1,
        RadioAction::Splash2,
        RadioAction::Splash3,
        RadioAction::Splash4,
        RadioAction::Splash5,
        RadioAction::Splash6,
        RadioAction::Splash7,
        RadioAction::Distress,
        RadioAction::BreakOrbit,
        RadioAction::MakeOrbit,
        RadioAction::QuantumJump,
        RadioAction::WarnAccident,
        RadioAction::WarnTargeted,
        RadioAction::DeclareRogue,
        RadioAction::Picture,
        RadioAction::RequestPicture,
        RadioAction::RequestSupport,
        RadioAction::CallInbound,
        RadioAction::CallApproach,
        RadioAction::CallClearance,
        RadioAction::CallFinals,
        RadioAction::CallWaveOff,
    ];

    /// 通信上の整数値
    pub fn ordinal(self) -> i32 {
        self as i32
    }

    /// 整数値からアクションを復元（未定義の値は None）
    pub fn from_ordinal(value: i32) -> Option<RadioAction> {
        Self::ALL.iter().copied().find(|a| a.ordinal() == value)
    }

    /// 明示的なエイリアス表
    ///
    /// `FORM_UP` は `WEP_HOLD` の別名、`DOCK_WITH` と `RTB` は航法命令の値を共有する。
    pub fn alias(self) -> Option<ActionAlias> {
        match self {
            RadioAction::FormUp => Some(ActionAlias::Radio(RadioAction::WepHold)),
            RadioAction::DockWith => Some(ActionAlias::Instruction(InstructionAction::Dock)),
            RadioAction::Rtb => Some(ActionAlias::Instruction(InstructionAction::Rtb)),
            _ => None,
        }
    }

    pub fn category(self) -> RadioCategory {
        use RadioAction::*;
        match self {
            None | DockWith | Rtb | QuantumTo | FarcastTo => RadioCategory::Navigation,
            Ack | Nack => RadioCategory::Protocol,
            Attack | Escort | Bracket | Identify => RadioCategory::TargetManagement,
            CoverMe | WepFree | WepHold | FormUp | SayPosition => RadioCategory::CombatManagement,
            LaunchProbe | GoEmcon1 | GoEmcon2 | GoEmcon3 => RadioCategory::SensorManagement,
            GoDiamond | GoSpread | GoBox | GoTrail => RadioCategory::FormationManagement,
            MovePatrol | SkipNavpoint | ResumeMission => RadioCategory::MissionManagement,
            CallEngaging | Fox1 | Fox2 | Fox3 | Splash1 | Splash2 | Splash3 | Splash4
            | Splash5 | Splash6 | Splash7 | Distress | BreakOrbit | MakeOrbit | QuantumJump => {
                RadioCategory::Announcement
            }
            WarnAccident | WarnTargeted | DeclareRogue => RadioCategory::FriendlyFire,
            Picture | RequestPicture | RequestSupport => RadioCategory::Support,
            CallInbound | CallApproach | CallClearance | CallFinals | CallWaveOff => {
                RadioCategory::TrafficControl
            }
        }
    }

    /// 診断・ログ用の安定した表示名
    pub fn name(self) -> &'static str {
        use RadioAction::*;
        match self {
            None => "None",
            DockWith => "Dock With",
            Rtb => "Return to Base",
            QuantumTo => "Jump to",
            FarcastTo => "Farcast to",
            Ack => "Acknowledged",
            Nack => "Negative, Unable",
            Attack => "Engage",
            Escort => "Escort",
            Bracket => "Bracket",
            Identify => "Identify",
            CoverMe => "Cover Me",
            WepFree => "Break and Attack",
            WepHold => "Hold All Weapons",
            FormUp => "Return to Formation",
            SayPosition => "Say Your Position",
            LaunchProbe => "Launch Probe",
            GoEmcon1 => "Reduce EMCON",
            GoEmcon2 => "Normal EMCON",
            GoEmcon3 => "Full EMCON",
            GoDiamond => "Goto Diamond Formation",
            GoSpread => "Goto Spread Formation",
            GoBox => "Goto Box Formation",
            GoTrail => "Goto Trail Formation",
            MovePatrol => "Vector",
            SkipNavpoint => "Skip Navpoint",
            ResumeMission => "Resume Mission",
            CallEngaging => "Engaging",
            Fox1 => "Fox One!",
            Fox2 => "Fox Two!",
            Fox3 => "Fox Three!",
            Splash1 => "Splash One!",
            Splash2 => "Splash Two!",
            Splash3 => "Splash Three!",
            Splash4 => "Splash Four!",
            Splash5 => "Target Destroyed!",
            Splash6 => "Enemy Destroyed!",
            Splash7 => "Confirmed Kill!",
            Distress => "Mayday! Mayday!",
            BreakOrbit => "Breaking Orbit",
            MakeOrbit => "Making Orbit",
            QuantumJump => "Jumping Now!",
            WarnAccident => "Check your fire!",
            WarnTargeted => "Break off immediately!",
            DeclareRogue => "Prepare to be destroyed!",
            Picture => "Picture is clear",
            RequestPicture => "Request Picture",
            RequestSupport => "Request Support",
            CallInbound => "Calling Inbound",
            CallApproach => "Roger your approach",
            CallClearance => "You have clearance",
            CallFinals => "On final approach",
            CallWaveOff => "Wave off - Runway is closed",
        }
    }

    /// 無線で読み上げる文言
    ///
    /// 一部のアクションは複数の言い回しから乱数で選ぶ。それ以外は [`name`](Self::name) と同じ。
    pub fn callout<R: Rng + ?Sized>(self, rng: &mut R) -> &'static str {
        let coin: u32 = rng.gen_range(0..32768);
        match self {
            RadioAction::Ack => match coin {
                0..10000 => "Acknowledged",
                10000..17000 => "Roger that",
                17000..20000 => "Understood",
                20000..22000 => "Copy that",
                _ => "Affirmative",
            },
            RadioAction::Distress => match coin {
                0..15000 => "Mayday! Mayday!",
                15000..18000 => "She's breaking up!",
                18000..21000 => "Checking out!",
                _ => "We're going down!",
            },
            RadioAction::WarnAccident => match coin {
                0..15000 => "Check your fire!",
                15000..18000 => "Watch it!",
                18000..21000 => "Hey! We're on your side!",
                _ => "Confirm your targets!",
            },
            RadioAction::WarnTargeted => match coin {
                0..15000 => "Break off immediately!",
                15000..20000 => "Buddy spike!",
                _ => "Abort! Abort!",
            },
            other => other.name(),
        }
    }
}

impl Serialize for RadioAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for RadioAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i32::deserialize(deserializer)?;
        RadioAction::from_ordinal(value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown radio action: {}", value)))
    }
}

/// メッセージの宛先（単艦か編隊のどちらか一方）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Ship(ShipId),
    Element(ElementId),
}

/// 無線メッセージ
///
/// 送信者が作成し、配送機構に渡された後は破棄される。永続化はしない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioMessage {
    sender: ShipId,
    destination: Destination,
    action: RadioAction,
    target_list: Vec<SimObjectId>,
    location: Point,
    info: String,
    channel: i32,
}

impl RadioMessage {
    /// 単艦宛てのメッセージを作成
    pub fn to_ship(dst: ShipId, sender: ShipId, action: RadioAction) -> Self {
        Self::new(Destination::Ship(dst), sender, action)
    }

    /// 編隊宛てのメッセージを作成
    pub fn to_element(dst: ElementId, sender: ShipId, action: RadioAction) -> Self {
        Self::new(Destination::Element(dst), sender, action)
    }

    pub fn new(destination: Destination, sender: ShipId, action: RadioAction) -> Self {
        Self {
            sender,
            destination,
            action,
            target_list: Vec::new(),
            location: Point::zero(),
            info: String::new(),
            channel: 0,
        }
    }

    pub fn sender(&self) -> ShipId {
        self.sender
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn destination_ship(&self) -> Option<ShipId> {
        match self.destination {
            Destination::Ship(id) => Some(id),
            Destination::Element(_) => None,
        }
    }

    pub fn destination_elem(&self) -> Option<ElementId> {
        match self.destination {
            Destination::Element(id) => Some(id),
            Destination::Ship(_) => None,
        }
    }

    pub fn action(&self) -> RadioAction {
        self.action
    }

    pub fn target_list(&self) -> &[SimObjectId] {
        &self.target_list
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn channel(&self) -> i32 {
        self.channel
    }

    pub fn set_destination_ship(&mut self, ship: ShipId) {
        self.destination = Destination::Ship(ship);
    }

    pub fn set_destination_elem(&mut self, elem: ElementId) {
        self.destination = Destination::Element(elem);
    }

    /// 対象を追加（重複可、挿入順を保持）
    pub fn add_target(&mut self, obj: impl Into<SimObjectId>) {
        self.target_list.push(obj.into());
    }

    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    pub fn set_info(&mut self, info: impl Into<String>) {
        self.info = info.into();
    }

    pub fn set_channel(&mut self, channel: i32) {
        self.channel = channel;
    }
}
