use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::ship::{ShipClass, class_mask};

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    #[serde(default)]
    pub seed: u64,
}

impl SimulationConfig {
    /// 時間刻みのミリ秒換算
    ///
    /// 1ミリ秒以上の整数ミリ秒にならない時間刻みは `None`。
    pub fn step_millis(&self) -> Option<i64> {
        let millis = self.dt_s * 1000.0;
        let whole = millis.round();
        (millis.is_finite() && whole >= 1.0 && (millis - whole).abs() < 1e-6)
            .then_some(whole as i64)
    }
}

/// プレイヤー設定
#[derive(Debug, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// プレイヤーが搭乗する艦の名前（AI制御の対象外）
    pub ship: Option<String>,
    /// 設定難易度（0〜2）
    #[serde(default = "default_ai_level")]
    pub ai_level: i32,
}

fn default_ai_level() -> i32 {
    1
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            ship: None,
            ai_level: default_ai_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position3D {
    pub x_m: f64,
    pub y_m: f64,
    #[serde(default)]
    pub z_m: f64,
}

/// 編隊設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ElementConfig {
    pub name: String,
    pub members: Vec<String>,
}

/// 兵装グループ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct WeaponGroupConfig {
    pub name: String,
    pub weapons: usize,
    /// 交戦可能な艦種（艦種名または艦種グループ名）
    pub targets: Vec<String>,
}

impl WeaponGroupConfig {
    /// 交戦可能艦種のビットマスク
    pub fn target_mask(&self) -> Result<u32, ScenarioError> {
        self.targets.iter().try_fold(0u32, |mask, name| {
            class_mask::parse(name).map(|m| mask | m).ok_or_else(|| {
                ScenarioError::ValidationError(format!(
                    "weapon group {}: unknown target class '{}'",
                    self.name, name
                ))
            })
        })
    }
}

/// 格納庫の飛行隊設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SquadronConfig {
    pub name: String,
    pub class: ShipClass,
    pub count: u32,
}

/// 艦設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ShipConfig {
    pub name: String,
    pub iff: i32,
    pub class: ShipClass,
    pub pos: Position3D,
    #[serde(default)]
    pub auto_roll: i32,
    #[serde(default)]
    pub command_ai_level: i32,
    #[serde(default)]
    pub sensor_range_m: f64,
    #[serde(default)]
    pub shield: bool,
    #[serde(default)]
    pub rogue: bool,
    #[serde(default)]
    pub in_transition: bool,
    #[serde(default)]
    pub systems: Vec<String>,
    #[serde(default)]
    pub hangar: Option<Vec<SquadronConfig>>,
    #[serde(default)]
    pub weapon_groups: Vec<WeaponGroupConfig>,
}

/// スクリプトイベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// 艦を撃破・除去する
    Destroy,
    /// 遷移状態に入る
    BeginTransition,
    /// 遷移状態を終える
    EndTransition,
    /// はぐれ艦に指定する
    SetRogue,
}

/// スクリプトイベント設定
#[derive(Debug, Deserialize, Serialize)]
pub struct EventConfig {
    pub time_s: f64,
    pub kind: EventKind,
    pub ship: String,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub elements: Vec<ElementConfig>,
    pub ships: Vec<ShipConfig>,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.sim.step_millis().is_none() {
            return Err(ScenarioError::ValidationError(format!(
                "dt_s {} must be a whole number of milliseconds (>= 0.001)",
                self.sim.dt_s
            )));
        }
        if self.sim.t_max_s <= 0.0 {
            return Err(ScenarioError::ValidationError("t_max_s must be positive".to_string()));
        }

        if !(0..=2).contains(&self.player.ai_level) {
            return Err(ScenarioError::ValidationError(format!(
                "player ai_level {} out of range 0..=2",
                self.player.ai_level
            )));
        }

        let mut names = HashSet::new();
        for ship in &self.ships {
            if !names.insert(ship.name.as_str()) {
                return Err(ScenarioError::ValidationError(format!(
                    "duplicate ship name: {}",
                    ship.name
                )));
            }
            if ship.iff < 0 {
                return Err(ScenarioError::ValidationError(format!(
                    "ship {}: iff must not be negative",
                    ship.name
                )));
            }
            for group in &ship.weapon_groups {
                group.target_mask()?;
            }
        }

        if let Some(player_ship) = &self.player.ship {
            if !names.contains(player_ship.as_str()) {
                return Err(ScenarioError::UnknownShip(player_ship.clone()));
            }
        }

        for element in &self.elements {
            for member in &element.members {
                if !names.contains(member.as_str()) {
                    return Err(ScenarioError::UnknownShip(member.clone()));
                }
            }
        }

        for event in &self.events {
            if !names.contains(event.ship.as_str()) {
                return Err(ScenarioError::UnknownShip(event.ship.clone()));
            }
            if event.time_s < 0.0 || event.time_s >= self.sim.t_max_s {
                return Err(ScenarioError::ValidationError(format!(
                    "event for {} at {} outside simulation time {}",
                    event.ship, event.time_s, self.sim.t_max_s
                )));
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("最大時間: {:.1}秒", self.sim.t_max_s);
        println!("シード値: {}", self.sim.seed);
        println!(
            "プレイヤー: {} (難易度 {})",
            self.player.ship.as_deref().unwrap_or("なし"),
            self.player.ai_level
        );
        println!();

        println!("=== 参加艦 ===");
        for ship in &self.ships {
            println!(
                "  {}: IFF {} {:?} (兵装 {}群, 格納庫 {})",
                ship.name,
                ship.iff,
                ship.class,
                ship.weapon_groups.len(),
                if ship.hangar.is_some() { "あり" } else { "なし" }
            );
        }
        println!("編隊数: {}", self.elements.len());
        println!("イベント数: {}", self.events.len());
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),
    #[error("未定義の艦を参照しています: {0}")]
    UnknownShip(String),
    #[error("設定検証エラー: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
meta:
  version: "1.0"
  name: test
sim:
  dt_s: 0.1
  t_max_s: 10.0
player:
  ship: Lead
  ai_level: 2
elements:
  - name: Alpha
    members: [Lead]
ships:
  - name: Lead
    iff: 1
    class: fighter
    pos: { x_m: 0.0, y_m: 0.0 }
  - name: Battery
    iff: 2
    class: sam
    pos: { x_m: 1000.0, y_m: 0.0 }
    sensor_range_m: 5000.0
    shield: true
    weapon_groups:
      - name: flak
        weapons: 4
        targets: [dropships]
events:
  - time_s: 5.0
    kind: destroy
    ship: Lead
"#;

    #[test]
    fn test_parse_scenario() {
        let config = ScenarioConfig::from_yaml(SCENARIO).unwrap();
        assert_eq!(config.ships.len(), 2);
        assert_eq!(config.ships[1].class, ShipClass::Sam);
        assert_eq!(
            config.ships[1].weapon_groups[0].target_mask().unwrap(),
            class_mask::DROPSHIPS
        );
        assert_eq!(config.events[0].kind, EventKind::Destroy);
        assert_eq!(config.player.ai_level, 2);
    }

    #[test]
    fn test_unknown_event_ship_rejected() {
        let yaml = SCENARIO.replace("    ship: Lead\n", "    ship: Ghost\n");
        assert!(matches!(
            ScenarioConfig::from_yaml(&yaml),
            Err(ScenarioError::UnknownShip(name)) if name == "Ghost"
        ));
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let yaml = SCENARIO.replace("dt_s: 0.1", "dt_s: 0.0");
        assert!(matches!(
            ScenarioConfig::from_yaml(&yaml),
            Err(ScenarioError::ValidationError(_))
        ));
    }

    #[test]
    fn test_sub_millisecond_step_rejected() {
        for dt in ["0.0004", "0.0166667", "-0.1"] {
            let yaml = SCENARIO.replace("dt_s: 0.1", &format!("dt_s: {}", dt));
            assert!(
                matches!(ScenarioConfig::from_yaml(&yaml), Err(ScenarioError::ValidationError(_))),
                "dt_s {} accepted",
                dt
            );
        }

        let config = ScenarioConfig::from_yaml(SCENARIO).unwrap();
        assert_eq!(config.sim.step_millis(), Some(100));
        let yaml = SCENARIO.replace("dt_s: 0.1", "dt_s: 0.001");
        assert_eq!(ScenarioConfig::from_yaml(&yaml).unwrap().sim.step_millis(), Some(1));
    }

    #[test]
    fn test_unknown_weapon_target_rejected() {
        let yaml = SCENARIO.replace("[dropships]", "[sea_monsters]");
        assert!(ScenarioConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ScenarioConfig::from_file("no/such/scenario.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
