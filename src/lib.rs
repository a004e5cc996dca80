//! 地上・母艦ユニットの操縦AIシミュレーション
//!
//! 艦の接触リストから攻撃目標を選定し、兵装とシールドを管理する操縦AIと、
//! 編隊間の無線メッセージを扱います。

pub mod ai;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
