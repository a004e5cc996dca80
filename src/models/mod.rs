// 基本的なデータ型（位置・識別子・ゲーム時刻）
pub mod common;

// 観測者・操縦AIのインターフェース（trait）定義
pub mod traits;

// 各モデルの実装
pub mod contact;
pub mod radio;
pub mod ship;
pub mod weapon;
pub mod world;

// 便利な re-export
pub use common::*;
pub use contact::Contact;
pub use radio::{ActionAlias, Destination, InstructionAction, RadioAction, RadioCategory, RadioMessage};
pub use ship::{class_mask, Hangar, HangarSquadron, Ship, ShipClass, ShipDesign, Shot};
pub use traits::*;
pub use weapon::{FiringOrders, Shield, WeaponGroup};
pub use world::{Element, World};
