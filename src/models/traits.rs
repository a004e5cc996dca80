use crate::models::common::{GameTime, SimObjectId};
use crate::models::world::World;

/// 観測者（オブザーバ）の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u32);

/// 観測可能なシミュレーションオブジェクトのインターフェース
///
/// 除去される前に、登録済みの全観測者へ通知されなければならない。
pub trait ISimObservable {
    /// オブジェクトの識別子
    fn object_id(&self) -> SimObjectId;

    /// 観測者の登録（登録済みなら何もしない）
    fn register_observer(&mut self, observer: ObserverId);

    /// 観測者の登録解除
    fn unregister_observer(&mut self, observer: ObserverId);

    /// 登録済み観測者の一覧
    fn observers(&self) -> &[ObserverId];
}

/// 観測者のインターフェース
pub trait ISimObserver {
    fn observer_id(&self) -> ObserverId;

    /// 観測対象が除去される直前に呼ばれる。通知を処理した場合は true。
    fn update(&mut self, obj: SimObjectId) -> bool;

    /// ログ・デバッグ用の名前
    fn observer_name(&self) -> String;
}

/// 操縦AIの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorType {
    Ground,
    Carrier,
}

/// フレーム毎に実行される操縦AIのインターフェース
pub trait IDirector {
    fn director_type(&self) -> DirectorType;

    /// 1フレームの処理実行
    ///
    /// `now` はゲーム時刻、`secs` は前フレームからの経過秒数。
    fn exec_frame(&mut self, world: &mut World, now: GameTime, secs: f64);
}
