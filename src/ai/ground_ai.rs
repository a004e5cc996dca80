//! # GroundAi モジュール
//!
//! 地上・固定ユニット向けの低レベル操縦AIを提供します。
//!
//! フレーム毎の処理順序:
//!
//! 1. **目標再選定**: ゲーム時刻が前回から [`EXEC_PERIOD_MS`] を超えて進んだ場合のみ
//! 2. **シールド**: 出力配分を常に100%に再設定
//! 3. **兵装**: 各兵装グループの射撃命令と目標を再指定
//! 4. **母艦AI**: 格納庫を持つ艦では下位の [`CarrierAi`] にフレームを委譲
//!
//! 目標は所有せず、[`Observation`] を通じて観測者として登録します。
//! 目標が世界から除去される際は通知を受け、目標とサブ目標を同時に解除します。

use tracing::{debug, info};

use crate::ai::{
    carrier_ai::CarrierAi,
    skill::{DifficultyContext, SkillTier, derive_skill_tier},
    targeting,
};
use crate::models::{
    common::{GameTime, ShipId, SimObjectId},
    ship::class_mask,
    traits::{DirectorType, IDirector, ISimObserver, ObserverId},
    weapon::FiringOrders,
    world::World,
};

/// 目標再選定の周期（ゲーム時刻ミリ秒）
pub const EXEC_PERIOD_MS: i64 = 1000;

/// シールド出力の既定値（%）
pub const SHIELD_POWER_LEVEL: f64 = 100.0;

/// 観測関係
///
/// 一度に観測するのは高々一つのオブジェクト。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    observed: Option<SimObjectId>,
}

impl Observation {
    pub fn observed(&self) -> Option<SimObjectId> {
        self.observed
    }

    /// 観測対象の登録（以前の対象は登録解除される）
    ///
    /// 対象が世界に存在しなければ何も観測せずに `false` を返す。
    pub fn observe(&mut self, world: &mut World, observer: ObserverId, obj: SimObjectId) -> bool {
        if self.observed == Some(obj) {
            return true;
        }

        self.release(world, observer);

        match world.observable_mut(obj) {
            Some(target) => {
                target.register_observer(observer);
                self.observed = Some(obj);
                true
            }
            None => false,
        }
    }

    /// 現在の観測を解除
    pub fn release(&mut self, world: &mut World, observer: ObserverId) {
        if let Some(prev) = self.observed.take() {
            if let Some(target) = world.observable_mut(prev) {
                target.unregister_observer(observer);
            }
        }
    }

    /// 除去通知の既定処理。観測中の対象であれば観測を終える。
    pub fn update(&mut self, obj: SimObjectId) -> bool {
        if self.observed == Some(obj) {
            self.observed = None;
        }
        true
    }
}

/// 地上ユニット用操縦AI
#[derive(Debug)]
pub struct GroundAi {
    ship: ShipId,
    ship_name: String,
    skill: SkillTier,
    target: Option<ShipId>,
    subtarget: Option<String>,
    exec_time: GameTime,
    observation: Observation,
    carrier_ai: Option<CarrierAi>,
    selections: u64,
}

impl GroundAi {
    /// 艦に結び付いた操縦AIを作成
    ///
    /// 格納庫を持ち、指揮AIレベルが正の艦には母艦AIを併せて構築する。
    pub fn new(world: &World, ship: ShipId, ctx: &DifficultyContext) -> Self {
        let unit = world.ship(ship);
        let skill = derive_skill_tier(unit, ctx);

        let carrier_ai = unit
            .filter(|s| s.get_hangar().is_some() && s.get_command_ai_level() > 0)
            .map(|_| CarrierAi::new(ship, skill));

        let ship_name = unit
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| ship.to_string());

        info!(
            ship = %ship_name,
            skill = ?skill,
            carrier = carrier_ai.is_some(),
            "GroundAI を作成"
        );

        Self {
            ship,
            ship_name,
            skill,
            target: None,
            subtarget: None,
            exec_time: GameTime::default(),
            observation: Observation::default(),
            carrier_ai,
            selections: 0,
        }
    }

    pub fn ship(&self) -> ShipId {
        self.ship
    }

    pub fn skill(&self) -> SkillTier {
        self.skill
    }

    pub fn target(&self) -> Option<ShipId> {
        self.target
    }

    pub fn subtarget(&self) -> Option<&str> {
        self.subtarget.as_deref()
    }

    pub fn last_exec_time(&self) -> GameTime {
        self.exec_time
    }

    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    pub fn carrier_ai(&self) -> Option<&CarrierAi> {
        self.carrier_ai.as_ref()
    }

    /// フレーム処理で目標再選定を行った回数
    pub fn selection_count(&self) -> u64 {
        self.selections
    }

    /// 目標とサブ目標の明示的な指定
    ///
    /// 目標が変わった場合のみ観測を切り替える。存在しない艦は目標なしとして扱う。
    /// サブ目標は目標艦が持つシステム名の場合のみ保持する。
    pub fn set_target(&mut self, world: &mut World, target: Option<ShipId>, subtarget: Option<String>) {
        if self.target != target {
            self.change_target(world, target);
        }

        self.subtarget = match (self.target.and_then(|id| world.ship(id)), subtarget) {
            (Some(ship), Some(name)) if ship.has_system(&name) => Some(name),
            _ => None,
        };
    }

    /// 接触リストから目標を選び直す
    ///
    /// 候補がない場合は現在の目標を維持する。同じ目標を再選定してもサブ目標は保持される。
    pub fn select_target(&mut self, world: &mut World) {
        let Some(candidate) = targeting::select_target(world, self.ship) else {
            return;
        };

        if self.target != Some(candidate) {
            self.change_target(world, Some(candidate));
            self.subtarget = None;
        }
    }

    /// 目標は観測が成立した場合のみ保持する
    fn change_target(&mut self, world: &mut World, target: Option<ShipId>) {
        let observer = self.observer_id();

        match target {
            Some(id) if self.observation.observe(world, observer, SimObjectId::Ship(id)) => {
                self.target = Some(id);
                let name = world.ship(id).map(|s| s.name().to_string()).unwrap_or_default();
                debug!(ship = %self.ship_name, target = %name, "目標を捕捉");
            }
            Some(id) => {
                self.target = None;
                self.observation.release(world, observer);
                debug!(ship = %self.ship_name, target = %id, "存在しない目標は指定できない");
            }
            None => {
                self.target = None;
                self.observation.release(world, observer);
                debug!(ship = %self.ship_name, "目標を解除");
            }
        }
    }

    /// 観測の解除（艦の除去時にエンジンから呼ばれる）
    pub fn detach(mut self, world: &mut World) {
        let observer = self.observer_id();
        self.observation.release(world, observer);
    }
}

impl ISimObserver for GroundAi {
    fn observer_id(&self) -> ObserverId {
        ObserverId(self.ship.0)
    }

    fn update(&mut self, obj: SimObjectId) -> bool {
        if self.target.map(SimObjectId::Ship) == Some(obj) {
            self.target = None;
            self.subtarget = None;
            debug!(ship = %self.ship_name, object = %obj, "目標が除去された");
        }

        self.observation.update(obj)
    }

    fn observer_name(&self) -> String {
        format!("GroundAI({})", self.ship_name)
    }
}

impl IDirector for GroundAi {
    fn director_type(&self) -> DirectorType {
        DirectorType::Ground
    }

    fn exec_frame(&mut self, world: &mut World, now: GameTime, secs: f64) {
        if now.millis() - self.exec_time.millis() > EXEC_PERIOD_MS {
            self.exec_time = now;
            self.selections += 1;
            self.select_target(world);
        }

        let target = self.target;
        let Some(ship) = world.ship_mut(self.ship) else {
            return;
        };

        if let Some(shield) = ship.get_shield_mut() {
            shield.set_power_level(SHIELD_POWER_LEVEL);
        }

        for group in ship.weapons_mut() {
            if group.num_weapons() > 1 && group.can_target(class_mask::DROPSHIPS) {
                group.set_firing_orders(FiringOrders::PointDefense);
            } else {
                group.set_firing_orders(FiringOrders::Auto);
            }

            group.set_target(target, None);
        }

        if let Some(carrier_ai) = self.carrier_ai.as_mut() {
            carrier_ai.exec_frame(world, now, secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        common::{Iff, Point, ShotId},
        contact::Contact,
        ship::{Hangar, HangarSquadron, Ship, ShipClass, Shot},
        traits::ISimObservable,
        weapon::{Shield, WeaponGroup},
    };

    fn add(world: &mut World, iff: Iff, class: ShipClass, x: f64) -> ShipId {
        let mut ship = Ship::new(ShipId(0), format!("S{}", world.num_ships()), iff, class);
        ship.location = Point::new(x, 0.0, 0.0);
        ship.systems = vec!["bridge".to_string(), "engine".to_string()];
        world.add_ship(ship)
    }

    fn battery(world: &mut World) -> ShipId {
        let mut ship = Ship::new(ShipId(0), "Battery", 2, ShipClass::Sam);
        ship.shield = Some(Shield::new(20.0));
        ship.weapons.push(WeaponGroup::new("flak", 4, class_mask::DROPSHIPS));
        ship.weapons.push(WeaponGroup::new("missile", 1, class_mask::DROPSHIPS));
        ship.weapons.push(WeaponGroup::new("cannon", 2, class_mask::STARSHIPS));
        world.add_ship(ship)
    }

    fn show(world: &mut World, own: ShipId, others: &[ShipId]) {
        let contacts = others
            .iter()
            .filter_map(|id| world.ship(*id))
            .map(|s| Contact::for_ship(s.id(), s.get_iff(), s.location(), true))
            .collect();
        world.ship_mut(own).unwrap().set_contacts(contacts);
    }

    #[test]
    fn test_display_name() {
        let mut world = World::new();
        let own = battery(&mut world);
        let ai = GroundAi::new(&world, own, &DifficultyContext::default());
        assert_eq!(ai.observer_name(), "GroundAI(Battery)");
        assert_eq!(ai.director_type(), DirectorType::Ground);
    }

    #[test]
    fn test_exec_frame_issues_standing_orders() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Fighter, 500.0);
        show(&mut world, own, &[enemy]);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.exec_frame(&mut world, GameTime(1001), 0.033);

        let ship = world.ship(own).unwrap();
        assert_eq!(ship.get_shield().unwrap().power_level(), 100.0);
        let orders: Vec<FiringOrders> = ship.weapons().iter().map(|g| g.firing_orders()).collect();
        assert_eq!(
            orders,
            vec![FiringOrders::PointDefense, FiringOrders::Auto, FiringOrders::Auto]
        );
        for group in ship.weapons() {
            assert_eq!(group.target(), Some(enemy));
            assert_eq!(group.subtarget(), None);
        }
        assert_eq!(ai.target(), Some(enemy));
    }

    #[test]
    fn test_rate_limit() {
        let mut world = World::new();
        let own = battery(&mut world);
        let first = add(&mut world, 3, ShipClass::Fighter, 800.0);
        show(&mut world, own, &[first]);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());

        // 周期未満では選定しない
        ai.exec_frame(&mut world, GameTime(1000), 0.1);
        assert_eq!(ai.target(), None);

        ai.exec_frame(&mut world, GameTime(1001), 0.1);
        assert_eq!(ai.target(), Some(first));
        assert_eq!(ai.last_exec_time(), GameTime(1001));

        // より近い敵が現れても周期内では切り替えない
        let closer = add(&mut world, 3, ShipClass::Fighter, 100.0);
        show(&mut world, own, &[first, closer]);
        for t in [1200, 1500, 2001] {
            ai.exec_frame(&mut world, GameTime(t), 0.1);
            assert_eq!(ai.target(), Some(first));
            assert_eq!(ai.last_exec_time(), GameTime(1001));
        }

        ai.exec_frame(&mut world, GameTime(2002), 0.1);
        assert_eq!(ai.target(), Some(closer));
        assert_eq!(ai.last_exec_time(), GameTime(2002));
    }

    #[test]
    fn test_reselect_same_target_keeps_subtarget() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);
        show(&mut world, own, &[enemy]);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.select_target(&mut world);
        ai.set_target(&mut world, Some(enemy), Some("bridge".to_string()));
        ai.select_target(&mut world);

        assert_eq!(ai.target(), Some(enemy));
        assert_eq!(ai.subtarget(), Some("bridge"));
    }

    #[test]
    fn test_new_target_clears_subtarget() {
        let mut world = World::new();
        let own = battery(&mut world);
        let far = add(&mut world, 3, ShipClass::Frigate, 900.0);
        show(&mut world, own, &[far]);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.select_target(&mut world);
        ai.set_target(&mut world, Some(far), Some("engine".to_string()));

        let near = add(&mut world, 3, ShipClass::Frigate, 100.0);
        show(&mut world, own, &[far, near]);
        ai.select_target(&mut world);

        assert_eq!(ai.target(), Some(near));
        assert_eq!(ai.subtarget(), None);
        // 観測は新しい目標に移る
        assert!(world.ship(far).unwrap().observers().is_empty());
        assert_eq!(world.ship(near).unwrap().observers(), &[ai.observer_id()]);
    }

    #[test]
    fn test_no_candidate_keeps_existing_target() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);
        show(&mut world, own, &[enemy]);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.select_target(&mut world);
        show(&mut world, own, &[]);
        ai.select_target(&mut world);

        assert_eq!(ai.target(), Some(enemy));
    }

    #[test]
    fn test_explicit_clear() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.set_target(&mut world, Some(enemy), Some("bridge".to_string()));
        assert_eq!(world.ship(enemy).unwrap().observers(), &[ai.observer_id()]);

        ai.set_target(&mut world, None, Some("bridge".to_string()));
        assert_eq!(ai.target(), None);
        assert_eq!(ai.subtarget(), None);
        assert_eq!(ai.observation().observed(), None);
        assert!(world.ship(enemy).unwrap().observers().is_empty());
    }

    #[test]
    fn test_removal_notification_clears_target() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);
        show(&mut world, own, &[enemy]);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.exec_frame(&mut world, GameTime(1001), 0.1);
        ai.set_target(&mut world, Some(enemy), Some("bridge".to_string()));

        let removed = world.remove_ship(enemy).unwrap();
        for observer in removed.observers() {
            assert_eq!(*observer, ai.observer_id());
            assert!(ai.update(SimObjectId::Ship(enemy)));
        }
        drop(removed);

        assert_eq!(ai.target(), None);
        assert_eq!(ai.subtarget(), None);
        assert_eq!(ai.observation().observed(), None);

        ai.exec_frame(&mut world, GameTime(1100), 0.1);
        for group in world.ship(own).unwrap().weapons() {
            assert_eq!(group.target(), None);
        }
    }

    #[test]
    fn test_unrelated_removal_is_ignored() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);
        let other = add(&mut world, 3, ShipClass::Frigate, 700.0);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.set_target(&mut world, Some(enemy), Some("bridge".to_string()));
        assert!(ai.update(SimObjectId::Ship(other)));

        assert_eq!(ai.target(), Some(enemy));
        assert_eq!(ai.subtarget(), Some("bridge"));
    }

    #[test]
    fn test_missing_owner_is_a_no_op() {
        let mut world = World::new();
        let own = battery(&mut world);
        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        world.remove_ship(own);

        ai.exec_frame(&mut world, GameTime(5000), 0.1);
        assert_eq!(ai.target(), None);
        assert_eq!(ai.last_exec_time(), GameTime(5000));
    }

    #[test]
    fn test_no_hangar_means_no_carrier_ai() {
        let mut world = World::new();
        let own = battery(&mut world);
        let ai = GroundAi::new(&world, own, &DifficultyContext::default());
        assert!(ai.carrier_ai().is_none());
    }

    #[test]
    fn test_hangar_requires_command_level() {
        let mut world = World::new();
        let mut base = Ship::new(ShipId(0), "Base", 1, ShipClass::Starbase);
        base.hangar = Some(Hangar::new(vec![HangarSquadron::new("Viper", ShipClass::Fighter, 4)]));
        let idle = world.add_ship(base.clone());
        base.command_ai_level = 1;
        let active = world.add_ship(base);

        let ctx = DifficultyContext::default();
        assert!(GroundAi::new(&world, idle, &ctx).carrier_ai().is_none());
        let ai = GroundAi::new(&world, active, &ctx);
        assert_eq!(ai.carrier_ai().map(|c| c.ship()), Some(active));
    }

    #[test]
    fn test_exec_frame_forwards_to_carrier() {
        let mut world = World::new();
        let mut base = Ship::new(ShipId(0), "Base", 1, ShipClass::Starbase);
        base.command_ai_level = 2;
        base.hangar = Some(Hangar::new(vec![HangarSquadron::new("Viper", ShipClass::Fighter, 4)]));
        let own = world.add_ship(base);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        for t in 1..=3 {
            ai.exec_frame(&mut world, GameTime(t * 100), 0.1);
        }
        assert_eq!(ai.carrier_ai().unwrap().frames(), 3);

        // 所有艦がなければ委譲もしない
        world.remove_ship(own);
        ai.exec_frame(&mut world, GameTime(400), 0.1);
        assert_eq!(ai.carrier_ai().unwrap().frames(), 3);
    }

    #[test]
    fn test_scenario_transitional_contact() {
        let mut world = World::new();
        let own = battery(&mut world);
        let far = add(&mut world, 3, ShipClass::Frigate, 500.0);
        let near = add(&mut world, 3, ShipClass::Frigate, 10.0);
        world.ship_mut(near).unwrap().set_in_transition(true);
        show(&mut world, own, &[far, near]);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.select_target(&mut world);
        assert_eq!(ai.target(), Some(far));
    }

    #[test]
    fn test_detach_releases_observation() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.set_target(&mut world, Some(enemy), None);
        ai.detach(&mut world);

        assert!(world.ship(enemy).unwrap().observers().is_empty());
    }

    #[test]
    fn test_unknown_target_is_not_held() {
        let mut world = World::new();
        let own = battery(&mut world);
        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());

        ai.set_target(&mut world, Some(ShipId(99)), Some("bridge".to_string()));
        assert_eq!(ai.target(), None);
        assert_eq!(ai.subtarget(), None);
        assert_eq!(ai.observation().observed(), None);
    }

    #[test]
    fn test_unknown_target_releases_previous() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);
        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());

        ai.set_target(&mut world, Some(enemy), Some("bridge".to_string()));
        ai.set_target(&mut world, Some(ShipId(99)), None);

        assert_eq!(ai.target(), None);
        assert!(world.ship(enemy).unwrap().observers().is_empty());
    }

    #[test]
    fn test_subtarget_must_name_target_system() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);
        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());

        ai.set_target(&mut world, Some(enemy), Some("hangar".to_string()));
        assert_eq!(ai.target(), Some(enemy));
        assert_eq!(ai.subtarget(), None);

        ai.set_target(&mut world, Some(enemy), Some("engine".to_string()));
        assert_eq!(ai.subtarget(), Some("engine"));
    }

    #[test]
    fn test_shot_removal_leaves_ship_target() {
        let mut world = World::new();
        let own = battery(&mut world);
        let enemy = add(&mut world, 3, ShipClass::Frigate, 500.0);
        let shot = world.add_shot(Shot::new(ShotId(0), 3, Point::new(200.0, 0.0, 0.0)));

        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());
        ai.set_target(&mut world, Some(enemy), Some("bridge".to_string()));

        assert!(ai.update(SimObjectId::Shot(shot)));
        assert_eq!(ai.target(), Some(enemy));
        assert_eq!(ai.subtarget(), Some("bridge"));
        assert_eq!(ai.observation().observed(), Some(SimObjectId::Ship(enemy)));
    }

    #[test]
    fn test_observation_of_shot() {
        let mut world = World::new();
        let own = battery(&mut world);
        let shot = world.add_shot(Shot::new(ShotId(0), 3, Point::new(200.0, 0.0, 0.0)));
        let observer = ObserverId(own.0);

        let mut observation = Observation::default();
        assert!(observation.observe(&mut world, observer, SimObjectId::Shot(shot)));
        assert_eq!(world.shot(shot).unwrap().observers(), &[observer]);

        // 同じ対象の再観測は重複登録しない
        assert!(observation.observe(&mut world, observer, SimObjectId::Shot(shot)));
        assert_eq!(world.shot(shot).unwrap().observers().len(), 1);

        assert!(observation.update(SimObjectId::Shot(shot)));
        assert_eq!(observation.observed(), None);

        assert!(!observation.observe(&mut world, observer, SimObjectId::Shot(ShotId(77))));
        assert_eq!(observation.observed(), None);
    }

    #[test]
    fn test_one_selection_per_crossed_period() {
        let mut world = World::new();
        let own = battery(&mut world);
        let mut ai = GroundAi::new(&world, own, &DifficultyContext::default());

        for t in (0..=1000).step_by(50) {
            ai.exec_frame(&mut world, GameTime(t), 0.05);
        }
        assert_eq!(ai.selection_count(), 0);

        ai.exec_frame(&mut world, GameTime(1001), 0.05);
        assert_eq!(ai.selection_count(), 1);

        // 次の周期をまたぐまでは何フレーム進めても増えない
        for t in (1050..=2001).step_by(50) {
            ai.exec_frame(&mut world, GameTime(t), 0.05);
        }
        assert_eq!(ai.selection_count(), 1);

        ai.exec_frame(&mut world, GameTime(2002), 0.05);
        ai.exec_frame(&mut world, GameTime(2003), 0.05);
        assert_eq!(ai.selection_count(), 2);

        // 大きく飛んでも一回だけ
        ai.exec_frame(&mut world, GameTime(9000), 0.05);
        assert_eq!(ai.selection_count(), 3);
    }
}
