use tracing::{debug, info};

use crate::ai::{skill::SkillTier, targeting};
use crate::models::{
    common::{ElementId, GameTime, ShipId},
    radio::{RadioAction, RadioMessage},
    traits::{DirectorType, IDirector},
    world::World,
};

/// 母艦（格納庫）管理AI
///
/// 親艦に敵対接触がある間は飛行隊を一隊ずつ発艦させ、
/// 敵対接触がなくなると発艦済みの全飛行隊を帰投・収容する。
#[derive(Debug)]
pub struct CarrierAi {
    ship: ShipId,
    skill: SkillTier,
    exec_time: GameTime,
    frames: u64,
}

impl CarrierAi {
    pub fn new(ship: ShipId, skill: SkillTier) -> Self {
        Self {
            ship,
            skill,
            exec_time: GameTime::default(),
            frames: 0,
        }
    }

    pub fn ship(&self) -> ShipId {
        self.ship
    }

    pub fn skill(&self) -> SkillTier {
        self.skill
    }

    /// 委譲されたフレーム数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 発艦・収容判断の周期（ミリ秒）。技量が高いほど短い。
    pub fn exec_period_ms(&self) -> i64 {
        match self.skill {
            SkillTier::Low => 6000,
            SkillTier::Medium => 4000,
            SkillTier::High => 2000,
        }
    }

    fn manage_hangar(&mut self, world: &mut World) {
        let Some(ship) = world.ship(self.ship) else {
            return;
        };

        let threats = targeting::hostile_ships(world, ship);
        if threats.is_empty() {
            self.recover_flights(world);
        } else {
            self.launch_flight(world, &threats);
        }
    }

    fn launch_flight(&mut self, world: &mut World, threats: &[ShipId]) {
        let Some(ship) = world.ship_mut(self.ship) else {
            return;
        };
        let carrier_name = ship.name().to_string();
        let Some(hangar) = ship.get_hangar_mut() else {
            return;
        };
        let Some(index) = hangar
            .squadrons
            .iter()
            .position(|s| s.ready > 0 && s.flight.is_none())
        else {
            return;
        };

        let squadron = &mut hangar.squadrons[index];
        let craft = squadron.ready;
        squadron.deployed += craft;
        squadron.ready = 0;
        let flight_name = format!("{}/{}", carrier_name, squadron.name);
        let design_class = squadron.design_class;

        let element = world.create_element(flight_name.clone(), Vec::new(), craft);
        if let Some(squadron) = world
            .ship_mut(self.ship)
            .and_then(|s| s.get_hangar_mut())
            .map(|h| &mut h.squadrons[index])
        {
            squadron.flight = Some(element);
        }

        let mut orders = RadioMessage::to_element(element, self.ship, RadioAction::Attack);
        for threat in threats {
            orders.add_target(*threat);
        }
        if let Some(lead) = threats.first().and_then(|id| world.ship(*id)) {
            orders.set_location(lead.location());
        }
        orders.set_info(format!("{} x {:?}", craft, design_class));
        world.transmit(orders);

        info!(
            carrier = %carrier_name,
            flight = %flight_name,
            craft,
            threats = threats.len(),
            "飛行隊を発艦"
        );
    }

    fn recover_flights(&mut self, world: &mut World) {
        let Some(ship) = world.ship_mut(self.ship) else {
            return;
        };
        let carrier_name = ship.name().to_string();
        let Some(hangar) = ship.get_hangar_mut() else {
            return;
        };

        let mut recovered: Vec<ElementId> = Vec::new();
        for squadron in hangar.squadrons.iter_mut() {
            if let Some(flight) = squadron.flight.take() {
                squadron.ready += squadron.deployed;
                squadron.deployed = 0;
                recovered.push(flight);
            }
        }

        for flight in recovered {
            world.transmit(RadioMessage::to_element(flight, self.ship, RadioAction::Rtb));
            if let Some(element) = world.remove_element(flight) {
                info!(carrier = %carrier_name, flight = %element.name, craft = element.craft, "飛行隊を収容");
            }
        }
    }
}

impl IDirector for CarrierAi {
    fn director_type(&self) -> DirectorType {
        DirectorType::Carrier
    }

    fn exec_frame(&mut self, world: &mut World, now: GameTime, _secs: f64) {
        self.frames += 1;

        if now.millis() - self.exec_time.millis() > self.exec_period_ms() {
            self.exec_time = now;
            debug!(ship = %self.ship, "格納庫の判断");
            self.manage_hangar(world);
        }
    }
}
