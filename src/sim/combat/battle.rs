//! A siege of one city as a resumable state machine.
//!
//! Generals are paired off one at a time until one side's pool is empty.
//! Whoever strikes first in a pairing picks both generals; each side picks
//! its own formation. Choices that belong to a human are returned as a
//! [`DecisionRequest`] and fed back through [`Battle::resume`]; AI choices
//! are made inline.

use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use super::{Army, duel, resolve_attack};
use crate::error::ActionError;
use crate::id::{CityId, FactionId, GeneralId};
use crate::model::{Formation, World};
use crate::sim::{conquest, helpers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }
}

/// Who makes a side's choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Human,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecisionRequest {
    /// `side` strikes first and picks one of its own generals.
    ChooseStriker {
        side: Side,
        candidates: Vec<GeneralId>,
    },
    /// `side` picks which enemy general must answer the challenge.
    ChooseOpponent {
        side: Side,
        candidates: Vec<GeneralId>,
    },
    ChooseFormation { side: Side, general: GeneralId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    General(GeneralId),
    Formation(Formation),
    /// Call the attack off. Only a human attacker choosing a striker may.
    Withdraw,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BattleReport {
    /// Everything in order, one line per event.
    pub log: Vec<String>,
    pub exchanges: Vec<String>,
    pub duels: Vec<String>,
    /// Capture, rout and settlement announcements.
    pub announcements: Vec<String>,
    pub captured: Vec<GeneralId>,
    pub routed: Vec<GeneralId>,
    pub city_taken: bool,
    pub defender_eliminated: bool,
}

impl BattleReport {
    fn announce(&mut self, line: String) {
        self.log.push(line.clone());
        self.announcements.push(line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleStep {
    Decision(DecisionRequest),
    Concluded(BattleReport),
    /// The attacker pulled out. `engaged` is true once any pairing was fought.
    Withdrawn { engaged: bool },
}

/// Choices gathered for the next pairing.
#[derive(Debug, Clone, Default)]
struct Pairing {
    striker: Option<GeneralId>,
    striker_formation: Option<Formation>,
    opponent: Option<GeneralId>,
    opponent_formation: Option<Formation>,
}

#[derive(Debug, Clone)]
pub struct Battle {
    pub origin: CityId,
    pub target: CityId,
    pub attacker: FactionId,
    pub defender: FactionId,
    attacker_control: Control,
    defender_control: Control,
    attackers: Vec<GeneralId>,
    defenders: Vec<GeneralId>,
    attacker_strikes_first: bool,
    engaged: bool,
    pairing: Pairing,
    awaiting: Option<DecisionRequest>,
    report: BattleReport,
}

impl Battle {
    /// Validate an attack from `origin` on `target` and form both pools.
    ///
    /// Garrison generals without soldiers rout before the fighting starts.
    pub fn begin(
        world: &mut World,
        rng: &mut dyn RngCore,
        origin: CityId,
        target: CityId,
        generals: &[GeneralId],
        attacker_control: Control,
        defender_control: Control,
    ) -> Result<Battle, ActionError> {
        if !world.hostile_neighbors(origin).contains(&target) {
            return Err(ActionError::InvalidTarget { origin, target });
        }
        if generals.is_empty() {
            return Err(ActionError::EmptySelection);
        }
        for &g in generals {
            if !world.city(origin).is_resident(g) {
                return Err(ActionError::NotResident {
                    general: g,
                    city: origin,
                });
            }
            if world.general(g).army == 0 {
                return Err(ActionError::NoEligibleGeneral { city: origin });
            }
        }

        let attacker = world.city(origin).owner;
        let defender = world.city(target).owner;
        let mut report = BattleReport::default();
        report.log.push(format!(
            "{} marches from {} on {}.",
            world.faction_name(attacker),
            world.city_name(origin),
            world.city_name(target)
        ));

        let mut defenders = Vec::new();
        for g in world.city(target).generals.clone() {
            if world.general(g).army == 0 {
                let line = conquest::rout(world, rng, g, target);
                report.routed.push(g);
                report.announce(line);
            } else {
                defenders.push(g);
            }
        }

        let mut attackers = Vec::new();
        for &g in generals {
            if !attackers.contains(&g) {
                attackers.push(g);
            }
        }

        Ok(Battle {
            origin,
            target,
            attacker,
            defender,
            attacker_control,
            defender_control,
            attackers,
            defenders,
            attacker_strikes_first: true,
            engaged: false,
            pairing: Pairing::default(),
            awaiting: None,
            report,
        })
    }

    pub fn pending(&self) -> Option<&DecisionRequest> {
        self.awaiting.as_ref()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn pool(&self, side: Side) -> &[GeneralId] {
        match side {
            Side::Attacker => &self.attackers,
            Side::Defender => &self.defenders,
        }
    }

    fn pool_mut(&mut self, side: Side) -> &mut Vec<GeneralId> {
        match side {
            Side::Attacker => &mut self.attackers,
            Side::Defender => &mut self.defenders,
        }
    }

    fn control(&self, side: Side) -> Control {
        match side {
            Side::Attacker => self.attacker_control,
            Side::Defender => self.defender_control,
        }
    }

    fn striking_side(&self) -> Side {
        if self.attacker_strikes_first {
            Side::Attacker
        } else {
            Side::Defender
        }
    }

    /// The city whose roster a side's generals belong to.
    fn home(&self, side: Side) -> CityId {
        match side {
            Side::Attacker => self.origin,
            Side::Defender => self.target,
        }
    }

    /// Run pairings until a human choice is needed or the battle ends.
    ///
    /// # Panics
    /// Panics if a decision is still pending; answer it with [`Battle::resume`].
    pub fn advance(&mut self, world: &mut World, rng: &mut dyn RngCore) -> BattleStep {
        assert!(
            self.awaiting.is_none(),
            "advance called with a pending decision"
        );
        loop {
            if self.attackers.is_empty() || self.defenders.is_empty() {
                return BattleStep::Concluded(self.conclude(world));
            }

            let striking = self.striking_side();
            let answering = striking.opponent();

            if self.pairing.striker.is_none() {
                match self.control(striking) {
                    Control::Human => {
                        return self.ask(DecisionRequest::ChooseStriker {
                            side: striking,
                            candidates: self.pool(striking).to_vec(),
                        });
                    }
                    Control::Ai => {
                        self.pairing.striker =
                            helpers::first_max_by_key(self.pool(striking), |g| {
                                world.general(g).leadership
                            });
                    }
                }
            }
            let Some(striker) = self.pairing.striker else {
                unreachable!("striker chosen above");
            };

            if self.pairing.striker_formation.is_none() {
                match self.control(striking) {
                    Control::Human => {
                        return self.ask(DecisionRequest::ChooseFormation {
                            side: striking,
                            general: striker,
                        });
                    }
                    Control::Ai => self.pairing.striker_formation = random_formation(rng),
                }
            }

            if self.pairing.opponent.is_none() {
                match self.control(striking) {
                    Control::Human => {
                        return self.ask(DecisionRequest::ChooseOpponent {
                            side: striking,
                            candidates: self.pool(answering).to_vec(),
                        });
                    }
                    Control::Ai => {
                        self.pairing.opponent =
                            helpers::first_min_by_key(self.pool(answering), |g| {
                                world.general(g).leadership
                            });
                    }
                }
            }
            let Some(opponent) = self.pairing.opponent else {
                unreachable!("opponent chosen above");
            };

            if self.pairing.opponent_formation.is_none() {
                match self.control(answering) {
                    Control::Human => {
                        return self.ask(DecisionRequest::ChooseFormation {
                            side: answering,
                            general: opponent,
                        });
                    }
                    Control::Ai => self.pairing.opponent_formation = random_formation(rng),
                }
            }

            self.fight_pairing(world, rng);
        }
    }

    /// Answer the pending request and keep going.
    ///
    /// An answer that does not fit the request is rejected and the request
    /// stays pending.
    pub fn resume(
        &mut self,
        world: &mut World,
        rng: &mut dyn RngCore,
        decision: Decision,
    ) -> Result<BattleStep, ActionError> {
        let Some(request) = self.awaiting.as_ref() else {
            return Err(ActionError::NoPendingDecision);
        };
        let striking = self.striking_side();
        match (request, decision) {
            (DecisionRequest::ChooseStriker { side, .. }, Decision::Withdraw)
                if *side == Side::Attacker =>
            {
                self.awaiting = None;
                self.report.log.push(format!(
                    "{} calls off the attack on {}.",
                    world.faction_name(self.attacker),
                    world.city_name(self.target)
                ));
                debug!(engaged = self.engaged, "attack withdrawn");
                return Ok(BattleStep::Withdrawn {
                    engaged: self.engaged,
                });
            }
            (DecisionRequest::ChooseStriker { candidates, .. }, Decision::General(g))
                if candidates.contains(&g) =>
            {
                self.pairing.striker = Some(g);
            }
            (DecisionRequest::ChooseOpponent { candidates, .. }, Decision::General(g))
                if candidates.contains(&g) =>
            {
                self.pairing.opponent = Some(g);
            }
            (DecisionRequest::ChooseFormation { side, .. }, Decision::Formation(f)) => {
                if *side == striking {
                    self.pairing.striker_formation = Some(f);
                } else {
                    self.pairing.opponent_formation = Some(f);
                }
            }
            _ => return Err(ActionError::InvalidDecision),
        }
        self.awaiting = None;
        Ok(self.advance(world, rng))
    }

    fn ask(&mut self, request: DecisionRequest) -> BattleStep {
        self.awaiting = Some(request.clone());
        BattleStep::Decision(request)
    }

    /// Fight the chosen pairing to the end and apply its aftermath.
    fn fight_pairing(&mut self, world: &mut World, rng: &mut dyn RngCore) {
        let pairing = std::mem::take(&mut self.pairing);
        let (
            Some(striker),
            Some(striker_formation),
            Some(opponent),
            Some(opponent_formation),
        ) = (
            pairing.striker,
            pairing.striker_formation,
            pairing.opponent,
            pairing.opponent_formation,
        )
        else {
            unreachable!("pairing fought before every choice was made");
        };
        let striking = self.striking_side();
        self.engaged = true;

        let mut first = Army::muster(world, striker, striker_formation);
        let mut second = Army::muster(world, opponent, opponent_formation);
        self.report.log.push(format!(
            "{} ({}) engages {} ({}).",
            first.commander.name, first.formation, second.commander.name, second.formation
        ));

        let duel_report = if helpers::roll(rng, 0.5) {
            duel(rng, &mut first, &mut second)
        } else {
            duel(rng, &mut second, &mut first)
        };
        self.report.log.push(duel_report.log.clone());
        self.report.duels.push(duel_report.log);

        // Alternate strikes; `first` always leads.
        let (loser_side, captured) = loop {
            let hit = resolve_attack(rng, &first, &mut second);
            self.record_exchange(&hit.battle_log, &hit.capture_log);
            if hit.win {
                break (striking.opponent(), hit.capture);
            }
            let hit = resolve_attack(rng, &second, &mut first);
            self.record_exchange(&hit.battle_log, &hit.capture_log);
            if hit.win {
                break (striking, hit.capture);
            }
        };

        world.general_mut(striker).army = first.soldiers;
        world.general_mut(opponent).army = second.soldiers;

        let loser = if loser_side == striking { striker } else { opponent };
        let winner_side = loser_side.opponent();
        if captured {
            world.city_mut(self.home(loser_side)).remove_resident(loser);
            world.city_mut(self.home(winner_side)).take_prisoner(loser);
            self.report.captured.push(loser);
        } else if loser_side == Side::Defender {
            let line = conquest::rout(world, rng, loser, self.target);
            self.report.routed.push(loser);
            self.report.announce(line);
        } else {
            self.report.routed.push(loser);
        }
        self.pool_mut(loser_side).retain(|&g| g != loser);
        debug!(
            loser = %world.general_name(loser),
            side = ?loser_side,
            captured,
            "pairing decided"
        );

        self.attacker_strikes_first = !self.attacker_strikes_first;
    }

    fn record_exchange(&mut self, battle_log: &str, capture_log: &str) {
        self.report.log.push(battle_log.to_string());
        self.report.exchanges.push(battle_log.to_string());
        if !capture_log.is_empty() {
            self.report.announce(capture_log.to_string());
        }
    }

    /// # Panics
    /// Panics if both pools are empty, which no pairing can produce.
    fn conclude(&mut self, world: &mut World) -> BattleReport {
        assert!(
            !(self.attackers.is_empty() && self.defenders.is_empty()),
            "battle for {} ended with both sides exhausted",
            self.target
        );
        let settlement = conquest::settle(world, self.origin, self.target, &self.attackers);
        for line in settlement.log {
            self.report.announce(line);
        }
        self.report.city_taken = settlement.city_taken;
        self.report.defender_eliminated = settlement.defender_eliminated;
        std::mem::take(&mut self.report)
    }
}

fn random_formation(rng: &mut dyn RngCore) -> Option<Formation> {
    helpers::pick(rng, &Formation::ALL)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::scenario::Scenario;

    struct Siege {
        world: World,
        origin: CityId,
        target: CityId,
        strong: GeneralId,
        weak: GeneralId,
    }

    fn siege() -> Siege {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        let origin = s.city("Hanzhong", shu.faction).id();
        let target = s.city("Shangyong", wei.faction).id();
        s.city("Xuchang", wei.faction);
        s.link(origin, target);
        let strong = s
            .general("Guan Yu")
            .serve(shu.faction)
            .stats(95, 97, 75, 62)
            .army(1000)
            .station(origin)
            .id();
        let weak = s
            .general("Meng Da")
            .serve(wei.faction)
            .stats(40, 50, 40, 40)
            .army(100)
            .station(target)
            .id();
        Siege {
            world: s.build(),
            origin,
            target,
            strong,
            weak,
        }
    }

    #[test]
    fn begin_rejects_non_adjacent_target() {
        let mut sg = siege();
        let mut rng = SmallRng::seed_from_u64(1);
        let err = Battle::begin(
            &mut sg.world,
            &mut rng,
            sg.origin,
            sg.origin,
            &[sg.strong],
            Control::Ai,
            Control::Ai,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ActionError::InvalidTarget {
                origin: sg.origin,
                target: sg.origin
            }
        );
    }

    #[test]
    fn begin_rejects_generals_without_soldiers() {
        let mut sg = siege();
        sg.world.general_mut(sg.strong).army = 0;
        let mut rng = SmallRng::seed_from_u64(1);
        let err = Battle::begin(
            &mut sg.world,
            &mut rng,
            sg.origin,
            sg.target,
            &[sg.strong],
            Control::Ai,
            Control::Ai,
        )
        .unwrap_err();
        assert_eq!(err, ActionError::NoEligibleGeneral { city: sg.origin });
    }

    #[test]
    fn ai_battle_runs_to_conclusion() {
        let mut sg = siege();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut battle = Battle::begin(
            &mut sg.world,
            &mut rng,
            sg.origin,
            sg.target,
            &[sg.strong],
            Control::Ai,
            Control::Ai,
        )
        .unwrap();

        let BattleStep::Concluded(report) = battle.advance(&mut sg.world, &mut rng) else {
            panic!("AI-only battle should not need decisions");
        };

        assert!(!report.exchanges.is_empty());
        assert_eq!(report.duels.len(), 1);
        // One pairing: whoever lost is out of the target roster or captured.
        assert!(report.captured.len() + report.routed.len() == 1);
        if report.city_taken {
            assert!(sg.world.city(sg.target).is_resident(sg.strong));
        }
        sg.world.assert_invariants();
    }

    #[test]
    fn empty_garrison_falls_without_a_fight() {
        let mut sg = siege();
        sg.world.general_mut(sg.weak).army = 0;
        let mut rng = SmallRng::seed_from_u64(3);
        let mut battle = Battle::begin(
            &mut sg.world,
            &mut rng,
            sg.origin,
            sg.target,
            &[sg.strong],
            Control::Ai,
            Control::Ai,
        )
        .unwrap();
        assert_eq!(battle.pool(Side::Defender), &[] as &[GeneralId]);

        let BattleStep::Concluded(report) = battle.advance(&mut sg.world, &mut rng) else {
            panic!("expected conclusion");
        };
        assert!(report.city_taken);
        assert_eq!(report.routed, vec![sg.weak]);
        assert!(!sg.world.city(sg.target).is_resident(sg.weak));
        sg.world.assert_invariants();
    }

    #[test]
    fn human_attacker_is_asked_and_may_withdraw() {
        let mut sg = siege();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut battle = Battle::begin(
            &mut sg.world,
            &mut rng,
            sg.origin,
            sg.target,
            &[sg.strong],
            Control::Human,
            Control::Ai,
        )
        .unwrap();

        let step = battle.advance(&mut sg.world, &mut rng);
        assert_eq!(
            step,
            BattleStep::Decision(DecisionRequest::ChooseStriker {
                side: Side::Attacker,
                candidates: vec![sg.strong],
            })
        );
        assert_eq!(
            battle.resume(&mut sg.world, &mut rng, Decision::Formation(Formation::Ranged)),
            Err(ActionError::InvalidDecision)
        );
        assert_eq!(
            battle.resume(&mut sg.world, &mut rng, Decision::Withdraw),
            Ok(BattleStep::Withdrawn { engaged: false })
        );
        assert_eq!(sg.world.general(sg.strong).army, 1000);
    }

    #[test]
    fn human_attacker_drives_a_full_pairing() {
        let mut sg = siege();
        let mut rng = SmallRng::seed_from_u64(8);
        let mut battle = Battle::begin(
            &mut sg.world,
            &mut rng,
            sg.origin,
            sg.target,
            &[sg.strong],
            Control::Human,
            Control::Ai,
        )
        .unwrap();

        battle.advance(&mut sg.world, &mut rng);
        let step = battle
            .resume(&mut sg.world, &mut rng, Decision::General(sg.strong))
            .unwrap();
        assert_eq!(
            step,
            BattleStep::Decision(DecisionRequest::ChooseFormation {
                side: Side::Attacker,
                general: sg.strong,
            })
        );
        let step = battle
            .resume(&mut sg.world, &mut rng, Decision::Formation(Formation::Vanguard))
            .unwrap();
        assert_eq!(
            step,
            BattleStep::Decision(DecisionRequest::ChooseOpponent {
                side: Side::Attacker,
                candidates: vec![sg.weak],
            })
        );
        let step = battle
            .resume(&mut sg.world, &mut rng, Decision::General(sg.weak))
            .unwrap();

        // One general a side: the first pairing decides the battle.
        let BattleStep::Concluded(report) = step else {
            panic!("unexpected step {step:?}");
        };
        assert_eq!(report.duels.len(), 1);
        assert!(battle.is_engaged());
        sg.world.assert_invariants();
    }

    #[test]
    fn human_defender_only_picks_formation_when_attacked() {
        let mut sg = siege();
        let mut rng = SmallRng::seed_from_u64(13);
        let mut battle = Battle::begin(
            &mut sg.world,
            &mut rng,
            sg.origin,
            sg.target,
            &[sg.strong],
            Control::Ai,
            Control::Human,
        )
        .unwrap();

        let step = battle.advance(&mut sg.world, &mut rng);
        assert_eq!(
            step,
            BattleStep::Decision(DecisionRequest::ChooseFormation {
                side: Side::Defender,
                general: sg.weak,
            })
        );
        assert_eq!(
            battle.resume(&mut sg.world, &mut rng, Decision::Withdraw),
            Err(ActionError::InvalidDecision)
        );
        let step = battle
            .resume(&mut sg.world, &mut rng, Decision::Formation(Formation::Defensive))
            .unwrap();
        assert!(matches!(step, BattleStep::Concluded(_)));
        sg.world.assert_invariants();
    }
}
