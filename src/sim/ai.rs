//! Turn orchestration for computer-controlled factions.
//!
//! A faction spends its action budget in a fixed priority order:
//!
//! 1. persuade prisoners,
//! 2. internal management (officers, food trade, general transfers),
//! 3. food redistribution between its own cities,
//! 4. attacks on hostile neighbors,
//! 5. exploration with whatever is left.
//!
//! Stages 1-3 and 5 never need outside input. An attack on the human
//! player's city may, so the offensive stage is resumable: [`AiTurn::run`]
//! returns [`AiProgress::AwaitingDecision`] and [`AiTurn::resume`] picks up
//! inside the same battle.

use rand::RngCore;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, warn};

use super::budget::ActionBudget;
use super::combat::{Battle, BattleReport, BattleStep, Decision, DecisionRequest};
use super::commands::{self, Command, CommandOutcome, FoodTrade};
use super::economy::FOOD_PER_GOLD;
use super::{helpers, victory};
use crate::error::ActionError;
use crate::id::{CityId, FactionId, GeneralId};
use crate::model::World;

// --- Constants ---

const ATTACK_MIN_SOLDIERS: u32 = 800;
const ATTACK_SKIP_CHANCE: f64 = 0.5;
const MAX_ATTACKERS: usize = 3;

const BORDER_TARGET_ARMY: u32 = 2000;
const DONOR_MIN_ARMY: u32 = 1500;
const DONOR_FLOOR_ARMY: u32 = 1000;

const FOOD_MARGIN: i64 = 500;
const FOOD_SHIPMENT: i64 = 500;
const FOOD_SHIPMENT_CAP: i64 = 1000;

const DEVELOPMENT_BUFFER: f64 = 100.0;
const SURPLUS_FACTOR: u32 = 3;
const STRATEGIC_SURPLUS_FACTOR: u32 = 5;
const STRATEGIC_MIN_FOOD: u32 = 5000;
const MAX_SELL_FOOD: u32 = 2000;
const MAX_STRATEGIC_UNITS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiReport {
    pub faction: FactionId,
    pub log: Vec<String>,
    pub battles: Vec<BattleReport>,
    pub actions_used: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiProgress {
    AwaitingDecision(DecisionRequest),
    Finished(AiReport),
}

#[derive(Debug, Clone)]
enum Stage {
    Management,
    Offensive {
        queue: Vec<(CityId, CityId)>,
        cursor: usize,
    },
    Explore,
    Done,
}

/// One faction's AI turn in progress.
#[derive(Debug, Clone)]
pub struct AiTurn {
    faction: FactionId,
    player: Option<FactionId>,
    budget: ActionBudget,
    stage: Stage,
    battle: Option<Box<Battle>>,
    report: AiReport,
}

impl AiTurn {
    pub fn new(faction: FactionId, actions_per_turn: u32, player: Option<FactionId>) -> Self {
        Self {
            faction,
            player,
            budget: ActionBudget::new(actions_per_turn),
            stage: Stage::Management,
            battle: None,
            report: AiReport {
                faction,
                log: Vec::new(),
                battles: Vec::new(),
                actions_used: 0,
            },
        }
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    pub fn pending(&self) -> Option<&DecisionRequest> {
        self.battle.as_ref().and_then(|b| b.pending())
    }

    /// Play the turn until it ends or a battle needs the human.
    pub fn run(&mut self, world: &mut World, rng: &mut dyn RngCore) -> AiProgress {
        loop {
            match std::mem::replace(&mut self.stage, Stage::Done) {
                Stage::Management => {
                    let name = world.faction_name(self.faction).to_string();
                    self.report.log.push(format!("--- {name} acts ---"));
                    self.persuade_prisoners(world, rng);
                    self.appoint_officers(world, rng);
                    self.trade_food(world, rng);
                    self.transfer_generals(world, rng);
                    self.redistribute_food(world, rng);
                    let mut queue = attack_candidates(world, self.faction);
                    queue.shuffle(rng);
                    self.stage = Stage::Offensive { queue, cursor: 0 };
                }
                Stage::Offensive { queue, mut cursor } => {
                    let mut decided = false;
                    while cursor < queue.len() && !self.budget.is_exhausted() {
                        let (origin, target) = queue[cursor];
                        cursor += 1;
                        if let Some(request) = self.launch_attack(world, rng, origin, target) {
                            self.stage = Stage::Offensive { queue, cursor };
                            return AiProgress::AwaitingDecision(request);
                        }
                        if victory::evaluate(world, self.player).is_some() {
                            decided = true;
                            break;
                        }
                    }
                    self.stage = if decided { Stage::Done } else { Stage::Explore };
                }
                Stage::Explore => {
                    self.explore(world, rng);
                    self.stage = Stage::Done;
                }
                Stage::Done => {
                    self.report.actions_used = self.budget.per_turn() - self.budget.remaining();
                    let name = world.faction_name(self.faction).to_string();
                    self.report.log.push(format!("--- {name} ends its turn ---"));
                    return AiProgress::Finished(std::mem::replace(
                        &mut self.report,
                        AiReport {
                            faction: self.faction,
                            log: Vec::new(),
                            battles: Vec::new(),
                            actions_used: 0,
                        },
                    ));
                }
            }
        }
    }

    /// Answer the decision the current battle is waiting on.
    pub fn resume(
        &mut self,
        world: &mut World,
        rng: &mut dyn RngCore,
        decision: Decision,
    ) -> Result<AiProgress, ActionError> {
        let Some(battle) = self.battle.as_mut() else {
            return Err(ActionError::NoPendingDecision);
        };
        // Only the human defender is ever asked, and defenders cannot withdraw.
        match battle.resume(world, rng, decision)? {
            BattleStep::Decision(request) => Ok(AiProgress::AwaitingDecision(request)),
            BattleStep::Concluded(report) => {
                self.battle = None;
                self.finish_battle(report);
                if victory::evaluate(world, self.player).is_some() {
                    self.stage = Stage::Done;
                }
                Ok(self.run(world, rng))
            }
            BattleStep::Withdrawn { .. } => unreachable!("AI attackers never withdraw"),
        }
    }

    fn act(
        &mut self,
        world: &mut World,
        rng: &mut dyn RngCore,
        command: Command,
    ) -> Option<CommandOutcome> {
        let label = format!("{command:?}");
        match commands::execute(
            world,
            rng,
            &mut self.budget,
            self.faction,
            self.player,
            command,
        ) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(faction = %self.faction, command = %label, error = %err, "AI action rejected");
                None
            }
        }
    }

    fn record(&mut self, outcome: Option<CommandOutcome>) {
        match outcome {
            Some(CommandOutcome::Done(log)) => self.report.log.push(log),
            Some(CommandOutcome::Explored(result)) => self.report.log.push(result.log),
            Some(CommandOutcome::Persuaded(result)) => self.report.log.push(result.log),
            Some(CommandOutcome::Battle(_)) | None => {}
        }
    }

    // --- Stage 1: prisoners ---

    fn persuade_prisoners(&mut self, world: &mut World, rng: &mut dyn RngCore) {
        // Every city here belongs to the same faction, so the city-count
        // priority is constant; cities are visited in id order.
        for city in world.faction_cities(self.faction) {
            let prisoners: Vec<GeneralId> =
                world.city(city).prisoners.iter().map(|p| p.general).collect();
            for prisoner in prisoners {
                if self.budget.is_exhausted() {
                    return;
                }
                let outcome = self.act(world, rng, Command::Persuade { city, prisoner });
                self.record(outcome);
            }
        }
    }

    // --- Stage 2: internal management ---

    fn appoint_officers(&mut self, world: &mut World, rng: &mut dyn RngCore) {
        for city in world.faction_cities(self.faction) {
            if self.budget.is_exhausted() {
                return;
            }
            let Some((commerce, agriculture)) = officer_plan(world, city) else {
                continue;
            };
            let outcome = self.act(
                world,
                rng,
                Command::AppointOfficers {
                    city,
                    commerce,
                    agriculture,
                },
            );
            self.record(outcome);
        }
    }

    fn trade_food(&mut self, world: &mut World, rng: &mut dyn RngCore) {
        for city in world.faction_cities(self.faction) {
            if self.budget.is_exhausted() {
                return;
            }
            if let Some(trade) = food_trade_plan(world, city) {
                let outcome = self.act(world, rng, Command::TradeFood { city, trade });
                self.record(outcome);
            }
        }
    }

    fn transfer_generals(&mut self, world: &mut World, rng: &mut dyn RngCore) {
        let cities = world.faction_cities(self.faction);

        let mut needy: Vec<(CityId, u32)> = cities
            .iter()
            .map(|&c| (c, world.city_army(c)))
            .filter(|&(c, army)| world.is_border_city(c) && army < BORDER_TARGET_ARMY)
            .collect();
        if needy.is_empty() {
            return;
        }
        needy.sort_by_key(|&(_, army)| army);

        let mut donors: Vec<(CityId, u32)> = cities
            .iter()
            .map(|&c| (c, world.city_army(c)))
            .filter(|&(c, army)| {
                !world.is_border_city(c)
                    && army > DONOR_MIN_ARMY
                    && world.city(c).generals.len() > 1
            })
            .collect();
        if donors.is_empty() {
            return;
        }
        donors.sort_by(|a, b| b.1.cmp(&a.1));

        for &(target, _) in &needy {
            for &(donor, _) in &donors {
                if self.budget.is_exhausted() {
                    return;
                }
                if world.city_army(donor) <= DONOR_FLOOR_ARMY {
                    continue;
                }
                let picked = transfer_candidates(world, donor);
                if picked.is_empty() {
                    continue;
                }
                let outcome = self.act(
                    world,
                    rng,
                    Command::TransferGenerals {
                        from: donor,
                        to: target,
                        generals: picked,
                    },
                );
                self.record(outcome);
                if world.city_army(donor) <= DONOR_FLOOR_ARMY {
                    break;
                }
            }
        }
    }

    // --- Stage 3: food redistribution ---

    fn redistribute_food(&mut self, world: &mut World, rng: &mut dyn RngCore) {
        let cities = world.faction_cities(self.faction);
        let upkeep = |world: &World, c: CityId| i64::from(world.city_army(c));
        let food = |world: &World, c: CityId| i64::from(world.city(c).food);

        let needy: Vec<CityId> = cities
            .iter()
            .copied()
            .filter(|&c| food(world, c) < upkeep(world, c) - FOOD_MARGIN)
            .collect();
        if needy.is_empty() {
            return;
        }
        let mut donors: Vec<CityId> = cities
            .iter()
            .copied()
            .filter(|&c| food(world, c) > upkeep(world, c) + FOOD_MARGIN)
            .collect();

        for needy_city in needy {
            if self.budget.is_exhausted() {
                return;
            }
            let Some(donor) = helpers::pick(rng, &donors) else {
                return;
            };
            let amount = FOOD_SHIPMENT
                .min(food(world, donor) - FOOD_MARGIN)
                .min(FOOD_SHIPMENT_CAP - food(world, needy_city));
            if amount <= 0 {
                continue;
            }
            let outcome = self.act(
                world,
                rng,
                Command::Transport {
                    from: donor,
                    to: needy_city,
                    food: amount as u32,
                    gold: 0,
                },
            );
            self.record(outcome);
            if food(world, donor) <= upkeep(world, donor) + FOOD_MARGIN {
                donors.retain(|&d| d != donor);
            }
        }
    }

    // --- Stage 4: offensive ---

    /// Fire one attack if it is still eligible. Returns a request if the
    /// battle stopped for the human.
    fn launch_attack(
        &mut self,
        world: &mut World,
        rng: &mut dyn RngCore,
        origin: CityId,
        target: CityId,
    ) -> Option<DecisionRequest> {
        if helpers::roll(rng, ATTACK_SKIP_CHANCE) {
            debug!(origin = %origin, target = %target, "AI holds back");
            return None;
        }
        if world.city(origin).owner != self.faction || world.city(target).owner == self.faction
        {
            return None;
        }
        let generals = strike_force(world, origin);
        if generals.is_empty() {
            return None;
        }

        self.report.log.push(format!(
            "{} attacks {} from {}!",
            world.faction_name(self.faction),
            world.city_name(target),
            world.city_name(origin)
        ));
        let outcome = self.act(
            world,
            rng,
            Command::Attack {
                origin,
                target,
                generals,
            },
        );
        let Some(CommandOutcome::Battle(mut battle)) = outcome else {
            return None;
        };
        match battle.advance(world, rng) {
            BattleStep::Decision(request) => {
                self.battle = Some(battle);
                Some(request)
            }
            BattleStep::Concluded(report) => {
                self.finish_battle(report);
                None
            }
            BattleStep::Withdrawn { .. } => unreachable!("AI attackers never withdraw"),
        }
    }

    fn finish_battle(&mut self, report: BattleReport) {
        self.report.log.extend(report.announcements.iter().cloned());
        self.report.battles.push(report);
    }

    // --- Stage 5: exploration ---

    fn explore(&mut self, world: &mut World, rng: &mut dyn RngCore) {
        while !self.budget.is_exhausted() {
            let cities = world.faction_cities(self.faction);
            let Some(city) = helpers::pick(rng, &cities) else {
                return;
            };
            let outcome = self.act(world, rng, Command::Explore { city });
            self.record(outcome);
        }
    }
}

/// New `(commerce, agriculture)` officers for `city`, or `None` if the
/// current ones should stay.
///
/// A lone resident takes the office matching their stronger skill. With
/// more residents the best politician farms and the best scholar trades,
/// falling back to the runner-up scholar when one general tops both. A
/// sitting officer is only replaced by someone strictly better, and no
/// general ends up in both offices.
pub fn officer_plan(
    world: &World,
    city: CityId,
) -> Option<(Option<GeneralId>, Option<GeneralId>)> {
    let c = world.city(city);
    let current = (c.officer_commerce, c.officer_agriculture);
    let roster = &c.generals;

    if roster.len() == 1 {
        let sole = roster[0];
        let g = world.general(sole);
        if g.intellect >= g.politics {
            if c.officer_commerce.is_some() {
                return None;
            }
            let agriculture = c.officer_agriculture.filter(|&a| a != sole);
            return Some((Some(sole), agriculture));
        }
        if c.officer_agriculture.is_some() {
            return None;
        }
        let commerce = c.officer_commerce.filter(|&a| a != sole);
        return Some((commerce, Some(sole)));
    }

    let best_agri = helpers::first_max_by_key(roster, |g| world.general(g).politics)?;
    let mut best_comm = helpers::first_max_by_key(roster, |g| world.general(g).intellect)?;
    if best_agri == best_comm {
        let others: Vec<GeneralId> = roster.iter().copied().filter(|&g| g != best_agri).collect();
        if let Some(second) = helpers::first_max_by_key(&others, |g| world.general(g).intellect) {
            best_comm = second;
        }
    }

    let mut agriculture = match c.officer_agriculture {
        Some(cur) if world.general(best_agri).politics <= world.general(cur).politics => Some(cur),
        _ => Some(best_agri),
    };
    let mut commerce = match c.officer_commerce {
        Some(cur) if world.general(best_comm).intellect <= world.general(cur).intellect => Some(cur),
        _ => Some(best_comm),
    };

    if commerce.is_some() && commerce == agriculture {
        // Whichever office kept its holder gives way to its best candidate.
        if commerce == c.officer_commerce {
            commerce = Some(best_comm);
        } else {
            agriculture = Some(best_agri);
        }
    }

    let plan = (commerce, agriculture);
    if plan == current { None } else { Some(plan) }
}

/// The single food trade the AI would make in `city` this turn, if any.
pub fn food_trade_plan(world: &World, city: CityId) -> Option<FoodTrade> {
    let c = world.city(city);
    let consumption = world.city_army(city);
    let salaries: f64 = [c.officer_commerce, c.officer_agriculture]
        .into_iter()
        .flatten()
        .map(|g| world.general(g).salary())
        .sum();
    let reserve = (salaries + DEVELOPMENT_BUFFER).ceil() as u32;

    if c.food < consumption / 2 {
        let units = ((consumption - c.food) / FOOD_PER_GOLD + 1).min(c.gold);
        return (units > 0).then_some(FoodTrade::Buy(units));
    }

    if c.food < consumption {
        let spendable = c.gold.saturating_sub(reserve);
        let units = ((consumption - c.food) / FOOD_PER_GOLD + 1).min(spendable);
        return (units > 0).then_some(FoodTrade::Buy(units));
    }

    let keep = consumption.saturating_mul(SURPLUS_FACTOR);
    if c.food > keep && c.gold < reserve {
        let sellable = (c.food - keep).min(MAX_SELL_FOOD);
        if sellable >= FOOD_PER_GOLD {
            let units = (reserve - c.gold).min(sellable / FOOD_PER_GOLD);
            return (units > 0).then_some(FoodTrade::Sell(units));
        }
    }

    if c.food > consumption.saturating_mul(STRATEGIC_SURPLUS_FACTOR) && c.food > STRATEGIC_MIN_FOOD
    {
        let max_units = ((c.food - keep) / FOOD_PER_GOLD).min(MAX_STRATEGIC_UNITS);
        let units = max_units / 2;
        return (units > 0).then_some(FoodTrade::Sell(units));
    }

    None
}

/// Mid-strength residents a donor city can spare: the second and third
/// weakest of four or more, the second weakest of three, else the weakest.
fn transfer_candidates(world: &World, donor: CityId) -> Vec<GeneralId> {
    let mut armed: Vec<GeneralId> = world
        .city(donor)
        .generals
        .iter()
        .copied()
        .filter(|&g| world.general(g).army > 0)
        .collect();
    if armed.len() <= 1 {
        return Vec::new();
    }
    armed.sort_by_key(|&g| world.general(g).army);
    match armed.len() {
        n if n >= 4 => armed[1..3].to_vec(),
        3 => vec![armed[1]],
        _ => vec![armed[0]],
    }
}

/// Every `(origin, target)` pair from which `faction` could attack now.
pub fn attack_candidates(world: &World, faction: FactionId) -> Vec<(CityId, CityId)> {
    let mut pairs = Vec::new();
    for city in world.faction_cities(faction) {
        if strike_force(world, city).is_empty() {
            continue;
        }
        for target in world.hostile_neighbors(city) {
            pairs.push((city, target));
        }
    }
    pairs
}

/// Up to three strongest residents with more than 800 soldiers.
fn strike_force(world: &World, city: CityId) -> Vec<GeneralId> {
    let mut ready: Vec<GeneralId> = world
        .city(city)
        .generals
        .iter()
        .copied()
        .filter(|&g| world.general(g).army > ATTACK_MIN_SOLDIERS)
        .collect();
    ready.sort_by(|&a, &b| world.general(b).army.cmp(&world.general(a).army));
    ready.truncate(MAX_ATTACKERS);
    ready
}
