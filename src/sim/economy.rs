//! Per-city economy: monthly settlement, exploration, and the resource
//! operations shared by player commands and the AI (food trade, transport,
//! general transfer, officer appointment).

use rand::{Rng, RngCore};
use tracing::debug;

use super::context::TurnContext;
use super::runner::CityLog;
use super::system::SimSystem;
use crate::error::ActionError;
use crate::id::{CityId, GeneralId};
use crate::model::{MAX_PROGRESS, MAX_SOLDIERS, World};
use crate::sim::helpers;

const BASE_GOLD_INCOME: u32 = 100;
const GOLD_PER_COMMERCE_LEVEL: u32 = 100;
const BASE_FOOD_INCOME: u32 = 1000;
const FOOD_PER_AGRICULTURE_LEVEL: u32 = 1000;
const DEVELOPMENT_DIVISOR: f64 = 10.0;

// Exploration
const EXPLORE_NOTHING: f64 = 0.4;
const EXPLORE_GOLD: f64 = 0.6;
const EXPLORE_FOOD: f64 = 0.8;
const EXPLORE_GOLD_MIN: u32 = 150;
const EXPLORE_GOLD_MAX: u32 = 300;
const EXPLORE_FOOD_MIN: u32 = 200;
const EXPLORE_FOOD_MAX: u32 = 400;

/// Food bought per gold, and food sold per gold.
pub const FOOD_PER_GOLD: u32 = 10;

// --- Monthly settlement ---

/// Settles every city once per turn, in id order.
pub struct EconomySystem;

impl SimSystem for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn tick(&mut self, ctx: &mut TurnContext) {
        let cities: Vec<CityId> = ctx.world.cities.keys().copied().collect();
        for city in cities {
            let log = advance_city_month(ctx.world, city);
            ctx.report.monthly.push(CityLog { city, log });
        }
    }
}

/// Settle one month for `city`: income, food consumption, officer-funded
/// development and recruitment. Returns a readable log of every step.
pub fn advance_city_month(world: &mut World, city_id: CityId) -> String {
    let city = world.city(city_id);
    let roster = city.generals.clone();
    let officer_commerce = city.officer_commerce;
    let officer_agriculture = city.officer_agriculture;
    let commerce_level = city.commerce_level();
    let agriculture_level = city.agriculture_level();

    let mut log = vec![format!("=== {} monthly report ===", city.name)];

    let gold_income = BASE_GOLD_INCOME + commerce_level * GOLD_PER_COMMERCE_LEVEL;
    let food_income = BASE_FOOD_INCOME + agriculture_level * FOOD_PER_AGRICULTURE_LEVEL;
    log.push(format!(
        "Commerce level {commerce_level} -> income {gold_income} gold"
    ));
    log.push(format!(
        "Agriculture level {agriculture_level} -> income {food_income} food"
    ));

    // Salary demand: partial recruitment drive per under-strength general,
    // plus each officer's full salary.
    let mut salary_demand = 0.0;
    for &g in &roster {
        let general = world.general(g);
        if !general.is_full_strength() {
            let ratio = f64::from(general.recruit_capacity()) / f64::from(MAX_SOLDIERS);
            salary_demand += (general.salary() * ratio).round_ties_even();
        }
    }
    for officer in [officer_agriculture, officer_commerce].into_iter().flatten() {
        salary_demand += world.general(officer).salary();
    }
    log.push(format!("Salary demand: {salary_demand:.1} gold"));

    // Food: income first, then each resident feeds their army in roster order.
    let mut food = world.city(city_id).food.saturating_add(food_income);
    for &g in &roster {
        let general = world.general_mut(g);
        if food >= general.army {
            food -= general.army;
        } else {
            let shortage = general.army - food;
            let deserters = shortage / 2;
            food = 0;
            general.army = general.army.saturating_sub(deserters);
            log.push(format!(
                "Food shortage! {deserters} soldiers desert {}",
                general.name
            ));
        }
    }

    let mut gold = world.city(city_id).gold.saturating_add(gold_income);
    let gold_before_spending = gold;

    let mut commerce_progress = world.city(city_id).commerce_progress;
    if let Some(officer) = officer_commerce {
        let g = world.general(officer);
        if let Some(pay) = salary_payment(gold, g.salary()) {
            gold -= pay;
            let inc = f64::from(g.intellect) / DEVELOPMENT_DIVISOR;
            commerce_progress = (commerce_progress + inc).min(MAX_PROGRESS);
            log.push(format!(
                "Commerce +{inc:.1} (progress {commerce_progress:.1}/{MAX_PROGRESS})"
            ));
        }
    }

    let mut agriculture_progress = world.city(city_id).agriculture_progress;
    if let Some(officer) = officer_agriculture {
        let g = world.general(officer);
        if let Some(pay) = salary_payment(gold, g.salary()) {
            gold -= pay;
            let inc = f64::from(g.politics) / DEVELOPMENT_DIVISOR;
            agriculture_progress = (agriculture_progress + inc).min(MAX_PROGRESS);
            log.push(format!(
                "Agriculture +{inc:.1} (progress {agriculture_progress:.1}/{MAX_PROGRESS})"
            ));
        }
    }

    for &g in &roster {
        let general = world.general_mut(g);
        if general.is_full_strength() {
            continue;
        }
        let cost_per_soldier = general.salary() / f64::from(MAX_SOLDIERS);
        let affordable = (f64::from(gold) / cost_per_soldier).floor() as u32;
        let recruits = general.recruit_capacity().min(affordable);
        general.army += recruits;
        let spent = (f64::from(recruits) * cost_per_soldier).floor() as u32;
        gold = gold.saturating_sub(spent);
    }

    log.push(format!(
        "Gold before spending {gold_before_spending} -> after {gold}"
    ));

    let city = world.city_mut(city_id);
    city.food = food;
    city.gold = gold;
    city.commerce_progress = commerce_progress;
    city.agriculture_progress = agriculture_progress;

    log.join("\n")
}

/// Whole gold charged for one month of an officer's salary, or `None` if
/// `gold` falls short of the full salary. Fractions round up, so an officer
/// is never funded below salary.
fn salary_payment(gold: u32, salary: f64) -> Option<u32> {
    if f64::from(gold) < salary {
        return None;
    }
    Some((salary.ceil() as u32).min(gold))
}

// --- Exploration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploreOutcome {
    Nothing,
    Gold(u32),
    Food(u32),
    Recruited(GeneralId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreResult {
    pub outcome: ExploreOutcome,
    pub log: String,
}

/// Search the city's surroundings. A found wild general joins the city's
/// roster and its owner.
pub fn explore(world: &mut World, rng: &mut dyn RngCore, city_id: CityId) -> ExploreResult {
    let draw: f64 = rng.random();
    let outcome = if draw < EXPLORE_NOTHING {
        ExploreOutcome::Nothing
    } else if draw < EXPLORE_GOLD {
        ExploreOutcome::Gold(rng.random_range(EXPLORE_GOLD_MIN..=EXPLORE_GOLD_MAX))
    } else if draw < EXPLORE_FOOD {
        ExploreOutcome::Food(rng.random_range(EXPLORE_FOOD_MIN..=EXPLORE_FOOD_MAX))
    } else if let Some(found) = helpers::pick(rng, &world.city(city_id).wild_generals) {
        ExploreOutcome::Recruited(found)
    } else if helpers::roll(rng, 0.5) {
        ExploreOutcome::Gold(rng.random_range(EXPLORE_GOLD_MIN..=EXPLORE_GOLD_MAX))
    } else {
        ExploreOutcome::Food(rng.random_range(EXPLORE_FOOD_MIN..=EXPLORE_FOOD_MAX))
    };

    let log = match outcome {
        ExploreOutcome::Nothing => "Searched for a long while and found nothing.".to_string(),
        ExploreOutcome::Gold(amount) => {
            world.city_mut(city_id).gold += amount;
            format!("Found abandoned supplies worth {amount} gold.")
        }
        ExploreOutcome::Food(amount) => {
            world.city_mut(city_id).food += amount;
            format!("Found a hidden granary with {amount} food.")
        }
        ExploreOutcome::Recruited(g) => {
            let owner = world.city(city_id).owner;
            let city = world.city_mut(city_id);
            city.wild_generals.retain(|&w| w != g);
            city.add_resident(g);
            world.enlist(g, owner);
            format!(
                "Met the wandering {}, who joins {}!",
                world.general_name(g),
                world.faction_name(owner)
            )
        }
    };
    debug!(city = %world.city_name(city_id), ?outcome, "explored");
    ExploreResult { outcome, log }
}

// --- Resource operations ---

/// Spend `units` gold for `units * 10` food.
pub fn buy_food(world: &mut World, city_id: CityId, units: u32) -> Result<String, ActionError> {
    if units == 0 {
        return Err(ActionError::EmptySelection);
    }
    let city = world.city_mut(city_id);
    if units > city.gold {
        return Err(ActionError::InsufficientGold {
            city: city_id,
            required: units,
            available: city.gold,
        });
    }
    let gained = units.saturating_mul(FOOD_PER_GOLD);
    city.gold -= units;
    city.food = city.food.saturating_add(gained);
    Ok(format!(
        "{} bought {gained} food for {units} gold",
        city.name
    ))
}

/// Sell `units * 10` food for `units` gold.
pub fn sell_food(world: &mut World, city_id: CityId, units: u32) -> Result<String, ActionError> {
    if units == 0 {
        return Err(ActionError::EmptySelection);
    }
    let city = world.city_mut(city_id);
    let food_cost = units.saturating_mul(FOOD_PER_GOLD);
    if food_cost > city.food {
        return Err(ActionError::InsufficientFood {
            city: city_id,
            required: food_cost,
            available: city.food,
        });
    }
    city.food -= food_cost;
    city.gold = city.gold.saturating_add(units);
    Ok(format!(
        "{} sold {food_cost} food for {units} gold",
        city.name
    ))
}

fn check_same_faction(world: &World, from: CityId, to: CityId) -> Result<(), ActionError> {
    let owner_of = |city: CityId| {
        world
            .cities
            .get(&city)
            .map(|c| c.owner)
            .ok_or(ActionError::UnknownCity { city })
    };
    if from == to || owner_of(from)? != owner_of(to)? {
        return Err(ActionError::InvalidDestination { from, to });
    }
    Ok(())
}

/// Ship food and gold between two cities of the same faction.
pub fn transport(
    world: &mut World,
    from: CityId,
    to: CityId,
    food: u32,
    gold: u32,
) -> Result<String, ActionError> {
    check_same_faction(world, from, to)?;
    if food == 0 && gold == 0 {
        return Err(ActionError::EmptySelection);
    }
    let source = world.city(from);
    if food > source.food {
        return Err(ActionError::InsufficientFood {
            city: from,
            required: food,
            available: source.food,
        });
    }
    if gold > source.gold {
        return Err(ActionError::InsufficientGold {
            city: from,
            required: gold,
            available: source.gold,
        });
    }
    let source = world.city_mut(from);
    source.food -= food;
    source.gold -= gold;
    let dest = world.city_mut(to);
    dest.food = dest.food.saturating_add(food);
    dest.gold = dest.gold.saturating_add(gold);
    Ok(format!(
        "Shipped {food} food and {gold} gold from {} to {}",
        world.city_name(from),
        world.city_name(to)
    ))
}

/// Move residents between two cities of the same faction.
pub fn transfer_generals(
    world: &mut World,
    from: CityId,
    to: CityId,
    generals: &[GeneralId],
) -> Result<String, ActionError> {
    check_same_faction(world, from, to)?;
    if generals.is_empty() {
        return Err(ActionError::EmptySelection);
    }
    if let Some(&stray) = generals.iter().find(|&&g| !world.city(from).is_resident(g)) {
        return Err(ActionError::NotResident {
            general: stray,
            city: from,
        });
    }
    for &g in generals {
        world.relocate(g, from, to);
    }
    let names: Vec<&str> = generals.iter().map(|&g| world.general_name(g)).collect();
    Ok(format!(
        "Sent {} general(s) from {} to {}: {}",
        generals.len(),
        world.city_name(from),
        world.city_name(to),
        names.join(", ")
    ))
}

/// Replace both office holders of a city. `None` leaves an office vacant.
pub fn appoint_officers(
    world: &mut World,
    city_id: CityId,
    commerce: Option<GeneralId>,
    agriculture: Option<GeneralId>,
) -> Result<String, ActionError> {
    let city = world.city(city_id);
    for g in [commerce, agriculture].into_iter().flatten() {
        if !city.is_resident(g) {
            return Err(ActionError::NotResident {
                general: g,
                city: city_id,
            });
        }
    }
    if let Some(g) = commerce.filter(|&g| agriculture == Some(g)) {
        return Err(ActionError::OfficerConflict {
            general: g,
            city: city_id,
        });
    }
    let city = world.city_mut(city_id);
    city.officer_commerce = commerce;
    city.officer_agriculture = agriculture;
    let name_of = |g: Option<GeneralId>| {
        g.map_or_else(|| "vacant".to_string(), |g| world.general_name(g).to_string())
    };
    Ok(format!(
        "{}: commerce officer {}, agriculture officer {}",
        world.city_name(city_id),
        name_of(commerce),
        name_of(agriculture)
    ))
}
