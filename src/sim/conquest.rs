//! What happens to beaten generals and taken cities: routs, city
//! transfer, and faction elimination.

use rand::RngCore;
use tracing::info;

use crate::id::{CityId, GeneralId};
use crate::model::World;
use crate::sim::helpers;

/// Chance that a routed non-ruler of a one-city faction abandons it.
const DEFECTION_CHANCE: f64 = 0.1;

/// Send a beaten defender away from `city`.
///
/// With other cities to fall back on, the general retreats to a random one.
/// In a faction's last city, a non-ruler may defect and turn wild there;
/// anyone else stays put.
///
/// # Panics
/// Panics if `general` serves no faction. Only defenders rout.
pub fn rout(world: &mut World, rng: &mut dyn RngCore, general: GeneralId, city: CityId) -> String {
    let faction = world
        .general(general)
        .faction
        .unwrap_or_else(|| panic!("rout: {general} serves no faction"));
    let name = world.general_name(general).to_string();
    let fallback: Vec<CityId> = world
        .faction(faction)
        .cities
        .iter()
        .copied()
        .filter(|&c| c != city)
        .collect();

    if let Some(dest) = helpers::pick(rng, &fallback) {
        world.relocate(general, city, dest);
        return format!("{name} retreats to {}.", world.city_name(dest));
    }

    if !world.is_ruler(general) && helpers::roll(rng, DEFECTION_CHANCE) {
        world.discharge(general);
        let c = world.city_mut(city);
        c.remove_resident(general);
        c.wild_generals.push(general);
        info!(general = %name, city = %world.city_name(city), "general defected");
        return format!(
            "{name} abandons {} and disappears into the hills.",
            world.faction_name(faction)
        );
    }

    format!("{name} has nowhere to run and holds out in {}.", world.city_name(city))
}

/// Outcome of [`settle`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settlement {
    pub city_taken: bool,
    pub defender_eliminated: bool,
    pub log: Vec<String>,
}

/// Resolve city ownership once one side of a battle has no generals left.
///
/// `survivors` are the attackers still standing. If none are, the defender
/// keeps the city. Otherwise the city changes hands and the survivors march
/// in. Taking a faction's last city imprisons everyone left in it (in the
/// origin city) and disbands the faction.
///
/// # Panics
/// Panics if the defending faction owns no cities.
pub fn settle(
    world: &mut World,
    origin: CityId,
    target: CityId,
    survivors: &[GeneralId],
) -> Settlement {
    let defender = world.city(target).owner;
    let attacker = world.city(origin).owner;
    let mut settlement = Settlement::default();

    if survivors.is_empty() {
        settlement.log.push(format!(
            "{} holds {}!",
            world.faction_name(defender),
            world.city_name(target)
        ));
        return settlement;
    }

    let remaining = world.faction(defender).cities.len();
    assert!(remaining >= 1, "settle: {defender} owns no cities");
    if remaining == 1 {
        let garrison = world.city(target).generals.clone();
        for g in garrison {
            world.city_mut(target).remove_resident(g);
            world.city_mut(origin).take_prisoner(g);
        }
        let members: Vec<GeneralId> = world.faction(defender).generals.iter().copied().collect();
        for g in members {
            world.discharge(g);
        }
        settlement.defender_eliminated = true;
        settlement
            .log
            .push(format!("{} has been destroyed!", world.faction_name(defender)));
        info!(faction = %world.faction_name(defender), "faction eliminated");
    }

    world.transfer_city(target, attacker);
    for &g in survivors {
        world.relocate(g, origin, target);
    }
    settlement.city_taken = true;
    settlement.log.push(format!(
        "{} captures {}!",
        world.faction_name(attacker),
        world.city_name(target)
    ));
    info!(
        city = %world.city_name(target),
        faction = %world.faction_name(attacker),
        "city captured"
    );
    settlement
}
