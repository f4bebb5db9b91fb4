//! Prisoners: escape attempts each turn and persuasion on demand.

use rand::RngCore;
use tracing::debug;

use super::context::TurnContext;
use super::runner::CityLog;
use super::system::SimSystem;
use crate::error::ActionError;
use crate::id::{CityId, GeneralId};
use crate::model::World;
use crate::sim::helpers;

const ESCAPE_CHANCE_PER_TURN: f64 = 0.01;
const PERSUASION_PER_TURN: f64 = 0.01;

/// Chance that a prisoner held `turns_held` turns slips out this turn.
pub fn escape_chance(turns_held: u32) -> f64 {
    (ESCAPE_CHANCE_PER_TURN * f64::from(turns_held)).min(1.0)
}

/// Chance that a prisoner with `loyalty` agrees to switch sides.
pub fn persuasion_chance(loyalty: f64, turns_held: u32) -> f64 {
    ((1.0 - loyalty) + PERSUASION_PER_TURN * f64::from(turns_held)).min(1.0)
}

/// Rolls escapes in every city holding prisoners.
pub struct CaptivitySystem;

impl SimSystem for CaptivitySystem {
    fn name(&self) -> &str {
        "captivity"
    }

    fn tick(&mut self, ctx: &mut TurnContext) {
        let cities: Vec<CityId> = ctx
            .world
            .cities
            .values()
            .filter(|c| !c.prisoners.is_empty())
            .map(|c| c.id)
            .collect();
        for city in cities {
            let log = tick_prisoners(ctx.world, ctx.rng, city);
            ctx.report.escapes.push(CityLog { city, log });
        }
    }
}

/// Roll escapes for every prisoner of `city` and age the rest by one turn.
///
/// Prisoners without a faction have nowhere to go and never escape.
///
/// # Panics
/// Panics if an escaping prisoner's faction holds no city.
pub fn tick_prisoners(world: &mut World, rng: &mut dyn RngCore, city_id: CityId) -> String {
    let prisoners = std::mem::take(&mut world.city_mut(city_id).prisoners);
    let mut kept = Vec::with_capacity(prisoners.len());
    let mut log = Vec::new();

    for mut prisoner in prisoners {
        let chance = escape_chance(prisoner.turns_held);
        prisoner.turns_held += 1;

        let Some(faction) = world.general(prisoner.general).faction else {
            kept.push(prisoner);
            continue;
        };
        if !helpers::roll(rng, chance) {
            kept.push(prisoner);
            continue;
        }

        let havens = world.faction_cities(faction);
        let Some(dest) = helpers::pick(rng, &havens) else {
            panic!(
                "prisoner {} escaped from {} but {faction} holds no city",
                prisoner.general, city_id
            );
        };
        world.city_mut(dest).add_resident(prisoner.general);
        let name = world.general_name(prisoner.general);
        log.push(format!(
            "{name} escapes from {} and returns to {}!",
            world.city_name(city_id),
            world.city_name(dest)
        ));
        debug!(general = %name, to = %world.city_name(dest), "prisoner escaped");
    }

    world.city_mut(city_id).prisoners = kept;
    if log.is_empty() {
        "No escapes.".to_string()
    } else {
        log.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersuadeOutcome {
    Joined,
    Refused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersuadeResult {
    pub outcome: PersuadeOutcome,
    pub log: String,
}

/// Try to win `prisoner` over to the owner of `city`.
///
/// Unaffiliated prisoners, and prisoners already serving the owner, join
/// without a roll.
pub fn persuade(
    world: &mut World,
    rng: &mut dyn RngCore,
    city_id: CityId,
    prisoner: GeneralId,
) -> Result<PersuadeResult, ActionError> {
    let city = world.city(city_id);
    if city.prisoners.is_empty() {
        return Err(ActionError::NoPrisoners { city: city_id });
    }
    let Some(held) = city.prisoner(prisoner).copied() else {
        return Err(ActionError::NotAPrisoner {
            general: prisoner,
            city: city_id,
        });
    };
    let owner = city.owner;
    let general = world.general(prisoner);

    let joins = match general.faction {
        None => true,
        Some(f) if f == owner => true,
        Some(_) => {
            let chance = persuasion_chance(general.loyalty, held.turns_held);
            debug!(
                general = %general.name,
                turns = held.turns_held,
                chance,
                "persuasion attempt"
            );
            helpers::roll(rng, chance)
        }
    };

    let name = world.general_name(prisoner).to_string();
    if !joins {
        return Ok(PersuadeResult {
            outcome: PersuadeOutcome::Refused,
            log: format!("{name} refuses to submit."),
        });
    }

    let city = world.city_mut(city_id);
    city.release_prisoner(prisoner);
    city.add_resident(prisoner);
    world.enlist(prisoner, owner);
    Ok(PersuadeResult {
        outcome: PersuadeOutcome::Joined,
        log: format!("{name} is persuaded and joins {}!", world.faction_name(owner)),
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn escape_chance_grows_from_zero() {
        assert_eq!(escape_chance(0), 0.0);
        assert!((escape_chance(7) - 0.07).abs() < 1e-12);
        assert_eq!(escape_chance(500), 1.0);
    }

    #[test]
    fn persuasion_chance_bounds() {
        assert_eq!(persuasion_chance(0.0, 100), 1.0);
        assert_eq!(persuasion_chance(0.0, 250), 1.0);
        assert!((persuasion_chance(0.7, 0) - 0.3).abs() < 1e-12);
        assert!((persuasion_chance(0.7, 10) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn fresh_prisoners_never_escape() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        let prison = s.city("Yizhou", shu.faction).id();
        s.city("Xuchang", wei.faction);
        let captive = s.general("Xu Huang").serve(wei.faction).imprison_in(prison, 0).id();
        let mut world = s.build();
        let mut rng = SmallRng::seed_from_u64(0);

        tick_prisoners(&mut world, &mut rng, prison);

        assert_eq!(
            world.city(prison).prisoner(captive).map(|p| p.turns_held),
            Some(1)
        );
    }

    #[test]
    fn unaffiliated_prisoners_only_age() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let prison = s.city("Yizhou", shu.faction).id();
        let captive = s.general("Lu Bu").imprison_in(prison, 1000).id();
        let mut world = s.build();
        let mut rng = SmallRng::seed_from_u64(0);

        for _ in 0..20 {
            tick_prisoners(&mut world, &mut rng, prison);
        }

        assert_eq!(
            world.city(prison).prisoner(captive).map(|p| p.turns_held),
            Some(1020)
        );
    }

    #[test]
    fn long_held_prisoner_escapes_home() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        let prison = s.city("Yizhou", shu.faction).id();
        let home = s.city("Xuchang", wei.faction).id();
        let captive = s.general("Xu Huang").serve(wei.faction).imprison_in(prison, 100).id();
        let mut world = s.build();
        let mut rng = SmallRng::seed_from_u64(0);

        let log = tick_prisoners(&mut world, &mut rng, prison);

        assert!(world.city(prison).prisoners.is_empty());
        assert!(world.city(home).is_resident(captive));
        assert!(log.contains("escapes"));
        world.assert_invariants();
    }

    #[test]
    fn persuade_selection_errors() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let prison = s.city("Yizhou", shu.faction).id();
        let mut world = s.build();
        let mut rng = SmallRng::seed_from_u64(0);

        assert_eq!(
            persuade(&mut world, &mut rng, prison, shu.ruler),
            Err(ActionError::NoPrisoners { city: prison })
        );
    }

    #[test]
    fn disloyal_prisoner_always_joins() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        let prison = s.city("Yizhou", shu.faction).id();
        s.city("Xuchang", wei.faction);
        let captive = s
            .general("Meng Da")
            .serve(wei.faction)
            .loyalty(0.0)
            .imprison_in(prison, 0)
            .id();
        let mut world = s.build();
        let mut rng = SmallRng::seed_from_u64(0);

        let result = persuade(&mut world, &mut rng, prison, captive).unwrap();

        assert_eq!(result.outcome, PersuadeOutcome::Joined);
        assert_eq!(world.general(captive).faction, Some(shu.faction));
        assert!(!world.faction(wei.faction).generals.contains(&captive));
        assert!(world.city(prison).is_resident(captive));
        assert!(world.city(prison).prisoners.is_empty());
        world.assert_invariants();
    }

    #[test]
    fn loyal_prisoner_refuses_and_nothing_changes() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        let prison = s.city("Yizhou", shu.faction).id();
        s.city("Xuchang", wei.faction);
        let captive = s
            .general("Pang De")
            .serve(wei.faction)
            .loyalty(1.0)
            .imprison_in(prison, 0)
            .id();
        let mut world = s.build();
        let mut rng = SmallRng::seed_from_u64(0);

        let result = persuade(&mut world, &mut rng, prison, captive).unwrap();

        assert_eq!(result.outcome, PersuadeOutcome::Refused);
        assert_eq!(world.general(captive).faction, Some(wei.faction));
        assert!(world.city(prison).prisoner(captive).is_some());
    }

    #[test]
    fn own_and_unaffiliated_prisoners_join_freely() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let prison = s.city("Yizhou", shu.faction).id();
        let own = s
            .general("Wei Yan")
            .serve(shu.faction)
            .loyalty(1.0)
            .imprison_in(prison, 0)
            .id();
        let stray = s.general("Ma Dai").loyalty(1.0).imprison_in(prison, 0).id();
        let mut world = s.build();
        let mut rng = SmallRng::seed_from_u64(0);

        for g in [own, stray] {
            let result = persuade(&mut world, &mut rng, prison, g).unwrap();
            assert_eq!(result.outcome, PersuadeOutcome::Joined);
            assert_eq!(world.general(g).faction, Some(shu.faction));
        }
        assert_eq!(
            persuade(&mut world, &mut rng, prison, own),
            Err(ActionError::NoPrisoners { city: prison })
        );
        world.assert_invariants();
    }

    #[test]
    fn captivity_system_only_visits_prisons() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        let prison = s.city("Yizhou", shu.faction).id();
        s.city("Hanzhong", shu.faction);
        s.city("Xuchang", wei.faction);
        s.general("Xu Huang").serve(wei.faction).imprison_in(prison, 0);
        let mut world = s.build();

        let report = crate::testutil::tick_system(&mut world, &mut CaptivitySystem, 0);

        assert_eq!(report.escapes.len(), 1);
        assert_eq!(report.escapes[0].city, prison);
        assert_eq!(report.escapes[0].log, "No escapes.");
    }
}
