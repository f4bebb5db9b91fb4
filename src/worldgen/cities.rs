use std::collections::{BTreeMap, BTreeSet};

use rand::RngCore;

use super::dataset::{CityEntry, DatasetError};
use super::factions::Registry;
use crate::id::{CityId, GeneralId};
use crate::model::World;
use crate::sim::helpers;

/// Found every city and station its roster. Returns cities by name.
pub fn generate_cities(
    world: &mut World,
    entries: &[CityEntry],
    registry: &Registry,
) -> Result<BTreeMap<String, CityId>, DatasetError> {
    let mut by_name = BTreeMap::new();
    let mut stationed = BTreeSet::new();

    for entry in entries {
        if by_name.contains_key(&entry.name) {
            return Err(DatasetError::DuplicateName(entry.name.clone()));
        }
        let Some(&owner) = registry.factions.get(&entry.owner) else {
            return Err(DatasetError::UnknownFaction {
                city: entry.name.clone(),
                faction: entry.owner.clone(),
            });
        };
        let city = world.add_city(&entry.name, entry.food, entry.gold, owner);
        by_name.insert(entry.name.clone(), city);

        for name in &entry.roster {
            let Some(&general) = registry.generals.get(name) else {
                return Err(DatasetError::UnknownGeneral {
                    city: entry.name.clone(),
                    general: name.clone(),
                });
            };
            if world.general(general).faction != Some(owner) {
                return Err(DatasetError::ForeignGeneral {
                    city: entry.name.clone(),
                    general: name.clone(),
                });
            }
            if !stationed.insert(general) {
                return Err(DatasetError::DoublyStationed(name.clone()));
            }
            world.city_mut(city).add_resident(general);
        }
    }

    for (name, &general) in &registry.generals {
        if world.general(general).faction.is_some() && !stationed.contains(&general) {
            return Err(DatasetError::Unstationed(name.clone()));
        }
    }
    Ok(by_name)
}

pub fn connect_roads(
    world: &mut World,
    edges: &[(String, String)],
    cities: &BTreeMap<String, CityId>,
) -> Result<(), DatasetError> {
    for (a, b) in edges {
        let lookup = |name: &String| {
            cities
                .get(name)
                .copied()
                .ok_or_else(|| DatasetError::UnknownCity(name.clone()))
        };
        world.connect(lookup(a)?, lookup(b)?);
    }
    Ok(())
}

/// Put each unaffiliated general in the wild pool of a random city.
pub fn scatter_wild_generals(
    world: &mut World,
    wild: &[GeneralId],
    rng: &mut dyn RngCore,
) -> Result<(), DatasetError> {
    let cities: Vec<CityId> = world.cities.keys().copied().collect();
    for &general in wild {
        let city = helpers::pick(rng, &cities).ok_or(DatasetError::NoCities)?;
        world.city_mut(city).wild_generals.push(general);
    }
    Ok(())
}
