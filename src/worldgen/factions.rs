use std::collections::BTreeMap;

use rand::{Rng, RngCore};

use super::dataset::{DatasetError, FactionEntry};
use crate::id::{FactionId, GeneralId};
use crate::model::{GeneralProfile, World};

const GREED_MIN: f64 = 0.05;
const GREED_MAX: f64 = 0.3;

const VETERAN_MARTIAL: u8 = 80;
const VETERAN_ARMY: (u32, u32) = (800, 1000);
const RECRUIT_ARMY: (u32, u32) = (500, 800);

/// Name lookups built while populating the world.
#[derive(Debug, Default)]
pub struct Registry {
    pub factions: BTreeMap<String, FactionId>,
    pub generals: BTreeMap<String, GeneralId>,
}

impl Registry {
    pub fn add_general(
        &mut self,
        world: &mut World,
        profile: &GeneralProfile,
        rng: &mut dyn RngCore,
    ) -> Result<GeneralId, DatasetError> {
        if self.generals.contains_key(&profile.name) {
            return Err(DatasetError::DuplicateName(profile.name.clone()));
        }
        let greed = profile.greed.unwrap_or_else(|| draw_greed(rng));
        let id = world.add_general(profile, greed);
        self.generals.insert(profile.name.clone(), id);
        Ok(id)
    }
}

/// Greed for generals the dataset leaves unspecified, to three decimals.
pub fn draw_greed(rng: &mut dyn RngCore) -> f64 {
    (rng.random_range(GREED_MIN..=GREED_MAX) * 1000.0).round() / 1000.0
}

/// Create each faction with its ruler and generals. Nobody is stationed yet.
pub fn generate_factions(
    world: &mut World,
    entries: &[FactionEntry],
    registry: &mut Registry,
    rng: &mut dyn RngCore,
) -> Result<(), DatasetError> {
    for entry in entries {
        if registry.factions.contains_key(&entry.name) {
            return Err(DatasetError::DuplicateName(entry.name.clone()));
        }
        let ruler = registry.add_general(world, &entry.ruler, rng)?;
        let faction = world.add_faction(&entry.name, ruler);
        registry.factions.insert(entry.name.clone(), faction);

        for profile in &entry.generals {
            let general = registry.add_general(world, profile, rng)?;
            world.enlist(general, faction);
        }
    }
    Ok(())
}

/// Hand out starting soldiers to the non-ruler generals of mustering
/// factions: 800-1000 for strong fighters, 500-800 for the rest.
pub fn muster_armies(
    world: &mut World,
    entries: &[FactionEntry],
    registry: &Registry,
    rng: &mut dyn RngCore,
) {
    for entry in entries.iter().filter(|e| e.muster) {
        for profile in &entry.generals {
            let Some(&id) = registry.generals.get(&profile.name) else {
                continue;
            };
            let (lo, hi) = if profile.martial >= VETERAN_MARTIAL {
                VETERAN_ARMY
            } else {
                RECRUIT_ARMY
            };
            world.general_mut(id).army = rng.random_range(lo..=hi);
        }
    }
}
