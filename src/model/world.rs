use std::collections::{BTreeMap, BTreeSet};

use super::city::{City, MAX_PROGRESS};
use super::faction::Faction;
use super::general::{General, GeneralProfile, MAX_SOLDIERS};
use crate::error::InvariantViolation;
use crate::id::{CityId, FactionId, GeneralId, IdGenerator};

/// Arena holding every faction, general and city.
///
/// Ownership edges are stored as identifier sets on both ends. All mutators
/// that touch an edge update both ends so the two never disagree.
#[derive(Debug, Default)]
pub struct World {
    pub factions: BTreeMap<FactionId, Faction>,
    pub generals: BTreeMap<GeneralId, General>,
    pub cities: BTreeMap<CityId, City>,
    pub id_gen: IdGenerator,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Creation ---

    /// Add an unaffiliated general with no soldiers.
    pub fn add_general(&mut self, profile: &GeneralProfile, greed: f64) -> GeneralId {
        let id = GeneralId(self.id_gen.next_id());
        let general = General {
            id,
            name: profile.name.clone(),
            leadership: profile.leadership.min(100),
            martial: profile.martial.min(100),
            intellect: profile.intellect.min(100),
            politics: profile.politics.min(100),
            loyalty: profile.loyalty.clamp(0.0, 1.0),
            greed: greed.clamp(0.0, 1.0),
            faction: None,
            army: 0,
        };
        self.generals.insert(id, general);
        id
    }

    /// Found a faction around `ruler`, who joins it immediately.
    ///
    /// # Panics
    /// Panics if `ruler` does not exist or already serves a faction.
    pub fn add_faction(&mut self, name: &str, ruler: GeneralId) -> FactionId {
        assert!(
            self.general(ruler).faction.is_none(),
            "add_faction: ruler {ruler} already serves a faction"
        );
        let id = FactionId(self.id_gen.next_id());
        self.factions.insert(
            id,
            Faction {
                id,
                name: name.to_string(),
                ruler,
                generals: BTreeSet::new(),
                cities: BTreeSet::new(),
            },
        );
        self.enlist(ruler, id);
        id
    }

    /// # Panics
    /// Panics if `owner` does not exist.
    pub fn add_city(&mut self, name: &str, food: u32, gold: u32, owner: FactionId) -> CityId {
        let id = CityId(self.id_gen.next_id());
        self.cities.insert(id, City::new(id, name, food, gold, owner));
        self.faction_mut(owner).cities.insert(id);
        id
    }

    /// Link two cities with an undirected edge.
    pub fn connect(&mut self, a: CityId, b: CityId) {
        if a == b {
            return;
        }
        let city_a = self.city_mut(a);
        if !city_a.neighbors.contains(&b) {
            city_a.neighbors.push(b);
        }
        let city_b = self.city_mut(b);
        if !city_b.neighbors.contains(&a) {
            city_b.neighbors.push(a);
        }
    }

    // --- Lookup ---

    /// # Panics
    /// Panics if the general does not exist; IDs are never reused or removed.
    pub fn general(&self, id: GeneralId) -> &General {
        self.generals
            .get(&id)
            .unwrap_or_else(|| panic!("general {id} not found"))
    }

    pub fn general_mut(&mut self, id: GeneralId) -> &mut General {
        self.generals
            .get_mut(&id)
            .unwrap_or_else(|| panic!("general {id} not found"))
    }

    pub fn city(&self, id: CityId) -> &City {
        self.cities
            .get(&id)
            .unwrap_or_else(|| panic!("city {id} not found"))
    }

    pub fn city_mut(&mut self, id: CityId) -> &mut City {
        self.cities
            .get_mut(&id)
            .unwrap_or_else(|| panic!("city {id} not found"))
    }

    pub fn faction(&self, id: FactionId) -> &Faction {
        self.factions
            .get(&id)
            .unwrap_or_else(|| panic!("faction {id} not found"))
    }

    pub fn faction_mut(&mut self, id: FactionId) -> &mut Faction {
        self.factions
            .get_mut(&id)
            .unwrap_or_else(|| panic!("faction {id} not found"))
    }

    pub fn general_name(&self, id: GeneralId) -> &str {
        &self.general(id).name
    }

    pub fn city_name(&self, id: CityId) -> &str {
        &self.city(id).name
    }

    pub fn faction_name(&self, id: FactionId) -> &str {
        &self.faction(id).name
    }

    // --- Membership edges ---

    /// Make `general` serve `faction`, leaving any previous faction.
    pub fn enlist(&mut self, general: GeneralId, faction: FactionId) {
        self.discharge(general);
        self.faction_mut(faction).generals.insert(general);
        self.general_mut(general).faction = Some(faction);
    }

    /// Strip `general` of its faction, if any.
    pub fn discharge(&mut self, general: GeneralId) {
        if let Some(old) = self.general_mut(general).faction.take() {
            self.faction_mut(old).generals.remove(&general);
        }
    }

    /// Re-own `city`. Officer assignments are cleared.
    pub fn transfer_city(&mut self, city: CityId, to: FactionId) {
        let from = self.city(city).owner;
        self.faction_mut(from).cities.remove(&city);
        self.faction_mut(to).cities.insert(city);
        let c = self.city_mut(city);
        c.owner = to;
        c.clear_officers();
    }

    /// Move a resident from one roster to another.
    pub fn relocate(&mut self, general: GeneralId, from: CityId, to: CityId) {
        self.city_mut(from).remove_resident(general);
        self.city_mut(to).add_resident(general);
    }

    // --- Queries ---

    pub fn is_ruler(&self, general: GeneralId) -> bool {
        self.general(general)
            .faction
            .is_some_and(|f| self.faction(f).ruler == general)
    }

    /// Total soldiers among a city's residents.
    pub fn city_army(&self, city: CityId) -> u32 {
        self.city(city)
            .generals
            .iter()
            .map(|&g| self.general(g).army)
            .sum()
    }

    /// Adjacent cities owned by another faction, in adjacency order.
    pub fn hostile_neighbors(&self, city: CityId) -> Vec<CityId> {
        let c = self.city(city);
        c.neighbors
            .iter()
            .copied()
            .filter(|&n| self.city(n).owner != c.owner)
            .collect()
    }

    pub fn is_border_city(&self, city: CityId) -> bool {
        !self.hostile_neighbors(city).is_empty()
    }

    pub fn faction_cities(&self, faction: FactionId) -> Vec<CityId> {
        self.faction(faction).cities.iter().copied().collect()
    }

    /// Factions still holding at least one city.
    pub fn standing_factions(&self) -> Vec<FactionId> {
        self.factions
            .values()
            .filter(|f| !f.is_eliminated())
            .map(|f| f.id)
            .collect()
    }

    /// The city whose roster lists `general`, if any.
    pub fn station_of(&self, general: GeneralId) -> Option<CityId> {
        self.cities
            .values()
            .find(|c| c.is_resident(general))
            .map(|c| c.id)
    }

    // --- Invariants ---

    /// Check every Entity Model invariant, returning the first violation.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for g in self.generals.values() {
            if g.army > MAX_SOLDIERS {
                return Err(InvariantViolation::ArmyOverCap {
                    general: g.id,
                    army: g.army,
                });
            }
            if let Some(f) = g.faction {
                let listed = self
                    .factions
                    .get(&f)
                    .is_some_and(|fac| fac.generals.contains(&g.id));
                if !listed {
                    return Err(InvariantViolation::BrokenFactionEdge {
                        general: g.id,
                        faction: f,
                    });
                }
            }
        }

        for f in self.factions.values() {
            for &g in &f.generals {
                if self.generals.get(&g).and_then(|x| x.faction) != Some(f.id) {
                    return Err(InvariantViolation::BrokenMemberEdge {
                        faction: f.id,
                        general: g,
                    });
                }
            }
            for &c in &f.cities {
                if self.cities.get(&c).map(|x| x.owner) != Some(f.id) {
                    return Err(InvariantViolation::ForeignCity {
                        faction: f.id,
                        city: c,
                    });
                }
            }
            if f.cities.is_empty() && !f.generals.is_empty() {
                return Err(InvariantViolation::EliminatedWithGenerals { faction: f.id });
            }
        }

        let mut placed: BTreeSet<GeneralId> = BTreeSet::new();
        for c in self.cities.values() {
            let owner_lists_city = self
                .factions
                .get(&c.owner)
                .is_some_and(|f| f.cities.contains(&c.id));
            if !owner_lists_city {
                return Err(InvariantViolation::BrokenCityEdge {
                    city: c.id,
                    owner: c.owner,
                });
            }
            for officer in [c.officer_commerce, c.officer_agriculture].into_iter().flatten() {
                if !c.is_resident(officer) {
                    return Err(InvariantViolation::NonResidentOfficer {
                        general: officer,
                        city: c.id,
                    });
                }
            }
            if let Some(both) = c.officer_commerce.filter(|&g| c.officer_agriculture == Some(g)) {
                return Err(InvariantViolation::DoubleOffice {
                    general: both,
                    city: c.id,
                });
            }
            if !(0.0..=MAX_PROGRESS).contains(&c.commerce_progress)
                || !(0.0..=MAX_PROGRESS).contains(&c.agriculture_progress)
            {
                return Err(InvariantViolation::ProgressOutOfRange { city: c.id });
            }
            for &n in &c.neighbors {
                if !self.cities.get(&n).is_some_and(|x| x.neighbors.contains(&c.id)) {
                    return Err(InvariantViolation::AsymmetricEdge { a: c.id, b: n });
                }
            }
            let everyone = c
                .generals
                .iter()
                .chain(c.wild_generals.iter())
                .chain(c.prisoners.iter().map(|p| &p.general));
            for &g in everyone {
                if !placed.insert(g) {
                    return Err(InvariantViolation::DuplicatePlacement { general: g });
                }
            }
        }

        Ok(())
    }

    /// # Panics
    /// Panics with the first violated invariant.
    pub fn assert_invariants(&self) {
        if let Err(violation) = self.validate() {
            panic!("world invariant violated: {violation}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_city_world() -> (World, FactionId, GeneralId, CityId, CityId) {
        let mut world = World::new();
        let ruler = world.add_general(&GeneralProfile::new("Cao Cao", 90, 70, 90, 90), 0.2);
        let wei = world.add_faction("Wei", ruler);
        let a = world.add_city("Xuchang", 1000, 800, wei);
        let b = world.add_city("Chenliu", 900, 600, wei);
        world.connect(a, b);
        world.city_mut(a).add_resident(ruler);
        (world, wei, ruler, a, b)
    }

    #[test]
    fn founding_a_faction_enlists_ruler() {
        let (world, wei, ruler, _, _) = two_city_world();
        assert_eq!(world.general(ruler).faction, Some(wei));
        assert!(world.faction(wei).generals.contains(&ruler));
        assert!(world.is_ruler(ruler));
        world.assert_invariants();
    }

    #[test]
    fn connect_is_undirected_and_idempotent() {
        let (mut world, _, _, a, b) = two_city_world();
        world.connect(b, a);
        assert_eq!(world.city(a).neighbors, vec![b]);
        assert_eq!(world.city(b).neighbors, vec![a]);
    }

    #[test]
    fn enlist_moves_between_factions() {
        let (mut world, wei, _, _, _) = two_city_world();
        let liu = world.add_general(&GeneralProfile::new("Liu Bei", 80, 70, 75, 80), 0.1);
        let shu = world.add_faction("Shu", liu);
        let g = world.add_general(&GeneralProfile::new("Zhang Liao", 90, 92, 70, 55), 0.1);
        world.enlist(g, wei);
        world.enlist(g, shu);
        assert!(!world.faction(wei).generals.contains(&g));
        assert!(world.faction(shu).generals.contains(&g));
        world.discharge(g);
        assert_eq!(world.general(g).faction, None);
        assert!(!world.faction(shu).generals.contains(&g));
    }

    #[test]
    fn transfer_city_clears_officers_and_moves_edge() {
        let (mut world, wei, ruler, a, b) = two_city_world();
        let liu = world.add_general(&GeneralProfile::new("Liu Bei", 80, 70, 75, 80), 0.1);
        let shu = world.add_faction("Shu", liu);
        world.city_mut(a).officer_commerce = Some(ruler);
        world.transfer_city(a, shu);
        assert_eq!(world.city(a).owner, shu);
        assert_eq!(world.city(a).officer_commerce, None);
        assert!(world.faction(shu).cities.contains(&a));
        assert!(!world.faction(wei).cities.contains(&a));
        assert_eq!(world.hostile_neighbors(b), vec![a]);
        assert!(world.is_border_city(b));
    }

    #[test]
    fn validate_catches_double_office() {
        let (mut world, _, ruler, a, _) = two_city_world();
        world.city_mut(a).officer_commerce = Some(ruler);
        world.city_mut(a).officer_agriculture = Some(ruler);
        assert_eq!(
            world.validate(),
            Err(InvariantViolation::DoubleOffice {
                general: ruler,
                city: a
            })
        );
    }

    #[test]
    fn validate_catches_duplicate_placement() {
        let (mut world, _, ruler, _, b) = two_city_world();
        world.city_mut(b).take_prisoner(ruler);
        assert_eq!(
            world.validate(),
            Err(InvariantViolation::DuplicatePlacement { general: ruler })
        );
    }

    #[test]
    fn validate_catches_broken_back_reference() {
        let (mut world, wei, ruler, _, _) = two_city_world();
        world.general_mut(ruler).faction = None;
        assert_eq!(
            world.validate(),
            Err(InvariantViolation::BrokenMemberEdge {
                faction: wei,
                general: ruler
            })
        );
    }

    #[test]
    fn city_army_sums_residents() {
        let (mut world, wei, ruler, a, _) = two_city_world();
        let g = world.add_general(&GeneralProfile::new("Xu Huang", 80, 85, 60, 50), 0.1);
        world.enlist(g, wei);
        world.city_mut(a).add_resident(g);
        world.general_mut(ruler).army = 700;
        world.general_mut(g).army = 450;
        assert_eq!(world.city_army(a), 1150);
        assert_eq!(world.station_of(g), Some(a));
    }
}
