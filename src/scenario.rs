use crate::id::{CityId, FactionId, GeneralId};
use crate::model::{GeneralProfile, Prisoner, World};

const DEFAULT_STAT: u8 = 50;
const DEFAULT_RULER_STAT: u8 = 80;
const DEFAULT_FOOD: u32 = 1000;
const DEFAULT_GOLD: u32 = 1000;

/// IDs returned by [`Scenario::faction`].
#[derive(Debug, Clone, Copy)]
pub struct FactionSetup {
    pub faction: FactionId,
    pub ruler: GeneralId,
}

// -- Builder-style ref types --

/// Typed reference to a city in a [`Scenario`], enabling chained field mutation.
///
/// Created by [`Scenario::city`] (creation) or [`Scenario::city_mut`] (mutation).
/// Call [`.id()`](CityRef::id) to terminate the chain and extract the ID.
pub struct CityRef<'a> {
    scenario: &'a mut Scenario,
    id: CityId,
}

impl<'a> CityRef<'a> {
    fn with_city(self, f: impl FnOnce(&mut crate::model::City)) -> Self {
        f(self.scenario.world.city_mut(self.id));
        self
    }

    pub fn food(self, v: u32) -> Self { self.with_city(|c| c.food = v) }
    pub fn gold(self, v: u32) -> Self { self.with_city(|c| c.gold = v) }
    pub fn commerce_progress(self, v: f64) -> Self { self.with_city(|c| c.commerce_progress = v) }
    pub fn agriculture_progress(self, v: f64) -> Self { self.with_city(|c| c.agriculture_progress = v) }

    /// The appointee must already be stationed here.
    pub fn officer_commerce(self, g: GeneralId) -> Self { self.with_city(|c| c.officer_commerce = Some(g)) }
    pub fn officer_agriculture(self, g: GeneralId) -> Self { self.with_city(|c| c.officer_agriculture = Some(g)) }

    /// Terminate the chain and return the city ID.
    pub fn id(self) -> CityId { self.id }
}

/// Typed reference to a general in a [`Scenario`], enabling chained field mutation.
///
/// Created by [`Scenario::general`] (creation) or [`Scenario::general_mut`] (mutation).
pub struct GeneralRef<'a> {
    scenario: &'a mut Scenario,
    id: GeneralId,
}

impl<'a> GeneralRef<'a> {
    fn with_general(self, f: impl FnOnce(&mut crate::model::General)) -> Self {
        f(self.scenario.world.general_mut(self.id));
        self
    }

    pub fn leadership(self, v: u8) -> Self { self.with_general(|g| g.leadership = v) }
    pub fn martial(self, v: u8) -> Self { self.with_general(|g| g.martial = v) }
    pub fn intellect(self, v: u8) -> Self { self.with_general(|g| g.intellect = v) }
    pub fn politics(self, v: u8) -> Self { self.with_general(|g| g.politics = v) }
    pub fn loyalty(self, v: f64) -> Self { self.with_general(|g| g.loyalty = v) }
    pub fn greed(self, v: f64) -> Self { self.with_general(|g| g.greed = v) }
    pub fn army(self, v: u32) -> Self { self.with_general(|g| g.army = v) }

    pub fn stats(self, leadership: u8, martial: u8, intellect: u8, politics: u8) -> Self {
        self.with_general(|g| {
            g.leadership = leadership;
            g.martial = martial;
            g.intellect = intellect;
            g.politics = politics;
        })
    }

    /// Join `faction`, leaving any previous one.
    pub fn serve(self, faction: FactionId) -> Self {
        self.scenario.world.enlist(self.id, faction);
        self
    }

    /// Station in `city`, leaving any previous roster.
    pub fn station(self, city: CityId) -> Self {
        let world = &mut self.scenario.world;
        if let Some(current) = world.station_of(self.id) {
            world.city_mut(current).remove_resident(self.id);
        }
        world.city_mut(city).add_resident(self.id);
        self
    }

    /// Place in the wild pool of `city`.
    pub fn wild_in(self, city: CityId) -> Self {
        self.scenario.world.city_mut(city).wild_generals.push(self.id);
        self
    }

    /// Hold prisoner in `city` for `turns_held` turns so far.
    pub fn imprison_in(self, city: CityId, turns_held: u32) -> Self {
        self.scenario.world.city_mut(city).prisoners.push(Prisoner {
            general: self.id,
            turns_held,
        });
        self
    }

    /// Terminate the chain and return the general ID.
    pub fn id(self) -> GeneralId { self.id }
}

/// Fluent builder for hand-made worlds.
///
/// Nothing is validated on [`build`](Scenario::build): tests that need a
/// consistent world call [`World::assert_invariants`] themselves, and tests
/// of edge cases can set up states the engine would never produce.
pub struct Scenario {
    world: World,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self { world: World::new() }
    }

    // -- Entity creation --

    /// Found a faction. The ruler has every stat at 80, full loyalty, no
    /// greed, no soldiers, and is not stationed anywhere.
    pub fn faction(&mut self, name: &str, ruler_name: &str) -> FactionSetup {
        let mut profile = GeneralProfile::new(
            ruler_name,
            DEFAULT_RULER_STAT,
            DEFAULT_RULER_STAT,
            DEFAULT_RULER_STAT,
            DEFAULT_RULER_STAT,
        );
        profile.loyalty = 1.0;
        let ruler = self.world.add_general(&profile, 0.0);
        let faction = self.world.add_faction(name, ruler);
        FactionSetup { faction, ruler }
    }

    /// Add a city with 1000 food and 1000 gold.
    pub fn city(&mut self, name: &str, owner: FactionId) -> CityRef<'_> {
        let id = self.world.add_city(name, DEFAULT_FOOD, DEFAULT_GOLD, owner);
        CityRef { scenario: self, id }
    }

    pub fn city_mut(&mut self, id: CityId) -> CityRef<'_> {
        CityRef { scenario: self, id }
    }

    /// Add an unaffiliated, unplaced general with every stat at 50.
    pub fn general(&mut self, name: &str) -> GeneralRef<'_> {
        let profile = GeneralProfile::new(name, DEFAULT_STAT, DEFAULT_STAT, DEFAULT_STAT, DEFAULT_STAT);
        let id = self.world.add_general(&profile, 0.0);
        GeneralRef { scenario: self, id }
    }

    pub fn general_mut(&mut self, id: GeneralId) -> GeneralRef<'_> {
        GeneralRef { scenario: self, id }
    }

    /// Connect two cities by road.
    pub fn link(&mut self, a: CityId, b: CityId) {
        self.world.connect(a, b);
    }

    // -- Finishing --

    pub fn build(self) -> World {
        self.world
    }

    /// Borrow the world for inspection.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Borrow the world mutably for additional modifications.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
