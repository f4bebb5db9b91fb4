//! Read-only views of the world for presentation layers.

use serde::Serialize;

use super::World;
use crate::id::{CityId, FactionId, GeneralId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralSnapshot {
    pub id: GeneralId,
    pub name: String,
    pub leadership: u8,
    pub martial: u8,
    pub intellect: u8,
    pub politics: u8,
    pub loyalty: f64,
    pub army: u32,
    pub faction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrisonerSnapshot {
    pub general: GeneralSnapshot,
    pub turns_held: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySnapshot {
    pub id: CityId,
    pub name: String,
    pub owner: String,
    pub food: u32,
    pub gold: u32,
    pub commerce_level: u32,
    pub agriculture_level: u32,
    pub commerce_progress: f64,
    pub agriculture_progress: f64,
    pub officer_commerce: Option<String>,
    pub officer_agriculture: Option<String>,
    pub total_army: u32,
    pub generals: Vec<GeneralSnapshot>,
    pub prisoners: Vec<PrisonerSnapshot>,
    pub neighbors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactionSnapshot {
    pub id: FactionId,
    pub name: String,
    pub ruler: String,
    pub cities: Vec<String>,
    pub generals: Vec<String>,
    pub eliminated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub factions: Vec<FactionSnapshot>,
    pub cities: Vec<CitySnapshot>,
}

impl World {
    pub fn general_snapshot(&self, id: GeneralId) -> GeneralSnapshot {
        let g = self.general(id);
        GeneralSnapshot {
            id,
            name: g.name.clone(),
            leadership: g.leadership,
            martial: g.martial,
            intellect: g.intellect,
            politics: g.politics,
            loyalty: g.loyalty,
            army: g.army,
            faction: g.faction.map(|f| self.faction_name(f).to_string()),
        }
    }

    pub fn city_snapshot(&self, id: CityId) -> CitySnapshot {
        let c = self.city(id);
        let name_of = |g: Option<GeneralId>| g.map(|g| self.general_name(g).to_string());
        CitySnapshot {
            id,
            name: c.name.clone(),
            owner: self.faction_name(c.owner).to_string(),
            food: c.food,
            gold: c.gold,
            commerce_level: c.commerce_level(),
            agriculture_level: c.agriculture_level(),
            commerce_progress: c.commerce_progress,
            agriculture_progress: c.agriculture_progress,
            officer_commerce: name_of(c.officer_commerce),
            officer_agriculture: name_of(c.officer_agriculture),
            total_army: self.city_army(id),
            generals: c.generals.iter().map(|&g| self.general_snapshot(g)).collect(),
            prisoners: c
                .prisoners
                .iter()
                .map(|p| PrisonerSnapshot {
                    general: self.general_snapshot(p.general),
                    turns_held: p.turns_held,
                })
                .collect(),
            neighbors: c
                .neighbors
                .iter()
                .map(|&n| self.city_name(n).to_string())
                .collect(),
        }
    }

    pub fn faction_snapshot(&self, id: FactionId) -> FactionSnapshot {
        let f = self.faction(id);
        FactionSnapshot {
            id,
            name: f.name.clone(),
            ruler: self.general_name(f.ruler).to_string(),
            cities: f.cities.iter().map(|&c| self.city_name(c).to_string()).collect(),
            generals: f
                .generals
                .iter()
                .map(|&g| self.general_name(g).to_string())
                .collect(),
            eliminated: f.is_eliminated(),
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            factions: self.factions.keys().map(|&f| self.faction_snapshot(f)).collect(),
            cities: self.cities.keys().map(|&c| self.city_snapshot(c)).collect(),
        }
    }
}
