use serde::{Deserialize, Serialize};

use crate::id::{CityId, FactionId, GeneralId};

pub const PROGRESS_PER_LEVEL: f64 = 100.0;
pub const MAX_PROGRESS: f64 = 500.0;

/// A captured general and how many turns it has been held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prisoner {
    pub general: GeneralId,
    pub turns_held: u32,
}

/// A settlement with stocks, a resident roster, and adjacency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub food: u32,
    pub gold: u32,
    pub owner: FactionId,
    /// Resident generals, in arrival order. Food is consumed in this order.
    pub generals: Vec<GeneralId>,
    pub commerce_progress: f64,
    pub agriculture_progress: f64,
    pub officer_commerce: Option<GeneralId>,
    pub officer_agriculture: Option<GeneralId>,
    pub wild_generals: Vec<GeneralId>,
    pub prisoners: Vec<Prisoner>,
    pub neighbors: Vec<CityId>,
}

impl City {
    pub fn new(id: CityId, name: &str, food: u32, gold: u32, owner: FactionId) -> Self {
        Self {
            id,
            name: name.to_string(),
            food,
            gold,
            owner,
            generals: Vec::new(),
            commerce_progress: 0.0,
            agriculture_progress: 0.0,
            officer_commerce: None,
            officer_agriculture: None,
            wild_generals: Vec::new(),
            prisoners: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    pub fn commerce_level(&self) -> u32 {
        progress_level(self.commerce_progress)
    }

    pub fn agriculture_level(&self) -> u32 {
        progress_level(self.agriculture_progress)
    }

    pub fn is_resident(&self, general: GeneralId) -> bool {
        self.generals.contains(&general)
    }

    pub fn prisoner(&self, general: GeneralId) -> Option<&Prisoner> {
        self.prisoners.iter().find(|p| p.general == general)
    }

    /// Drop a general from the roster, vacating any office held there.
    pub fn remove_resident(&mut self, general: GeneralId) {
        self.generals.retain(|&g| g != general);
        if self.officer_agriculture == Some(general) {
            self.officer_agriculture = None;
        }
        if self.officer_commerce == Some(general) {
            self.officer_commerce = None;
        }
    }

    pub fn add_resident(&mut self, general: GeneralId) {
        if !self.generals.contains(&general) {
            self.generals.push(general);
        }
    }

    pub fn take_prisoner(&mut self, general: GeneralId) {
        self.prisoners.push(Prisoner {
            general,
            turns_held: 0,
        });
    }

    pub fn release_prisoner(&mut self, general: GeneralId) {
        self.prisoners.retain(|p| p.general != general);
    }

    pub fn clear_officers(&mut self) {
        self.officer_commerce = None;
        self.officer_agriculture = None;
    }
}

fn progress_level(progress: f64) -> u32 {
    (progress / PROGRESS_PER_LEVEL).floor().max(0.0) as u32
}
