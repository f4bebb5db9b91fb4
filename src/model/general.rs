use serde::{Deserialize, Serialize};

use crate::id::{FactionId, GeneralId};

/// Upper bound on the soldiers a single general can command.
pub const MAX_SOLDIERS: u32 = 1000;

const MIN_SALARY: f64 = 50.0;
const MAX_SALARY: f64 = 100.0;

/// An individual commander.
///
/// `faction` is a weak back-reference: membership is owned by
/// [`Faction::generals`](super::Faction::generals) and both edges are kept in
/// step by [`World`](super::World).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct General {
    pub id: GeneralId,
    pub name: String,
    pub leadership: u8,
    pub martial: u8,
    pub intellect: u8,
    pub politics: u8,
    /// Resistance to persuasion, 0.0-1.0.
    pub loyalty: f64,
    /// Hidden; fixed at creation. Drives salary.
    #[serde(skip_serializing, default)]
    pub greed: f64,
    pub faction: Option<FactionId>,
    pub army: u32,
}

impl General {
    /// Monthly salary: 50 at greed 0, 100 at greed 1.
    pub fn salary(&self) -> f64 {
        MIN_SALARY + (MAX_SALARY - MIN_SALARY) * self.greed
    }

    /// Soldiers still missing to a full army.
    pub fn recruit_capacity(&self) -> u32 {
        MAX_SOLDIERS.saturating_sub(self.army)
    }

    pub fn is_full_strength(&self) -> bool {
        self.army >= MAX_SOLDIERS
    }
}

/// Ability scores and temperament used to create a general.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralProfile {
    pub name: String,
    pub leadership: u8,
    pub martial: u8,
    pub intellect: u8,
    pub politics: u8,
    pub loyalty: f64,
    #[serde(default)]
    pub greed: Option<f64>,
}

impl GeneralProfile {
    pub fn new(name: &str, leadership: u8, martial: u8, intellect: u8, politics: u8) -> Self {
        Self {
            name: name.to_string(),
            leadership,
            martial,
            intellect,
            politics,
            loyalty: 0.5,
            greed: None,
        }
    }
}
