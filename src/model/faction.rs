use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{CityId, FactionId, GeneralId};

/// A political power owning cities and commanding generals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    /// Always also a member of `generals` while the faction stands.
    pub ruler: GeneralId,
    pub generals: BTreeSet<GeneralId>,
    pub cities: BTreeSet<CityId>,
}

impl Faction {
    /// A faction with no cities is out of the game.
    pub fn is_eliminated(&self) -> bool {
        self.cities.is_empty()
    }
}
