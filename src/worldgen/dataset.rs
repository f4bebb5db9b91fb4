//! Static scenario data: factions, generals, cities and roads.

use serde::Deserialize;
use thiserror::Error;

use crate::model::GeneralProfile;

pub const REFERENCE_DATASET: &str = include_str!("reference.json");

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub factions: Vec<FactionEntry>,
    #[serde(default)]
    pub wild_generals: Vec<GeneralProfile>,
    pub cities: Vec<CityEntry>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactionEntry {
    pub name: String,
    pub ruler: GeneralProfile,
    /// Whether the faction's generals start with soldiers.
    #[serde(default = "default_muster")]
    pub muster: bool,
    #[serde(default)]
    pub generals: Vec<GeneralProfile>,
}

fn default_muster() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityEntry {
    pub name: String,
    pub food: u32,
    pub gold: u32,
    pub owner: String,
    /// Names of the owner's generals stationed here.
    #[serde(default)]
    pub roster: Vec<String>,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("name {0:?} is used twice")]
    DuplicateName(String),
    #[error("city {city:?} is owned by unknown faction {faction:?}")]
    UnknownFaction { city: String, faction: String },
    #[error("city {city:?} lists unknown general {general:?}")]
    UnknownGeneral { city: String, general: String },
    #[error("city {city:?} lists {general:?}, who serves another faction")]
    ForeignGeneral { city: String, general: String },
    #[error("general {0:?} is stationed in more than one city")]
    DoublyStationed(String),
    #[error("general {0:?} serves a faction but is stationed nowhere")]
    Unstationed(String),
    #[error("road references unknown city {0:?}")]
    UnknownCity(String),
    #[error("wild generals need at least one city")]
    NoCities,
}

impl Dataset {
    pub fn parse(source: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn reference() -> Result<Self, DatasetError> {
        Self::parse(REFERENCE_DATASET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_dataset_parses() {
        let data = Dataset::reference().unwrap();
        assert_eq!(data.factions.len(), 3);
        assert_eq!(data.cities.len(), 9);
        assert_eq!(data.edges.len(), 9);
        assert!(!data.wild_generals.is_empty());
        let wei = data.factions.iter().find(|f| f.name == "Wei").unwrap();
        assert!(!wei.muster);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            Dataset::parse("{\"factions\": 3}"),
            Err(DatasetError::Parse(_))
        ));
    }
}
