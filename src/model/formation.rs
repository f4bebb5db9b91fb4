use std::fmt;

use serde::{Deserialize, Serialize};

/// Tactical stance an army takes for one pairing.
///
/// Counters form a cycle: vanguard beats ranged, ranged beats defensive,
/// defensive beats vanguard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Formation {
    Ranged,
    Vanguard,
    Defensive,
}

impl Formation {
    pub const ALL: [Formation; 3] = [Formation::Ranged, Formation::Vanguard, Formation::Defensive];

    pub fn as_str(self) -> &'static str {
        match self {
            Formation::Ranged => "ranged",
            Formation::Vanguard => "vanguard",
            Formation::Defensive => "defensive",
        }
    }

    pub fn attack_multiplier(self) -> f64 {
        match self {
            Formation::Ranged => 1.2,
            Formation::Vanguard => 1.5,
            Formation::Defensive => 0.7,
        }
    }

    pub fn defense_multiplier(self) -> f64 {
        match self {
            Formation::Ranged => 1.0,
            Formation::Vanguard => 0.7,
            Formation::Defensive => 1.3,
        }
    }

    /// Whether this formation counters `other`.
    pub fn counters(self, other: Formation) -> bool {
        matches!(
            (self, other),
            (Formation::Vanguard, Formation::Ranged)
                | (Formation::Ranged, Formation::Defensive)
                | (Formation::Defensive, Formation::Vanguard)
        )
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Formation> for String {
    fn from(v: Formation) -> Self {
        v.as_str().to_string()
    }
}

impl TryFrom<String> for Formation {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Formation::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown formation: {s}"))
    }
}
