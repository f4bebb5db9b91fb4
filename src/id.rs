use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic ID generator shared across all entity types.
/// No two factions, generals or cities share an ID.
#[derive(Debug)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_from(start: u64) -> Self {
        Self { next: start }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! typed_id {
    ($name:ident, $prefix:expr) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

typed_id!(FactionId, "faction");
typed_id!(GeneralId, "general");
typed_id!(CityId, "city");
