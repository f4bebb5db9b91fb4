//! Error types surfaced by the engine.
//!
//! [`ActionError`] is recoverable: the requested action is rejected, state is
//! unchanged, and any consumed budget unit is refunded. [`InvariantViolation`]
//! describes a broken Entity Model and is only ever reported by
//! [`World::validate`](crate::model::World::validate); the engine panics on it.

use thiserror::Error;

use crate::id::{CityId, FactionId, GeneralId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no actions remaining this turn")]
    BudgetExhausted,

    // --- Resource insufficiency ---
    #[error("{city} lacks gold: required {required}, available {available}")]
    InsufficientGold {
        city: CityId,
        required: u32,
        available: u32,
    },
    #[error("{city} lacks food: required {required}, available {available}")]
    InsufficientFood {
        city: CityId,
        required: u32,
        available: u32,
    },

    // --- Selection ---
    #[error("{city} does not exist")]
    UnknownCity { city: CityId },
    #[error("{city} is not held by {faction}")]
    CityNotOwned { city: CityId, faction: FactionId },
    #[error("{general} is not stationed in {city}")]
    NotResident { general: GeneralId, city: CityId },
    #[error("{city} holds no prisoners")]
    NoPrisoners { city: CityId },
    #[error("{general} is not held in {city}")]
    NotAPrisoner { general: GeneralId, city: CityId },
    #[error("no eligible general in {city}")]
    NoEligibleGeneral { city: CityId },
    #[error("{target} is not a hostile neighbor of {origin}")]
    InvalidTarget { origin: CityId, target: CityId },
    #[error("{general} cannot hold both offices in {city}")]
    OfficerConflict { general: GeneralId, city: CityId },
    #[error("{from} and {to} must be distinct cities of the same faction")]
    InvalidDestination { from: CityId, to: CityId },
    #[error("nothing selected")]
    EmptySelection,

    // --- Decision protocol ---
    #[error("no decision is pending")]
    NoPendingDecision,
    #[error("a decision is pending; resume it first")]
    DecisionPending,
    #[error("decision does not answer the pending request")]
    InvalidDecision,
    #[error("the game is over")]
    GameOver,
    #[error("no faction is player-controlled")]
    NoPlayerFaction,
}

/// A broken Entity Model invariant. Always a defect in engine logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{general} commands {army} soldiers, above the cap")]
    ArmyOverCap { general: GeneralId, army: u32 },
    #[error("{general} claims {faction} but is not on its roster")]
    BrokenFactionEdge {
        general: GeneralId,
        faction: FactionId,
    },
    #[error("{faction} lists {general} whose back-reference disagrees")]
    BrokenMemberEdge {
        faction: FactionId,
        general: GeneralId,
    },
    #[error("{city} is owned by {owner} but missing from its city set")]
    BrokenCityEdge { city: CityId, owner: FactionId },
    #[error("{faction} lists {city} which it does not own")]
    ForeignCity { faction: FactionId, city: CityId },
    #[error("{faction} has no cities but still has generals")]
    EliminatedWithGenerals { faction: FactionId },
    #[error("{general} holds an office in {city} without residing there")]
    NonResidentOfficer { general: GeneralId, city: CityId },
    #[error("{general} holds both offices in {city}")]
    DoubleOffice { general: GeneralId, city: CityId },
    #[error("{general} appears in more than one roster, prison or wild pool")]
    DuplicatePlacement { general: GeneralId },
    #[error("{city} progress out of range")]
    ProgressOutOfRange { city: CityId },
    #[error("{a} and {b} are linked in one direction only")]
    AsymmetricEdge { a: CityId, b: CityId },
}
