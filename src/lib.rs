pub mod error;
pub mod id;
pub mod model;
pub mod scenario;
pub mod sim;
pub mod testutil;
pub mod worldgen;

pub use error::{ActionError, InvariantViolation};
pub use id::{CityId, FactionId, GeneralId, IdGenerator};
pub use model::{City, Faction, Formation, General, GeneralProfile, World};
pub use sim::{Game, GameConfig, GameOutcome};
