pub mod city;
pub mod faction;
pub mod formation;
pub mod general;
pub mod snapshot;
pub mod world;

pub use city::{City, MAX_PROGRESS, PROGRESS_PER_LEVEL, Prisoner};
pub use faction::Faction;
pub use formation::Formation;
pub use general::{General, GeneralProfile, MAX_SOLDIERS};
pub use snapshot::{CitySnapshot, FactionSnapshot, GeneralSnapshot, WorldSnapshot};
pub use world::World;
