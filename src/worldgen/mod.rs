pub mod cities;
pub mod config;
pub mod dataset;
pub mod factions;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;

use crate::id::GeneralId;
use crate::model::World;

pub use config::WorldGenConfig;
pub use dataset::{Dataset, DatasetError};

/// Build the starting world from the configured dataset.
pub fn generate_world(config: &WorldGenConfig) -> Result<World, DatasetError> {
    let dataset = match &config.dataset {
        Some(source) => Dataset::parse(source)?,
        None => Dataset::reference()?,
    };
    let mut world = World::new();
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut registry = factions::Registry::default();

    factions::generate_factions(&mut world, &dataset.factions, &mut registry, &mut rng)?;
    let wild = dataset
        .wild_generals
        .iter()
        .map(|profile| registry.add_general(&mut world, profile, &mut rng))
        .collect::<Result<Vec<GeneralId>, _>>()?;

    let cities = cities::generate_cities(&mut world, &dataset.cities, &registry)?;
    cities::connect_roads(&mut world, &dataset.edges, &cities)?;
    cities::scatter_wild_generals(&mut world, &wild, &mut rng)?;

    if config.muster_armies {
        factions::muster_armies(&mut world, &dataset.factions, &registry, &mut rng);
    }

    info!(
        factions = world.factions.len(),
        cities = world.cities.len(),
        generals = world.generals.len(),
        "world generated"
    );
    Ok(world)
}
