use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::id::{CityId, FactionId};
use crate::model::World;
use crate::sim::{Game, GameConfig, GameOutcome, SimSystem, TurnContext, TurnProgress, TurnReport};
use crate::worldgen::{self, WorldGenConfig};

// ---------------------------------------------------------------------------
// Tick execution helpers
// ---------------------------------------------------------------------------

/// Run a single per-turn system once. Returns what it reported.
pub fn tick_system(world: &mut World, system: &mut dyn SimSystem, seed: u64) -> TurnReport {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut report = TurnReport::default();
    let mut ctx = TurnContext {
        world,
        rng: &mut rng,
        report: &mut report,
    };
    system.tick(&mut ctx);
    report
}

/// The reference map, mustered, from `seed`.
pub fn reference_world(seed: u64) -> World {
    worldgen::generate_world(&WorldGenConfig {
        seed,
        ..WorldGenConfig::default()
    })
    .expect("reference dataset is valid")
}

/// Play up to `turns` AI-only turns, checking invariants after each.
/// Returns the outcome if the game was decided.
pub fn play_ai_turns(game: &mut Game, turns: u32) -> Option<GameOutcome> {
    for _ in 0..turns {
        match game.end_turn().expect("AI-only game never waits") {
            TurnProgress::Completed(report) => {
                game.world().assert_invariants();
                if report.outcome.is_some() {
                    return report.outcome;
                }
            }
            TurnProgress::AwaitingDecision(request) => {
                panic!("AI-only game asked for {request:?}")
            }
        }
    }
    game.outcome()
}

/// An AI-only session on the reference map.
pub fn ai_game(seed: u64) -> Game {
    Game::new(
        reference_world(seed),
        GameConfig {
            seed,
            ..GameConfig::default()
        },
    )
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

pub fn faction_named(world: &World, name: &str) -> FactionId {
    world
        .factions
        .values()
        .find(|f| f.name == name)
        .map(|f| f.id)
        .unwrap_or_else(|| panic!("no faction named {name}"))
}

pub fn city_named(world: &World, name: &str) -> CityId {
    world
        .cities
        .values()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .unwrap_or_else(|| panic!("no city named {name}"))
}

/// Every soldier in the world.
pub fn total_soldiers(world: &World) -> u64 {
    world.generals.values().map(|g| u64::from(g.army)).sum()
}
