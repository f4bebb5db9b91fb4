//! Headless runner: every faction is AI-driven until one stands alone or the
//! turn limit is reached.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use warlord_sim::sim::{Game, GameConfig, GameOutcome, TurnProgress};
use warlord_sim::worldgen::{self, WorldGenConfig};

#[derive(Parser, Debug)]
#[command(name = "warlord-sim")]
#[command(author, version, about = "Three Kingdoms war-game simulator", long_about = None)]
struct Args {
    /// Random seed for world generation and play
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum turns to play
    #[arg(short, long, default_value = "100")]
    turns: u32,

    /// Actions each faction may take per turn
    #[arg(short, long, default_value = "8")]
    actions: u32,

    /// Print the final world snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let world = match worldgen::generate_world(&WorldGenConfig {
        seed: args.seed,
        ..WorldGenConfig::default()
    }) {
        Ok(world) => world,
        Err(err) => {
            error!(%err, "world generation failed");
            return ExitCode::FAILURE;
        }
    };

    let mut game = Game::new(
        world,
        GameConfig {
            actions_per_turn: args.actions,
            seed: args.seed,
            player: None,
        },
    );

    for _ in 0..args.turns {
        match game.end_turn() {
            Ok(TurnProgress::Completed(report)) => {
                let battles: usize = report.ai.iter().map(|r| r.battles.len()).sum();
                info!(turn = report.turn, battles, "turn complete");
                if report.outcome.is_some() {
                    break;
                }
            }
            Ok(TurnProgress::AwaitingDecision(request)) => {
                error!(?request, "no human player to answer");
                return ExitCode::FAILURE;
            }
            Err(err) => {
                error!(%err, "turn failed");
                return ExitCode::FAILURE;
            }
        }
    }

    match game.outcome() {
        Some(GameOutcome::Victory(f)) => {
            println!("{} unifies the land on turn {}.", game.world().faction_name(f), game.turn());
        }
        Some(GameOutcome::PlayerDefeated(f)) => {
            println!("{} has fallen.", game.world().faction_name(f));
        }
        None => {
            for faction in game.world().factions.values() {
                println!("{}: {} cities", faction.name, faction.cities.len());
            }
        }
    }

    if args.json {
        match serde_json::to_string_pretty(&game.world().snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize snapshot: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
