pub mod ai;
pub mod budget;
pub mod captivity;
pub mod combat;
pub mod commands;
pub mod conquest;
mod context;
pub mod economy;
pub mod helpers;
pub mod runner;
mod system;
pub mod victory;

pub use ai::{AiProgress, AiReport, AiTurn};
pub use budget::{ActionBudget, DEFAULT_ACTIONS_PER_TURN};
pub use captivity::CaptivitySystem;
pub use combat::{Battle, BattleReport, BattleStep, Control, Decision, DecisionRequest, Side};
pub use commands::{Command, CommandOutcome, FoodTrade};
pub use context::TurnContext;
pub use economy::EconomySystem;
pub use runner::{
    ActionReport, CityLog, Game, GameConfig, Resumed, TurnProgress, TurnReport,
};
pub use system::SimSystem;
pub use victory::GameOutcome;
