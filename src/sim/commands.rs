//! Discrete faction actions under the per-turn budget.
//!
//! Player input and the AI both go through [`execute`]: it takes one budget
//! unit, checks the acting faction owns the acting city, runs the action,
//! and refunds the unit if the action is rejected.

use rand::RngCore;

use super::budget::ActionBudget;
use super::captivity::{self, PersuadeResult};
use super::combat::{Battle, Control};
use super::economy::{self, ExploreResult};
use crate::error::ActionError;
use crate::id::{CityId, FactionId, GeneralId};
use crate::model::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodTrade {
    /// Spend this much gold on food.
    Buy(u32),
    /// Sell ten food per unit for one gold each.
    Sell(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Explore {
        city: CityId,
    },
    TradeFood {
        city: CityId,
        trade: FoodTrade,
    },
    Transport {
        from: CityId,
        to: CityId,
        food: u32,
        gold: u32,
    },
    TransferGenerals {
        from: CityId,
        to: CityId,
        generals: Vec<GeneralId>,
    },
    AppointOfficers {
        city: CityId,
        commerce: Option<GeneralId>,
        agriculture: Option<GeneralId>,
    },
    Persuade {
        city: CityId,
        prisoner: GeneralId,
    },
    Attack {
        origin: CityId,
        target: CityId,
        generals: Vec<GeneralId>,
    },
}

impl Command {
    /// The city the action is taken from.
    pub fn acting_city(&self) -> CityId {
        match self {
            Command::Explore { city }
            | Command::TradeFood { city, .. }
            | Command::AppointOfficers { city, .. }
            | Command::Persuade { city, .. } => *city,
            Command::Transport { from, .. } | Command::TransferGenerals { from, .. } => *from,
            Command::Attack { origin, .. } => *origin,
        }
    }
}

#[derive(Debug)]
pub enum CommandOutcome {
    Done(String),
    Explored(ExploreResult),
    Persuaded(PersuadeResult),
    /// A validated battle, not yet advanced.
    Battle(Box<Battle>),
}

/// Who controls a faction's battle choices.
pub fn control_of(faction: FactionId, player: Option<FactionId>) -> Control {
    if player == Some(faction) {
        Control::Human
    } else {
        Control::Ai
    }
}

/// Run `command` for `faction`, charging one unit of `budget`.
///
/// `player` decides which side of a battle is asked for decisions.
pub fn execute(
    world: &mut World,
    rng: &mut dyn RngCore,
    budget: &mut ActionBudget,
    faction: FactionId,
    player: Option<FactionId>,
    command: Command,
) -> Result<CommandOutcome, ActionError> {
    budget.consume()?;
    let result = dispatch(world, rng, faction, player, command);
    if result.is_err() {
        budget.refund();
    }
    result
}

fn dispatch(
    world: &mut World,
    rng: &mut dyn RngCore,
    faction: FactionId,
    player: Option<FactionId>,
    command: Command,
) -> Result<CommandOutcome, ActionError> {
    let city = command.acting_city();
    let owner = world
        .cities
        .get(&city)
        .map(|c| c.owner)
        .ok_or(ActionError::UnknownCity { city })?;
    if owner != faction {
        return Err(ActionError::CityNotOwned { city, faction });
    }

    match command {
        Command::Explore { city } => Ok(CommandOutcome::Explored(economy::explore(
            world, rng, city,
        ))),
        Command::TradeFood { city, trade } => {
            let log = match trade {
                FoodTrade::Buy(units) => economy::buy_food(world, city, units)?,
                FoodTrade::Sell(units) => economy::sell_food(world, city, units)?,
            };
            Ok(CommandOutcome::Done(log))
        }
        Command::Transport {
            from,
            to,
            food,
            gold,
        } => economy::transport(world, from, to, food, gold).map(CommandOutcome::Done),
        Command::TransferGenerals { from, to, generals } => {
            economy::transfer_generals(world, from, to, &generals).map(CommandOutcome::Done)
        }
        Command::AppointOfficers {
            city,
            commerce,
            agriculture,
        } => economy::appoint_officers(world, city, commerce, agriculture)
            .map(CommandOutcome::Done),
        Command::Persuade { city, prisoner } => {
            captivity::persuade(world, rng, city, prisoner).map(CommandOutcome::Persuaded)
        }
        Command::Attack {
            origin,
            target,
            generals,
        } => {
            let defender = world
                .cities
                .get(&target)
                .map(|c| c.owner)
                .ok_or(ActionError::InvalidTarget { origin, target })?;
            let battle = Battle::begin(
                world,
                rng,
                origin,
                target,
                &generals,
                control_of(faction, player),
                control_of(defender, player),
            )?;
            Ok(CommandOutcome::Battle(Box::new(battle)))
        }
    }
}
