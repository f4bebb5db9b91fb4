//! The game session: player commands, turn advance, and decisions that
//! suspend either of them.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing::{debug, info};

use super::ai::{AiProgress, AiReport, AiTurn};
use super::budget::{ActionBudget, DEFAULT_ACTIONS_PER_TURN};
use super::captivity::{CaptivitySystem, PersuadeResult};
use super::combat::{Battle, BattleReport, BattleStep, Decision, DecisionRequest};
use super::commands::{self, Command, CommandOutcome};
use super::context::TurnContext;
use super::economy::{EconomySystem, ExploreResult};
use super::system::SimSystem;
use super::victory::{self, GameOutcome};
use crate::error::ActionError;
use crate::id::{CityId, FactionId};
use crate::model::World;

/// Configuration for a game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub actions_per_turn: u32,
    pub seed: u64,
    /// `None` lets the AI drive every faction.
    pub player: Option<FactionId>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            actions_per_turn: DEFAULT_ACTIONS_PER_TURN,
            seed: 0,
            player: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityLog {
    pub city: CityId,
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TurnReport {
    /// The turn this report closes.
    pub turn: u32,
    pub ai: Vec<AiReport>,
    pub monthly: Vec<CityLog>,
    pub escapes: Vec<CityLog>,
    pub outcome: Option<GameOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReport {
    Done(String),
    Explored(ExploreResult),
    Persuaded(PersuadeResult),
    AwaitingDecision(DecisionRequest),
    BattleConcluded(BattleReport),
    /// The player called off an attack; the unit comes back only if no
    /// pairing was fought.
    Withdrawn { refunded: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnProgress {
    AwaitingDecision(DecisionRequest),
    Completed(TurnReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resumed {
    Action(ActionReport),
    Turn(TurnProgress),
}

struct EndTurnState {
    queue: VecDeque<FactionId>,
    current: Option<AiTurn>,
    report: TurnReport,
}

enum Pending {
    PlayerBattle(Box<Battle>),
    EndTurn(EndTurnState),
}

pub struct Game {
    world: World,
    rng: SmallRng,
    config: GameConfig,
    budget: ActionBudget,
    turn: u32,
    systems: Vec<Box<dyn SimSystem>>,
    pending: Option<Pending>,
    outcome: Option<GameOutcome>,
}

impl Game {
    /// Start a session on `world`. The RNG is seeded from `config.seed`, so
    /// the same world, seed and inputs always replay the same game.
    pub fn new(world: World, config: GameConfig) -> Self {
        let outcome = victory::evaluate(&world, config.player);
        Self {
            world,
            rng: SmallRng::seed_from_u64(config.seed),
            budget: ActionBudget::new(config.actions_per_turn),
            config,
            turn: 1,
            systems: vec![Box::new(EconomySystem), Box::new(CaptivitySystem)],
            pending: None,
            outcome,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn budget(&self) -> &ActionBudget {
        &self.budget
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// The decision the session is waiting on, if any.
    pub fn pending_request(&self) -> Option<&DecisionRequest> {
        match self.pending.as_ref()? {
            Pending::PlayerBattle(battle) => battle.pending(),
            Pending::EndTurn(state) => state.current.as_ref().and_then(|t| t.pending()),
        }
    }

    fn ensure_ready(&self) -> Result<(), ActionError> {
        if self.outcome.is_some() {
            return Err(ActionError::GameOver);
        }
        if self.pending.is_some() {
            return Err(ActionError::DecisionPending);
        }
        Ok(())
    }

    /// Run one command for the player's faction.
    pub fn execute(&mut self, command: Command) -> Result<ActionReport, ActionError> {
        self.ensure_ready()?;
        let player = self.config.player.ok_or(ActionError::NoPlayerFaction)?;
        let outcome = commands::execute(
            &mut self.world,
            &mut self.rng,
            &mut self.budget,
            player,
            Some(player),
            command,
        )?;
        Ok(match outcome {
            CommandOutcome::Done(log) => ActionReport::Done(log),
            CommandOutcome::Explored(result) => ActionReport::Explored(result),
            CommandOutcome::Persuaded(result) => ActionReport::Persuaded(result),
            CommandOutcome::Battle(mut battle) => {
                let step = battle.advance(&mut self.world, &mut self.rng);
                self.on_player_battle(battle, step)
            }
        })
    }

    fn on_player_battle(&mut self, battle: Box<Battle>, step: BattleStep) -> ActionReport {
        match step {
            BattleStep::Decision(request) => {
                self.pending = Some(Pending::PlayerBattle(battle));
                ActionReport::AwaitingDecision(request)
            }
            BattleStep::Concluded(report) => {
                self.check_outcome();
                ActionReport::BattleConcluded(report)
            }
            BattleStep::Withdrawn { engaged } => {
                if !engaged {
                    self.budget.refund();
                }
                ActionReport::Withdrawn { refunded: !engaged }
            }
        }
    }

    /// Let every AI faction act, then settle the turn.
    pub fn end_turn(&mut self) -> Result<TurnProgress, ActionError> {
        self.ensure_ready()?;
        let queue = self
            .world
            .standing_factions()
            .into_iter()
            .filter(|&f| Some(f) != self.config.player)
            .collect();
        let state = EndTurnState {
            queue,
            current: None,
            report: TurnReport {
                turn: self.turn,
                ..TurnReport::default()
            },
        };
        Ok(self.continue_turn(state))
    }

    /// Answer the pending decision and carry on with whatever it suspended.
    pub fn resume(&mut self, decision: Decision) -> Result<Resumed, ActionError> {
        match self.pending.take() {
            None => Err(ActionError::NoPendingDecision),
            Some(Pending::PlayerBattle(mut battle)) => {
                match battle.resume(&mut self.world, &mut self.rng, decision) {
                    Ok(step) => Ok(Resumed::Action(self.on_player_battle(battle, step))),
                    Err(err) => {
                        self.pending = Some(Pending::PlayerBattle(battle));
                        Err(err)
                    }
                }
            }
            Some(Pending::EndTurn(mut state)) => {
                let Some(turn) = state.current.as_mut() else {
                    return Err(ActionError::NoPendingDecision);
                };
                match turn.resume(&mut self.world, &mut self.rng, decision) {
                    Ok(AiProgress::AwaitingDecision(request)) => {
                        self.pending = Some(Pending::EndTurn(state));
                        Ok(Resumed::Turn(TurnProgress::AwaitingDecision(request)))
                    }
                    Ok(AiProgress::Finished(report)) => {
                        state.report.ai.push(report);
                        state.current = None;
                        Ok(Resumed::Turn(self.continue_turn(state)))
                    }
                    Err(err) => {
                        self.pending = Some(Pending::EndTurn(state));
                        Err(err)
                    }
                }
            }
        }
    }

    fn continue_turn(&mut self, mut state: EndTurnState) -> TurnProgress {
        loop {
            if self.check_outcome() {
                state.report.outcome = self.outcome;
                return TurnProgress::Completed(state.report);
            }
            let mut turn = match state.current.take() {
                Some(turn) => turn,
                None => {
                    let Some(faction) = state.queue.pop_front() else {
                        return TurnProgress::Completed(self.finish_turn(state.report));
                    };
                    if self.world.faction(faction).is_eliminated() {
                        continue;
                    }
                    AiTurn::new(faction, self.config.actions_per_turn, self.config.player)
                }
            };
            match turn.run(&mut self.world, &mut self.rng) {
                AiProgress::AwaitingDecision(request) => {
                    state.current = Some(turn);
                    self.pending = Some(Pending::EndTurn(state));
                    return TurnProgress::AwaitingDecision(request);
                }
                AiProgress::Finished(report) => {
                    debug!(faction = %report.faction, actions = report.actions_used, "AI turn done");
                    state.report.ai.push(report);
                }
            }
        }
    }

    /// Run the per-turn systems in registration order, then open the next turn.
    ///
    /// Every city's month settles before any prisoner rolls to escape. A
    /// general who escapes this turn is first fed and recruited for at home
    /// on the following turn.
    fn finish_turn(&mut self, mut report: TurnReport) -> TurnReport {
        let mut ctx = TurnContext {
            world: &mut self.world,
            rng: &mut self.rng,
            report: &mut report,
        };
        for system in self.systems.iter_mut() {
            debug!(system = system.name(), "running");
            system.tick(&mut ctx);
        }
        self.budget.reset();
        self.turn += 1;
        if cfg!(debug_assertions) {
            self.world.assert_invariants();
        }
        self.check_outcome();
        report.outcome = self.outcome;
        report
    }

    /// Record the outcome once decided. Returns whether the game is over.
    fn check_outcome(&mut self) -> bool {
        if self.outcome.is_none()
            && let Some(outcome) = victory::evaluate(&self.world, self.config.player)
        {
            match outcome {
                GameOutcome::Victory(f) => {
                    info!(faction = %self.world.faction_name(f), turn = self.turn, "game won");
                }
                GameOutcome::PlayerDefeated(f) => {
                    info!(faction = %self.world.faction_name(f), turn = self.turn, "player defeated");
                }
            }
            self.outcome = Some(outcome);
        }
        self.outcome.is_some()
    }
}
