//! Single-army combat: derived stats, the pre-battle duel, and one
//! attack exchange. The multi-pairing battle lives in [`battle`].

pub mod battle;

use rand::{Rng, RngCore};
use serde::Serialize;

use crate::id::GeneralId;
use crate::model::{Formation, World};
use crate::sim::helpers;

pub use battle::{
    Battle, BattleReport, BattleStep, Control, Decision, DecisionRequest, Side,
};

// --- Constants ---

/// Chance that a general whose army is wiped out is taken prisoner.
pub const CAPTURE_CHANCE: f64 = 0.2;

const ATTACK_LEADERSHIP_WEIGHT: f64 = 1.5;
const ATTACK_SOLDIERS_DIVISOR: f64 = 200.0;
const DEFENSE_SOLDIERS_DIVISOR: f64 = 300.0;
const EFFECTIVENESS_EPSILON: f64 = 1e-6;
const LOSS_RATE_MIN: f64 = 0.1;
const LOSS_RATE_MAX: f64 = 0.2;
const MIN_LOSS: u32 = 10;
const COUNTER_LOSS_RATE: f64 = 0.05;

const DUEL_MARTIAL_WEIGHT: f64 = 0.1;
const DUEL_INTELLECT_WEIGHT: f64 = 0.08;
const DUEL_VANGUARD_BONUS: f64 = 0.15;
const DUEL_NOISE: f64 = 10.0;
const DUEL_MAX_BONUS: f64 = 0.2;

/// The parts of a general that matter on the battlefield, copied out of
/// the world so armies can be fought without borrowing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commander {
    pub id: GeneralId,
    pub name: String,
    pub leadership: u8,
    pub martial: u8,
    pub intellect: u8,
    pub is_ruler: bool,
}

impl Commander {
    pub fn of(world: &World, general: GeneralId) -> Self {
        let g = world.general(general);
        Self {
            id: general,
            name: g.name.clone(),
            leadership: g.leadership,
            martial: g.martial,
            intellect: g.intellect,
            is_ruler: world.is_ruler(general),
        }
    }
}

/// One general's soldiers fielded in a single pairing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Army {
    pub commander: Commander,
    pub formation: Formation,
    pub soldiers: u32,
    /// Morale bonus from a won duel, 0.0-0.2. Lasts for the pairing.
    pub bonus: f64,
}

impl Army {
    pub fn new(commander: Commander, formation: Formation, soldiers: u32) -> Self {
        Self {
            commander,
            formation,
            soldiers,
            bonus: 0.0,
        }
    }

    /// Field `general` with every soldier they command.
    pub fn muster(world: &World, general: GeneralId, formation: Formation) -> Self {
        Self::new(
            Commander::of(world, general),
            formation,
            world.general(general).army,
        )
    }

    pub fn attack(&self) -> f64 {
        let base = f64::from(self.commander.leadership) * ATTACK_LEADERSHIP_WEIGHT
            + f64::from(self.soldiers) / ATTACK_SOLDIERS_DIVISOR;
        base * (1.0 + self.bonus) * self.formation.attack_multiplier()
    }

    pub fn defense(&self) -> f64 {
        let base = f64::from(self.commander.leadership)
            + f64::from(self.soldiers) / DEFENSE_SOLDIERS_DIVISOR;
        base * (1.0 + self.bonus) * self.formation.defense_multiplier()
    }

    pub fn is_routed(&self) -> bool {
        self.soldiers == 0
    }
}

// --- Duel ---

/// Probability that `initiator` provokes a duel with `target`.
pub fn duel_trigger_chance(initiator: &Army, target: &Army) -> f64 {
    let martial_edge =
        f64::from(initiator.commander.martial) - f64::from(target.commander.martial);
    let intellect_gap =
        f64::from(target.commander.intellect) - f64::from(initiator.commander.intellect);
    let mut score = DUEL_MARTIAL_WEIGHT * martial_edge - DUEL_INTELLECT_WEIGHT * intellect_gap;
    if initiator.formation == Formation::Vanguard {
        score += DUEL_VANGUARD_BONUS;
    }
    if target.formation == Formation::Vanguard {
        score += DUEL_VANGUARD_BONUS;
    }
    helpers::sigmoid(score)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuelOutcome {
    NotTriggered,
    Fought {
        winner: GeneralId,
        loser: GeneralId,
        bonus: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuelReport {
    pub outcome: DuelOutcome,
    pub log: String,
}

/// Roll for a duel and, if one happens, grant the winner's army a morale
/// bonus. Martial plus noise decides; ties go to the challenged side.
pub fn duel(rng: &mut dyn RngCore, initiator: &mut Army, target: &mut Army) -> DuelReport {
    if !helpers::roll(rng, duel_trigger_chance(initiator, target)) {
        return DuelReport {
            outcome: DuelOutcome::NotTriggered,
            log: "No duel this pairing.".to_string(),
        };
    }

    let initiator_roll =
        f64::from(initiator.commander.martial) + rng.random_range(-DUEL_NOISE..DUEL_NOISE);
    let target_roll =
        f64::from(target.commander.martial) + rng.random_range(-DUEL_NOISE..DUEL_NOISE);
    let bonus = rng.random_range(0.0..DUEL_MAX_BONUS);

    let mut log = format!(
        "{} challenges {} to a duel!\n",
        initiator.commander.name, target.commander.name
    );
    let (winner, loser) = if initiator_roll > target_roll {
        (initiator, target)
    } else {
        (target, initiator)
    };
    winner.bonus = bonus;
    log.push_str(&format!(
        "{} wins the duel! {}'s troops are shaken.",
        winner.commander.name, loser.commander.name
    ));

    DuelReport {
        outcome: DuelOutcome::Fought {
            winner: winner.commander.id,
            loser: loser.commander.id,
            bonus,
        },
        log,
    }
}

// --- Attack exchange ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackResult {
    /// The defending army was wiped out by this exchange.
    pub win: bool,
    /// The defending general was captured. Only meaningful when `win`.
    pub capture: bool,
    pub battle_log: String,
    /// Capture or rout announcement; empty unless `win`.
    pub capture_log: String,
    pub loss: u32,
    pub counter_loss: u32,
}

/// One strike from `attacker` against `defender`, applied to `defender`.
pub fn resolve_attack(
    rng: &mut dyn RngCore,
    attacker: &Army,
    defender: &mut Army,
) -> AttackResult {
    let attack_true = attacker.attack() * (1.0 + attacker.bonus);
    let effectiveness = attack_true / (attack_true + defender.defense() + EFFECTIVENESS_EPSILON);
    let rate = rng.random_range(LOSS_RATE_MIN..LOSS_RATE_MAX);
    let mut loss = (effectiveness * f64::from(attacker.soldiers) * rate).floor() as u32;
    if loss == 0 && attacker.soldiers > 0 {
        loss = MIN_LOSS;
    }
    let loss = loss.min(defender.soldiers);
    defender.soldiers -= loss;

    let mut lines = vec![format!(
        "{} attacks: {}'s army loses {loss} soldiers.",
        attacker.commander.name, defender.commander.name
    )];

    let mut counter_loss = 0;
    if attacker.formation.counters(defender.formation) {
        counter_loss = (f64::from(defender.soldiers) * COUNTER_LOSS_RATE).floor() as u32;
        if counter_loss == 0 && defender.soldiers > 0 {
            counter_loss = MIN_LOSS;
        }
        counter_loss = counter_loss.min(defender.soldiers);
        defender.soldiers -= counter_loss;
        lines.push(format!(
            "{}'s {} formation counters {}'s {}, inflicting {counter_loss} extra losses.",
            attacker.commander.name,
            attacker.formation,
            defender.commander.name,
            defender.formation
        ));
    }

    let win = defender.is_routed();
    let mut capture = false;
    let mut capture_log = String::new();
    if win {
        let captured = helpers::roll(rng, CAPTURE_CHANCE) && !defender.commander.is_ruler;
        capture = captured;
        capture_log = if captured {
            format!(
                "{}'s army is annihilated; {} is captured by {}!",
                defender.commander.name, defender.commander.name, attacker.commander.name
            )
        } else {
            format!(
                "{}'s army is annihilated; {} flees the field!",
                defender.commander.name, defender.commander.name
            )
        };
    }

    AttackResult {
        win,
        capture,
        battle_log: lines.join("\n"),
        capture_log,
        loss,
        counter_loss,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn commander(id: u64, leadership: u8, martial: u8, intellect: u8) -> Commander {
        Commander {
            id: GeneralId(id),
            name: format!("General {id}"),
            leadership,
            martial,
            intellect,
            is_ruler: false,
        }
    }

    fn army(id: u64, formation: Formation, soldiers: u32) -> Army {
        Army::new(commander(id, 70, 70, 70), formation, soldiers)
    }

    #[test]
    fn derived_stats_follow_formation_table() {
        let a = army(1, Formation::Vanguard, 600);
        // (70 * 1.5 + 3) * 1.5
        assert!((a.attack() - 162.0).abs() < 1e-9);
        // (70 + 2) * 0.7
        assert!((a.defense() - 50.4).abs() < 1e-9);
    }

    #[test]
    fn even_duel_is_a_coin_flip() {
        let a = army(1, Formation::Ranged, 500);
        let b = army(2, Formation::Defensive, 500);
        assert!((duel_trigger_chance(&a, &b) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn vanguard_and_martial_raise_duel_chance() {
        let calm = army(1, Formation::Ranged, 500);
        let reckless = army(2, Formation::Vanguard, 500);
        assert!(duel_trigger_chance(&reckless, &calm) > 0.5);

        let brute = Army::new(commander(3, 70, 95, 30), Formation::Ranged, 500);
        let sage = Army::new(commander(4, 70, 60, 95), Formation::Ranged, 500);
        assert!(duel_trigger_chance(&brute, &sage) < duel_trigger_chance(&brute, &calm));
    }

    #[test]
    fn duel_winner_gets_bounded_bonus() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            let mut a = army(1, Formation::Vanguard, 500);
            let mut b = army(2, Formation::Vanguard, 500);
            let report = duel(&mut rng, &mut a, &mut b);
            match report.outcome {
                DuelOutcome::NotTriggered => {
                    assert_eq!(a.bonus, 0.0);
                    assert_eq!(b.bonus, 0.0);
                }
                DuelOutcome::Fought { winner, bonus, .. } => {
                    assert!((0.0..DUEL_MAX_BONUS).contains(&bonus));
                    let (won, lost) = if winner == a.commander.id { (&a, &b) } else { (&b, &a) };
                    assert_eq!(won.bonus, bonus);
                    assert_eq!(lost.bonus, 0.0);
                    assert!(report.log.contains("wins the duel"));
                }
            }
        }
    }

    #[test]
    fn tiny_attacker_still_inflicts_minimum_loss() {
        let mut rng = SmallRng::seed_from_u64(1);
        let attacker = army(1, Formation::Defensive, 1);
        let mut defender = army(2, Formation::Defensive, 300);
        let result = resolve_attack(&mut rng, &attacker, &mut defender);
        assert_eq!(result.loss, MIN_LOSS);
        assert_eq!(defender.soldiers, 290);
        assert!(!result.win);
        assert!(result.capture_log.is_empty());
    }

    #[test]
    fn vanguard_counter_on_ranged_floors_extra_loss() {
        let mut rng = SmallRng::seed_from_u64(2);
        let attacker = army(1, Formation::Vanguard, 1);
        let mut defender = army(2, Formation::Ranged, 25);
        let result = resolve_attack(&mut rng, &attacker, &mut defender);
        // 10 base loss, then 5% of 15 rounds to 0 and is floored to 10.
        assert_eq!(result.loss, 10);
        assert_eq!(result.counter_loss, 10);
        assert_eq!(defender.soldiers, 5);
        assert!(result.battle_log.contains("counters"));
    }

    #[test]
    fn no_counter_without_matchup() {
        let mut rng = SmallRng::seed_from_u64(2);
        let attacker = army(1, Formation::Ranged, 1);
        let mut defender = army(2, Formation::Vanguard, 25);
        let result = resolve_attack(&mut rng, &attacker, &mut defender);
        assert_eq!(result.counter_loss, 0);
        assert_eq!(defender.soldiers, 15);
    }

    #[test]
    fn loss_never_exceeds_defender_soldiers() {
        let mut rng = SmallRng::seed_from_u64(3);
        for seed_soldiers in [1, 5, 10, 40, 200] {
            let attacker = army(1, Formation::Vanguard, 1000);
            let mut defender = army(2, Formation::Ranged, seed_soldiers);
            let result = resolve_attack(&mut rng, &attacker, &mut defender);
            assert!(result.loss + result.counter_loss <= seed_soldiers);
        }
    }

    #[test]
    fn rulers_are_never_captured() {
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..200 {
            let attacker = army(1, Formation::Ranged, 1000);
            let mut ruler = army(2, Formation::Ranged, 5);
            ruler.commander.is_ruler = true;
            let result = resolve_attack(&mut rng, &attacker, &mut ruler);
            assert!(result.win);
            assert!(!result.capture);
            assert!(result.capture_log.contains("flees"));
        }
    }

    #[test]
    fn wiped_out_generals_are_sometimes_captured() {
        let mut rng = SmallRng::seed_from_u64(5);
        let captures = (0..500)
            .filter(|_| {
                let attacker = army(1, Formation::Ranged, 1000);
                let mut defender = army(2, Formation::Ranged, 5);
                resolve_attack(&mut rng, &attacker, &mut defender).capture
            })
            .count();
        assert!(captures > 50 && captures < 150, "captures = {captures}");
    }
}
