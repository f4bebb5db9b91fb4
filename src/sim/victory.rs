use serde::Serialize;

use crate::id::FactionId;
use crate::model::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameOutcome {
    /// Only this faction still holds cities.
    Victory(FactionId),
    /// The human player's faction lost its last city.
    PlayerDefeated(FactionId),
}

/// Decide whether the game is over. Player defeat is checked first.
pub fn evaluate(world: &World, player: Option<FactionId>) -> Option<GameOutcome> {
    if let Some(p) = player
        && world.faction(p).is_eliminated()
    {
        return Some(GameOutcome::PlayerDefeated(p));
    }
    match world.standing_factions().as_slice() {
        [sole] => Some(GameOutcome::Victory(*sole)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn undecided_while_two_stand() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        s.city("Yizhou", shu.faction);
        s.city("Xuchang", wei.faction);
        let world = s.build();

        assert_eq!(evaluate(&world, Some(shu.faction)), None);
        assert_eq!(evaluate(&world, None), None);
    }

    #[test]
    fn last_faction_standing_wins() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        s.faction("Wei", "Cao Cao");
        s.city("Yizhou", shu.faction);
        let world = s.build();

        assert_eq!(evaluate(&world, None), Some(GameOutcome::Victory(shu.faction)));
    }

    #[test]
    fn player_defeat_takes_precedence() {
        let mut s = Scenario::new();
        let shu = s.faction("Shu", "Liu Bei");
        let wei = s.faction("Wei", "Cao Cao");
        s.city("Xuchang", wei.faction);
        let world = s.build();

        assert_eq!(
            evaluate(&world, Some(shu.faction)),
            Some(GameOutcome::PlayerDefeated(shu.faction))
        );
    }
}
