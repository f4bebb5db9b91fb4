mod common;

use warlord_sim::error::ActionError;
use warlord_sim::model::Formation;
use warlord_sim::sim::{
    ActionReport, Command, Decision, DecisionRequest, Game, GameConfig, GameOutcome, Resumed,
    Side, TurnProgress, TurnReport,
};
use warlord_sim::testutil;

/// Answer every request with the first candidate and a defensive stance.
fn answer(request: &DecisionRequest) -> Decision {
    match request {
        DecisionRequest::ChooseStriker { candidates, .. }
        | DecisionRequest::ChooseOpponent { candidates, .. } => Decision::General(candidates[0]),
        DecisionRequest::ChooseFormation { .. } => Decision::Formation(Formation::Defensive),
    }
}

/// End the turn, answering whatever the AI's attacks ask of the player.
fn end_turn_answering(game: &mut Game) -> TurnReport {
    let mut progress = game.end_turn().unwrap();
    loop {
        match progress {
            TurnProgress::Completed(report) => return report,
            TurnProgress::AwaitingDecision(request) => {
                assert_eq!(game.pending_request(), Some(&request));
                let Resumed::Turn(next) = game.resume(answer(&request)).unwrap() else {
                    panic!("end-turn decisions resume the turn");
                };
                progress = next;
            }
        }
    }
}

/// Drive a player battle to its end.
fn fight_out(game: &mut Game, mut report: ActionReport) -> ActionReport {
    while let ActionReport::AwaitingDecision(request) = &report {
        let decision = match request {
            DecisionRequest::ChooseFormation { side, .. } => {
                assert_eq!(*side, Side::Attacker);
                Decision::Formation(Formation::Vanguard)
            }
            other => answer(other),
        };
        let Resumed::Action(next) = game.resume(decision).unwrap() else {
            panic!("player battles resume the action");
        };
        report = next;
    }
    report
}

#[test]
fn player_attack_runs_to_conclusion() {
    let f = common::frontier();
    let (shu, hanzhong, shangyong) = (f.shu, f.hanzhong, f.shangyong);
    let (guan_yu, zhang_fei) = (f.guan_yu, f.zhang_fei);
    let mut game = Game::new(
        f.world,
        GameConfig {
            player: Some(shu),
            seed: 21,
            ..GameConfig::default()
        },
    );

    let first = game
        .execute(Command::Attack {
            origin: hanzhong,
            target: shangyong,
            generals: vec![guan_yu, zhang_fei],
        })
        .unwrap();
    let ActionReport::AwaitingDecision(DecisionRequest::ChooseStriker { side, candidates }) =
        &first
    else {
        panic!("the human attacker picks the first striker, got {first:?}");
    };
    assert_eq!(*side, Side::Attacker);
    assert_eq!(candidates, &vec![guan_yu, zhang_fei]);

    let last = fight_out(&mut game, first);
    let ActionReport::BattleConcluded(report) = last else {
        panic!("battle should conclude, got {last:?}");
    };
    assert!(!report.duels.is_empty());
    assert_eq!(game.budget().remaining(), game.budget().per_turn() - 1);
    assert!(game.pending_request().is_none());
    if report.city_taken {
        assert_eq!(game.world().city(shangyong).owner, shu);
    }
    game.world().assert_invariants();
}

#[test]
fn only_a_striker_choice_can_be_withdrawn() {
    let f = common::frontier();
    let (shu, hanzhong, shangyong, guan_yu) = (f.shu, f.hanzhong, f.shangyong, f.guan_yu);
    let mut game = Game::new(
        f.world,
        GameConfig {
            player: Some(shu),
            ..GameConfig::default()
        },
    );

    game.execute(Command::Attack {
        origin: hanzhong,
        target: shangyong,
        generals: vec![guan_yu],
    })
    .unwrap();
    let Resumed::Action(ActionReport::AwaitingDecision(request)) =
        game.resume(Decision::General(guan_yu)).unwrap()
    else {
        panic!("a formation is asked next");
    };
    assert!(matches!(
        request,
        DecisionRequest::ChooseFormation {
            side: Side::Attacker,
            ..
        }
    ));

    assert_eq!(
        game.resume(Decision::Withdraw),
        Err(ActionError::InvalidDecision)
    );
    assert_eq!(game.pending_request(), Some(&request));
}

#[test]
fn attacking_a_friendly_city_is_rejected() {
    let f = common::frontier();
    let (shu, hanzhong, guan_yu) = (f.shu, f.hanzhong, f.guan_yu);
    let mut game = Game::new(
        f.world,
        GameConfig {
            player: Some(shu),
            ..GameConfig::default()
        },
    );

    assert_eq!(
        game.execute(Command::Attack {
            origin: hanzhong,
            target: hanzhong,
            generals: vec![guan_yu],
        }),
        Err(ActionError::InvalidTarget {
            origin: hanzhong,
            target: hanzhong,
        })
    );
    assert_eq!(game.budget().remaining(), game.budget().per_turn());
}

#[test]
fn player_campaign_on_the_reference_map() {
    let world = testutil::reference_world(8);
    let shu = testutil::faction_named(&world, "Shu");
    let yizhou = testutil::city_named(&world, "Yizhou");
    let mut game = Game::new(
        world,
        GameConfig {
            player: Some(shu),
            seed: 8,
            ..GameConfig::default()
        },
    );

    for turn in 1..=12 {
        if game.outcome().is_some() {
            break;
        }
        assert_eq!(game.turn(), turn);
        // Explore from the capital while it stands.
        if game.world().city(yizhou).owner == shu {
            game.execute(Command::Explore { city: yizhou }).unwrap();
        }
        let report = end_turn_answering(&mut game);
        assert_eq!(report.turn, turn);
        assert!(report.ai.iter().all(|r| r.faction != shu));
        game.world().assert_invariants();
        if report.outcome.is_none() {
            assert_eq!(game.budget().remaining(), game.budget().per_turn());
        }
    }

    if let Some(GameOutcome::PlayerDefeated(f)) = game.outcome() {
        assert_eq!(f, shu);
        assert!(game.world().faction(shu).is_eliminated());
    }
}
