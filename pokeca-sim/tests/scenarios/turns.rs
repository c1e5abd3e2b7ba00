use pokeca_sim::cards::StatusCondition;
use pokeca_sim::config::RulesConfig;
use pokeca_sim::gameplay::*;
use pokeca_sim::tests::*;
use pretty_assertions::assert_eq;

use crate::{card_at, ready_board};

#[test]
fn end_turn_passes_to_the_opponent() {
    let p1 = ready_board(1);
    let p2 = ready_board(3);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_player_2(p2)
        .with_summoned_this_turn(Player::Two, Zone::Active, 0)
        .with_has_attacked(Player::Two)
        .with_first_player(Player::One)
        .with_turn_flags(TurnFlags {
            energy_attached: true,
            supporter_used: false,
            attacks: 0,
        })
        .build();
    let mut game = setup_test_game(state.clone());

    let squirtle = card_at(&state, Player::Two, Zone::Active, 0);

    assert_eq!(game.end_turn(), Ok(GameContinue));

    let mut expected_state = state.clone();
    expected_state.player_1.first_turn_completed = true;
    expected_state.active_player = Player::Two;
    expected_state.turn_number = 2;
    expected_state.turn_flags = TurnFlags::default();
    expected_state.player_2.has_attacked = false;
    expected_state.cards.get_mut(&squirtle).unwrap().summoned_this_turn = false;
    // draw for the turn
    let drawn = expected_state.player_2.deck.pop_front().unwrap();
    expected_state.player_2.hand.push_back(drawn);
    assert_eq!(expected_state, game.state);
}

#[test]
fn steps_in_order() {
    let p1 = ready_board(1);
    let p2 = ready_board(3);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_player_2(p2)
        .build();
    let mut game = setup_test_game(state);

    assert_eq!(game.state.active_step, Step::Main);
    game.next_step().unwrap();
    assert_eq!(game.state.active_step, Step::EndOfTurn);
    assert_eq!(game.state.active_player, Player::Two);
    game.next_step().unwrap();
    assert_eq!(game.state.active_step, Step::StartOfTurn);
    assert_eq!(game.state.player_2.hand.len(), 1);
    game.next_step().unwrap();
    assert_eq!(game.state.active_step, Step::Main);

    // only from the main step
    game.state.active_step = Step::StartOfTurn;
    assert_eq!(game.end_turn(), Ok(GameContinue));
    assert_eq!(game.state.active_step, Step::StartOfTurn);
    assert_eq!(game.state.active_player, Player::Two);
}

#[test]
fn empty_deck_loses_at_the_draw() {
    let p1 = ready_board(1);
    let p2 = TestGameBoard {
        deck: vec![],
        ..ready_board(3)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_player_2(p2)
        .build();
    let mut game = setup_test_game(state);

    let expected = GameOutcome {
        winning_player: Some(Player::One),
        reason: GameOverReason::EmptyDeck,
    };
    assert_eq!(game.end_turn(), Err(expected));
    assert_eq!(game.state.game_outcome, Some(expected));
    assert_eq!(game.state.active_step, Step::GameOver);
    assert_eq!(game.next_step(), Err(expected));
}

#[test]
fn poison_burn_and_paralysis_at_the_start_of_turn() {
    let p1 = ready_board(1);
    let p2 = ready_board(8);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_player_2(p2)
        .with_status(Player::Two, Zone::Active, 0, StatusCondition::Poison)
        .with_status(Player::Two, Zone::Active, 0, StatusCondition::Burn)
        .with_status(Player::Two, Zone::Active, 0, StatusCondition::Paralysis)
        .build();
    let mut game = setup_test_game(state.clone());

    let snorlax = card_at(&state, Player::Two, Zone::Active, 0);
    game.end_turn().unwrap();

    let snorlax = game.state.instance(snorlax);
    // 10 poison, 20 burn
    assert_eq!(snorlax.damage, 30);
    assert_eq!(snorlax.status, vec![StatusCondition::Poison]);
}

#[test]
fn sleep_recovery_follows_the_chance() {
    for (chance, still_asleep) in [(0.0, true), (1.0, false)] {
        let p1 = ready_board(1);
        let p2 = ready_board(8);
        let state = GameStateBuilder::new()
            .with_player_1(p1)
            .with_player_2(p2)
            .with_status(Player::Two, Zone::Active, 0, StatusCondition::Sleep)
            .build();
        let config = RulesConfig {
            sleep_recovery_chance: chance,
            ..Default::default()
        };
        let mut game = setup_test_game_with_config(state.clone(), config);

        let snorlax = card_at(&state, Player::Two, Zone::Active, 0);
        game.end_turn().unwrap();
        assert_eq!(
            game.state.instance(snorlax).has_status(StatusCondition::Sleep),
            still_asleep
        );
    }
}

#[test]
fn poison_knock_out_at_the_start_of_turn() {
    let p1 = ready_board(1);
    let p2 = TestGameBoard {
        controller: Controller::Computer,
        bench: vec![3],
        ..ready_board(9)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_player_2(p2)
        .with_damage(Player::Two, Zone::Active, 0, 40)
        .with_status(Player::Two, Zone::Active, 0, StatusCondition::Poison)
        .build();
    let mut game = setup_test_game(state.clone());

    let jigglypuff = card_at(&state, Player::Two, Zone::Active, 0);
    let squirtle = card_at(&state, Player::Two, Zone::Bench, 0);
    let prize = card_at(&state, Player::One, Zone::Prizes, 0);

    assert_eq!(game.end_turn(), Ok(GameContinue));

    // the opponent takes the prize even outside of their turn
    assert_eq!(game.state.player_1.hand, [prize]);
    assert_eq!(game.state.player_1.prizes.len(), 5);
    assert_eq!(game.state.player_2.discard, [jigglypuff]);
    assert_eq!(game.state.player_2.active, Some(squirtle));
    assert_eq!(game.state.instance(jigglypuff).damage, 0);
    assert_eq!(game.state.instance(jigglypuff).status, vec![]);
    assert_eq!(game.state.active_step, Step::Main);
    assert_eq!(game.state.validate(), Vec::<String>::new());
}

#[test]
fn knock_out_at_the_start_of_turn_waits_for_the_choice() {
    let p1 = ready_board(1);
    let p2 = TestGameBoard {
        bench: vec![3, 5],
        ..ready_board(9)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_player_2(p2)
        .with_damage(Player::Two, Zone::Active, 0, 40)
        .with_status(Player::Two, Zone::Active, 0, StatusCondition::Poison)
        .build();
    let mut game = setup_test_game(state.clone());

    let pikachu = card_at(&state, Player::Two, Zone::Bench, 1);

    assert_eq!(game.end_turn(), Ok(GameContinue));
    assert_eq!(game.state.active_step, Step::StartOfTurn);
    assert!(matches!(
        game.pending_choice(),
        Some(PendingChoice::ActiveReplacement {
            player: Player::Two,
            ..
        })
    ));

    // the step does not move while the choice is pending
    assert_eq!(game.next_step(), Ok(GameContinue));
    assert_eq!(game.state.active_step, Step::StartOfTurn);

    let outcome = game.resolve_choice(Player::Two, ChoiceResponse::ActiveReplacement(pikachu));
    assert!(outcome.success);
    assert_eq!(game.state.active_step, Step::Main);
    assert_eq!(game.state.player_2.active, Some(pikachu));
    assert!(!game.legal_actions(Player::Two).is_empty());
}

#[test]
fn burn_knock_out_of_the_last_creature() {
    let p1 = ready_board(1);
    let p2 = ready_board(9);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_player_2(p2)
        .with_damage(Player::Two, Zone::Active, 0, 30)
        .with_status(Player::Two, Zone::Active, 0, StatusCondition::Burn)
        .build();
    let mut game = setup_test_game(state);

    assert_eq!(
        game.end_turn(),
        Err(GameOutcome {
            winning_player: Some(Player::One),
            reason: GameOverReason::NoCreatureInPlay,
        })
    );
}
