use pokeca_sim::actions::*;
use pokeca_sim::cards::StatusCondition;
use pokeca_sim::gameplay::*;
use pokeca_sim::tests::*;
use pretty_assertions::assert_eq;

use crate::{card_at, ready_board};

#[test]
fn water_gun_against_weakness() {
    let p1 = ready_board(3);
    let p2 = TestGameBoard {
        bench: vec![6],
        ..ready_board(1)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![31, 31])
        .with_player_2(p2)
        .with_active_player(Player::One)
        .with_first_player(Player::Two)
        .with_turn_number(2)
        .build();
    let mut game = setup_test_game(state.clone());

    let charmander = card_at(&state, Player::Two, Zone::Active, 0);

    let outcome = game.execute(Player::One, Attack { attack_idx: 1 });
    assert!(outcome.success);
    assert_eq!(outcome.damage_dealt, Some(40));
    assert_eq!(outcome.knocked_out, None);
    assert_eq!(
        outcome.message,
        "Squirtle used Water Gun: Water Gun: 20 base damage, weakness to Water: x2 = 40"
    );

    let mut expected_state = state.clone();
    expected_state.cards.get_mut(&charmander).unwrap().damage = 40;
    expected_state.player_1.has_attacked = true;
    expected_state.turn_flags.attacks = 1;
    assert_eq!(expected_state, game.state);

    // once per turn
    let outcome = game.execute(Player::One, Attack { attack_idx: 1 });
    assert_eq!(outcome.violation, Some(RuleViolation::AlreadyAttacked));
}

#[test]
fn resistance_reduces_to_zero() {
    let p1 = ready_board(10);
    let p2 = ready_board(11);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![35])
        .with_player_2(p2)
        .with_first_player(Player::Two)
        .with_turn_number(2)
        .build();
    let mut game = setup_test_game(state.clone());

    let outcome = game.execute(Player::One, Attack { attack_idx: 0 });
    assert!(outcome.success);
    assert_eq!(outcome.damage_dealt, Some(0));

    let mut expected_state = state.clone();
    expected_state.player_1.has_attacked = true;
    expected_state.turn_flags.attacks = 1;
    assert_eq!(expected_state, game.state);
}

#[test]
fn missing_energy_rejects_the_attack() {
    let p1 = ready_board(1);
    let p2 = ready_board(3);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![31, 31])
        .with_player_2(p2)
        .with_first_player(Player::Two)
        .with_turn_number(2)
        .build();
    let mut game = setup_test_game(state.clone());

    // Ember needs a fire energy
    let outcome = game.execute(Player::One, Attack { attack_idx: 1 });
    assert!(matches!(
        outcome.violation,
        Some(RuleViolation::InsufficientEnergy(_))
    ));
    assert!(outcome.message.contains("Fire 1 missing"));

    let outcome = game.execute(Player::One, Attack { attack_idx: 2 });
    assert_eq!(outcome.violation, Some(RuleViolation::InvalidAttack(2)));
    assert_eq!(state, game.state);
}

#[test]
fn knock_out_promotes_the_computer_bench() {
    let p1 = ready_board(3);
    let p2 = TestGameBoard {
        controller: Controller::Computer,
        bench: vec![6, 9],
        ..ready_board(1)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![31, 31])
        .with_player_2(p2)
        .with_attachments(Player::Two, Zone::Active, 0, vec![30])
        .with_damage(Player::Two, Zone::Active, 0, 20)
        .with_first_player(Player::Two)
        .with_turn_number(2)
        .build();
    let mut game = setup_test_game(state.clone());

    let charmander = card_at(&state, Player::Two, Zone::Active, 0);
    let bulbasaur = card_at(&state, Player::Two, Zone::Bench, 0);
    let fire = state.cards.get(&charmander).unwrap().energies[0];
    let prize = card_at(&state, Player::One, Zone::Prizes, 0);

    let outcome = game.execute(Player::One, Attack { attack_idx: 1 });
    assert!(outcome.success);
    assert_eq!(outcome.damage_dealt, Some(40));
    assert_eq!(outcome.knocked_out, Some(charmander));
    assert_eq!(outcome.pending_choice, None);
    assert_eq!(outcome.game_outcome, None);

    let mut expected_state = state.clone();
    expected_state.player_1.has_attacked = true;
    expected_state.turn_flags.attacks = 1;
    // the prize goes to the attacker's hand
    expected_state.player_1.prizes.pop_front();
    expected_state.player_1.hand.push_back(prize);
    // the creature is reset in the discard pile, with its energy
    expected_state.player_2.discard = [charmander, fire].into();
    let knocked_out = expected_state.cards.get_mut(&charmander).unwrap();
    knocked_out.damage = 0;
    knocked_out.energies.clear();
    // first bench creature is the new active
    expected_state.player_2.active = Some(bulbasaur);
    expected_state.player_2.bench[0] = None;
    assert_eq!(expected_state, game.state);
    assert_eq!(game.state.validate(), Vec::<String>::new());
}

#[test]
fn knock_out_waits_for_the_human_replacement() {
    let p1 = ready_board(3);
    let p2 = TestGameBoard {
        bench: vec![6, 9],
        ..ready_board(1)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![31, 31])
        .with_player_2(p2)
        .with_damage(Player::Two, Zone::Active, 0, 20)
        .with_first_player(Player::Two)
        .with_turn_number(2)
        .build();
    let mut game = setup_test_game(state.clone());

    let bulbasaur = card_at(&state, Player::Two, Zone::Bench, 0);
    let jigglypuff = card_at(&state, Player::Two, Zone::Bench, 1);

    let outcome = game.execute(Player::One, Attack { attack_idx: 1 });
    assert!(outcome.success);
    let expected_choice = PendingChoice::ActiveReplacement {
        player: Player::Two,
        options: vec![bulbasaur, jigglypuff],
    };
    assert_eq!(outcome.pending_choice, Some(expected_choice.clone()));
    assert_eq!(game.state.player_2.active, None);

    // nothing else happens until the choice is made
    let outcome = game.execute(Player::One, Retreat {
        card: card_at(&state, Player::One, Zone::Active, 0),
        bench_slot: 0,
    });
    assert_eq!(outcome.violation, Some(RuleViolation::ChoicePending(Player::Two)));
    let outcome = game.resolve_choice(Player::One, ChoiceResponse::ActiveReplacement(bulbasaur));
    assert_eq!(outcome.violation, Some(RuleViolation::ChoicePending(Player::Two)));
    let outcome = game.resolve_choice(Player::Two, ChoiceResponse::BonusDraw(1));
    assert_eq!(outcome.violation, Some(RuleViolation::WrongChoiceResponse));
    let outcome = game.resolve_choice(
        Player::Two,
        ChoiceResponse::ActiveReplacement(card_at(&state, Player::Two, Zone::Deck, 0)),
    );
    assert!(matches!(
        outcome.violation,
        Some(RuleViolation::InvalidReplacement(_))
    ));
    assert_eq!(game.pending_choice(), Some(&expected_choice));

    let outcome = game.resolve_choice(Player::Two, ChoiceResponse::ActiveReplacement(jigglypuff));
    assert!(outcome.success);
    assert_eq!(outcome.pending_choice, None);
    assert_eq!(game.state.player_2.active, Some(jigglypuff));
    assert_eq!(game.state.player_2.bench, [Some(bulbasaur), None, None, None, None]);
    // still the attacker's main step
    assert_eq!(game.state.active_step, Step::Main);
    assert_eq!(game.state.active_player, Player::One);
    assert_eq!(game.state.validate(), Vec::<String>::new());
}

#[test]
fn last_prize_wins_the_game() {
    let p1 = TestGameBoard {
        prizes: vec![35],
        ..ready_board(3)
    };
    let p2 = TestGameBoard {
        bench: vec![6],
        ..ready_board(1)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![31, 31])
        .with_player_2(p2)
        .with_damage(Player::Two, Zone::Active, 0, 20)
        .with_first_player(Player::Two)
        .with_turn_number(2)
        .build();
    let mut game = setup_test_game(state);

    let outcome = game.execute(Player::One, Attack { attack_idx: 1 });
    assert!(outcome.success);
    let expected = GameOutcome {
        winning_player: Some(Player::One),
        reason: GameOverReason::EmptyPrizes,
    };
    assert_eq!(outcome.game_outcome, Some(expected));
    assert_eq!(game.state.game_outcome, Some(expected));
    assert_eq!(game.state.active_step, Step::GameOver);

    let outcome = game.execute(Player::Two, Attack { attack_idx: 0 });
    assert_eq!(outcome.violation, Some(RuleViolation::GameOver));
    assert_eq!(game.end_turn(), Err(expected));
}

#[test]
fn no_creature_left_loses_the_game() {
    let p1 = ready_board(3);
    let p2 = ready_board(1);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![31, 31])
        .with_player_2(p2)
        .with_damage(Player::Two, Zone::Active, 0, 20)
        .with_first_player(Player::Two)
        .with_turn_number(2)
        .build();
    let mut game = setup_test_game(state);

    let outcome = game.execute(Player::One, Attack { attack_idx: 1 });
    assert_eq!(
        outcome.game_outcome,
        Some(GameOutcome {
            winning_player: Some(Player::One),
            reason: GameOverReason::NoCreatureInPlay,
        })
    );
    assert_eq!(game.state.player_1.prizes.len(), 5);
    assert_eq!(game.pending_choice(), None);
}

#[test]
fn attack_effects_apply_status() {
    let p1 = ready_board(3);
    let p2 = TestGameBoard {
        bench: vec![8],
        ..ready_board(9)
    };
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![31])
        .with_player_2(p2)
        .with_attachments(Player::Two, Zone::Active, 0, vec![30])
        .with_first_player(Player::One)
        .with_turn_number(3)
        .build();
    let mut game = setup_test_game(state.clone());

    let squirtle = card_at(&state, Player::One, Zone::Active, 0);
    let jigglypuff = card_at(&state, Player::Two, Zone::Active, 0);

    // Bubble paralyzes
    let outcome = game.execute(Player::One, Attack { attack_idx: 0 });
    assert_eq!(outcome.damage_dealt, Some(10));
    let defender = game.state.instance(jigglypuff);
    assert_eq!(defender.status, vec![StatusCondition::Paralysis]);
    assert_eq!(
        game.state.instance(jigglypuff).retreat_blocked_by(),
        Some(StatusCondition::Paralysis)
    );

    // Sing puts to sleep without damage, and replaces the paralysis
    game.end_turn().unwrap();
    assert_eq!(game.state.active_player, Player::Two);
    assert_eq!(game.state.instance(jigglypuff).status, vec![]);
    let outcome = game.execute(Player::Two, Attack { attack_idx: 0 });
    assert!(outcome.success);
    assert_eq!(outcome.damage_dealt, Some(0));
    let defender = game.state.instance(squirtle);
    assert_eq!(defender.damage, 0);
    assert_eq!(defender.status, vec![StatusCondition::Sleep]);
}

#[test]
fn attack_verdicts_for_the_active_creature() {
    let p1 = ready_board(1);
    let p2 = ready_board(3);
    let state = GameStateBuilder::new()
        .with_player_1(p1)
        .with_attachments(Player::One, Zone::Active, 0, vec![30])
        .with_player_2(p2)
        .build();
    let game = setup_test_game(state.clone());

    let charmander = card_at(&state, Player::One, Zone::Active, 0);

    assert_eq!(game.energy_summary(charmander), "Fire: 1 (total 1)");

    let verdicts = game
        .available_attacks(charmander)
        .into_iter()
        .map(|(attack_idx, attack, check)| (attack_idx, attack.name.clone(), check.to_string()))
        .collect::<Vec<_>>();
    assert_eq!(
        verdicts,
        vec![
            (
                0,
                "Scratch".to_string(),
                "usable: Colorless: 1/1 used (from 1 remaining)".to_string()
            ),
            (
                1,
                "Ember".to_string(),
                "blocked: not enough energy: 2 required, 1 attached".to_string()
            ),
        ]
    );

    // Ember only needs one more of any type
    assert!(!game.would_enable_attack(charmander, 0));
    assert!(game.would_enable_attack(charmander, 1));
    assert!(!game.would_enable_attack(charmander, 2));
}
