use std::error::Error;
use std::{env, fs};

use iter_tools::Itertools;
use pokeca_sim::actions::ActionOutcome;
use pokeca_sim::config::RulesConfig;
use pokeca_sim::gameplay::{CardDisplay, Controller, Game, Player};
use pokeca_sim::library::CardLibrary;
use rand::{rngs::StdRng, SeedableRng};
use time::macros::format_description;
use tracing::info;
use tracing_subscriber::{fmt::time::LocalTime, EnvFilter};

use crate::prompter::DialoguerPrompter;

mod prompter;

const STARTER_CATALOG: &str = include_str!("../../pokeca-sim/assets/starter.toml");

/// pokeca-cli [catalog.toml] [rules.toml]
fn main() -> Result<(), Box<dyn Error>> {
    env::set_var("RUST_BACKTRACE", "1");

    // setup logs
    let file_appender = tracing_appender::rolling::daily("logs", "pokeca-cli.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_timer(LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour repr:24]:[minute]:[second].[subsecond digits:4]"
        )))
        .with_writer(non_blocking)
        .with_ansi(false)
        // enable thread id to be emitted
        .with_thread_ids(true)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    info!("\n\n\n-- pokeca card game simulator is running --");

    let mut args = env::args().skip(1);
    let library = match args.next() {
        Some(path) => CardLibrary::from_toml(&fs::read_to_string(path)?)?,
        None => CardLibrary::from_toml(STARTER_CATALOG)?,
    };
    let config = match args.next() {
        Some(path) => RulesConfig::from_toml(&fs::read_to_string(path)?)?,
        None => RulesConfig::default(),
    };

    let (deck_1, deck_2) = library.decks.keys().take(2).copied().collect_tuple().ok_or(
        "the catalog needs two decks",
    )?;
    let mut game = Game::setup(
        &library.deck_list(deck_1)?,
        &library.deck_list(deck_2)?,
        (Controller::Human, Controller::Computer),
        config,
        StdRng::from_entropy(),
    )?;
    let mut prompter = DialoguerPrompter::new();

    if let Err(e) = game.initialize() {
        println!("{e}");
        print_game_over(&game);
        return Ok(());
    }
    // bonus cards after the computer's mulligans
    if let Some(outcome) = game.resolve_pending_with(&mut prompter) {
        print_outcome(&outcome);
    }
    game.place_initial_with(Player::One, &mut prompter)?;

    let first_player = if rand::random() {
        Player::One
    } else {
        Player::Two
    };
    println!("player {first_player:?} goes first");
    game.start_game(first_player)?;

    while game.state.game_outcome.is_none() {
        // a knock out at the start of the turn leaves a choice
        while let Some(outcome) = game.resolve_pending_with(&mut prompter) {
            print_outcome(&outcome);
        }
        print_board(&game);

        let outcomes = match game.active_board().controller {
            Controller::Computer => game.run_computer_turn(),
            Controller::Human => game.play_turn_with(&mut prompter),
        };
        outcomes.iter().for_each(print_outcome);

        while let Some(outcome) = game.resolve_pending_with(&mut prompter) {
            print_outcome(&outcome);
        }
        if game.end_turn().is_err() {
            break;
        }
    }

    print_game_over(&game);
    Ok(())
}

fn print_outcome(outcome: &ActionOutcome) {
    if outcome.success {
        println!("  {}", outcome.message);
    } else {
        println!("  refused: {}", outcome.message);
    }
}

fn print_board(game: &Game) {
    let state = &game.state;
    println!(
        "\n== turn {} - player {:?} ==",
        state.turn_number, state.active_player
    );
    if let Some(stadium) = state.stadium {
        println!("stadium: {}", CardDisplay::new(stadium, state));
    }
    for player in [Player::One, Player::Two] {
        let board = state.board(player);
        println!(
            "player {player:?}: deck {}, hand {}, prizes {}, discard {}",
            board.deck.len(),
            board.hand.len(),
            board.prizes.len(),
            board.discard.len()
        );
        let show = |c| CardDisplay::new(c, state).to_string();
        println!("  bench: {}", board.bench().map(show).join(" | "));
        let Some(active) = board.active else {
            continue;
        };
        println!("  active: {} - {}", show(active), game.energy_summary(active));
        for (attack_idx, attack, check) in game.available_attacks(active) {
            let hint = if game.would_enable_attack(active, attack_idx) {
                " (one more energy)"
            } else {
                ""
            };
            println!("    {} [{}]: {check}{hint}", attack.name, attack.cost);
        }
    }
}

fn print_game_over(game: &Game) {
    match game.state.game_outcome {
        Some(outcome) => match outcome.winning_player {
            Some(player) => println!("player {player:?} wins: {:?}", outcome.reason),
            None => println!("draw: {:?}", outcome.reason),
        },
        None => println!("the game did not finish"),
    }
}
