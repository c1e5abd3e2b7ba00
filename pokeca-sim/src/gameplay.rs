use std::collections::VecDeque;
use std::fmt::Display;
use std::num::NonZeroU16;
use std::{collections::HashMap, fmt::Debug};

use debug_ignore::DebugIgnore;
use iter_tools::Itertools;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::{debug, info, warn};

use crate::cards::*;
use crate::config::{RulesConfig, BENCH_SIZE};
use crate::energy::AttachedEnergy;
use crate::error::SetupError;
use crate::library::DeckList;
use crate::cards::StatusCondition::*;

/// Highest number of cards a single player can register
pub const MAX_CARDS_PER_PLAYER: usize = u8::MAX as usize - 1;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardRef(pub(crate) NonZeroU16);

impl Debug for CardRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c_{:04x}", self.0)
    }
}
impl Display for CardRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl From<&str> for CardRef {
    fn from(value: &str) -> Self {
        let hex = u16::from_str_radix(value.trim_start_matches("c_"), 16)
            .expect("should be a hexadecimal card reference");
        let num = NonZeroU16::new(hex).expect("card references are non zero");
        CardRef(num)
    }
}

/// Creates an independent copy of the card, owned by the player
pub fn register_card(
    player: Player,
    card: &Card,
    next_card_ref: &mut u8,
    cards: &mut HashMap<CardRef, CardInstance>,
) -> CardRef {
    let next_ref = *next_card_ref as u16;
    *next_card_ref += 1;
    let card_ref = CardRef(
        NonZeroU16::new((next_ref << 8) + (card.kind_id() << 4) + (player as u16) + 1)
            .expect("that plus one makes it non zero"),
    );
    cards.insert(card_ref, CardInstance::new(player, card.clone()));
    card_ref
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Player {
    #[default]
    One,
    Two,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

/// Who answers the choices for a player
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Controller {
    #[default]
    Human,
    Computer,
}

pub type GameResult = Result<GameContinue, GameOutcome>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GameContinue;
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GameOutcome {
    pub winning_player: Option<Player>,
    pub reason: GameOverReason,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    MulliganLimitExceeded,
    EmptyDeck,
    EmptyPrizes,
    NoCreatureInPlay,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Setup,
    StartOfTurn,
    Main,
    EndOfTurn,
    GameOver,
}

/// A decision the core needs from the caller before it can continue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChoice {
    /// draw between 0 and max cards, after the opponent's mulligans
    BonusDraw { player: Player, max: usize },
    /// the active creature was knocked out, pick one from the bench
    ActiveReplacement {
        player: Player,
        options: Vec<CardRef>,
    },
}

impl PendingChoice {
    pub fn player(&self) -> Player {
        match self {
            PendingChoice::BonusDraw { player, .. } => *player,
            PendingChoice::ActiveReplacement { player, .. } => *player,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceResponse {
    BonusDraw(usize),
    ActiveReplacement(CardRef),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnFlags {
    pub energy_attached: bool,
    pub supporter_used: bool,
    pub attacks: u8,
}

#[derive(Debug)]
pub struct Game {
    pub rng: DebugIgnore<Box<dyn RngCore>>,
    pub config: RulesConfig,
    pub state: GameState,
}

impl Game {
    pub fn setup<R: RngCore + 'static>(
        player_1: &DeckList,
        player_2: &DeckList,
        controllers: (Controller, Controller),
        config: RulesConfig,
        rng: R,
    ) -> Result<Game, SetupError> {
        let mut next_p1_card_ref = 1;
        let mut next_p2_card_ref = 1;
        let mut cards = HashMap::new();
        let player_1 = GameBoard::setup(
            Player::One,
            controllers.0,
            player_1,
            &mut next_p1_card_ref,
            &mut cards,
        )?;
        let player_2 = GameBoard::setup(
            Player::Two,
            controllers.1,
            player_2,
            &mut next_p2_card_ref,
            &mut cards,
        )?;
        let state = GameState {
            cards,
            player_1,
            player_2,
            ..Default::default()
        };
        Ok(Game {
            rng: DebugIgnore(Box::new(rng)),
            config,
            state,
        })
    }

    pub fn with_game_state<R: RngCore + 'static>(
        state: GameState,
        config: RulesConfig,
        rng: R,
    ) -> Self {
        Game {
            rng: DebugIgnore(Box::new(rng)),
            config,
            state,
        }
    }

    pub fn active_board(&self) -> &GameBoard {
        self.state.active_board()
    }
    pub fn board(&self, player: Player) -> &GameBoard {
        self.state.board(player)
    }
    pub fn board_mut(&mut self, player: Player) -> &mut GameBoard {
        self.state.board_mut(player)
    }
    pub fn lookup_creature(&self, card: CardRef) -> Option<&CreatureCard> {
        self.state.lookup_creature(card)
    }
    pub fn pending_choice(&self) -> Option<&PendingChoice> {
        self.state.pending_choice.as_ref()
    }

    pub fn need_mulligan(&self, player: Player) -> bool {
        // need to have at least one basic creature to place as active
        !self
            .board(player)
            .hand()
            .filter_map(|c| self.lookup_creature(c))
            .any(|c| c.is_basic())
    }

    /// Shuffles, deals the prizes and the opening hands
    pub fn initialize(&mut self) -> Result<(), SetupError> {
        for player in [Player::One, Player::Two] {
            self.shuffle_deck(player);
            self.deal_prizes(player)?;
        }

        for player in [Player::One, Player::Two] {
            self.handle_mulligan(player)?;
        }

        // - the player with fewer mulligans may draw the difference
        for player in [Player::One, Player::Two] {
            let advantage = self
                .board(player.opponent())
                .mulligans
                .saturating_sub(self.board(player).mulligans) as usize;
            if advantage > 0 {
                self.grant_bonus_draws(player, advantage);
            }
        }

        for player in [Player::One, Player::Two] {
            if self.board(player).controller == Controller::Computer {
                self.auto_place_initial_creatures(player)?;
            }
        }

        Ok(())
    }

    fn deal_prizes(&mut self, player: Player) -> Result<(), SetupError> {
        let prize_count = self.config.prize_count;
        let remaining = self.board(player).deck.count();
        if remaining < prize_count {
            return Err(SetupError::DeckTooSmall {
                player,
                required: prize_count,
                remaining,
            });
        }

        // - put the prize cards face down
        self.board_mut(player)
            .send_from_zone(Zone::Deck, Zone::Prizes, ZoneAddLocation::Bottom, prize_count);
        info!("player {player:?} sets {prize_count} prize cards");
        Ok(())
    }

    fn handle_mulligan(&mut self, player: Player) -> Result<(), SetupError> {
        let hand_size = self.config.starting_hand_size;
        let limit = self.config.mulligan_limit;

        for _ in 0..limit {
            let remaining = self.board(player).deck.count();
            if remaining < hand_size {
                return Err(SetupError::DeckTooSmall {
                    player,
                    required: hand_size,
                    remaining,
                });
            }

            // - draw 7 cards from the deck
            info!("player {player:?} draws {hand_size}");
            self.draw_cards(player, hand_size);
            if !self.need_mulligan(player) {
                return Ok(());
            }

            // - no basic creature, reveal and shuffle back
            self.board_mut(player).mulligans += 1;
            info!(
                "player {player:?} mulligan ({})",
                self.board(player).mulligans
            );
            self.board_mut(player)
                .send_all_from_zone(Zone::Hand, Zone::Deck, ZoneAddLocation::Bottom);
            self.shuffle_deck(player);
        }

        info!("player {player:?} cannot find a basic creature");
        let _ = self.lose_game(player, GameOverReason::MulliganLimitExceeded);
        Err(SetupError::MulliganLimitExceeded(player))
    }

    fn grant_bonus_draws(&mut self, player: Player, max: usize) {
        info!("player {player:?} may draw up to {max} more cards");
        match self.board(player).controller {
            Controller::Human => {
                self.board_mut(player).bonus_draws = max;
                self.state.pending_choice = Some(PendingChoice::BonusDraw { player, max });
            }
            Controller::Computer => {
                let amount = self.computer_bonus_draw_count(player, max);
                let drawn = self.draw_cards(player, amount);
                info!("player {player:?} draws {drawn} bonus cards");
            }
        }
    }

    /// How many of the allowed bonus cards the computer draws
    pub fn computer_bonus_draw_count(&self, player: Player, max: usize) -> usize {
        let hand = self.board(player).hand.count();
        // small hand, take everything
        if hand <= 5 {
            return max;
        }
        let basics = self
            .board(player)
            .hand()
            .filter_map(|c| self.lookup_creature(c))
            .filter(|c| c.is_basic())
            .count();
        if basics >= 3 {
            return max.saturating_sub(1);
        }
        max.min((max / 2).max(1))
    }

    pub fn place_initial_creatures(
        &mut self,
        player: Player,
        active: CardRef,
        bench: Vec<CardRef>,
    ) -> Result<(), SetupError> {
        let board = self.board(player);
        if board.active.is_some() {
            return Err(SetupError::InvalidPlacement(
                player,
                "creatures are already placed".into(),
            ));
        }
        if bench.len() > BENCH_SIZE {
            return Err(SetupError::InvalidPlacement(
                player,
                format!("{} creatures for {BENCH_SIZE} bench slots", bench.len()),
            ));
        }
        let cards = Some(active).into_iter().chain(bench.iter().copied()).collect_vec();
        if !cards.iter().all_unique() {
            return Err(SetupError::InvalidPlacement(
                player,
                "the same card is placed twice".into(),
            ));
        }
        for card in &cards {
            if !board.hand.is_in_zone(*card) {
                return Err(SetupError::InvalidPlacement(
                    player,
                    format!("{card} is not in hand"),
                ));
            }
            if !self.lookup_creature(*card).is_some_and(|c| c.is_basic()) {
                return Err(SetupError::InvalidPlacement(
                    player,
                    format!("{card} is not a basic creature"),
                ));
            }
        }

        let board = self.board_mut(player);
        board.send_to_zone(active, Zone::Active, ZoneAddLocation::Top);
        board.send_many_to_zone(bench, Zone::Bench, ZoneAddLocation::Bottom);
        info!(
            "player {player:?} places {} as active and {} on the bench",
            active,
            self.board(player).bench().count()
        );
        Ok(())
    }

    /// First basic creature as active, the next ones on the bench
    pub fn auto_place_initial_creatures(&mut self, player: Player) -> Result<(), SetupError> {
        let mut basics = self
            .board(player)
            .hand()
            .filter(|c| self.lookup_creature(*c).is_some_and(|c| c.is_basic()))
            .collect_vec();
        if basics.is_empty() {
            return Err(SetupError::InvalidPlacement(
                player,
                "no basic creature in hand".into(),
            ));
        }
        let active = basics.remove(0);
        basics.truncate(BENCH_SIZE);
        self.place_initial_creatures(player, active, basics)
    }

    pub fn start_game(&mut self, first_player: Player) -> Result<(), SetupError> {
        if self.state.game_outcome.is_some() {
            return Err(SetupError::NotReady("the game is already over".into()));
        }
        if let Some(choice) = &self.state.pending_choice {
            return Err(SetupError::NotReady(format!(
                "player {:?} has a choice to make",
                choice.player()
            )));
        }
        for player in [Player::One, Player::Two] {
            if self.board(player).active.is_none() {
                return Err(SetupError::NotReady(format!(
                    "player {player:?} has no active creature"
                )));
            }
        }

        info!("player {first_player:?} goes first");
        self.state.first_player = first_player;
        self.state.active_player = first_player;
        self.state.turn_number = 1;
        self.state.active_step = Step::Setup;
        self.state.initialization_complete = true;

        if let Err(outcome) = self.advance_to_main() {
            info!("game over before the first turn: {outcome:?}");
        }
        Ok(())
    }

    pub fn next_step(&mut self) -> GameResult {
        if let Some(game_outcome) = self.state.game_outcome {
            return Err(game_outcome);
        }
        // wait for the choice to be resolved
        if let Some(choice) = &self.state.pending_choice {
            debug!("step is waiting on: {choice:?}");
            return Ok(GameContinue);
        }

        self.state.active_step = match self.state.active_step {
            Step::Setup => Step::StartOfTurn,
            Step::StartOfTurn => Step::Main,
            Step::Main => Step::EndOfTurn,
            Step::EndOfTurn => Step::StartOfTurn,
            Step::GameOver => {
                // no outcome, nothing else can happen
                return Ok(GameContinue);
            }
        };

        info!("- active step: {:?}", self.state.active_step);
        match self.state.active_step {
            Step::StartOfTurn => self.start_of_turn(),
            Step::Main => Ok(GameContinue),
            Step::EndOfTurn => self.end_of_turn(),
            Step::Setup | Step::GameOver => unreachable!("not reachable from another step"),
        }
    }

    /// Runs the steps until the active player can act, or a choice is needed
    pub fn advance_to_main(&mut self) -> GameResult {
        loop {
            if let Some(game_outcome) = self.state.game_outcome {
                return Err(game_outcome);
            }
            if self.state.pending_choice.is_some() || self.state.active_step == Step::Main {
                return Ok(GameContinue);
            }
            self.next_step()?;
        }
    }

    /// Ends the main step, and plays the next start of turn
    pub fn end_turn(&mut self) -> GameResult {
        if let Some(game_outcome) = self.state.game_outcome {
            return Err(game_outcome);
        }
        if self.state.active_step != Step::Main {
            warn!("cannot end turn during {:?}", self.state.active_step);
            return Ok(GameContinue);
        }
        if let Some(choice) = &self.state.pending_choice {
            warn!("cannot end turn, waiting on: {choice:?}");
            return Ok(GameContinue);
        }

        self.next_step()?;
        self.advance_to_main()
    }

    fn start_of_turn(&mut self) -> GameResult {
        let player = self.state.active_player;
        info!(
            "turn {} - active player: {player:?}",
            self.state.turn_number
        );

        if self.state.initialization_complete {
            // - deck is empty on draw, the player loses
            if self.board(player).deck.count() == 0 {
                info!("player {player:?} has no card in their deck");
                return self.lose_game(player, GameOverReason::EmptyDeck);
            }

            // - draw 1 card from the deck
            self.draw_cards(player, 1);
        }

        self.status_upkeep(player)
    }

    /// Status conditions of the active creature, at the start of the turn
    fn status_upkeep(&mut self, player: Player) -> GameResult {
        let Some(active) = self.board(player).active else {
            return Ok(GameContinue);
        };

        let asleep = self.state.instance(active).has_status(Sleep);
        let chance = self.config.sleep_recovery_chance;
        let wakes_up = asleep && self.rng.gen_bool(chance);
        let poison_damage = self.config.poison_damage;
        let burn_damage = self.config.burn_damage;

        let card = self.state.instance_mut(active);
        if card.has_status(Poison) {
            card.damage = card.damage.saturating_add(poison_damage);
            info!("{active} takes {poison_damage} poison damage");
        }
        if card.has_status(Burn) {
            card.damage = card.damage.saturating_add(burn_damage);
            card.remove_status(Burn);
            info!("{active} takes {burn_damage} burn damage");
        }
        if wakes_up {
            card.remove_status(Sleep);
            info!("{active} wakes up");
        }
        if card.has_status(Paralysis) {
            card.remove_status(Paralysis);
            info!("{active} is no longer paralyzed");
        }

        if card.is_knocked_out() {
            self.knock_out(active)?;
        }

        Ok(GameContinue)
    }

    fn end_of_turn(&mut self) -> GameResult {
        let player = self.state.active_player;
        // - end of turn status conditions, nothing yet

        self.board_mut(player).first_turn_completed = true;

        // - next player's turn
        let next = player.opponent();
        self.state.active_player = next;
        self.state.turn_number += 1;
        self.state.turn_flags = TurnFlags::default();
        self.board_mut(next).has_attacked = false;
        for card in self.board(next).creatures().collect_vec() {
            self.state.instance_mut(card).clear_turn_flags();
        }

        Ok(GameContinue)
    }

    pub fn shuffle_deck(&mut self, player: Player) {
        debug!("player {player:?} shuffles their deck");
        let board = match player {
            Player::One => &mut self.state.player_1,
            Player::Two => &mut self.state.player_2,
        };
        board.deck.shuffle(&mut self.rng);
    }

    /// Draws from the front of the deck, returns the number of cards drawn
    pub fn draw_cards(&mut self, player: Player, amount: usize) -> usize {
        let amount = amount.min(self.board(player).deck.count());
        self.board_mut(player)
            .send_from_zone(Zone::Deck, Zone::Hand, ZoneAddLocation::Bottom, amount);
        debug!("player {player:?} draws {amount}");
        amount
    }

    /// Moves the card and everything attached to it to the discard pile
    pub fn discard_with_attachments(&mut self, card: CardRef) {
        let player = self.state.player_for_card(card);
        let instance = self.state.instance_mut(card);
        let attachments = instance
            .energies
            .drain(..)
            .chain(instance.tools.drain(..))
            .collect_vec();
        instance.damage = 0;
        instance.status.clear();
        instance.clear_turn_flags();

        let board = self.board_mut(player);
        for attachment in attachments {
            board.discard.add_top_card(attachment);
        }
        board.send_to_zone(card, Zone::Discard, ZoneAddLocation::Top);
    }

    pub fn promote_to_active(&mut self, player: Player, card: CardRef) {
        info!("player {player:?} sends {card} to the active spot");
        self.board_mut(player)
            .send_to_zone(card, Zone::Active, ZoneAddLocation::Top);
    }

    /// The active creature is knocked out: prize, replacement, or the end of the game
    pub fn knock_out(&mut self, card: CardRef) -> GameResult {
        let player = self.state.player_for_card(card);
        let opponent = player.opponent();
        info!("{} is knocked out", CardDisplay::new(card, &self.state));

        // - creature and attachments to the discard pile
        self.discard_with_attachments(card);

        // - opponent takes a prize card
        if let Some(prize) = self.board(opponent).prizes.peek_top_card() {
            self.board_mut(opponent)
                .send_to_zone(prize, Zone::Hand, ZoneAddLocation::Bottom);
            info!(
                "player {opponent:?} takes a prize card, {} remaining",
                self.board(opponent).prizes.count()
            );
        }
        if self.board(opponent).prizes.count() == 0 {
            return self.win_game(opponent, GameOverReason::EmptyPrizes);
        }

        // - a new active creature from the bench
        if self.board(player).active.is_none() {
            let options = self.board(player).bench().collect_vec();
            if options.is_empty() {
                info!("player {player:?} has no creature left");
                return self.lose_game(player, GameOverReason::NoCreatureInPlay);
            }
            match self.board(player).controller {
                Controller::Computer => self.promote_to_active(player, options[0]),
                Controller::Human => {
                    self.state.pending_choice =
                        Some(PendingChoice::ActiveReplacement { player, options })
                }
            }
        }

        Ok(GameContinue)
    }

    pub fn check_loss_conditions(&mut self) -> GameResult {
        // cannot lose in setup, except from mulligan
        if !self.state.initialization_complete {
            return Ok(GameContinue);
        }

        for player in [Player::One, Player::Two] {
            // - took all the prize cards
            if self.board(player).prizes.count() == 0 {
                info!("player {player:?} has no prize card remaining");
                return self.win_game(player, GameOverReason::EmptyPrizes);
            }
            // - no creature in play
            if self.board(player).creatures().count() == 0 {
                info!("player {player:?} has no creature in play");
                return self.lose_game(player, GameOverReason::NoCreatureInPlay);
            }
        }

        Ok(GameContinue)
    }

    pub fn win_game(&mut self, player: Player, reason: GameOverReason) -> GameResult {
        info!("player {player:?} wins: {reason:?}");
        let game_outcome = GameOutcome {
            winning_player: Some(player),
            reason,
        };
        self.state.game_outcome = Some(game_outcome);
        self.state.active_step = Step::GameOver;
        self.state.pending_choice = None;
        Err(game_outcome)
    }
    pub fn lose_game(&mut self, player: Player, reason: GameOverReason) -> GameResult {
        self.win_game(player.opponent(), reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameBoard {
    pub controller: Controller,
    pub deck: VecDeque<CardRef>,
    pub hand: VecDeque<CardRef>,
    pub discard: VecDeque<CardRef>,
    pub prizes: VecDeque<CardRef>,
    pub active: Option<CardRef>,
    pub bench: [Option<CardRef>; BENCH_SIZE],
    pub mulligans: u8,
    pub bonus_draws: usize,
    pub first_turn_completed: bool,
    pub has_attacked: bool,
}

impl GameBoard {
    pub fn setup(
        player: Player,
        controller: Controller,
        deck_list: &DeckList,
        next_card_ref: &mut u8,
        cards: &mut HashMap<CardRef, CardInstance>,
    ) -> Result<GameBoard, SetupError> {
        let size = deck_list.iter().map(|(_, n)| *n as usize).sum::<usize>();
        if size == 0 {
            return Err(SetupError::EmptyDeckList(player));
        }
        if size > MAX_CARDS_PER_PLAYER {
            return Err(SetupError::DeckTooLarge(player, size));
        }

        // one independent instance per copy
        let deck = deck_list
            .iter()
            .flat_map(|(card, count)| std::iter::repeat(card).take(*count as usize))
            .map(|card| register_card(player, card, next_card_ref, cards))
            .collect();

        Ok(GameBoard {
            controller,
            deck,
            ..Default::default()
        })
    }

    pub fn hand(&self) -> impl Iterator<Item = CardRef> + '_ {
        self.hand.iter().copied()
    }
    pub fn active(&self) -> impl Iterator<Item = CardRef> + '_ {
        self.active.iter().copied()
    }
    pub fn bench(&self) -> impl Iterator<Item = CardRef> + '_ {
        self.bench.iter().flatten().copied()
    }
    /// Active and bench
    pub fn creatures(&self) -> impl Iterator<Item = CardRef> + '_ {
        self.active().chain(self.bench())
    }

    pub fn bench_slot(&self, card: CardRef) -> Option<usize> {
        self.bench.iter().position(|c| *c == Some(card))
    }
    pub fn free_bench_slot(&self) -> Option<usize> {
        self.bench.iter().position(|c| c.is_none())
    }

    pub fn send_to_zone(&mut self, card: CardRef, target_zone: Zone, location: ZoneAddLocation) {
        if let Some(zone) = self.find_card_zone(card) {
            self.get_zone_mut(zone).remove_card(card);
        }
        match location {
            ZoneAddLocation::Top => self.get_zone_mut(target_zone).add_top_card(card),
            ZoneAddLocation::Bottom => self.get_zone_mut(target_zone).add_bottom_card(card),
        }
    }

    pub fn send_many_to_zone(
        &mut self,
        cards: impl IntoIterator<Item = CardRef>,
        target_zone: Zone,
        location: ZoneAddLocation,
    ) {
        cards
            .into_iter()
            .for_each(|c| self.send_to_zone(c, target_zone, location));
    }

    pub fn send_from_zone(
        &mut self,
        current_zone: Zone,
        target_zone: Zone,
        location: ZoneAddLocation,
        amount: usize,
    ) {
        for _ in 0..amount {
            if let Some(card) = self.get_zone(current_zone).peek_top_card() {
                self.send_to_zone(card, target_zone, location);
            }
        }
    }

    pub fn send_all_from_zone(
        &mut self,
        current_zone: Zone,
        target_zone: Zone,
        location: ZoneAddLocation,
    ) -> usize {
        let amount = self.get_zone(current_zone).count();
        self.send_from_zone(current_zone, target_zone, location, amount);
        amount
    }

    pub fn get_zone(&self, zone: Zone) -> &dyn ZoneControl {
        match zone {
            Zone::Deck => &self.deck,
            Zone::Hand => &self.hand,
            Zone::Discard => &self.discard,
            Zone::Prizes => &self.prizes,
            Zone::Active => &self.active,
            Zone::Bench => &self.bench,
        }
    }

    pub fn get_zone_mut(&mut self, zone: Zone) -> &mut dyn ZoneControl {
        match zone {
            Zone::Deck => &mut self.deck,
            Zone::Hand => &mut self.hand,
            Zone::Discard => &mut self.discard,
            Zone::Prizes => &mut self.prizes,
            Zone::Active => &mut self.active,
            Zone::Bench => &mut self.bench,
        }
    }

    pub fn find_card_zone(&self, card: CardRef) -> Option<Zone> {
        Zone::ALL
            .into_iter()
            .find(|zone| self.get_zone(*zone).is_in_zone(card))
    }
}

pub trait ZoneControl {
    fn count(&self) -> usize;
    fn peek_top_card(&self) -> Option<CardRef>;
    fn all_cards(&self) -> Vec<CardRef>;
    fn remove_card(&mut self, card: CardRef);
    fn add_top_card(&mut self, card: CardRef);
    fn add_bottom_card(&mut self, card: CardRef);
    fn replace_card(&mut self, from_card: CardRef, to_card: CardRef);
    fn is_in_zone(&self, card: CardRef) -> bool;
    fn shuffle(&mut self, rng: &mut Box<dyn RngCore>);
}

impl ZoneControl for Option<CardRef> {
    fn count(&self) -> usize {
        if self.is_some() {
            1
        } else {
            0
        }
    }

    fn peek_top_card(&self) -> Option<CardRef> {
        *self
    }

    fn all_cards(&self) -> Vec<CardRef> {
        self.iter().copied().collect()
    }

    fn remove_card(&mut self, card: CardRef) {
        if self.is_in_zone(card) {
            self.take();
        }
    }

    fn add_top_card(&mut self, card: CardRef) {
        if self.is_none() {
            self.replace(card);
        } else {
            panic!("there is already a card in this zone");
        }
    }

    fn add_bottom_card(&mut self, card: CardRef) {
        self.add_top_card(card)
    }

    fn replace_card(&mut self, from_card: CardRef, to_card: CardRef) {
        if self.is_in_zone(from_card) {
            self.replace(to_card);
        } else {
            panic!("card is not already in this zone");
        }
    }

    fn is_in_zone(&self, card: CardRef) -> bool {
        *self == Some(card)
    }

    fn shuffle(&mut self, _rng: &mut Box<dyn RngCore>) {
        // only one card
    }
}

impl ZoneControl for VecDeque<CardRef> {
    fn count(&self) -> usize {
        self.len()
    }

    fn peek_top_card(&self) -> Option<CardRef> {
        self.front().copied()
    }

    fn all_cards(&self) -> Vec<CardRef> {
        self.iter().copied().collect_vec()
    }

    fn remove_card(&mut self, card: CardRef) {
        if let Some(index) = self.iter().position(|c| *c == card) {
            self.remove(index);
        }
    }

    fn add_top_card(&mut self, card: CardRef) {
        if !self.is_in_zone(card) {
            self.push_front(card);
        } else {
            panic!("there is already a card in this zone");
        }
    }

    fn add_bottom_card(&mut self, card: CardRef) {
        if !self.is_in_zone(card) {
            self.push_back(card);
        } else {
            panic!("there is already a card in this zone");
        }
    }

    fn replace_card(&mut self, from_card: CardRef, to_card: CardRef) {
        if let Some(index) = self.iter().position(|c| *c == from_card) {
            self[index] = to_card;
        } else {
            panic!("card is not already in this zone");
        }
    }

    fn is_in_zone(&self, card: CardRef) -> bool {
        self.iter().any(|c| *c == card)
    }

    fn shuffle(&mut self, rng: &mut Box<dyn RngCore>) {
        self.make_contiguous().shuffle(rng)
    }
}

/// Bench slots keep their position, new creatures take the first free slot
impl ZoneControl for [Option<CardRef>; BENCH_SIZE] {
    fn count(&self) -> usize {
        self.iter().flatten().count()
    }

    fn peek_top_card(&self) -> Option<CardRef> {
        self.iter().flatten().copied().next()
    }

    fn all_cards(&self) -> Vec<CardRef> {
        self.iter().flatten().copied().collect_vec()
    }

    fn remove_card(&mut self, card: CardRef) {
        if let Some(slot) = self.iter_mut().find(|c| **c == Some(card)) {
            *slot = None;
        }
    }

    fn add_top_card(&mut self, card: CardRef) {
        if self.is_in_zone(card) {
            panic!("there is already a card in this zone");
        }
        match self.iter_mut().find(|c| c.is_none()) {
            Some(slot) => *slot = Some(card),
            None => panic!("the bench is full"),
        }
    }

    fn add_bottom_card(&mut self, card: CardRef) {
        self.add_top_card(card)
    }

    fn replace_card(&mut self, from_card: CardRef, to_card: CardRef) {
        match self.iter_mut().find(|c| **c == Some(from_card)) {
            Some(slot) => *slot = Some(to_card),
            None => panic!("card is not already in this zone"),
        }
    }

    fn is_in_zone(&self, card: CardRef) -> bool {
        self.iter().any(|c| *c == Some(card))
    }

    fn shuffle(&mut self, _rng: &mut Box<dyn RngCore>) {
        // slots are chosen by the player
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Zone {
    Deck,
    Hand,
    Discard,
    Prizes,
    Active,
    Bench,
}

impl Zone {
    pub const ALL: [Zone; 6] = [
        Zone::Deck,
        Zone::Hand,
        Zone::Discard,
        Zone::Prizes,
        Zone::Active,
        Zone::Bench,
    ];
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ZoneAddLocation {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDisplay {
    pub card: CardRef,
    text: String,
}

impl CardDisplay {
    pub fn new(card: CardRef, state: &GameState) -> CardDisplay {
        let Some(instance) = state.card(card) else {
            return CardDisplay {
                card,
                text: format!("unknown card {card}"),
            };
        };
        let text = match &instance.card {
            Card::Creature(c) => {
                let energies = state
                    .attached_energy_types(card)
                    .map(|t| t.to_string())
                    .collect_vec();
                format!(
                    "{} (stage {}) ({}/{}){}{} {}",
                    c.name,
                    c.stage,
                    instance.remaining_hp(),
                    c.hp,
                    if energies.is_empty() {
                        "".into()
                    } else {
                        format!(" (energies: {})", energies.join(", "))
                    },
                    if instance.status.is_empty() {
                        "".into()
                    } else {
                        format!(" [{}]", instance.status.iter().join(", "))
                    },
                    card,
                )
            }
            Card::Trainer(t) => format!("{} ({:?}) {}", t.name, t.kind, card),
            Card::Energy(e) => format!("{} ({}) {}", e.name, e.energy_type, card),
            Card::Tool(t) => format!("{} (Tool) {}", t.name, card),
        };
        CardDisplay { card, text }
    }
}

impl Display for CardDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub game_outcome: Option<GameOutcome>,
    pub cards: HashMap<CardRef, CardInstance>,
    pub player_1: GameBoard,
    pub player_2: GameBoard,
    pub stadium: Option<CardRef>,
    pub active_player: Player,
    pub first_player: Player,
    pub active_step: Step,
    pub turn_number: u16,
    pub turn_flags: TurnFlags,
    pub initialization_complete: bool,
    pub pending_choice: Option<PendingChoice>,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            ..Default::default()
        }
    }

    pub fn active_board(&self) -> &GameBoard {
        self.board(self.active_player)
    }
    pub fn board(&self, player: Player) -> &GameBoard {
        match player {
            Player::One => &self.player_1,
            Player::Two => &self.player_2,
        }
    }
    pub fn board_mut(&mut self, player: Player) -> &mut GameBoard {
        match player {
            Player::One => &mut self.player_1,
            Player::Two => &mut self.player_2,
        }
    }

    pub fn card(&self, card: CardRef) -> Option<&CardInstance> {
        self.cards.get(&card)
    }
    pub fn instance(&self, card: CardRef) -> &CardInstance {
        self.cards.get(&card).expect("the card should be registered")
    }
    pub fn instance_mut(&mut self, card: CardRef) -> &mut CardInstance {
        self.cards
            .get_mut(&card)
            .expect("the card should be registered")
    }
    pub fn player_for_card(&self, card: CardRef) -> Player {
        self.instance(card).owner
    }
    pub fn lookup_creature(&self, card: CardRef) -> Option<&CreatureCard> {
        self.card(card).and_then(|c| c.creature())
    }

    pub fn is_first_player_first_turn(&self) -> bool {
        self.turn_number == 1 && self.active_player == self.first_player
    }

    pub fn attached_energy_types(&self, card: CardRef) -> impl Iterator<Item = EnergyType> + '_ {
        self.card(card)
            .into_iter()
            .flat_map(|c| c.energies.iter())
            .filter_map(|e| self.card(*e).and_then(|i| i.energy()))
            .map(|e| e.energy_type)
    }

    pub fn attached_energy(&self, card: CardRef) -> AttachedEnergy {
        AttachedEnergy::new(self.attached_energy_types(card))
    }

    /// Lists everything that breaks the rules of the board
    pub fn validate(&self) -> Vec<String> {
        let mut issues = vec![];

        let mut seen: HashMap<CardRef, usize> = HashMap::new();
        for player in [Player::One, Player::Two] {
            let board = self.board(player);
            for zone in Zone::ALL {
                for card in board.get_zone(zone).all_cards() {
                    *seen.entry(card).or_default() += 1;
                    if self.card(card).is_some_and(|c| c.owner != player) {
                        issues.push(format!("{card} is in player {player:?} {zone:?}"));
                    }
                }
            }
            for card in board.creatures() {
                if let Some(instance) = self.card(card) {
                    for attached in instance.energies.iter().chain(instance.tools.iter()) {
                        *seen.entry(*attached).or_default() += 1;
                    }
                }
            }
            if board.bench.count() > BENCH_SIZE {
                issues.push(format!("player {player:?} has too many benched creatures"));
            }
        }
        for card in self.stadium.iter() {
            *seen.entry(*card).or_default() += 1;
        }

        for (card, count) in seen.iter().sorted() {
            if *count > 1 {
                issues.push(format!("{card} is in {count} places"));
            }
            if self.card(*card).is_none() {
                issues.push(format!("{card} is not registered"));
            }
        }
        for card in self.cards.keys().sorted() {
            if !seen.contains_key(card) {
                issues.push(format!("{card} is not in any zone"));
            }
        }

        if self.is_first_player_first_turn()
            && (self.turn_flags.attacks > 0 || self.turn_flags.supporter_used)
        {
            issues.push("attack or supporter during the first player's first turn".into());
        }

        issues
    }
}
