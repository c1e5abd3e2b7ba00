use std::fmt::{Debug, Display};

use iter_tools::Itertools;
use rand::{seq::IteratorRandom, thread_rng, Rng};
use tracing::{info, warn};

use crate::actions::{ActionOutcome, GameAction};
use crate::config::BENCH_SIZE;
use crate::error::SetupError;
use crate::gameplay::{CardDisplay, CardRef, ChoiceResponse, Game, PendingChoice, Player};

/// Stops a scripted side that keeps retreating back and forth
pub const MAX_ACTIONS_PER_TURN: usize = 30;

#[derive(Debug, Default)]
pub struct DefaultPrompter {}
impl DefaultPrompter {
    pub fn new() -> Self {
        DefaultPrompter {}
    }
}

impl Prompter for DefaultPrompter {
    fn prompt_choice<T: ToString>(&mut self, text: &str, choices: Vec<T>) -> T {
        info!("choosing first choice for: {text}");
        self.print_choices(&choices);

        let c = choices
            .into_iter()
            .next()
            .expect("always at least one choice");
        info!("{}", c.to_string());
        c
    }

    fn prompt_multi_choices<T: ToString>(
        &mut self,
        text: &str,
        choices: Vec<T>,
        min: usize,
        _max: usize,
    ) -> Vec<T> {
        info!("choosing first choices for: {text}");
        self.print_choices(&choices);

        let c: Vec<_> = choices.into_iter().take(min).collect();
        info!("{}", c.iter().map(T::to_string).join(", "));
        c
    }
}

#[derive(Debug, Default)]
pub struct RandomPrompter {}
impl RandomPrompter {
    pub fn new() -> Self {
        RandomPrompter {}
    }
}

impl Prompter for RandomPrompter {
    fn prompt_choice<T: ToString>(&mut self, text: &str, choices: Vec<T>) -> T {
        info!("choosing random choice for: {text}");
        self.print_choices(&choices);

        let c = choices
            .into_iter()
            .choose(&mut thread_rng())
            .expect("always at least one choice");
        info!("{}", c.to_string());
        c
    }

    fn prompt_multi_choices<T: ToString>(
        &mut self,
        text: &str,
        choices: Vec<T>,
        min: usize,
        max: usize,
    ) -> Vec<T> {
        info!("choosing random choices for: {text}");
        self.print_choices(&choices);

        let max = max.min(choices.len());
        let min = min.min(max);

        let c = choices
            .into_iter()
            .choose_multiple(&mut thread_rng(), thread_rng().gen_range(min..=max));
        info!("{}", c.iter().map(T::to_string).join(", "));
        c
    }
}

/// Answers with scripted indices, one entry per prompt
#[derive(Debug, Default)]
pub struct BufferedPrompter {
    buffer: Vec<Vec<usize>>,
}
impl BufferedPrompter {
    pub fn new(buffer: &[&[usize]]) -> Self {
        BufferedPrompter {
            buffer: buffer.iter().map(|b| b.to_vec()).collect_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Prompter for BufferedPrompter {
    fn prompt_choice<T: ToString>(&mut self, text: &str, mut choices: Vec<T>) -> T {
        info!("choosing buffered choice for: {text}");
        self.print_choices(&choices);

        let mut buf = self.buffer.remove(0);
        assert!(buf.len() == 1);
        let c = choices.remove(buf.remove(0));
        info!("{}", c.to_string());
        c
    }

    fn prompt_multi_choices<T: ToString>(
        &mut self,
        text: &str,
        choices: Vec<T>,
        min: usize,
        max: usize,
    ) -> Vec<T> {
        info!("choosing buffered choices for: {text}");
        self.print_choices(&choices);

        let max = max.min(choices.len());

        let buf = self.buffer.remove(0);
        assert!(buf.len() >= min);
        assert!(buf.len() <= max);
        let c = choices
            .into_iter()
            .enumerate()
            .filter(|(i, _)| buf.contains(i))
            .map(|(_, c)| c)
            .collect_vec();
        info!("{}", c.iter().map(T::to_string).join(", "));
        c
    }
}

pub trait Prompter: Debug {
    fn prompt_choice<T: ToString>(&mut self, text: &str, choices: Vec<T>) -> T;
    fn prompt_multi_choices<T: ToString>(
        &mut self,
        text: &str,
        choices: Vec<T>,
        min: usize,
        max: usize,
    ) -> Vec<T>;

    fn print_choices<T: ToString>(&mut self, choices: &[T]) {
        info!(
            "options:\n{}",
            choices
                .iter()
                .map(|c| format!("  - {}", c.to_string()))
                .join("\n")
        );
    }
}

/// An action as shown to a player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnChoice {
    Action(GameAction, String),
    EndTurn,
}

impl TurnChoice {
    pub fn new(action: GameAction, game: &Game) -> Self {
        let name = |card: CardRef| CardDisplay::new(card, &game.state).to_string();
        let text = match action {
            GameAction::PlayBasic(a) => format!("play {}", name(a.card)),
            GameAction::Evolve(a) => format!("evolve {} into {}", name(a.target), name(a.card)),
            GameAction::AttachEnergy(a) => {
                format!("attach {} to {}", name(a.card), name(a.target))
            }
            GameAction::AttachTool(a) => format!("attach {} to {}", name(a.card), name(a.target)),
            GameAction::Retreat(a) => {
                let bench = game
                    .board(game.state.active_player)
                    .bench
                    .get(a.bench_slot)
                    .copied()
                    .flatten()
                    .map(name)
                    .unwrap_or_default();
                format!("retreat {} for {}", name(a.card), bench)
            }
            GameAction::UseTrainer(a) => format!("use {}", name(a.card)),
            GameAction::Attack(a) => {
                let active = game.board(game.state.active_player).active;
                let attack = active
                    .and_then(|c| game.lookup_creature(c))
                    .and_then(|c| c.attack(a.attack_idx))
                    .map(|a| format!("{} ({} damage, {})", a.name, a.power, a.cost))
                    .unwrap_or_default();
                format!("attack: {attack}")
            }
        };
        TurnChoice::Action(action, text)
    }
}

impl Display for TurnChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnChoice::Action(_, text) => write!(f, "{text}"),
            TurnChoice::EndTurn => write!(f, "end turn"),
        }
    }
}

impl Game {
    /// Answers the pending choice, if there is one
    pub fn resolve_pending_with<P: Prompter>(&mut self, prompter: &mut P) -> Option<ActionOutcome> {
        let choice = self.state.pending_choice.clone()?;
        let player = choice.player();
        let response = match choice {
            PendingChoice::BonusDraw { max, .. } => {
                let amount = prompter.prompt_choice(
                    &format!("player {player:?}: how many bonus cards to draw?"),
                    (0..=max).collect_vec(),
                );
                ChoiceResponse::BonusDraw(amount)
            }
            PendingChoice::ActiveReplacement { options, .. } => {
                let options = options
                    .into_iter()
                    .map(|c| CardDisplay::new(c, &self.state))
                    .collect_vec();
                let card = prompter.prompt_choice(
                    &format!("player {player:?}: choose the new active creature"),
                    options,
                );
                ChoiceResponse::ActiveReplacement(card.card)
            }
        };
        Some(self.resolve_choice(player, response))
    }

    /// Active creature and bench, from the basic creatures in hand
    pub fn place_initial_with<P: Prompter>(
        &mut self,
        player: Player,
        prompter: &mut P,
    ) -> Result<(), SetupError> {
        let mut basics = self
            .board(player)
            .hand()
            .filter(|c| self.lookup_creature(*c).is_some_and(|c| c.is_basic()))
            .map(|c| CardDisplay::new(c, &self.state))
            .collect_vec();
        if basics.is_empty() {
            return Err(SetupError::InvalidPlacement(
                player,
                "no basic creature in hand".into(),
            ));
        }

        let active = prompter.prompt_choice(
            &format!("player {player:?}: choose the active creature"),
            basics.clone(),
        );
        basics.retain(|c| c.card != active.card);
        let bench = if basics.is_empty() {
            vec![]
        } else {
            prompter.prompt_multi_choices(
                &format!("player {player:?}: choose the creatures for the bench"),
                basics,
                0,
                BENCH_SIZE,
            )
        };

        self.place_initial_creatures(
            player,
            active.card,
            bench.into_iter().map(|c| c.card).collect_vec(),
        )
    }

    /// The main step of the active player, until they end the turn.
    /// Pending choices are answered by the same prompter.
    pub fn play_turn_with<P: Prompter>(&mut self, prompter: &mut P) -> Vec<ActionOutcome> {
        let player = self.state.active_player;
        let mut outcomes = vec![];

        for _ in 0..MAX_ACTIONS_PER_TURN {
            if self.state.game_outcome.is_some() {
                break;
            }
            if let Some(outcome) = self.resolve_pending_with(prompter) {
                outcomes.push(outcome);
                continue;
            }

            let mut choices = self
                .legal_actions(player)
                .into_iter()
                .map(|a| TurnChoice::new(a, self))
                .collect_vec();
            choices.push(TurnChoice::EndTurn);

            match prompter.prompt_choice(&format!("player {player:?}: choose an action"), choices) {
                TurnChoice::Action(action, _) => outcomes.push(self.execute(player, action)),
                TurnChoice::EndTurn => return outcomes,
            }
        }

        if self.state.game_outcome.is_none() {
            warn!("player {player:?} reached {MAX_ACTIONS_PER_TURN} actions, ending the turn");
        }
        outcomes
    }
}
