use std::fmt::Display;

use enum_dispatch::enum_dispatch;
use iter_tools::Itertools;
use tracing::{error, info, warn};

use crate::cards::*;
use crate::combat::{apply_attack_effects, apply_damage, resolve_damage};
use crate::energy::{check_energy_cost, EnergyCheck, EnergyShortfall};
use crate::gameplay::*;

/// Why an action or a choice was refused. Nothing changed in the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    GameOver,
    WrongStep(Step),
    NotYourTurn(Player),
    ChoicePending(Player),
    NoChoicePending,
    WrongChoiceResponse,
    NotInHand(CardRef),
    NotInPlay(CardRef),
    WrongCardKind(CardRef, &'static str),
    NotBasic(CardRef),
    BenchFull,
    CannotEvolveInto { card: CardRef, target: CardRef },
    SummonedThisTurn(CardRef),
    FirstTurnNotCompleted,
    EnergyAlreadyAttached,
    ToolAlreadyAttached(CardRef),
    NotActive(CardRef),
    RetreatBlocked(StatusCondition),
    EmptyBenchSlot(usize),
    InsufficientRetreatEnergy { required: u32, attached: u32 },
    SupporterAlreadyUsed,
    SupporterOnFirstTurn,
    AttackOnFirstTurn,
    AlreadyAttacked,
    NoActiveCreature,
    NoDefendingCreature,
    InvalidAttack(usize),
    InsufficientEnergy(EnergyShortfall),
    TooManyBonusDraws { requested: usize, max: usize },
    InvalidReplacement(CardRef),
}

impl Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleViolation::GameOver => write!(f, "the game is over"),
            RuleViolation::WrongStep(step) => write!(f, "actions are not allowed during {step:?}"),
            RuleViolation::NotYourTurn(player) => write!(f, "it is player {player:?}'s turn"),
            RuleViolation::ChoicePending(player) => {
                write!(f, "waiting for player {player:?} to make a choice")
            }
            RuleViolation::NoChoicePending => write!(f, "there is no choice to make"),
            RuleViolation::WrongChoiceResponse => {
                write!(f, "the response does not match the choice")
            }
            RuleViolation::NotInHand(card) => write!(f, "{card} is not in your hand"),
            RuleViolation::NotInPlay(card) => write!(f, "{card} is not one of your creatures in play"),
            RuleViolation::WrongCardKind(card, expected) => {
                write!(f, "{card} is not {expected}")
            }
            RuleViolation::NotBasic(card) => write!(f, "{card} is not a basic creature"),
            RuleViolation::BenchFull => write!(f, "the bench is full"),
            RuleViolation::CannotEvolveInto { card, target } => {
                write!(f, "{target} cannot evolve into {card}")
            }
            RuleViolation::SummonedThisTurn(card) => {
                write!(f, "{card} was put into play this turn")
            }
            RuleViolation::FirstTurnNotCompleted => {
                write!(f, "cannot evolve before your first turn is completed")
            }
            RuleViolation::EnergyAlreadyAttached => {
                write!(f, "an energy was already attached this turn")
            }
            RuleViolation::ToolAlreadyAttached(card) => {
                write!(f, "{card} already has a tool attached")
            }
            RuleViolation::NotActive(card) => write!(f, "{card} is not the active creature"),
            RuleViolation::RetreatBlocked(status) => {
                write!(f, "cannot retreat while affected by {status}")
            }
            RuleViolation::EmptyBenchSlot(slot) => write!(f, "bench slot {slot} is empty"),
            RuleViolation::InsufficientRetreatEnergy { required, attached } => write!(
                f,
                "not enough energy to retreat: {required} required, {attached} attached"
            ),
            RuleViolation::SupporterAlreadyUsed => {
                write!(f, "a supporter was already used this turn")
            }
            RuleViolation::SupporterOnFirstTurn => write!(
                f,
                "cannot use a supporter during the first turn of the player going first"
            ),
            RuleViolation::AttackOnFirstTurn => write!(
                f,
                "cannot attack during the first turn of the player going first"
            ),
            RuleViolation::AlreadyAttacked => write!(f, "already attacked this turn"),
            RuleViolation::NoActiveCreature => write!(f, "there is no active creature"),
            RuleViolation::NoDefendingCreature => write!(f, "there is no creature to attack"),
            RuleViolation::InvalidAttack(idx) => write!(f, "there is no attack {idx}"),
            RuleViolation::InsufficientEnergy(shortfall) => write!(f, "{shortfall}"),
            RuleViolation::TooManyBonusDraws { requested, max } => {
                write!(f, "cannot draw {requested} cards, at most {max}")
            }
            RuleViolation::InvalidReplacement(card) => {
                write!(f, "{card} cannot replace the active creature")
            }
        }
    }
}

impl std::error::Error for RuleViolation {}

/// Result of an action, or of a choice resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub violation: Option<RuleViolation>,
    pub pending_choice: Option<PendingChoice>,
    pub damage_dealt: Option<u32>,
    pub knocked_out: Option<CardRef>,
    pub game_outcome: Option<GameOutcome>,
}

impl ActionOutcome {
    pub fn rejected(violation: RuleViolation) -> Self {
        ActionOutcome {
            success: false,
            message: violation.to_string(),
            violation: Some(violation),
            ..Default::default()
        }
    }
}

#[enum_dispatch]
pub trait ExecuteAction {
    /// Every precondition, before anything changes
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation>;

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult;
}

#[enum_dispatch(ExecuteAction)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    PlayBasic,
    Evolve,
    AttachEnergy,
    AttachTool,
    Retreat,
    UseTrainer,
    Attack,
}

fn ensure_in_hand(game: &Game, player: Player, card: CardRef) -> Result<(), RuleViolation> {
    if game.board(player).hand.is_in_zone(card) {
        Ok(())
    } else {
        Err(RuleViolation::NotInHand(card))
    }
}

fn ensure_in_play(game: &Game, player: Player, card: CardRef) -> Result<(), RuleViolation> {
    if game.board(player).creatures().any(|c| c == card) {
        Ok(())
    } else {
        Err(RuleViolation::NotInPlay(card))
    }
}

fn card_name(game: &Game, card: CardRef) -> String {
    game.state
        .card(card)
        .map(|c| c.card.name().to_string())
        .unwrap_or_else(|| card.to_string())
}

/// Puts a basic creature from the hand into play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayBasic {
    pub card: CardRef,
}
impl ExecuteAction for PlayBasic {
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation> {
        ensure_in_hand(game, player, self.card)?;
        let creature = game
            .lookup_creature(self.card)
            .ok_or(RuleViolation::WrongCardKind(self.card, "a creature"))?;
        if !creature.is_basic() {
            return Err(RuleViolation::NotBasic(self.card));
        }
        let board = game.board(player);
        if board.active.is_some() && board.free_bench_slot().is_none() {
            return Err(RuleViolation::BenchFull);
        }
        Ok(())
    }

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult {
        let zone = if game.board(player).active.is_none() {
            Zone::Active
        } else {
            Zone::Bench
        };
        game.board_mut(player)
            .send_to_zone(self.card, zone, ZoneAddLocation::Top);
        game.state.instance_mut(self.card).summoned_this_turn = true;

        outcome.message = format!("{} was put into play ({zone:?})", card_name(game, self.card));
        Ok(GameContinue)
    }
}

/// Puts the evolution card on top of a creature in play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evolve {
    pub card: CardRef,
    pub target: CardRef,
}
impl ExecuteAction for Evolve {
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation> {
        ensure_in_hand(game, player, self.card)?;
        let evolution = game
            .lookup_creature(self.card)
            .filter(|c| !c.is_basic())
            .ok_or(RuleViolation::WrongCardKind(self.card, "an evolution creature"))?;
        ensure_in_play(game, player, self.target)?;
        let target = game
            .lookup_creature(self.target)
            .ok_or(RuleViolation::NotInPlay(self.target))?;
        if !evolution.evolves_from(target) {
            return Err(RuleViolation::CannotEvolveInto {
                card: self.card,
                target: self.target,
            });
        }
        if game.state.instance(self.target).summoned_this_turn {
            return Err(RuleViolation::SummonedThisTurn(self.target));
        }
        if !game.board(player).first_turn_completed {
            return Err(RuleViolation::FirstTurnNotCompleted);
        }
        Ok(())
    }

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult {
        // the evolution carries everything from the creature it evolves from
        let previous = game.state.instance_mut(self.target);
        let damage = std::mem::take(&mut previous.damage);
        let energies = std::mem::take(&mut previous.energies);
        let tools = std::mem::take(&mut previous.tools);
        let status = std::mem::take(&mut previous.status);
        previous.clear_turn_flags();

        let evolved = game.state.instance_mut(self.card);
        evolved.damage = damage;
        evolved.energies = energies;
        evolved.tools = tools;
        evolved.status = status;
        evolved.evolved_this_turn = true;
        evolved.summoned_this_turn = false;

        let board = game.board_mut(player);
        board.hand.remove_card(self.card);
        if let Some(zone) = board.find_card_zone(self.target) {
            board.get_zone_mut(zone).replace_card(self.target, self.card);
        }
        board.discard.add_top_card(self.target);

        outcome.message = format!(
            "{} evolved into {}",
            card_name(game, self.target),
            card_name(game, self.card)
        );
        Ok(GameContinue)
    }
}

/// Once per turn, an energy from the hand to a creature in play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachEnergy {
    pub card: CardRef,
    pub target: CardRef,
}
impl ExecuteAction for AttachEnergy {
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation> {
        ensure_in_hand(game, player, self.card)?;
        if game.state.card(self.card).and_then(|c| c.energy()).is_none() {
            return Err(RuleViolation::WrongCardKind(self.card, "an energy"));
        }
        if game.state.turn_flags.energy_attached {
            return Err(RuleViolation::EnergyAlreadyAttached);
        }
        ensure_in_play(game, player, self.target)
    }

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult {
        game.board_mut(player).hand.remove_card(self.card);
        game.state.instance_mut(self.target).energies.push(self.card);
        game.state.turn_flags.energy_attached = true;

        outcome.message = format!(
            "{} attached to {}",
            card_name(game, self.card),
            card_name(game, self.target)
        );
        Ok(GameContinue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachTool {
    pub card: CardRef,
    pub target: CardRef,
}
impl ExecuteAction for AttachTool {
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation> {
        ensure_in_hand(game, player, self.card)?;
        if !game
            .state
            .card(self.card)
            .is_some_and(|c| c.card.is_attachable_tool())
        {
            return Err(RuleViolation::WrongCardKind(self.card, "a tool"));
        }
        ensure_in_play(game, player, self.target)?;
        if !game.state.instance(self.target).can_attach_tool() {
            return Err(RuleViolation::ToolAlreadyAttached(self.target));
        }
        Ok(())
    }

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult {
        game.board_mut(player).hand.remove_card(self.card);
        game.state.instance_mut(self.target).tools.push(self.card);

        outcome.message = format!(
            "{} attached to {}",
            card_name(game, self.card),
            card_name(game, self.target)
        );
        Ok(GameContinue)
    }
}

/// Switches the active creature with the one in the bench slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retreat {
    pub card: CardRef,
    pub bench_slot: usize,
}
impl ExecuteAction for Retreat {
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation> {
        let board = game.board(player);
        if board.active != Some(self.card) {
            return Err(RuleViolation::NotActive(self.card));
        }
        let instance = game.state.instance(self.card);
        if let Some(status) = instance.retreat_blocked_by() {
            return Err(RuleViolation::RetreatBlocked(status));
        }
        if board.bench.get(self.bench_slot).copied().flatten().is_none() {
            return Err(RuleViolation::EmptyBenchSlot(self.bench_slot));
        }
        let required = instance.creature().map(|c| c.retreat_cost).unwrap_or(0);
        let attached = instance.energies.len() as u32;
        if attached < required {
            return Err(RuleViolation::InsufficientRetreatEnergy { required, attached });
        }
        Ok(())
    }

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult {
        // - pay the cost with the last attached energies
        let instance = game.state.instance_mut(self.card);
        let cost = instance.creature().map(|c| c.retreat_cost).unwrap_or(0) as usize;
        let paid = instance
            .energies
            .split_off(instance.energies.len() - cost);
        let board = game.board_mut(player);
        for energy in &paid {
            board.discard.add_top_card(*energy);
        }

        // - swap with the bench
        let bench_card = board.bench[self.bench_slot];
        board.bench[self.bench_slot] = Some(self.card);
        board.active = bench_card;

        outcome.message = format!(
            "{} retreated, discarding {} energy",
            card_name(game, self.card),
            paid.len()
        );
        Ok(GameContinue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseTrainer {
    pub card: CardRef,
}
impl ExecuteAction for UseTrainer {
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation> {
        ensure_in_hand(game, player, self.card)?;
        let trainer = game
            .state
            .card(self.card)
            .and_then(|c| c.trainer())
            .ok_or(RuleViolation::WrongCardKind(self.card, "a trainer"))?;
        match trainer.kind {
            TrainerKind::Item | TrainerKind::Stadium => Ok(()),
            TrainerKind::Supporter => {
                if game.state.is_first_player_first_turn() {
                    Err(RuleViolation::SupporterOnFirstTurn)
                } else if game.state.turn_flags.supporter_used {
                    Err(RuleViolation::SupporterAlreadyUsed)
                } else {
                    Ok(())
                }
            }
            // attached instead
            TrainerKind::PokemonTool => Err(RuleViolation::WrongCardKind(
                self.card,
                "a trainer that can be used",
            )),
        }
    }

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult {
        let Some(kind) = game.state.card(self.card).and_then(|c| c.trainer()).map(|t| t.kind)
        else {
            return Ok(GameContinue);
        };

        match kind {
            TrainerKind::Item | TrainerKind::PokemonTool => {
                // TODO apply the item effect text, only attack status keywords are read for now
                game.board_mut(player)
                    .send_to_zone(self.card, Zone::Discard, ZoneAddLocation::Top);
            }
            TrainerKind::Supporter => {
                game.board_mut(player)
                    .send_to_zone(self.card, Zone::Discard, ZoneAddLocation::Top);
                game.state.turn_flags.supporter_used = true;
            }
            TrainerKind::Stadium => {
                // - the previous stadium goes back to its owner
                if let Some(previous) = game.state.stadium.take() {
                    let owner = game.state.player_for_card(previous);
                    game.board_mut(owner).discard.add_top_card(previous);
                    info!("{} is discarded", card_name(game, previous));
                }
                game.board_mut(player).hand.remove_card(self.card);
                game.state.stadium = Some(self.card);
            }
        }

        outcome.message = format!("{} was used", card_name(game, self.card));
        Ok(GameContinue)
    }
}

/// The active creature attacks the opponent's active creature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attack {
    pub attack_idx: usize,
}
impl ExecuteAction for Attack {
    fn validate(&self, player: Player, game: &Game) -> Result<(), RuleViolation> {
        if game.state.is_first_player_first_turn() {
            return Err(RuleViolation::AttackOnFirstTurn);
        }
        if game.board(player).has_attacked || game.state.turn_flags.attacks > 0 {
            return Err(RuleViolation::AlreadyAttacked);
        }
        let active = game
            .board(player)
            .active
            .ok_or(RuleViolation::NoActiveCreature)?;
        let attack = game
            .lookup_creature(active)
            .and_then(|c| c.attack(self.attack_idx))
            .filter(|a| !a.name.trim().is_empty())
            .ok_or(RuleViolation::InvalidAttack(self.attack_idx))?;
        if game.board(player.opponent()).active.is_none() {
            return Err(RuleViolation::NoDefendingCreature);
        }
        match check_energy_cost(&attack.cost, &game.state.attached_energy(active)) {
            EnergyCheck::Usable(_) => Ok(()),
            EnergyCheck::Blocked(shortfall) => Err(RuleViolation::InsufficientEnergy(shortfall)),
        }
    }

    fn commit(&self, player: Player, game: &mut Game, outcome: &mut ActionOutcome) -> GameResult {
        let (Some(attacker), Some(defender)) = (
            game.board(player).active,
            game.board(player.opponent()).active,
        ) else {
            return Ok(GameContinue);
        };
        let (Some(attacker_card), Some(defender_card)) = (
            game.lookup_creature(attacker).cloned(),
            game.lookup_creature(defender).cloned(),
        ) else {
            return Ok(GameContinue);
        };
        let Some(calc) = resolve_damage(&attacker_card, &defender_card, self.attack_idx, &game.config)
        else {
            return Ok(GameContinue);
        };
        let attack = &attacker_card.attacks[self.attack_idx];
        info!(
            "{} uses {} on {}",
            attacker_card.name, attack.name, defender_card.name
        );

        game.board_mut(player).has_attacked = true;
        game.state.turn_flags.attacks += 1;

        let defending = game.state.instance_mut(defender);
        let knocked_out = apply_damage(defending, calc.damage);
        apply_attack_effects(attack, defending);

        outcome.damage_dealt = Some(calc.damage);
        outcome.message = format!(
            "{} used {}: {}",
            attacker_card.name,
            attack.name,
            calc.steps.join(", ")
        );
        if knocked_out {
            outcome.knocked_out = Some(defender);
            game.knock_out(defender)?;
        }
        Ok(GameContinue)
    }
}

impl Game {
    fn ensure_can_act(&self, player: Player) -> Result<(), RuleViolation> {
        if self.state.game_outcome.is_some() {
            return Err(RuleViolation::GameOver);
        }
        if let Some(choice) = &self.state.pending_choice {
            return Err(RuleViolation::ChoicePending(choice.player()));
        }
        if self.state.active_step != Step::Main {
            return Err(RuleViolation::WrongStep(self.state.active_step));
        }
        if self.state.active_player != player {
            return Err(RuleViolation::NotYourTurn(self.state.active_player));
        }
        Ok(())
    }

    pub fn validate_action(&self, player: Player, action: &GameAction) -> Result<(), RuleViolation> {
        self.ensure_can_act(player)?;
        action.validate(player, self)
    }

    /// Validates then commits the action. Nothing changes if it is refused.
    pub fn execute(&mut self, player: Player, action: impl Into<GameAction>) -> ActionOutcome {
        let action = action.into();
        if let Err(violation) = self.validate_action(player, &action) {
            info!("player {player:?} cannot {action:?}: {violation}");
            return ActionOutcome::rejected(violation);
        }

        info!("player {player:?} - {action:?}");
        let mut outcome = ActionOutcome {
            success: true,
            ..Default::default()
        };
        let result = action
            .commit(player, self, &mut outcome)
            .and_then(|_| self.check_loss_conditions());
        if let Err(game_outcome) = result {
            outcome.game_outcome = Some(game_outcome);
        }
        outcome.pending_choice = self.state.pending_choice.clone();
        info!("{}", outcome.message);

        for issue in self.state.validate() {
            error!("invalid state after {action:?}: {issue}");
        }
        outcome
    }

    /// Answers the pending choice, then keeps the turn going
    pub fn resolve_choice(&mut self, player: Player, response: ChoiceResponse) -> ActionOutcome {
        let Some(choice) = self.state.pending_choice.clone() else {
            warn!("player {player:?} answered without a pending choice");
            return ActionOutcome::rejected(RuleViolation::NoChoicePending);
        };
        if choice.player() != player {
            warn!("player {player:?} answered the choice of {:?}", choice.player());
            return ActionOutcome::rejected(RuleViolation::ChoicePending(choice.player()));
        }

        let message = match (choice, response) {
            (PendingChoice::BonusDraw { max, .. }, ChoiceResponse::BonusDraw(requested)) => {
                if requested > max {
                    warn!("player {player:?} asked for {requested} bonus cards, at most {max}");
                    return ActionOutcome::rejected(RuleViolation::TooManyBonusDraws {
                        requested,
                        max,
                    });
                }
                self.state.pending_choice = None;
                self.board_mut(player).bonus_draws = 0;
                let drawn = self.draw_cards(player, requested);
                format!("player {player:?} draws {drawn} bonus cards")
            }
            (
                PendingChoice::ActiveReplacement { options, .. },
                ChoiceResponse::ActiveReplacement(card),
            ) => {
                if !options.contains(&card) || !self.board(player).bench().any(|c| c == card) {
                    warn!("player {player:?} cannot replace the active creature with {card}");
                    return ActionOutcome::rejected(RuleViolation::InvalidReplacement(card));
                }
                self.state.pending_choice = None;
                self.promote_to_active(player, card);
                format!("{} is now active", card_name(self, card))
            }
            _ => {
                warn!("player {player:?} response {response:?} does not match the choice");
                return ActionOutcome::rejected(RuleViolation::WrongChoiceResponse);
            }
        };
        info!("{message}");

        let mut outcome = ActionOutcome {
            success: true,
            message,
            ..Default::default()
        };
        // - resume the turn if it was waiting
        if self.state.initialization_complete && self.state.active_step != Step::Main {
            if let Err(game_outcome) = self.advance_to_main() {
                outcome.game_outcome = Some(game_outcome);
            }
        }
        outcome.pending_choice = self.state.pending_choice.clone();
        outcome
    }

    /// Every action the player could execute right now
    pub fn legal_actions(&self, player: Player) -> Vec<GameAction> {
        if self.ensure_can_act(player).is_err() {
            return vec![];
        }
        let board = self.board(player);
        let creatures = board.creatures().collect_vec();

        let mut candidates: Vec<GameAction> = vec![];
        for card in board.hand() {
            candidates.push(PlayBasic { card }.into());
            candidates.push(UseTrainer { card }.into());
            for target in &creatures {
                candidates.push(Evolve { card, target: *target }.into());
                candidates.push(AttachEnergy { card, target: *target }.into());
                candidates.push(AttachTool { card, target: *target }.into());
            }
        }
        if let Some(card) = board.active {
            for (bench_slot, _) in board.bench.iter().enumerate().filter(|(_, c)| c.is_some()) {
                candidates.push(Retreat { card, bench_slot }.into());
            }
            let attacks = self.lookup_creature(card).map(|c| c.attacks.len()).unwrap_or(0);
            for attack_idx in 0..attacks {
                candidates.push(Attack { attack_idx }.into());
            }
        }

        candidates
            .into_iter()
            .filter(|a| a.validate(player, self).is_ok())
            .collect_vec()
    }
}
