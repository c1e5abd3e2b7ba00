use iter_tools::Itertools;
use tracing::{debug, info};

use crate::actions::{self, ActionOutcome, AttachEnergy, Evolve, GameAction, PlayBasic, UseTrainer};
use crate::cards::TrainerKind;
use crate::combat::{resolve_damage, status_from_effect};
use crate::gameplay::*;

/// Remaining mutations the computer can make this turn
struct ActionBudget(usize);

impl ActionBudget {
    fn available(&self) -> bool {
        self.0 > 0
    }
}

impl Game {
    /// The main step of a computer controlled player, one pass over
    /// play, energy, evolution, trainer and attack. Does not end the turn.
    pub fn run_computer_turn(&mut self) -> Vec<ActionOutcome> {
        let player = self.state.active_player;
        let mut budget = ActionBudget(self.config.computer_action_budget);
        let mut outcomes = vec![];
        info!("computer turn for player {player:?}");

        self.computer_play_basic(player, &mut budget, &mut outcomes);
        if !self.state.turn_flags.energy_attached {
            self.computer_attach_energy(player, &mut budget, &mut outcomes);
        }
        self.computer_evolve(player, &mut budget, &mut outcomes);
        self.computer_use_trainer(player, &mut budget, &mut outcomes);
        self.computer_attack(player, &mut budget, &mut outcomes);

        info!(
            "computer made {} actions",
            outcomes.iter().filter(|o| o.success).count()
        );
        outcomes
    }

    fn computer_execute(
        &mut self,
        player: Player,
        action: GameAction,
        budget: &mut ActionBudget,
        outcomes: &mut Vec<ActionOutcome>,
    ) -> bool {
        if !budget.available()
            || self.state.game_outcome.is_some()
            || self.state.pending_choice.is_some()
        {
            return false;
        }
        let outcome = self.execute(player, action);
        let success = outcome.success;
        if success {
            budget.0 -= 1;
        }
        outcomes.push(outcome);
        success
    }

    fn computer_play_basic(
        &mut self,
        player: Player,
        budget: &mut ActionBudget,
        outcomes: &mut Vec<ActionOutcome>,
    ) {
        // - active first, then the bench, one creature
        let basic = self.board(player).hand().find(|c| {
            self.validate_action(player, &PlayBasic { card: *c }.into())
                .is_ok()
        });
        if let Some(card) = basic {
            self.computer_execute(player, PlayBasic { card }.into(), budget, outcomes);
        }
    }

    /// How much the creature wants the next energy
    pub fn energy_target_score(&self, player: Player, card: CardRef) -> f64 {
        let Some(creature) = self.lookup_creature(card) else {
            return f64::MIN;
        };
        let colorless_weight = self.config.colorless_weight;
        let attached = self.state.attached_energy(card);

        let mut score = if self.board(player).active == Some(card) {
            10.0
        } else {
            5.0
        };
        for (attack_idx, _, check) in self.available_attacks(card) {
            if self.would_enable_attack(card, attack_idx) {
                score += 20.0 * colorless_weight;
            } else if check.is_usable() {
                score += 3.0;
            }
        }
        score += 0.15 * creature.hp as f64;
        score -= 1.5 * attached.total as f64;
        if let Some(attack) = creature.attack(0) {
            score += 2.0 * attack.cost.wildcard() as f64;
        }
        if let Some(attack) = creature.attack(1) {
            score += 1.5 * attack.cost.wildcard() as f64;
        }
        debug!("energy score for {card}: {score}");
        score
    }

    fn computer_attach_energy(
        &mut self,
        player: Player,
        budget: &mut ActionBudget,
        outcomes: &mut Vec<ActionOutcome>,
    ) {
        let Some(energy) = self
            .board(player)
            .hand()
            .find(|c| self.state.card(*c).and_then(|i| i.energy()).is_some())
        else {
            return;
        };

        // the first creature wins ties
        let mut best: Option<(CardRef, f64)> = None;
        for card in self.board(player).creatures() {
            let score = self.energy_target_score(player, card);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((card, score));
            }
        }
        if let Some((target, _)) = best {
            self.computer_execute(
                player,
                AttachEnergy {
                    card: energy,
                    target,
                }
                .into(),
                budget,
                outcomes,
            );
        }
    }

    fn computer_evolve(
        &mut self,
        player: Player,
        budget: &mut ActionBudget,
        outcomes: &mut Vec<ActionOutcome>,
    ) {
        let evolutions = self
            .board(player)
            .hand()
            .filter(|c| self.lookup_creature(*c).is_some_and(|c| !c.is_basic()))
            .collect_vec();
        for card in evolutions {
            // active first, the bench in slot order
            let target = self
                .board(player)
                .creatures()
                .find(|t| self.validate_action(player, &Evolve { card, target: *t }.into()).is_ok());
            if let Some(target) = target {
                self.computer_execute(player, Evolve { card, target }.into(), budget, outcomes);
            }
        }
    }

    fn computer_use_trainer(
        &mut self,
        player: Player,
        budget: &mut ActionBudget,
        outcomes: &mut Vec<ActionOutcome>,
    ) {
        let supporter_allowed =
            !self.state.is_first_player_first_turn() && !self.state.turn_flags.supporter_used;
        let trainers = self
            .board(player)
            .hand()
            .filter_map(|c| {
                self.state
                    .card(c)
                    .and_then(|i| i.trainer())
                    .map(|t| (c, t.kind))
            })
            .collect_vec();

        let supporter = trainers
            .iter()
            .find(|(_, kind)| *kind == TrainerKind::Supporter)
            .filter(|_| supporter_allowed);
        let other = trainers
            .iter()
            .find(|(_, kind)| matches!(kind, TrainerKind::Item | TrainerKind::Stadium));
        if let Some((card, _)) = supporter.or(other) {
            self.computer_execute(player, UseTrainer { card: *card }.into(), budget, outcomes);
        }
    }

    /// Score of an attack the active creature can use now
    pub fn attack_score(&self, player: Player, attack_idx: usize) -> Option<f64> {
        let attacker = self.board(player).active?;
        let defender = self.board(player.opponent()).active?;
        let attacker_card = self.lookup_creature(attacker)?;
        let defender_card = self.lookup_creature(defender)?;
        let attack = attacker_card.attack(attack_idx)?;
        let calc = resolve_damage(attacker_card, defender_card, attack_idx, &self.config)?;

        let damage = calc.damage as f64;

        let mut score = damage;
        if self.state.instance(defender).damage.saturating_add(calc.damage) >= defender_card.hp {
            score += 50.0;
        }
        // a free attack gets no cost efficiency
        let cost_units = attack.cost.total();
        if cost_units > 0 {
            let cost_units = cost_units as f64;
            let colorless_ratio = attack.cost.wildcard() as f64 / cost_units;
            score += 15.0 * colorless_ratio * self.config.colorless_weight;
            score += 3.0 * damage / cost_units;
        }
        if attack
            .effect
            .as_deref()
            .is_some_and(|e| !status_from_effect(e).is_empty())
        {
            score += 12.0;
        }
        debug!("attack score for {} : {score}", attack.name);
        Some(score)
    }

    fn computer_attack(
        &mut self,
        player: Player,
        budget: &mut ActionBudget,
        outcomes: &mut Vec<ActionOutcome>,
    ) {
        let attacks = self
            .board(player)
            .active
            .and_then(|c| self.lookup_creature(c))
            .map(|c| c.attacks.len())
            .unwrap_or(0);

        let mut best: Option<(usize, f64)> = None;
        for attack_idx in 0..attacks {
            let action = actions::Attack { attack_idx }.into();
            if self.validate_action(player, &action).is_err() {
                continue;
            }
            let Some(score) = self.attack_score(player, attack_idx) else {
                continue;
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((attack_idx, score));
            }
        }
        if let Some((attack_idx, _)) = best {
            self.computer_execute(
                player,
                actions::Attack { attack_idx }.into(),
                budget,
                outcomes,
            );
        }
    }
}
