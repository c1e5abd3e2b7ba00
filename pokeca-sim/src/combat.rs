use tracing::{debug, info};

use crate::cards::{Attack, CardInstance, CreatureCard, StatusCondition};
use crate::config::RulesConfig;

/// Damage of one attack, with each modifier that was applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DamageCalculation {
    pub damage: u32,
    pub steps: Vec<String>,
}

/// Attack damage against the defender: weakness first, then resistance.
/// `None` when the attack does not exist.
pub fn resolve_damage(
    attacker: &CreatureCard,
    defender: &CreatureCard,
    attack_idx: usize,
    config: &RulesConfig,
) -> Option<DamageCalculation> {
    let attack = attacker.attack(attack_idx)?;
    let mut calc = DamageCalculation {
        damage: attack.power,
        steps: vec![format!("{}: {} base damage", attack.name, attack.power)],
    };

    // no damage, no modifiers
    if calc.damage == 0 {
        return Some(calc);
    }

    if defender.weakness == Some(attacker.creature_type) {
        calc.damage = calc.damage.saturating_mul(config.weakness_multiplier);
        calc.steps.push(format!(
            "weakness to {}: x{} = {}",
            attacker.creature_type, config.weakness_multiplier, calc.damage
        ));
    }

    if defender.resistance == Some(attacker.creature_type) {
        calc.damage = calc.damage.saturating_sub(config.resistance_reduction);
        calc.steps.push(format!(
            "resistance to {}: -{} = {}",
            attacker.creature_type, config.resistance_reduction, calc.damage
        ));
    }

    let bonus = energy_bonus(attacker, attack);
    if bonus > 0 {
        calc.damage = calc.damage.saturating_add(bonus);
        calc.steps.push(format!("energy bonus: +{bonus} = {}", calc.damage));
    }

    debug!("damage calculation: {}", calc.steps.join(", "));
    Some(calc)
}

/// Extra damage from attached energies, no card uses it yet
fn energy_bonus(_attacker: &CreatureCard, _attack: &Attack) -> u32 {
    0
}

/// Returns true if the defender is knocked out
pub fn apply_damage(defender: &mut CardInstance, amount: u32) -> bool {
    if amount == 0 {
        return false;
    }
    defender.damage = defender.damage.saturating_add(amount);
    info!(
        "{} takes {amount} damage, {} hp remaining",
        defender.card.name(),
        defender.remaining_hp()
    );
    defender.is_knocked_out()
}

const STATUS_KEYWORDS: [(&[&str], StatusCondition); 5] = [
    (&["confus", "混乱", "こんらん"], StatusCondition::Confusion),
    (&["poison", "毒", "どく"], StatusCondition::Poison),
    (&["burn", "火傷", "やけど"], StatusCondition::Burn),
    (
        &["paralys", "paralyz", "麻痺", "マヒ"],
        StatusCondition::Paralysis,
    ),
    (&["sleep", "asleep", "眠り", "ねむり"], StatusCondition::Sleep),
];

/// Status conditions named in the effect text
pub fn status_from_effect(effect: &str) -> Vec<StatusCondition> {
    let effect = effect.to_lowercase();
    STATUS_KEYWORDS
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| effect.contains(k)))
        .map(|(_, status)| *status)
        .collect()
}

/// Applies the status conditions of the attack to the defender
pub fn apply_attack_effects(attack: &Attack, defender: &mut CardInstance) -> Vec<StatusCondition> {
    let Some(effect) = &attack.effect else {
        return vec![];
    };
    let conditions = status_from_effect(effect);
    for status in &conditions {
        info!("{} is now {status}", defender.card.name());
        defender.add_status(*status);
    }
    conditions
}
