use std::collections::BTreeMap;
use std::fmt::Display;

use iter_tools::Itertools;
use tracing::debug;

use crate::cards::{Attack, EnergyCost, EnergyType};
use crate::gameplay::{CardRef, Game};

/// Energies attached to a creature, counted by type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedEnergy {
    pub counts: BTreeMap<EnergyType, u32>,
    pub total: u32,
}

impl AttachedEnergy {
    pub fn new(energies: impl IntoIterator<Item = EnergyType>) -> Self {
        let mut attached = AttachedEnergy::default();
        for energy in energies {
            *attached.counts.entry(energy).or_default() += 1;
            attached.total += 1;
        }
        attached
    }

    pub fn get(&self, energy_type: EnergyType) -> u32 {
        self.counts.get(&energy_type).copied().unwrap_or(0)
    }

    /// Same energies, plus one of any type
    fn with_one_more(&self) -> Self {
        let mut more = self.clone();
        *more.counts.entry(EnergyType::Colorless).or_default() += 1;
        more.total += 1;
        more
    }
}

impl Display for AttachedEnergy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.total == 0 {
            return write!(f, "no energy");
        }
        let counts = self
            .counts
            .iter()
            .map(|(t, n)| format!("{t}: {n}"))
            .join(", ");
        write!(f, "{counts} (total {})", self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnergyCheck {
    /// can be paid, with the breakdown of the payment
    Usable(String),
    Blocked(EnergyShortfall),
}

impl EnergyCheck {
    pub fn is_usable(&self) -> bool {
        matches!(self, EnergyCheck::Usable(_))
    }
}

impl Display for EnergyCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyCheck::Usable(payment) => write!(f, "usable: {payment}"),
            EnergyCheck::Blocked(shortfall) => write!(f, "blocked: {shortfall}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnergyShortfall {
    Total { required: u32, attached: u32 },
    /// (type, required, attached) for every type that is missing
    Specific(Vec<(EnergyType, u32, u32)>),
    Wildcard { required: u32, available: u32 },
}

impl Display for EnergyShortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyShortfall::Total { required, attached } => write!(
                f,
                "not enough energy: {required} required, {attached} attached"
            ),
            EnergyShortfall::Specific(missing) => {
                let missing = missing
                    .iter()
                    .map(|(t, required, attached)| {
                        format!("{t} {} missing ({attached}/{required})", required - attached)
                    })
                    .join(", ");
                write!(f, "{missing}")
            }
            EnergyShortfall::Wildcard {
                required,
                available,
            } => write!(
                f,
                "{} missing ({available} remaining for {required})",
                EnergyType::Colorless
            ),
        }
    }
}

/// Checks if the attached energies can pay the cost.
///
/// Specific types are matched first, each type only by itself, and whatever
/// is left over pays for the colorless part. There is no search for a better
/// assignment.
pub fn check_energy_cost(cost: &EnergyCost, attached: &AttachedEnergy) -> EnergyCheck {
    if cost.is_empty() {
        return EnergyCheck::Usable("no cost".into());
    }

    // - enough energy in total
    let required = cost.total();
    if attached.total < required {
        return EnergyCheck::Blocked(EnergyShortfall::Total {
            required,
            attached: attached.total,
        });
    }

    // - every specific type
    let missing = cost
        .specific()
        .filter(|(t, n)| attached.get(*t) < *n)
        .map(|(t, n)| (t, n, attached.get(t)))
        .collect_vec();
    if !missing.is_empty() {
        return EnergyCheck::Blocked(EnergyShortfall::Specific(missing));
    }

    // - the rest pays for colorless
    let specific_total = cost.specific().map(|(_, n)| n).sum::<u32>();
    let available = attached.total - specific_total;
    let wildcard = cost.wildcard();
    if available < wildcard {
        return EnergyCheck::Blocked(EnergyShortfall::Wildcard {
            required: wildcard,
            available,
        });
    }

    let mut payment = cost
        .specific()
        .map(|(t, n)| format!("{t}: {n}/{n} used"))
        .collect_vec();
    if wildcard > 0 {
        payment.push(format!(
            "{}: {wildcard}/{wildcard} used (from {available} remaining)",
            EnergyType::Colorless
        ));
    }
    EnergyCheck::Usable(payment.join(", "))
}

/// One more energy of any type would make the cost payable.
/// Every specific type needs to be covered already.
pub fn would_enable_with_one_more(cost: &EnergyCost, attached: &AttachedEnergy) -> bool {
    !check_energy_cost(cost, attached).is_usable()
        && check_energy_cost(cost, &attached.with_one_more()).is_usable()
}

impl Game {
    /// Each attack of the creature, with the result of its energy check
    pub fn available_attacks(&self, card: CardRef) -> Vec<(usize, &Attack, EnergyCheck)> {
        let Some(creature) = self.lookup_creature(card) else {
            return vec![];
        };
        let attached = self.state.attached_energy(card);
        creature
            .attacks
            .iter()
            .enumerate()
            .map(|(i, attack)| {
                let check = check_energy_cost(&attack.cost, &attached);
                debug!("{card} attack {} ({}): {check}", attack.name, attack.cost);
                (i, attack, check)
            })
            .collect_vec()
    }

    pub fn energy_summary(&self, card: CardRef) -> String {
        self.state.attached_energy(card).to_string()
    }

    pub fn would_enable_attack(&self, card: CardRef, attack_idx: usize) -> bool {
        self.lookup_creature(card)
            .and_then(|c| c.attack(attack_idx))
            .is_some_and(|a| would_enable_with_one_more(&a.cost, &self.state.attached_energy(card)))
    }
}
