use serde::Deserialize;
use tracing::warn;

use crate::error::LoadError;

/// Number of bench slots for each player
pub const BENCH_SIZE: usize = 5;

/// Tunable numbers of the rules and of the computer player
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub prize_count: usize,
    pub starting_hand_size: usize,
    pub mulligan_limit: u8,
    pub computer_action_budget: usize,
    pub colorless_weight: f64,
    pub weakness_multiplier: u32,
    pub resistance_reduction: u32,
    pub poison_damage: u32,
    pub burn_damage: u32,
    pub sleep_recovery_chance: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            prize_count: 6,
            starting_hand_size: 7,
            mulligan_limit: 10,
            computer_action_budget: 5,
            colorless_weight: 1.2,
            weakness_multiplier: 2,
            resistance_reduction: 30,
            poison_damage: 10,
            burn_damage: 20,
            sleep_recovery_chance: 0.5,
        }
    }
}

impl RulesConfig {
    pub fn from_toml(text: &str) -> Result<Self, LoadError> {
        let mut config: RulesConfig = toml::from_str(text)?;
        if !(0.0..=1.0).contains(&config.sleep_recovery_chance) {
            warn!(
                "sleep recovery chance {} is not a probability, using 0.5",
                config.sleep_recovery_chance
            );
            config.sleep_recovery_chance = 0.5;
        }
        Ok(config)
    }
}
