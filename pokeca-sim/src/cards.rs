use std::collections::BTreeMap;
use std::fmt::Display;

use iter_tools::Itertools;
use serde::Deserialize;

use crate::gameplay::{CardRef, Player};

/**
 * Cards:
- creature (pokemon):
  - id
  - name
  - hp
  - type
  - stage (basic / 1 / 2)
  - evolves from
  - attacks (up to two)
    - name
    - cost
    - power
    - effect text
  - weakness / resistance
  - retreat cost

- trainer:
  - id
  - name
  - item / supporter / stadium / pokemon tool
  - effect text

- energy:
  - id
  - name
  - type

- tool:
  - id
  - name
  - effect text
 */

pub type CardId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum EnergyType {
    Grass,
    Fire,
    Water,
    Lightning,
    Psychic,
    Fighting,
    Darkness,
    Metal,
    Fairy,
    Dragon,
    /// can be paid with any energy
    Colorless,
}

impl EnergyType {
    /// Normalizes the different spellings found in card lists
    pub fn from_name(name: &str) -> Option<EnergyType> {
        let name = name.trim().to_lowercase();
        let energy_type = match name.as_str() {
            "grass" | "草" | "くさ" => EnergyType::Grass,
            "fire" | "炎" | "ほのお" => EnergyType::Fire,
            "water" | "水" | "みず" => EnergyType::Water,
            "lightning" | "electric" | "雷" | "でんき" | "かみなり" => EnergyType::Lightning,
            "psychic" | "超" | "エスパー" => EnergyType::Psychic,
            "fighting" | "闘" | "かくとう" => EnergyType::Fighting,
            "darkness" | "dark" | "悪" | "あく" => EnergyType::Darkness,
            "metal" | "steel" | "鋼" | "はがね" => EnergyType::Metal,
            "fairy" | "フェアリー" => EnergyType::Fairy,
            "dragon" | "ドラゴン" => EnergyType::Dragon,
            "colorless" | "normal" | "無色" | "ノーマル" => EnergyType::Colorless,
            _ => return None,
        };
        Some(energy_type)
    }

    pub fn is_wildcard(self) -> bool {
        self == EnergyType::Colorless
    }
}

impl TryFrom<String> for EnergyType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EnergyType::from_name(&value).ok_or_else(|| format!("unknown energy type: {value}"))
    }
}

impl Display for EnergyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Multiset of energy requirements, `Colorless` entries are the wildcard units
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<EnergyType>")]
pub struct EnergyCost(BTreeMap<EnergyType, u32>);

impl EnergyCost {
    pub fn new(energies: impl IntoIterator<Item = EnergyType>) -> Self {
        let mut cost = BTreeMap::new();
        for energy in energies {
            *cost.entry(energy).or_insert(0) += 1;
        }
        EnergyCost(cost)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }
    pub fn wildcard(&self) -> u32 {
        self.get(EnergyType::Colorless)
    }
    pub fn get(&self, energy_type: EnergyType) -> u32 {
        self.0.get(&energy_type).copied().unwrap_or(0)
    }
    /// Requirements that must be paid with their own type
    pub fn specific(&self) -> impl Iterator<Item = (EnergyType, u32)> + '_ {
        self.0
            .iter()
            .filter(|(t, _)| !t.is_wildcard())
            .map(|(t, n)| (*t, *n))
    }
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl From<Vec<EnergyType>> for EnergyCost {
    fn from(value: Vec<EnergyType>) -> Self {
        EnergyCost::new(value)
    }
}

impl Display for EnergyCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "no cost");
        }
        let text = self
            .0
            .iter()
            .map(|(t, n)| format!("{t} x{n}"))
            .collect_vec()
            .join(", ");
        write!(f, "{text}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Attack {
    pub name: String,
    #[serde(default)]
    pub power: u32,
    #[serde(default)]
    pub cost: EnergyCost,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum TrainerKind {
    Item,
    Supporter,
    Stadium,
    PokemonTool,
}

impl TryFrom<String> for TrainerKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let kind = match value.trim().to_lowercase().as_str() {
            "item" | "グッズ" => TrainerKind::Item,
            "supporter" | "サポート" => TrainerKind::Supporter,
            "stadium" | "スタジアム" => TrainerKind::Stadium,
            "pokemon_tool" | "pokemon tool" | "ポケモンのどうぐ" => TrainerKind::PokemonTool,
            _ => return Err(format!("unknown trainer kind: {value}")),
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Card {
    Creature(CreatureCard),
    Trainer(TrainerCard),
    Energy(EnergyCard),
    Tool(ToolCard),
}

impl Card {
    pub fn id(&self) -> CardId {
        match self {
            Card::Creature(c) => c.id,
            Card::Trainer(t) => t.id,
            Card::Energy(e) => e.id,
            Card::Tool(t) => t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Card::Creature(c) => &c.name,
            Card::Trainer(t) => &t.name,
            Card::Energy(e) => &e.name,
            Card::Tool(t) => &t.name,
        }
    }

    /// Used as part of the card reference
    pub fn kind_id(&self) -> u16 {
        match self {
            Card::Creature(_) => 0,
            Card::Trainer(_) => 1,
            Card::Energy(_) => 2,
            Card::Tool(_) => 3,
        }
    }

    /// Tools and pokemon tool trainers are both attached to creatures
    pub fn is_attachable_tool(&self) -> bool {
        match self {
            Card::Tool(_) => true,
            Card::Trainer(t) => t.kind == TrainerKind::PokemonTool,
            Card::Creature(_) | Card::Energy(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatureCard {
    pub id: CardId,
    pub name: String,
    pub hp: u32,
    pub creature_type: EnergyType,
    pub stage: u8,
    pub evolves_from: Option<String>,
    pub attacks: Vec<Attack>,
    pub weakness: Option<EnergyType>,
    pub resistance: Option<EnergyType>,
    pub retreat_cost: u32,
}

impl CreatureCard {
    pub fn is_basic(&self) -> bool {
        self.stage == 0
    }

    pub fn evolves_from(&self, target: &CreatureCard) -> bool {
        !self.is_basic() && self.evolves_from.as_deref() == Some(target.name.as_str())
    }

    pub fn attack(&self, attack_idx: usize) -> Option<&Attack> {
        self.attacks.get(attack_idx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerCard {
    pub id: CardId,
    pub name: String,
    pub kind: TrainerKind,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyCard {
    pub id: CardId,
    pub name: String,
    pub energy_type: EnergyType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCard {
    pub id: CardId,
    pub name: String,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusCondition {
    Poison,
    Burn,
    Sleep,
    Paralysis,
    Confusion,
}

impl StatusCondition {
    /// Only one of sleep, paralysis and confusion can be active at a time
    pub fn is_exclusive(self) -> bool {
        matches!(
            self,
            StatusCondition::Sleep | StatusCondition::Paralysis | StatusCondition::Confusion
        )
    }

    pub fn prevents_retreat(self) -> bool {
        matches!(self, StatusCondition::Sleep | StatusCondition::Paralysis)
    }
}

impl Display for StatusCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One physical copy of a card, with its own battle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInstance {
    pub owner: Player,
    pub card: Card,
    pub damage: u32,
    pub energies: Vec<CardRef>,
    pub tools: Vec<CardRef>,
    pub status: Vec<StatusCondition>,
    pub summoned_this_turn: bool,
    pub evolved_this_turn: bool,
}

impl CardInstance {
    pub fn new(owner: Player, card: Card) -> Self {
        CardInstance {
            owner,
            card,
            damage: 0,
            energies: Vec::new(),
            tools: Vec::new(),
            status: Vec::new(),
            summoned_this_turn: false,
            evolved_this_turn: false,
        }
    }

    pub fn creature(&self) -> Option<&CreatureCard> {
        if let Card::Creature(c) = &self.card {
            Some(c)
        } else {
            None
        }
    }
    pub fn trainer(&self) -> Option<&TrainerCard> {
        if let Card::Trainer(t) = &self.card {
            Some(t)
        } else {
            None
        }
    }
    pub fn energy(&self) -> Option<&EnergyCard> {
        if let Card::Energy(e) = &self.card {
            Some(e)
        } else {
            None
        }
    }

    pub fn hp(&self) -> Option<u32> {
        self.creature().map(|c| c.hp)
    }

    pub fn remaining_hp(&self) -> u32 {
        self.hp().unwrap_or(0).saturating_sub(self.damage)
    }

    pub fn is_knocked_out(&self) -> bool {
        self.hp().is_some_and(|hp| self.damage >= hp)
    }

    pub fn heal(&mut self, amount: u32) {
        self.damage = self.damage.saturating_sub(amount);
    }

    pub fn has_status(&self, status: StatusCondition) -> bool {
        self.status.contains(&status)
    }

    pub fn add_status(&mut self, status: StatusCondition) {
        if self.has_status(status) {
            return;
        }
        if status.is_exclusive() {
            self.status.retain(|s| !s.is_exclusive());
        }
        self.status.push(status);
    }

    pub fn remove_status(&mut self, status: StatusCondition) {
        self.status.retain(|s| *s != status);
    }

    /// The first condition that keeps the creature in the active spot
    pub fn retreat_blocked_by(&self) -> Option<StatusCondition> {
        self.status.iter().copied().find(|s| s.prevents_retreat())
    }

    pub fn can_attach_tool(&self) -> bool {
        self.creature().is_some() && self.tools.is_empty()
    }

    pub fn clear_turn_flags(&mut self) {
        self.summoned_this_turn = false;
        self.evolved_this_turn = false;
    }
}
