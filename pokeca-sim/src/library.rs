use std::collections::{BTreeMap, HashMap};

use iter_tools::Itertools;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cards::*;
use crate::error::LoadError;

pub type DeckId = u32;

/// Card definitions with the number of copies, as used to build a deck
pub type DeckList = Vec<(Card, u32)>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardLibrary {
    pub cards: HashMap<CardId, Card>,
    pub decks: BTreeMap<DeckId, Deck>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub name: String,
    pub cards: Vec<(CardId, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
enum CardKindName {
    Creature,
    Trainer,
    Energy,
    Tool,
}

impl TryFrom<String> for CardKindName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let kind = match value.trim().to_lowercase().as_str() {
            "creature" | "pokemon" | "ポケモン" => CardKindName::Creature,
            "trainer" | "トレーナー" => CardKindName::Trainer,
            "energy" | "エネルギー" => CardKindName::Energy,
            "tool" | "ポケモンのどうぐ" => CardKindName::Tool,
            _ => return Err(format!("unknown card kind: {value}")),
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CardRow {
    id: CardId,
    name: String,
    kind: CardKindName,
    hp: Option<u32>,
    #[serde(rename = "type")]
    energy_type: Option<EnergyType>,
    #[serde(default)]
    stage: u8,
    evolves_from: Option<String>,
    #[serde(default)]
    attacks: Vec<Attack>,
    weakness: Option<EnergyType>,
    resistance: Option<EnergyType>,
    #[serde(default)]
    retreat_cost: u32,
    trainer_kind: Option<TrainerKind>,
    effect: Option<String>,
}

impl TryFrom<CardRow> for Card {
    type Error = String;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let name = row.name.trim().to_string();
        if name.is_empty() {
            return Err("missing name".into());
        }

        let card = match row.kind {
            CardKindName::Creature => {
                let hp = row.hp.filter(|hp| *hp > 0).ok_or("creature without hp")?;
                let creature_type = row.energy_type.ok_or("creature without type")?;
                if row.attacks.len() > 2 {
                    return Err(format!("{} attacks, at most 2", row.attacks.len()));
                }
                let evolves_from = row
                    .evolves_from
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty());
                if row.stage > 0 && evolves_from.is_none() {
                    return Err("evolution without evolves_from".into());
                }
                Card::Creature(CreatureCard {
                    id: row.id,
                    name,
                    hp,
                    creature_type,
                    stage: row.stage,
                    evolves_from: if row.stage > 0 { evolves_from } else { None },
                    attacks: row.attacks,
                    weakness: row.weakness,
                    resistance: row.resistance,
                    retreat_cost: row.retreat_cost,
                })
            }
            CardKindName::Trainer => Card::Trainer(TrainerCard {
                id: row.id,
                name,
                kind: row.trainer_kind.ok_or("trainer without trainer_kind")?,
                effect: row.effect,
            }),
            CardKindName::Energy => Card::Energy(EnergyCard {
                id: row.id,
                name,
                energy_type: row.energy_type.ok_or("energy without type")?,
            }),
            CardKindName::Tool => Card::Tool(ToolCard {
                id: row.id,
                name,
                effect: row.effect,
            }),
        };
        Ok(card)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DeckRow {
    id: DeckId,
    name: String,
    cards: Vec<DeckCardRow>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct DeckCardRow {
    card: CardId,
    count: u32,
}

impl CardLibrary {
    /// Reads `[[cards]]` and `[[decks]]` tables. Rows that cannot be used
    /// are skipped with a warning, only an unreadable file is an error.
    pub fn from_toml(text: &str) -> Result<Self, LoadError> {
        let mut table: toml::Table = toml::from_str(text)?;
        let mut library = CardLibrary::default();

        let card_rows = match table.remove("cards") {
            Some(toml::Value::Array(rows)) => rows,
            Some(_) => {
                warn!("cards should be an array of tables");
                vec![]
            }
            None => vec![],
        };
        for (i, row) in card_rows.into_iter().enumerate() {
            let card = row
                .try_into::<CardRow>()
                .map_err(|e| e.to_string())
                .and_then(Card::try_from);
            match card {
                Ok(card) => {
                    if library.cards.contains_key(&card.id()) {
                        warn!("card row {i}: duplicate id {}, skipped", card.id());
                        continue;
                    }
                    library.cards.insert(card.id(), card);
                }
                Err(e) => warn!("card row {i}: {e}, skipped"),
            }
        }

        let deck_rows = match table.remove("decks") {
            Some(toml::Value::Array(rows)) => rows,
            Some(_) => {
                warn!("decks should be an array of tables");
                vec![]
            }
            None => vec![],
        };
        for (i, row) in deck_rows.into_iter().enumerate() {
            let deck = match row.try_into::<DeckRow>() {
                Ok(deck) => deck,
                Err(e) => {
                    warn!("deck row {i}: {e}, skipped");
                    continue;
                }
            };
            let cards = deck
                .cards
                .iter()
                .filter(|c| {
                    let known = library.cards.contains_key(&c.card);
                    if !known {
                        warn!("deck {}: unknown card {}, skipped", deck.id, c.card);
                    }
                    known && c.count > 0
                })
                .map(|c| (c.card, c.count))
                .collect_vec();
            library.decks.insert(
                deck.id,
                Deck {
                    name: deck.name,
                    cards,
                },
            );
        }

        info!(
            "library loaded: {} cards, {} decks",
            library.cards.len(),
            library.decks.len()
        );
        Ok(library)
    }

    pub fn lookup_card(&self, card_id: CardId) -> Option<&Card> {
        self.cards.get(&card_id)
    }

    pub fn lookup_creature(&self, card_id: CardId) -> Option<&CreatureCard> {
        if let Some(Card::Creature(c)) = self.lookup_card(card_id) {
            Some(c)
        } else {
            None
        }
    }

    pub fn search_cards(&self, name: &str) -> Vec<&Card> {
        let name = name.to_lowercase();
        self.cards
            .values()
            .filter(|c| c.name().to_lowercase().contains(&name))
            .sorted_by_key(|c| c.id())
            .collect_vec()
    }

    /// Definitions and copy counts for one deck
    pub fn deck_list(&self, deck_id: DeckId) -> Result<DeckList, LoadError> {
        let deck = self
            .decks
            .get(&deck_id)
            .ok_or(LoadError::UnknownDeck(deck_id))?;
        let list = deck
            .cards
            .iter()
            .filter_map(|(id, count)| self.lookup_card(*id).map(|c| (c.clone(), *count)))
            .collect_vec();
        if list.is_empty() {
            return Err(LoadError::EmptyDeck(deck_id));
        }
        Ok(list)
    }
}
