use std::fmt::{self, Display};

use crate::gameplay::Player;
use crate::library::DeckId;

/// Errors that stop a match from being set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    EmptyDeckList(Player),
    DeckTooLarge(Player, usize),
    DeckTooSmall {
        player: Player,
        required: usize,
        remaining: usize,
    },
    MulliganLimitExceeded(Player),
    InvalidPlacement(Player, String),
    NotReady(String),
}

impl Display for SetupError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetupError::EmptyDeckList(player) => {
                write!(formatter, "player {player:?} has no card in their deck list")
            }
            SetupError::DeckTooLarge(player, size) => {
                write!(formatter, "player {player:?} deck is too large: {size} cards")
            }
            SetupError::DeckTooSmall {
                player,
                required,
                remaining,
            } => write!(
                formatter,
                "player {player:?} deck is too small: {required} needed, {remaining} remaining"
            ),
            SetupError::MulliganLimitExceeded(player) => write!(
                formatter,
                "player {player:?} could not find a basic creature within the mulligan limit"
            ),
            SetupError::InvalidPlacement(player, reason) => {
                write!(formatter, "invalid placement for player {player:?}: {reason}")
            }
            SetupError::NotReady(reason) => write!(formatter, "game is not ready: {reason}"),
        }
    }
}

impl std::error::Error for SetupError {}

/// Errors while reading card lists and rules from files
#[derive(Debug)]
pub enum LoadError {
    Toml(toml::de::Error),
    UnknownDeck(DeckId),
    EmptyDeck(DeckId),
}

impl Display for LoadError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::Toml(e) => write!(formatter, "could not read toml: {e}"),
            LoadError::UnknownDeck(id) => write!(formatter, "unknown deck: {id}"),
            LoadError::EmptyDeck(id) => write!(formatter, "deck {id} has no valid card"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<toml::de::Error> for LoadError {
    fn from(value: toml::de::Error) -> Self {
        LoadError::Toml(value)
    }
}
