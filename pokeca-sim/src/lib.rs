pub mod actions;
pub mod cards;
pub mod combat;
pub mod config;
pub mod energy;
pub mod error;
pub mod gameplay;
pub mod library;
pub mod opponent;
pub mod prompters;
