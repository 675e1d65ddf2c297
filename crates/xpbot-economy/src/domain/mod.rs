//! # Domain Layer
//!
//! Pure economy logic: balances, accounts, the perk catalog and draw walk,
//! grant cooldowns, pending-transaction tokens, and configuration. Nothing
//! in this module touches storage or the chat platform.

pub mod account;
pub mod balance;
pub mod catalog;
pub mod config;
pub mod cooldown;
pub mod errors;
pub mod pending;
