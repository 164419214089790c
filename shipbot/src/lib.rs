//! Marketplace order notification bot.
//!
//! The bot polls the configured marketplaces for orders in specific lifecycle
//! states, announces new orders to a group chat with an action button and a
//! shipping label, escalates overdue shipments, posts a daily task summary,
//! and advances an order's fulfillment state when an operator presses the
//! button. Already-announced order ids are tracked in a durable set store so
//! notifications are sent at most once.

pub mod bot;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod i18n;
pub mod service;
pub mod sink;
pub mod stats;
pub mod store;
pub mod telegram;
pub mod workers;

#[cfg(test)]
mod test;
