//! Marketplace API integrations.
//!
//! This crate wraps the order APIs of the supported marketplaces behind one
//! capability contract, [`MarketplaceApi`], with one concrete client per
//! platform ([`YandexApi`], [`OzonApi`]). Raw order payloads are normalized
//! into the canonical [`Order`] model by the per-platform [`OrderParser`]s.
//!
//! All fatal read/mutate calls retry transient upstream failures with bounded
//! exponential backoff. Lookups that only enhance a notification (SKU
//! mappings, shipping labels, pickup addresses) never fail the caller; they
//! degrade to an empty mapping, `None`, or a fallback string instead.

mod api;
mod config;
mod error;
mod order;
mod ozon;
mod parsers;
mod retry;
mod yandex;

pub use api::{MarketplaceApi, ShipmentApi};
pub use config::{OzonConfig, YandexConfig};
pub use error::MarketApiError;
pub use order::{Address, Delivery, Item, Order, SkuMapping, StatusItem};
pub use ozon::OzonApi;
pub use parsers::{parser_for, OrderParser, OzonOrderParser, YandexOrderParser};
pub use yandex::YandexApi;
