use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{MarketApiError, SkuMapping, StatusItem};

/// The shared capability contract every marketplace client implements. Raw
/// orders are returned as untyped JSON; normalization is the parsers' job.
///
/// Call classification is part of the contract: `get_orders`,
/// `set_order_status` and `get_order_info` retry transient failures and then
/// surface an error; `get_market_sku`, `get_label` and
/// `get_pickup_point_address` are best-effort enhancements that degrade to an
/// empty mapping, `None`, or a fallback string and never fail the caller.
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Fetches orders in the given provider-specific lifecycle state.
    async fn get_orders(&self, status: &str, substatus: Option<&str>) -> Result<Vec<Value>, MarketApiError>;

    /// Maps seller SKUs to public catalog identifiers. Unresolvable SKUs are
    /// simply absent from the result.
    async fn get_market_sku(&self, shop_skus: &[String]) -> HashMap<String, SkuMapping>;

    /// Fetches the shipping label PDF for an order.
    async fn get_label(&self, order_id: &str) -> Option<Vec<u8>>;

    /// Returns a human-readable pickup point address, or a fallback string
    /// when it cannot be resolved.
    async fn get_pickup_point_address(&self, order_id: &str) -> String;

    /// Transitions the order to the given provider-specific state. The raw
    /// response body is returned for policy interpretation by the caller;
    /// an application-level rejection inside a 2xx body is data, not an error.
    async fn set_order_status(
        &self,
        order_id: &str,
        status: &str,
        substatus: Option<&str>,
        items: &[StatusItem],
    ) -> Result<Value, MarketApiError>;

    /// Fetches the full current order detail, used to re-validate state before
    /// a mutation.
    async fn get_order_info(&self, order_id: &str) -> Result<Value, MarketApiError>;

    /// Base URL for public product pages on this marketplace.
    fn market_url(&self) -> &str;

    /// Capability probe: platforms that group orders into outbound shipment
    /// batches ("carriages") expose the extended contract here.
    fn shipments(&self) -> Option<&dyn ShipmentApi> {
        None
    }
}

/// Extended capability for platforms that require a shipment batch to be
/// created and approved after an order is marked ready.
#[async_trait]
pub trait ShipmentApi: Send + Sync {
    /// Creates a carriage for the delivery method and departure date, and
    /// returns its id.
    async fn create_carriage(&self, delivery_method_id: i64, departure_date: &str) -> Result<i64, MarketApiError>;

    async fn approve_carriage(
        &self,
        carriage_id: i64,
        containers_count: Option<u32>,
    ) -> Result<Value, MarketApiError>;

    /// Fetches the carriage handover document. Best effort, like order labels.
    async fn get_carriage_label(&self, carriage_id: i64) -> Option<Vec<u8>>;
}
