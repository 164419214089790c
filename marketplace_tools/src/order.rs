use serde::{Deserialize, Serialize};

/// Sentinel rendered when a provider payload carries no shipment date.
pub const NO_SHIPMENT_DATE: &str = "Not specified";

/// The canonical, provider-agnostic order entity. Orders are rebuilt from
/// every poll response and never persisted as a whole; only `id` survives a
/// sweep, inside the dedup sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Provider-native order/posting identifier; unique within a platform
    /// namespace and the dedup identity key.
    pub id: String,
    pub items: Vec<Item>,
    pub delivery: Delivery,
    /// Order total, used for the gift-eligibility threshold.
    pub items_total: f64,
    /// Provider-specific status vocabulary. Not an enum: each platform
    /// defines its own legal pairs and transition rules.
    pub status: String,
    pub substatus: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The seller's own SKU; join key into the marketplace catalog.
    pub shop_sku: String,
    pub offer_name: String,
    pub count: u32,
    /// Marketplace-assigned line-item id, required by some status-update
    /// calls. Stored stringified since providers disagree on the type.
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub country: String,
    pub postcode: String,
    pub city: String,
    pub street: String,
    pub house: String,
    pub block: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub address: Address,
    /// Provider-native date string. The layout differs per platform, so it is
    /// only ever re-parsed through that platform's [`crate::OrderParser`].
    pub shipment_date: String,
}

impl Address {
    /// Joins the populated fields with commas, dropping empties, so a sparse
    /// address never renders dangling separators.
    pub fn join_nonempty(&self) -> String {
        [&self.country, &self.postcode, &self.city, &self.street, &self.house, &self.block]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join(", ")
    }
}

/// Public catalog identifiers for a seller SKU, used to build product deep
/// links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuMapping {
    pub market_sku: String,
    pub market_model_id: String,
}

/// Line-item echo payload for status-update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub count: u32,
}

#[cfg(test)]
mod test {
    use super::Address;

    #[test]
    fn sparse_address_renders_without_dangling_separators() {
        let address = Address {
            city: "Moscow".to_string(),
            street: "Tverskaya".to_string(),
            house: "1".to_string(),
            ..Address::default()
        };
        assert_eq!(address.join_nonempty(), "Moscow, Tverskaya, 1");
    }

    #[test]
    fn empty_address_renders_empty() {
        assert_eq!(Address::default().join_nonempty(), "");
    }
}
