use chrono::{NaiveDate, NaiveDateTime};
use sb_common::Platform;
use serde_json::Value;

use crate::{
    order::NO_SHIPMENT_DATE,
    Address,
    Delivery,
    Item,
    MarketApiError,
    Order,
};

/// Pure, stateless mapping from a platform's raw order payload to the
/// canonical [`Order`]. Missing optional fields fall back to defined defaults;
/// a missing id or items list is a hard [`MarketApiError::MalformedOrder`].
///
/// The shipment-date layout is a platform detail, so re-parsing the canonical
/// string also goes through the parser - code downstream never guesses a
/// format.
pub trait OrderParser: Send + Sync {
    fn parse(&self, raw: &Value) -> Result<Order, MarketApiError>;

    /// Parses the provider-native shipment-date string. `None` on any layout
    /// mismatch; callers log and skip rather than abort.
    fn parse_shipment_date(&self, raw: &str) -> Option<NaiveDateTime>;
}

pub struct YandexOrderParser;
pub struct OzonOrderParser;

static YANDEX_PARSER: YandexOrderParser = YandexOrderParser;
static OZON_PARSER: OzonOrderParser = OzonOrderParser;

/// Resolves the parser registered for a platform. Unknown platform *names* are
/// rejected when the string is parsed into [`Platform`], long before a sweep
/// runs, so this lookup is total.
pub fn parser_for(platform: Platform) -> &'static dyn OrderParser {
    match platform {
        Platform::Yandex => &YANDEX_PARSER,
        Platform::Ozon => &OZON_PARSER,
    }
}

impl OrderParser for YandexOrderParser {
    fn parse(&self, raw: &Value) -> Result<Order, MarketApiError> {
        let id = scalar_to_string(&raw["id"])
            .ok_or_else(|| MarketApiError::MalformedOrder("Yandex order has no 'id'".to_string()))?;
        let raw_items = raw["items"]
            .as_array()
            .ok_or_else(|| MarketApiError::MalformedOrder(format!("Yandex order #{id} has no 'items' list")))?;
        let items = raw_items
            .iter()
            .map(|item| Item {
                shop_sku: scalar_to_string(&item["shopSku"]).unwrap_or_default(),
                offer_name: str_or_default(&item["offerName"]),
                count: item["count"].as_u64().unwrap_or(0) as u32,
                id: scalar_to_string(&item["id"]),
            })
            .collect();
        let raw_address = &raw["delivery"]["address"];
        let address = Address {
            country: str_or_default(&raw_address["country"]),
            postcode: str_or_default(&raw_address["postcode"]),
            city: str_or_default(&raw_address["city"]),
            street: str_or_default(&raw_address["street"]),
            house: str_or_default(&raw_address["house"]),
            block: str_or_default(&raw_address["block"]),
        };
        let shipment_date = raw["delivery"]["shipments"][0]["shipmentDate"]
            .as_str()
            .unwrap_or(NO_SHIPMENT_DATE)
            .to_string();
        Ok(Order {
            id,
            items,
            delivery: Delivery { address, shipment_date },
            items_total: raw["itemsTotal"].as_f64().unwrap_or(0.0),
            status: str_or_default(&raw["status"]),
            substatus: str_or_default(&raw["substatus"]),
        })
    }

    fn parse_shipment_date(&self, raw: &str) -> Option<NaiveDateTime> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

impl OrderParser for OzonOrderParser {
    fn parse(&self, raw: &Value) -> Result<Order, MarketApiError> {
        let id = raw["posting_number"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| MarketApiError::MalformedOrder("Ozon posting has no 'posting_number'".to_string()))?;
        let items = raw["products"]
            .as_array()
            .map(|products| {
                products
                    .iter()
                    .map(|item| Item {
                        shop_sku: scalar_to_string(&item["sku"]).unwrap_or_default(),
                        offer_name: str_or_default(&item["name"]),
                        count: item["quantity"].as_u64().unwrap_or(0) as u32,
                        id: scalar_to_string(&item["posting_number"]),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let raw_address = &raw["delivery"]["address"];
        let address = Address {
            city: str_or_default(&raw_address["city"]),
            street: str_or_default(&raw_address["address_tail"]),
            postcode: str_or_default(&raw_address["zip_code"]),
            ..Address::default()
        };
        let shipment_date = raw["shipment_date"].as_str().unwrap_or(NO_SHIPMENT_DATE).to_string();
        // The posting total comes back as a decimal string in some responses
        // and a bare number in others.
        let items_total = match &raw["price"] {
            Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
            other => other.as_f64().unwrap_or(0.0),
        };
        Ok(Order {
            id,
            items,
            delivery: Delivery { address, shipment_date },
            items_total,
            status: str_or_default(&raw["status"]),
            substatus: String::new(),
        })
    }

    fn parse_shipment_date(&self, raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ").ok()
    }
}

fn str_or_default(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

/// Providers are inconsistent about numeric vs string ids, so both are
/// accepted and stringified.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use sb_common::Platform;
    use serde_json::json;

    use super::{parser_for, OrderParser, OzonOrderParser, YandexOrderParser};
    use crate::MarketApiError;

    #[test]
    fn yandex_order_parses_with_links_and_address() {
        let raw = json!({
            "id": 456,
            "items": [{"shopSku": "sku1", "offerName": "Item1", "count": 2, "id": 9001}],
            "delivery": {
                "address": {"city": "Moscow"},
                "shipments": [{"shipmentDate": "2025-04-10"}]
            },
            "itemsTotal": 500.0,
            "status": "PROCESSING",
            "substatus": "STARTED"
        });
        let order = YandexOrderParser.parse(&raw).unwrap();
        assert_eq!(order.id, "456");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].shop_sku, "sku1");
        assert_eq!(order.items[0].count, 2);
        assert_eq!(order.items[0].id.as_deref(), Some("9001"));
        assert_eq!(order.delivery.address.city, "Moscow");
        assert_eq!(order.delivery.shipment_date, "2025-04-10");
        assert_eq!(order.items_total, 500.0);
    }

    #[test]
    fn yandex_optional_fields_default_instead_of_failing() {
        let raw = json!({"id": "7", "items": [], "delivery": {}});
        let order = YandexOrderParser.parse(&raw).unwrap();
        assert_eq!(order.delivery.shipment_date, "Not specified");
        assert_eq!(order.items_total, 0.0);
        assert_eq!(order.status, "");
        assert_eq!(order.delivery.address.city, "");
    }

    #[test]
    fn yandex_missing_id_is_malformed() {
        let raw = json!({"items": [], "delivery": {}});
        assert!(matches!(YandexOrderParser.parse(&raw), Err(MarketApiError::MalformedOrder(_))));
    }

    #[test]
    fn yandex_missing_items_list_is_malformed() {
        let raw = json!({"id": "456", "delivery": {}});
        assert!(matches!(YandexOrderParser.parse(&raw), Err(MarketApiError::MalformedOrder(_))));
    }

    #[test]
    fn ozon_posting_parses() {
        let raw = json!({
            "posting_number": "789",
            "products": [{"sku": 111222, "name": "Item2", "quantity": 3}],
            "delivery": {"address": {"city": "SPb", "address_tail": "Nevsky 1", "zip_code": "190000"}},
            "shipment_date": "2025-04-11T10:00:00Z",
            "price": "300",
            "status": "awaiting_packaging"
        });
        let order = OzonOrderParser.parse(&raw).unwrap();
        assert_eq!(order.id, "789");
        assert_eq!(order.items[0].offer_name, "Item2");
        assert_eq!(order.items[0].shop_sku, "111222");
        assert_eq!(order.items_total, 300.0);
        assert_eq!(order.delivery.address.street, "Nevsky 1");
        assert_eq!(order.substatus, "");
    }

    #[test]
    fn ozon_missing_posting_number_is_malformed() {
        let raw = json!({"products": []});
        assert!(matches!(OzonOrderParser.parse(&raw), Err(MarketApiError::MalformedOrder(_))));
    }

    #[test]
    fn shipment_date_layouts_are_platform_specific() {
        let yandex = parser_for(Platform::Yandex);
        let ozon = parser_for(Platform::Ozon);
        assert!(yandex.parse_shipment_date("2025-04-10").is_some());
        assert!(yandex.parse_shipment_date("2025-04-10T00:00:00Z").is_none());
        assert!(ozon.parse_shipment_date("2025-04-11T10:00:00Z").is_some());
        assert!(ozon.parse_shipment_date("2025-04-11").is_none());
        assert!(yandex.parse_shipment_date("Not specified").is_none());
    }
}
