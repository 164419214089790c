use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    RequestBuilder,
};
use serde_json::{json, Value};

use crate::{
    api::MarketplaceApi,
    config::YandexConfig,
    retry::with_retries,
    MarketApiError,
    SkuMapping,
    StatusItem,
};

const PICKUP_ADDRESS_FALLBACK: &str = "Pickup point address not found";

/// Client for the Yandex-style marketplace order API. Orders live under a
/// campaign; catalog mappings under a business account.
#[derive(Clone)]
pub struct YandexApi {
    config: YandexConfig,
    client: Arc<Client>,
}

impl YandexApi {
    pub fn new(config: YandexConfig) -> Result<Self, MarketApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let token = HeaderValue::from_str(config.api_token.reveal().as_str())
            .map_err(|e| MarketApiError::Initialization(e.to_string()))?;
        headers.insert("Api-Key", token);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MarketApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{path}", self.config.base_url))
    }

    async fn json_response(&self, req: RequestBuilder) -> Result<Value, MarketApiError> {
        let response = req.send().await.map_err(|e| MarketApiError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            response.json::<Value>().await.map_err(|e| MarketApiError::Json(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(MarketApiError::Upstream { status: status.as_u16(), message })
        }
    }

    async fn shipment_address(&self, shipment: &Value) -> Option<String> {
        if let Some(addr) = render_shipment_address(&shipment["delivery"]["address"]) {
            return Some(addr);
        }
        // Older shipment listings omit the address; the per-shipment detail
        // endpoint still carries it.
        let shipment_id = shipment["id"].as_i64()?;
        let path = format!("/campaigns/{}/first-mile/shipments/{shipment_id}", self.config.campaign_id);
        let detail = self.json_response(self.request(Method::GET, &path)).await.ok()?;
        render_shipment_address(&detail["delivery"]["address"])
    }
}

fn render_shipment_address(address: &Value) -> Option<String> {
    if address.is_object() {
        Some(format!(
            "{}, {}, {}",
            address["city"].as_str().unwrap_or_default(),
            address["street"].as_str().unwrap_or_default(),
            address["house"].as_str().unwrap_or_default()
        ))
    } else {
        None
    }
}

#[async_trait]
impl MarketplaceApi for YandexApi {
    async fn get_orders(&self, status: &str, substatus: Option<&str>) -> Result<Vec<Value>, MarketApiError> {
        let path = format!("/campaigns/{}/orders", self.config.campaign_id);
        let mut params = vec![("status", status)];
        if let Some(substatus) = substatus {
            params.push(("substatus", substatus));
        }
        debug!("[yandex] Fetching orders with status={status}, substatus={substatus:?}");
        let body = with_retries("yandex get_orders", || {
            self.json_response(self.request(Method::GET, &path).query(&params))
        })
        .await?;
        let orders = body["orders"].as_array().cloned().unwrap_or_default();
        Ok(orders)
    }

    async fn get_market_sku(&self, shop_skus: &[String]) -> HashMap<String, SkuMapping> {
        let path = format!("/businesses/{}/offer-mappings", self.config.business_id);
        let payload = json!({ "offerIds": shop_skus });
        let body = match self.json_response(self.request(Method::POST, &path).json(&payload)).await {
            Ok(body) => body,
            Err(e) => {
                error!("[yandex] Could not resolve market SKUs: {e}");
                return HashMap::new();
            },
        };
        let mut result = HashMap::new();
        for mapping in body["result"]["offerMappings"].as_array().into_iter().flatten() {
            let Some(shop_sku) = mapping["offer"]["offerId"].as_str() else { continue };
            let market_sku = scalar(&mapping["mapping"]["marketSku"]);
            let market_model_id = scalar(&mapping["mapping"]["marketModelId"]);
            if let (Some(market_sku), Some(market_model_id)) = (market_sku, market_model_id) {
                result.insert(shop_sku.to_string(), SkuMapping { market_sku, market_model_id });
            }
        }
        result
    }

    async fn get_label(&self, order_id: &str) -> Option<Vec<u8>> {
        let path = format!("/campaigns/{}/orders/{order_id}/delivery/labels", self.config.campaign_id);
        let response = match self.request(Method::GET, &path).query(&[("format", "A9")]).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("[yandex] Failed to fetch label for order #{order_id}: {e}");
                return None;
            },
        };
        if response.status().is_success() {
            response.bytes().await.ok().map(|b| b.to_vec())
        } else {
            error!("[yandex] Failed to fetch label for order #{order_id}: HTTP {}", response.status());
            None
        }
    }

    async fn get_pickup_point_address(&self, order_id: &str) -> String {
        let path = format!("/campaigns/{}/first-mile/shipments", self.config.campaign_id);
        let shipments = match self.json_response(self.request(Method::GET, &path)).await {
            Ok(body) => body["shipments"].as_array().cloned().unwrap_or_default(),
            Err(e) => {
                warn!("[yandex] Could not list first-mile shipments for order #{order_id}: {e}");
                return PICKUP_ADDRESS_FALLBACK.to_string();
            },
        };
        if let Some(shipment) = shipments.first() {
            if let Some(address) = self.shipment_address(shipment).await {
                return address;
            }
        }
        warn!("[yandex] Pickup point address for order #{order_id} not found");
        PICKUP_ADDRESS_FALLBACK.to_string()
    }

    async fn set_order_status(
        &self,
        order_id: &str,
        status: &str,
        substatus: Option<&str>,
        items: &[StatusItem],
    ) -> Result<Value, MarketApiError> {
        let path = format!("/campaigns/{}/orders/{order_id}/status", self.config.campaign_id);
        let payload = json!({
            "order": {
                "status": status,
                "substatus": substatus,
                "items": items,
            }
        });
        debug!("[yandex] Updating order #{order_id} to {status}/{substatus:?}");
        with_retries("yandex set_order_status", || {
            self.json_response(self.request(Method::PUT, &path).json(&payload))
        })
        .await
    }

    async fn get_order_info(&self, order_id: &str) -> Result<Value, MarketApiError> {
        let path = format!("/campaigns/{}/orders/{order_id}", self.config.campaign_id);
        let body =
            with_retries("yandex get_order_info", || self.json_response(self.request(Method::GET, &path))).await?;
        Ok(body["order"].clone())
    }

    fn market_url(&self) -> &str {
        &self.config.market_url
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
