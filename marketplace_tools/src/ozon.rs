use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    RequestBuilder,
};
use serde_json::{json, Value};

use crate::{
    api::{MarketplaceApi, ShipmentApi},
    config::OzonConfig,
    retry::with_retries,
    MarketApiError,
    SkuMapping,
    StatusItem,
};

const PICKUP_ADDRESS_FALLBACK: &str = "Pickup point address not found";
/// The posting list endpoint has no pure status query; a rolling time window
/// bounds the result instead.
const ORDER_WINDOW_DAYS: i64 = 7;
const WIRE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Client for the Ozon-style seller API. All endpoints are POST-with-JSON;
/// authentication pairs an API key with a client id header.
#[derive(Clone)]
pub struct OzonApi {
    config: OzonConfig,
    client: Arc<Client>,
}

impl OzonApi {
    pub fn new(config: OzonConfig) -> Result<Self, MarketApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let api_key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| MarketApiError::Initialization(e.to_string()))?;
        let client_id = HeaderValue::from_str(config.client_id.as_str())
            .map_err(|e| MarketApiError::Initialization(e.to_string()))?;
        headers.insert("Api-Key", api_key);
        headers.insert("Client-Id", client_id);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MarketApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn post(&self, path: &str, payload: &Value) -> RequestBuilder {
        self.client.post(format!("{}{path}", self.config.base_url)).json(payload)
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

    async fn pdf_response(&self, op: &str, path: &str, payload: &Value) -> Option<Vec<u8>> {
        let response = match self.post(path, payload).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("[ozon] {op} failed: {e}");
                return None;
            },
        };
        if response.status().is_success() {
            response.bytes().await.ok().map(|b| b.to_vec())
        } else {
            error!("[ozon] {op} failed: HTTP {}", response.status());
            None
        }
    }
}

#[async_trait]
impl MarketplaceApi for OzonApi {
    async fn get_orders(&self, status: &str, _substatus: Option<&str>) -> Result<Vec<Value>, MarketApiError> {
        let to = Utc::now();
        let since = to - Duration::days(ORDER_WINDOW_DAYS);
        let payload = json!({
            "dir": "ASC",
            "filter": {
                "since": since.format(WIRE_DATE_FORMAT).to_string(),
                "to": to.format(WIRE_DATE_FORMAT).to_string(),
                "status": status,
            },
            "limit": 100,
            "offset": 0,
            "with": {
                "analytics_data": true,
                "barcodes": true,
                "financial_data": true,
                "translit": true,
            }
        });
        debug!("[ozon] Fetching postings with status={status}");
        let body =
            with_retries("ozon get_orders", || self.json_response(self.post("/v3/posting/fbs/list", &payload)))
                .await?;
        Ok(body["result"]["postings"].as_array().cloned().unwrap_or_default())
    }

    /// Ozon postings already carry public SKUs, so the mapping is the
    /// identity.
    async fn get_market_sku(&self, shop_skus: &[String]) -> HashMap<String, SkuMapping> {
        shop_skus
            .iter()
            .map(|sku| {
                (sku.clone(), SkuMapping { market_sku: sku.clone(), market_model_id: sku.clone() })
            })
            .collect()
    }

    async fn get_label(&self, order_id: &str) -> Option<Vec<u8>> {
        let payload = json!({ "posting_number": [order_id] });
        self.pdf_response(
            &format!("Fetching label for posting #{order_id}"),
            "/v2/posting/fbs/package-label",
            &payload,
        )
        .await
    }

    async fn get_pickup_point_address(&self, order_id: &str) -> String {
        let payload = json!({ "posting_number": order_id });
        match self.json_response(self.post("/v2/posting/fbs/get", &payload)).await {
            Ok(body) => {
                let address = &body["result"]["delivery"]["address"];
                format!(
                    "{}, {}",
                    address["city"].as_str().unwrap_or_default(),
                    address["address_tail"].as_str().unwrap_or_default()
                )
            },
            Err(e) => {
                warn!("[ozon] Pickup point address for posting #{order_id} not found: {e}");
                PICKUP_ADDRESS_FALLBACK.to_string()
            },
        }
    }

    async fn set_order_status(
        &self,
        order_id: &str,
        status: &str,
        _substatus: Option<&str>,
        _items: &[StatusItem],
    ) -> Result<Value, MarketApiError> {
        let payload = json!({ "posting_number": order_id, "status": status });
        debug!("[ozon] Updating posting #{order_id} to {status}");
        with_retries("ozon set_order_status", || self.json_response(self.post("/v2/posting/fbs/status", &payload)))
            .await
    }

    async fn get_order_info(&self, order_id: &str) -> Result<Value, MarketApiError> {
        let payload = json!({ "posting_number": order_id });
        let body =
            with_retries("ozon get_order_info", || self.json_response(self.post("/v2/posting/fbs/get", &payload)))
                .await?;
        Ok(body["result"].clone())
    }

    fn market_url(&self) -> &str {
        &self.config.market_url
    }

    fn shipments(&self) -> Option<&dyn ShipmentApi> {
        Some(self)
    }
}

#[async_trait]
impl ShipmentApi for OzonApi {
    async fn create_carriage(&self, delivery_method_id: i64, departure_date: &str) -> Result<i64, MarketApiError> {
        let payload = json!({
            "delivery_method_id": delivery_method_id,
            "departure_date": departure_date,
        });
        debug!("[ozon] Creating carriage for delivery method {delivery_method_id}");
        let body =
            with_retries("ozon create_carriage", || self.json_response(self.post("/v1/carriage/create", &payload)))
                .await?;
        body["carriage_id"]
            .as_i64()
            .ok_or_else(|| MarketApiError::Json("Carriage response has no 'carriage_id'".to_string()))
    }

    async fn approve_carriage(
        &self,
        carriage_id: i64,
        containers_count: Option<u32>,
    ) -> Result<Value, MarketApiError> {
        let mut payload = json!({ "carriage_id": carriage_id });
        if let Some(count) = containers_count {
            payload["containers_count"] = json!(count);
        }
        debug!("[ozon] Approving carriage #{carriage_id}");
        with_retries("ozon approve_carriage", || self.json_response(self.post("/v1/carriage/approve", &payload)))
            .await
    }

    async fn get_carriage_label(&self, carriage_id: i64) -> Option<Vec<u8>> {
        let payload = json!({ "carriage_id": carriage_id });
        self.pdf_response(
            &format!("Fetching label for carriage #{carriage_id}"),
            "/v2/posting/fbs/digital/act/get-pdf",
            &payload,
        )
        .await
    }
}
