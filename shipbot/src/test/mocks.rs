use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use marketplace_tools::{MarketApiError, MarketplaceApi, ShipmentApi, SkuMapping, StatusItem};
use mockall::mock;
use sb_common::Platform;
use serde_json::{json, Value};

use crate::{
    i18n::Locale,
    service::{OrderService, ServiceOptions},
    sink::{ActionButton, ChatSink, MessageHandle, SinkError},
    store::{DedupStore, StoreError},
};

pub const CHAT_ID: i64 = 42;

mock! {
    pub MarketApi {}

    #[async_trait]
    impl MarketplaceApi for MarketApi {
        async fn get_orders<'a, 'b, 'c>(&'a self, status: &'b str, substatus: Option<&'c str>) -> Result<Vec<Value>, MarketApiError>;
        async fn get_market_sku(&self, shop_skus: &[String]) -> HashMap<String, SkuMapping>;
        async fn get_label(&self, order_id: &str) -> Option<Vec<u8>>;
        async fn get_pickup_point_address(&self, order_id: &str) -> String;
        async fn set_order_status<'a, 'b, 'c, 'd, 'e>(
            &'a self,
            order_id: &'b str,
            status: &'c str,
            substatus: Option<&'d str>,
            items: &'e [StatusItem],
        ) -> Result<Value, MarketApiError>;
        async fn get_order_info(&self, order_id: &str) -> Result<Value, MarketApiError>;
        fn market_url(&self) -> &str;
    }
}

mock! {
    pub Sink {}

    #[async_trait]
    impl ChatSink for Sink {
        async fn send_text(
            &self,
            chat_id: i64,
            text: &str,
            button: Option<ActionButton>,
        ) -> Result<MessageHandle, SinkError>;
        async fn send_document(
            &self,
            chat_id: i64,
            data: Vec<u8>,
            filename: &str,
            caption: &str,
            button: Option<ActionButton>,
        ) -> Result<MessageHandle, SinkError>;
        async fn pin(&self, handle: &MessageHandle) -> Result<(), SinkError>;
        async fn edit_text(&self, handle: &MessageHandle, text: &str) -> Result<(), SinkError>;
        async fn edit_caption(&self, handle: &MessageHandle, caption: &str) -> Result<(), SinkError>;
    }
}

mock! {
    pub Dedup {}

    #[async_trait]
    impl DedupStore for Dedup {
        async fn members(&self, set_name: &str) -> Result<HashSet<String>, StoreError>;
        async fn add(&self, set_name: &str, member: &str) -> Result<bool, StoreError>;
    }
}

pub fn text_handle(message_id: i64) -> MessageHandle {
    MessageHandle { chat_id: CHAT_ID, message_id, has_document: false }
}

pub fn document_handle(message_id: i64) -> MessageHandle {
    MessageHandle { chat_id: CHAT_ID, message_id, has_document: true }
}

/// A dedup store that remembers nothing and accepts everything. For tests
/// that only care about the messaging side.
pub fn empty_store() -> MockDedup {
    let mut store = MockDedup::new();
    store.expect_members().returning(|_| Ok(HashSet::new()));
    store.expect_add().returning(|_, _| Ok(true));
    store
}

pub fn service_with(
    platform: Platform,
    client: impl MarketplaceApi + 'static,
    store: MockDedup,
    sink: MockSink,
) -> OrderService {
    let mut clients: BTreeMap<Platform, Box<dyn MarketplaceApi>> = BTreeMap::new();
    clients.insert(platform, Box::new(client));
    let opts = ServiceOptions { chat_id: CHAT_ID, gift_threshold: 300.0, locale: Locale::En };
    OrderService::new(clients, Box::new(store), Arc::new(sink), opts)
}

pub fn yandex_raw_order(id: i64, total: f64, shipment_date: &str) -> Value {
    json!({
        "id": id,
        "items": [{"shopSku": "sku1", "offerName": "Blue Widget", "count": 2, "id": 9001}],
        "delivery": {
            "address": {"city": "Moscow", "street": "Tverskaya", "house": "1"},
            "shipments": [{"shipmentDate": shipment_date}]
        },
        "itemsTotal": total,
        "status": "PROCESSING",
        "substatus": "STARTED"
    })
}

/// A platform client with shipment-batch support and call counters, for
/// exercising the carriage chain. Mock objects cannot hand out a borrowed
/// [`ShipmentApi`] facet, so this one is written by hand.
pub struct FakeCarriageClient {
    pub detail: Value,
    pub fail_create: bool,
    pub carriage_label: Option<Vec<u8>>,
    pub set_status_calls: Arc<AtomicUsize>,
    pub create_calls: Arc<AtomicUsize>,
    pub approve_calls: Arc<AtomicUsize>,
}

impl FakeCarriageClient {
    pub fn new(detail: Value) -> Self {
        Self {
            detail,
            fail_create: false,
            carriage_label: Some(b"%PDF-carriage".to_vec()),
            set_status_calls: Arc::new(AtomicUsize::new(0)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            approve_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl MarketplaceApi for FakeCarriageClient {
    async fn get_orders(&self, _status: &str, _substatus: Option<&str>) -> Result<Vec<Value>, MarketApiError> {
        Ok(Vec::new())
    }

    async fn get_market_sku(&self, _shop_skus: &[String]) -> HashMap<String, SkuMapping> {
        HashMap::new()
    }

    async fn get_label(&self, _order_id: &str) -> Option<Vec<u8>> {
        None
    }

    async fn get_pickup_point_address(&self, _order_id: &str) -> String {
        "the pickup point".to_string()
    }

    async fn set_order_status(
        &self,
        _order_id: &str,
        _status: &str,
        _substatus: Option<&str>,
        _items: &[StatusItem],
    ) -> Result<Value, MarketApiError> {
        self.set_status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"result": true}))
    }

    async fn get_order_info(&self, _order_id: &str) -> Result<Value, MarketApiError> {
        Ok(self.detail.clone())
    }

    fn market_url(&self) -> &str {
        "https://www.ozon.ru/product/"
    }

    fn shipments(&self) -> Option<&dyn ShipmentApi> {
        Some(self)
    }
}

#[async_trait]
impl ShipmentApi for FakeCarriageClient {
    async fn create_carriage(&self, _delivery_method_id: i64, _departure_date: &str) -> Result<i64, MarketApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            Err(MarketApiError::Upstream { status: 400, message: "carriage rejected".to_string() })
        } else {
            Ok(77)
        }
    }

    async fn approve_carriage(
        &self,
        _carriage_id: i64,
        _containers_count: Option<u32>,
    ) -> Result<Value, MarketApiError> {
        self.approve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"result": true}))
    }

    async fn get_carriage_label(&self, _carriage_id: i64) -> Option<Vec<u8>> {
        self.carriage_label.clone()
    }
}
