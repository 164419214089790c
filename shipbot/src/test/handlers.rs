use sb_common::Platform;
use serde_json::json;

use crate::{
    handlers::handle_ready_callback,
    telegram::CallbackEvent,
    test::mocks::{document_handle, service_with, text_handle, MockDedup, MockMarketApi, MockSink},
};

fn event(data: &str, has_document: bool) -> CallbackEvent {
    CallbackEvent {
        id: "cb1".to_string(),
        data: data.to_string(),
        message: if has_document { document_handle(10) } else { text_handle(10) },
    }
}

#[tokio::test]
async fn button_press_rewrites_the_notification_with_the_outcome() {
    let mut client = MockMarketApi::new();
    client.expect_get_order_info().returning(|_| {
        Ok(json!({
            "status": "PROCESSING",
            "substatus": "STARTED",
            "items": [{"id": 9001, "count": 2}]
        }))
    });
    client.expect_set_order_status().times(1).returning(|_, _, _, _| Ok(json!({"order": {}})));
    client.expect_get_pickup_point_address().returning(|_| "Moscow, Tverskaya 1".to_string());

    let mut sink = MockSink::new();
    sink.expect_edit_text()
        .withf(|_, text| {
            text.contains("Order is ready to ship #456 (yandex)") && text.contains("Moscow, Tverskaya 1")
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let service = service_with(Platform::Yandex, client, MockDedup::new(), sink);
    handle_ready_callback(&service, &event("ready_456_yandex", false)).await.unwrap();
}

#[tokio::test]
async fn failed_transition_renders_the_error_into_the_caption() {
    let mut client = MockMarketApi::new();
    client
        .expect_get_order_info()
        .returning(|_| Ok(json!({"status": "DELIVERY", "substatus": "DELIVERY_SERVICE_RECEIVED"})));
    client.expect_set_order_status().times(0);

    let mut sink = MockSink::new();
    sink.expect_edit_caption()
        .withf(|_, caption| caption.contains("Failed to update the order status"))
        .times(1)
        .returning(|_, _| Ok(()));

    let service = service_with(Platform::Yandex, client, MockDedup::new(), sink);
    handle_ready_callback(&service, &event("ready_456_yandex", true)).await.unwrap();
}

#[tokio::test]
async fn malformed_payload_reports_an_internal_error_in_place() {
    let mut sink = MockSink::new();
    sink.expect_edit_text()
        .withf(|_, text| text.contains("Internal error") && text.contains("wildberries"))
        .times(1)
        .returning(|_, _| Ok(()));

    let service = service_with(Platform::Yandex, MockMarketApi::new(), MockDedup::new(), sink);
    let result = handle_ready_callback(&service, &event("ready_456_wildberries", false)).await;
    assert!(result.is_err());
}
