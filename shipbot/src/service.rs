use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use log::*;
use marketplace_tools::{parser_for, MarketplaceApi, Order, ShipmentApi, SkuMapping, StatusItem};
use sb_common::Platform;
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::BotConfig,
    errors::BotError,
    handlers::ready_callback_data,
    i18n::{tr, Locale, Phrase},
    sink::{ActionButton, ChatSink},
    stats::Stats,
    store::{overdue_notified_key, sent_orders_key, DedupStore},
};

/// Orders whose shipment date is at least this many days in the past get an
/// overdue escalation.
const OVERDUE_AFTER_DAYS: i64 = 1;
const DEPARTURE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Uniform result shape for operator-triggered state transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdateResult {
    pub status: UpdateStatus,
    pub errors: Vec<StatusError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidPlatform,
    FetchError,
    InvalidStatus,
    CarriageError,
    HttpError,
    InternalError,
}

impl StatusUpdateResult {
    pub fn success() -> Self {
        Self { status: UpdateStatus::Success, errors: Vec::new() }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { status: UpdateStatus::Error, errors: vec![StatusError { code, message: message.into() }] }
    }

    pub fn is_success(&self) -> bool {
        self.status == UpdateStatus::Success
    }

    pub fn first_message(&self) -> &str {
        self.errors.first().map(|e| e.message.as_str()).unwrap_or("Unknown error")
    }
}

/// The slice of [`BotConfig`] the order service actually needs. Mirrors how
/// the rest of the configuration stays out of the hot path.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub chat_id: i64,
    pub gift_threshold: f64,
    pub locale: Locale,
}

impl ServiceOptions {
    pub fn from_config(config: &BotConfig) -> Self {
        Self { chat_id: config.chat_id, gift_threshold: config.gift_threshold, locale: config.locale }
    }
}

/// The order-lifecycle orchestrator: one client per active platform, the
/// dedup ledger and the chat sink. Implements the new-order sweep, the
/// overdue sweep, the operator-triggered ready-to-ship transition and the
/// daily summary.
pub struct OrderService {
    clients: BTreeMap<Platform, Box<dyn MarketplaceApi>>,
    store: Box<dyn DedupStore>,
    sink: Arc<dyn ChatSink>,
    opts: ServiceOptions,
    stats: Stats,
}

/// Platform-specific query literal for the "freshly placed" lifecycle state.
fn new_order_query(platform: Platform) -> (&'static str, Option<&'static str>) {
    match platform {
        Platform::Yandex => ("PROCESSING", Some("STARTED")),
        Platform::Ozon => ("awaiting_packaging", None),
    }
}

/// Platform-specific query literal for the "awaiting shipment" state.
fn awaiting_shipment_query(platform: Platform) -> (&'static str, Option<&'static str>) {
    match platform {
        Platform::Yandex => ("PROCESSING", Some("READY_TO_SHIP")),
        Platform::Ozon => ("awaiting_deliver", None),
    }
}

impl OrderService {
    pub fn new(
        clients: BTreeMap<Platform, Box<dyn MarketplaceApi>>,
        store: Box<dyn DedupStore>,
        sink: Arc<dyn ChatSink>,
        opts: ServiceOptions,
    ) -> Self {
        Self { clients, store, sink, opts, stats: Stats::default() }
    }

    pub fn sink(&self) -> &dyn ChatSink {
        self.sink.as_ref()
    }

    pub fn locale(&self) -> Locale {
        self.opts.locale
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Sweeps every active platform for freshly placed orders and announces
    /// the ones not seen before. Platforms are processed sequentially and
    /// independently: an error in one is logged and counted, the next still
    /// runs.
    pub async fn check_new_orders(&self) {
        for (platform, client) in &self.clients {
            if let Err(e) = self.sweep_new_orders(*platform, client.as_ref()).await {
                error!("[{platform}] Error checking new orders: {e}");
                self.stats.incr_api_errors();
            }
        }
    }

    async fn sweep_new_orders(&self, platform: Platform, client: &dyn MarketplaceApi) -> Result<(), BotError> {
        let (status, substatus) = new_order_query(platform);
        let raw_orders = client.get_orders(status, substatus).await?;
        let notified = self.store.members(&sent_orders_key(platform)).await?;
        info!("[{platform}] Found {} orders in new status", raw_orders.len());
        let parser = parser_for(platform);
        for raw in &raw_orders {
            // One bad record must not abort the rest of the batch.
            let order = match parser.parse(raw) {
                Ok(order) => order,
                Err(e) => {
                    warn!("[{platform}] Skipping order that could not be parsed: {e}");
                    continue;
                },
            };
            if notified.contains(&order.id) {
                continue;
            }
            match self.notify_order(&order, platform, client).await {
                Ok(()) => {
                    // Marked only after a successful send, so a failed send is
                    // retried on the next sweep instead of being lost.
                    self.store.add(&sent_orders_key(platform), &order.id).await?;
                    self.stats.incr_new_orders();
                },
                Err(e) => {
                    error!("[{platform}] Error sending notification for order #{}: {e}", order.id);
                },
            }
        }
        Ok(())
    }

    async fn notify_order(
        &self,
        order: &Order,
        platform: Platform,
        client: &dyn MarketplaceApi,
    ) -> Result<(), BotError> {
        let locale = self.opts.locale;
        let shop_skus: Vec<String> = order.items.iter().map(|item| item.shop_sku.clone()).collect();
        let mapping = client.get_market_sku(&shop_skus).await;
        let items_text = render_items(order, platform, client.market_url(), &mapping);
        let gift_notice = if order.items_total < self.opts.gift_threshold {
            format!("\n\n🎁 *{}*", tr(locale, Phrase::NoGift))
        } else {
            String::new()
        };
        let mut message = format!(
            "📦 *{} #{} ({platform})*\n\n📋 *{}*\n{items_text}\n\n🏠 *{}*\n  {}\n⏰ *{}* {}{gift_notice}",
            tr(locale, Phrase::NewOrder),
            order.id,
            tr(locale, Phrase::Items),
            tr(locale, Phrase::DeliveryAddress),
            order.delivery.address.join_nonempty(),
            tr(locale, Phrase::ShipmentDeadline),
            order.delivery.shipment_date,
        );
        let label = client.get_label(&order.id).await;
        if label.is_none() {
            message.push_str(&format!("\n\n⚠️ {}", tr(locale, Phrase::LabelError)));
        }
        let button = ActionButton {
            label: tr(locale, Phrase::ReadyToShip).to_string(),
            callback_data: ready_callback_data(&order.id, platform),
        };
        let handle = match label {
            Some(data) => {
                let filename = format!("label_{}.pdf", order.id);
                self.sink.send_document(self.opts.chat_id, data, &filename, &message, Some(button)).await?
            },
            None => self.sink.send_text(self.opts.chat_id, &message, Some(button)).await?,
        };
        // A failed pin must not resend the notification on the next sweep.
        if let Err(e) = self.sink.pin(&handle).await {
            warn!("[{platform}] Could not pin the notification for order #{}: {e}", order.id);
        }
        info!("[{platform}] Notification for order #{} sent and pinned", order.id);
        Ok(())
    }

    /// Sweeps every active platform for orders past their shipment date and
    /// escalates the ones not escalated before.
    pub async fn check_overdue_orders(&self) {
        for (platform, client) in &self.clients {
            if let Err(e) = self.sweep_overdue_orders(*platform, client.as_ref()).await {
                error!("[{platform}] Error checking overdue orders: {e}");
                self.stats.incr_api_errors();
            }
        }
    }

    async fn sweep_overdue_orders(&self, platform: Platform, client: &dyn MarketplaceApi) -> Result<(), BotError> {
        let locale = self.opts.locale;
        let (status, substatus) = awaiting_shipment_query(platform);
        let raw_orders = client.get_orders(status, substatus).await?;
        let escalated = self.store.members(&overdue_notified_key(platform)).await?;
        info!("[{platform}] Found {} orders awaiting shipment", raw_orders.len());
        let parser = parser_for(platform);
        let now = Utc::now().naive_utc();
        for raw in &raw_orders {
            let order = match parser.parse(raw) {
                Ok(order) => order,
                Err(e) => {
                    warn!("[{platform}] Skipping order that could not be parsed: {e}");
                    continue;
                },
            };
            let Some(shipment_date) = parser.parse_shipment_date(&order.delivery.shipment_date) else {
                error!(
                    "[{platform}] Invalid shipment date format for order #{}: {}",
                    order.id, order.delivery.shipment_date
                );
                continue;
            };
            if (now - shipment_date).num_days() < OVERDUE_AFTER_DAYS || escalated.contains(&order.id) {
                continue;
            }
            let message = format!(
                "⚠️ *{} #{} ({platform})*\n⏰ {} {}\n{}: {status}",
                tr(locale, Phrase::OrderOverdue),
                order.id,
                tr(locale, Phrase::ShipmentDeadline),
                order.delivery.shipment_date,
                tr(locale, Phrase::Status),
            );
            self.sink.send_text(self.opts.chat_id, &message, None).await?;
            warn!("[{platform}] Sent overdue notification for order #{}", order.id);
            self.store.add(&overdue_notified_key(platform), &order.id).await?;
            self.stats.incr_overdue_orders();
        }
        Ok(())
    }

    /// Advances an order to its platform's ready-to-ship state, after
    /// re-validating the current state against the live order detail. For
    /// platforms with shipment batches this also chains carriage creation,
    /// approval and label delivery.
    pub async fn set_order_status_ready(&self, order_id: &str, platform: Platform) -> StatusUpdateResult {
        let Some(client) = self.clients.get(&platform) else {
            return StatusUpdateResult::error(
                ErrorCode::InvalidPlatform,
                format!("Platform {platform} is not enabled"),
            );
        };
        match self.try_set_ready(order_id, platform, client.as_ref()).await {
            Ok(result) => result,
            Err(BotError::MarketApi(e)) => {
                error!("[{platform}] Error setting order status for #{order_id}: {e}");
                self.stats.incr_api_errors();
                StatusUpdateResult::error(ErrorCode::HttpError, format!("HTTP error: {e}"))
            },
            Err(e) => {
                error!("[{platform}] Error setting order status for #{order_id}: {e}");
                StatusUpdateResult::error(ErrorCode::InternalError, e.to_string())
            },
        }
    }

    async fn try_set_ready(
        &self,
        order_id: &str,
        platform: Platform,
        client: &dyn MarketplaceApi,
    ) -> Result<StatusUpdateResult, BotError> {
        let detail = client.get_order_info(order_id).await?;
        if detail.as_object().map_or(true, |m| m.is_empty()) {
            return Ok(StatusUpdateResult::error(ErrorCode::FetchError, "Failed to fetch order data"));
        }
        let current_status = detail["status"].as_str().unwrap_or_default();
        let current_substatus = detail["substatus"].as_str().unwrap_or_default();
        let precondition_met = match platform {
            Platform::Yandex => current_status == "PROCESSING" && current_substatus == "STARTED",
            Platform::Ozon => current_status == "awaiting_packaging",
        };
        if !precondition_met {
            let (target, _) = awaiting_shipment_query(platform);
            return Ok(StatusUpdateResult::error(
                ErrorCode::InvalidStatus,
                format!("Cannot transition order from {current_status}/{current_substatus} to {target}"),
            ));
        }
        let items = match platform {
            // Yandex requires the line items to be echoed back on the
            // transition call.
            Platform::Yandex => detail["items"]
                .as_array()
                .into_iter()
                .flatten()
                .map(|item| StatusItem {
                    id: item["id"].as_i64(),
                    count: item["count"].as_u64().unwrap_or(0) as u32,
                })
                .collect(),
            Platform::Ozon => Vec::new(),
        };
        let (status, substatus) = match platform {
            Platform::Yandex => ("PROCESSING", Some("READY_TO_SHIP")),
            Platform::Ozon => ("awaiting_deliver", None),
        };
        client.set_order_status(order_id, status, substatus, &items).await?;
        info!("[{platform}] Order #{order_id} status set to {status}/{substatus:?}");

        if let Some(shipments) = client.shipments() {
            if let Err(e) = self.run_carriage_chain(order_id, &detail, shipments).await {
                error!("[{platform}] Failed to create/approve carriage for order #{order_id}: {e}");
                let warning =
                    format!("⚠️ *{} #{order_id}: {e}*", tr(self.opts.locale, Phrase::CarriageError));
                if let Err(send_err) = self.sink.send_text(self.opts.chat_id, &warning, None).await {
                    error!("[{platform}] Could not report the carriage failure to chat: {send_err}");
                }
                // The status mutation has already been applied upstream; the
                // partial success is reported, not rolled back.
                return Ok(StatusUpdateResult::error(ErrorCode::CarriageError, e.to_string()));
            }
        }
        Ok(StatusUpdateResult::success())
    }

    async fn run_carriage_chain(
        &self,
        order_id: &str,
        detail: &Value,
        shipments: &dyn ShipmentApi,
    ) -> Result<(), BotError> {
        let locale = self.opts.locale;
        let delivery_method_id = detail["delivery_method"]["id"]
            .as_i64()
            .ok_or(BotError::MissingOrderField("delivery_method.id"))?;
        let departure_date = Utc::now().format(DEPARTURE_DATE_FORMAT).to_string();
        let carriage_id = shipments.create_carriage(delivery_method_id, &departure_date).await?;
        info!("[ozon] Created carriage #{carriage_id} for delivery method {delivery_method_id}");
        shipments.approve_carriage(carriage_id, Some(1)).await?;
        info!("[ozon] Approved carriage #{carriage_id}");
        match shipments.get_carriage_label(carriage_id).await {
            Some(data) => {
                let caption = format!(
                    "📤 *{} #{carriage_id}*\n{}: {order_id}",
                    tr(locale, Phrase::CarriageCreated),
                    tr(locale, Phrase::IncludesOrder),
                );
                let filename = format!("carriage_{carriage_id}.pdf");
                self.sink.send_document(self.opts.chat_id, data, &filename, &caption, None).await?;
            },
            None => {
                let warning = format!("⚠️ *{} #{carriage_id}*", tr(locale, Phrase::CarriageLabelError));
                self.sink.send_text(self.opts.chat_id, &warning, None).await?;
            },
        }
        Ok(())
    }

    /// Resolves the pickup point address for an order, when the platform is
    /// enabled.
    pub async fn pickup_point_address(&self, platform: Platform, order_id: &str) -> Option<String> {
        match self.clients.get(&platform) {
            Some(client) => Some(client.get_pickup_point_address(order_id).await),
            None => None,
        }
    }

    /// Sends one consolidated task list with every order currently awaiting
    /// shipment across all platforms. Sent even when empty, so the silence of
    /// a broken sweep is distinguishable from a quiet day.
    pub async fn send_daily_summary(&self) -> Result<(), BotError> {
        let locale = self.opts.locale;
        let mut lines = Vec::new();
        for (platform, client) in &self.clients {
            let (status, substatus) = awaiting_shipment_query(*platform);
            let raw_orders = match client.get_orders(status, substatus).await {
                Ok(orders) => orders,
                Err(e) => {
                    error!("[{platform}] Error collecting the daily summary: {e}");
                    self.stats.incr_api_errors();
                    continue;
                },
            };
            let parser = parser_for(*platform);
            for raw in &raw_orders {
                let order = match parser.parse(raw) {
                    Ok(order) => order,
                    Err(e) => {
                        warn!("[{platform}] Skipping order that could not be parsed: {e}");
                        continue;
                    },
                };
                let task = match platform {
                    Platform::Yandex => {
                        let address = client.get_pickup_point_address(&order.id).await;
                        format!("{} {address}", tr(locale, Phrase::BringToPickupPoint))
                    },
                    Platform::Ozon => tr(locale, Phrase::HandToCarrier).to_string(),
                };
                lines.push(format!("  • #{} ({platform}) — {task}", order.id));
            }
        }
        let message = if lines.is_empty() {
            format!("📅 *{}*\n\n{}", tr(locale, Phrase::DailyTasks), tr(locale, Phrase::NoTasksToday))
        } else {
            format!("📅 *{}*\n\n{}", tr(locale, Phrase::DailyTasks), lines.join("\n"))
        };
        self.sink.send_text(self.opts.chat_id, &message, None).await?;
        Ok(())
    }
}

fn render_items(
    order: &Order,
    platform: Platform,
    market_url: &str,
    mapping: &std::collections::HashMap<String, SkuMapping>,
) -> String {
    order
        .items
        .iter()
        .map(|item| {
            let url = match mapping.get(&item.shop_sku) {
                Some(m) => format!("{market_url}{}?sku={}", m.market_model_id, m.market_sku),
                None => search_url(platform, &item.offer_name),
            };
            format!("  • [{}]({url}) (x{})", item.offer_name, item.count)
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// Full-text search link used when a SKU cannot be resolved to a catalog
/// entry.
fn search_url(platform: Platform, offer_name: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(offer_name.as_bytes()).collect();
    format!("https://{platform}.ru/search?text={encoded}")
}
