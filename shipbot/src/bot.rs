use std::{collections::BTreeMap, sync::Arc};

use log::*;
use marketplace_tools::{MarketplaceApi, OzonApi, YandexApi};
use sb_common::Platform;
use tokio_util::sync::CancellationToken;

use crate::{
    config::BotConfig,
    errors::BotError,
    i18n::{tr, Phrase},
    service::{OrderService, ServiceOptions},
    store::SqliteDedupStore,
    telegram::TelegramApi,
    workers::{start_callback_worker, start_new_order_worker, start_overdue_worker, start_summary_worker},
};

/// Wires the clients, the dedup store and the chat transport together, spawns
/// the workers and runs until ctrl-c.
pub async fn run_bot(config: BotConfig) -> Result<(), BotError> {
    let mut clients: BTreeMap<Platform, Box<dyn MarketplaceApi>> = BTreeMap::new();
    if let Some(yandex) = &config.yandex {
        clients.insert(Platform::Yandex, Box::new(YandexApi::new(yandex.clone())?));
    }
    if let Some(ozon) = &config.ozon {
        clients.insert(Platform::Ozon, Box::new(OzonApi::new(ozon.clone())?));
    }
    if clients.is_empty() {
        return Err(BotError::ConfigurationError(
            "No marketplace platform is enabled. Set YANDEX_ENABLED or OZON_ENABLED and the matching credentials."
                .to_string(),
        ));
    }
    let active = clients.keys().map(Platform::as_str).collect::<Vec<&str>>().join(", ");
    info!("🚀️ Active platforms: {active}");

    let store = SqliteDedupStore::new(&config.database_url).await?;
    let telegram = Arc::new(TelegramApi::new(config.telegram_token.clone()));
    let service = Arc::new(OrderService::new(
        clients,
        Box::new(store),
        telegram.clone(),
        ServiceOptions::from_config(&config),
    ));

    let banner = format!("🚀 {}", tr(config.locale, Phrase::BotStarted));
    service.sink().send_text(config.chat_id, &banner, None).await?;

    let cancel = CancellationToken::new();
    let handles = vec![
        start_new_order_worker(service.clone(), config.new_order_period, cancel.clone()),
        start_overdue_worker(service.clone(), config.overdue_period, cancel.clone()),
        start_summary_worker(service.clone(), config.summary_hour, config.timezone, cancel.clone()),
        start_callback_worker(service.clone(), telegram, cancel.clone()),
    ];

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("🚀️ Could not listen for the shutdown signal: {e}");
    }
    info!("🚀️ Shutdown requested");
    cancel.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("🚀️ A worker did not shut down cleanly: {e}");
        }
    }
    let stats = service.stats();
    info!(
        "📈 Session totals: {} new orders, {} overdue escalations, {} API errors",
        stats.new_orders(),
        stats.overdue_orders(),
        stats.api_errors(),
    );
    Ok(())
}
