use std::{sync::Arc, time::Duration};

use chrono::{Days, TimeZone, Utc};
use chrono_tz::Tz;
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{handlers::handle_ready_callback, service::OrderService, telegram::TelegramApi};

/// Back-off before resuming the callback long-poll after a transport error.
const CALLBACK_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Periodically sweeps for freshly placed orders.
pub fn start_new_order_worker(
    service: Arc<OrderService>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("📦 New-order worker is running. Sweeping every {} secs", period.as_secs());
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => service.check_new_orders().await,
            }
        }
        info!("📦 New-order worker is shutting down");
    })
}

/// Periodically sweeps for orders past their shipment date.
pub fn start_overdue_worker(
    service: Arc<OrderService>,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("🕰️ Overdue worker is running. Sweeping every {} secs", period.as_secs());
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => service.check_overdue_orders().await,
            }
        }
        info!("🕰️ Overdue worker is shutting down");
    })
}

/// Sends the consolidated task list once a day at the configured local hour.
pub fn start_summary_worker(
    service: Arc<OrderService>,
    hour: u32,
    tz: Tz,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("📅 Daily summary worker is running. Sending at {hour:02}:00 ({tz})");
        loop {
            let wait = time_until_next(hour, tz);
            debug!("📅 Next summary in {} secs", wait.as_secs());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = service.send_daily_summary().await {
                        error!("📅 Error sending the daily summary: {e}");
                        service.stats().incr_api_errors();
                    }
                },
            }
        }
        info!("📅 Daily summary worker is shutting down");
    })
}

/// Long-polls the chat transport for "ready to ship" button presses and
/// dispatches them to the handler.
pub fn start_callback_worker(
    service: Arc<OrderService>,
    telegram: Arc<TelegramApi>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("🔘 Callback worker is running");
        let mut offset = 0i64;
        loop {
            let poll = tokio::select! {
                _ = cancel.cancelled() => break,
                poll = telegram.next_callbacks(offset) => poll,
            };
            let events = match poll {
                Ok((events, next_offset)) => {
                    offset = next_offset;
                    events
                },
                Err(e) => {
                    error!("🔘 Error polling for callbacks: {e}");
                    tokio::time::sleep(CALLBACK_RETRY_DELAY).await;
                    continue;
                },
            };
            for event in events {
                if let Err(e) = telegram.answer_callback(&event.id).await {
                    warn!("🔘 Could not acknowledge callback {}: {e}", event.id);
                }
                if let Err(e) = handle_ready_callback(service.as_ref(), &event).await {
                    warn!("🔘 Callback {} was not handled: {e}", event.id);
                }
            }
        }
        info!("🔘 Callback worker is shutting down");
    })
}

/// Time until the next occurrence of `hour`:00 local wall-clock time in `tz`.
fn time_until_next(hour: u32, tz: Tz) -> Duration {
    let now = Utc::now().with_timezone(&tz);
    let mut date = now.date_naive();
    loop {
        // `earliest` skips wall-clock times a DST transition removed.
        if let Some(target) = date.and_hms_opt(hour, 0, 0).and_then(|t| tz.from_local_datetime(&t).earliest())
        {
            if target > now {
                return (target - now).to_std().unwrap_or(Duration::ZERO);
            }
        }
        date = match date.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => return Duration::from_secs(86_400),
        };
    }
}
