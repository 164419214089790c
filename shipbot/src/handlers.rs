use log::*;
use sb_common::Platform;

use crate::{
    errors::BotError,
    i18n::{tr, Phrase},
    service::{ErrorCode, OrderService},
    telegram::CallbackEvent,
};

const READY_PREFIX: &str = "ready_";

/// Callback payload carried by the "ready to ship" button.
pub fn ready_callback_data(order_id: &str, platform: Platform) -> String {
    format!("{READY_PREFIX}{order_id}_{platform}")
}

/// Parses a "ready to ship" callback payload back into its order id and
/// platform. Order ids may themselves contain underscores, so the platform is
/// split off the tail.
pub fn parse_ready_callback(data: &str) -> Result<(String, Platform), BotError> {
    let rest = data
        .strip_prefix(READY_PREFIX)
        .ok_or_else(|| BotError::MalformedCallback(format!("Unknown callback payload: {data}")))?;
    let (order_id, platform) = rest
        .rsplit_once('_')
        .ok_or_else(|| BotError::MalformedCallback(format!("Callback payload has no platform: {data}")))?;
    if order_id.is_empty() {
        return Err(BotError::MalformedCallback(format!("Callback payload has no order id: {data}")));
    }
    let platform = platform.parse::<Platform>()?;
    Ok((order_id.to_string(), platform))
}

/// Handles a press of the "ready to ship" button: runs the state transition
/// and rewrites the originating message in place, which also removes the
/// button.
pub async fn handle_ready_callback(service: &OrderService, event: &CallbackEvent) -> Result<(), BotError> {
    let locale = service.locale();
    let (order_id, platform) = match parse_ready_callback(&event.data) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("🔘 Ignoring malformed callback: {e}");
            let response = format!("❌ {}: {e}", tr(locale, Phrase::InternalError));
            rewrite_message(service, event, &response).await;
            return Err(e);
        },
    };
    info!("🔘 Ready-to-ship requested for order #{order_id} ({platform})");
    let result = service.set_order_status_ready(&order_id, platform).await;
    let response = if result.is_success() {
        match platform {
            Platform::Yandex => {
                let address = service
                    .pickup_point_address(platform, &order_id)
                    .await
                    .unwrap_or_else(|| tr(locale, Phrase::DeliveryAddress).to_string());
                format!(
                    "📦 *{} #{order_id} ({platform})*\n\n📍 *{}*\n  {address}",
                    tr(locale, Phrase::OrderReady),
                    tr(locale, Phrase::BringToPickupPoint),
                )
            },
            Platform::Ozon => format!("✅ {} #{order_id} ({platform})", tr(locale, Phrase::OrderReady)),
        }
    } else {
        let phrase = match result.errors.first().map(|e| e.code) {
            Some(ErrorCode::InternalError) => Phrase::InternalError,
            _ => Phrase::StatusUpdateError,
        };
        format!("❌ {}:\n{}", tr(locale, phrase), result.first_message())
    };
    rewrite_message(service, event, &response).await;
    Ok(())
}

/// Rewrites the originating message in place, which also removes the button.
/// Documents keep their label attachment; only the caption is rewritten.
async fn rewrite_message(service: &OrderService, event: &CallbackEvent, response: &str) {
    let edit = if event.message.has_document {
        service.sink().edit_caption(&event.message, response).await
    } else {
        service.sink().edit_text(&event.message, response).await
    };
    if let Err(e) = edit {
        error!("🔘 Could not update the message for callback {}: {e}", event.id);
    }
}

#[cfg(test)]
mod test {
    use sb_common::Platform;

    use super::{parse_ready_callback, ready_callback_data};
    use crate::errors::BotError;

    #[test]
    fn callback_data_round_trips() {
        let data = ready_callback_data("456", Platform::Yandex);
        assert_eq!(data, "ready_456_yandex");
        let (order_id, platform) = parse_ready_callback(&data).unwrap();
        assert_eq!(order_id, "456");
        assert_eq!(platform, Platform::Yandex);
    }

    #[test]
    fn order_ids_may_contain_underscores() {
        let (order_id, platform) = parse_ready_callback("ready_0099-12_34_ozon").unwrap();
        assert_eq!(order_id, "0099-12_34");
        assert_eq!(platform, Platform::Ozon);
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        let err = parse_ready_callback("cancel_456_yandex").unwrap_err();
        assert!(matches!(err, BotError::MalformedCallback(_)));
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = parse_ready_callback("ready_456_wildberries").unwrap_err();
        assert!(matches!(err, BotError::UnsupportedPlatform(_)));
    }

    #[test]
    fn missing_parts_are_rejected() {
        assert!(parse_ready_callback("ready_456yandex").is_err());
        assert!(parse_ready_callback("ready__yandex").is_err());
        assert!(parse_ready_callback("ready_").is_err());
    }
}
