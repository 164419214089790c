use async_trait::async_trait;
use log::*;
use reqwest::{multipart, Client};
use sb_common::Secret;
use serde_json::{json, Value};

use crate::sink::{ActionButton, ChatSink, MessageHandle, SinkError};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
/// Long-poll window for getUpdates, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// A button press delivered by the transport, with a handle back to the
/// message that carried the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackEvent {
    pub id: String,
    pub data: String,
    pub message: MessageHandle,
}

/// Thin Telegram Bot API client. Implements the outbound [`ChatSink`]
/// contract and exposes the inbound callback long-poll.
#[derive(Clone)]
pub struct TelegramApi {
    token: Secret<String>,
    base_url: String,
    client: Client,
}

impl TelegramApi {
    pub fn new(token: Secret<String>) -> Self {
        Self { token, base_url: TELEGRAM_API_URL.to_string(), client: Client::new() }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token.reveal())
    }

    async fn into_result(&self, response: reqwest::Response) -> Result<Value, SinkError> {
        let body = response.json::<Value>().await.map_err(|e| SinkError::Json(e.to_string()))?;
        if body["ok"].as_bool().unwrap_or(false) {
            Ok(body["result"].clone())
        } else {
            let description = body["description"].as_str().unwrap_or("no description").to_string();
            Err(SinkError::Api(description))
        }
    }

    async fn call(&self, method: &str, payload: Value) -> Result<Value, SinkError> {
        let response = self
            .client
            .post(self.url(method))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        self.into_result(response).await
    }

    /// Long-polls the transport for button presses. Returns the events plus
    /// the offset to pass on the next call. Non-callback updates are skipped
    /// but still advance the offset.
    pub async fn next_callbacks(&self, offset: i64) -> Result<(Vec<CallbackEvent>, i64), SinkError> {
        let payload = json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["callback_query"],
        });
        let updates = self.call("getUpdates", payload).await?;
        let mut next_offset = offset;
        let mut events = Vec::new();
        for update in updates.as_array().into_iter().flatten() {
            if let Some(update_id) = update["update_id"].as_i64() {
                next_offset = next_offset.max(update_id + 1);
            }
            let callback = &update["callback_query"];
            let (Some(id), Some(data)) = (callback["id"].as_str(), callback["data"].as_str()) else {
                continue;
            };
            let message = &callback["message"];
            let (Some(chat_id), Some(message_id)) =
                (message["chat"]["id"].as_i64(), message["message_id"].as_i64())
            else {
                debug!("🔘 Dropping callback {id} without an originating message");
                continue;
            };
            events.push(CallbackEvent {
                id: id.to_string(),
                data: data.to_string(),
                message: MessageHandle {
                    chat_id,
                    message_id,
                    has_document: message["document"].is_object(),
                },
            });
        }
        Ok((events, next_offset))
    }

    /// Acknowledges a button press so the client stops showing a spinner.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), SinkError> {
        self.call("answerCallbackQuery", json!({ "callback_query_id": callback_id })).await?;
        Ok(())
    }
}

fn inline_keyboard(button: &ActionButton) -> Value {
    json!({
        "inline_keyboard": [[{ "text": button.label, "callback_data": button.callback_data }]]
    })
}

#[async_trait]
impl ChatSink for TelegramApi {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        button: Option<ActionButton>,
    ) -> Result<MessageHandle, SinkError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });
        if let Some(button) = &button {
            payload["reply_markup"] = inline_keyboard(button);
        }
        let result = self.call("sendMessage", payload).await?;
        let message_id = result["message_id"]
            .as_i64()
            .ok_or_else(|| SinkError::Json("sendMessage result has no 'message_id'".to_string()))?;
        Ok(MessageHandle { chat_id, message_id, has_document: false })
    }

    async fn send_document(
        &self,
        chat_id: i64,
        data: Vec<u8>,
        filename: &str,
        caption: &str,
        button: Option<ActionButton>,
    ) -> Result<MessageHandle, SinkError> {
        let part = multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        let mut form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", "Markdown")
            .part("document", part);
        if let Some(button) = &button {
            form = form.text("reply_markup", inline_keyboard(button).to_string());
        }
        let response = self
            .client
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        let result = self.into_result(response).await?;
        let message_id = result["message_id"]
            .as_i64()
            .ok_or_else(|| SinkError::Json("sendDocument result has no 'message_id'".to_string()))?;
        Ok(MessageHandle { chat_id, message_id, has_document: true })
    }

    async fn pin(&self, handle: &MessageHandle) -> Result<(), SinkError> {
        let payload = json!({ "chat_id": handle.chat_id, "message_id": handle.message_id });
        self.call("pinChatMessage", payload).await?;
        Ok(())
    }

    async fn edit_text(&self, handle: &MessageHandle, text: &str) -> Result<(), SinkError> {
        // Omitting reply_markup clears the button.
        let payload = json!({
            "chat_id": handle.chat_id,
            "message_id": handle.message_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        self.call("editMessageText", payload).await?;
        Ok(())
    }

    async fn edit_caption(&self, handle: &MessageHandle, caption: &str) -> Result<(), SinkError> {
        let payload = json!({
            "chat_id": handle.chat_id,
            "message_id": handle.message_id,
            "caption": caption,
            "parse_mode": "Markdown",
        });
        self.call("editMessageCaption", payload).await?;
        Ok(())
    }
}
