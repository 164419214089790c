use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Request to the chat transport failed: {0}")]
    Transport(String),
    #[error("Could not deserialize the transport response: {0}")]
    Json(String),
    #[error("Chat transport rejected the call: {0}")]
    Api(String),
}

/// A handle to a message the bot has sent. `has_document` decides whether a
/// later in-place update edits the caption or the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
    pub has_document: bool,
}

/// An inline action control attached to a message. The callback payload is an
/// opaque string round-tripped back by the transport when the button is
/// pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub label: String,
    pub callback_data: String,
}

/// The outbound messaging contract. The bot composes notifications and hands
/// them to this sink; delivery semantics beyond at-most-once per call are the
/// transport's business.
#[async_trait]
pub trait ChatSink: Send + Sync {
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

    /// Replaces the text of a plain message, clearing any action button.
    async fn edit_text(&self, handle: &MessageHandle, text: &str) -> Result<(), SinkError>;

    /// Replaces the caption of a document message, clearing any action button.
    async fn edit_caption(&self, handle: &MessageHandle, caption: &str) -> Result<(), SinkError>;
}
