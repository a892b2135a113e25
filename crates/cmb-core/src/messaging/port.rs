use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::{ChatAction, MessagingCapabilities, TextFormat},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation. The core only needs to deliver text,
/// show a typing indicator and remove messages flagged by moderation.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Deliver `text` to `chat_id`, optionally threaded as a reply to `reply_to`.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;
}
