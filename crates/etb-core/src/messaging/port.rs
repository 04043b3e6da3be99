use async_trait::async_trait;

use crate::{domain::ChatId, messaging::types::Reply, Result};

/// Cross-messenger port.
///
/// Telegram is the only implementation; the dispatcher produces `Reply` values
/// and the transport decides how to render the keyboard.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<()>;
}
