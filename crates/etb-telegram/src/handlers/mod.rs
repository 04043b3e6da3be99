//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - extracts the sender and text from the Telegram update
//! - hands it to the `etb-core` dispatcher
//! - sends the resulting reply through the messenger

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use crate::router::AppState;

mod text;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.text().is_some() {
        return text::handle_text(msg, state).await;
    }

    // Photos, stickers, voice etc. carry nothing the ledger can use.
    debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
    Ok(())
}
