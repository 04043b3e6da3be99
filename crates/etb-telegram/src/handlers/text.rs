use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use etb_core::{
    domain::{ChatId, UserId},
    messaging::types::TextMessage,
};

use crate::router::AppState;

/// Convert a Telegram text message into the core message model.
fn to_text_message(msg: &Message) -> Option<TextMessage> {
    let user = msg.from()?;
    let text = msg.text()?;
    Some(TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        text: text.to_string(),
    })
}

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(incoming) = to_text_message(&msg) else {
        return Ok(());
    };

    let reply = state.dispatcher.handle(&incoming).await;

    if let Err(e) = state.messenger.send_reply(incoming.chat_id, &reply).await {
        warn!(
            chat_id = incoming.chat_id.0,
            user_id = incoming.user_id.0,
            error = %e,
            "failed to send reply"
        );
    }
    Ok(())
}
