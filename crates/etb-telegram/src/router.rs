use std::{net::SocketAddr, sync::Arc};

use teloxide::{
    dispatching::Dispatcher,
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    update_listeners::webhooks,
};
use tracing::info;

use etb_core::{
    config::{Config, RunMode},
    dispatcher::Dispatcher as CommandDispatcher,
    messaging::port::MessagingPort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Webhook endpoint registered with Telegram: `<public_url>/<token>`.
pub fn webhook_url(public_url: &str, token: &str) -> anyhow::Result<url::Url> {
    let raw = format!("{}/{token}", public_url.trim_end_matches('/'));
    Ok(url::Url::parse(&raw)?)
}

/// Serve updates until shutdown, using the delivery mode from `cfg`.
pub async fn run(cfg: Arc<Config>, dispatcher: Arc<CommandDispatcher>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        info!(username = %me.username(), "bot started");
    }

    // One reply per inbound message; the adapter retries once on RetryAfter.
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let state = Arc::new(AppState {
        dispatcher,
        messenger,
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut tg_dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build();

    match &cfg.run_mode {
        RunMode::Polling => {
            info!("running in polling mode");
            tg_dispatcher.dispatch().await;
        }
        RunMode::Webhook { public_url, port } => {
            let addr = SocketAddr::from(([0, 0, 0, 0], *port));
            let url = webhook_url(public_url, &cfg.telegram_bot_token)?;
            info!(port = *port, "running in webhook mode");
            let listener = webhooks::axum(bot, webhooks::Options::new(addr, url)).await?;
            tg_dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("webhook listener error"),
                )
                .await;
        }
    }

    Ok(())
}
