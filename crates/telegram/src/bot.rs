use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, ChatId},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result,
    config::GateConfig,
    handlers,
    state::{GateState, SharedState},
    transport::TelegramTransport,
};

/// Long-polling timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u32 = 30;

/// Pause after a failed `getUpdates` call.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Connect the bot and start polling.
///
/// Spawns a background task that processes updates until `cancel` is
/// cancelled. The returned handle resolves once polling has stopped and
/// pending deletions were dropped.
pub async fn start_polling(
    config: GateConfig,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    config.validate()?;

    // Client timeout must outlive the long-polling timeout so the HTTP client
    // doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(45))
        .build()
        .map_err(Error::http_client)?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    let bot_username = match config.bot_username.clone().or_else(|| me.username.clone()) {
        Some(username) => username,
        None => return Err(Error::config("bot has no username for access links")),
    };

    bot.delete_webhook().send().await?;

    let commands = vec![BotCommand::new("start", "Open an access link")];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    verify_chat_access(&bot, "public channel", config.public_channel()).await;
    verify_chat_access(&bot, "content store", config.content_store()).await;
    if config.gating_group() != config.public_channel() {
        verify_chat_access(&bot, "gating group", config.gating_group()).await;
    }

    info!(
        username = %bot_username,
        content_store_id = config.content_store_id,
        public_channel_id = config.public_channel_id,
        retention_secs = config.retention_secs,
        "telegram bot connected (webhook cleared)"
    );

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let state: SharedState = Arc::new(GateState::new(
        config,
        bot_username,
        transport,
        cancel.child_token(),
    ));

    Ok(tokio::spawn(poll_updates(bot, state, cancel)))
}

/// Log whether the bot can see `chat`. Failures are not fatal: the bot may be
/// added to the chat later.
async fn verify_chat_access(bot: &Bot, label: &'static str, chat: ChatId) {
    match bot.get_chat(chat).await {
        Ok(found) => info!(
            chat = label,
            chat_id = chat.0,
            title = ?found.title(),
            "chat access verified"
        ),
        Err(e) => error!(chat = label, chat_id = chat.0, error = %e, "chat access failed"),
    }
}

async fn poll_updates(bot: Bot, state: SharedState, cancel: CancellationToken) {
    info!("starting telegram manual polling loop");
    let mut offset: i32 = 0;

    loop {
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = bot
                .get_updates()
                .offset(offset)
                .timeout(POLL_TIMEOUT_SECS)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::ChannelPost])
                .send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        handlers::handle_update(update, &state).await;
                    });
                }
            },
            Err(e) => {
                if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                    error!(
                        "telegram bot stopped: another instance is already running with this token"
                    );
                    break;
                }

                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                }
            },
        }
    }

    info!("telegram polling stopped");
    state.scheduler.shutdown().await;
}
