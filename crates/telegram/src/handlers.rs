use {
    teloxide::types::{Message, Update, UpdateKind},
    tracing::{debug, info, warn},
};

use crate::{
    link::{self, ContentRef},
    publisher::ContentKind,
    state::GateState,
};

/// Route a single update. Every failure is handled (and logged) inside, so
/// one update can never affect another.
pub async fn handle_update(update: Update, state: &GateState) {
    match update.kind {
        UpdateKind::Message(msg) => handle_message(msg, state).await,
        UpdateKind::ChannelPost(msg) => handle_channel_post(msg, state).await,
        other => debug!("ignoring update: {other:?}"),
    }
}

/// Serve `/start <payload>` requests sent to the bot in private chats.
pub async fn handle_message(msg: Message, state: &GateState) {
    if !msg.chat.is_private() {
        debug!(chat_id = msg.chat.id.0, "ignoring non-private message");
        return;
    }
    let Some(payload) = msg.text().and_then(link::parse_start_command) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without /start");
        return;
    };
    let Some(user) = msg.from.as_ref() else {
        warn!(chat_id = msg.chat.id.0, "start command without sender");
        return;
    };

    debug!(
        user_id = user.id.0,
        username = ?user.username,
        payload = payload.unwrap_or_default(),
        "processing start command"
    );
    state.relay.handle_start(user.id, msg.chat.id, payload).await;
}

/// Announce photos and videos posted to the Content Store.
pub async fn handle_channel_post(msg: Message, state: &GateState) {
    if msg.chat.id != state.config.content_store() {
        debug!(chat_id = msg.chat.id.0, "ignoring post outside the content store");
        return;
    }
    let Some(kind) = ContentKind::of(&msg) else {
        debug!(message_id = msg.id.0, "ignoring non-media content store post");
        return;
    };

    let report = state.publisher.on_new_content(ContentRef(msg.id), kind).await;
    info!(
        message_id = msg.id.0,
        ?kind,
        announced = report.announcement.is_some(),
        scheduled = report.scheduled.len(),
        "content store post handled"
    );
}
