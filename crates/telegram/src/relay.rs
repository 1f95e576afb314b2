//! Delivers protected Content Store posts to users who opened an access link.

use std::sync::Arc;

use {
    teloxide::types::{ChatId, MessageId, UserId},
    tracing::{debug, info, warn},
};

use crate::{
    access,
    config::GateConfig,
    link,
    transport::{OutgoingMessage, Transport, TransportError},
};

pub const ACCESS_DENIED_MSG: &str = "❌ Access Denied!\n\n\
    1️⃣ You must join our channel first\n\
    2️⃣ Click below to join\n\
    3️⃣ Return here and try again";
pub const JOIN_BUTTON_LABEL: &str = "🔔 Join Channel";
pub const INVALID_LINK_MSG: &str = "❌ Invalid access link";
pub const CONTENT_GONE_MSG: &str = "❌ Content is no longer available";
pub const UNBLOCK_MSG: &str = "❌ Please unblock the bot and try again";
pub const RETRY_MSG: &str = "❌ Please join channel and try again";

/// Result of a single access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// A protected copy landed in the user's chat.
    Delivered { copy: MessageId },
    AccessDenied,
    InvalidReference,
    ContentUnavailable,
    DeliveryBlocked,
    TransientServiceFailure,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::AccessDenied => "access_denied",
            Self::InvalidReference => "invalid_reference",
            Self::ContentUnavailable => "content_unavailable",
            Self::DeliveryBlocked => "delivery_blocked",
            Self::TransientServiceFailure => "transient_service_failure",
        }
    }
}

pub struct ContentRelay {
    transport: Arc<dyn Transport>,
    config: Arc<GateConfig>,
}

impl ContentRelay {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<GateConfig>) -> Self {
        Self { transport, config }
    }

    /// Copy the content referenced by `payload` to `user`.
    ///
    /// Membership is checked before the payload is even looked at, so
    /// non-members never learn whether a link is valid.
    pub async fn deliver(&self, user: UserId, payload: Option<&str>) -> DeliveryOutcome {
        if !access::is_member(self.transport.as_ref(), user, self.config.gating_group()).await {
            return DeliveryOutcome::AccessDenied;
        }

        let content = match link::decode(payload) {
            Ok(content) => content,
            Err(reason) => {
                debug!(user_id = user.0, %reason, "rejected access link");
                return DeliveryOutcome::InvalidReference;
            },
        };

        // A user's private chat shares the user's id.
        let destination = ChatId::from(user);
        match self
            .transport
            .copy_message(
                destination,
                self.config.content_store(),
                content.message_id(),
                true,
            )
            .await
        {
            Ok(copy) => DeliveryOutcome::Delivered { copy },
            Err(TransportError::Blocked) => DeliveryOutcome::DeliveryBlocked,
            Err(TransportError::NotFound) => DeliveryOutcome::ContentUnavailable,
            Err(e) => {
                warn!(
                    user_id = user.0,
                    message_id = content.message_id().0,
                    error = %e,
                    "content copy failed"
                );
                DeliveryOutcome::TransientServiceFailure
            },
        }
    }

    /// The reply sent for `outcome`, if any.
    pub fn reply_for(&self, outcome: DeliveryOutcome) -> Option<OutgoingMessage> {
        let text = match outcome {
            DeliveryOutcome::Delivered { .. } => return None,
            DeliveryOutcome::AccessDenied => {
                let message = OutgoingMessage::text(ACCESS_DENIED_MSG);
                return Some(match self.config.join_url() {
                    Ok(url) => message.with_url_button(JOIN_BUTTON_LABEL, url),
                    Err(e) => {
                        warn!(error = %e, "join button omitted");
                        message
                    },
                });
            },
            DeliveryOutcome::InvalidReference => INVALID_LINK_MSG,
            DeliveryOutcome::ContentUnavailable => CONTENT_GONE_MSG,
            DeliveryOutcome::DeliveryBlocked => UNBLOCK_MSG,
            DeliveryOutcome::TransientServiceFailure => RETRY_MSG,
        };
        Some(OutgoingMessage::text(text))
    }

    /// Serve a `/start` request from `user` in `chat` and answer it.
    pub async fn handle_start(
        &self,
        user: UserId,
        chat: ChatId,
        payload: Option<&str>,
    ) -> DeliveryOutcome {
        let outcome = self.deliver(user, payload).await;
        info!(
            user_id = user.0,
            payload = payload.unwrap_or_default(),
            outcome = outcome.as_str(),
            "access request handled"
        );

        if let Some(reply) = self.reply_for(outcome)
            && let Err(e) = self.transport.send_message(chat, reply).await
        {
            warn!(
                user_id = user.0,
                chat_id = chat.0,
                outcome = outcome.as_str(),
                error = %e,
                "failed to send access reply"
            );
        }
        outcome
    }
}
