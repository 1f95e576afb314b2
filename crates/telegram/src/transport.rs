//! The Bot API calls the gate depends on, behind a trait so the relay,
//! publisher and retention scheduler can be driven without a live bot.

use {
    async_trait::async_trait,
    reqwest::Url,
    teloxide::{
        ApiError, RequestError,
        payloads::{CopyMessageSetters, SendMessageSetters},
        prelude::*,
        types::{
            ChatId, ChatMemberStatus, InlineKeyboardButton, InlineKeyboardMarkup,
            LinkPreviewOptions, MessageId, UserId,
        },
    },
    thiserror::Error,
};

/// Standing of a user in a chat, as reported by `getChatMember`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl From<ChatMemberStatus> for MemberStatus {
    fn from(status: ChatMemberStatus) -> Self {
        match status {
            ChatMemberStatus::Owner => Self::Owner,
            ChatMemberStatus::Administrator => Self::Administrator,
            ChatMemberStatus::Member => Self::Member,
            ChatMemberStatus::Restricted => Self::Restricted,
            ChatMemberStatus::Left => Self::Left,
            ChatMemberStatus::Banned => Self::Banned,
        }
    }
}

/// Inline URL button attached below a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlButton {
    pub label: String,
    pub url: Url,
}

/// A text message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub protect_content: bool,
    pub disable_link_preview: bool,
    pub url_button: Option<UrlButton>,
}

impl OutgoingMessage {
    /// Plain unprotected message with previews left on.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            protect_content: false,
            disable_link_preview: false,
            url_button: None,
        }
    }

    pub fn protected(mut self) -> Self {
        self.protect_content = true;
        self
    }

    pub fn without_link_preview(mut self) -> Self {
        self.disable_link_preview = true;
        self
    }

    pub fn with_url_button(mut self, label: impl Into<String>, url: Url) -> Self {
        self.url_button = Some(UrlButton {
            label: label.into(),
            url,
        });
        self
    }
}

/// Failure cause of a transport call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The recipient blocked the bot.
    #[error("bot was blocked by the user")]
    Blocked,

    /// The referenced message no longer exists.
    #[error("message not found")]
    NotFound,

    #[error(transparent)]
    Request(RequestError),
}

impl From<RequestError> for TransportError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::Api(ApiError::BotBlocked) => Self::Blocked,
            RequestError::Api(
                ApiError::MessageToCopyNotFound
                | ApiError::MessageToDeleteNotFound
                | ApiError::MessageIdInvalid,
            ) => Self::NotFound,
            other => Self::Request(other),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Bot API operations used by the gate.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn member_status(&self, group: ChatId, user: UserId) -> TransportResult<MemberStatus>;

    /// Copy `message_id` from `from` into `to`, returning the id of the copy.
    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
        protect_content: bool,
    ) -> TransportResult<MessageId>;

    async fn send_message(
        &self,
        chat: ChatId,
        message: OutgoingMessage,
    ) -> TransportResult<MessageId>;

    async fn delete_message(&self, chat: ChatId, message_id: MessageId) -> TransportResult<()>;
}

/// [`Transport`] backed by a teloxide bot.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn disabled_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn member_status(&self, group: ChatId, user: UserId) -> TransportResult<MemberStatus> {
        let member = self.bot.get_chat_member(group, user).await?;
        Ok(member.status().into())
    }

    async fn copy_message(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
        protect_content: bool,
    ) -> TransportResult<MessageId> {
        let copied = self
            .bot
            .copy_message(to, from, message_id)
            .protect_content(protect_content)
            .await?;
        Ok(copied)
    }

    async fn send_message(
        &self,
        chat: ChatId,
        message: OutgoingMessage,
    ) -> TransportResult<MessageId> {
        let mut req = self
            .bot
            .send_message(chat, message.text)
            .protect_content(message.protect_content);
        if message.disable_link_preview {
            req = req.link_preview_options(disabled_link_preview());
        }
        if let Some(button) = message.url_button {
            req = req.reply_markup(InlineKeyboardMarkup::new([[InlineKeyboardButton::url(
                button.label,
                button.url,
            )]]));
        }
        let sent = req.await?;
        Ok(sent.id)
    }

    async fn delete_message(&self, chat: ChatId, message_id: MessageId) -> TransportResult<()> {
        self.bot.delete_message(chat, message_id).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_blocked_is_classified_as_blocked() {
        let err = TransportError::from(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(err, TransportError::Blocked));
    }

    #[test]
    fn missing_messages_are_classified_as_not_found() {
        for api in [
            ApiError::MessageToCopyNotFound,
            ApiError::MessageToDeleteNotFound,
            ApiError::MessageIdInvalid,
        ] {
            let err = TransportError::from(RequestError::Api(api));
            assert!(matches!(err, TransportError::NotFound));
        }
    }

    #[test]
    fn other_errors_fall_into_request_bucket() {
        let err = TransportError::from(RequestError::Io(std::io::Error::other("boom")));
        assert!(matches!(err, TransportError::Request(_)));

        let err = TransportError::from(RequestError::Api(ApiError::ChatNotFound));
        assert!(matches!(err, TransportError::Request(_)));
    }

    #[test]
    fn member_status_maps_every_variant() {
        assert_eq!(
            MemberStatus::from(ChatMemberStatus::Owner),
            MemberStatus::Owner
        );
        assert_eq!(
            MemberStatus::from(ChatMemberStatus::Administrator),
            MemberStatus::Administrator
        );
        assert_eq!(
            MemberStatus::from(ChatMemberStatus::Member),
            MemberStatus::Member
        );
        assert_eq!(
            MemberStatus::from(ChatMemberStatus::Restricted),
            MemberStatus::Restricted
        );
        assert_eq!(MemberStatus::from(ChatMemberStatus::Left), MemberStatus::Left);
        assert_eq!(
            MemberStatus::from(ChatMemberStatus::Banned),
            MemberStatus::Banned
        );
    }

    #[test]
    fn outgoing_message_builder_sets_flags() {
        let url = Url::parse("https://t.me/code_nood").expect("url");
        let msg = OutgoingMessage::text("hi")
            .protected()
            .without_link_preview()
            .with_url_button("Join", url.clone());
        assert!(msg.protect_content);
        assert!(msg.disable_link_preview);
        assert_eq!(
            msg.url_button,
            Some(UrlButton {
                label: "Join".into(),
                url
            })
        );
    }
}
