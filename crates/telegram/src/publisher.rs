//! Announces new Content Store media in the public channel.

use std::{sync::Arc, time::Duration};

use {
    teloxide::types::{Message, MessageId},
    tracing::{error, info, warn},
};

use crate::{
    config::GateConfig,
    link::{self, ContentRef},
    retention::{Artifact, ArtifactKind, RetentionScheduler},
    transport::{OutgoingMessage, Transport},
};

/// Media types that get announced. Everything else posted to the Content
/// Store is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Photo,
    Video,
}

impl ContentKind {
    pub fn of(msg: &Message) -> Option<Self> {
        if msg.video().is_some() {
            Some(Self::Video)
        } else if msg.photo().is_some() {
            Some(Self::Photo)
        } else {
            None
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }
}

/// What a publish run managed to post and schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub announcement: Option<MessageId>,
    pub notification: Option<MessageId>,
    pub scheduled: Vec<Artifact>,
}

/// Render a retention window the way the warnings phrase it ("1 hour",
/// "30 minutes", "45 seconds").
pub fn humanize(window: Duration) -> String {
    let secs = window.as_secs();
    let (value, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

pub fn announcement_text(access_link: &str, kind: ContentKind, window: Duration) -> String {
    format!(
        "🔒 Protected Content\n\n\
         ▫️ No Screenshots\n\
         ▫️ No Downloads\n\
         ▫️ No Forwarding\n\n\
         🔗 Access: {access_link}\n\n\
         ⚠️ Note: This {} and message will be automatically deleted after {}.",
        kind.noun(),
        humanize(window)
    )
}

pub fn notification_text(kind: ContentKind, window: Duration) -> String {
    format!(
        "⚠️ Sorry, the {} will be deleted after {} for privacy reasons.",
        kind.noun(),
        humanize(window)
    )
}

pub struct Publisher {
    transport: Arc<dyn Transport>,
    config: Arc<GateConfig>,
    bot_username: String,
    scheduler: Arc<RetentionScheduler>,
}

impl Publisher {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: Arc<GateConfig>,
        bot_username: String,
        scheduler: Arc<RetentionScheduler>,
    ) -> Self {
        Self {
            transport,
            config,
            bot_username,
            scheduler,
        }
    }

    /// Announce `content`, tell the poster it will expire and schedule the
    /// cleanup.
    ///
    /// Duplicate events are not deduplicated: each call publishes and
    /// schedules again.
    pub async fn on_new_content(&self, content: ContentRef, kind: ContentKind) -> PublishReport {
        let mut report = PublishReport::default();
        let window = self.scheduler.window();
        let access_link = link::access_link(&self.bot_username, content);
        let public_channel = self.config.public_channel();
        let store = self.config.content_store();

        let announcement = OutgoingMessage::text(announcement_text(&access_link, kind, window))
            .protected()
            .without_link_preview();
        match self.transport.send_message(public_channel, announcement).await {
            Ok(id) => {
                info!(
                    source_message_id = content.message_id().0,
                    chat_id = public_channel.0,
                    message_id = id.0,
                    "posted announcement"
                );
                report.announcement = Some(id);
            },
            Err(e) => {
                error!(
                    source_message_id = content.message_id().0,
                    chat_id = public_channel.0,
                    error = %e,
                    "failed to post announcement"
                );
                return report;
            },
        }

        match self
            .transport
            .send_message(store, OutgoingMessage::text(notification_text(kind, window)))
            .await
        {
            Ok(id) => report.notification = Some(id),
            Err(e) => warn!(
                source_message_id = content.message_id().0,
                chat_id = store.0,
                error = %e,
                "failed to post expiry notification"
            ),
        }

        if let Some(id) = report.announcement {
            report
                .scheduled
                .push(Artifact::new(ArtifactKind::Announcement, public_channel, id));
        }
        if let Some(id) = report.notification {
            report
                .scheduled
                .push(Artifact::new(ArtifactKind::Notification, store, id));
        }
        if self.config.delete_source {
            report.scheduled.push(Artifact::new(
                ArtifactKind::SourceContent,
                store,
                content.message_id(),
            ));
        }
        for artifact in &report.scheduled {
            self.scheduler.schedule(*artifact);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::transport::mock::{Failure, MockTransport},
        secrecy::Secret,
        serde_json::json,
        teloxide::types::ChatId,
        tokio_util::sync::CancellationToken,
    };

    const STORE: ChatId = ChatId(-100_100);
    const PUBLIC: ChatId = ChatId(-100_200);
    const WINDOW: Duration = Duration::from_secs(3600);

    fn config(delete_source: bool) -> Arc<GateConfig> {
        Arc::new(GateConfig {
            token: Secret::new("123:ABC".into()),
            content_store_id: STORE.0,
            public_channel_id: PUBLIC.0,
            delete_source,
            ..Default::default()
        })
    }

    fn publisher(transport: &Arc<MockTransport>, delete_source: bool) -> Publisher {
        let transport = Arc::clone(transport) as Arc<dyn Transport>;
        let scheduler = Arc::new(RetentionScheduler::new(
            Arc::clone(&transport),
            WINDOW,
            CancellationToken::new(),
        ));
        Publisher::new(
            transport,
            config(delete_source),
            "gate_bot".into(),
            scheduler,
        )
    }

    #[test]
    fn humanize_windows() {
        assert_eq!(humanize(Duration::from_secs(3600)), "1 hour");
        assert_eq!(humanize(Duration::from_secs(7200)), "2 hours");
        assert_eq!(humanize(Duration::from_secs(1800)), "30 minutes");
        assert_eq!(humanize(Duration::from_secs(60)), "1 minute");
        assert_eq!(humanize(Duration::from_secs(90)), "90 seconds");
    }

    #[test]
    fn announcement_carries_link_and_warning() {
        let text = announcement_text("https://t.me/gate_bot?start=42", ContentKind::Video, WINDOW);
        assert!(text.starts_with("🔒 Protected Content"));
        assert!(text.contains("No Screenshots"));
        assert!(text.contains("No Downloads"));
        assert!(text.contains("No Forwarding"));
        assert!(text.contains("🔗 Access: https://t.me/gate_bot?start=42"));
        assert!(text.contains("This video and message will be automatically deleted after 1 hour."));
    }

    #[test]
    fn content_kind_detects_media() {
        let base = json!({
            "message_id": 42,
            "date": 1,
            "chat": { "id": STORE.0, "type": "channel", "title": "Store" },
        });

        let mut video = base.clone();
        video["video"] = json!({
            "file_id": "video-id",
            "file_unique_id": "video-unique",
            "width": 640,
            "height": 360,
            "duration": 5,
            "mime_type": "video/mp4",
            "file_size": 1024
        });
        let msg: Message = serde_json::from_value(video).expect("video post");
        assert_eq!(ContentKind::of(&msg), Some(ContentKind::Video));

        let mut photo = base.clone();
        photo["photo"] = json!([{
            "file_id": "photo-id",
            "file_unique_id": "photo-unique",
            "width": 90,
            "height": 90,
            "file_size": 512
        }]);
        let msg: Message = serde_json::from_value(photo).expect("photo post");
        assert_eq!(ContentKind::of(&msg), Some(ContentKind::Photo));

        let mut text = base;
        text["text"] = json!("hello");
        let msg: Message = serde_json::from_value(text).expect("text post");
        assert_eq!(ContentKind::of(&msg), None);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_then_deletes_after_window() {
        let transport = Arc::new(MockTransport::default());
        let publisher = publisher(&transport, true);
        let report = publisher
            .on_new_content(ContentRef(MessageId(42)), ContentKind::Video)
            .await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        let (chat, announcement) = &sent[0];
        assert_eq!(*chat, PUBLIC);
        assert!(announcement.protect_content);
        assert!(announcement.disable_link_preview);
        assert!(announcement.text.contains("https://t.me/gate_bot?start=42"));
        let (chat, notification) = &sent[1];
        assert_eq!(*chat, STORE);
        assert!(notification.text.contains("1 hour"));

        assert_eq!(report.scheduled.len(), 3);
        assert!(transport.deletes().is_empty());

        tokio::time::sleep(WINDOW + Duration::from_secs(1)).await;
        let deletes = transport.deletes();
        assert_eq!(deletes.len(), 3);
        let announcement_id = report.announcement.expect("announcement id");
        let notification_id = report.notification.expect("notification id");
        assert!(deletes.contains(&(PUBLIC, announcement_id)));
        assert!(deletes.contains(&(STORE, notification_id)));
        assert!(deletes.contains(&(STORE, MessageId(42))));
    }

    #[tokio::test(start_paused = true)]
    async fn source_is_kept_when_disabled() {
        let transport = Arc::new(MockTransport::default());
        let report = publisher(&transport, false)
            .on_new_content(ContentRef(MessageId(42)), ContentKind::Photo)
            .await;
        assert_eq!(report.scheduled.len(), 2);
        assert!(
            report
                .scheduled
                .iter()
                .all(|a| a.kind != ArtifactKind::SourceContent)
        );

        tokio::time::sleep(WINDOW * 2).await;
        assert!(!transport.deletes().contains(&(STORE, MessageId(42))));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_announcement_stops_publishing() {
        let transport = Arc::new(MockTransport::default().with_send_failure(PUBLIC, Failure::Network));
        let report = publisher(&transport, true)
            .on_new_content(ContentRef(MessageId(42)), ContentKind::Video)
            .await;

        assert_eq!(report, PublishReport::default());
        assert_eq!(transport.sent().len(), 1);
        tokio::time::sleep(WINDOW * 2).await;
        assert!(transport.deletes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_notification_still_schedules_announcement() {
        let transport = Arc::new(MockTransport::default().with_send_failure(STORE, Failure::Network));
        let report = publisher(&transport, true)
            .on_new_content(ContentRef(MessageId(42)), ContentKind::Video)
            .await;

        assert!(report.announcement.is_some());
        assert!(report.notification.is_none());
        assert_eq!(report.scheduled.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_events_publish_twice() {
        let transport = Arc::new(MockTransport::default());
        let publisher = publisher(&transport, false);
        let content = ContentRef(MessageId(42));
        publisher.on_new_content(content, ContentKind::Video).await;
        publisher.on_new_content(content, ContentKind::Video).await;

        assert_eq!(transport.sent().len(), 4);
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(transport.deletes().len(), 4);
    }
}
