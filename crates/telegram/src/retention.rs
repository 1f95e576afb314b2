//! Deferred deletion of announcements, notifications and source posts.
//!
//! Every scheduled deletion is its own task: it sleeps for the delay, makes a
//! single `deleteMessage` call and logs the result. Nothing is persisted, so
//! deletions still pending when the process exits are lost.

use std::{sync::Arc, time::Duration};

use {
    teloxide::types::{ChatId, MessageId},
    tokio_util::{sync::CancellationToken, task::TaskTracker},
    tracing::{debug, info, warn},
};

use crate::transport::Transport;

/// What a scheduled deletion removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Announcement,
    Notification,
    SourceContent,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Announcement => write!(f, "announcement"),
            Self::Notification => write!(f, "notification"),
            Self::SourceContent => write!(f, "source content"),
        }
    }
}

/// A message the gate posted (or relayed) that must disappear later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub chat: ChatId,
    pub message_id: MessageId,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, chat: ChatId, message_id: MessageId) -> Self {
        Self {
            kind,
            chat,
            message_id,
        }
    }
}

pub struct RetentionScheduler {
    transport: Arc<dyn Transport>,
    window: Duration,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl RetentionScheduler {
    pub fn new(transport: Arc<dyn Transport>, window: Duration, shutdown: CancellationToken) -> Self {
        Self {
            transport,
            window,
            tracker: TaskTracker::new(),
            shutdown,
        }
    }

    /// Retention window applied by [`Self::schedule`].
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of deletions scheduled but not yet attempted.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Delete `artifact` once the retention window has elapsed.
    pub fn schedule(&self, artifact: Artifact) {
        self.schedule_deletion(artifact, self.window);
    }

    /// Delete `artifact` once `delay` has elapsed. The attempt is made exactly
    /// once; a failure is logged and never retried.
    pub fn schedule_deletion(&self, artifact: Artifact, delay: Duration) {
        let transport = Arc::clone(&self.transport);
        let shutdown = self.shutdown.clone();
        debug!(
            kind = %artifact.kind,
            chat_id = artifact.chat.0,
            message_id = artifact.message_id.0,
            delay_secs = delay.as_secs(),
            "scheduled deletion"
        );
        self.tracker.spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {
                    debug!(
                        kind = %artifact.kind,
                        chat_id = artifact.chat.0,
                        message_id = artifact.message_id.0,
                        "shutdown before scheduled deletion"
                    );
                    return;
                },
                () = tokio::time::sleep(delay) => {},
            }
            delete_once(transport.as_ref(), artifact).await;
        });
    }

    /// Drop every pending deletion and wait for in-flight ones to finish.
    pub async fn shutdown(&self) {
        let pending = self.pending();
        if pending > 0 {
            info!(pending, "dropping pending deletions on shutdown");
        }
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn delete_once(transport: &dyn Transport, artifact: Artifact) {
    match transport
        .delete_message(artifact.chat, artifact.message_id)
        .await
    {
        Ok(()) => info!(
            kind = %artifact.kind,
            chat_id = artifact.chat.0,
            message_id = artifact.message_id.0,
            "deleted expired message"
        ),
        Err(e) => warn!(
            kind = %artifact.kind,
            chat_id = artifact.chat.0,
            message_id = artifact.message_id.0,
            error = %e,
            "failed to delete expired message"
        ),
    }
}
