use std::time::Duration;

use {
    reqwest::Url,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    teloxide::types::ChatId,
};

use crate::{Error, Result};

/// Handle of the public channel users are asked to join.
pub const DEFAULT_GATING_GROUP_USERNAME: &str = "code_nood";

/// Default retention window for announcements and notifications (1 hour).
pub const DEFAULT_RETENTION_SECS: u64 = 3600;

/// Configuration for the gate bot. Immutable once the bot is started.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Private channel holding the protected media.
    pub content_store_id: i64,

    /// Public channel announcements are posted to.
    pub public_channel_id: i64,

    /// Channel whose membership grants access. Falls back to
    /// `public_channel_id` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gating_group_id: Option<i64>,

    /// Public handle of the gating group, used for the join button.
    pub gating_group_username: String,

    /// Username deep links point at. Resolved with `getMe` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_username: Option<String>,

    /// Seconds before announcements, notifications and (optionally) the
    /// source post are deleted.
    pub retention_secs: u64,

    /// Also delete the original Content Store post after the window. Off by
    /// default: the Content Store only grows, and access links stay valid
    /// for as long as their source post exists.
    pub delete_source: bool,
}

impl GateConfig {
    pub fn content_store(&self) -> ChatId {
        ChatId(self.content_store_id)
    }

    pub fn public_channel(&self) -> ChatId {
        ChatId(self.public_channel_id)
    }

    pub fn gating_group(&self) -> ChatId {
        ChatId(self.gating_group_id.unwrap_or(self.public_channel_id))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// `https://t.me/<handle>` link for the join prompt.
    pub fn join_url(&self) -> Result<Url> {
        let raw = format!(
            "https://t.me/{}",
            self.gating_group_username.trim_start_matches('@')
        );
        Url::parse(&raw).map_err(|e| Error::config(format!("invalid join url {raw}: {e}")))
    }

    /// Reject configs the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(Error::config("telegram bot token is required"));
        }
        if self.content_store_id == 0 {
            return Err(Error::config("content_store_id is required"));
        }
        if self.public_channel_id == 0 {
            return Err(Error::config("public_channel_id is required"));
        }
        if self.gating_group_id == Some(0) {
            return Err(Error::config("gating_group_id must not be 0"));
        }
        if self.gating_group_username.trim_start_matches('@').is_empty() {
            return Err(Error::config("gating_group_username is required"));
        }
        self.join_url()?;
        if self.retention_secs == 0 {
            return Err(Error::config("retention_secs must be greater than 0"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("token", &"[REDACTED]")
            .field("content_store_id", &self.content_store_id)
            .field("public_channel_id", &self.public_channel_id)
            .field("gating_group_id", &self.gating_group_id)
            .field("retention_secs", &self.retention_secs)
            .finish_non_exhaustive()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            content_store_id: 0,
            public_channel_id: 0,
            gating_group_id: None,
            gating_group_username: DEFAULT_GATING_GROUP_USERNAME.into(),
            bot_username: None,
            retention_secs: DEFAULT_RETENTION_SECS,
            delete_source: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GateConfig {
        GateConfig {
            token: Secret::new("123:ABC".into()),
            content_store_id: -1001,
            public_channel_id: -1002,
            ..Default::default()
        }
    }

    #[test]
    fn default_config() {
        let cfg = GateConfig::default();
        assert_eq!(cfg.retention(), Duration::from_secs(3600));
        assert_eq!(cfg.gating_group_username, "code_nood");
        assert!(!cfg.delete_source);
        assert!(cfg.bot_username.is_none());
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
            token = "123:ABC"
            content_store_id = -1001
            public_channel_id = -1002
            retention_secs = 60
        "#;
        let cfg: GateConfig = toml::from_str(raw).expect("parse toml");
        assert_eq!(cfg.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.content_store(), ChatId(-1001));
        assert_eq!(cfg.public_channel(), ChatId(-1002));
        assert_eq!(cfg.retention(), Duration::from_secs(60));
        // defaults for unspecified fields
        assert!(!cfg.delete_source);
        assert_eq!(cfg.gating_group_username, "code_nood");
    }

    #[test]
    fn source_deletion_is_opt_in() {
        let cfg: GateConfig = toml::from_str("delete_source = true").expect("parse toml");
        assert!(cfg.delete_source);
    }

    #[test]
    fn gating_group_falls_back_to_public_channel() {
        let mut cfg = valid();
        assert_eq!(cfg.gating_group(), ChatId(-1002));
        cfg.gating_group_id = Some(-1003);
        assert_eq!(cfg.gating_group(), ChatId(-1003));
    }

    #[test]
    fn join_url_strips_at_sign() {
        let mut cfg = valid();
        cfg.gating_group_username = "@my_channel".into();
        let url = cfg.join_url().expect("join url");
        assert_eq!(url.as_str(), "https://t.me/my_channel");
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut cfg = valid();
        cfg.token = Secret::new("  ".into());
        assert!(matches!(cfg.validate(), Err(Error::Config { .. })));

        let mut cfg = valid();
        cfg.content_store_id = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config { .. })));

        let mut cfg = valid();
        cfg.public_channel_id = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config { .. })));

        let mut cfg = valid();
        cfg.retention_secs = 0;
        assert!(matches!(cfg.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("123:ABC"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
