//! Gate configuration assembled from a TOML file, the environment and flags.

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::Args,
    mediagate_telegram::GateConfig,
    secrecy::Secret,
    tracing::debug,
};

/// Config file picked up from the working directory when `--config` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "mediagate.toml";

/// Per-field overrides. Each one can also come from the environment, using
/// the variable names the `.env` files of existing deployments already carry.
#[derive(Args, Default, Clone)]
pub struct Overrides {
    /// Bot token from @BotFather.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Private channel holding the protected media.
    #[arg(long, env = "PRIVATE_CHANNEL_ID", allow_hyphen_values = true)]
    pub content_store_id: Option<i64>,

    /// Public channel announcements are posted to.
    #[arg(long, env = "PUBLIC_CHANNEL_ID", allow_hyphen_values = true)]
    pub public_channel_id: Option<i64>,

    /// Channel whose membership grants access (defaults to the public channel).
    #[arg(long, env = "GATING_GROUP_ID", allow_hyphen_values = true)]
    pub gating_group_id: Option<i64>,

    /// Public handle of the gating channel, used for the join button.
    #[arg(long, env = "CHANNEL_USERNAME")]
    pub gating_group_username: Option<String>,

    /// Username deep links point at (defaults to the bot's own).
    #[arg(long, env = "BOT_USERNAME")]
    pub bot_username: Option<String>,

    /// Seconds before announcements and notifications are deleted.
    #[arg(long, env = "RETENTION_SECS")]
    pub retention_secs: Option<u64>,

    /// Also delete the original Content Store post after the retention window.
    #[arg(long)]
    pub delete_source: bool,
}

impl Overrides {
    fn apply(&self, config: &mut GateConfig) {
        if let Some(ref token) = self.token {
            config.token = Secret::new(token.clone());
        }
        if let Some(id) = self.content_store_id {
            config.content_store_id = id;
        }
        if let Some(id) = self.public_channel_id {
            config.public_channel_id = id;
        }
        if let Some(id) = self.gating_group_id {
            config.gating_group_id = Some(id);
        }
        if let Some(ref username) = self.gating_group_username {
            config.gating_group_username = username.clone();
        }
        if let Some(ref username) = self.bot_username {
            config.bot_username = Some(username.clone());
        }
        if let Some(secs) = self.retention_secs {
            config.retention_secs = secs;
        }
        if self.delete_source {
            config.delete_source = true;
        }
    }
}

/// Parse a TOML config file.
pub fn load_file(path: &Path) -> anyhow::Result<GateConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Explicit path if given, otherwise `./mediagate.toml` when it exists.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.exists().then_some(local)
}

/// Build the effective config. Later sources win: file, then overrides.
/// The result is not validated; the bot validates it before connecting.
pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> anyhow::Result<GateConfig> {
    let mut config = match find_config_file(explicit) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_file(&path)?
        },
        None => {
            debug!("no config file found, using defaults");
            GateConfig::default()
        },
    };
    overrides.apply(&mut config);
    Ok(config)
}
