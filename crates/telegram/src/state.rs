use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    config::GateConfig, publisher::Publisher, relay::ContentRelay, retention::RetentionScheduler,
    transport::Transport,
};

/// Shared gate state handed to every update task.
pub type SharedState = Arc<GateState>;

/// Everything an update handler needs. Built once at startup and never
/// mutated afterwards.
pub struct GateState {
    pub config: Arc<GateConfig>,
    pub bot_username: String,
    pub relay: ContentRelay,
    pub publisher: Publisher,
    pub scheduler: Arc<RetentionScheduler>,
}

impl GateState {
    pub fn new(
        config: GateConfig,
        bot_username: String,
        transport: Arc<dyn Transport>,
        shutdown: CancellationToken,
    ) -> Self {
        let config = Arc::new(config);
        let scheduler = Arc::new(RetentionScheduler::new(
            Arc::clone(&transport),
            config.retention(),
            shutdown,
        ));
        let relay = ContentRelay::new(Arc::clone(&transport), Arc::clone(&config));
        let publisher = Publisher::new(
            transport,
            Arc::clone(&config),
            bot_username.clone(),
            Arc::clone(&scheduler),
        );
        Self {
            config,
            bot_username,
            relay,
            publisher,
            scheduler,
        }
    }
}
