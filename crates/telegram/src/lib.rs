//! Telegram gate for protected channel media.
//!
//! Announces photos and videos posted to a private channel with a deep link,
//! hands protected copies to users who belong to the gating channel, and
//! deletes the announcements once the retention window has passed.

pub mod access;
pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod link;
pub mod publisher;
pub mod relay;
pub mod retention;
pub mod state;
pub mod transport;

pub use {
    config::GateConfig,
    error::{Error, Result},
};
