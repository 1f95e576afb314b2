use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error("failed to build HTTP client: {message}")]
    HttpClient { message: String },

    #[error("invalid config: {message}")]
    Config { message: String },
}

impl Error {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap a client construction failure. teloxide pins its own `reqwest`,
    /// so the source error is kept as text.
    #[must_use]
    pub fn http_client(source: impl std::fmt::Display) -> Self {
        Self::HttpClient {
            message: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
