//! Deep-link payloads pointing at Content Store messages.
//!
//! A payload is the decimal id of the source message, carried as the
//! `start` parameter of `https://t.me/<bot>?start=<payload>`. Nothing else
//! is embedded: expiry is enforced by deleting the announcement, and a link
//! stays decodable for as long as the bot runs.

use teloxide::types::MessageId;

/// Position of a content item in the Content Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentRef(pub MessageId);

impl ContentRef {
    pub fn message_id(self) -> MessageId {
        self.0
    }
}

/// Why a payload could not be turned into a [`ContentRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReference {
    Missing,
    NotNumeric(String),
    OutOfRange(String),
}

impl std::fmt::Display for InvalidReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing start payload"),
            Self::NotNumeric(raw) => write!(f, "non-numeric start payload {raw:?}"),
            Self::OutOfRange(raw) => write!(f, "start payload {raw:?} is not a valid message id"),
        }
    }
}

pub fn encode(content: ContentRef) -> String {
    content.message_id().0.to_string()
}

pub fn decode(payload: Option<&str>) -> Result<ContentRef, InvalidReference> {
    let raw = payload.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(InvalidReference::Missing);
    }
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(InvalidReference::NotNumeric(raw.to_string()));
    }
    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(ContentRef(MessageId(id))),
        _ => Err(InvalidReference::OutOfRange(raw.to_string())),
    }
}

/// Full deep link for `content`, addressed to `bot_username`.
pub fn access_link(bot_username: &str, content: ContentRef) -> String {
    format!(
        "https://t.me/{}?start={}",
        bot_username.trim_start_matches('@'),
        encode(content)
    )
}

/// Extract the payload of a `/start` command.
///
/// Returns `None` when `text` is not a start command, `Some(None)` for a
/// bare `/start` and `Some(Some(payload))` otherwise. A `@botname` suffix
/// on the command is accepted.
pub fn parse_start_command(text: &str) -> Option<Option<&str>> {
    let text = text.trim();
    let (command, rest) = match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    };
    let command = command.split_once('@').map_or(command, |(c, _)| c);
    if command != "/start" {
        return None;
    }
    Some((!rest.is_empty()).then_some(rest))
}
