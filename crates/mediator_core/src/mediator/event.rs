//! Notification channels, event payloads and listener errors.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Notification channel exposed by a repository mediator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Added,
    Deleted,
    Retrieved,
}

impl Channel {
    /// Stable string id used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Retrieved => "retrieved",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable payload handed to listeners.
///
/// Carries exactly one entity; batches are never published.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent<T> {
    channel: Channel,
    entity: T,
}

impl<T> NotificationEvent<T> {
    pub(crate) fn new(channel: Channel, entity: T) -> Self {
        Self { channel, entity }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The entity involved in the operation.
    pub fn entity(&self) -> &T {
        &self.entity
    }
}

pub type ListenerResult = Result<(), ListenerError>;

/// Failure raised by a listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ListenerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener failed: {}", self.message)
    }
}

impl Error for ListenerError {}

#[cfg(test)]
mod tests {
    use super::{Channel, ListenerError, NotificationEvent};

    #[test]
    fn channel_strings_are_stable() {
        assert_eq!(Channel::Added.as_str(), "added");
        assert_eq!(Channel::Deleted.as_str(), "deleted");
        assert_eq!(Channel::Retrieved.to_string(), "retrieved");
    }

    #[test]
    fn event_exposes_channel_and_entity() {
        let event = NotificationEvent::new(Channel::Deleted, 42_u32);
        assert_eq!(event.channel(), Channel::Deleted);
        assert_eq!(*event.entity(), 42);
    }

    #[test]
    fn listener_error_display_includes_message() {
        let err = ListenerError::new("cache full");
        assert_eq!(err.message(), "cache full");
        assert!(err.to_string().contains("cache full"));
    }
}
