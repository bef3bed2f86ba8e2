//! Server-to-client event envelope.

use serde::Serialize;

use crate::domain::Message;

/// Event name carrying relayed producer data.
pub const DATA_EVENT: &str = "data";

/// JSON envelope of a server-pushed event.
///
/// ```json
/// {"event":"data","payload":"hello"}
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServerEvent<'a> {
    /// Event name.
    pub event: &'static str,
    /// Event payload, the relayed message text.
    pub payload: &'a str,
}

impl<'a> ServerEvent<'a> {
    /// Wraps a relayed message as a `data` event.
    #[must_use]
    pub fn data(message: &'a Message) -> Self {
        Self {
            event: DATA_EVENT,
            payload: message.as_str(),
        }
    }

    /// Serializes the event to its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn data_event_shape() {
        let message = Message::from("hello");
        let Ok(json) = ServerEvent::data(&message).to_json() else {
            panic!("serialization failed");
        };
        assert_eq!(json, r#"{"event":"data","payload":"hello"}"#);
    }

    #[test]
    fn payload_is_escaped_not_parsed() {
        let message = Message::from("{\"temp\": 21.5}\n");
        let Ok(json) = ServerEvent::data(&message).to_json() else {
            panic!("serialization failed");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&json) else {
            panic!("invalid json");
        };
        assert_eq!(
            value.get("payload").and_then(|v| v.as_str()),
            Some("{\"temp\": 21.5}\n")
        );
    }
}
