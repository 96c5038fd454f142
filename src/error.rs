//! Error type shared by the transport and the command handlers.

use thiserror::Error;

/// Errors raised while talking to Slack or dispatching a command.
///
/// Every handler propagates these to the receive loop, which decides
/// whether the process keeps going (see [`crate::config::SendErrorPolicy`]).
#[derive(Debug, Error)]
pub enum BotError {
    /// `rtm.connect` answered with `ok: false`.
    #[error("handshake rejected: {0}")]
    Handshake(String),

    /// HTTP failure while calling a web API.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dial, read or write failure on the WebSocket.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The peer closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// An inbound frame was not a valid message, or an outbound one failed to encode.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A command trigger could not be compiled.
    #[error("invalid command pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Two handlers were registered under the same name.
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for BotError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::ConnectionClosed,
            other => Self::WebSocket(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_display() {
        let err = BotError::Handshake("invalid_auth".into());
        assert_eq!(err.to_string(), "handshake rejected: invalid_auth");
    }

    #[test]
    fn test_closed_socket_maps_to_connection_closed() {
        let err: BotError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, BotError::ConnectionClosed));
    }

    #[test]
    fn test_json_error_is_payload() {
        let json_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err: BotError = json_err.into();
        assert!(matches!(err, BotError::Payload(_)));
        assert!(err.to_string().starts_with("malformed payload"));
    }
}
