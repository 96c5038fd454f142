//! Slack real time messaging: wire messages and the WebSocket transport.

pub mod message;
pub mod transport;

pub use message::{mention_token, Message};
pub use transport::{connect, handshake, Sequencer, SlackTransport, Transport};
