//! JSON serialization for socket messages.

use super::types::{ClientMessage, ServerMessage};

/// Serialize an outbound client message
pub fn serialize_client(msg: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Deserialize a server message from JSON
pub fn deserialize_server(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}
