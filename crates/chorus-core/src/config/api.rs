//! REST backend configuration.

use serde::{Deserialize, Serialize};

/// Which transport carries read receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadReceiptTransport {
    /// Send `mark_notification_read` over the real-time socket.
    #[default]
    Socket,
    /// Call the REST endpoint.
    Rest,
}

/// REST API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport for read receipts.
    #[serde(default)]
    pub read_receipts: ReadReceiptTransport,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            read_receipts: ReadReceiptTransport::default(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

fn default_timeout() -> u64 {
    10
}
