//! Real-time connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// WebSocket event source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket endpoint, e.g. `wss://api.example.com/ws`.
    #[serde(default = "default_url")]
    pub url: String,
    /// Delay before the defensive second subscribe after `connected`.
    #[serde(default = "default_resubscribe_delay")]
    pub resubscribe_delay_ms: u64,
    /// Buffer size of the adapter's inbound event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            resubscribe_delay_ms: default_resubscribe_delay(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ConnectionConfig {
    /// Resubscribe delay as a [`Duration`].
    pub fn resubscribe_delay(&self) -> Duration {
        Duration::from_millis(self.resubscribe_delay_ms)
    }
}

fn default_url() -> String {
    "ws://127.0.0.1:3000/ws".to_string()
}

fn default_resubscribe_delay() -> u64 {
    1000
}

fn default_event_buffer() -> usize {
    256
}
