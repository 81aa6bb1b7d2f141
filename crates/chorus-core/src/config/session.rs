//! Session credentials.

use serde::{Deserialize, Serialize};

/// Session settings. A missing token means no user is authenticated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Bearer token for the socket handshake and REST calls.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Id of the authenticated user.
    #[serde(default)]
    pub user_id: Option<String>,
}
