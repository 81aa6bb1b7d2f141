//! Current-user/session capability.

use crate::config::SessionConfig;

/// Tells the pipeline whether a user is signed in.
///
/// When no user is authenticated the pipeline performs no subscription and
/// holds no notifications.
pub trait SessionProvider: Send + Sync + 'static {
    /// Whether a user is currently authenticated.
    fn is_authenticated(&self) -> bool;

    /// Token used for the real-time handshake, if authenticated.
    fn auth_token(&self) -> Option<String>;
}

/// Session backed by a fixed token (configuration or tests).
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    token: Option<String>,
}

impl StaticSession {
    /// Session authenticated with `token`.
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Session with no user.
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Build from the configured session section.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            token: config
                .auth_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
        }
    }
}

impl SessionProvider for StaticSession {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn auth_token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_anonymous() {
        let config = SessionConfig {
            auth_token: Some("  ".to_string()),
            user_id: None,
        };
        assert!(!StaticSession::from_config(&config).is_authenticated());
        assert!(StaticSession::authenticated("t0k").is_authenticated());
    }
}
