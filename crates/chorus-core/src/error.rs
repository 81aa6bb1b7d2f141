//! Unified application error types for Chorus.
//!
//! Adapter crates map their internal errors (WebSocket, HTTP, audio device)
//! into [`AppError`] so that a single error type crosses the pipeline
//! boundary.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Input or payload validation failed.
    Validation,
    /// The session is missing or the server rejected the credentials.
    Authentication,
    /// The real-time transport failed (connect, send, closed).
    Transport,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// The REST backend returned an error or was unreachable.
    ExternalService,
    /// A device capability (audio output, haptics) is unavailable.
    Capability,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Capability => write!(f, "CAPABILITY"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Chorus.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error came from the network rather than from local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Transport | ErrorKind::ExternalService | ErrorKind::Authentication
        )
    }
}

macro_rules! kind_constructors {
    ($($name:ident => $kind:ident),* $(,)?) => {
        impl AppError {
            $(
                #[doc = concat!("An error of kind [`ErrorKind::", stringify!($kind), "`].")]
                pub fn $name(message: impl Into<String>) -> Self {
                    Self::new(ErrorKind::$kind, message)
                }
            )*
        }
    };
}

kind_constructors! {
    validation => Validation,
    authentication => Authentication,
    transport => Transport,
    configuration => Configuration,
    external_service => ExternalService,
    capability => Capability,
    internal => Internal,
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
