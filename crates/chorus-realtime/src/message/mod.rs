//! Wire message types, boundary validation and JSON serialization.

pub mod serializer;
pub mod types;
pub mod validator;

pub use types::{ClientMessage, RawNotification, ServerMessage};
