//! Client-side real-time notification pipeline for Chorus.
//!
//! Arriving socket events are validated at the adapter boundary, gated by
//! the current UI context, ordered by kind priority and delivered one at a
//! time at a human pace, with sound and vibration feedback and read-state
//! tracking.

pub mod api;
pub mod effects;
pub mod engine;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod source;

pub use engine::{NotificationEngine, NotificationEngineBuilder};
