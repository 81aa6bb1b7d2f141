//! Integration tests for the notification pipeline.
//!
//! Timing assertions run on tokio's paused clock.

mod helpers;

mod engine_test;
mod queue_test;
mod read_state_test;
