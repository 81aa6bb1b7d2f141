//! The arrival-to-presentation pipeline: suppression, priority
//! classification, paced delivery and read-state tracking.

pub mod context;
pub mod dispatcher;
pub mod filter;
pub mod listeners;
pub mod priority;
pub mod queue;
pub mod read_state;

pub use context::UiContextHandle;
pub use dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use listeners::{DeliveryListeners, DeliverySubscription};
pub use priority::{Priority, priority_of};
pub use queue::DeliveryQueue;
pub use read_state::ReadStateTracker;
