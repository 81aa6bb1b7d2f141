//! Collaborator traits defined in `chorus-core` and implemented by adapter
//! crates (WebSocket source, REST client, session storage).

pub mod persistence;
pub mod session;
pub mod source;

pub use persistence::ReadReceiptSink;
pub use session::{SessionProvider, StaticSession};
pub use source::{EventSource, SourceCommand, SourceEvent, SourceHandle};
