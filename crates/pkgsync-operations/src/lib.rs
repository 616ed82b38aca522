//! Frontend-agnostic synchronization logic.
//!
//! Everything here reports progress through a [`pkgsync_events::EventSink`] and returns a
//! [`SyncReport`]; rendering is left to the caller.

pub mod context;
pub mod sync;
pub mod types;

pub use context::SyncContext;
pub use sync::sync;
pub use types::*;
