//! WonderQ message queue
//!
//! Provides the in-memory queue store with support for:
//! - Enqueue, LeaseNext, Acknowledge, Release
//! - Lazily evaluated visibility timeouts
//! - The `/new-message`, `/create-message` and `/update-message` HTTP routes

pub mod clock;
pub mod handlers;
mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use handlers::routes;
pub use storage::{
    LeaseState, LeasedMessage, QueueError, QueueStats, QueueStore, UpdateStatus,
    DEFAULT_VISIBILITY_TIMEOUT,
};
