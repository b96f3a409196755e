//! Core types for WonderQ
//!
//! This crate provides the wire error codes and message identifiers shared
//! by the queue store, the HTTP layer and the test client.

pub mod error;
pub mod id;

pub use error::{ErrorCode, WireError};
pub use id::MessageId;
