//! Queue in-memory storage

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};
use wonderq_core::{ErrorCode, MessageId};

use crate::clock::{Clock, SystemClock};

/// How long a lease is honored without acknowledgement
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Message not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl QueueError {
    /// Wire code for this error. An empty lease and a bad payload share code 1.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::Rejected,
            Self::NotFound(_) => ErrorCode::UnknownMessage,
            Self::InvalidState(_) => ErrorCode::UnknownStatus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeaseState {
    Available,
    Leased,
}

/// Consumer signal carried by `/update-message`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Acknowledge,
    Release,
}

impl UpdateStatus {
    pub fn code(&self) -> i64 {
        match self {
            Self::Acknowledge => 1,
            Self::Release => 2,
        }
    }
}

impl TryFrom<i64> for UpdateStatus {
    type Error = QueueError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Acknowledge),
            2 => Ok(Self::Release),
            other => Err(QueueError::InvalidState(format!("unrecognized status {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
struct Message {
    id: MessageId,
    body: String,
    state: LeaseState,
    leased_at: Option<Instant>,
}

impl Message {
    fn new(body: String) -> Self {
        Self {
            id: MessageId::new(),
            body,
            state: LeaseState::Available,
            leased_at: None,
        }
    }

    fn lease_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.leased_at
            .map_or(true, |at| now.saturating_duration_since(at) > timeout)
    }

    fn is_eligible(&self, now: Instant, timeout: Duration) -> bool {
        match self.state {
            LeaseState::Available => true,
            LeaseState::Leased => self.lease_expired(now, timeout),
        }
    }
}

/// Copy of a message handed to a consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeasedMessage {
    pub id: MessageId,
    pub body: String,
}

/// Counts by stored state. Expired leases still count as `leased`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub available: usize,
    pub leased: usize,
    pub expired: usize,
}

/// Ordered message collection with lease tracking.
///
/// Every operation runs under one lock, so the scan and the mark in
/// [`QueueStore::lease_next`] can never interleave with another caller.
///
/// Leasing picks the first eligible message in insertion order. Under
/// sustained load this can starve messages near the tail.
#[derive(Debug)]
pub struct QueueStore {
    messages: Mutex<Vec<Message>>,
    visibility_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for QueueStore {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_TIMEOUT)
    }
}

impl QueueStore {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self::with_clock(visibility_timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(visibility_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            visibility_timeout,
            clock,
        }
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    /// Append a new available message and return its id
    pub fn enqueue(&self, body: impl Into<String>) -> Result<MessageId, QueueError> {
        let body = body.into();
        if body.is_empty() {
            return Err(QueueError::InvalidInput("message body is empty".to_string()));
        }

        let message = Message::new(body);
        let id = message.id.clone();

        let mut messages = self.messages.lock();
        messages.push(message);

        info!(id = %id, depth = messages.len(), "Enqueued message");
        Ok(id)
    }

    /// Lease the first eligible message in insertion order
    pub fn lease_next(&self) -> Result<LeasedMessage, QueueError> {
        let now = self.clock.now();
        let mut messages = self.messages.lock();

        let message = messages
            .iter_mut()
            .find(|m| m.is_eligible(now, self.visibility_timeout))
            .ok_or_else(|| QueueError::NotFound("no eligible message".to_string()))?;

        if message.state == LeaseState::Leased {
            debug!(id = %message.id, "Re-leasing message with expired lease");
        }
        message.state = LeaseState::Leased;
        message.leased_at = Some(now);

        info!(id = %message.id, "Leased message");
        Ok(LeasedMessage {
            id: message.id.clone(),
            body: message.body.clone(),
        })
    }

    /// Remove a message regardless of its lease state
    pub fn acknowledge(&self, id: &str) -> Result<(), QueueError> {
        let mut messages = self.messages.lock();
        let index = position(&messages, id)?;
        remove_at(&mut messages, index);
        Ok(())
    }

    /// Make a message available again. Releasing an available message is a no-op.
    pub fn release(&self, id: &str) -> Result<(), QueueError> {
        let mut messages = self.messages.lock();
        let index = position(&messages, id)?;
        release_at(&mut messages, index);
        Ok(())
    }

    /// Apply a raw consumer status to a message.
    ///
    /// The id is resolved before the status, so an unknown id reports
    /// `NotFound` even when the status is also unrecognized. `None` stands
    /// for a missing or non-numeric status.
    pub fn update(&self, id: &str, status: Option<i64>) -> Result<UpdateStatus, QueueError> {
        let mut messages = self.messages.lock();
        let index = position(&messages, id)?;

        let status = status
            .ok_or_else(|| QueueError::InvalidState("missing status".to_string()))
            .and_then(UpdateStatus::try_from)?;

        match status {
            UpdateStatus::Acknowledge => remove_at(&mut messages, index),
            UpdateStatus::Release => release_at(&mut messages, index),
        }
        Ok(status)
    }

    /// Stored lease state of one message. An expired lease still reads `Leased`.
    pub fn lease_state(&self, id: &str) -> Option<LeaseState> {
        self.messages
            .lock()
            .iter()
            .find(|m| m.id == *id)
            .map(|m| m.state)
    }

    pub fn stats(&self) -> QueueStats {
        let now = self.clock.now();
        let messages = self.messages.lock();

        let mut stats = QueueStats {
            total: messages.len(),
            ..QueueStats::default()
        };
        for message in messages.iter() {
            match message.state {
                LeaseState::Available => stats.available += 1,
                LeaseState::Leased => {
                    stats.leased += 1;
                    if message.lease_expired(now, self.visibility_timeout) {
                        stats.expired += 1;
                    }
                }
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

fn position(messages: &[Message], id: &str) -> Result<usize, QueueError> {
    messages
        .iter()
        .position(|m| m.id == *id)
        .ok_or_else(|| QueueError::NotFound(id.to_string()))
}

// Locked mutations shared by the direct operations and `update`.

fn remove_at(messages: &mut Vec<Message>, index: usize) {
    let message = messages.remove(index);
    info!(id = %message.id, "Acknowledged message");
}

fn release_at(messages: &mut [Message], index: usize) {
    let message = &mut messages[index];
    message.state = LeaseState::Available;
    info!(id = %message.id, "Released message");
}
