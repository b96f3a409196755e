//! Wire error codes and formatting

use serde::{Deserialize, Serialize};

/// Logical outcome codes carried in the `error` field of every response.
///
/// Every response is sent with HTTP 200; this code is the only success or
/// failure signal a client sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The operation succeeded.
    Ok,
    /// Invalid creation payload, malformed request, or no eligible message.
    Rejected,
    /// The referenced message id does not exist.
    UnknownMessage,
    /// The update status is outside the recognized set.
    UnknownStatus,
}

impl ErrorCode {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Rejected => 1,
            Self::UnknownMessage => 2,
            Self::UnknownStatus => 3,
        }
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::Rejected),
            2 => Some(Self::UnknownMessage),
            3 => Some(Self::UnknownStatus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "Ok",
            Self::Rejected => "Rejected",
            Self::UnknownMessage => "UnknownMessage",
            Self::UnknownStatus => "UnknownStatus",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.as_u8())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Self::from_u8(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown error code {}", code)))
    }
}

/// Bare failure body, `{"error": n}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub error: ErrorCode,
}

impl WireError {
    pub fn new(error: ErrorCode) -> Self {
        Self { error }
    }

    /// Format as the JSON body sent to clients
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"error":{}}}"#, self.error.as_u8()))
    }
}

impl From<ErrorCode> for WireError {
    fn from(error: ErrorCode) -> Self {
        Self::new(error)
    }
}
