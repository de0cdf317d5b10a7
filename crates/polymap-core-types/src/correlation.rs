//! Correlation types for unit-of-work tracking
//!
//! Every persist runs inside one transaction; the id below tags that
//! transaction's tracing span so its start/end events can be matched up.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a single unit of work (one transaction)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitOfWorkId(String);

impl UnitOfWorkId {
    /// Generate a new time-ordered id using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for UnitOfWorkId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UnitOfWorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
