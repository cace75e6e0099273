//! Record data structures
//!
//! A record is the stored unit of the memory: a timestamp, the key that
//! identifies it and an opaque payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remembered thing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// When the thing happened
    pub at: DateTime<Utc>,

    /// External identity of the record
    pub key: String,

    /// Opaque content, never inspected by the store
    pub payload: String,
}

impl Record {
    /// Create a new record
    pub fn new(at: DateTime<Utc>, key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            at,
            key: key.into(),
            payload: payload.into(),
        }
    }
}

/// A borrowed view of a record, yielded while the store is read-locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRef<'a> {
    pub at: &'a DateTime<Utc>,
    pub key: &'a str,
    pub payload: &'a str,
}

impl RecordRef<'_> {
    /// Copy the borrowed record out of the store
    pub fn to_record(&self) -> Record {
        Record::new(*self.at, self.key, self.payload)
    }
}
