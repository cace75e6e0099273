//! Time-indexed in-memory storage
//!
//! The store keeps two structures behind a single reader/writer lock:
//! 1. A primary map from key to record for point lookups and overwrites
//! 2. An ordered period index for range-by-time queries
//!
//! Every key in the map has exactly one entry in the period index and
//! vice versa. Mutations update both under the write lock, so readers
//! never observe one structure ahead of the other.

use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordRef};
use crate::temporal::Span;

/// Position in the period index: timestamp, then insertion sequence so
/// that records sharing a timestamp keep the order they were remembered in.
type PeriodKey = (DateTime<Utc>, u64);

#[derive(Debug)]
struct Thing {
    at: DateTime<Utc>,
    seq: u64,
    payload: String,
}

impl Thing {
    fn period_key(&self) -> PeriodKey {
        (self.at, self.seq)
    }
}

#[derive(Debug, Default)]
struct Memory {
    things: HashMap<String, Thing>,
    period_index: BTreeMap<PeriodKey, String>,
    next_seq: u64,
}

/// Concurrent, time-indexed key/value memory
#[derive(Debug, Default)]
pub struct TimeIndexedStore {
    memory: RwLock<Memory>,
}

impl TimeIndexedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `key`
    ///
    /// An overwrite replaces both payload and timestamp, and the stale
    /// index entry is dropped in the same critical section.
    pub fn remember(&self, at: DateTime<Utc>, key: impl Into<String>, payload: impl Into<String>) {
        let key = key.into();
        let mut memory = self.memory.write();

        let seq = memory.next_seq;
        memory.next_seq += 1;

        let thing = Thing {
            at,
            seq,
            payload: payload.into(),
        };
        memory.period_index.insert(thing.period_key(), key.clone());

        if let Some(stale) = memory.things.insert(key.clone(), thing) {
            memory.period_index.remove(&stale.period_key());
            tracing::debug!(key = %key, "overwrote remembered thing");
        } else {
            tracing::debug!(key = %key, "remembered new thing");
        }
    }

    /// Look up the payload for `key`
    pub fn get(&self, key: &str) -> Option<String> {
        self.memory
            .read()
            .things
            .get(key)
            .map(|thing| thing.payload.clone())
    }

    /// Payloads of every record contained in `period`, oldest first
    pub fn get_in_period(&self, period: &Span) -> Vec<String> {
        let memory = self.memory.read();

        // Seek to the first entry at or after the span start, then scan
        // until the first entry the span no longer contains.
        memory
            .period_index
            .range((period.start(), 0u64)..)
            .take_while(|((at, _), _)| period.contains(at))
            .filter_map(|(_, key)| memory.things.get(key))
            .map(|thing| thing.payload.clone())
            .collect()
    }

    /// Remove the record for `key`, returning whether it existed
    pub fn forget(&self, key: &str) -> bool {
        let mut memory = self.memory.write();

        match memory.things.remove(key) {
            Some(thing) => {
                memory.period_index.remove(&thing.period_key());
                tracing::debug!(key = %key, "forgot thing");
                true
            }
            None => false,
        }
    }

    /// Visit every record until the visitor breaks
    ///
    /// Order is unspecified. The first `ControlFlow::Break` stops the
    /// traversal and its value is returned. The visitor runs under the read
    /// lock and must not call `remember` or `forget` on the same store.
    pub fn each<B, F>(&self, mut visit: F) -> Option<B>
    where
        F: FnMut(&DateTime<Utc>, &str, &str) -> ControlFlow<B>,
    {
        let view = self.records();
        for record in view.iter() {
            if let ControlFlow::Break(signal) = visit(record.at, record.key, record.payload) {
                return Some(signal);
            }
        }
        None
    }

    /// Read-locked view over all records
    ///
    /// Writers are blocked until the view is dropped.
    pub fn records(&self) -> RecordsView<'_> {
        RecordsView {
            memory: self.memory.read(),
        }
    }

    /// Owned copy of every record, oldest first
    pub fn snapshot(&self) -> Vec<Record> {
        self.records()
            .iter_by_time()
            .map(|record| record.to_record())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.memory.read().things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get storage statistics
    pub fn stats(&self) -> StorageStats {
        let memory = self.memory.read();
        StorageStats {
            records: memory.things.len(),
            oldest: memory.period_index.keys().next().map(|(at, _)| *at),
            newest: memory.period_index.keys().next_back().map(|(at, _)| *at),
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let memory = self.memory.read();
        assert_eq!(memory.things.len(), memory.period_index.len());
        for (period_key, key) in &memory.period_index {
            let thing = memory.things.get(key).expect("index entry without record");
            assert_eq!(thing.period_key(), *period_key);
        }
    }
}

/// Read-guarded view over the records of a [`TimeIndexedStore`]
pub struct RecordsView<'a> {
    memory: RwLockReadGuard<'a, Memory>,
}

impl RecordsView<'_> {
    /// Iterate records in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = RecordRef<'_>> {
        self.memory.things.iter().map(|(key, thing)| RecordRef {
            at: &thing.at,
            key,
            payload: &thing.payload,
        })
    }

    /// Iterate records oldest first
    pub fn iter_by_time(&self) -> impl Iterator<Item = RecordRef<'_>> {
        self.memory
            .period_index
            .values()
            .filter_map(|key| self.memory.things.get_key_value(key))
            .map(|(key, thing)| RecordRef {
                at: &thing.at,
                key,
                payload: &thing.payload,
            })
    }

    pub fn len(&self) -> usize {
        self.memory.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.things.is_empty()
    }
}

/// Storage statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Number of remembered records
    pub records: usize,
    /// Timestamp of the oldest record
    pub oldest: Option<DateTime<Utc>>,
    /// Timestamp of the newest record
    pub newest: Option<DateTime<Utc>>,
}
