//! Temporal support for range queries
//!
//! Provides the [`Span`] interval used by period queries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A closed time interval `[start, end]`
///
/// Built from a start instant and a signed duration; a negative
/// duration reaches backwards, so `Span::new(now, -Duration::days(7))`
/// covers the last week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Span {
    /// Create a span starting at `start` and lasting `duration`
    ///
    /// Saturates at the representable range instead of overflowing.
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        let other = start.checked_add_signed(duration).unwrap_or(if duration < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
        if other < start {
            Self { start: other, end: start }
        } else {
            Self { start, end: other }
        }
    }

    /// Create the span between two instants, in either order
    pub fn between(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        Self::new(a, b - a)
    }

    /// The `days` days leading up to `now`
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        match Duration::try_days(days) {
            Some(back) => Self::new(now, -back),
            None if days < 0 => Self::between(now, DateTime::<Utc>::MAX_UTC),
            None => Self::between(DateTime::<Utc>::MIN_UTC, now),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Containment predicate: both edges are inclusive
    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        self.start <= *t && *t <= self.end
    }
}
