//! # readlog
//!
//! A time-indexed memory for reading notes and bookmarks.
//!
//! ## Features
//!
//! - **Time-Indexed Store**: point lookup by key, range queries by time,
//!   deletion, and traversal with early stop, safe under concurrent access
//! - **Dump/Restore**: periodic JSON dumps of every memory, restored at startup
//! - **Command Dispatcher**: chat-style `/read`, `/bookmark`, `/stats`,
//!   `/random` and `/publish` commands over the memories
//! - **Publishing**: reading notes for a period, written as markdown
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌──────────────────────┐
//! │   Transport     │    │      Robot       │    │  TimeIndexedStore    │
//! │                 │    │                  │    │                      │
//! │ • stdio lines   │◄──►│ • Commands       │◄──►│ • Key → record map   │
//! │                 │    │ • Link extract   │    │ • Ordered time index │
//! │                 │    │ • Publisher      │    │ • One RwLock         │
//! └─────────────────┘    └──────────────────┘    └──────────────────────┘
//!                                 │
//!                                 ▼
//!                        ┌──────────────────┐
//!                        │  Dumper (tokio)  │
//!                        │ • JSON dump file │
//!                        └──────────────────┘
//! ```

pub mod error;
pub mod links;
pub mod persistence;
pub mod publisher;
pub mod record;
pub mod robot;
pub mod storage;
pub mod temporal;

pub use error::{ReadlogError, Result};
pub use publisher::{MarkdownPublisher, Publisher};
pub use record::{Record, RecordRef};
pub use robot::{Command, Message, Robot, RobotConfig};
pub use storage::{RecordsView, StorageStats, TimeIndexedStore};
pub use temporal::Span;
