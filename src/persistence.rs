//! Dump and restore of the article and bookmark memories
//!
//! The dump file is a JSON object with one array per memory:
//!
//! ```json
//! {"articles": [{"at": "2015-02-01T00:00:00Z", "key": "...", "thing": "..."}],
//!  "bookmarks": []}
//! ```
//!
//! A dump is produced by traversing each store and written atomically
//! (temp file, then rename). Restoring replays `remember` once per entry;
//! an entry that cannot be read is skipped without aborting the restore.

use std::ffi::OsString;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{ReadlogError, Result};
use crate::storage::TimeIndexedStore;

const ARTICLES: &str = "articles";
const BOOKMARKS: &str = "bookmarks";

/// One record as it appears in the dump file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpEntry {
    /// RFC 3339 timestamp
    pub at: String,
    pub key: String,
    pub thing: String,
}

impl DumpEntry {
    fn new(at: &DateTime<Utc>, key: &str, thing: &str) -> Self {
        Self {
            at: at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            key: key.to_string(),
            thing: thing.to_string(),
        }
    }

    fn parse_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.at)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

#[derive(Debug, Serialize)]
struct DumpFile {
    articles: Vec<DumpEntry>,
    bookmarks: Vec<DumpEntry>,
}

/// Outcome of a restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Articles remembered
    pub articles: usize,
    /// Bookmarks remembered
    pub bookmarks: usize,
    /// Entries skipped because they could not be read
    pub skipped: usize,
}

/// Collect every record of `store` as dump entries
pub fn collect_entries(store: &TimeIndexedStore) -> Vec<DumpEntry> {
    let mut entries = Vec::with_capacity(store.len());
    let _: Option<()> = store.each(|at, key, thing| {
        entries.push(DumpEntry::new(at, key, thing));
        ControlFlow::Continue(())
    });
    entries
}

/// Replay dump entries into `store`, returning (restored, skipped)
pub fn restore_entries(entries: &[Value], store: &TimeIndexedStore) -> (usize, usize) {
    let mut restored = 0;
    let mut skipped = 0;

    for raw in entries {
        let entry: DumpEntry = match serde_json::from_value(raw.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "corrupted dump entry, skipping");
                skipped += 1;
                continue;
            }
        };

        match entry.parse_at() {
            Some(at) => {
                store.remember(at, entry.key, entry.thing);
                restored += 1;
            }
            None => {
                tracing::warn!(at = %entry.at, "corrupted dump entry timestamp, skipping");
                skipped += 1;
            }
        }
    }

    (restored, skipped)
}

/// Write both memories to `path`
pub async fn dump(
    path: &Path,
    articles: &TimeIndexedStore,
    bookmarks: &TimeIndexedStore,
) -> Result<()> {
    let file = DumpFile {
        articles: collect_entries(articles),
        bookmarks: collect_entries(bookmarks),
    };
    let data = serde_json::to_vec(&file)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await?;

    tracing::info!(
        path = %path.display(),
        articles = file.articles.len(),
        bookmarks = file.bookmarks.len(),
        "dump finished"
    );
    Ok(())
}

/// Restore both memories from `path`
///
/// Fails as a whole when the file cannot be read or decoded, or lacks one
/// of the two collections. Individual unreadable entries are skipped.
pub async fn restore(
    path: &Path,
    articles: &TimeIndexedStore,
    bookmarks: &TimeIndexedStore,
) -> Result<RestoreReport> {
    let data = tokio::fs::read(path).await?;
    let document: Map<String, Value> = serde_json::from_slice(&data)?;

    let article_entries = collection(&document, ARTICLES)?;
    let bookmark_entries = collection(&document, BOOKMARKS)?;

    let (restored_articles, skipped_articles) = restore_entries(article_entries, articles);
    let (restored_bookmarks, skipped_bookmarks) = restore_entries(bookmark_entries, bookmarks);

    let report = RestoreReport {
        articles: restored_articles,
        bookmarks: restored_bookmarks,
        skipped: skipped_articles + skipped_bookmarks,
    };

    tracing::info!(
        path = %path.display(),
        articles = report.articles,
        bookmarks = report.bookmarks,
        skipped = report.skipped,
        "restore finished"
    );
    Ok(report)
}

/// A present-but-null collection counts as empty; a missing one is corruption.
fn collection<'a>(document: &'a Map<String, Value>, name: &str) -> Result<&'a [Value]> {
    match document.get(name) {
        Some(Value::Array(entries)) => Ok(entries.as_slice()),
        Some(Value::Null) => Ok(&[][..]),
        Some(_) => Err(ReadlogError::CorruptedDump(format!(
            "`{}` is not an array",
            name
        ))),
        None => Err(ReadlogError::CorruptedDump(format!("missing `{}`", name))),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Background task that dumps the memories on a fixed interval
pub struct Dumper {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Dumper {
    /// Spawn the dump loop on the current tokio runtime
    pub fn spawn(
        path: PathBuf,
        every: Duration,
        articles: Arc<TimeIndexedStore>,
        bookmarks: Arc<TimeIndexedStore>,
    ) -> Self {
        let (shutdown, mut stop) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => {
                        if let Err(e) = dump(&path, &articles, &bookmarks).await {
                            tracing::error!(error = %e, "dump failed");
                        }
                    }
                }
            }

            if let Err(e) = dump(&path, &articles, &bookmarks).await {
                tracing::error!(error = %e, "final dump failed");
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the loop and wait for the final dump
    pub async fn stop(self) -> Result<()> {
        // The task may already be gone; joining below reports why.
        let _ = self.shutdown.send(());
        self.handle.await?;
        Ok(())
    }
}
