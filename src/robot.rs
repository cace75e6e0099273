//! Chat-style command dispatcher
//!
//! Turns incoming messages into calls on the article and bookmark
//! memories. The robot is transport-agnostic: a message is just text and
//! the time it was sent, and a response is plain text.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReadlogError, Result};
use crate::links::extract_first_link;
use crate::persistence::{self, Dumper};
use crate::publisher::{MarkdownPublisher, Publisher};
use crate::storage::{StorageStats, TimeIndexedStore};
use crate::temporal::Span;

const DEFAULT_DAYS: i64 = 7;
const MAX_DAYS: i64 = 365 * 100;
const DATE_FORMAT: &str = "%Y-%m-%d";
const STATS_SEPARATOR: &str = "\n-------------------------------\n\n";

/// Robot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Where memories are dumped and restored from
    pub dump_path: PathBuf,
    /// How often memories are dumped
    pub dump_interval: Duration,
    /// Directory for published reading notes
    pub publish_dir: PathBuf,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            dump_path: PathBuf::from("./.dump"),
            dump_interval: Duration::from_secs(30),
            publish_dir: PathBuf::from("./notes"),
        }
    }
}

/// Commands understood by the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Idle,
    Read,
    Stats,
    Bookmark,
    Random,
    Publish,
    Memory,
}

impl FromStr for Command {
    type Err = ReadlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "idle" | "start" | "help" => Ok(Self::Idle),
            "read" => Ok(Self::Read),
            "stats" => Ok(Self::Stats),
            "bookmark" => Ok(Self::Bookmark),
            "random" => Ok(Self::Random),
            "publish" => Ok(Self::Publish),
            "memory" => Ok(Self::Memory),
            other => Err(ReadlogError::InvalidCommand(other.to_string())),
        }
    }
}

/// An incoming message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Message {
    pub fn new(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            at,
        }
    }

    /// Split `/command@bot arguments` into command name and arguments
    pub fn command(&self) -> Option<(&str, &str)> {
        let text = self.text.trim_start();
        let rest = text.strip_prefix('/')?;

        let (head, args) = match rest.find(char::is_whitespace) {
            Some(i) => (&rest[..i], rest[i..].trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head);

        if name.is_empty() {
            None
        } else {
            Some((name, args))
        }
    }
}

/// Dispatches messages to the article and bookmark memories
pub struct Robot {
    config: RobotConfig,
    articles: Arc<TimeIndexedStore>,
    bookmarks: Arc<TimeIndexedStore>,
    publisher: Arc<dyn Publisher>,
    current: Command,
    argument: String,
    dumper: Option<Dumper>,
}

impl Robot {
    /// Create a robot publishing markdown notes into the configured directory
    pub fn new(config: RobotConfig) -> Self {
        let publisher = Arc::new(MarkdownPublisher::new(config.publish_dir.clone()));
        Self::with_publisher(config, publisher)
    }

    /// Create a robot with a custom publisher
    pub fn with_publisher(config: RobotConfig, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            config,
            articles: Arc::new(TimeIndexedStore::new()),
            bookmarks: Arc::new(TimeIndexedStore::new()),
            publisher,
            current: Command::Idle,
            argument: String::new(),
            dumper: None,
        }
    }

    pub fn articles(&self) -> &Arc<TimeIndexedStore> {
        &self.articles
    }

    pub fn bookmarks(&self) -> &Arc<TimeIndexedStore> {
        &self.bookmarks
    }

    pub fn current_command(&self) -> Command {
        self.current
    }

    /// Restore memories from the dump file and start periodic dumping
    ///
    /// A missing or unreadable dump is logged and the robot starts empty.
    pub async fn start(&mut self) -> Result<()> {
        self.set_idle();

        match persistence::restore(&self.config.dump_path, &self.articles, &self.bookmarks).await
        {
            Ok(report) => tracing::info!(
                articles = report.articles,
                bookmarks = report.bookmarks,
                "memories restored"
            ),
            Err(e) => tracing::warn!(
                path = %self.config.dump_path.display(),
                error = %e,
                "restore failed, starting with empty memories"
            ),
        }

        if self.dumper.is_none() {
            self.dumper = Some(Dumper::spawn(
                self.config.dump_path.clone(),
                self.config.dump_interval,
                self.articles.clone(),
                self.bookmarks.clone(),
            ));
        }

        Ok(())
    }

    /// Stop periodic dumping after a final dump
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(dumper) = self.dumper.take() {
            dumper.stop().await?;
        }
        Ok(())
    }

    pub fn set_command(&mut self, command: Command, argument: impl Into<String>) {
        self.current = command;
        self.argument = argument.into();
    }

    pub fn set_idle(&mut self) {
        self.set_command(Command::Idle, "");
    }

    /// Respond to one incoming message
    pub async fn respond(&mut self, message: &Message) -> String {
        if let Some((name, args)) = message.command() {
            match name.parse::<Command>() {
                Ok(command) => self.set_command(command, args),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring unknown command");
                    self.set_idle();
                }
            }
        } else if self.current != Command::Idle && self.argument.is_empty() {
            // A pending command takes the plain message as its argument.
            self.argument = message.text.trim().to_string();
        }

        match self.current {
            Command::Idle => self.respond_idle(),
            Command::Read => self.respond_remember(message, Command::Read),
            Command::Bookmark => self.respond_remember(message, Command::Bookmark),
            Command::Stats => self.respond_stats(message),
            Command::Random => self.respond_random(),
            Command::Publish => self.respond_publish(message).await,
            Command::Memory => self.respond_memory(),
        }
    }

    fn respond_idle(&mut self) -> String {
        "What can I do for you?".to_string()
    }

    fn respond_remember(&mut self, message: &Message, command: Command) -> String {
        if self.argument.is_empty() {
            return "Send me the link.".to_string();
        }

        let argument = std::mem::take(&mut self.argument);
        self.set_idle();

        let Some(link) = extract_first_link(&argument) else {
            return "Oops, can't find any links.".to_string();
        };

        if command == Command::Bookmark {
            self.bookmarks.remember(message.at, link, argument.as_str());
            format!("Roger that! New link {} added.", link)
        } else {
            self.articles.remember(message.at, link, argument.as_str());
            format!("Copy that! New link {} added.", link)
        }
    }

    fn respond_stats(&mut self, message: &Message) -> String {
        let span = Span::last_days(message.at, parse_days(&self.argument));
        self.set_idle();

        let things = self.articles.get_in_period(&span);
        format!(
            "You read {} article(s) during {} ~ {}:\n\n{}",
            things.len(),
            span.start().format(DATE_FORMAT),
            span.end().format(DATE_FORMAT),
            things.join(STATS_SEPARATOR),
        )
    }

    fn respond_random(&mut self) -> String {
        self.set_idle();

        let picked = self.bookmarks.each(|_, key, link| {
            std::ops::ControlFlow::Break((key.to_string(), link.to_string()))
        });

        match picked {
            Some((key, link)) => {
                self.bookmarks.forget(&key);
                link
            }
            None => "No more bookmarks, nice!".to_string(),
        }
    }

    async fn respond_publish(&mut self, message: &Message) -> String {
        let span = Span::last_days(message.at, parse_days(&self.argument));
        self.set_idle();

        let things = self.articles.get_in_period(&span);
        match self.publisher.publish(&span, &things).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "publish failed");
                e.to_string()
            }
        }
    }

    fn respond_memory(&mut self) -> String {
        self.set_idle();
        format!(
            "Articles: {}\nBookmarks: {}",
            describe(&self.articles.stats()),
            describe(&self.bookmarks.stats()),
        )
    }
}

/// Leading day count of a command argument, defaulting to a week and
/// capped at a century
fn parse_days(argument: &str) -> i64 {
    argument
        .split_whitespace()
        .next()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|days| *days > 0)
        .map(|days| days.min(MAX_DAYS))
        .unwrap_or(DEFAULT_DAYS)
}

fn describe(stats: &StorageStats) -> String {
    match (stats.oldest, stats.newest) {
        (Some(oldest), Some(newest)) => format!(
            "{} ({} ~ {})",
            stats.records,
            oldest.format(DATE_FORMAT),
            newest.format(DATE_FORMAT)
        ),
        _ => stats.records.to_string(),
    }
}
