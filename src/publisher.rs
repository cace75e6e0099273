//! Publishing reading notes to an external target

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{ReadlogError, Result};
use crate::temporal::Span;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A destination for reading notes collected over a span
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `articles` read during `span`, returning where the post lives
    async fn publish(&self, span: &Span, articles: &[String]) -> Result<String>;
}

/// Title of a reading note covering `span`
pub fn publication_title(span: &Span) -> String {
    format!(
        "Reading note on {} ~ {}",
        span.start().format(DATE_FORMAT),
        span.end().format(DATE_FORMAT),
    )
}

/// Body of a reading note
pub fn publication_content(articles: &[String]) -> String {
    articles.join("\n\n")
}

/// Publishes reading notes as markdown files in a directory
#[derive(Debug, Clone)]
pub struct MarkdownPublisher {
    dir: PathBuf,
}

impl MarkdownPublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(span: &Span) -> String {
        format!(
            "reading-note-{}-{}.md",
            span.start().format(DATE_FORMAT),
            span.end().format(DATE_FORMAT),
        )
    }
}

#[async_trait]
impl Publisher for MarkdownPublisher {
    async fn publish(&self, span: &Span, articles: &[String]) -> Result<String> {
        if articles.is_empty() {
            return Err(ReadlogError::Publish("nothing to publish".into()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(Self::file_name(span));
        let document = format!(
            "# {}\n\n{}\n",
            publication_title(span),
            publication_content(articles)
        );
        tokio::fs::write(&path, document).await?;

        tracing::info!(path = %path.display(), articles = articles.len(), "published reading note");
        Ok(path.display().to_string())
    }
}
