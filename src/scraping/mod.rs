//! Collecting mentions from outside sources into the document store.

mod csv_import;
mod job;
mod reddit;

pub use csv_import::{import_tweets_csv, ImportReport};
pub use job::{ScrapeJob, ScrapeReport, CREATED_AT_FORMAT};
pub use reddit::{RedditClient, MAX_PAGE_SIZE};

use anyhow::Result;

/// A post as returned by a content feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPost {
    pub body: String,
    pub subreddit: String,
    pub title: String,
    /// Seconds since the Unix epoch, UTC.
    pub created_utc: f64,
    pub score: i64,
}

/// A searchable feed of posts.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait PostSource: Send + Sync {
    /// Up to `limit` posts matching `query`.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<ScrapedPost>>;
}
