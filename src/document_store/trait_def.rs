//! DocumentStore and RunLog trait definitions.

use super::models::{FieldUpdate, Record, RecordFilter, RunRecord, StoreStats, StoredRecord, UpdateOutcome};
use crate::pipeline::RunSummary;
use anyhow::Result;

/// A collection of JSON documents. Every store instance is bound to one collection.
pub trait DocumentStore: Send + Sync {
    /// Name of the collection this store reads and writes.
    fn collection(&self) -> &str;

    /// Insert a new document. Fails if a document with the same id exists.
    fn insert(&self, record: &Record) -> Result<()>;

    /// Insert several documents in one transaction. Returns how many were inserted.
    fn insert_many(&self, records: &[Record]) -> Result<usize>;

    fn get(&self, id: &str) -> Result<Option<Record>>;

    /// Up to `limit` documents matching `filter` with a storage position
    /// strictly greater than `after_rowid`, in storage order.
    fn fetch_page(
        &self,
        filter: RecordFilter,
        after_rowid: i64,
        limit: usize,
    ) -> Result<Vec<StoredRecord>>;

    /// Atomically set top-level fields on one document, leaving the rest untouched.
    fn update_fields(&self, id: &str, update: &FieldUpdate) -> Result<UpdateOutcome>;

    fn count(&self, filter: RecordFilter) -> Result<usize>;

    fn get_stats(&self) -> Result<StoreStats>;
}

/// Audit log of enrichment runs.
pub trait RunLog: Send + Sync {
    /// Persist a finished run, returning its id.
    fn record_run(&self, summary: &RunSummary) -> Result<i64>;

    /// Most recent runs of this collection first.
    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>>;
}
