//! SQLite-backed document store.

use super::models::{
    FieldUpdate, Record, RecordFilter, RunRecord, StoreStats, StoredRecord, UpdateOutcome,
};
use super::schema::DOCUMENT_VERSIONED_SCHEMAS;
use super::trait_def::{DocumentStore, RunLog};
use crate::pipeline::RunSummary;
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Documents of one collection in a SQLite database file.
///
/// Writes go through a dedicated connection; reads use a second, read-only
/// connection so a long cursor never blocks an update (WAL mode).
pub struct SqliteDocumentStore {
    collection: String,
    read_conn: Mutex<Connection>,
    write_conn: Mutex<Connection>,
}

fn parse_body(id: &str, body: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(body).with_context(|| format!("Malformed JSON body for document {}", id))
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database at `db_path` and bind to `collection`.
    pub fn open<P: AsRef<Path>>(db_path: P, collection: &str) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open document database {:?}", db_path_ref))?;

        migrate_if_needed(&mut write_conn, DOCUMENT_VERSIONED_SCHEMAS, "document")?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on document write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open document database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on document read connection")?;

        let total: usize = read_conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |r| r.get(0),
        )?;
        info!(
            "Document store ready: {} documents in collection '{}'",
            total, collection
        );

        Ok(Self {
            collection: collection.to_string(),
            read_conn: Mutex::new(read_conn),
            write_conn: Mutex::new(write_conn),
        })
    }

    /// Release both connections, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        for (label, conn) in [("read", self.read_conn), ("write", self.write_conn)] {
            let conn = conn
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            conn.close()
                .map_err(|(_, e)| e)
                .with_context(|| format!("Failed to close document {} connection", label))?;
        }
        debug!("Document store for '{}' closed", self.collection);
        Ok(())
    }

    fn insert_with(conn: &Connection, collection: &str, record: &Record) -> Result<()> {
        let body = serde_json::to_string(&record.fields)?;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, record.id, body],
        )
        .with_context(|| format!("Failed to insert document {}", record.id))?;
        Ok(())
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn insert(&self, record: &Record) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        Self::insert_with(&conn, &self.collection, record)
    }

    fn insert_many(&self, records: &[Record]) -> Result<usize> {
        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;
        for record in records {
            Self::insert_with(&tx, &self.collection, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    fn get(&self, id: &str) -> Result<Option<Record>> {
        let conn = self.read_conn.lock().unwrap();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(body) => Ok(Some(Record::new(id, parse_body(id, &body)?))),
            None => Ok(None),
        }
    }

    fn fetch_page(
        &self,
        filter: RecordFilter,
        after_rowid: i64,
        limit: usize,
    ) -> Result<Vec<StoredRecord>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT rowid, id, body FROM documents
             WHERE collection = ?1 AND rowid > ?2 AND {}
             ORDER BY rowid LIMIT ?3",
            filter.sql_clause()
        ))?;
        let rows = stmt
            .query_map(params![self.collection, after_rowid, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(rowid, id, body)| {
                let fields = parse_body(&id, &body)?;
                Ok(StoredRecord {
                    rowid,
                    record: Record::new(id, fields),
                })
            })
            .collect()
    }

    fn update_fields(&self, id: &str, update: &FieldUpdate) -> Result<UpdateOutcome> {
        let mut conn = self.write_conn.lock().unwrap();
        let tx = conn.transaction()?;
        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(body) = body else {
            return Ok(UpdateOutcome::NotFound);
        };

        let mut fields = parse_body(id, &body)?;
        update.apply_to(&mut fields);
        tx.execute(
            "UPDATE documents SET body = ?1, updated_at = cast(strftime('%s','now') as int)
             WHERE collection = ?2 AND id = ?3",
            params![serde_json::to_string(&fields)?, self.collection, id],
        )?;
        tx.commit()?;
        Ok(UpdateOutcome::Updated)
    }

    fn count(&self, filter: RecordFilter) -> Result<usize> {
        let conn = self.read_conn.lock().unwrap();
        let count: usize = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1 AND {}",
                filter.sql_clause()
            ),
            params![self.collection],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn get_stats(&self) -> Result<StoreStats> {
        let total_records = self.count(RecordFilter::All)?;
        let with_text = self.count(RecordFilter::HasText)?;
        let with_sentiment = total_records - self.count(RecordFilter::MissingSentiment)?;

        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT json_extract(body, '$.sentiment.label'), COUNT(*) FROM documents
             WHERE collection = ?1 AND json_type(body, '$.sentiment.label') = 'text'
             GROUP BY 1",
        )?;
        let mut stats = StoreStats {
            total_records,
            with_text,
            with_sentiment,
            ..Default::default()
        };
        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, usize>(1)?))
        })?;
        for row in rows {
            let (label, count) = row?;
            match label.as_str() {
                "positive" => stats.positive = count,
                "negative" => stats.negative = count,
                "neutral" => stats.neutral = count,
                _ => {}
            }
        }
        Ok(stats)
    }
}

impl RunLog for SqliteDocumentStore {
    fn record_run(&self, summary: &RunSummary) -> Result<i64> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO pipeline_runs
             (collection, mode, policy, fetched, updated, skipped, failed, vanished,
              translation_fallbacks, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                self.collection,
                summary.mode.as_str(),
                summary.policy.as_str(),
                summary.fetched,
                summary.updated,
                summary.skipped,
                summary.failed,
                summary.vanished,
                summary.translation_fallbacks,
                summary.started_at,
                summary.finished_at,
            ],
        )
        .context("Failed to record pipeline run")?;
        Ok(conn.last_insert_rowid())
    }

    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT id, collection, mode, policy, fetched, updated, skipped, failed, vanished,
                    translation_fallbacks, started_at, finished_at
             FROM pipeline_runs WHERE collection = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let runs = stmt
            .query_map(params![self.collection, limit as i64], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    collection: row.get(1)?,
                    mode: row.get(2)?,
                    policy: row.get(3)?,
                    fetched: row.get(4)?,
                    updated: row.get(5)?,
                    skipped: row.get(6)?,
                    failed: row.get(7)?,
                    vanished: row.get(8)?,
                    translation_fallbacks: row.get(9)?,
                    started_at: row.get(10)?,
                    finished_at: row.get(11)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}
