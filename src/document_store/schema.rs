//! SQLite schema definitions for the document store.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

/// JSON documents, grouped by collection. `body` holds the fields object.
const DOCUMENTS_TABLE: Table = Table {
    name: "documents",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("collection", &SqlType::Text, non_null = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("body", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_documents_collection", "collection")],
    unique_constraints: &[&["collection", "id"]],
};

/// One row per enrichment pipeline run.
const PIPELINE_RUNS_TABLE: Table = Table {
    name: "pipeline_runs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("collection", &SqlType::Text, non_null = true),
        sqlite_column!("mode", &SqlType::Text, non_null = true),
        sqlite_column!("policy", &SqlType::Text, non_null = true),
        sqlite_column!("fetched", &SqlType::Integer, non_null = true),
        sqlite_column!("updated", &SqlType::Integer, non_null = true),
        sqlite_column!("skipped", &SqlType::Integer, non_null = true),
        sqlite_column!("failed", &SqlType::Integer, non_null = true),
        sqlite_column!("vanished", &SqlType::Integer, non_null = true),
        sqlite_column!("translation_fallbacks", &SqlType::Integer, non_null = true),
        sqlite_column!("started_at", &SqlType::Integer, non_null = true),
        sqlite_column!("finished_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_pipeline_runs_collection", "collection")],
    unique_constraints: &[],
};

pub const DOCUMENT_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[DOCUMENTS_TABLE, PIPELINE_RUNS_TABLE],
    migration: None,
}];
