//! Rewrites stored `created_at` values as `dd-mm-yyyy` day strings.

use crate::document_store::{
    DocumentStore, FieldUpdate, RecordCursor, RecordFilter, UpdateOutcome,
};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, info, warn};

pub const DAY_FORMAT: &str = "%d-%m-%Y";

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateReformatReport {
    pub scanned: usize,
    pub updated: usize,
    /// Already `dd-mm-yyyy`, or no `created_at` at all.
    pub unchanged: usize,
    /// `created_at` present but not a date we recognise; left as is.
    pub unparseable: usize,
    pub failed: usize,
}

/// The `dd-mm-yyyy` form of a stored timestamp, or `None` if `value` is not a
/// recognised date. Values already in day format come back unchanged.
pub fn reformat_created_at(value: &str) -> Option<String> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, DAY_FORMAT) {
        return Some(day.format(DAY_FORMAT).to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc().format(DAY_FORMAT).to_string());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.format(DAY_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|day| day.format(DAY_FORMAT).to_string())
}

/// Walks the whole collection and rewrites every recognised `created_at`.
/// Per-record write errors are counted and do not stop the walk.
pub fn reformat_dates(store: &dyn DocumentStore, page_size: usize) -> Result<DateReformatReport> {
    let mut report = DateReformatReport::default();

    for next in RecordCursor::new(store, RecordFilter::All, page_size) {
        let record = next?;
        report.scanned += 1;

        let current = match record.fields.get("created_at") {
            None | Some(Value::Null) => {
                report.unchanged += 1;
                continue;
            }
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                debug!("Record {} has non-string created_at {}", record.id, other);
                report.unparseable += 1;
                continue;
            }
        };

        let Some(day) = reformat_created_at(current) else {
            debug!("Record {} has unrecognised created_at '{}'", record.id, current);
            report.unparseable += 1;
            continue;
        };
        if day == current {
            report.unchanged += 1;
            continue;
        }

        let update = FieldUpdate::new().set("created_at", Value::String(day));
        match store.update_fields(&record.id, &update) {
            Ok(UpdateOutcome::Updated) => report.updated += 1,
            Ok(UpdateOutcome::NotFound) => report.unchanged += 1,
            Err(e) => {
                warn!("Failed to rewrite created_at of {}: {:#}", record.id, e);
                report.failed += 1;
            }
        }
    }

    info!(
        "Reformatted created_at on {} of {} records ({} unparseable, {} failed)",
        report.updated, report.scanned, report.unparseable, report.failed
    );
    Ok(report)
}
