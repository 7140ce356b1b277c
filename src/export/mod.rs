//! Spreadsheet export of records.
//!
//! One row per record, one column per attribute: `id` first, then every field
//! in the order it is first seen, with the `sentiment` object flattened into
//! `sentiment_label` and `sentiment_score`.

use crate::config::ExportSettings;
use crate::document_store::Record;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use clap::ValueEnum;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Excel's limit on sheet name length.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Excel's limit on the characters in one cell.
pub const MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportMode {
    /// Add a sheet to the configured workbook, keeping the sheets already there.
    #[default]
    AppendSheet,
    /// Write a fresh workbook named `<stem>_<YYYYmmdd_HHMMSS>.xlsx`.
    TimestampedFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub sheet_name: String,
    pub rows: usize,
}

/// Column headers for `records`.
pub fn column_names(records: &[Record]) -> Vec<String> {
    let mut columns = vec!["id".to_string()];
    let mut push = |name: &str| {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    };
    for record in records {
        for key in record.fields.keys() {
            if key == "sentiment" {
                push("sentiment_label");
                push("sentiment_score");
            } else {
                push(key);
            }
        }
    }
    columns
}

fn cell_value<'a>(record: &'a Record, column: &str) -> Option<&'a Value> {
    match column {
        "id" => None,
        "sentiment_label" if !record.fields.contains_key(column) => {
            record.fields.get("sentiment")?.get("label")
        }
        "sentiment_score" if !record.fields.contains_key(column) => {
            record.fields.get("sentiment")?.get("score")
        }
        _ => record.fields.get(column),
    }
}

/// `text` cut to [`MAX_CELL_CHARS`] characters.
fn fit_cell(text: &str, row: u32, col: u16) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            warn!(
                "Cell at row {} column {} has {} characters, truncating to {}",
                row,
                col,
                text.chars().count(),
                MAX_CELL_CHARS
            );
            &text[..cut]
        }
        None => text,
    }
}

fn write_json_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                sheet.write_number(row, col, f)?;
            }
        }
        Value::String(s) => {
            sheet.write_string(row, col, fit_cell(s, row, col))?;
        }
        Value::Array(_) | Value::Object(_) => {
            let json = value.to_string();
            sheet.write_string(row, col, fit_cell(&json, row, col))?;
        }
    }
    Ok(())
}

fn write_records(sheet: &mut Worksheet, records: &[Record]) -> Result<()> {
    let columns = column_names(records);
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string(0, col as u16, name)?;
    }
    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, fit_cell(&record.id, row, 0))?;
        for (col, name) in columns.iter().enumerate().skip(1) {
            if let Some(value) = cell_value(record, name) {
                write_json_cell(sheet, row, col as u16, value)?;
            }
        }
    }
    Ok(())
}

fn copy_cell(sheet: &mut Worksheet, row: u32, col: u16, data: &Data) -> Result<()> {
    match data {
        Data::Empty | Data::Error(_) => {}
        Data::Int(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        Data::Float(f) => {
            sheet.write_number(row, col, *f)?;
        }
        Data::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Data::DateTime(dt) => {
            sheet.write_number(row, col, dt.as_f64())?;
        }
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            sheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}

/// Copies every sheet of the workbook at `path` (cell values only) into `workbook`.
/// Returns the names of the copied sheets.
fn copy_existing_sheets(path: &Path, workbook: &mut Workbook) -> Result<Vec<String>> {
    let mut existing = open_workbook_auto(path)
        .with_context(|| format!("Failed to open existing workbook {:?}", path))?;
    let names = existing.sheet_names();
    for name in &names {
        let range = existing
            .worksheet_range(name)
            .with_context(|| format!("Failed to read sheet '{}' of {:?}", name, path))?;
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        for (row, col, data) in range.cells() {
            copy_cell(
                sheet,
                start_row + row as u32,
                (start_col + col as u32) as u16,
                data,
            )?;
        }
    }
    Ok(names)
}

/// `name`, or `name_2`, `name_3`, ... whichever is not in `taken`, within Excel's length limit.
pub fn unique_sheet_name(name: &str, taken: &[String]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|t| t.eq_ignore_ascii_case(candidate));
    let base: String = name.chars().take(MAX_SHEET_NAME_LEN).collect();
    if !is_taken(&base) {
        return base;
    }
    (2..)
        .map(|n| {
            let suffix = format!("_{}", n);
            let stem: String = name
                .chars()
                .take(MAX_SHEET_NAME_LEN - suffix.len())
                .collect();
            format!("{}{}", stem, suffix)
        })
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}

/// `<dir>/<stem>_<YYYYmmdd_HHMMSS>.xlsx` for the configured `path`.
pub fn timestamped_path(path: &Path, now: NaiveDateTime) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    let file_name = format!("{}_{}.xlsx", stem, now.format("%Y%m%d_%H%M%S"));
    path.with_file_name(file_name)
}

pub fn export_records(records: &[Record], settings: &ExportSettings) -> Result<ExportOutcome> {
    let mut workbook = Workbook::new();

    let (path, taken) = match settings.mode {
        ExportMode::AppendSheet => {
            let taken = if settings.path.exists() {
                copy_existing_sheets(&settings.path, &mut workbook)?
            } else {
                Vec::new()
            };
            (settings.path.clone(), taken)
        }
        ExportMode::TimestampedFile => (
            timestamped_path(&settings.path, chrono::Local::now().naive_local()),
            Vec::new(),
        ),
    };

    let sheet_name = unique_sheet_name(&settings.sheet_name, &taken);
    let sheet = workbook.add_worksheet();
    sheet.set_name(&sheet_name)?;
    write_records(sheet, records)?;

    workbook
        .save(&path)
        .with_context(|| format!("Failed to write workbook {:?}", path))?;

    info!(
        "Exported {} records to {:?} (sheet '{}')",
        records.len(),
        path,
        sheet_name
    );
    Ok(ExportOutcome {
        path,
        sheet_name,
        rows: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(id: &str, fields: Value) -> Record {
        Record::new(id, fields.as_object().unwrap().clone())
    }

    fn sample_records() -> Vec<Record> {
        vec![
            record(
                "a",
                json!({
                    "subreddit": "india",
                    "text": "good",
                    "sentiment": {"score": 0.7, "label": "positive"},
                    "upvotes": 5
                }),
            ),
            record("b", json!({"text": "meh", "hashtags": ["x", "y"]})),
        ]
    }

    fn read_sheet(path: &Path, name: &str) -> Vec<Vec<Data>> {
        let mut workbook = open_workbook_auto(path).unwrap();
        let range = workbook.worksheet_range(name).unwrap();
        range.rows().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn test_column_names_flatten_sentiment() {
        assert_eq!(
            column_names(&sample_records()),
            vec![
                "id",
                "subreddit",
                "text",
                "sentiment_label",
                "sentiment_score",
                "upvotes",
                "hashtags"
            ]
        );
        assert_eq!(column_names(&[]), vec!["id"]);
    }

    #[test]
    fn test_unique_sheet_name() {
        let taken = vec!["Reddit_Reviews_200".to_string(), "reddit_reviews_200_2".to_string()];
        assert_eq!(unique_sheet_name("Fresh", &taken), "Fresh");
        assert_eq!(
            unique_sheet_name("Reddit_Reviews_200", &taken),
            "Reddit_Reviews_200_3"
        );

        let long = "x".repeat(40);
        let taken = vec!["x".repeat(31)];
        let name = unique_sheet_name(&long, &taken);
        assert_eq!(name.chars().count(), 31);
        assert!(name.ends_with("_2"));
    }

    #[test]
    fn test_timestamped_path() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            timestamped_path(Path::new("/out/zomato_reddit_reviews.xlsx"), now),
            PathBuf::from("/out/zomato_reddit_reviews_20250309_140507.xlsx")
        );
    }

    #[test]
    fn test_timestamped_export_writes_new_file() {
        let dir = TempDir::new().unwrap();
        let settings = ExportSettings {
            path: dir.path().join("reviews.xlsx"),
            mode: ExportMode::TimestampedFile,
            sheet_name: "Reddit_Reviews_200".to_string(),
        };

        let outcome = export_records(&sample_records(), &settings).unwrap();

        assert!(outcome.path.exists());
        assert!(!settings.path.exists());
        let file_name = outcome.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.starts_with("reviews_"));
        assert_eq!(file_name.len(), "reviews_YYYYmmdd_HHMMSS.xlsx".len());

        let rows = read_sheet(&outcome.path, "Reddit_Reviews_200");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Data::String("id".to_string()));
        assert_eq!(rows[1][0], Data::String("a".to_string()));
        assert_eq!(rows[1][3], Data::String("positive".to_string()));
        assert_eq!(rows[1][4], Data::Float(0.7));
        assert_eq!(rows[1][5], Data::Float(5.0));
        assert_eq!(rows[2][6], Data::String("[\"x\",\"y\"]".to_string()));
        assert_eq!(rows[2][3], Data::Empty);
    }

    #[test]
    fn test_append_preserves_existing_sheets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reviews.xlsx");

        let mut existing = Workbook::new();
        let sheet = existing.add_worksheet();
        sheet.set_name("Reddit_Reviews_200").unwrap();
        sheet.write_string(0, 0, "earlier run").unwrap();
        sheet.write_number(1, 2, 42.0).unwrap();
        existing.save(&path).unwrap();

        let settings = ExportSettings {
            path: path.clone(),
            mode: ExportMode::AppendSheet,
            sheet_name: "Reddit_Reviews_200".to_string(),
        };
        let outcome = export_records(&sample_records(), &settings).unwrap();

        assert_eq!(outcome.path, path);
        assert_eq!(outcome.sheet_name, "Reddit_Reviews_200_2");
        assert_eq!(outcome.rows, 2);

        let workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Reddit_Reviews_200", "Reddit_Reviews_200_2"]
        );

        let old = read_sheet(&path, "Reddit_Reviews_200");
        assert_eq!(old[0][0], Data::String("earlier run".to_string()));
        assert_eq!(old[1][2], Data::Float(42.0));

        let new = read_sheet(&path, "Reddit_Reviews_200_2");
        assert_eq!(new.len(), 3);
    }

    #[test]
    fn test_long_text_is_truncated_to_cell_limit() {
        let dir = TempDir::new().unwrap();
        let settings = ExportSettings {
            path: dir.path().join("long.xlsx"),
            mode: ExportMode::AppendSheet,
            sheet_name: "Reddit_Reviews_200".to_string(),
        };
        // Reddit self posts can run to 40,000 characters.
        let body = "é".repeat(40_000);
        let records = vec![
            record("long", json!({"text": body, "upvotes": 1})),
            record("short", json!({"text": "fine"})),
        ];

        let outcome = export_records(&records, &settings).unwrap();
        assert_eq!(outcome.rows, 2);

        let rows = read_sheet(&settings.path, "Reddit_Reviews_200");
        match &rows[1][1] {
            Data::String(s) => {
                assert_eq!(s.chars().count(), MAX_CELL_CHARS);
                assert!(s.chars().all(|c| c == 'é'));
            }
            other => panic!("expected a string cell, got {:?}", other),
        }
        assert_eq!(rows[1][2], Data::Float(1.0));
        assert_eq!(rows[2][1], Data::String("fine".to_string()));
    }

    #[test]
    fn test_fit_cell_keeps_short_text() {
        assert_eq!(fit_cell("fine", 1, 1), "fine");
        let exact = "a".repeat(MAX_CELL_CHARS);
        assert_eq!(fit_cell(&exact, 1, 1).len(), MAX_CELL_CHARS);
    }

    #[test]
    fn test_append_creates_missing_workbook() {
        let dir = TempDir::new().unwrap();
        let settings = ExportSettings {
            path: dir.path().join("fresh.xlsx"),
            mode: ExportMode::AppendSheet,
            sheet_name: "Mentions".to_string(),
        };

        let outcome = export_records(&sample_records(), &settings).unwrap();
        assert_eq!(outcome.sheet_name, "Mentions");
        assert!(settings.path.exists());
    }
}
