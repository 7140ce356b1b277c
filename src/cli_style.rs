use crate::document_store::{Record, RunRecord, StoreStats};
use crate::pipeline::RunSummary;
use crate::sentiment::SentimentLabel;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
    let ok = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let bad = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Red)));

    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(ok)
        .valid(ok)
        .invalid(bad)
        .error(bad)
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

pub mod colors {
    use crossterm::style::Color;

    pub const CYAN: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 255,
    };
    pub const PURPLE: Color = Color::Rgb {
        r: 180,
        g: 100,
        b: 255,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 136,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 165,
        b: 0,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

pub mod box_chars {
    pub const SINGLE_HORIZONTAL: &str = "─";
    pub const SINGLE_VERTICAL: &str = "│";

    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";

    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";

    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        box_chars::CHECK.with(colors::GREEN).bold(),
        message.with(colors::GREEN)
    );
}

pub fn print_error(message: &str) {
    eprintln!(
        " {} {}",
        box_chars::CROSS_MARK.with(colors::RED).bold(),
        message.with(colors::RED)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        "⚠".with(colors::ORANGE).bold(),
        message.with(colors::ORANGE)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Section Headers
// ═══════════════════════════════════════════════════════════════════════════════

const SECTION_WIDTH: usize = 60;

pub fn print_section_header(title: &str) {
    let title_len = title.width();
    let padding = SECTION_WIDTH.saturating_sub(title_len + 4) / 2;
    let rest = SECTION_WIDTH.saturating_sub(title_len + 4 + padding);

    println!();
    println!(
        "{}{} {} {}{}",
        box_chars::ROUND_TOP_LEFT.with(colors::CYAN),
        box_chars::SINGLE_HORIZONTAL.repeat(padding).with(colors::CYAN),
        title.with(colors::CYAN).bold().attribute(Attribute::Italic),
        box_chars::SINGLE_HORIZONTAL.repeat(rest).with(colors::CYAN),
        box_chars::ROUND_TOP_RIGHT.with(colors::CYAN)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        box_chars::ROUND_BOTTOM_LEFT.with(colors::CYAN),
        box_chars::SINGLE_HORIZONTAL
            .repeat(SECTION_WIDTH)
            .with(colors::CYAN),
        box_chars::ROUND_BOTTOM_RIGHT.with(colors::CYAN)
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::PURPLE),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

pub fn print_label_count(label: SentimentLabel, count: usize) {
    let color = match label {
        SentimentLabel::Positive => colors::GREEN,
        SentimentLabel::Negative => colors::RED,
        SentimentLabel::Neutral => colors::WHITE,
    };
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(color),
        format!("{}:", label.as_str()).with(colors::DIM),
        count.to_string().with(color).bold()
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Domain Views
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_run_summary(summary: &RunSummary) {
    print_section_header("Enrichment Run");
    print_key_value("Mode", summary.mode.as_str());
    print_key_value("Policy", summary.policy.as_str());
    print_key_value("Fetched", &summary.fetched.to_string());
    print_key_value("Updated", &summary.updated.to_string());
    print_key_value("Skipped", &summary.skipped.to_string());
    print_key_value("Failed", &summary.failed.to_string());
    print_key_value("Vanished", &summary.vanished.to_string());
    print_key_value(
        "Translation fallbacks",
        &summary.translation_fallbacks.to_string(),
    );
    print_key_value("Duration", &format!("{}s", summary.duration_secs()));
    print_section_footer();
}

pub fn print_store_stats(collection: &str, stats: &StoreStats) {
    print_section_header(&format!("Collection '{}'", collection));
    print_key_value("Records", &stats.total_records.to_string());
    print_key_value("With text", &stats.with_text.to_string());
    print_key_value("With sentiment", &stats.with_sentiment.to_string());
    print_label_count(SentimentLabel::Positive, stats.positive);
    print_label_count(SentimentLabel::Negative, stats.negative);
    print_label_count(SentimentLabel::Neutral, stats.neutral);
    print_section_footer();
}

/// Unix seconds as `YYYY-mm-dd HH:MM:SS` UTC.
pub fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn run_history_table(runs: &[RunRecord]) -> TableBuilder {
    let mut table = TableBuilder::new(vec![
        "#", "Started", "Mode", "Policy", "Fetched", "Updated", "Skipped", "Failed",
    ]);
    for run in runs {
        table.add_row(vec![
            run.id.to_string(),
            format_timestamp(run.started_at),
            run.mode.clone(),
            run.policy.clone(),
            run.fetched.to_string(),
            run.updated.to_string(),
            run.skipped.to_string(),
            run.failed.to_string(),
        ]);
    }
    table
}

const TEXT_PREVIEW_GRAPHEMES: usize = 48;

/// First graphemes of `text` on one line, with an ellipsis when cut.
pub fn text_preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut graphemes = flat.graphemes(true);
    let mut preview: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        preview.push('…');
    }
    preview
}

pub fn record_list_table(records: &[Record]) -> TableBuilder {
    let mut table = TableBuilder::new(vec!["ID", "Created", "Label", "Score", "Text"]);
    for record in records {
        let sentiment = record.sentiment();
        let text = match record.fields.get("text") {
            Some(Value::String(s)) => text_preview(s, TEXT_PREVIEW_GRAPHEMES),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        table.add_row(vec![
            record.id.clone(),
            record
                .fields
                .get("created_at")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            sentiment
                .map(|s| s.label.as_str().to_string())
                .unwrap_or_default(),
            sentiment
                .map(|s| format!("{:.3}", s.score))
                .unwrap_or_default(),
            text,
        ]);
    }
    table
}

// ═══════════════════════════════════════════════════════════════════════════════
// Table Display
// ═══════════════════════════════════════════════════════════════════════════════

pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: Vec<&str>) -> Self {
        let col_widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
        TableBuilder {
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
            col_widths,
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(cell.width());
            }
        }
        self.rows.push(row);
    }

    pub fn col_widths(&self) -> &[usize] {
        &self.col_widths
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn border(&self, left: &str, junction: &str, right: &str) -> String {
        let inner = self
            .col_widths
            .iter()
            .map(|w| box_chars::SINGLE_HORIZONTAL.repeat(w + 2))
            .collect::<Vec<_>>()
            .join(junction);
        format!("{}{}{}", left, inner, right)
            .with(colors::CYAN)
            .to_string()
    }

    fn line(&self, cells: &[String], header: bool) -> String {
        let mut out = box_chars::SINGLE_VERTICAL.with(colors::CYAN).to_string();
        for (i, width) in self.col_widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let padding = " ".repeat(width.saturating_sub(cell.width()));
            let styled = if header {
                cell.with(colors::CYAN).bold().to_string()
            } else {
                cell.with(colors::WHITE).to_string()
            };
            out.push_str(&format!(" {}{} ", styled, padding));
            out.push_str(&box_chars::SINGLE_VERTICAL.with(colors::CYAN).to_string());
        }
        out
    }

    pub fn print(&self) {
        println!(
            "{}",
            self.border(
                box_chars::ROUND_TOP_LEFT,
                box_chars::T_TOP,
                box_chars::ROUND_TOP_RIGHT
            )
        );
        println!("{}", self.line(&self.headers, true));
        println!(
            "{}",
            self.border(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT)
        );
        for row in &self.rows {
            println!("{}", self.line(row, false));
        }
        println!(
            "{}",
            self.border(
                box_chars::ROUND_BOTTOM_LEFT,
                box_chars::T_BOTTOM,
                box_chars::ROUND_BOTTOM_RIGHT
            )
        );
    }
}
