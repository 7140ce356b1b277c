//! Free-text cleaning applied before translation.
//!
//! Steps, in order: drop block-listed emoji/pictograph code points, drop every
//! character outside the allow-list (word characters, whitespace and
//! `.,!?-@#&():;/'"%$`), NFKC-normalize, collapse whitespace runs and trim.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref EMOJI_PATTERN: Regex = Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}",
        "\u{1F300}-\u{1F5FF}",
        "\u{1F680}-\u{1F6FF}",
        "\u{1F1E0}-\u{1F1FF}",
        "\u{2700}-\u{27BF}",
        "\u{24C2}-\u{1F251}",
        "\u{1F900}-\u{1F9FF}",
        "\u{200D}",
        "]+"
    ))
    .expect("emoji pattern is valid");
    static ref SYMBOL_PATTERN: Regex =
        Regex::new(r#"[^\w\s.,!?\-@#&():;/'"%$]"#).expect("symbol pattern is valid");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
}

fn strip_disallowed(s: &str) -> String {
    let without_emoji = EMOJI_PATTERN.replace_all(s, "");
    SYMBOL_PATTERN.replace_all(&without_emoji, "").into_owned()
}

/// Cleans a free-text string. Pure and idempotent.
pub fn clean_text(s: &str) -> String {
    let stripped = strip_disallowed(s);
    let mut normalized: String = stripped.nfkc().collect();
    // Compatibility decomposition can surface characters the filters would reject
    // (e.g. a pictograph hidden behind a compatibility form); filter them too.
    if normalized != stripped {
        normalized = strip_disallowed(&normalized);
    }
    WHITESPACE_RUN
        .replace_all(&normalized, " ")
        .trim()
        .to_string()
}

/// Cleans a JSON field value: strings are cleaned, anything else is returned as is.
pub fn clean_field(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_text(&s)),
        other => other,
    }
}
