//! Translation of cleaned text into English.

mod google;
mod retry_policy;

pub use google::{
    parse_translate_response, GoogleTranslateClient, DEFAULT_BASE_URL, MAX_INPUT_CHARS,
};
pub use retry_policy::RetryPolicy;

use thiserror::Error;
use tracing::warn;

/// Source language passed when the language of the text is unknown.
pub const AUTO_DETECT: &str = "auto";
pub const ENGLISH: &str = "en";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Translation request timed out")]
    Timeout,

    #[error("Translation service returned HTTP {status}")]
    Http { status: u16 },

    #[error("Malformed translation response: {0}")]
    Parse(String),

    #[error("Input too long for translation: {len} chars (max {max})")]
    InputTooLong { len: usize, max: usize },
}

impl TranslationError {
    /// Network failures, timeouts, throttling and server errors are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Network(_) | TranslationError::Timeout => true,
            TranslationError::Http { status } => *status == 429 || *status >= 500,
            TranslationError::Parse(_) | TranslationError::InputTooLong { .. } => false,
        }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranslationError::Timeout
        } else if let Some(status) = err.status() {
            TranslationError::Http {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            TranslationError::Parse(err.to_string())
        } else {
            TranslationError::Network(err.to_string())
        }
    }
}

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source` (or [`AUTO_DETECT`]) into `target`.
    fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, TranslationError>;
}

/// Returns its input untouched. Used when translation is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTranslator;

impl Translator for PassthroughTranslator {
    fn translate(
        &self,
        text: &str,
        _source: &str,
        _target: &str,
    ) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationOutcome {
    pub text: String,
    /// True when translation failed and `text` is the untranslated input.
    pub fell_back: bool,
}

/// Translate into English, falling back to the input on any failure.
pub fn translate_to_english(translator: &dyn Translator, text: &str) -> TranslationOutcome {
    match translator.translate(text, AUTO_DETECT, ENGLISH) {
        Ok(translated) => TranslationOutcome {
            text: translated,
            fell_back: false,
        },
        Err(err) => {
            warn!("Translation failed, keeping original text: {}", err);
            TranslationOutcome {
                text: text.to_string(),
                fell_back: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingTranslator;

    impl Translator for FailingTranslator {
        fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, TranslationError> {
            Err(TranslationError::Http { status: 503 })
        }
    }

    struct UppercaseTranslator;

    impl Translator for UppercaseTranslator {
        fn translate(
            &self,
            text: &str,
            source: &str,
            target: &str,
        ) -> Result<String, TranslationError> {
            assert_eq!(source, AUTO_DETECT);
            assert_eq!(target, ENGLISH);
            Ok(text.to_uppercase())
        }
    }

    #[test]
    fn test_failure_falls_back_to_input() {
        let outcome = translate_to_english(&FailingTranslator, "Maza khoop chaan!");
        assert_eq!(outcome.text, "Maza khoop chaan!");
        assert!(outcome.fell_back);
    }

    #[test]
    fn test_success_uses_translation() {
        let outcome = translate_to_english(&UppercaseTranslator, "ok");
        assert_eq!(outcome.text, "OK");
        assert!(!outcome.fell_back);
    }

    #[test]
    fn test_passthrough_is_identity() {
        let outcome = translate_to_english(&PassthroughTranslator, "खूप छान");
        assert_eq!(
            outcome,
            TranslationOutcome {
                text: "खूप छान".to_string(),
                fell_back: false
            }
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(TranslationError::Network("reset".into()).is_retryable());
        assert!(TranslationError::Timeout.is_retryable());
        assert!(TranslationError::Http { status: 429 }.is_retryable());
        assert!(TranslationError::Http { status: 502 }.is_retryable());
        assert!(!TranslationError::Http { status: 403 }.is_retryable());
        assert!(!TranslationError::Parse("x".into()).is_retryable());
    }
}
