//! Google Translate client using the public `translate_a/single` endpoint.

use super::{RetryPolicy, TranslationError, Translator};
use crate::config::TranslationSettings;
use reqwest::blocking::Client;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Longest input the public endpoint accepts, in characters.
pub const MAX_INPUT_CHARS: usize = 5000;

const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(100);

pub struct GoogleTranslateClient {
    client: Client,
    base_url: String,
    retry_policy: RetryPolicy,
    last_request: Mutex<Instant>,
}

impl GoogleTranslateClient {
    pub fn new(settings: &TranslationSettings) -> anyhow::Result<Self> {
        Self::with_policy(
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
            RetryPolicy::new(settings),
        )
    }

    pub fn with_policy(
        base_url: &str,
        timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_policy,
            last_request: Mutex::new(Instant::now() - RATE_LIMIT_INTERVAL),
        })
    }

    fn rate_limit(&self) {
        let mut last = self.last_request.lock().unwrap();
        let elapsed = last.elapsed();
        if elapsed < RATE_LIMIT_INTERVAL {
            std::thread::sleep(RATE_LIMIT_INTERVAL - elapsed);
        }
        *last = Instant::now();
    }

    fn request_once(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        self.rate_limit();

        let url = format!(
            "{}/translate_a/single?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.base_url,
            urlencoding::encode(source),
            urlencoding::encode(target),
            urlencoding::encode(text)
        );

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Http {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json()?;
        parse_translate_response(&body)
    }
}

impl Translator for GoogleTranslateClient {
    fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        let len = text.chars().count();
        if len > MAX_INPUT_CHARS {
            return Err(TranslationError::InputTooLong {
                len,
                max: MAX_INPUT_CHARS,
            });
        }

        let mut retry_count = 0;
        loop {
            match self.request_once(text, source, target) {
                Ok(translated) => return Ok(translated),
                Err(err) if self.retry_policy.should_retry(&err, retry_count) => {
                    let backoff = self.retry_policy.backoff(retry_count);
                    debug!(
                        "Translation attempt {} failed ({}), retrying in {:?}",
                        retry_count + 1,
                        err,
                        backoff
                    );
                    std::thread::sleep(backoff);
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Joins the translated segments of a `translate_a/single` response.
///
/// The payload looks like `[[["Hello", "Namaste", null, null, 10], ...], null, "hi", ...]`;
/// the first element of every inner array is a translated segment.
pub fn parse_translate_response(body: &Value) -> Result<String, TranslationError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Parse("missing segment list".to_string()))?;

    let mut translated = String::new();
    for segment in segments {
        match segment.get(0) {
            Some(Value::String(s)) => translated.push_str(s),
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(TranslationError::Parse(format!(
                    "unexpected segment value {}",
                    other
                )))
            }
        }
    }
    if translated.trim().is_empty() {
        return Err(TranslationError::Parse("empty translation".to_string()));
    }
    Ok(translated)
}
