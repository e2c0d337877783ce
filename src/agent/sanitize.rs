//! Best-effort extraction of a JSON payload from free-form model text.
//!
//! Judges are asked for bare JSON but reasoning models wrap it in
//! `<think>` blocks and markdown fences. [`extract_json_payload`] peels
//! those layers off; each step is skipped when its wrapper is absent.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

/// Maximum characters of a raw reply included in debug logs.
pub const RAW_EXCERPT_CHARS: usize = 500;

#[allow(clippy::expect_used)]
static THINK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</think\s*>").expect("literal regex"));

#[allow(clippy::expect_used)]
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("literal regex")
});

/// Strips reasoning blocks and code fences, returning the text to parse.
///
/// 1. Everything up to and including the last `</think>` is discarded.
/// 2. If a fenced code block remains, its body is returned (language tag
///    removed). An unterminated opening fence is stripped as well.
#[must_use]
pub fn extract_json_payload(raw: &str) -> &str {
    let after_think = THINK_CLOSE
        .find_iter(raw)
        .last()
        .map_or(raw, |m| &raw[m.end()..])
        .trim();

    if let Some(body) = FENCED_BLOCK
        .captures(after_think)
        .and_then(|caps| caps.get(1))
    {
        return body.as_str().trim();
    }

    after_think.strip_prefix("```").map_or(after_think, |rest| {
        rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            .trim()
    })
}

/// Sanitizes a raw reply and deserializes it.
///
/// # Errors
///
/// Returns the `serde_json` error when the extracted payload is not valid
/// JSON for `T`.
pub fn parse_judge_reply<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(extract_json_payload(raw))
}

/// Returns at most [`RAW_EXCERPT_CHARS`] characters of `raw`.
#[must_use]
pub fn excerpt(raw: &str) -> &str {
    raw.char_indices()
        .nth(RAW_EXCERPT_CHARS)
        .map_or(raw, |(idx, _)| &raw[..idx])
}
