//! Structured-output judge calls with local recovery.
//!
//! A judge is an [`Agent`] whose reply must deserialize into a
//! [`Verdict`]. Malformed replies and transport failures both resolve to the
//! verdict's default record; the caller learns which happened through
//! [`Judged::fell_back`].

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::provider::LlmProvider;
use super::sanitize::{excerpt, parse_judge_reply};
use super::traits::Agent;
use crate::core::{QueryAnalysis, ReflectionResult};

/// A record a judge can return.
pub trait Verdict: DeserializeOwned + Default {
    /// Short label used in logs.
    const LABEL: &'static str;

    /// Normalizes a freshly parsed record.
    #[must_use]
    fn normalize(self) -> Self;
}

impl Verdict for QueryAnalysis {
    const LABEL: &'static str = "query analysis";

    fn normalize(self) -> Self {
        self.normalized()
    }
}

impl Verdict for ReflectionResult {
    const LABEL: &'static str = "reflection";

    fn normalize(self) -> Self {
        self.normalized()
    }
}

/// A judge's verdict plus whether it is the substituted default.
#[derive(Debug, Clone, PartialEq)]
pub struct Judged<T> {
    /// The parsed (or default) record.
    pub value: T,
    /// `true` when the reply was unusable and the default was substituted.
    pub fell_back: bool,
}

impl<T: Default> Judged<T> {
    fn fallback() -> Self {
        Self {
            value: T::default(),
            fell_back: true,
        }
    }
}

/// Parses a raw judge reply, substituting the default on malformed output.
#[must_use]
pub fn parse_or_default<V: Verdict>(raw: &str) -> Judged<V> {
    match parse_judge_reply::<V>(raw) {
        Ok(value) => Judged {
            value: value.normalize(),
            fell_back: false,
        },
        Err(e) => {
            warn!(judge = V::LABEL, error = %e, "failed to parse judge reply; using defaults");
            debug!(judge = V::LABEL, raw = excerpt(raw), "unparseable judge reply");
            Judged::fallback()
        }
    }
}

/// Runs `agent` and parses its reply as `V`.
///
/// Never fails: provider errors are logged and resolved to the default.
pub async fn evaluate<V: Verdict>(
    agent: &dyn Agent,
    provider: &dyn LlmProvider,
    user_msg: &str,
) -> Judged<V> {
    match agent.execute(provider, user_msg).await {
        Ok(response) => {
            if response.is_truncated() {
                warn!(judge = V::LABEL, "judge reply hit the token cap");
            }
            parse_or_default(&response.content)
        }
        Err(e) => {
            warn!(judge = V::LABEL, agent = agent.name(), error = %e, "judge call failed; using defaults");
            Judged::fallback()
        }
    }
}
