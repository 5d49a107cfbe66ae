//! Sentiment enrichment for collected mentions.
//!
//! [`SentimentClient`] talks to a hosted generate-content model and parses
//! its JSON verdict. When the upstream is unconfigured, exhausted, or
//! returns something unparseable, the deterministic lexicon heuristic in
//! [`fallback`] answers instead, so enrichment as a whole never fails.

use brandtrack_core::SentimentJudgment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;
pub mod fallback;

pub use client::SentimentClient;

/// Errors from one upstream analysis attempt. Callers of
/// [`SentimentClient::analyze`] never see these; they are logged and
/// absorbed by the fallback.
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream rejected request: {0}")]
    Upstream(String),

    #[error("unparseable analysis: {0}")]
    Parse(String),
}

/// One text's full sentiment verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    #[serde(flatten)]
    pub judgment: SentimentJudgment,
    pub keywords: Vec<String>,
    pub reasoning: String,
}

/// A verdict together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSentiment {
    pub analysis: SentimentAnalysis,
    /// True when the local heuristic produced the verdict.
    pub fallback: bool,
}
