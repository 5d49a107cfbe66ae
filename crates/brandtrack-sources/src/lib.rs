//! Source adapters that turn external services into [`RawMention`] streams.
//!
//! Each adapter is constructed once at startup and fetched every collection
//! cycle. An adapter whose credentials are absent stays constructible and
//! returns an empty batch from `fetch`, so a partially-configured deployment
//! still collects from the sources it can reach.

use async_trait::async_trait;
use thiserror::Error;

use brandtrack_core::text::truncate_chars;
use brandtrack_core::{AppConfig, Platform, RawMention};

pub mod forum;
pub mod news;
pub mod social;

pub use forum::ForumSource;
pub use news::NewsSource;
pub use social::SocialSource;

/// Errors surfaced by a source adapter. The orchestrator logs these and
/// treats the adapter's contribution as empty; they never abort a cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("rate limited: {0}")]
    Quota(String),
}

/// The monitored terms an adapter searches for in one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    /// Brand names, matched exactly where the source supports it.
    pub brands: Vec<String>,
    /// Broader topic keywords.
    pub keywords: Vec<String>,
    /// Official account handles, for sources with an author model.
    pub handles: Vec<String>,
}

impl SearchTerms {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            brands: config.monitored_brands.clone(),
            keywords: config.monitored_keywords.clone(),
            handles: config.monitored_handles.clone(),
        }
    }

    /// Brands and keywords in one list, brands first. This is the list
    /// brand-mention extraction matches against.
    #[must_use]
    pub fn match_terms(&self) -> Vec<String> {
        self.brands
            .iter()
            .chain(self.keywords.iter())
            .cloned()
            .collect()
    }

    /// Brands and keywords OR-joined for sources with a plain query syntax.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.match_terms().join(" OR ")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.brands.is_empty() && self.keywords.is_empty() && self.handles.is_empty()
    }
}

/// Mention text longer than this many characters is cut at normalization
/// time, on a char boundary.
const MAX_TEXT_CHARS: usize = 2_000;

/// Apply the [`MAX_TEXT_CHARS`] cap in place.
pub(crate) fn cap_text(mut text: String) -> String {
    let keep = truncate_chars(&text, MAX_TEXT_CHARS).len();
    text.truncate(keep);
    text
}

/// One external mention source.
///
/// Implementations must never panic across this boundary: any upstream
/// failure comes back as a [`SourceError`].
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The platform tag stamped on every mention this adapter produces.
    fn platform(&self) -> Platform;

    /// False when credentials are missing; `fetch` then returns `Ok(vec![])`.
    fn is_enabled(&self) -> bool;

    /// Search the source for the given terms and normalize the results.
    async fn fetch(&self, terms: &SearchTerms) -> Result<Vec<RawMention>, SourceError>;
}

/// Construct every adapter from application config, enabled or not.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if an underlying HTTP client cannot be
/// built.
pub fn build_adapters(config: &AppConfig) -> Result<Vec<Box<dyn SourceAdapter>>, SourceError> {
    Ok(vec![
        Box::new(SocialSource::new(
            config.twitter_bearer_token.clone(),
            config.source_timeout_secs,
            &config.source_user_agent,
        )?),
        Box::new(ForumSource::new(
            config.reddit_client_id.clone(),
            config.reddit_client_secret.clone(),
            config.source_timeout_secs,
            &config.reddit_user_agent,
        )?),
        Box::new(NewsSource::new(
            config.news_api_key.clone(),
            config.source_timeout_secs,
            &config.source_user_agent,
        )?),
    ])
}
