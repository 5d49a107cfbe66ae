//! NewsAPI-shaped news source: key-authenticated everything search.
//!
//! Articles carry no engagement counters, so those stay zeroed and the
//! engagement-based alert predicate simply never fires for news mentions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use brandtrack_core::text::extract_brand_mentions;
use brandtrack_core::{Engagement, MentionKind, Platform, RawMention};

use crate::{cap_text, SearchTerms, SourceAdapter, SourceError};

const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";
const PAGE_SIZE: &str = "25";

pub struct NewsSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: String,
    author: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

impl NewsSource {
    /// Creates an adapter pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn to_mention(article: Article, match_terms: &[String]) -> Option<RawMention> {
        let title = article.title.as_deref().unwrap_or_default();
        let text = cap_text(match article.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => format!("{title}. {description}"),
            None => title.to_string(),
        });
        if text.is_empty() {
            return None;
        }

        let author = article
            .author
            .or_else(|| article.source.and_then(|s| s.name))
            .unwrap_or_else(|| "unknown".to_string());

        Some(RawMention {
            platform: Platform::News,
            url: article.url,
            author,
            author_profile: None,
            published_at: article.published_at.unwrap_or_else(Utc::now),
            engagement: Engagement::default(),
            brand_mentions: extract_brand_mentions(&text, match_terms),
            kind: MentionKind::BrandDiscussion,
            text,
        })
    }
}

#[async_trait::async_trait]
impl SourceAdapter for NewsSource {
    fn platform(&self) -> Platform {
        Platform::News
    }

    fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<Vec<RawMention>, SourceError> {
        let Some(key) = &self.api_key else {
            tracing::debug!(platform = "news", "api key not configured, skipping");
            return Ok(vec![]);
        };
        let query = terms.query_string();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .client
            .get(format!("{}/everything", self.base_url))
            .query(&[
                ("q", query.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", PAGE_SIZE),
                ("apiKey", key.as_str()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SourceError::Auth(format!(
                    "search rejected with status {}",
                    response.status()
                )));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SourceError::Quota("search rate limit hit".to_string()));
            }
            _ => {}
        }
        let response = response.error_for_status()?;

        let payload: EverythingResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("everything response: {e}")))?;

        let match_terms = terms.match_terms();
        Ok(payload
            .articles
            .into_iter()
            .filter_map(|article| Self::to_mention(article, &match_terms))
            .collect())
    }
}
