//! Twitter-shaped social source: bearer-token recent search.
//!
//! Builds one OR-joined query from monitored handles (`from:h`, `@h`) and
//! quoted brand terms, then classifies each tweet by its relationship to the
//! monitored handles.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use brandtrack_core::text::{contains_ci, extract_brand_mentions};
use brandtrack_core::{Engagement, MentionKind, Platform, RawMention};

use crate::{cap_text, SearchTerms, SourceAdapter, SourceError};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/2";
const MAX_RESULTS: &str = "50";

pub struct SocialSource {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<TweetAuthor>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    public_metrics: TweetMetrics,
}

#[derive(Debug, Default, Deserialize)]
struct TweetMetrics {
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    retweet_count: i64,
    #[serde(default)]
    reply_count: i64,
    #[serde(default)]
    impression_count: i64,
}

#[derive(Debug, Deserialize)]
struct TweetAuthor {
    id: String,
    username: String,
}

impl SocialSource {
    /// Creates an adapter pointed at the production search API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        bearer_token: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(bearer_token, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        bearer_token: Option<String>,
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
            bearer_token,
        })
    }

    fn build_query(terms: &SearchTerms) -> String {
        let mut parts = Vec::new();
        for handle in &terms.handles {
            parts.push(format!("from:{handle}"));
            parts.push(format!("@{handle}"));
        }
        for brand in &terms.brands {
            parts.push(format!("\"{brand}\""));
        }
        parts.join(" OR ")
    }

    fn to_mention(
        tweet: Tweet,
        users: &[TweetAuthor],
        terms: &SearchTerms,
        match_terms: &[String],
    ) -> RawMention {
        let author = tweet
            .author_id
            .as_deref()
            .and_then(|id| users.iter().find(|u| u.id == id));
        let username = author.map_or("unknown", |u| u.username.as_str());
        let text = cap_text(tweet.text);
        let kind = classify(&text, username, &terms.handles);
        let metrics = tweet.public_metrics;

        RawMention {
            platform: Platform::Twitter,
            url: format!("https://twitter.com/i/status/{}", tweet.id),
            author: username.to_string(),
            author_profile: author.map(|u| format!("https://twitter.com/{}", u.username)),
            published_at: tweet.created_at.unwrap_or_else(Utc::now),
            engagement: Engagement {
                likes: metrics.like_count,
                shares: metrics.retweet_count,
                comments: metrics.reply_count,
                views: metrics.impression_count,
            },
            brand_mentions: extract_brand_mentions(&text, match_terms),
            kind,
            text,
        }
    }
}

/// Official when posted by a monitored handle, direct mention when the text
/// @-mentions one, otherwise general brand discussion.
fn classify(text: &str, author: &str, handles: &[String]) -> MentionKind {
    if handles.iter().any(|h| h.eq_ignore_ascii_case(author)) {
        return MentionKind::Official;
    }
    if handles.iter().any(|h| contains_ci(text, &format!("@{h}"))) {
        return MentionKind::DirectMention;
    }
    MentionKind::BrandDiscussion
}

#[async_trait::async_trait]
impl SourceAdapter for SocialSource {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn is_enabled(&self) -> bool {
        self.bearer_token.is_some()
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<Vec<RawMention>, SourceError> {
        let Some(token) = &self.bearer_token else {
            tracing::debug!(platform = "twitter", "bearer token not configured, skipping");
            return Ok(vec![]);
        };
        if terms.handles.is_empty() && terms.brands.is_empty() {
            return Ok(vec![]);
        }

        let query = Self::build_query(terms);
        let response = self
            .client
            .get(format!("{}/tweets/search/recent", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("query", query.as_str()),
                ("tweet.fields", "created_at,author_id,public_metrics"),
                ("user.fields", "username"),
                ("expansions", "author_id"),
                ("max_results", MAX_RESULTS),
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

        let SearchResponse { data, includes } = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("search response: {e}")))?;

        let match_terms = terms.match_terms();
        Ok(data
            .into_iter()
            .map(|tweet| Self::to_mention(tweet, &includes.users, terms, &match_terms))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles() -> Vec<String> {
        vec!["acmehq".to_string()]
    }

    #[test]
    fn classify_official_matches_handle_case_insensitively() {
        let kind = classify("we shipped a thing", "AcmeHQ", &handles());
        assert_eq!(kind, MentionKind::Official);
    }

    #[test]
    fn classify_direct_mention_requires_at_prefix() {
        let kind = classify("hey @acmehq your dashboard is broken", "someone", &handles());
        assert_eq!(kind, MentionKind::DirectMention);

        let kind = classify("acmehq without the at sign", "someone", &handles());
        assert_eq!(kind, MentionKind::BrandDiscussion);
    }

    #[test]
    fn classify_defaults_to_brand_discussion() {
        let kind = classify("thinking about Acme today", "someone", &handles());
        assert_eq!(kind, MentionKind::BrandDiscussion);
    }

    #[test]
    fn build_query_covers_handles_and_quoted_brands() {
        let terms = SearchTerms {
            brands: vec!["Acme".to_string(), "Acme Labs".to_string()],
            keywords: vec!["ignored for social".to_string()],
            handles: vec!["acmehq".to_string()],
        };
        assert_eq!(
            SocialSource::build_query(&terms),
            r#"from:acmehq OR @acmehq OR "Acme" OR "Acme Labs""#
        );
    }
}
