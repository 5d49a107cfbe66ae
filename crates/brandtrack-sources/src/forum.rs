//! Reddit-shaped forum source: client-credentials OAuth, then search.
//!
//! The token is exchanged once per fetch; cycles run minutes apart, so the
//! hourly token lifetime never matters.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use brandtrack_core::text::extract_brand_mentions;
use brandtrack_core::{Engagement, MentionKind, Platform, RawMention};

use crate::{cap_text, SearchTerms, SourceAdapter, SourceError};

const DEFAULT_AUTH_BASE: &str = "https://www.reddit.com";
const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";
const PAGE_LIMIT: &str = "25";

pub struct ForumSource {
    client: Client,
    auth_base: String,
    api_base: String,
    credentials: Option<(String, String)>,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: Option<String>,
    selftext: Option<String>,
    body: Option<String>,
    permalink: Option<String>,
    author: Option<String>,
    created_utc: Option<f64>,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    num_comments: i64,
}

impl PostData {
    /// Title plus self text for link posts, body for comments.
    fn text(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            match self.selftext.as_deref().filter(|s| !s.is_empty()) {
                Some(selftext) => format!("{title}\n\n{selftext}"),
                None => title.to_string(),
            }
        } else {
            self.body.clone().unwrap_or_default()
        }
    }
}

impl ForumSource {
    /// Creates an adapter pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        Self::with_base_urls(
            client_id,
            client_secret,
            timeout_secs,
            user_agent,
            DEFAULT_AUTH_BASE,
            DEFAULT_API_BASE,
        )
    }

    /// Creates an adapter with custom token-exchange and API base URLs
    /// (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn with_base_urls(
        client_id: Option<String>,
        client_secret: Option<String>,
        timeout_secs: u64,
        user_agent: &str,
        auth_base: &str,
        api_base: &str,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            auth_base: auth_base.trim_end_matches('/').to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials: client_id.zip(client_secret),
            user_agent: user_agent.to_string(),
        })
    }

    async fn fetch_token(&self, client_id: &str, client_secret: &str) -> Result<String, SourceError> {
        let response = self
            .client
            .post(format!("{}/api/v1/access_token", self.auth_base))
            .header("User-Agent", &self.user_agent)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Auth(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("token response: {e}")))?;

        Ok(token.access_token)
    }

    fn to_mention(data: &PostData, match_terms: &[String]) -> Option<RawMention> {
        let permalink = data.permalink.as_deref()?;
        let text = cap_text(data.text());
        if text.is_empty() {
            return None;
        }

        let author = data.author.clone().unwrap_or_else(|| "unknown".to_string());
        let author_profile = data
            .author
            .as_deref()
            .map(|a| format!("https://reddit.com/u/{a}"));
        #[allow(clippy::cast_possible_truncation)]
        let published_at = data
            .created_utc
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
            .unwrap_or_else(Utc::now);

        Some(RawMention {
            platform: Platform::Reddit,
            url: format!("https://reddit.com{permalink}"),
            brand_mentions: extract_brand_mentions(&text, match_terms),
            text,
            author,
            author_profile,
            published_at,
            engagement: Engagement {
                likes: data.ups,
                shares: 0,
                comments: data.num_comments,
                views: 0,
            },
            kind: MentionKind::BrandDiscussion,
        })
    }
}

#[async_trait::async_trait]
impl SourceAdapter for ForumSource {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    async fn fetch(&self, terms: &SearchTerms) -> Result<Vec<RawMention>, SourceError> {
        let Some((client_id, client_secret)) = &self.credentials else {
            tracing::debug!(platform = "reddit", "credentials not configured, skipping");
            return Ok(vec![]);
        };
        let query = terms.query_string();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let token = self.fetch_token(client_id, client_secret).await?;

        let response = self
            .client
            .get(format!("{}/search", self.api_base))
            .bearer_auth(&token)
            .header("User-Agent", &self.user_agent)
            .query(&[
                ("q", query.as_str()),
                ("sort", "new"),
                ("limit", PAGE_LIMIT),
                ("type", "link,comment"),
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

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("listing response: {e}")))?;

        let match_terms = terms.match_terms();
        Ok(listing
            .data
            .children
            .iter()
            .filter_map(|post| Self::to_mention(&post.data, &match_terms))
            .collect())
    }
}
