//! Integration tests for the source adapters using wiremock HTTP mocks.

use brandtrack_core::{MentionKind, Platform};
use brandtrack_sources::{
    ForumSource, NewsSource, SearchTerms, SocialSource, SourceAdapter, SourceError,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn terms() -> SearchTerms {
    SearchTerms {
        brands: vec!["Acme".to_string()],
        keywords: vec!["workflow automation".to_string()],
        handles: vec!["acmehq".to_string()],
    }
}

// ---------------------------------------------------------------------------
// Section 1: Social (Twitter-shaped)
// ---------------------------------------------------------------------------

fn social_client(base_url: &str, token: Option<&str>) -> SocialSource {
    SocialSource::with_base_url(token.map(String::from), 30, "test-agent", base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn social_fetch_parses_and_classifies_tweets() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "data": [
            {
                "id": "1",
                "text": "We just shipped the new Acme dashboard",
                "author_id": "u1",
                "created_at": "2026-08-26T12:00:00Z",
                "public_metrics": {
                    "like_count": 45, "retweet_count": 12,
                    "reply_count": 8, "impression_count": 230
                }
            },
            {
                "id": "2",
                "text": "hey @acmehq the export button is broken",
                "author_id": "u2",
                "created_at": "2026-08-26T12:05:00Z",
                "public_metrics": {
                    "like_count": 3, "retweet_count": 0,
                    "reply_count": 1, "impression_count": 50
                }
            },
            {
                "id": "3",
                "text": "thinking about switching to Acme",
                "author_id": "u3",
                "created_at": "2026-08-26T12:10:00Z"
            }
        ],
        "includes": {
            "users": [
                { "id": "u1", "username": "AcmeHQ" },
                { "id": "u2", "username": "grumpy_dev" },
                { "id": "u3", "username": "curious_cat" }
            ]
        }
    });

    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .and(query_param("max_results", "50"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = social_client(&server.uri(), Some("test-token"));
    let mentions = client.fetch(&terms()).await.expect("fetch should succeed");

    assert_eq!(mentions.len(), 3);

    let official = &mentions[0];
    assert_eq!(official.platform, Platform::Twitter);
    assert_eq!(official.url, "https://twitter.com/i/status/1");
    assert_eq!(official.author, "AcmeHQ");
    assert_eq!(
        official.author_profile.as_deref(),
        Some("https://twitter.com/AcmeHQ")
    );
    assert_eq!(official.kind, MentionKind::Official);
    assert_eq!(official.engagement.likes, 45);
    assert_eq!(official.engagement.shares, 12);
    assert_eq!(official.engagement.comments, 8);
    assert_eq!(official.engagement.views, 230);
    assert_eq!(official.brand_mentions, vec!["Acme".to_string()]);

    assert_eq!(mentions[1].kind, MentionKind::DirectMention);
    assert_eq!(mentions[2].kind, MentionKind::BrandDiscussion);
    // Missing public_metrics defaults to zero, not an error.
    assert_eq!(mentions[2].engagement.likes, 0);
}

#[tokio::test]
async fn social_fetch_disabled_without_token() {
    // No mocks mounted: a request would fail, proving none is made.
    let server = MockServer::start().await;
    let client = social_client(&server.uri(), None);

    assert!(!client.is_enabled());
    let mentions = client.fetch(&terms()).await.expect("disabled fetch is ok");
    assert!(mentions.is_empty());
}

#[tokio::test]
async fn social_fetch_rejection_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = social_client(&server.uri(), Some("bad-token"));
    let err = client
        .fetch(&terms())
        .await
        .expect_err("401 should surface as an error");
    assert!(matches!(err, SourceError::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn social_fetch_rate_limit_is_quota_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = social_client(&server.uri(), Some("test-token"));
    let err = client.fetch(&terms()).await.expect_err("429 should error");
    assert!(matches!(err, SourceError::Quota(_)), "got {err:?}");
}

#[tokio::test]
async fn social_fetch_malformed_payload_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let client = social_client(&server.uri(), Some("test-token"));
    let err = client
        .fetch(&terms())
        .await
        .expect_err("garbage body should error");
    assert!(matches!(err, SourceError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn social_fetch_empty_response_yields_no_mentions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = social_client(&server.uri(), Some("test-token"));
    let mentions = client.fetch(&terms()).await.expect("fetch should succeed");
    assert!(mentions.is_empty());
}

// ---------------------------------------------------------------------------
// Section 2: Forum (Reddit-shaped)
// ---------------------------------------------------------------------------

fn forum_client(auth_base: &str, api_base: &str, with_creds: bool) -> ForumSource {
    let (id, secret) = if with_creds {
        (Some("client-id".to_string()), Some("client-secret".to_string()))
    } else {
        (None, None)
    };
    ForumSource::with_base_urls(id, secret, 30, "test-agent", auth_base, api_base)
        .expect("client construction should not fail")
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "forum-token" })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn forum_fetch_exchanges_token_then_searches() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let listing = serde_json::json!({
        "data": {
            "children": [
                {
                    "data": {
                        "title": "Anyone else using Acme?",
                        "selftext": "Curious about the pricing",
                        "permalink": "/r/sysadmin/comments/abc",
                        "author": "throwaway_infra",
                        "created_utc": 1_756_000_000.0,
                        "ups": 34,
                        "num_comments": 27
                    }
                },
                {
                    "data": {
                        "body": "Acme support was great for us",
                        "permalink": "/r/sysadmin/comments/abc/def",
                        "author": "happy_admin",
                        "created_utc": 1_756_000_100.0,
                        "ups": 5,
                        "num_comments": 0
                    }
                }
            ]
        }
    });

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("sort", "new"))
        .and(query_param("q", "Acme OR workflow automation"))
        .and(header("Authorization", "Bearer forum-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&listing))
        .mount(&server)
        .await;

    let client = forum_client(&server.uri(), &server.uri(), true);
    let mentions = client.fetch(&terms()).await.expect("fetch should succeed");

    assert_eq!(mentions.len(), 2);

    let post = &mentions[0];
    assert_eq!(post.platform, Platform::Reddit);
    assert_eq!(post.url, "https://reddit.com/r/sysadmin/comments/abc");
    assert_eq!(post.text, "Anyone else using Acme?\n\nCurious about the pricing");
    assert_eq!(post.engagement.likes, 34);
    assert_eq!(post.engagement.comments, 27);
    assert_eq!(post.brand_mentions, vec!["Acme".to_string()]);

    let comment = &mentions[1];
    assert_eq!(comment.text, "Acme support was great for us");
    assert_eq!(comment.author, "happy_admin");
}

#[tokio::test]
async fn forum_fetch_token_rejection_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = forum_client(&server.uri(), &server.uri(), true);
    let err = client
        .fetch(&terms())
        .await
        .expect_err("rejected token exchange should error");
    assert!(matches!(err, SourceError::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn forum_fetch_disabled_without_credentials() {
    let server = MockServer::start().await;
    let client = forum_client(&server.uri(), &server.uri(), false);

    assert!(!client.is_enabled());
    let mentions = client.fetch(&terms()).await.expect("disabled fetch is ok");
    assert!(mentions.is_empty());
}

#[tokio::test]
async fn forum_search_rate_limit_is_quota_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = forum_client(&server.uri(), &server.uri(), true);
    let err = client.fetch(&terms()).await.expect_err("429 should error");
    assert!(matches!(err, SourceError::Quota(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Section 3: News (NewsAPI-shaped)
// ---------------------------------------------------------------------------

fn news_client(base_url: &str, key: Option<&str>) -> NewsSource {
    NewsSource::with_base_url(key.map(String::from), 30, "test-agent", base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn news_fetch_parses_articles() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "ok",
        "articles": [
            {
                "title": "Acme raises the bar",
                "description": "Analysts praise the new platform",
                "url": "https://news.example.com/a/1",
                "author": "Jordan Reports",
                "publishedAt": "2026-08-26T09:00:00Z",
                "source": { "name": "Example Tech Desk" }
            },
            {
                "title": "Industry roundup",
                "description": null,
                "url": "https://news.example.com/a/2",
                "author": null,
                "publishedAt": "2026-08-26T10:00:00Z",
                "source": { "name": "Example Wire" }
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/everything"))
        .and(query_param("q", "Acme OR workflow automation"))
        .and(query_param("language", "en"))
        .and(query_param("apiKey", "news-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = news_client(&server.uri(), Some("news-key"));
    let mentions = client.fetch(&terms()).await.expect("fetch should succeed");

    assert_eq!(mentions.len(), 2);
    assert_eq!(mentions[0].platform, Platform::News);
    assert_eq!(mentions[0].text, "Acme raises the bar. Analysts praise the new platform");
    assert_eq!(mentions[0].author, "Jordan Reports");
    assert_eq!(mentions[0].engagement.likes, 0);
    assert_eq!(mentions[0].brand_mentions, vec!["Acme".to_string()]);

    // No author: falls back to the source name; no description: title only.
    assert_eq!(mentions[1].author, "Example Wire");
    assert_eq!(mentions[1].text, "Industry roundup");
}

#[tokio::test]
async fn news_fetch_rejection_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = news_client(&server.uri(), Some("bad-key"));
    let err = client.fetch(&terms()).await.expect_err("401 should error");
    assert!(matches!(err, SourceError::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn news_fetch_disabled_without_key() {
    let server = MockServer::start().await;
    let client = news_client(&server.uri(), None);

    assert!(!client.is_enabled());
    let mentions = client.fetch(&terms()).await.expect("disabled fetch is ok");
    assert!(mentions.is_empty());
}

#[tokio::test]
async fn news_fetch_malformed_payload_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = news_client(&server.uri(), Some("news-key"));
    let err = client
        .fetch(&terms())
        .await
        .expect_err("garbage body should error");
    assert!(matches!(err, SourceError::Decode(_)), "got {err:?}");
}
