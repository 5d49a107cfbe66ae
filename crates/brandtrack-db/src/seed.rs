//! Demo data for local development: a handful of enriched mentions across
//! platforms and sentiment labels, plus one starter alert config.

use chrono::{Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::mentions::KeywordEntry;
use crate::DbError;

/// Counts of rows actually inserted by [`seed_demo_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub mentions_inserted: usize,
    pub alert_configs_inserted: usize,
}

struct DemoMention {
    text: &'static str,
    platform: &'static str,
    url: &'static str,
    author: &'static str,
    author_profile: Option<&'static str>,
    hours_ago: i64,
    score: f64,
    label: &'static str,
    confidence: f64,
    keywords: &'static [&'static str],
    likes: i64,
    shares: i64,
    comments: i64,
    views: i64,
    brands: &'static [&'static str],
}

const DEMO_MENTIONS: &[DemoMention] = &[
    DemoMention {
        text: "Acme's new analytics dashboard is excellent. Setup took five minutes and the insights are already paying off.",
        platform: "twitter",
        url: "https://twitter.com/i/status/demo-1",
        author: "data_ops_daily",
        author_profile: Some("https://twitter.com/data_ops_daily"),
        hours_ago: 2,
        score: 0.8,
        label: "positive",
        confidence: 0.9,
        keywords: &["dashboard", "insights"],
        likes: 45,
        shares: 12,
        comments: 8,
        views: 230,
        brands: &["Acme"],
    },
    DemoMention {
        text: "Acme raises the bar for workflow automation with its latest platform release, analysts say.",
        platform: "news",
        url: "https://news.example.com/articles/acme-platform-release",
        author: "Example Tech Desk",
        author_profile: None,
        hours_ago: 6,
        score: 0.65,
        label: "positive",
        confidence: 0.8,
        keywords: &["automation", "release"],
        likes: 0,
        shares: 0,
        comments: 0,
        views: 0,
        brands: &["Acme"],
    },
    DemoMention {
        text: "Disappointed with Acme's latest update. The new interface is confusing and support has been slow to respond.",
        platform: "twitter",
        url: "https://twitter.com/i/status/demo-2",
        author: "frustrated_admin",
        author_profile: Some("https://twitter.com/frustrated_admin"),
        hours_ago: 1,
        score: -0.7,
        label: "negative",
        confidence: 0.85,
        keywords: &["disappointed", "confusing"],
        likes: 12,
        shares: 3,
        comments: 18,
        views: 89,
        brands: &["Acme"],
    },
    DemoMention {
        text: "Anyone else migrating off Acme? Their pricing change caught our team by surprise and the docs are thin.",
        platform: "reddit",
        url: "https://reddit.com/r/sysadmin/comments/demo-3",
        author: "throwaway_infra",
        author_profile: None,
        hours_ago: 3,
        score: -0.5,
        label: "negative",
        confidence: 0.75,
        keywords: &["pricing", "migrating"],
        likes: 34,
        shares: 0,
        comments: 27,
        views: 0,
        brands: &["Acme"],
    },
    DemoMention {
        text: "Acme Labs' matching engine is a game changer for our recruiting workflow. Candidate quality is way up.",
        platform: "news",
        url: "https://news.example.com/articles/acme-labs-matching",
        author: "hiring_weekly",
        author_profile: Some("https://news.example.com/authors/hiring_weekly"),
        hours_ago: 4,
        score: 0.9,
        label: "positive",
        confidence: 0.95,
        keywords: &["matching", "recruiting"],
        likes: 67,
        shares: 25,
        comments: 24,
        views: 245,
        brands: &["Acme", "Acme Labs"],
    },
    DemoMention {
        text: "Mixed feelings about Acme's new features. Some are great, others clearly need more work.",
        platform: "twitter",
        url: "https://twitter.com/i/status/demo-4",
        author: "neutral_reviewer",
        author_profile: Some("https://twitter.com/neutral_reviewer"),
        hours_ago: 1,
        score: 0.1,
        label: "neutral",
        confidence: 0.7,
        keywords: &["features", "review"],
        likes: 15,
        shares: 4,
        comments: 12,
        views: 78,
        brands: &["Acme"],
    },
];

/// Insert demo mentions and a starter alert config. Idempotent: rows that
/// already exist (by natural key, or by config name) are left alone. Runs in
/// one transaction; partial failure rolls everything back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn seed_demo_data(pool: &PgPool) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();
    let now = Utc::now();

    for demo in DEMO_MENTIONS {
        let keywords: Vec<KeywordEntry> = demo
            .keywords
            .iter()
            .map(|word| KeywordEntry::new(*word))
            .collect();
        let brands: Vec<String> = demo.brands.iter().map(ToString::to_string).collect();

        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO mentions \
               (public_id, platform, url, text, author, author_profile, mention_kind, \
                published_at, sentiment_score, sentiment_label, sentiment_confidence, \
                keywords, likes, shares, comments, views, brand_mentions, processed) \
             VALUES ($1, $2, $3, $4, $5, $6, 'brand_discussion', $7, $8, $9, $10, $11, \
                     $12, $13, $14, $15, $16, true) \
             ON CONFLICT (platform, url) DO NOTHING \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(demo.platform)
        .bind(demo.url)
        .bind(demo.text)
        .bind(demo.author)
        .bind(demo.author_profile)
        .bind(now - Duration::hours(demo.hours_ago))
        .bind(demo.score)
        .bind(demo.label)
        .bind(demo.confidence)
        .bind(Json(&keywords))
        .bind(demo.likes)
        .bind(demo.shares)
        .bind(demo.comments)
        .bind(demo.views)
        .bind(&brands)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_some() {
            summary.mentions_inserted += 1;
        }
    }

    let config_inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO alert_configs \
           (public_id, name, description, critical_keywords, monitored_brands, monitored_keywords) \
         SELECT $1, $2, $3, $4, $5, $6 \
         WHERE NOT EXISTS (SELECT 1 FROM alert_configs WHERE name = $2) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind("Acme brand health")
    .bind("Fires on negative sentiment, critical keywords, or unusually high engagement.")
    .bind(vec!["outage".to_string(), "lawsuit".to_string(), "breach".to_string()])
    .bind(vec!["Acme".to_string(), "Acme Labs".to_string()])
    .bind(vec!["workflow automation".to_string()])
    .fetch_optional(&mut *tx)
    .await?;

    if config_inserted.is_some() {
        summary.alert_configs_inserted += 1;
    }

    tx.commit().await?;
    Ok(summary)
}
