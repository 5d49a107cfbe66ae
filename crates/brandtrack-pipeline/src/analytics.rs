//! Windowed aggregations over persisted mentions.
//!
//! Everything here is a pure function over rows the database already
//! fetched; handlers pick the window, `list_mentions_since` supplies the
//! corpus. Empty inputs produce zeroes, never NaN.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use brandtrack_core::text::truncate_chars;
use brandtrack_db::MentionRow;

const TOP_KEYWORDS: usize = 10;
const TOP_LEADERS: usize = 10;
const SNIPPET_CHARS: usize = 140;

/// Lookback window accepted by the analytics endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TimeWindow {
    #[serde(rename = "1h")]
    Hour,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

#[derive(Debug, Error)]
#[error("unknown analytics window: {0}")]
pub struct UnknownWindow(String);

impl TimeWindow {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Hour => "1h",
            TimeWindow::Day => "24h",
            TimeWindow::Week => "7d",
            TimeWindow::Month => "30d",
        }
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            TimeWindow::Hour => Duration::hours(1),
            TimeWindow::Day => Duration::hours(24),
            TimeWindow::Week => Duration::days(7),
            TimeWindow::Month => Duration::days(30),
        }
    }

    /// Beginning of the window, looking back from `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }

    /// Trend resolution: hour buckets for the short windows, day buckets for
    /// the long ones.
    fn bucket_seconds(self) -> i64 {
        match self {
            TimeWindow::Hour | TimeWindow::Day => 3_600,
            TimeWindow::Week | TimeWindow::Month => 86_400,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = UnknownWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(TimeWindow::Hour),
            "24h" => Ok(TimeWindow::Day),
            "7d" => Ok(TimeWindow::Week),
            "30d" => Ok(TimeWindow::Month),
            _ => Err(UnknownWindow(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LabelStats {
    pub count: usize,
    pub percentage: f64,
    pub average_score: f64,
    pub average_confidence: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SentimentBreakdown {
    pub positive: LabelStats,
    pub negative: LabelStats,
    pub neutral: LabelStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub platform: String,
    pub count: usize,
    pub average_sentiment: f64,
    /// Weighted engagement summed over the platform's mentions.
    pub engagement: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordStats {
    pub keyword: String,
    pub count: usize,
    pub average_relevance: f64,
    pub average_sentiment: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub bucket: DateTime<Utc>,
    pub count: usize,
    pub average_sentiment: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub window: TimeWindow,
    pub total_mentions: usize,
    pub average_sentiment: f64,
    pub sentiment: SentimentBreakdown,
    pub platforms: Vec<PlatformStats>,
    pub most_active_platform: Option<String>,
    pub top_keywords: Vec<KeywordStats>,
    pub trend: Vec<TrendPoint>,
}

/// Aggregate one window's mentions into the dashboard shape.
#[must_use]
pub fn dashboard_summary(window: TimeWindow, rows: &[MentionRow]) -> DashboardSummary {
    let total = rows.len();
    let score_sum: f64 = rows.iter().map(|row| row.sentiment_score).sum();

    let platforms = platform_stats(rows);
    let mut most_active_platform = None;
    let mut best_count = 0;
    for stats in &platforms {
        if stats.count > best_count {
            best_count = stats.count;
            most_active_platform = Some(stats.platform.clone());
        }
    }

    DashboardSummary {
        window,
        total_mentions: total,
        average_sentiment: ratio(score_sum, total),
        sentiment: SentimentBreakdown {
            positive: label_stats(rows, total, "positive"),
            negative: label_stats(rows, total, "negative"),
            neutral: label_stats(rows, total, "neutral"),
        },
        platforms,
        most_active_platform,
        top_keywords: keyword_stats(rows),
        trend: trend(window, rows),
    }
}

fn label_stats(rows: &[MentionRow], total: usize, label: &str) -> LabelStats {
    let mut count = 0;
    let mut score_sum = 0.0;
    let mut confidence_sum = 0.0;
    for row in rows.iter().filter(|row| row.sentiment_label == label) {
        count += 1;
        score_sum += row.sentiment_score;
        confidence_sum += row.sentiment_confidence;
    }
    LabelStats {
        count,
        percentage: percentage(count, total),
        average_score: ratio(score_sum, count),
        average_confidence: ratio(confidence_sum, count),
    }
}

fn platform_stats(rows: &[MentionRow]) -> Vec<PlatformStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, (usize, f64, f64)> = HashMap::new();
    for row in rows {
        let entry = grouped.entry(row.platform.as_str()).or_insert((0, 0.0, 0.0));
        if entry.0 == 0 {
            order.push(row.platform.as_str());
        }
        entry.0 += 1;
        entry.1 += row.sentiment_score;
        entry.2 += row.engagement_score();
    }

    order
        .into_iter()
        .map(|platform| {
            let (count, score_sum, engagement) = grouped[platform];
            PlatformStats {
                platform: platform.to_string(),
                count,
                average_sentiment: ratio(score_sum, count),
                engagement,
            }
        })
        .collect()
}

fn keyword_stats(rows: &[MentionRow]) -> Vec<KeywordStats> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, (usize, f64, f64)> = HashMap::new();
    for row in rows {
        for entry in row.keywords.iter() {
            let slot = grouped.entry(entry.word.clone()).or_insert((0, 0.0, 0.0));
            if slot.0 == 0 {
                order.push(entry.word.clone());
            }
            slot.0 += 1;
            slot.1 += entry.relevance;
            slot.2 += row.sentiment_score;
        }
    }

    // stable sort preserves first-occurrence order within equal counts
    order.sort_by_key(|word| std::cmp::Reverse(grouped[word].0));
    order.truncate(TOP_KEYWORDS);
    order
        .into_iter()
        .map(|keyword| {
            let (count, relevance_sum, score_sum) = grouped[&keyword];
            KeywordStats {
                keyword,
                count,
                average_relevance: ratio(relevance_sum, count),
                average_sentiment: ratio(score_sum, count),
            }
        })
        .collect()
}

fn trend(window: TimeWindow, rows: &[MentionRow]) -> Vec<TrendPoint> {
    let bucket_seconds = window.bucket_seconds();
    let mut grouped: HashMap<i64, (usize, f64)> = HashMap::new();
    for row in rows {
        let ts = row.published_at.timestamp();
        let bucket = ts - ts.rem_euclid(bucket_seconds);
        let entry = grouped.entry(bucket).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += row.sentiment_score;
    }

    let mut buckets: Vec<i64> = grouped.keys().copied().collect();
    buckets.sort_unstable();
    buckets
        .into_iter()
        .filter_map(|secs| {
            let (count, score_sum) = grouped[&secs];
            DateTime::from_timestamp(secs, 0).map(|bucket| TrendPoint {
                bucket,
                count,
                average_sentiment: ratio(score_sum, count),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct EngagementLeader {
    pub public_id: Uuid,
    pub platform: String,
    pub url: String,
    pub author: String,
    pub snippet: String,
    pub sentiment_label: String,
    pub engagement_score: f64,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformEngagement {
    pub platform: String,
    pub mentions: usize,
    pub total_engagement: f64,
    pub average_engagement: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementReport {
    pub window: TimeWindow,
    pub leaders: Vec<EngagementLeader>,
    pub platforms: Vec<PlatformEngagement>,
}

/// Top mentions by weighted engagement plus per-platform totals.
#[must_use]
pub fn engagement_report(window: TimeWindow, rows: &[MentionRow]) -> EngagementReport {
    let mut leaders: Vec<EngagementLeader> = rows
        .iter()
        .map(|row| EngagementLeader {
            public_id: row.public_id,
            platform: row.platform.clone(),
            url: row.url.clone(),
            author: row.author.clone(),
            snippet: truncate_chars(&row.text, SNIPPET_CHARS).to_string(),
            sentiment_label: row.sentiment_label.clone(),
            engagement_score: row.engagement_score(),
            published_at: row.published_at,
        })
        .collect();
    leaders.sort_by(|a, b| b.engagement_score.total_cmp(&a.engagement_score));
    leaders.truncate(TOP_LEADERS);

    let mut order: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, (usize, f64)> = HashMap::new();
    for row in rows {
        let entry = grouped.entry(row.platform.as_str()).or_insert((0, 0.0));
        if entry.0 == 0 {
            order.push(row.platform.as_str());
        }
        entry.0 += 1;
        entry.1 += row.engagement_score();
    }
    let platforms = order
        .into_iter()
        .map(|platform| {
            let (mentions, total_engagement) = grouped[platform];
            PlatformEngagement {
                platform: platform.to_string(),
                mentions,
                total_engagement,
                average_engagement: ratio(total_engagement, mentions),
            }
        })
        .collect();

    EngagementReport {
        window,
        leaders,
        platforms,
    }
}

// ---------------------------------------------------------------------------
// Shared math
// ---------------------------------------------------------------------------

/// Percentage of `part` in `total`, rounded to one decimal. Zero when the
/// total is zero.
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// `sum / count`, zero when the count is zero.
fn ratio(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let denom = count as f64;
    sum / denom
}
