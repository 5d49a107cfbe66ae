use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// External source a mention was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Reddit,
    News,
    Web,
    Other,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::Reddit => "reddit",
            Platform::News => "news",
            Platform::Web => "web",
            Platform::Other => "other",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "twitter" => Ok(Platform::Twitter),
            "reddit" => Ok(Platform::Reddit),
            "news" => Ok(Platform::News),
            "web" => Ok(Platform::Web),
            "other" => Ok(Platform::Other),
            _ => Err(CoreError::InvalidPlatform(s.to_string())),
        }
    }
}

/// Sentiment classification attached to every enriched mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SentimentLabel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(SentimentLabel::Positive),
            "negative" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            _ => Err(CoreError::InvalidSentimentLabel(s.to_string())),
        }
    }
}

/// How a mention relates to the monitored entity. Only sources that expose
/// author identity can distinguish official posts and direct mentions;
/// everything else is general brand discussion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    Official,
    #[serde(rename = "mention")]
    DirectMention,
    #[default]
    BrandDiscussion,
}

impl MentionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MentionKind::Official => "official",
            MentionKind::DirectMention => "mention",
            MentionKind::BrandDiscussion => "brand_discussion",
        }
    }
}

impl std::str::FromStr for MentionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "official" => Ok(MentionKind::Official),
            "mention" => Ok(MentionKind::DirectMention),
            "brand_discussion" => Ok(MentionKind::BrandDiscussion),
            _ => Err(CoreError::InvalidMentionKind(s.to_string())),
        }
    }
}

/// Raw engagement counters as reported by a source. Sources without a concept
/// of a counter report zero for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub views: i64,
}

impl Engagement {
    /// Weighted engagement score used for alert thresholds and ranking.
    /// Derived on demand, never persisted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(self) -> f64 {
        self.likes as f64
            + 2.0 * self.shares as f64
            + 1.5 * self.comments as f64
            + 0.1 * self.views as f64
    }
}

/// Sentiment judgment in its persisted form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentJudgment {
    /// Polarity in [-1.0, 1.0].
    pub score: f64,
    pub label: SentimentLabel,
    /// Upstream confidence in [0.0, 1.0].
    pub confidence: f64,
}

impl Default for SentimentJudgment {
    fn default() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            confidence: 0.0,
        }
    }
}

/// A normalized mention candidate as produced by a source adapter, before
/// enrichment and persistence. (platform, url) is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMention {
    pub platform: Platform,
    pub url: String,
    pub text: String,
    pub author: String,
    pub author_profile: Option<String>,
    pub published_at: DateTime<Utc>,
    pub engagement: Engagement,
    /// Monitored terms matched in the text, term-list order, deduplicated.
    pub brand_mentions: Vec<String>,
    pub kind: MentionKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips() {
        for platform in [
            Platform::Twitter,
            Platform::Reddit,
            Platform::News,
            Platform::Web,
            Platform::Other,
        ] {
            let parsed: Platform = platform.as_str().parse().unwrap();
            assert_eq!(parsed, platform);
        }
    }

    #[test]
    fn platform_rejects_unknown() {
        assert!("mastodon".parse::<Platform>().is_err());
    }

    #[test]
    fn sentiment_label_round_trips() {
        for label in [
            SentimentLabel::Positive,
            SentimentLabel::Negative,
            SentimentLabel::Neutral,
        ] {
            let parsed: SentimentLabel = label.as_str().parse().unwrap();
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn mention_kind_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&MentionKind::DirectMention).unwrap(),
            "\"mention\""
        );
        assert_eq!(
            serde_json::to_string(&MentionKind::BrandDiscussion).unwrap(),
            "\"brand_discussion\""
        );
        let parsed: MentionKind = serde_json::from_str("\"official\"").unwrap();
        assert_eq!(parsed, MentionKind::Official);
    }

    #[test]
    fn mention_kind_defaults_to_discussion() {
        assert_eq!(MentionKind::default(), MentionKind::BrandDiscussion);
    }

    #[test]
    fn engagement_score_applies_weights() {
        let engagement = Engagement {
            likes: 10,
            shares: 5,
            comments: 4,
            views: 100,
        };
        let expected = 10.0 + 2.0 * 5.0 + 1.5 * 4.0 + 0.1 * 100.0;
        assert!((engagement.score() - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn engagement_score_zero_when_empty() {
        assert!((Engagement::default().score() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn platform_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Platform::Twitter).unwrap(),
            "\"twitter\""
        );
        let parsed: Platform = serde_json::from_str("\"news\"").unwrap();
        assert_eq!(parsed, Platform::News);
    }
}
