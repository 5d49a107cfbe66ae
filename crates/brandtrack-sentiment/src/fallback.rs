//! Deterministic lexicon heuristic used when the upstream analyzer is
//! unavailable or fails.

use std::collections::HashMap;

use brandtrack_core::{SentimentJudgment, SentimentLabel};

use crate::SentimentAnalysis;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "love",
    "best",
    "awesome",
    "fantastic",
    "perfect",
    "outstanding",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "hate",
    "worst",
    "horrible",
    "disappointing",
    "useless",
    "broken",
    "failed",
];

const STOP_WORDS: &[&str] = &[
    "this", "that", "with", "have", "will", "from", "they", "been", "said", "each", "than",
    "like", "more",
];

const MAX_KEYWORDS: usize = 5;

/// Score a text by counting lexicon hits. Matching is case-insensitive and
/// substring-based, so "badge" counts as a "bad" hit. Same text, same
/// verdict, always.
#[must_use]
pub fn analyze(text: &str) -> SentimentAnalysis {
    let lower = text.to_lowercase();
    let positives = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negatives = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    #[allow(clippy::cast_precision_loss)]
    let (score, label) = if positives > negatives {
        ((0.2 * positives as f64).min(0.8), SentimentLabel::Positive)
    } else if negatives > positives {
        ((-0.2 * negatives as f64).max(-0.8), SentimentLabel::Negative)
    } else {
        (0.0, SentimentLabel::Neutral)
    };

    #[allow(clippy::cast_precision_loss)]
    let confidence = (0.1 * (positives + negatives) as f64).min(0.6);

    SentimentAnalysis {
        judgment: SentimentJudgment {
            score,
            label,
            confidence,
        },
        keywords: extract_keywords(text),
        reasoning: "Keyword-based fallback analysis".to_string(),
    }
}

/// Most frequent words longer than three characters, stop words excluded.
/// Ties keep first-occurrence order.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for word in lower.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if word.len() <= 3 || STOP_WORDS.contains(&word) {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }
    // stable sort preserves first-occurrence order within equal counts
    order.sort_by_key(|word| std::cmp::Reverse(counts[word]));
    order.truncate(MAX_KEYWORDS);
    order.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_text_is_neutral() {
        let analysis = analyze("");
        assert_eq!(analysis.judgment.label, SentimentLabel::Neutral);
        assert!(close(analysis.judgment.score, 0.0));
        assert!(close(analysis.judgment.confidence, 0.0));
        assert!(analysis.keywords.is_empty());
    }

    #[test]
    fn positive_hits_raise_the_score() {
        let analysis = analyze("I love this release, great work and an amazing dashboard");
        assert_eq!(analysis.judgment.label, SentimentLabel::Positive);
        assert!(close(analysis.judgment.score, 0.6));
        assert!(close(analysis.judgment.confidence, 0.3));
    }

    #[test]
    fn negative_hits_lower_the_score() {
        let analysis = analyze("terrible update, broken sync, awful support");
        assert_eq!(analysis.judgment.label, SentimentLabel::Negative);
        assert!(close(analysis.judgment.score, -0.6));
    }

    #[test]
    fn score_is_capped_at_plus_minus_point_eight() {
        let gushing = analyze("good great excellent amazing love it");
        assert!(close(gushing.judgment.score, 0.8));

        let scathing = analyze("bad terrible awful horrible broken failed");
        assert!(close(scathing.judgment.score, -0.8));
    }

    #[test]
    fn balanced_hits_stay_neutral() {
        let analysis = analyze("good idea but broken execution");
        assert_eq!(analysis.judgment.label, SentimentLabel::Neutral);
        assert!(close(analysis.judgment.score, 0.0));
        assert!(close(analysis.judgment.confidence, 0.2));
    }

    #[test]
    fn confidence_is_capped_at_point_six() {
        let analysis = analyze("good great excellent amazing love best awesome");
        assert!(close(analysis.judgment.confidence, 0.6));
    }

    #[test]
    fn matching_is_substring_based() {
        // "badge" contains "bad"
        let analysis = analyze("collected a new badge today");
        assert_eq!(analysis.judgment.label, SentimentLabel::Negative);
        assert!(close(analysis.judgment.score, -0.2));
    }

    #[test]
    fn same_text_same_verdict() {
        let text = "the new workflow builder failed twice but support was great";
        assert_eq!(analyze(text), analyze(text));
    }

    #[test]
    fn keywords_rank_by_frequency() {
        let keywords =
            extract_keywords("launch launch launch dashboard dashboard pricing");
        assert_eq!(keywords, vec!["launch", "dashboard", "pricing"]);
    }

    #[test]
    fn keyword_ties_keep_first_occurrence() {
        let keywords = extract_keywords("zebra apple zebra apple banana");
        assert_eq!(keywords, vec!["zebra", "apple", "banana"]);
    }

    #[test]
    fn keywords_skip_short_and_stop_words() {
        let keywords = extract_keywords("this that with from tiny cat dashboard");
        assert_eq!(keywords, vec!["tiny", "dashboard"]);
    }

    #[test]
    fn keywords_are_limited_to_five() {
        let keywords =
            extract_keywords("alpha bravo charlie delta echelon foxtrot");
        assert_eq!(keywords.len(), 5);
        assert_eq!(keywords[0], "alpha");
    }

    #[test]
    fn keywords_are_lowercased_and_stripped_of_punctuation() {
        let keywords = extract_keywords("Dashboard! DASHBOARD? dashboard.");
        assert_eq!(keywords, vec!["dashboard"]);
    }
}
