//! Client for the hosted generate-content sentiment model.

use std::time::Duration;

use brandtrack_core::text::truncate_chars;
use brandtrack_core::{AppConfig, SentimentJudgment, SentimentLabel};
use reqwest::Client;
use serde::Deserialize;

use crate::{fallback, EnrichedSentiment, SentimentAnalysis, SentimentError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_PAUSE: Duration = Duration::from_millis(500);
/// Longest text forwarded to the model, in characters.
const MAX_PROMPT_CHARS: usize = 4000;
const MAX_KEYWORDS: usize = 5;

/// Sentiment analyzer backed by a generate-content endpoint.
///
/// Without an API key the client is constructed disabled and every call is
/// answered by [`fallback::analyze`].
pub struct SentimentClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_attempts: u32,
    batch_size: usize,
    batch_delay: Duration,
}

impl SentimentClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, SentimentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.into(),
            max_attempts: 3,
            batch_size: 5,
            batch_delay: Duration::from_millis(1000),
        })
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, SentimentError> {
        let client = Self::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            config.enrich_timeout_secs,
        )?;
        Ok(client
            .with_attempts(config.enrich_max_attempts)
            .with_batch_policy(config.enrich_batch_size, config.enrich_batch_delay_ms))
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_batch_policy(mut self, size: usize, delay_ms: u64) -> Self {
        self.batch_size = size.max(1);
        self.batch_delay = Duration::from_millis(delay_ms);
        self
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Analyze one text. Retries transient upstream failures a bounded
    /// number of times, then answers with the local heuristic. Never fails.
    pub async fn analyze(&self, text: &str) -> EnrichedSentiment {
        let Some(key) = self.api_key.as_deref() else {
            return EnrichedSentiment {
                analysis: fallback::analyze(text),
                fallback: true,
            };
        };

        let mut last_error = None;
        for attempt in 1..=self.max_attempts {
            match self.request_analysis(key, text).await {
                Ok(analysis) => {
                    return EnrichedSentiment {
                        analysis,
                        fallback: false,
                    };
                }
                Err(error) => {
                    tracing::debug!(attempt, %error, "sentiment attempt failed");
                    last_error = Some(error);
                    if attempt < self.max_attempts {
                        tokio::time::sleep(RETRY_PAUSE).await;
                    }
                }
            }
        }

        if let Some(error) = last_error {
            tracing::warn!(%error, "sentiment analysis exhausted attempts, falling back");
        }
        EnrichedSentiment {
            analysis: fallback::analyze(text),
            fallback: true,
        }
    }

    /// Analyze texts in fixed-size groups, pausing between groups to stay
    /// under upstream rate limits. Results line up with the input order.
    pub async fn analyze_batch(&self, texts: &[String]) -> Vec<EnrichedSentiment> {
        let mut results = Vec::with_capacity(texts.len());
        for (index, group) in texts.chunks(self.batch_size).enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            let analyses = group.iter().map(|text| self.analyze(text));
            results.extend(futures::future::join_all(analyses).await);
        }
        results
    }

    async fn request_analysis(
        &self,
        key: &str,
        text: &str,
    ) -> Result<SentimentAnalysis, SentimentError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(text) }] }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SentimentError::Upstream(format!(
                "status {}",
                response.status()
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Parse(format!("response envelope: {e}")))?;
        let verdict = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| SentimentError::Parse("response had no candidates".to_string()))?;
        parse_analysis(&verdict)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    score: f64,
    label: Option<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    keywords: Vec<String>,
    reasoning: Option<String>,
}

fn build_prompt(text: &str) -> String {
    let text = truncate_chars(text, MAX_PROMPT_CHARS);
    format!(
        "Analyze the sentiment of the following text about a brand or product.\n\
         Return a JSON object with:\n\
         - score: number between -1 (very negative) and 1 (very positive)\n\
         - label: \"positive\", \"negative\", or \"neutral\"\n\
         - confidence: number between 0 and 1\n\
         - keywords: array of relevant keywords or topics (max 5)\n\
         - reasoning: brief explanation\n\n\
         Text: \"{text}\"\n\n\
         Respond with valid JSON only, no additional text."
    )
}

/// Models wrap JSON answers in markdown fences often enough that we always
/// strip them before parsing.
fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

fn parse_analysis(raw: &str) -> Result<SentimentAnalysis, SentimentError> {
    let cleaned = strip_code_fences(raw);
    let parsed: RawAnalysis = serde_json::from_str(cleaned)
        .map_err(|e| SentimentError::Parse(format!("analysis json: {e}")))?;

    let label = parsed
        .label
        .as_deref()
        .and_then(|label| label.parse::<SentimentLabel>().ok())
        .unwrap_or(SentimentLabel::Neutral);
    let mut keywords = parsed.keywords;
    keywords.truncate(MAX_KEYWORDS);

    Ok(SentimentAnalysis {
        judgment: SentimentJudgment {
            score: parsed.score.clamp(-1.0, 1.0),
            label,
            confidence: parsed.confidence.clamp(0.0, 1.0),
        },
        keywords,
        reasoning: parsed
            .reasoning
            .unwrap_or_else(|| "No reasoning provided".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_plain_fences() {
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn leaves_bare_json_alone() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn parses_a_complete_verdict() {
        let analysis = parse_analysis(
            r#"{"score": 0.7, "label": "positive", "confidence": 0.9,
                "keywords": ["launch", "pricing"], "reasoning": "enthusiastic"}"#,
        )
        .unwrap();
        assert!((analysis.judgment.score - 0.7).abs() < 1e-9);
        assert_eq!(analysis.judgment.label, SentimentLabel::Positive);
        assert_eq!(analysis.keywords, vec!["launch", "pricing"]);
        assert_eq!(analysis.reasoning, "enthusiastic");
    }

    #[test]
    fn clamps_out_of_range_numbers() {
        let analysis = parse_analysis(r#"{"score": 3.5, "label": "negative", "confidence": 1.7}"#)
            .unwrap();
        assert!((analysis.judgment.score - 1.0).abs() < 1e-9);
        assert!((analysis.judgment.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn truncates_keywords_to_five() {
        let analysis = parse_analysis(
            r#"{"score": 0, "label": "neutral", "confidence": 0.5,
                "keywords": ["a", "b", "c", "d", "e", "f", "g"]}"#,
        )
        .unwrap();
        assert_eq!(analysis.keywords.len(), 5);
    }

    #[test]
    fn unknown_label_becomes_neutral() {
        let analysis =
            parse_analysis(r#"{"score": 0.2, "label": "ecstatic", "confidence": 0.4}"#).unwrap();
        assert_eq!(analysis.judgment.label, SentimentLabel::Neutral);
    }

    #[test]
    fn missing_reasoning_gets_a_placeholder() {
        let analysis = parse_analysis(r#"{"score": 0, "label": "neutral"}"#).unwrap();
        assert_eq!(analysis.reasoning, "No reasoning provided");
    }

    #[test]
    fn non_json_verdict_is_a_parse_error() {
        let result = parse_analysis("the text is quite positive overall");
        assert!(matches!(result, Err(SentimentError::Parse(_))));
    }

    #[test]
    fn prompt_demands_json_and_embeds_the_text() {
        let prompt = build_prompt("Acme shipped");
        assert!(prompt.contains("Text: \"Acme shipped\""));
        assert!(prompt.contains("Respond with valid JSON only"));
    }
}
