//! Cycle orchestration.

use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;

use brandtrack_db::{
    complete_collection_run, create_collection_run, insert_mention_if_new,
    list_active_alert_configs, mention_exists, KeywordEntry, MentionRow, NewMention, RunCounters,
};
use brandtrack_sentiment::SentimentClient;
use brandtrack_sources::{SearchTerms, SourceAdapter};

use crate::alerts;
use crate::events::{EventSink, PipelineEvent};

/// What one cycle did, regardless of how much of it failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    pub run_id: Option<i64>,
    pub trigger_source: String,
    pub fetched: usize,
    pub new_candidates: usize,
    pub duplicates: usize,
    pub enrichment_failed: usize,
    pub persist_failed: usize,
    pub persisted: usize,
    pub alerts_fired: usize,
    pub per_source: Vec<SourceCount>,
    pub failed_sources: Vec<String>,
}

/// How many mentions one source contributed this cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub fetched: usize,
}

impl CycleSummary {
    fn new(trigger_source: &str) -> Self {
        Self {
            trigger_source: trigger_source.to_string(),
            ..Self::default()
        }
    }

    /// The persisted form of these counters.
    #[must_use]
    pub fn counters(&self) -> RunCounters {
        #[allow(clippy::cast_possible_wrap)]
        RunCounters {
            fetched: self.fetched as i64,
            new_candidates: self.new_candidates as i64,
            duplicates: self.duplicates as i64,
            enrichment_failed: self.enrichment_failed as i64,
            persist_failed: self.persist_failed as i64,
            persisted: self.persisted as i64,
            alerts_fired: self.alerts_fired as i64,
            failed_sources: self.failed_sources.clone(),
        }
    }
}

/// Drives the fetch, dedup, enrich, persist, alert sequence.
pub struct Collector {
    pool: PgPool,
    adapters: Vec<Box<dyn SourceAdapter>>,
    sentiment: SentimentClient,
    sink: Arc<dyn EventSink>,
    terms: SearchTerms,
}

impl Collector {
    #[must_use]
    pub fn new(
        pool: PgPool,
        adapters: Vec<Box<dyn SourceAdapter>>,
        sentiment: SentimentClient,
        sink: Arc<dyn EventSink>,
        terms: SearchTerms,
    ) -> Self {
        for adapter in &adapters {
            if !adapter.is_enabled() {
                tracing::info!(
                    source = adapter.platform().as_str(),
                    "source has no credentials, it will contribute nothing"
                );
            }
        }
        Self {
            pool,
            adapters,
            sentiment,
            sink,
            terms,
        }
    }

    /// Run one full cycle.
    ///
    /// 1. Fetch from every adapter concurrently; a failed source is logged
    ///    and contributes nothing.
    /// 2. Drop candidates whose `(platform, url)` is already persisted, so
    ///    repeats never cost enrichment or re-trigger alerts.
    /// 3. Enrich the rest in batches; a failed text gets the local fallback.
    /// 4. Persist each mention through the guarded insert; conflict losers
    ///    count as duplicates, storage errors as `persist_failed`.
    /// 5. Evaluate active alert configs against the rows this cycle created.
    ///
    /// Every outcome lands in the returned [`CycleSummary`] and, best-effort,
    /// in a `collection_runs` row. No error escapes.
    pub async fn run_cycle(&self, trigger_source: &str) -> CycleSummary {
        let run_id = match create_collection_run(&self.pool, trigger_source).await {
            Ok(run) => Some(run.id),
            Err(error) => {
                tracing::warn!(%error, "collection run record failed");
                None
            }
        };

        self.run_cycle_for(trigger_source, run_id).await
    }

    /// Same as [`run_cycle`](Self::run_cycle), but for a `collection_runs` row
    /// the caller already created. Lets the manual-trigger endpoint answer
    /// with the run id before the cycle finishes.
    pub async fn run_cycle_for(&self, trigger_source: &str, run_id: Option<i64>) -> CycleSummary {
        let mut summary = CycleSummary::new(trigger_source);
        summary.run_id = run_id;

        if self.terms.is_empty() {
            tracing::info!("no monitored brands, keywords, or handles, skipping cycle");
            self.finish_run(&summary).await;
            return summary;
        }

        // Step 1: concurrent fetch.
        let fetches = self.adapters.iter().map(|adapter| async move {
            (adapter.platform(), adapter.fetch(&self.terms).await)
        });
        let outcomes = futures::future::join_all(fetches).await;

        let mut candidates = Vec::new();
        for (platform, outcome) in outcomes {
            match outcome {
                Ok(mentions) => {
                    tracing::debug!(
                        source = platform.as_str(),
                        count = mentions.len(),
                        "source fetch complete"
                    );
                    summary.per_source.push(SourceCount {
                        source: platform.to_string(),
                        fetched: mentions.len(),
                    });
                    candidates.extend(mentions);
                }
                Err(error) => {
                    tracing::warn!(source = platform.as_str(), %error, "source fetch failed");
                    summary.per_source.push(SourceCount {
                        source: platform.to_string(),
                        fetched: 0,
                    });
                    summary.failed_sources.push(platform.to_string());
                }
            }
        }
        summary.fetched = candidates.len();

        // Step 2: dedup against persisted state before paying for enrichment.
        let mut fresh = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match mention_exists(&self.pool, candidate.platform.as_str(), &candidate.url).await {
                Ok(true) => summary.duplicates += 1,
                Ok(false) => fresh.push(candidate),
                Err(error) => {
                    // keep it, the guarded insert still dedups
                    tracing::warn!(url = %candidate.url, %error, "existence probe failed");
                    fresh.push(candidate);
                }
            }
        }
        summary.new_candidates = fresh.len();

        // Step 3: batched enrichment.
        let texts: Vec<String> = fresh.iter().map(|m| m.text.clone()).collect();
        let verdicts = self.sentiment.analyze_batch(&texts).await;

        // Step 4: persist.
        let mut persisted_rows: Vec<MentionRow> = Vec::new();
        for (raw, verdict) in fresh.iter().zip(&verdicts) {
            if verdict.fallback {
                summary.enrichment_failed += 1;
            }
            let keywords: Vec<KeywordEntry> = verdict
                .analysis
                .keywords
                .iter()
                .cloned()
                .map(KeywordEntry::new)
                .collect();
            let new_mention = NewMention {
                platform: raw.platform.as_str(),
                url: &raw.url,
                text: &raw.text,
                author: &raw.author,
                author_profile: raw.author_profile.as_deref(),
                mention_kind: raw.kind.as_str(),
                published_at: raw.published_at,
                sentiment_score: verdict.analysis.judgment.score,
                sentiment_label: verdict.analysis.judgment.label.as_str(),
                sentiment_confidence: verdict.analysis.judgment.confidence,
                keywords: &keywords,
                likes: raw.engagement.likes,
                shares: raw.engagement.shares,
                comments: raw.engagement.comments,
                views: raw.engagement.views,
                brand_mentions: &raw.brand_mentions,
                processed: true,
            };

            match insert_mention_if_new(&self.pool, &new_mention).await {
                Ok(Some(row)) => {
                    summary.persisted += 1;
                    self.sink
                        .publish(PipelineEvent::MentionPersisted {
                            mention_id: row.id,
                            public_id: row.public_id,
                            platform: row.platform.clone(),
                            sentiment_label: row.sentiment_label.clone(),
                        })
                        .await;
                    persisted_rows.push(row);
                }
                Ok(None) => summary.duplicates += 1,
                Err(error) => {
                    tracing::warn!(url = %raw.url, %error, "mention insert failed");
                    summary.persist_failed += 1;
                }
            }
        }

        // Step 5: alerting over this cycle's new rows.
        if !persisted_rows.is_empty() {
            match list_active_alert_configs(&self.pool).await {
                Ok(configs) => {
                    summary.alerts_fired = alerts::process_alerts(
                        &self.pool,
                        self.sink.as_ref(),
                        &configs,
                        &persisted_rows,
                    )
                    .await;
                }
                Err(error) => tracing::warn!(%error, "alert config load failed"),
            }
        }

        self.finish_run(&summary).await;
        tracing::info!(
            trigger = trigger_source,
            fetched = summary.fetched,
            new = summary.new_candidates,
            duplicates = summary.duplicates,
            enrichment_failed = summary.enrichment_failed,
            persisted = summary.persisted,
            persist_failed = summary.persist_failed,
            alerts_fired = summary.alerts_fired,
            failed_sources = ?summary.failed_sources,
            "collection cycle complete"
        );
        summary
    }

    async fn finish_run(&self, summary: &CycleSummary) {
        let Some(run_id) = summary.run_id else {
            return;
        };
        if let Err(error) = complete_collection_run(&self.pool, run_id, &summary.counters()).await {
            tracing::warn!(run_id, %error, "collection run completion failed");
        }
    }
}
