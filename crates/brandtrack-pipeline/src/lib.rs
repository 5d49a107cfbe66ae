//! Collection pipeline: fetch, dedup, enrich, persist, alert.
//!
//! [`Collector::run_cycle`] drives one full pass and always comes back with a
//! [`CycleSummary`]; partial failures are logged and counted, never raised.
//! The evaluator in [`alerts`] and the aggregations in [`analytics`] are pure
//! functions so they can be tested without a database.

pub mod alerts;
pub mod analytics;
pub mod collector;
pub mod events;

pub use alerts::{evaluate, synthetic_test_mention, AlertDecision};
pub use analytics::{
    dashboard_summary, engagement_report, DashboardSummary, EngagementReport, TimeWindow,
};
pub use collector::{Collector, CycleSummary, SourceCount};
pub use events::{BroadcastSink, EventSink, NullSink, PipelineEvent};
