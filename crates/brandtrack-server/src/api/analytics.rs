//! Windowed analytics endpoints, computed on read from the mention store.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use brandtrack_pipeline::{DashboardSummary, EngagementReport, TimeWindow};
use chrono::Utc;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct WindowQuery {
    pub window: Option<String>,
}

fn parse_window(request_id: &str, raw: Option<&str>) -> Result<TimeWindow, ApiError> {
    match raw {
        Some(value) => value
            .parse::<TimeWindow>()
            .map_err(|e| ApiError::new(request_id, "validation_error", e.to_string())),
        None => Ok(TimeWindow::default()),
    }
}

pub(super) async fn dashboard_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let window = parse_window(&req_id.0, query.window.as_deref())?;

    let rows = brandtrack_db::list_mentions_since(&state.pool, window.start(Utc::now()))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: brandtrack_pipeline::dashboard_summary(window, &rows),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn engagement_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<EngagementReport>>, ApiError> {
    let window = parse_window(&req_id.0, query.window.as_deref())?;

    let rows = brandtrack_db::list_mentions_since(&state.pool, window.start(Utc::now()))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: brandtrack_pipeline::engagement_report(window, &rows),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_window_defaults_to_a_day() {
        assert_eq!(parse_window("req-1", None).expect("window"), TimeWindow::Day);
    }

    #[test]
    fn parse_window_accepts_every_documented_value() {
        for (raw, expected) in [
            ("1h", TimeWindow::Hour),
            ("24h", TimeWindow::Day),
            ("7d", TimeWindow::Week),
            ("30d", TimeWindow::Month),
        ] {
            assert_eq!(parse_window("req-1", Some(raw)).expect("window"), expected);
        }
    }

    #[test]
    fn parse_window_rejects_unknown_values() {
        let err = parse_window("req-1", Some("90d")).expect_err("should reject");
        assert_eq!(err.error.code, "validation_error");
        assert!(err.error.message.contains("90d"));
    }
}
