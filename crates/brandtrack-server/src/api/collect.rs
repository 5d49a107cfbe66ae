//! POST /api/v1/collect — trigger a collection cycle out of band.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct CollectResponse {
    pub collection_run_id: Uuid,
    pub status: String,
}

/// The run row is created up front so the caller gets its id immediately;
/// the cycle runs detached and completes the row when it finishes.
pub(super) async fn trigger_collect(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<CollectResponse>>), ApiError> {
    let run = brandtrack_db::create_collection_run(&state.pool, "manual")
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let collector = Arc::clone(&state.collector);
    let run_id = run.id;
    tokio::spawn(async move {
        collector.run_cycle_for("manual", Some(run_id)).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: CollectResponse {
                collection_run_id: run.public_id,
                status: run.status,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
