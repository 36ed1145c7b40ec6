//! Audit log handlers

use axum::{extract::State, Json};
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::engine::QuerySubmission;
use crate::models::{AuditLogView, SubmitQueryRequest, SubmitQueryResponse};

/// Size of the audit log listing
const RECENT_LOG_LIMIT: i64 = 200;

/// Latest audit entries with their routine
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AuditLogView>>> {
    let logs = state.engine.recent_logs(RECENT_LOG_LIMIT).await?;
    Ok(Json(logs))
}

/// Classify a submitted query and log it against its handler routine
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitQueryRequest>,
) -> AppResult<Json<SubmitQueryResponse>> {
    req.validate()?;

    let (Some(user_id), Some(query)) = (req.user_id, req.query) else {
        return Err(AppError::ValidationError("Missing fields".to_string()));
    };

    let outcome = state.engine
        .submit_query(QuerySubmission {
            user_id,
            query,
            severity_override: req.severity,
        })
        .await?;

    Ok(Json(SubmitQueryResponse {
        log_id: outcome.log_id,
        handler_routine: outcome.routine,
    }))
}
