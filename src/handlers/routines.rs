//! Handler routine catalog handlers

use axum::{extract::State, Json};

use crate::{AppState, AppResult};
use crate::models::{HandlerRoutine, RoutineStats};

/// List routines, HIGH severity first
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<HandlerRoutine>>> {
    let routines = state.engine.routines().await?;
    Ok(Json(routines))
}

/// Usage count per routine
pub async fn stats(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RoutineStats>>> {
    let stats = state.engine.routine_stats().await?;
    Ok(Json(stats))
}
