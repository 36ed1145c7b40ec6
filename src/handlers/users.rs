//! User account handlers

use axum::{extract::{State, Path}, Json};
use argon2::{Argon2, PasswordHasher};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, AppResult, AppError};
use crate::models::{
    BatchLockResponse, CreateUserRequest, CreateUserResponse, NewUser, UserRiskView,
};

#[derive(Debug, Serialize)]
pub struct LockResponse {
    pub ok: bool,
    pub log_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub ok: bool,
    pub log_id: i64,
    pub purged_entries: u64,
}

/// List users with risk columns. Pending auto-locks are applied first.
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserRiskView>>> {
    let users = state.engine.list_users_with_risk().await?;
    Ok(Json(users))
}

/// Create a user account
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Json<CreateUserResponse>> {
    req.validate()?;

    let (Some(username), Some(password), Some(role)) = (req.username, req.password, req.role) else {
        return Err(AppError::ValidationError("Missing fields".to_string()));
    };

    // Hash password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .to_string();

    let user = state.engine
        .register_user(NewUser { username, password_hash, role })
        .await?;

    Ok(Json(user.into()))
}

/// Administrator lock
pub async fn lock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LockResponse>> {
    let entry = state.engine.manual_lock(id).await?;
    Ok(Json(LockResponse { ok: true, log_id: entry.id }))
}

/// Administrator unlock, resets the user's risk history
pub async fn unlock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UnlockResponse>> {
    let outcome = state.engine.manual_unlock(id).await?;
    Ok(Json(UnlockResponse {
        ok: true,
        log_id: outcome.entry.id,
        purged_entries: outcome.purged_entries,
    }))
}

/// Lock every user at or over the risk threshold in one transaction
pub async fn lock_high_risk(
    State(state): State<AppState>,
) -> AppResult<Json<BatchLockResponse>> {
    let locked = state.engine.batch_lock_high_risk().await?;
    Ok(Json(BatchLockResponse { locked }))
}
