//! Roles handler

use axum::Json;

use crate::models::{Role, RoleInfo};

/// List the closed role set
pub async fn list() -> Json<Vec<RoleInfo>> {
    Json(Role::ALL.into_iter().map(RoleInfo::from).collect())
}
