//! User account model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub failed_login_attempts: i32,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed role set. `Admin` is the distinguished administrative role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Security,
    Auditor,
    Developer,
    Guest,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Security,
        Role::Auditor,
        Role::Developer,
        Role::Guest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Security => "security",
            Self::Auditor => "auditor",
            Self::Developer => "developer",
            Self::Guest => "guest",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Full database access - all operations",
            Self::Security => "Read access to audit log and suspicious activity",
            Self::Auditor => "Read-only access to all tables",
            Self::Developer => "Read/write handler routines, read user accounts",
            Self::Guest => "Read-only access to the role table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Locked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Locked => "LOCKED",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleInfo {
    pub role: Role,
    pub description: &'static str,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            role,
            description: role.description(),
        }
    }
}

/// Body of `POST /api/v1/users`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(required(message = "username is required"), length(min = 1, max = 100))]
    pub username: Option<String>,
    #[validate(required(message = "password is required"), length(min = 1))]
    pub password: Option<String>,
    #[validate(required(message = "role is required"))]
    pub role: Option<Role>,
}

/// Validated account data; the password is already digested
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub status: UserStatus,
}

impl From<UserAccount> for CreateUserResponse {
    fn from(user: UserAccount) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            status: user.status,
        }
    }
}

/// One row of the risk-annotated user listing
#[derive(Debug, Clone, Serialize)]
pub struct UserRiskView {
    #[serde(flatten)]
    pub user: UserAccount,
    pub high_severity_count: i64,
    pub recent_high_count: i64,
    pub risk_score: u32,
    pub should_auto_lock: bool,
    /// Locked by the reconcile pass of this same request
    pub auto_locked: bool,
}

/// Outcome of `POST /api/v1/users/lock-high-risk`
#[derive(Debug, Serialize)]
pub struct BatchLockResponse {
    pub locked: Vec<Uuid>,
}
