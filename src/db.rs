//! Database module - PostgreSQL connection, schema and catalog seed

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::models::default_catalog;

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Apply the schema and seed the handler routine catalog
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");

    seed_routines(pool).await
}

/// Insert any missing default routine. Existing rows are left untouched.
async fn seed_routines(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut inserted = 0u64;

    for seed in default_catalog() {
        let result = sqlx::query(
            r#"
            INSERT INTO handler_routines
                (routine_name, threat_type, response_action, severity, description, auto_lock, notify_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (threat_type) DO NOTHING
            "#
        )
        .bind(seed.routine_name)
        .bind(seed.threat_type)
        .bind(seed.response_action)
        .bind(seed.severity)
        .bind(seed.description)
        .bind(seed.auto_lock)
        .bind(seed.notify_admin)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    tracing::info!("Handler routine catalog seeded ({} new)", inserted);
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- User accounts
CREATE TABLE IF NOT EXISTS user_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(100) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    role VARCHAR(20) NOT NULL DEFAULT 'guest'
        CHECK (role IN ('admin', 'security', 'auditor', 'developer', 'guest')),
    status VARCHAR(10) NOT NULL DEFAULT 'ACTIVE'
        CHECK (status IN ('ACTIVE', 'LOCKED')),
    failed_login_attempts INT NOT NULL DEFAULT 0,
    last_login TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Handler routines (one per threat category)
CREATE TABLE IF NOT EXISTS handler_routines (
    id SERIAL PRIMARY KEY,
    routine_name VARCHAR(100) NOT NULL,
    threat_type VARCHAR(50) NOT NULL UNIQUE,
    response_action VARCHAR(255) NOT NULL,
    severity VARCHAR(10) NOT NULL CHECK (severity IN ('LOW', 'MEDIUM', 'HIGH')),
    description TEXT,
    auto_lock BOOLEAN NOT NULL DEFAULT false,
    notify_admin BOOLEAN NOT NULL DEFAULT false
);

-- Audit Log
CREATE TABLE IF NOT EXISTS audit_log (
    id BIGSERIAL PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES user_accounts(id),
    query_text TEXT NOT NULL,
    severity VARCHAR(10) NOT NULL CHECK (severity IN ('LOW', 'MEDIUM', 'HIGH')),
    action_taken VARCHAR(255) NOT NULL,
    routine_id INT REFERENCES handler_routines(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Suspicious activity annotations
CREATE TABLE IF NOT EXISTS suspicious_activity (
    id BIGSERIAL PRIMARY KEY,
    log_id BIGINT NOT NULL REFERENCES audit_log(id),
    user_id UUID NOT NULL REFERENCES user_accounts(id),
    reason TEXT NOT NULL,
    flagged_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_audit_user_severity ON audit_log(user_id, severity, created_at);
CREATE INDEX IF NOT EXISTS idx_audit_created ON audit_log(created_at);
CREATE INDEX IF NOT EXISTS idx_audit_routine ON audit_log(routine_id);
CREATE INDEX IF NOT EXISTS idx_users_status ON user_accounts(status);
CREATE INDEX IF NOT EXISTS idx_suspicious_log ON suspicious_activity(log_id);
"#;
