//! Registry store: the SQLite database the lookup service reads.
//!
//! Tables:
//! - `companies`: the published dataset, replaced wholesale by [`crate::publish`]
//! - `settings`: source URLs edited by an administrator
//! - `import_runs`: one audit row per pipeline run

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::model::CompanyRecord;

pub const COMPANIES_TABLE: &str = "companies";

/// Column list of `companies`, in insert order.
pub const COMPANY_COLUMNS: &str = "code, name, address, registration_date, legal_form_code, \
    legal_form_name, status_code, status_name, status_date_from, data_updated_at, pvm_code, \
    pvm_date, authorized_capital, capital_currency";

/// DDL for a table shaped like `companies`. The primary key doubles as the
/// unique lookup index on `code`.
pub fn companies_table_sql(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            code TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            address TEXT,
            registration_date DATE,
            legal_form_code INTEGER,
            legal_form_name TEXT,
            status_code INTEGER,
            status_name TEXT,
            status_date_from DATE,
            data_updated_at DATE,
            pvm_code TEXT,
            pvm_date DATE,
            authorized_capital REAL,
            capital_currency TEXT
        )
        "#
    )
}

/// Secondary indexes of the served table.
pub const COMPANY_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS ix_companies_name ON companies (name)",
    "CREATE INDEX IF NOT EXISTS ix_companies_address ON companies (address)",
    "CREATE INDEX IF NOT EXISTS ix_companies_pvm_code ON companies (pvm_code)",
];

/// Opens the store in WAL mode so readers keep their snapshot while a
/// publish is in progress.
pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Single-connection in-memory store with the schema in place.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    bootstrap(&pool).await?;
    Ok(pool)
}

/// Creates missing tables. An empty `companies` table exists before the
/// first publish so readers never hit a missing table.
pub async fn bootstrap(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            description TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_runs (
            run_id BLOB PRIMARY KEY NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            status TEXT NOT NULL,
            error TEXT,
            detail TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(&companies_table_sql(COMPANIES_TABLE))
        .execute(pool)
        .await?;
    for ddl in COMPANY_INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    Ok(())
}

// =============================================================================
// Reads
// =============================================================================

pub async fn find_company(pool: &SqlitePool, code: &str) -> Result<Option<CompanyRecord>, sqlx::Error> {
    let sql = format!("SELECT {COMPANY_COLUMNS} FROM {COMPANIES_TABLE} WHERE code = $1");
    sqlx::query_as(&sql)
        .bind(code.trim())
        .fetch_optional(pool)
        .await
}

/// Whole published dataset ordered by code.
pub async fn all_companies(pool: &SqlitePool) -> Result<Vec<CompanyRecord>, sqlx::Error> {
    let sql = format!("SELECT {COMPANY_COLUMNS} FROM {COMPANIES_TABLE} ORDER BY code");
    sqlx::query_as(&sql).fetch_all(pool).await
}

pub async fn count_companies(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {COMPANIES_TABLE}");
    let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(pool).await?;
    Ok(count)
}

/// Prefix match on name or address, the shape the search page needs.
pub async fn search_companies(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
) -> Result<Vec<CompanyRecord>, sqlx::Error> {
    let pattern = format!("{}%", query.trim().replace('%', "\\%").replace('_', "\\_"));
    let sql = format!(
        r#"
        SELECT {COMPANY_COLUMNS} FROM {COMPANIES_TABLE}
        WHERE name LIKE $1 ESCAPE '\' OR address LIKE $1 ESCAPE '\'
        ORDER BY name, code
        LIMIT $2
        "#
    );
    sqlx::query_as(&sql)
        .bind(pattern)
        .bind(limit.clamp(1, 1000))
        .fetch_all(pool)
        .await
}

// =============================================================================
// Import run audit log
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: String,
    pub error: Option<String>,
    pub detail: String,
}

pub async fn create_import_run(pool: &SqlitePool) -> Result<Uuid, sqlx::Error> {
    let run_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO import_runs (run_id, started_at, status, detail)
        VALUES ($1, $2, 'running', '{}')
        "#,
    )
    .bind(run_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(run_id)
}

pub async fn finish_import_run(
    pool: &SqlitePool,
    run_id: Uuid,
    status: &str,
    error: Option<&str>,
    detail: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE import_runs
        SET finished_at = $2, status = $3, error = $4, detail = $5
        WHERE run_id = $1
        "#,
    )
    .bind(run_id)
    .bind(Utc::now())
    .bind(status)
    .bind(error)
    .bind(detail.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn latest_import_run(pool: &SqlitePool) -> Result<Option<ImportRun>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT run_id, started_at, finished_at, status, error, detail
        FROM import_runs
        ORDER BY rowid DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let pool = memory_pool().await.unwrap();
        bootstrap(&pool).await.unwrap();
        assert_eq!(count_companies(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_missing_company() {
        let pool = memory_pool().await.unwrap();
        assert!(find_company(&pool, "404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_import_run_lifecycle() {
        let pool = memory_pool().await.unwrap();
        let run_id = create_import_run(&pool).await.unwrap();

        let running = latest_import_run(&pool).await.unwrap().unwrap();
        assert_eq!(running.run_id, run_id);
        assert_eq!(running.status, "running");
        assert!(running.finished_at.is_none());

        let detail = serde_json::json!({ "rows": 3 });
        finish_import_run(&pool, run_id, "failed", Some("boom"), &detail)
            .await
            .unwrap();

        let finished = latest_import_run(&pool).await.unwrap().unwrap();
        assert_eq!(finished.status, "failed");
        assert_eq!(finished.error.as_deref(), Some("boom"));
        assert!(finished.finished_at.is_some());
        let stored: serde_json::Value = serde_json::from_str(&finished.detail).unwrap();
        assert_eq!(stored["rows"], 3);
    }
}
