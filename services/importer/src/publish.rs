//! Dataset publisher.
//!
//! The new row set is staged, swapped in for `companies` and indexed inside
//! a single SQLite transaction. DDL is transactional in SQLite, so a failure
//! at any step rolls back to the previous table and readers only ever see a
//! complete, indexed dataset.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::model::CompanyRecord;
use crate::store::{companies_table_sql, COMPANIES_TABLE, COMPANY_COLUMNS, COMPANY_INDEXES};

const STAGING_TABLE: &str = "companies_staging";

// 14 binds per row keeps each statement well under SQLite's variable limit.
const INSERT_CHUNK: usize = 500;

/// Replaces the served dataset with `records` and returns the inserted row count.
pub async fn publish(pool: &SqlitePool, records: &[CompanyRecord]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!("DROP TABLE IF EXISTS {STAGING_TABLE}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&companies_table_sql(STAGING_TABLE))
        .execute(&mut *tx)
        .await?;

    let mut inserted = 0;
    for chunk in records.chunks(INSERT_CHUNK) {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("INSERT INTO {STAGING_TABLE} ({COMPANY_COLUMNS}) "));
        builder.push_values(chunk, |mut row, record| {
            row.push_bind(record.code.clone())
                .push_bind(record.name.clone())
                .push_bind(record.address.clone())
                .push_bind(record.registration_date)
                .push_bind(record.legal_form_code)
                .push_bind(record.legal_form_name.clone())
                .push_bind(record.status_code)
                .push_bind(record.status_name.clone())
                .push_bind(record.status_date_from)
                .push_bind(record.data_updated_at)
                .push_bind(record.pvm_code.clone())
                .push_bind(record.pvm_date)
                .push_bind(record.authorized_capital)
                .push_bind(record.capital_currency.clone());
        });
        inserted += builder.build().execute(&mut *tx).await?.rows_affected();
    }
    tracing::debug!(rows = inserted, "staged companies");

    sqlx::query(&format!("DROP TABLE IF EXISTS {COMPANIES_TABLE}"))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&format!(
        "ALTER TABLE {STAGING_TABLE} RENAME TO {COMPANIES_TABLE}"
    ))
    .execute(&mut *tx)
    .await?;
    for ddl in COMPANY_INDEXES {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    tracing::info!(rows = inserted, "published companies");

    Ok(inserted)
}
