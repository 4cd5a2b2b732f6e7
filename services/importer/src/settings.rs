//! Administrator-editable settings: one download URL per source.

use sqlx::SqlitePool;

use crate::source::SourceKind;

/// Public open-data link of the JAR extract at Registrų centras.
pub const DEFAULT_JAR_URL: &str =
    "https://www.registrucentras.lt/aduomenys/?byla=JAR_IREGISTRUOTI.csv";

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RegistrySetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<RegistrySetting>, sqlx::Error> {
    sqlx::query_as("SELECT key, value, description FROM settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn list_settings(pool: &SqlitePool) -> Result<Vec<RegistrySetting>, sqlx::Error> {
    sqlx::query_as("SELECT key, value, description FROM settings ORDER BY key")
        .fetch_all(pool)
        .await
}

pub async fn upsert_setting(
    pool: &SqlitePool,
    key: &str,
    value: &str,
    description: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, description)
        VALUES ($1, $2, $3)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value, description = excluded.description
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(description)
    .execute(pool)
    .await?;
    Ok(())
}

/// Seeds the JAR link on a fresh database. Existing values are left alone.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO settings (key, value, description) VALUES ($1, $2, $3)")
        .bind(SourceKind::Jar.setting_key())
        .bind(DEFAULT_JAR_URL)
        .bind("JAR open-data extract (pipe-delimited CSV)")
        .execute(pool)
        .await?;
    Ok(())
}

/// Download URLs resolved for one run. Blank values count as unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceUrls {
    pub jar: Option<String>,
    pub pvm: Option<String>,
    pub capital: Option<String>,
}

impl SourceUrls {
    pub fn get(&self, kind: SourceKind) -> Option<&str> {
        match kind {
            SourceKind::Jar => self.jar.as_deref(),
            SourceKind::Pvm => self.pvm.as_deref(),
            SourceKind::Capital => self.capital.as_deref(),
        }
    }
}

pub async fn load_source_urls(pool: &SqlitePool) -> Result<SourceUrls, sqlx::Error> {
    let mut urls = SourceUrls::default();
    for kind in SourceKind::ALL {
        let value = get_setting(pool, kind.setting_key())
            .await?
            .map(|setting| setting.value.trim().to_string())
            .filter(|value| !value.is_empty());
        match kind {
            SourceKind::Jar => urls.jar = value,
            SourceKind::Pvm => urls.pvm = value,
            SourceKind::Capital => urls.capital = value,
        }
    }
    Ok(urls)
}
