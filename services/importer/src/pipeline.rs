//! One import run: fetch, reconcile, merge, normalize, publish.
//!
//! Only two things abort a run: an unusable JAR extract and a store error.
//! Everything else (missing URLs, dead links, malformed enrichment files)
//! degrades to "use the local copy" or "leave those columns null".

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::Config;
use crate::error::{ImportError, SchemaError};
use crate::fetch;
use crate::merge::{self, MergeStats};
use crate::model::{CapitalRecord, JarRecord, PvmRecord};
use crate::normalize;
use crate::publish;
use crate::schema::{self, RawSource, Reconciled, SourceRecord};
use crate::settings::{self, SourceUrls};
use crate::source::SourceKind;
use crate::store;

/// Per-run switches, set from the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub skip_jar_download: bool,
    pub skip_pvm_download: bool,
    pub skip_capital_download: bool,
    /// Run every stage except publish.
    pub dry_run: bool,
}

impl ImportOptions {
    fn skips_download(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Jar => self.skip_jar_download,
            SourceKind::Pvm => self.skip_pvm_download,
            SourceKind::Capital => self.skip_capital_download,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    Skipped,
    Downloaded { bytes: u64 },
    Failed { error: String },
}

/// What happened to one source during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: SourceKind,
    pub fetch: FetchStatus,
    /// Hash of the file that was reconciled, if any.
    pub sha256: Option<String>,
    pub rows: usize,
    pub skipped_rows: usize,
    /// False when the source contributed nothing to this run.
    pub used: bool,
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: SourceKind, fetch: FetchStatus) -> Self {
        Self {
            source,
            fetch,
            sha256: None,
            rows: 0,
            skipped_rows: 0,
            used: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub published: bool,
    pub published_rows: u64,
    pub merge: MergeStats,
    pub sources: Vec<SourceReport>,
}

impl ImportSummary {
    pub fn source(&self, kind: SourceKind) -> Option<&SourceReport> {
        self.sources.iter().find(|report| report.source == kind)
    }
}

async fn fetch_step(
    client: &reqwest::Client,
    config: &Config,
    urls: &SourceUrls,
    kind: SourceKind,
    skip: bool,
) -> FetchStatus {
    if skip {
        tracing::info!(source = %kind, "download skipped, using local copy");
        return FetchStatus::Skipped;
    }
    let destination = config.source_path(kind);
    match fetch::fetch_source(client, kind, urls.get(kind), &destination).await {
        Ok(bytes) => FetchStatus::Downloaded { bytes },
        Err(err) => FetchStatus::Failed {
            error: err.to_string(),
        },
    }
}

async fn load_source<T: SourceRecord>(
    config: &Config,
    report: &mut SourceReport,
) -> Result<Reconciled<T>, SchemaError> {
    let raw = RawSource::load(T::KIND, &config.source_path(T::KIND)).await?;
    report.sha256 = Some(raw.sha256.clone());
    let reconciled = schema::reconcile::<T>(&raw)?;
    report.rows = reconciled.records.len();
    report.skipped_rows = reconciled.skipped_rows;
    Ok(reconciled)
}

/// Loads an enrichment source. Any failure leaves its columns null.
async fn load_secondary<T: SourceRecord>(
    config: &Config,
    report: &mut SourceReport,
) -> Option<Vec<T>> {
    match load_source::<T>(config, report).await {
        Ok(reconciled) => {
            report.used = true;
            Some(reconciled.records)
        }
        Err(err @ SchemaError::Missing { .. }) => {
            tracing::info!(source = %T::KIND, error = %err, "source not available, columns stay empty");
            report.error = Some(err.to_string());
            None
        }
        Err(err) => {
            tracing::warn!(source = %T::KIND, error = %err, "source skipped, columns stay empty");
            report.error = Some(err.to_string());
            None
        }
    }
}

/// A run that stopped before publishing, with the per-source reports built
/// up to that point.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ImportFailure {
    #[source]
    pub error: ImportError,
    pub sources: Vec<SourceReport>,
}

/// Runs every stage and returns what happened. Errors mean nothing was
/// published and the previous dataset is still served.
pub async fn run_import(
    pool: &SqlitePool,
    config: &Config,
    options: ImportOptions,
) -> Result<ImportSummary, ImportFailure> {
    let mut sources = Vec::with_capacity(SourceKind::ALL.len());
    match import_stages(pool, config, options, &mut sources).await {
        Ok((published_rows, merge)) => Ok(ImportSummary {
            published: !options.dry_run,
            published_rows,
            merge,
            sources,
        }),
        Err(error) => Err(ImportFailure { error, sources }),
    }
}

/// Reports land in `sources` as soon as they exist, so a failure still
/// carries them.
async fn import_stages(
    pool: &SqlitePool,
    config: &Config,
    options: ImportOptions,
    sources: &mut Vec<SourceReport>,
) -> Result<(u64, MergeStats), ImportError> {
    let urls = settings::load_source_urls(pool).await?;
    let client = fetch::build_client(config).map_err(ImportError::HttpClient)?;

    let (jar_fetch, pvm_fetch, capital_fetch) = tokio::join!(
        fetch_step(&client, config, &urls, SourceKind::Jar, options.skips_download(SourceKind::Jar)),
        fetch_step(&client, config, &urls, SourceKind::Pvm, options.skips_download(SourceKind::Pvm)),
        fetch_step(
            &client,
            config,
            &urls,
            SourceKind::Capital,
            options.skips_download(SourceKind::Capital)
        ),
    );

    let mut jar_report = SourceReport::new(SourceKind::Jar, jar_fetch);
    let mut pvm_report = SourceReport::new(SourceKind::Pvm, pvm_fetch);
    let mut capital_report = SourceReport::new(SourceKind::Capital, capital_fetch);

    let jar = load_source::<JarRecord>(config, &mut jar_report)
        .await
        .and_then(|reconciled| {
            if reconciled.records.is_empty() {
                Err(SchemaError::NoRows(SourceKind::Jar))
            } else {
                Ok(reconciled.records)
            }
        });
    let jar = match jar {
        Ok(records) => records,
        Err(err) => {
            tracing::error!(source = %SourceKind::Jar, error = %err, "primary source unusable, nothing published");
            jar_report.error = Some(err.to_string());
            sources.extend([jar_report, pvm_report, capital_report]);
            return Err(ImportError::PrimarySource(err));
        }
    };
    jar_report.used = true;

    let pvm = load_secondary::<PvmRecord>(config, &mut pvm_report).await;
    let capital = load_secondary::<CapitalRecord>(config, &mut capital_report).await;
    sources.extend([jar_report, pvm_report, capital_report]);

    let merged = merge::merge(jar, pvm, capital);
    if merged.rows.is_empty() {
        let err = SchemaError::NoRows(SourceKind::Jar);
        tracing::error!(source = %SourceKind::Jar, error = %err, "no JAR row survived the merge, nothing published");
        return Err(ImportError::PrimarySource(err));
    }

    let records = normalize::normalize_rows(merged.rows);
    let without_enrichment = records.iter().filter(|r| r.has_no_enrichment()).count();
    tracing::debug!(rows = records.len(), without_enrichment, "normalized rows");

    let published_rows = if options.dry_run {
        tracing::info!(rows = records.len(), "dry run, publish skipped");
        0
    } else {
        publish::publish(pool, &records).await?
    };

    Ok((published_rows, merged.stats))
}

/// Entry point for the scheduler and the CLI. Never fails: the outcome is
/// logged and recorded in `import_runs`. Dry runs leave no audit row.
pub async fn run_full_import(pool: &SqlitePool, config: &Config, options: ImportOptions) {
    let run_id = if options.dry_run {
        None
    } else {
        match store::create_import_run(pool).await {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(error = %err, "could not record import run start");
                None
            }
        }
    };

    tracing::info!(run_id = ?run_id, dry_run = options.dry_run, "import started");
    let result = run_import(pool, config, options).await;

    let (status, error, detail) = match &result {
        Ok(summary) => {
            tracing::info!(
                rows = summary.published_rows,
                pvm_matched = summary.merge.pvm_matched,
                capital_matched = summary.merge.capital_matched,
                "import finished"
            );
            let detail = serde_json::to_value(summary).unwrap_or_default();
            ("ok", None, detail)
        }
        Err(err) => {
            tracing::error!(error = %err, "import failed, previous dataset kept");
            let detail = serde_json::json!({ "sources": err.sources });
            ("failed", Some(err.to_string()), detail)
        }
    };

    if let Some(run_id) = run_id {
        if let Err(err) =
            store::finish_import_run(pool, run_id, status, error.as_deref(), &detail).await
        {
            tracing::warn!(run_id = %run_id, error = %err, "could not record import run result");
        }
    }
}
