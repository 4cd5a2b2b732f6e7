use std::path::PathBuf;

use thiserror::Error;

use crate::schema::Field;
use crate::source::SourceKind;

/// Why a source could not be downloaded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no URL configured for {0}")]
    MissingUrl(SourceKind),

    #[error("{source_kind} returned HTTP status {status}")]
    Status { source_kind: SourceKind, status: u16 },

    #[error("request for {source_kind} failed: {error}")]
    Transport {
        source_kind: SourceKind,
        #[source]
        error: reqwest::Error,
    },

    #[error("failed to write {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl FetchError {
    /// A 404 usually means the registry republished the extract under a new link.
    pub fn is_stale_link(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}

/// Why a source file could not be mapped onto canonical fields.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{kind} file {path} not found")]
    Missing { kind: SourceKind, path: PathBuf },

    #[error("failed to read {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("{0} file has no header row")]
    Empty(SourceKind),

    #[error("{0} file: no candidate delimiter splits the header into columns")]
    NoDelimiter(SourceKind),

    #[error("{kind} file: required column {field} not found in headers {headers:?}")]
    MissingColumn {
        kind: SourceKind,
        field: Field,
        headers: Vec<String>,
    },

    #[error("{kind} file: CSV error: {error}")]
    Csv {
        kind: SourceKind,
        #[source]
        error: csv::Error,
    },

    #[error("{0} file has no usable rows")]
    NoRows(SourceKind),
}

/// Run-level failure. Everything else degrades locally.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("primary source unusable, aborting before publish: {0}")]
    PrimarySource(#[source] SchemaError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("registry store error: {0}")]
    Store(#[from] sqlx::Error),
}
