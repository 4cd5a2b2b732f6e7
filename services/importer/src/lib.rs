//! Registry importer: rebuilds the Lithuanian company registry table from
//! the public JAR, PVM and authorized-capital extracts.
//!
//! Stages, in order:
//! - [`fetch`]: download each extract into the data directory
//! - [`schema`]: map each file's headers onto canonical fields
//! - [`merge`]: left-join PVM and capital onto JAR by company code
//! - [`normalize`]: type dates, integers and amounts
//! - [`publish`]: swap the new table in atomically
//!
//! [`pipeline::run_full_import`] runs them all.

pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod publish;
pub mod schema;
pub mod settings;
pub mod source;
pub mod store;

pub use config::Config;
pub use pipeline::{run_full_import, run_import, ImportFailure, ImportOptions, ImportSummary};
