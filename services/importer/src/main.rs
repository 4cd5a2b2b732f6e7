//! Registry importer CLI.
//!
//! Usage:
//!   # Full run with every source downloaded:
//!   cargo run --bin registry-importer
//!
//!   # Rebuild from files already in DATA_DIR:
//!   cargo run --bin registry-importer -- --skip-jar-download --skip-pvm-download --skip-capital-download
//!
//!   # Everything except the publish step:
//!   cargo run --bin registry-importer -- --dry-run

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use registry_importer::{pipeline, settings, store, Config, ImportOptions};

#[derive(Parser, Debug)]
#[command(name = "registry-importer", about = "Imports the JAR, PVM and capital extracts into the registry store")]
struct Args {
    /// Reuse the local JAR file instead of downloading it
    #[arg(long, default_value = "false")]
    skip_jar_download: bool,

    /// Reuse the local PVM file instead of downloading it
    #[arg(long, default_value = "false")]
    skip_pvm_download: bool,

    /// Reuse the local capital file instead of downloading it
    #[arg(long, default_value = "false")]
    skip_capital_download: bool,

    /// Dry run - build the dataset but don't publish it
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

impl From<&Args> for ImportOptions {
    fn from(args: &Args) -> Self {
        ImportOptions {
            skip_jar_download: args.skip_jar_download,
            skip_pvm_download: args.skip_pvm_download,
            skip_capital_download: args.skip_capital_download,
            dry_run: args.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    tracing::info!(
        db = %config.db_url,
        data_dir = %config.data_dir.display(),
        "registry importer starting"
    );

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;

    let pool = store::connect(&config.db_url)
        .await
        .context("Failed to connect to registry store")?;
    store::bootstrap(&pool)
        .await
        .context("Failed to create registry tables")?;
    settings::seed_defaults(&pool)
        .await
        .context("Failed to seed default settings")?;

    pipeline::run_full_import(&pool, &config, ImportOptions::from(&args)).await;

    pool.close().await;
    Ok(())
}
