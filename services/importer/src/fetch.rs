//! Source fetcher: streams one registry extract to its local path.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::Config;
use crate::error::FetchError;
use crate::source::SourceKind;

pub fn build_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.fetch_timeout)
        .user_agent(config.user_agent.clone())
        .build()
}

/// Sibling file the body is streamed into before it replaces `destination`.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Downloads `url` into `destination` and returns the number of bytes written.
///
/// The previous copy at `destination` is only replaced once the whole body
/// has arrived.
pub async fn download(
    client: &Client,
    kind: SourceKind,
    url: Option<&str>,
    destination: &Path,
) -> Result<u64, FetchError> {
    let url = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(FetchError::MissingUrl(kind))?;

    let transport = |error| FetchError::Transport {
        source_kind: kind,
        error,
    };

    let mut response = client.get(url).send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            source_kind: kind,
            status: status.as_u16(),
        });
    }

    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |error| FetchError::Io { path, error }
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await.map_err(io(parent))?;
    }

    let partial = partial_path(destination);
    let mut file = fs::File::create(&partial).await.map_err(io(&partial))?;

    let mut written: u64 = 0;
    let streamed: Result<(), FetchError> = async {
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            file.write_all(&chunk).await.map_err(io(&partial))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io(&partial))?;
        Ok(())
    }
    .await;
    drop(file);

    if let Err(error) = streamed {
        let _ = fs::remove_file(&partial).await;
        return Err(error);
    }

    if let Err(error) = fs::rename(&partial, destination).await {
        let _ = fs::remove_file(&partial).await;
        return Err(io(destination)(error));
    }

    Ok(written)
}

/// [`download`] with the outcome logged by failure class. Fetch failures are
/// never fatal; the caller falls back to any existing local copy.
pub async fn fetch_source(
    client: &Client,
    kind: SourceKind,
    url: Option<&str>,
    destination: &Path,
) -> Result<u64, FetchError> {
    tracing::info!(source = %kind, url = url.unwrap_or(""), "fetching {}", kind.display_name());

    let result = download(client, kind, url, destination).await;
    match &result {
        Ok(bytes) => {
            tracing::info!(source = %kind, bytes, path = %destination.display(), "downloaded");
        }
        Err(FetchError::MissingUrl(_)) => {
            tracing::warn!(
                source = %kind,
                setting = kind.setting_key(),
                "no URL configured, using local copy if present"
            );
        }
        Err(err) if err.is_stale_link() => {
            tracing::error!(
                source = %kind,
                "download link returned 404, the published link is probably stale"
            );
        }
        Err(err @ FetchError::Status { .. }) => {
            tracing::error!(source = %kind, error = %err, "download rejected");
        }
        Err(err) => {
            tracing::error!(source = %kind, error = %err, "download failed");
        }
    }
    result
}
