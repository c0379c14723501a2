//! Kubernetes client construction.

use anyhow::{Context, Result};
use kube::{Client, Config};
use tracing::info;

/// Connect to the API server at `api_url`, or infer the connection from the
/// environment (in-cluster service account, then kubeconfig) when absent.
pub async fn connect(api_url: Option<&str>) -> Result<Client> {
    install_crypto_provider();

    let config = match api_url {
        Some(url) => {
            let uri: http::Uri = url
                .parse()
                .with_context(|| format!("invalid kubernetes API URL {url:?}"))?;
            Config::new(uri)
        }
        None => Config::infer()
            .await
            .context("failed to infer kubernetes configuration")?,
    };
    info!(endpoint = %config.cluster_url, "kubernetes client initialized");

    Client::try_from(config).context("failed to build kubernetes client")
}

/// Several TLS backends may be linked in; pin the process to ring.
fn install_crypto_provider() {
    // Err means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}
