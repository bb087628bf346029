//! HTTP client for the bootstrap service.
//!
//! One service plays both collaborator roles: it keeps the registry of node
//! addresses and it publishes the shared block production schedule.
//!
//! - `POST {base}/register` with `{"address": "..."}`
//! - `GET {base}/peers` returning `["ws://...", ...]`
//! - `GET {base}/block-time` returning [`BlockTiming`]

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::directory::{BlockTiming, PeerDirectory, TimeCoordinator};
use crate::error::NetworkError;

/// Default timeout for bootstrap requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct RegisterRequest<'a> {
    address: &'a str,
}

/// Client for the bootstrap directory / time service.
#[derive(Clone, Debug)]
pub struct BootstrapClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl BootstrapClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetworkError> {
        let response = self
            .http_client
            .get(self.url(path))
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(NetworkError::Directory(format!(
                "GET /{path} returned HTTP {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NetworkError::Directory(format!("invalid /{path} response: {e}")))
    }
}

fn map_request_error(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        NetworkError::Unreachable(format!("connection failed: {e}"))
    } else {
        NetworkError::Directory(e.to_string())
    }
}

impl PeerDirectory for BootstrapClient {
    async fn register(&self, address: &str) -> Result<(), NetworkError> {
        let response = self
            .http_client
            .post(self.url("register"))
            .json(&RegisterRequest { address })
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(NetworkError::Directory(format!(
                "POST /register returned HTTP {}",
                response.status()
            )));
        }
        tracing::debug!(address, "registered with bootstrap service");
        Ok(())
    }

    async fn peers(&self) -> Result<Vec<String>, NetworkError> {
        self.get_json("peers").await
    }
}

impl TimeCoordinator for BootstrapClient {
    async fn block_timing(&self) -> Result<BlockTiming, NetworkError> {
        self.get_json("block-time").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = BootstrapClient::new("http://127.0.0.1:4000/");
        assert_eq!(client.base_url(), "http://127.0.0.1:4000");
        assert_eq!(client.url("peers"), "http://127.0.0.1:4000/peers");
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client =
            BootstrapClient::with_timeout(format!("http://127.0.0.1:{port}"), Duration::from_secs(2));
        let err = client.peers().await.unwrap_err();
        assert!(matches!(err, NetworkError::Unreachable(_)));
        assert!(client.block_timing().await.is_err());
        assert!(client.register("ws://localhost:5001").await.is_err());
    }
}
