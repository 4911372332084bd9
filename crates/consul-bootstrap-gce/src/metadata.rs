//! GCE metadata server client
//!
//! Plain-text lookups against the instance metadata server. Every request
//! carries the `Metadata-Flavor: Google` header; the server rejects requests
//! without it.

use crate::error::{MetadataError, Result};
use async_trait::async_trait;

/// Default metadata server host
pub const METADATA_HOST: &str = "metadata.google.internal";

/// Environment variable overriding the metadata host (`host[:port]`)
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR: &str = "Google";

/// Source of raw metadata values, keyed by path relative to
/// `computeMetadata/v1`.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch one value. One attempt, no retry.
    async fn get(&self, path: &str) -> Result<String>;
}

/// HTTP client for the metadata server
pub struct GceMetadataClient {
    client: reqwest::Client,
    base_url: String,
}

impl GceMetadataClient {
    /// Client for `host` (`host[:port]`).
    ///
    /// Proxy settings from the environment are ignored; the metadata server
    /// is only reachable directly from the instance.
    pub fn with_host(host: &str) -> Result<Self> {
        let client = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            base_url: format!("http://{}/computeMetadata/v1", host),
        })
    }

    /// Client for the host in `GCE_METADATA_HOST`, falling back to the
    /// well-known metadata host.
    pub fn from_env() -> Result<Self> {
        match std::env::var(METADATA_HOST_ENV) {
            Ok(host) if !host.is_empty() => Self::with_host(&host),
            _ => Self::with_host(METADATA_HOST),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MetadataSource for GceMetadataClient {
    async fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let value = response.text().await?.trim().to_string();
        if value.is_empty() {
            return Err(MetadataError::EmptyValue(path.to_string()));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve a single canned HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "{}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&request).to_string()
        });

        (host, handle)
    }

    #[tokio::test]
    async fn test_get_sends_flavor_header() {
        let (host, server) = serve_once("HTTP/1.1 200 OK", "consul-server-1\n").await;
        let client = GceMetadataClient::with_host(&host).unwrap();

        let value = client.get("instance/name").await.unwrap();
        assert_eq!(value, "consul-server-1");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /computemetadata/v1/instance/name http/1.1"));
        assert!(request.contains("metadata-flavor: google"));
    }

    #[tokio::test]
    async fn test_get_non_success_status() {
        let (host, server) = serve_once("HTTP/1.1 404 Not Found", "not found").await;
        let client = GceMetadataClient::with_host(&host).unwrap();

        let err = client
            .get("instance/attributes/cluster-size")
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Status { status: 404, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_empty_value() {
        let (host, server) = serve_once("HTTP/1.1 200 OK", "  \n").await;
        let client = GceMetadataClient::with_host(&host).unwrap();

        let err = client.get("project/project-id").await.unwrap_err();
        assert!(matches!(err, MetadataError::EmptyValue(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        // Bind then drop so nothing is listening on the port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = GceMetadataClient::with_host(&host).unwrap();
        let err = client.get("instance/name").await.unwrap_err();
        assert!(matches!(err, MetadataError::Http(_)));
    }

    #[test]
    fn test_host_from_env() {
        temp_env::with_var(METADATA_HOST_ENV, Some("10.0.0.1:8080"), || {
            let client = GceMetadataClient::from_env().unwrap();
            assert_eq!(client.base_url(), "http://10.0.0.1:8080/computeMetadata/v1");
        });

        temp_env::with_var_unset(METADATA_HOST_ENV, || {
            let client = GceMetadataClient::from_env().unwrap();
            assert_eq!(
                client.base_url(),
                "http://metadata.google.internal/computeMetadata/v1"
            );
        });
    }
}
