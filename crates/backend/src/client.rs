use std::str::FromStr;

use anyhow::{bail, Context};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace};

use crate::{BackendConfig, BackendError};

/// HTTP client for the ground-station backend. Cheap to clone; clones share
/// the same connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: reqwest::Url,
    http_client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut base_url =
            reqwest::Url::from_str(&config.address).context("invalid backend url")?;

        // `localhost:5000` parses, but as scheme `localhost` with nothing to
        // join endpoints onto
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "backend url {:?} must start with http:// or https://",
                config.address
            );
        }

        // endpoints are joined relative to the base, so a base with a path
        // prefix (http://host/api) has to end in a slash to keep that prefix
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to create http client")?;

        Ok(BackendClient {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<reqwest::Url, BackendError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| BackendError::InvalidEndpoint(path.to_owned()))
    }

    /// Reads `path` and decodes the body as JSON. Anything other than a
    /// successful status with a decodable body is a malformed response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let endpoint = self.endpoint(path)?;

        trace!("GET {}", endpoint);

        let res = self.http_client.get(endpoint.clone()).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(BackendError::MalformedResponse {
                endpoint: endpoint.to_string(),
                reason: format!("unexpected status {}", status),
            });
        }

        let body = res.bytes().await?;

        serde_json::from_slice(&body).map_err(|err| BackendError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })
    }

    /// Sends `body` as JSON to `path`. The response body is ignored unless the
    /// backend answers with an error status, in which case it is returned as
    /// part of [`BackendError::CommandRejected`].
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        let endpoint = self.endpoint(path)?;

        debug!("POST {}", endpoint);

        let res = self
            .http_client
            .post(endpoint.clone())
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(BackendError::CommandRejected {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use serde_json::{json, Value};
    use warp::Filter;

    use super::*;
    use crate::ErrorKind;

    macro_rules! serve {
        ($filter:expr) => {{
            let (addr, server) = warp::serve($filter).bind_ephemeral(([127, 0, 0, 1], 0));
            tokio::spawn(server);
            addr
        }};
    }

    fn client_for(addr: SocketAddr) -> BackendClient {
        BackendClient::new(&BackendConfig::with_address(format!("http://{}", addr))).unwrap()
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let client = BackendClient::new(&BackendConfig::with_address("http://gs.local/api")).unwrap();

        assert_eq!(
            client.endpoint("/uav/stats").unwrap().as_str(),
            "http://gs.local/api/uav/stats"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(BackendClient::new(&BackendConfig::with_address("not a url")).is_err());
    }

    #[test]
    fn address_without_http_scheme_is_rejected() {
        for address in ["localhost:5000", "ftp://gs.local/", "mailto:ops@gs.local"] {
            assert!(
                BackendClient::new(&BackendConfig::with_address(address)).is_err(),
                "{} was accepted",
                address
            );
        }

        assert!(BackendClient::new(&BackendConfig::with_address("https://gs.local")).is_ok());
    }

    #[tokio::test]
    async fn get_json_decodes_body() -> anyhow::Result<()> {
        let addr = serve!(warp::path!("uav" / "stats").map(|| warp::reply::json(&json!({ "result": 1 }))));

        let value: Value = client_for(addr).get_json("/uav/stats").await?;

        assert_eq!(value, json!({ "result": 1 }));
        Ok(())
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let addr = serve!(warp::path!("uav" / "stats").map(|| warp::reply::html("<h1>hi</h1>")));

        let err = client_for(addr)
            .get_json::<Value>("/uav/stats")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        // bind and drop to get a port nothing listens on
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let err = client_for(addr)
            .get_json::<Value>("/uav/stats")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn error_status_on_post_is_a_rejection() {
        let addr = serve!(warp::post().map(|| {
            warp::reply::with_status("vehicle is not armable", warp::http::StatusCode::CONFLICT)
        }));

        let err = client_for(addr)
            .post_json("/uav/arm", &json!({ "command": "" }))
            .await
            .unwrap_err();

        match err {
            BackendError::CommandRejected { status, body, .. } => {
                assert_eq!(status, 409);
                assert_eq!(body, "vehicle is not armable");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
