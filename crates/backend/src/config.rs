use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend, e.g. `http://localhost:5000`
    pub address: String,

    /// Per-request timeout in milliseconds
    #[serde(with = "serde_millis", default = "default_timeout")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_millis(1000)
}

impl BackendConfig {
    pub fn with_address(address: impl Into<String>) -> Self {
        BackendConfig {
            address: address.into(),
            timeout: default_timeout(),
        }
    }
}
