use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Time between two polls of the backend, in milliseconds
    #[serde(with = "serde_millis")]
    pub period: Duration,

    /// Number of consecutive failed polls after which the link is shown as
    /// disconnected rather than degraded
    pub disconnect_after: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            period: Duration::from_millis(250),
            disconnect_after: 8,
        }
    }
}
