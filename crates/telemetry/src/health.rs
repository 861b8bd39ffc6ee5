use chrono::{DateTime, Local};
use gc_backend::{BackendError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// no poll has completed yet
    Connecting,
    Connected,
    /// the last poll failed; values on screen are stale
    Degraded,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkError {
    pub kind: ErrorKind,
    pub message: String,
    pub at: DateTime<Local>,
}

impl LinkError {
    pub fn new(err: &BackendError, at: DateTime<Local>) -> Self {
        LinkError {
            kind: err.kind(),
            message: err.to_string(),
            at,
        }
    }
}

/// What the operator's connection indicator shows.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkHealth {
    pub status: LinkStatus,
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<Local>>,
    pub last_error: Option<LinkError>,
}

impl Default for LinkHealth {
    fn default() -> Self {
        LinkHealth {
            status: LinkStatus::Connecting,
            consecutive_failures: 0,
            last_success: None,
            last_error: None,
        }
    }
}

impl LinkHealth {
    pub fn record_success(&mut self, at: DateTime<Local>) {
        self.status = LinkStatus::Connected;
        self.consecutive_failures = 0;
        self.last_success = Some(at);
    }

    pub fn record_failure(&mut self, err: &BackendError, disconnect_after: u32, at: DateTime<Local>) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(LinkError::new(err, at));
        self.status = if self.consecutive_failures >= disconnect_after.max(1) {
            LinkStatus::Disconnected
        } else {
            LinkStatus::Degraded
        };
    }

    /// Seconds since the last successful poll, if there ever was one.
    pub fn staleness(&self, now: DateTime<Local>) -> Option<f64> {
        self.last_success
            .map(|at| (now - at).num_milliseconds() as f64 / 1000.0)
    }
}
