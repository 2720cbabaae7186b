//! Liveness checks for the backing services.

use serde::Serialize;
use tracing::debug;

use crate::constants::LIVENESS_TIMEOUT;

/// Whether a backing service answered its liveness endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Answered with 200
    Online,
    /// Anything else, including no answer at all
    Offline,
}

impl ServiceStatus {
    /// True for [`ServiceStatus::Online`]
    pub fn is_online(self) -> bool {
        self == ServiceStatus::Online
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Online => f.write_str("online"),
            ServiceStatus::Offline => f.write_str("offline"),
        }
    }
}

/// GETs `url` with a short timeout; only a 200 counts as online.
pub(crate) async fn check_liveness(client: &reqwest::Client, url: &str) -> ServiceStatus {
    match client.get(url).timeout(LIVENESS_TIMEOUT).send().await {
        Ok(resp) if resp.status() == reqwest::StatusCode::OK => ServiceStatus::Online,
        Ok(resp) => {
            debug!("Liveness check {} returned {}", url, resp.status());
            ServiceStatus::Offline
        }
        Err(err) => {
            debug!("Liveness check {} failed: {}", url, err);
            ServiceStatus::Offline
        }
    }
}
