// Data source trait for the dashboard client
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the dashboard gets its projects and snapshots from.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// List the project names offered for navigation
    async fn list_projects(&self) -> Result<Vec<String>, FetchError>;

    /// Fetch the latest snapshot for `project`, or for the server's default
    /// project when `None`. The result is not validated here.
    async fn fetch_snapshot(&self, project: Option<&str>) -> Result<Snapshot, FetchError>;
}
