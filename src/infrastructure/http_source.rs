// HTTP data source - talks to /get_projects and /get_data
use crate::application::data_source::{DashboardSource, FetchError};
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpDashboardSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDashboardSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn projects_url(&self) -> String {
        format!("{}/get_projects", self.base_url)
    }

    fn data_url(&self, project: Option<&str>) -> String {
        match project {
            Some(project) => format!(
                "{}/get_data?project={}",
                self.base_url,
                urlencoding::encode(project)
            ),
            None => format!("{}/get_data", self.base_url),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.clone(),
                source: Box::new(e),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: Box::new(e),
        })?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }
}

#[async_trait]
impl DashboardSource for HttpDashboardSource {
    async fn list_projects(&self) -> Result<Vec<String>, FetchError> {
        self.get_json(self.projects_url()).await
    }

    async fn fetch_snapshot(&self, project: Option<&str>) -> Result<Snapshot, FetchError> {
        self.get_json(self.data_url(project)).await
    }
}
