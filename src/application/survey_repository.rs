// Repository trait for survey data on the server side
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;

#[async_trait]
pub trait SurveyRepository: Send + Sync {
    /// List all project names, sorted
    async fn list_projects(&self) -> anyhow::Result<Vec<String>>;

    /// Read every survey of `project` into one snapshot
    async fn load_project(&self, project: &str) -> anyhow::Result<Snapshot>;
}
