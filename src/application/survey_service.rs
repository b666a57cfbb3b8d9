// Survey service - Use cases behind /get_projects and /get_data
use crate::application::survey_repository::SurveyRepository;
use crate::domain::project::Project;
use crate::domain::snapshot::Snapshot;
use std::sync::Arc;

#[derive(Clone)]
pub struct SurveyService {
    repository: Arc<dyn SurveyRepository>,
    default_project: String,
}

impl SurveyService {
    pub fn new(repository: Arc<dyn SurveyRepository>, default_project: String) -> Self {
        Self {
            repository,
            default_project,
        }
    }

    pub async fn list_projects(&self) -> anyhow::Result<Vec<String>> {
        self.repository.list_projects().await
    }

    /// Load `project`, or the configured default when none is given.
    ///
    /// Failures produce an empty snapshot so the page keeps its last chart.
    pub async fn snapshot(&self, project: Option<&str>) -> Snapshot {
        let name = project
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.default_project);

        if !Project::is_valid_name(name) {
            tracing::warn!("Rejecting project name {:?}", name);
            return Snapshot::empty();
        }

        match self.repository.load_project(name).await {
            Ok(snapshot) => {
                tracing::debug!(
                    "Loaded project {}: {} ids, {} timestamps",
                    name,
                    snapshot.ids.len(),
                    snapshot.timestamps.len()
                );
                snapshot
            }
            Err(e) => {
                tracing::error!("Error loading project {}: {:#}", name, e);
                Snapshot::empty()
            }
        }
    }
}
