// Application state for HTTP handlers
use crate::application::survey_service::SurveyService;

#[derive(Clone)]
pub struct AppState {
    pub survey_service: SurveyService,
}
