use crate::domain::chart::ChartControls;
use crate::domain::view_state::{DEFAULT_AXIS, DEFAULT_REFRESH_SECS, ViewState};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config/dashboard";
const ENV_PREFIX: &str = "DASHBOARD";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub client: ClientSettings,
    #[serde(default)]
    pub chart: ChartSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,
    #[serde(default = "default_project")]
    pub default_project: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            projects_dir: default_projects_dir(),
            default_project: default_project(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Project to open first; the first listed project when unset.
    #[serde(default)]
    pub project: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            project: None,
        }
    }
}

/// Initial values of the chart form.
#[derive(Debug, Deserialize, Clone)]
pub struct ChartSettings {
    #[serde(default = "default_axis")]
    pub axis: String,
    #[serde(default = "default_y_min")]
    pub y_min: f64,
    #[serde(default = "default_y_max")]
    pub y_max: f64,
    #[serde(default = "default_alarm_limit")]
    pub alarm_limit: f64,
    #[serde(default = "default_warning_limit")]
    pub warning_limit: f64,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            axis: default_axis(),
            y_min: default_y_min(),
            y_max: default_y_max(),
            alarm_limit: default_alarm_limit(),
            warning_limit: default_warning_limit(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

impl ChartSettings {
    pub fn controls(&self) -> ChartControls {
        ChartControls {
            y_min: self.y_min,
            y_max: self.y_max,
            alarm_limit: self.alarm_limit,
            warning_limit: self.warning_limit,
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::new(self.axis.clone(), Duration::from_secs(self.refresh_secs))
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_projects_dir() -> PathBuf {
    PathBuf::from("MSP RAPID VIEW/PROJECTS")
}

fn default_project() -> String {
    "OBVCB".to_string()
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_axis() -> String {
    DEFAULT_AXIS.to_string()
}

fn default_y_min() -> f64 {
    ChartControls::default().y_min
}

fn default_y_max() -> f64 {
    ChartControls::default().y_max
}

fn default_alarm_limit() -> f64 {
    ChartControls::default().alarm_limit
}

fn default_warning_limit() -> f64 {
    ChartControls::default().warning_limit
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

/// Load `config/dashboard.*` (or `path`), then `DASHBOARD__SECTION__KEY`
/// environment overrides. A missing default file is fine.
pub fn load_dashboard_config(path: Option<&Path>) -> anyhow::Result<DashboardConfig> {
    let builder = config::Config::builder();
    let builder = match path {
        Some(path) => builder.add_source(config::File::from(path)),
        None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
    };

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(toml: &str) -> DashboardConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert_eq!(config.server.default_project, "OBVCB");
        assert_eq!(config.chart.axis, "dy");
        assert_eq!(config.chart.refresh_secs, 60);
        assert_eq!(config.chart.controls(), ChartControls::default());
        assert_eq!(config.client.project, None);
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
            [server]
            bind = "127.0.0.1:8080"
            projects_dir = "/srv/surveys"

            [client]
            base_url = "http://monitor.local"
            project = "LINE2"

            [chart]
            axis = "dz"
            alarm_limit = 15.0
            refresh_secs = 30
            "#,
        );

        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.projects_dir, PathBuf::from("/srv/surveys"));
        assert_eq!(config.client.base_url, "http://monitor.local");
        assert_eq!(config.client.project.as_deref(), Some("LINE2"));
        assert_eq!(config.chart.controls().alarm_limit, 15.0);
        assert_eq!(config.chart.controls().warning_limit, 20.0);

        let state = config.chart.view_state();
        assert_eq!(state.selected_axis, "dz");
        assert_eq!(state.refresh_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_default_file_is_not_an_error() {
        let config = load_dashboard_config(None).unwrap();
        assert_eq!(config.server.bind, default_bind());
    }
}
